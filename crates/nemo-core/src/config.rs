use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NemoError, Result};

// --- Processor properties ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    NonEmpty,
}

impl Validator {
    pub fn check(&self, property: &str, value: &str) -> Result<()> {
        match self {
            Validator::NonEmpty if value.trim().is_empty() => Err(NemoError::Config(format!(
                "property '{property}' must not be empty"
            ))),
            Validator::NonEmpty => Ok(()),
        }
    }
}

/// Declares one configurable property of a processor, the way a flow host
/// renders and validates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub validators: Vec<Validator>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required: false,
            default_value: None,
            validators: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }
}

/// Property values supplied by the host for a single invocation.
///
/// Lookups fall back to the descriptor's default value when the host did not
/// set the property explicitly.
#[derive(Debug, Clone, Default)]
pub struct ProcessContext {
    properties: HashMap<String, String>,
}

impl ProcessContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_property(name, value);
        self
    }

    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn property<'a>(&'a self, descriptor: &'a PropertyDescriptor) -> Option<&'a str> {
        self.properties
            .get(&descriptor.name)
            .map(String::as_str)
            .or(descriptor.default_value.as_deref())
    }

    /// Resolve a property and run its validators.
    pub fn require<'a>(&'a self, descriptor: &'a PropertyDescriptor) -> Result<&'a str> {
        let value = self.property(descriptor).ok_or_else(|| {
            NemoError::Config(format!("property '{}' is not set", descriptor.name))
        })?;
        for validator in &descriptor.validators {
            validator.check(&descriptor.name, value)?;
        }
        Ok(value)
    }

    /// Host-side validation of every required property.
    pub fn validate(&self, descriptors: &[PropertyDescriptor]) -> Result<()> {
        for descriptor in descriptors.iter().filter(|d| d.required) {
            self.require(descriptor)?;
        }
        Ok(())
    }
}

// --- Service client ---

pub const DEFAULT_NIM_PORT: u16 = 7670;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub port: u16,
    pub poll_interval: Duration,
    /// `None` waits for the job result indefinitely.
    pub fetch_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_NIM_PORT,
            poll_interval: Duration::from_millis(250),
            fetch_timeout: None,
        }
    }
}

// --- Server ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub nim_host: String,
    pub handwriting_threshold: String,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = ClientConfig::default();
        Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            nim_host: std::env::var("NIM_HOST").unwrap_or_else(|_| "localhost".into()),
            handwriting_threshold: std::env::var("HANDWRITING_THRESHOLD")
                .unwrap_or_else(|_| "0.75".into()),
            client: ClientConfig {
                port: std::env::var("NIM_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.port),
                poll_interval: std::env::var("NIM_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|ms| ms.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                fetch_timeout: std::env::var("NIM_FETCH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs),
            },
        }
    }
}
