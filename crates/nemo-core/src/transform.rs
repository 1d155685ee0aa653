use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{ProcessContext, PropertyDescriptor};

/// The document handed to a processor by the flow host.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowFile {
    contents: Vec<u8>,
    attributes: BTreeMap<String, String>,
}

impl FlowFile {
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Success,
    Failure,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Success => "success",
            Relationship::Failure => "failure",
        }
    }
}

/// Outcome of one transform call. A failure carries neither content nor
/// attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    pub relationship: Relationship,
    pub contents: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl TransformResult {
    pub fn success(contents: String, attributes: BTreeMap<String, String>) -> Self {
        Self {
            relationship: Relationship::Success,
            contents: Some(contents),
            attributes,
        }
    }

    pub fn failure() -> Self {
        Self {
            relationship: Relationship::Failure,
            contents: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.relationship == Relationship::Success
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorDetails {
    pub version: String,
    pub description: String,
    pub tags: Vec<String>,
    /// External services the processor needs at runtime.
    pub dependencies: Vec<String>,
}

/// The contract a flow host drives: declare properties, then transform one
/// flow file at a time.
#[async_trait]
pub trait FlowFileTransform: Send + Sync {
    fn details(&self) -> ProcessorDetails;
    fn property_descriptors(&self) -> &[PropertyDescriptor];
    async fn transform(&self, context: &ProcessContext, flowfile: &FlowFile) -> TransformResult;
}
