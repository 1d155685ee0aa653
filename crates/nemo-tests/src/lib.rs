//! Shared fixtures for the cross-crate test suites.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use nemo_core::error::{NemoError, Result};
use nemo_core::extraction::{
    ExtractedElement, ExtractedPage, ExtractionRequest, ExtractionResult, ExtractionService,
};

enum Behavior {
    Respond(ExtractionResult),
    Fail(String),
}

/// In-memory extraction service: returns a fixed result (or a fixed error)
/// and records each request.
pub struct FakeExtractionService {
    behavior: Behavior,
    requests: Mutex<Vec<ExtractionRequest>>,
}

impl FakeExtractionService {
    pub fn returning(result: ExtractionResult) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Respond(result),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Pages built from raw JSON, the way the service would send them.
    pub fn returning_json(pages: serde_json::Value) -> Arc<Self> {
        let result = serde_json::from_value(pages).expect("fixture pages must deserialize");
        Self::returning(result)
    }

    pub fn failing(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            behavior: Behavior::Fail(message.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExtractionService for FakeExtractionService {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.behavior {
            Behavior::Respond(result) => Ok(result.clone()),
            Behavior::Fail(message) => Err(NemoError::Extraction(message.clone())),
        }
    }
}

/// One page holding the given `(class, confidence)` elements.
pub fn single_page(elements: &[(&str, Option<f64>)]) -> ExtractionResult {
    ExtractionResult::new(vec![ExtractedPage::new(
        elements
            .iter()
            .map(|(label, confidence)| ExtractedElement::new(*label, *confidence))
            .collect(),
    )])
}

/// Counts ERROR-level events seen while installed.
#[derive(Clone, Default)]
pub struct ErrorCounter(Arc<AtomicUsize>);

impl ErrorCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for ErrorCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Install an [`ErrorCounter`] as the thread's default subscriber until the
/// guard drops.
pub fn capture_errors() -> (ErrorCounter, tracing::subscriber::DefaultGuard) {
    let counter = ErrorCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}
