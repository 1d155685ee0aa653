pub mod escalation;
pub mod processor;

pub use escalation::{element_needs_escalation, needs_escalation};
pub use processor::NemoRetrieverExtraction;
