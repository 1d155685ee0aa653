use nemo_core::extraction::{ExtractedElement, ExtractionResult};

/// An element needs a closer look when it is handwritten or scored below the
/// threshold. Missing scores count as 1.0.
pub fn element_needs_escalation(element: &ExtractedElement, threshold: f64) -> bool {
    element.is_handwritten() || element.effective_confidence() < threshold
}

/// Stops at the first element that needs escalation.
pub fn needs_escalation(result: &ExtractionResult, threshold: f64) -> bool {
    result
        .elements()
        .any(|element| element_needs_escalation(element, threshold))
}
