use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Label the layout model assigns to handwritten blocks.
pub const HANDWRITTEN_CLASS: &str = "handwritten";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMethod {
    Pdfium,
    NemoretrieverParse,
}

impl ExtractMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractMethod::Pdfium => "pdfium",
            ExtractMethod::NemoretrieverParse => "nemoretriever_parse",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractOptions {
    pub method: ExtractMethod,
    pub extract_text: bool,
    pub extract_tables: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            method: ExtractMethod::Pdfium,
            extract_text: true,
            extract_tables: false,
        }
    }
}

/// One extraction job: the target host, the input files, and the extract task.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub host: String,
    pub files: Vec<Vec<u8>>,
    pub options: ExtractOptions,
}

impl ExtractionRequest {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            files: Vec::new(),
            options: ExtractOptions::default(),
        }
    }

    pub fn files(mut self, files: Vec<Vec<u8>>) -> Self {
        self.files = files;
        self
    }

    pub fn extract(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }
}

/// A layout element reported by the extraction service.
///
/// Fields other than `class` and `confidence` are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElement {
    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Kept as the service's number so `1` is written back as `1`, not `1.0`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<serde_json::Number>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExtractedElement {
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: Some(label.into()),
            confidence: confidence.and_then(serde_json::Number::from_f64),
            extra: serde_json::Map::new(),
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence.as_ref().and_then(serde_json::Number::as_f64)
    }

    /// Elements without a score count as fully confident.
    pub fn effective_confidence(&self) -> f64 {
        self.confidence().unwrap_or(1.0)
    }

    pub fn is_handwritten(&self) -> bool {
        self.label.as_deref() == Some(HANDWRITTEN_CLASS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    #[serde(default)]
    pub metadata: Vec<ExtractedElement>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ExtractedPage {
    pub fn new(metadata: Vec<ExtractedElement>) -> Self {
        Self {
            metadata,
            extra: serde_json::Map::new(),
        }
    }
}

/// Ordered pages returned for one job. Serializes as a bare JSON array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionResult {
    pub pages: Vec<ExtractedPage>,
}

impl ExtractionResult {
    pub fn new(pages: Vec<ExtractedPage>) -> Self {
        Self { pages }
    }

    pub fn elements(&self) -> impl Iterator<Item = &ExtractedElement> {
        self.pages.iter().flat_map(|page| page.metadata.iter())
    }
}

#[async_trait]
pub trait ExtractionService: Send + Sync {
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_serializes_as_snake_case() {
        let json = serde_json::to_string(&ExtractMethod::NemoretrieverParse).unwrap();
        assert_eq!(json, "\"nemoretriever_parse\"");
        assert_eq!(ExtractMethod::NemoretrieverParse.as_str(), "nemoretriever_parse");
    }

    #[test]
    fn request_builder_sets_files_and_options() {
        let request = ExtractionRequest::new("nim")
            .files(vec![b"%PDF".to_vec()])
            .extract(ExtractOptions {
                method: ExtractMethod::NemoretrieverParse,
                extract_text: true,
                extract_tables: true,
            });

        assert_eq!(request.host, "nim");
        assert_eq!(request.files, vec![b"%PDF".to_vec()]);
        assert!(request.options.extract_tables);
    }

    #[test]
    fn element_without_confidence_is_fully_confident() {
        let element: ExtractedElement = serde_json::from_str(r#"{"class":"paragraph"}"#).unwrap();
        assert_eq!(element.confidence(), None);
        assert_eq!(element.effective_confidence(), 1.0);
        assert!(!element.is_handwritten());
    }

    #[test]
    fn null_confidence_is_treated_as_absent() {
        let element: ExtractedElement =
            serde_json::from_str(r#"{"class":"handwritten","confidence":null}"#).unwrap();
        assert_eq!(element.effective_confidence(), 1.0);
        assert!(element.is_handwritten());
    }

    #[test]
    fn integer_confidence_is_written_back_unchanged() {
        let raw = r#"{"class":"header","confidence":1,"text":"Intake form"}"#;
        let element: ExtractedElement = serde_json::from_str(raw).unwrap();

        assert_eq!(element.confidence(), Some(1.0));
        assert_eq!(serde_json::to_string(&element).unwrap(), raw);
    }

    #[test]
    fn extra_fields_keep_service_order() {
        let raw = r#"[{"metadata":[],"page_number":2,"document_type":"text","bbox":[0,1]}]"#;
        let result: ExtractionResult = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&result).unwrap(), raw);
    }

    #[test]
    fn string_confidence_is_rejected() {
        let parsed: std::result::Result<ExtractedElement, _> =
            serde_json::from_str(r#"{"class":"paragraph","confidence":"high"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn page_without_metadata_has_no_elements() {
        let page: ExtractedPage = serde_json::from_str(r#"{"document_type":"text"}"#).unwrap();
        assert!(page.metadata.is_empty());
        assert_eq!(page.extra["document_type"], "text");
    }

    #[test]
    fn unknown_fields_survive_reserialization() {
        let raw = serde_json::json!([
            {
                "page_number": 1,
                "metadata": [
                    {"class": "table", "confidence": 0.91, "bbox": [0, 0, 10, 10]}
                ]
            }
        ]);

        let result: ExtractionResult = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.elements().count(), 1);
        assert_eq!(serde_json::to_value(&result).unwrap(), raw);
    }

    #[test]
    fn empty_result_serializes_as_empty_array() {
        let json = serde_json::to_string(&ExtractionResult::default()).unwrap();
        assert_eq!(json, "[]");
    }
}
