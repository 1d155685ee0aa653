pub mod config;
pub mod error;
pub mod extraction;
pub mod transform;

pub use config::{AppConfig, ClientConfig, ProcessContext, PropertyDescriptor, Validator};
pub use error::{NemoError, Result};
pub use extraction::{
    ExtractMethod, ExtractOptions, ExtractedElement, ExtractedPage, ExtractionRequest,
    ExtractionResult, ExtractionService,
};
pub use transform::{FlowFile, FlowFileTransform, ProcessorDetails, Relationship, TransformResult};
