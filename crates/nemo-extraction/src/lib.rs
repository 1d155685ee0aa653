pub mod client;
pub mod job;

pub use client::NvIngestService;
pub use job::JobSpec;
