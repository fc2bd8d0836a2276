mod errors;
mod hashing;
mod service;
mod tag_file;
#[cfg(test)]
mod tests;

pub use errors::IngestError;
pub use service::{IngestService, ScanSummary};
