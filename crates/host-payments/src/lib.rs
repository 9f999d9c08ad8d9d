pub mod calculator;
pub mod error;
pub mod exporter;
pub mod ingestor;
pub mod oracle;
pub mod report;
pub mod settings;

pub use error::{ReportError, Result};
