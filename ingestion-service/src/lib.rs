pub mod config;
pub mod db;
pub mod importer;
pub mod metrics_textfile;
pub mod observability;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod report;
pub mod sinks;
pub mod sources;
pub mod transform;

pub use importer::{ImportOptions, Importer};
pub use pipeline::{Envelope, ImportError, LineError};
pub use report::FileReport;

#[cfg(test)]
mod test_support;
