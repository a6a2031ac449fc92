pub mod flow_files;
pub mod readings;

pub use flow_files::create_flow_file;
pub use readings::{upsert_reading, UpsertOutcome};
