pub mod flow_file;
pub mod lines;

pub use flow_file::FlowFileSource;
pub use lines::LinesSource;
