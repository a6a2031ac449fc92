pub mod flow_file;
pub mod meter;
pub mod meter_point;
pub mod reading;

pub use flow_file::FlowFile;
pub use meter::Meter;
pub use meter_point::MeterPoint;
pub use reading::{canonical_value, Reading, ReadingView, RegisterType, DEFAULT_REGISTER_ID, VALUE_SCALE};
