pub mod directory_queries;
pub mod reading_queries;
pub mod schema;

pub use schema::create_schema;
