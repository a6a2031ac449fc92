//! Domain model and read-side queries for imported D0010 meter readings.
//!
//! The ingestion service writes these tables; anything that only needs to
//! look readings up (search screens, reports) should depend on this crate alone.

pub mod db;
pub mod domain;
pub mod error;

pub use error::{ClientError, Result};

#[cfg(test)]
mod test_support;
