pub mod json;
pub mod table;
mod types;

pub use types::{ChecksumStatus, Report};
