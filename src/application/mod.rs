//! Application services layer.

pub mod error;
pub mod relations;
pub mod repos;
