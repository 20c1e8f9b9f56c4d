pub mod client;
pub mod gateway;
pub mod keys;
#[cfg(test)]
pub mod memory;
pub mod types;

pub use client::ApiClient;
pub use gateway::SharedGateway;
pub use keys::{course_write_invalidations, StudyQuery};
