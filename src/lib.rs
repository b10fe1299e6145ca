// Library root: everything the binary wires together, exposed for
// integration tests. The binary entry point is src/main.rs.

pub mod assistant;
pub mod config;
pub mod error;
pub mod llm;
pub mod logger;
pub mod observability;
pub mod subsystems;
