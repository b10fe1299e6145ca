//! Subsystem modules for the campus assistant.

pub mod agents;
pub mod comms;
pub mod guard;
pub mod memory;
pub mod rag;
