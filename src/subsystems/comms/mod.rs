//! Comms subsystem: the channels a user talks to the assistant through.
//!
//! Only the PTY console exists. It borrows the [`Assistant`] for its
//! lifetime and stops when the shared `shutdown` token is cancelled.
//!
//! [`Assistant`]: crate::assistant::Assistant

pub mod pty;

pub use pty::Command;
