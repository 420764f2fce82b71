//! # Adapters Layer (Outer Hexagon)
//!
//! Store and clock implementations of the driven ports, plus the dispatcher
//! that drives the inbound API from named invocations.

pub mod clock;
pub mod dispatch;
pub mod file_store;
pub mod memory_store;

pub use clock::*;
pub use dispatch::*;
pub use file_store::*;
pub use memory_store::*;
