//! # Ports Layer (Middle Hexagon)
//!
//! - **Driving Ports (Inbound)**: `UfaChaincodeApi`
//! - **Driven Ports (Outbound)**: `StateAccessor`, `TimeSource`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
