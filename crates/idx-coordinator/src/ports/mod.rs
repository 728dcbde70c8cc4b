//! # Ports Module
//!
//! Hexagonal architecture ports (API and SPI).

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
