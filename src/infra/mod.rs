//! Runtime bootstrap for the operator binary.

pub mod error;
pub mod telemetry;
