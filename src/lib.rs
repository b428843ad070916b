//! Page cache invalidation engine with a layered configuration and
//! telemetry bootstrap for hosts and the `pagepurge` operator binary.

pub mod cache;
pub mod config;
pub mod infra;
