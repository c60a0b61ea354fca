//! Core library for the cooperative credit application service.
//!
//! The `workflows::credit` module owns the application lifecycle: intake
//! validation, amortized payment computation, deterministic risk scoring,
//! role-gated transitions, and the port traits the deployable binary wires
//! to concrete adapters.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
