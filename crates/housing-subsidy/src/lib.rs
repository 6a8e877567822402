//! Conditional validation and derived-state engine for multi-step housing-subsidy
//! application wizards.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod wizard;
