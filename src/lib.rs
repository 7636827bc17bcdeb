//! Onboardify: fleet onboarding toolkit
//!
//! Maps the columns of an uploaded vehicle telemetry CSV onto a fixed
//! schema, validates the mapped rows and submits them together with the
//! fleet's onboarding metadata.

pub mod cli;
pub mod core;
