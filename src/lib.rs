// src/lib.rs — Library root for HealthMate

pub mod cli;
pub mod core;
pub mod infra;
pub mod provider;
