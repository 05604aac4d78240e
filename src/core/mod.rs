// src/core/mod.rs — Session and orchestration core

pub mod intake;
pub mod orchestrator;
pub mod report;
pub mod session;
