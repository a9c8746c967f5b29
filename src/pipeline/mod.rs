//! The revision walk.

pub mod frames;
pub mod orchestrator;
pub mod report;
