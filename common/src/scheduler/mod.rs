// Scheduler module for the change-detection and notification loop

pub mod engine;

pub use engine::{CycleReport, Scheduler, SchedulerConfig, SchedulerEngine};
