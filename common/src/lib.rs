// Common library for the missed-appointment notifier

pub mod bootstrap;
pub mod composer;
pub mod config;
pub mod differ;
pub mod dispatcher;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod normalizer;
pub mod scheduler;
pub mod source;
pub mod telemetry;
