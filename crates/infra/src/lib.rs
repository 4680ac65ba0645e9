//! Infrastructure layer: backing-store adapters, configuration, jobs.

pub mod config;
pub mod jobs;
pub mod store;
