pub mod checkpoint;
pub mod config;
pub mod error;
pub mod metrics;
pub mod paths;
pub mod planner;
