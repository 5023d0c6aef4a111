pub mod aggregate;
pub mod cache;
pub mod classify;
pub mod date;
pub mod distribution;
pub mod metrics;
pub mod pipeline;
pub mod policy;
pub mod query;
pub mod segment;
pub mod timeseries;
pub mod types;
