pub mod common;
pub mod distribution;
pub mod import;
pub mod overview;
pub mod policies;
pub mod session;
pub mod timeseries;
