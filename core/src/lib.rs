pub mod config;
pub mod engine;
pub mod errors;
pub mod notify;
pub mod power;
pub mod provider;
pub mod scheduler;
pub mod stats;
pub mod tracking;
