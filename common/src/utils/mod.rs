pub mod config;
pub mod envelope;
