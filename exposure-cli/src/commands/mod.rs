pub mod aggregate;
pub mod config;
