pub mod config;
pub mod network_state;
pub mod service;
