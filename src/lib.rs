pub mod agents;
pub mod cli;
pub mod config;
pub mod memory;
pub mod orchestration;
pub mod provider;
pub mod shared;
