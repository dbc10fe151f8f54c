pub mod cli;
pub mod config;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod pattern;
pub mod vault;
