pub mod analyzer;
pub mod assembler;
pub mod classifier;
pub mod config;
pub mod confirm;
pub mod dictionary;
pub mod error;
pub mod io;
pub mod navigator;
pub mod paths;
pub mod rules;
pub mod scoring;
pub mod session_store;
pub mod specification;
pub mod summary;
pub mod tree;
pub mod types;

pub use error::{IntakeError, Result};
