pub mod analyze;
pub mod config;
pub mod init;
pub mod interview;
pub mod review;
pub mod session;
pub mod tree;
