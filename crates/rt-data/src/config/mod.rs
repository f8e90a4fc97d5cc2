//! Session configuration module

pub mod null_handling;
pub mod session_config;

pub use null_handling::*;
pub use session_config::*;
