//! Style preference quiz service
//!
//! HTTP host around `preference_engine`: it lists quiz images from object
//! storage, keeps one engine session per preference and persists the final
//! profile.

pub mod config;
pub mod console;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
