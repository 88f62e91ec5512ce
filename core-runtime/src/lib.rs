//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the offline quiz core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - The worker manifest shared by the page and the background cache worker
//!
//! ## Overview
//!
//! This crate contains the core runtime utilities that other modules depend on.
//! It establishes the logging conventions, configuration validation and event
//! broadcasting mechanisms used throughout the system.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod manifest;

pub use error::{Error, Result};
