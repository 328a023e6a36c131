//! Infrastructure layer
//!
//! This module handles external integrations and services:
//! - CLI argument processing
//! - Configuration loading
//! - Remote API traits with HTTP and in-memory implementations

pub mod api;
pub mod cli;
pub mod config;
pub mod http;
pub mod memory;
