//! # jobscroll - windowed job listing pagination
//!
//! An engine for scrolling through cursor-paged job listings and resume match
//! results, built with Rust and tokio. Only a bounded window of items is kept in
//! memory; pages that fall out of it are cached and restored when the user scrolls
//! back.
//!
//! ## Architecture Overview
//!
//! This crate is organized around the Elm architecture pattern:
//!
//! - **Model** ([`core::state`]): the two listing views, the saved jobs and the match session
//! - **Message** ([`core::msg`]): events that can change the state
//! - **Update** ([`core::update`]): pure functions that transform state
//! - **Command** ([`core::cmd`]): side effects (network, timers, logging)
//!
//! The components in [`model`] hold the paging logic itself and never do I/O.
//! [`integration`] executes commands against the services in [`infrastructure`].
//!
//! ## Example Usage
//!
//! ```rust
//! use jobscroll::{
//!     core::{
//!         msg::{ui::UiMsg, Msg},
//!         state::{AppState, FeedKind},
//!         update::update,
//!     },
//!     infrastructure::config::Config,
//! };
//!
//! let state = AppState::new(&Config::default())?;
//!
//! // Mounting the jobs view starts the first page load
//! let (state, commands) = update(Msg::Ui(UiMsg::Mounted(FeedKind::Jobs)), state);
//!
//! assert!(state.jobs.mounted);
//! assert!(state.jobs.feed.is_loading_initial());
//! assert!(!commands.is_empty());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`domain`] - Cursors, pages, listings and the API error taxonomy
//! - [`model`] - Page cache, item window, feed controller, job poller, grid layout
//! - [`core`] - State, messages, update and commands
//! - [`infrastructure`] - HTTP and in-memory APIs, CLI and configuration
//! - [`integration`] - Runtime, command executor and the CLI runner

#![deny(warnings)]
#![allow(dead_code)]

pub mod core;
pub mod domain;
pub mod infrastructure;
pub mod integration;
pub mod model;
pub mod utils;

// Re-exports for convenience
pub use crate::core::{cmd::Cmd, msg::Msg, state::AppState, update::update};

/// Result type used throughout the library
pub type Result<T> = color_eyre::eyre::Result<T>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
