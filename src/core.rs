//! Core Elm Architecture implementation
//!
//! This module contains the core components of the Elm architecture:
//! - Messages from the feeds, the poller and the UI
//! - Application state for both listing views and the match session
//! - The update function and the commands it emits

pub mod cmd;
pub mod msg;
pub mod state;
pub mod update;
