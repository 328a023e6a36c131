//! Glue between the pure core and the outside world
//!
//! - [`runtime`] owns the state and feeds messages through `update`
//! - [`cmd_executor`] turns commands into API calls and timers
//! - [`app_runner`] drives a CLI command end to end
//! - [`renderer`] prints the visible grid as text

pub mod app_runner;
pub mod cmd_executor;
pub mod renderer;
pub mod runtime;
