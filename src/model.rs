//! Self-contained state components
//!
//! Each component owns its state and changes only through `update(Message)`, which
//! returns the effects the caller has to carry out. None of them perform I/O.

pub mod feed;
pub mod grid;
pub mod job_poller;
pub mod page_cache;
pub mod saved;
pub mod viewport;
pub mod window;
