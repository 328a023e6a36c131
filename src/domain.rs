//! Domain types
//!
//! This module contains the types shared by every layer:
//! - Cursors, pages and page requests
//! - Job listings, match results and match job status
//! - The API error taxonomy
//! - Resume upload validation and listing formatting helpers
//! - Width-aware text fitting

pub mod cursor;
pub mod error;
pub mod format;
pub mod job;
pub mod page;
pub mod text;
pub mod upload;
