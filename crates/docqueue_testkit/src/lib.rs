//! # docqueue Testkit
//!
//! Test utilities for docqueue.
//!
//! This crate provides:
//! - Managers over temporary files or memory that clean up after themselves
//! - A recording store that logs every access and detects overlap
//! - Property-based generators for operation scripts
//! - Stress helpers for concurrent read-modify-write load
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docqueue_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_manager() {
//!     with_temp_manager(|io| {
//!         io.write(serde_json::json!({"a": 1}), None);
//!         assert_eq!(io.read(None).unwrap()["a"], 1);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod recording;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::recording::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use recording::*;
pub use stress::*;
