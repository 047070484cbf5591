//! Core library for Fabula.
//!
//! This crate provides the domain models, the story tree persistence
//! and reconstruction engines, and database operations for Fabula,
//! independent of any transport layer.
//!
//! # Usage
//!
//! ```no_run
//! use fabula_core::Database;
//!
//! let db = Database::open_default()?;
//! db.migrate()?;
//!
//! let story = db.complete_story(uuid::Uuid::new_v4())?;
//! # Ok::<(), fabula_core::Error>(())
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod tree;

// Re-export commonly used types at crate root
pub use db::Database;
pub use error::{Error, Result};
