//! SQL processing module
//!
//! This module provides:
//! - `parser`: statement lexer and parser
//! - `types`: value types and derived index keys
//! - `schema`: tables and hash indexes
//! - `executor`: query and mutation execution
//! - `engine`: database catalog and statement entry point

pub mod engine;
pub mod executor;
pub mod parser;
pub mod schema;
pub mod types;
