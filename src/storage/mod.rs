//! Storage layer
//!
//! - `engine`: whole-blob byte store abstraction
//! - `pager`: file-backed store framing the blob into fixed-size pages
//! - `memory`: non-persistent store
//! - `log`: append-only buffer of pending mutation records

pub mod engine;
pub mod log;
pub mod memory;
pub mod pager;
