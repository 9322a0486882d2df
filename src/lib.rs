//! PageDB - A minimal embedded relational store in Rust
//!
//! This crate provides:
//! - A statement interpreter for a small SQL-like grammar
//! - In-memory tables with hash indexes, equality filters and an equality join
//! - An append-only commit log of pending mutations
//! - A fixed-page blob store persisting each database to one file
//!
//! [`DatabaseEngine`] is the only entry point callers need. It takes `&mut self`
//! for every statement, so sharing one engine between threads requires the
//! caller to serialize access (for example by wrapping it in a `Mutex`).

pub mod config;
pub mod error;
pub mod sql;
pub mod storage;

pub use config::Config;
pub use sql::engine::DatabaseEngine;
