// ABOUTME: Library root for radi handlers - builders, handlers and the operations they provide.
// ABOUTME: The radi binary is in main.rs.

pub mod bytesource;
pub mod compose;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod handler;
pub mod handlers;
pub mod operation;
pub mod output;
pub mod rest;
pub mod runtime;
pub mod security;
pub mod types;
