//! Threadkeep - threaded comment storage for blog posts.
//!
//! This crate provides the data model, tree assembly, and storage engines
//! behind a blog's comment threads, plus a small CLI over them.
//!
//! - [`domain`]: posts, comments, flat comment records, page requests
//! - [`thread`]: builds comment forests from flat records
//! - [`storage`]: the storage contract with in-memory and SQLite backends
//! - [`service`]: logging and new-comment notifications over a store
//! - [`context`]: cancellation and deadlines for storage calls

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod context;
pub mod domain;
pub mod error;
pub mod service;
pub mod storage;
pub mod thread;

// Application layer
pub mod app;
pub mod config;

// Public CLI module (needed by binary)
pub mod cli;

// Command implementations
pub mod commands;

// Output formatting
pub mod output;
