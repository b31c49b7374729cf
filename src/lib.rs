//! Artman - artifact tool manager
//!
//! This library provides the core functionality of the Artman CLI tool:
//! scanning forensic-artifact definition files, deduplicating the
//! third-party tools they reference, downloading those tools into a
//! verified cache, and assembling self-contained offline collector
//! packages.

pub mod commands;
pub mod config;
pub mod dirs;
pub mod download;
pub mod error;
pub mod export;
pub mod package;
pub mod registry;
pub mod scanner;
