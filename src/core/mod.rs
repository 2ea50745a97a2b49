//! Core modules for canonid's extraction, catalog, and validation engine.
//!
//! Data flows one way: documents are parsed into entries, entries into a
//! catalog, and the catalog into rendered artifacts. The trace and spec
//! validators consume the catalog's known ids.

pub mod adr;
pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod entries;
pub mod error;
pub mod files;
pub mod git;
pub mod ids;
pub mod markdown;
pub mod output;
pub mod references;
pub mod render;
pub mod spec_lint;
pub mod taxonomy;
pub mod trace;
