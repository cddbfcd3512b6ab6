// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Despensa: Shared Pantry & Shopping List
//!
//! A household pantry tracker with automatic Spanish product categorization
//! using a local keyword engine and optional AI models.
//! Version 1.2 - unified snapshot schema with web API and SQLite store.

pub mod ai;
pub mod categorize;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod service;
pub mod store;
pub mod sweep;
pub mod sync;
pub mod transitions;
pub mod web;

pub use config::AppConfig;
pub use error::{DespensaError, Result};
