//! Package lookup core
//!
//! This module answers three questions about a free-text application name:
//! does a matching package exist, what does its metadata say, and does it
//! ship a 64-bit installer.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Service   │────▶│    Cache    │────▶│   Fetcher   │
//! │ (lookup ops)│     │  (session)  │     │ (retry+API) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        │
//!        ├──────────────┬──────────────┐
//!        ▼              ▼              ▼
//! ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//! │   Matcher   │ │ Installers  │ │  CliProbe   │
//! │  (scoring)  │ │ (extraction)│ │ (local tool)│
//! └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`service`]: public lookup operations (exists, details, prewarm)
//! - [`matcher`]: candidate filtering and additive scoring
//! - [`installers`]: installer-list normalization and 64-bit facts
//! - [`cache`]: session-scoped search and manifest cache
//! - [`fetch`]: retrying HTTP fetch layer
//! - [`api`]: winget.run wire format and endpoints
//! - [`probe`]: optional local winget executable fallback
//! - [`version`]: WinGet-style version comparison
//! - [`error`]: fetch and lookup error types
//! - [`types`]: shared data model

pub mod api;
pub mod cache;
pub mod error;
pub mod fetch;
pub mod installers;
pub mod matcher;
pub mod probe;
pub mod service;
pub mod types;
pub mod version;
