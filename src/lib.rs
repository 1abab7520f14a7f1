//! winget-scout: query WinGet package metadata and derive 64-bit installer
//! availability from the winget.run community API, with an optional local
//! `winget` executable fallback.

pub mod config;
pub mod lookup;
