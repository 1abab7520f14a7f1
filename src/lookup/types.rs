//! Core data model for package lookup
//!
//! All fields that the upstream API may or may not include are modeled as
//! explicit `Option`s; presence decisions (notably "did this response carry
//! installer detail") live here rather than being re-derived by callers.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

/// Installer CPU architecture, normalized to lowercase at ingestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    X64,
    Arm,
    Arm64,
    Neutral,
}

impl Architecture {
    /// Parse a source-data architecture string, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "x86" => Some(Self::X86),
            "x64" => Some(Self::X64),
            "arm" => Some(Self::Arm),
            "arm64" => Some(Self::Arm64),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X64 => "x64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installer packaging technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerType {
    Msix,
    Msi,
    Appx,
    Exe,
    Zip,
    Inno,
    Nullsoft,
    Wix,
    Burn,
    Pwa,
    Portable,
    Font,
}

impl InstallerType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "msix" => Some(Self::Msix),
            "msi" => Some(Self::Msi),
            "appx" => Some(Self::Appx),
            "exe" => Some(Self::Exe),
            "zip" => Some(Self::Zip),
            "inno" => Some(Self::Inno),
            "nullsoft" => Some(Self::Nullsoft),
            "wix" => Some(Self::Wix),
            "burn" => Some(Self::Burn),
            "pwa" => Some(Self::Pwa),
            "portable" => Some(Self::Portable),
            "font" => Some(Self::Font),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Msix => "msix",
            Self::Msi => "msi",
            Self::Appx => "appx",
            Self::Exe => "exe",
            Self::Zip => "zip",
            Self::Inno => "inno",
            Self::Nullsoft => "nullsoft",
            Self::Wix => "wix",
            Self::Burn => "burn",
            Self::Pwa => "pwa",
            Self::Portable => "portable",
            Self::Font => "font",
        }
    }
}

impl fmt::Display for InstallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installation scope of one installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    User,
    Machine,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" => Some(Self::User),
            "machine" => Some(Self::Machine),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Machine => "machine",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One concrete installer offered for a package.
///
/// Fields the source data left unrecognizable or absent are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerRecord {
    pub architecture: Option<Architecture>,
    pub installer_type: Option<InstallerType>,
    pub scope: Option<Scope>,
}

/// One package entry returned by a search query or manifest fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageCandidate {
    /// Dotted "Publisher.Name" identifier
    pub id: String,
    pub display_name: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub tags: Vec<String>,
    pub versions: Vec<String>,
    /// Upstream relevance score, 0-100 scale when present
    pub search_score: Option<f64>,
    /// `None` means this response carried no installer detail at all,
    /// distinct from `Some(vec![])`
    pub installers: Option<Vec<InstallerRecord>>,
}

impl PackageCandidate {
    /// Whether this response included installer detail. Lightweight search
    /// results usually omit it; a full manifest fetch fills the gap.
    pub fn has_installer_detail(&self) -> bool {
        self.installers.is_some()
    }
}

/// Outcome of one match resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchResult {
    pub candidate: Option<PackageCandidate>,
    /// Only meaningful relative to other candidates in the same resolution
    /// call; never compare scores across calls
    pub score: i64,
}

impl MatchResult {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.candidate.is_some()
    }
}

/// Normalized installer facts derived from a candidate's installer list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallerFacts {
    pub architectures: BTreeSet<Architecture>,
    pub installer_types: BTreeSet<InstallerType>,
    pub scopes: BTreeSet<Scope>,
    pub has_64bit: bool,
    pub has_arm64: bool,
}

/// Full metadata record returned by a detail query.
///
/// "Not found" is a normal value (`found = false`, everything else empty),
/// never an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PackageDetails {
    pub found: bool,
    pub id: Option<String>,
    pub name: Option<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub license: Option<String>,
    pub tags: Vec<String>,
    pub versions: Vec<String>,
    pub latest_version: Option<String>,
    pub architectures: Vec<Architecture>,
    pub installer_types: Vec<InstallerType>,
    pub scopes: Vec<Scope>,
    pub has_64bit: bool,
    pub has_arm64: bool,
}

impl PackageDetails {
    pub fn not_found() -> Self {
        Self::default()
    }

    /// Tags joined for display
    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }
}

/// A package reference parsed from the local tool's search output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRef {
    pub name: String,
    pub id: String,
    pub version: String,
    pub source: Option<String>,
}
