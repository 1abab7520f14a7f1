//! Installer metadata extraction
//!
//! Flattens a candidate's installer list into deduplicated architecture,
//! installer-type, and scope sets plus the derived 64-bit flags.

use crate::lookup::types::{Architecture, InstallerFacts, PackageCandidate, Scope};

/// Derive [`InstallerFacts`] from a candidate.
///
/// A candidate without an installer list yields empty sets and false flags;
/// the caller decides whether to fall back to a full-manifest fetch. When a
/// non-empty installer list specifies no scope at all, the scope set defaults
/// to `{machine}` — installers with unspecified scope are machine-wide.
pub fn extract(candidate: &PackageCandidate) -> InstallerFacts {
    let Some(installers) = &candidate.installers else {
        return InstallerFacts::default();
    };

    let mut facts = InstallerFacts::default();
    for record in installers {
        if let Some(arch) = record.architecture {
            facts.architectures.insert(arch);
        }
        if let Some(installer_type) = record.installer_type {
            facts.installer_types.insert(installer_type);
        }
        if let Some(scope) = record.scope {
            facts.scopes.insert(scope);
        }
    }

    facts.has_64bit = facts.architectures.contains(&Architecture::X64);
    facts.has_arm64 = facts.architectures.contains(&Architecture::Arm64);

    if !installers.is_empty() && facts.scopes.is_empty() {
        facts.scopes.insert(Scope::Machine);
    }

    facts
}
