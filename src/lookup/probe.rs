//! Local winget executable probe
//!
//! A soft fallback for questions the metadata API cannot answer, mainly
//! whether a package really offers an x64 installer. The executable is
//! located once at startup; when it is missing every operation degrades to a
//! negative result instead of failing the lookup.
//!
//! winget has no machine-readable output, so everything here rests on
//! parsing its current human-oriented text format. The markers in [`parser`]
//! are best-effort contract assumptions, kept in one place so a format
//! change only touches that module.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::lookup::types::PackageRef;

/// Probe around a locally installed `winget` executable
#[derive(Debug)]
pub struct CliProbe {
    tool: Option<PathBuf>,
}

impl CliProbe {
    /// Locate `winget` on PATH. Run once at process start; the result is the
    /// availability flag for the probe's lifetime.
    pub fn locate() -> Self {
        let tool = locate_on_path("winget");
        match &tool {
            Some(path) => debug!(path = %path.display(), "local winget executable found"),
            None => warn!("local winget executable not found, CLI probe disabled"),
        }
        Self { tool }
    }

    /// A probe that never runs anything
    pub fn unavailable() -> Self {
        Self { tool: None }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            tool: Some(path.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.tool.is_some()
    }

    /// Authoritatively check whether the package offers an x64 installer.
    ///
    /// Positive only when the output shows the package was found, printed an
    /// installer line, and carries no "no applicable installer" message.
    /// Unavailable tool, spawn failure, or timeout all yield `false`.
    pub async fn has_64bit_installer(&self, package_id: &str, limit: Duration) -> bool {
        let Some(tool) = self.tool.as_deref() else {
            return false;
        };
        let output = run_tool(
            tool,
            &[
                "show",
                "--id",
                package_id,
                "--exact",
                "--architecture",
                "x64",
                "--accept-source-agreements",
            ],
            limit,
        )
        .await;
        match output {
            Some(text) => parser::shows_installer(&text),
            None => false,
        }
    }

    /// Resolve a package from an MSI product code. Best-effort: the answer
    /// comes from parsing winget's tabular search output.
    pub async fn find_by_product_code(
        &self,
        product_code: &str,
        limit: Duration,
    ) -> Option<PackageRef> {
        let tool = self.tool.as_deref()?;
        let code = normalize_product_code(product_code);
        let text = run_tool(
            tool,
            &[
                "search",
                "--product-code",
                &code,
                "--accept-source-agreements",
            ],
            limit,
        )
        .await?;
        parser::parse_search_row(&text)
    }
}

/// Product codes are brace-wrapped GUIDs in MSI metadata
fn normalize_product_code(code: &str) -> String {
    let trimmed = code.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        trimmed.to_string()
    } else {
        format!("{{{}}}", trimmed.trim_matches(['{', '}']))
    }
}

/// Run the tool with a hard deadline. The child is spawned with
/// `kill_on_drop`, so abandoning the wait on timeout terminates it.
async fn run_tool(tool: &Path, args: &[&str], limit: Duration) -> Option<String> {
    let child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(err) => {
            warn!(tool = %tool.display(), error = %err, "failed to spawn local tool");
            return None;
        }
    };

    match timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => {
            // winget exits nonzero for "not found"; the text still carries
            // the answer
            if !output.status.success() {
                debug!(status = ?output.status.code(), "local tool exited nonzero");
            }
            Some(String::from_utf8_lossy(&output.stdout).into_owned())
        }
        Ok(Err(err)) => {
            warn!(error = %err, "failed to collect local tool output");
            None
        }
        Err(_) => {
            warn!(
                timeout_ms = limit.as_millis() as u64,
                "local tool timed out and was killed"
            );
            None
        }
    }
}

fn locate_on_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for candidate in [dir.join(name), dir.join(format!("{name}.exe"))] {
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Text markers for winget's current output format. Undocumented contract
/// assumptions; may drift across winget versions.
mod parser {
    use std::sync::LazyLock;

    use regex::Regex;

    use crate::lookup::types::PackageRef;

    const FOUND_MARKER: &str = "Found ";
    const INSTALLER_URL_MARKER: &str = "Installer Url:";
    const INSTALLER_TYPE_MARKER: &str = "Installer Type:";
    const NO_INSTALLER_MARKER: &str = "No applicable installer";

    /// Columns in winget's table output are separated by runs of spaces
    static COLUMN_SPLIT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s{2,}").expect("invalid column split pattern"));

    /// `winget show` output proves an installer exists only when all three
    /// conditions hold
    pub(super) fn shows_installer(output: &str) -> bool {
        let found = output
            .lines()
            .any(|line| line.trim_start().starts_with(FOUND_MARKER));
        let has_installer_line =
            output.contains(INSTALLER_URL_MARKER) || output.contains(INSTALLER_TYPE_MARKER);
        found && has_installer_line && !output.contains(NO_INSTALLER_MARKER)
    }

    /// Parse the first data row of `winget search` table output:
    /// name, id, version, and optionally source.
    pub(super) fn parse_search_row(output: &str) -> Option<PackageRef> {
        let mut lines = output.lines();
        // Skip everything up to and including the dashed header separator
        lines.find(|line| is_separator(line))?;
        let row = lines.find(|line| !line.trim().is_empty())?;

        let columns: Vec<&str> = COLUMN_SPLIT.split(row.trim()).collect();
        if columns.len() < 3 {
            return None;
        }

        Some(PackageRef {
            name: columns[0].to_string(),
            id: columns[1].to_string(),
            version: columns[2].to_string(),
            source: columns.get(3).map(|s| s.to_string()),
        })
    }

    fn is_separator(line: &str) -> bool {
        let trimmed = line.trim();
        !trimmed.is_empty() && trimmed.chars().all(|c| c == '-')
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        const SHOW_WITH_INSTALLER: &str = "\
Found PuTTY [PuTTY.PuTTY]
Version: 0.81
Publisher: Simon Tatham
Installer:
  Installer Type: msi
  Installer Url: https://the.earth.li/~sgtatham/putty/0.81/w64/putty-64bit-0.81-installer.msi
";

        const SHOW_NO_APPLICABLE: &str = "\
Found Legacy Tool [Legacy.Tool]
Version: 1.0
No applicable installer found; see logs for more details.
";

        const SEARCH_OUTPUT: &str = "\
Name     Id            Version  Source
---------------------------------------
PuTTY    PuTTY.PuTTY   0.81     winget
MTPuTTY  TTYPlus.MTPutty  1.8   winget
";

        #[test]
        fn shows_installer_requires_all_three_conditions() {
            assert!(shows_installer(SHOW_WITH_INSTALLER));
            assert!(!shows_installer(SHOW_NO_APPLICABLE));
            assert!(!shows_installer("No package found matching input criteria."));
            // Found but no installer line printed
            assert!(!shows_installer("Found PuTTY [PuTTY.PuTTY]\nVersion: 0.81\n"));
        }

        #[test]
        fn parse_search_row_reads_first_data_row() {
            let package = parse_search_row(SEARCH_OUTPUT).unwrap();

            assert_eq!(package.name, "PuTTY");
            assert_eq!(package.id, "PuTTY.PuTTY");
            assert_eq!(package.version, "0.81");
            assert_eq!(package.source.as_deref(), Some("winget"));
        }

        #[test]
        fn parse_search_row_without_source_column() {
            let output = "\
Name   Id           Version
---------------------------
PuTTY  PuTTY.PuTTY  0.81
";
            let package = parse_search_row(output).unwrap();

            assert_eq!(package.id, "PuTTY.PuTTY");
            assert_eq!(package.source, None);
        }

        #[test]
        fn parse_search_row_rejects_short_rows_and_missing_separator() {
            let short = "\
Name   Id
----------
PuTTY  PuTTY.PuTTY
";
            assert_eq!(parse_search_row(short), None);
            assert_eq!(parse_search_row("No package found matching input criteria."), None);
            assert_eq!(parse_search_row(""), None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("23170F69-40C1-2702-2102-000001000000", "{23170F69-40C1-2702-2102-000001000000}")]
    #[case("{23170F69-40C1-2702-2102-000001000000}", "{23170F69-40C1-2702-2102-000001000000}")]
    #[case("  {ABC} ", "{ABC}")]
    #[case("{ABC", "{ABC}")]
    fn normalize_product_code_brace_wraps(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_product_code(input), expected);
    }

    #[tokio::test]
    async fn unavailable_probe_returns_negative_results_without_error() {
        let probe = CliProbe::unavailable();

        assert!(!probe.is_available());
        assert!(
            !probe
                .has_64bit_installer("PuTTY.PuTTY", Duration::from_secs(1))
                .await
        );
        assert!(
            probe
                .find_by_product_code("{ABC}", Duration::from_secs(1))
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn missing_executable_degrades_to_negative_result() {
        let probe = CliProbe::with_path("/nonexistent/winget");

        assert!(
            !probe
                .has_64bit_installer("PuTTY.PuTTY", Duration::from_secs(1))
                .await
        );
    }
}
