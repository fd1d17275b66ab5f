//! Configuration loading for multilaunch.
//!
//! The startup input is a JSON array of launch definitions. Loading failures
//! are fatal and reported before any terminal state is touched.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One configured launch, as supplied in the JSON config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Display name, also used for log dump file names.
    pub name: String,
    /// Shell command line to run.
    pub command: String,
    /// Working directory the command runs from.
    pub cwd: String,
    /// Substring that marks the process ready; absent means the first output
    /// already counts as running.
    #[serde(default)]
    pub started_when: Option<String>,
    /// Grouping label shown as a sidebar header.
    pub section: String,
}

/// Loads and parses the launch list from a JSON file.
pub fn load_config(path: &Path) -> Result<Vec<LaunchConfig>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let configs: Vec<LaunchConfig> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(configs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_launch_list() {
        let raw = r#"[
            {
                "name": "api",
                "command": "cargo run",
                "cwd": "services/api",
                "startedWhen": "listening on",
                "section": "backend"
            },
            {
                "name": "web",
                "command": "pnpm dev",
                "cwd": "web",
                "section": "frontend"
            }
        ]"#;
        let configs: Vec<LaunchConfig> = serde_json::from_str(raw).unwrap();
        assert_eq!(configs.len(), 2);
        assert_eq!(configs[0].name, "api");
        assert_eq!(configs[0].started_when.as_deref(), Some("listening on"));
        assert_eq!(configs[1].started_when, None);
        assert_eq!(configs[1].section, "frontend");
    }

    #[test]
    fn rejects_malformed_json() {
        let err = serde_json::from_str::<Vec<LaunchConfig>>("{\"not\": \"an array\"}");
        assert!(err.is_err());
    }

    #[test]
    fn missing_file_reports_the_path() {
        let err = load_config(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
