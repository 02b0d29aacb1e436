//! Configuration discovery and effective settings resolution.
//!
//! iamval reads `iamval.toml|yaml|yml` from the repository root (or closest
//! ancestor) and merges it with CLI flags to produce an `Effective` config.
//! Defaults:
//! - `profile`: unset (ambient credential chain)
//! - `region`: `us-east-1`
//! - `output`: `human`
//! - `policy_type`: `IDENTITY_POLICY`
//! - `fail_on_findings` / `fail_on_error`: false
//! - `server.bind`: `127.0.0.1:8000`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::analyzer::{ConnectionSettings, DEFAULT_REGION};
use crate::models::PolicyType;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
const CONFIG_NAMES: [&str; 3] = ["iamval.toml", "iamval.yaml", "iamval.yml"];
const OUTPUT_MODES: [&str; 2] = ["human", "json"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Web server section under `[server]`.
pub struct ServerCfg {
    pub bind: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `iamval.toml|yaml`.
pub struct IamvalConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub output: Option<String>,
    pub policy_type: Option<String>,
    pub fail_on_findings: Option<bool>,
    pub fail_on_error: Option<bool>,
    #[serde(default)]
    pub server: Option<ServerCfg>,
}

#[derive(Debug, Default, Clone)]
/// Values supplied on the command line. `None` defers to the config file.
pub struct Overrides<'a> {
    pub repo_root: Option<&'a str>,
    pub profile: Option<&'a str>,
    pub region: Option<&'a str>,
    pub output: Option<&'a str>,
    pub policy_type: Option<PolicyType>,
    pub fail_on_findings: Option<bool>,
    pub fail_on_error: Option<bool>,
    pub bind: Option<&'a str>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub profile: Option<String>,
    pub region: String,
    pub output: String,
    pub policy_type: PolicyType,
    pub fail_on_findings: bool,
    pub fail_on_error: bool,
    pub bind: String,
}

impl Effective {
    pub fn connection(&self) -> ConnectionSettings {
        ConnectionSettings {
            profile: self.profile.clone(),
            region: self.region.clone(),
        }
    }
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when an `iamval.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `IamvalConfig` from `iamval.toml` or `iamval.yaml|yml` if present.
///
/// A file that cannot be read or parsed counts as absent.
pub fn load_config(root: &Path) -> Option<IamvalConfig> {
    let toml_path = root.join("iamval.toml");
    if toml_path.exists() {
        let s = fs::read_to_string(&toml_path).ok()?;
        return match toml::from_str(&s) {
            Ok(cfg) => Some(cfg),
            Err(e) => {
                tracing::debug!(path = %toml_path.display(), error = %e, "ignoring malformed config");
                None
            }
        };
    }
    for yml in ["iamval.yaml", "iamval.yml"] {
        let p = root.join(yml);
        if p.exists() {
            let s = fs::read_to_string(&p).ok()?;
            return match serde_yaml::from_str(&s) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    tracing::debug!(path = %p.display(), error = %e, "ignoring malformed config");
                    None
                }
            };
        }
    }
    None
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &Overrides<'_>) -> Effective {
    let start = PathBuf::from(cli.repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let cfg = load_config(&repo_root).unwrap_or_default();

    let profile = cli
        .profile
        .map(|s| s.to_string())
        .or(cfg.profile)
        .filter(|p| !p.trim().is_empty());

    let region = cli
        .region
        .map(|s| s.to_string())
        .or(cfg.region)
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let output = match cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .map(|s| s.trim().to_ascii_lowercase())
    {
        Some(o) if OUTPUT_MODES.contains(&o.as_str()) => o,
        Some(o) => {
            tracing::warn!(output = %o, "unknown output mode; using human");
            "human".to_string()
        }
        None => "human".to_string(),
    };

    let policy_type = cli
        .policy_type
        .or_else(|| {
            let raw = cfg.policy_type.as_deref()?;
            match raw.parse::<PolicyType>() {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!(error = %e, "config policy_type ignored");
                    None
                }
            }
        })
        .unwrap_or_default();

    let fail_on_findings = cli
        .fail_on_findings
        .or(cfg.fail_on_findings)
        .unwrap_or(false);
    let fail_on_error = cli.fail_on_error.or(cfg.fail_on_error).unwrap_or(false);

    let bind = cli
        .bind
        .map(|s| s.to_string())
        .or_else(|| cfg.server.as_ref().and_then(|s| s.bind.clone()))
        .unwrap_or_else(|| DEFAULT_BIND.to_string());

    Effective {
        repo_root,
        profile,
        region,
        output,
        policy_type,
        fail_on_findings,
        fail_on_error,
        bind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("iamval.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
profile = "spoke"
region = "eu-central-1"
output = "json"
policy_type = "resource"
fail_on_findings = true
[server]
bind = "0.0.0.0:9000"
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(&Overrides {
            repo_root: root.to_str(),
            ..Default::default()
        });
        assert_eq!(eff.profile.as_deref(), Some("spoke"));
        assert_eq!(eff.region, "eu-central-1");
        assert_eq!(eff.output, "json");
        assert_eq!(eff.policy_type, PolicyType::ResourcePolicy);
        assert!(eff.fail_on_findings);
        assert!(!eff.fail_on_error);
        assert_eq!(eff.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("iamval.yaml"), "output: human\n").unwrap();

        let eff = resolve_effective(&Overrides {
            repo_root: root.to_str(),
            ..Default::default()
        });
        assert!(eff.profile.is_none());
        assert_eq!(eff.region, "us-east-1");
        assert_eq!(eff.policy_type, PolicyType::IdentityPolicy);
        assert_eq!(eff.bind, DEFAULT_BIND);
        assert_eq!(eff.connection().profile_label(), "default");
    }

    #[test]
    fn test_cli_takes_precedence_over_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("iamval.toml"),
            "profile = \"spoke\"\nfail_on_findings = true\npolicy_type = \"bogus\"\n",
        )
        .unwrap();

        let eff = resolve_effective(&Overrides {
            repo_root: root.to_str(),
            profile: Some("audit"),
            fail_on_findings: Some(false),
            ..Default::default()
        });
        assert_eq!(eff.profile.as_deref(), Some("audit"));
        assert!(!eff.fail_on_findings);
        // Unparseable policy_type in config falls back to the default
        assert_eq!(eff.policy_type, PolicyType::IdentityPolicy);
    }

    #[test]
    fn test_output_mode_is_normalized() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("iamval.toml"), "output = \"JSON\"\n").unwrap();
        let eff = resolve_effective(&Overrides {
            repo_root: root.to_str(),
            ..Default::default()
        });
        assert_eq!(eff.output, "json");

        let eff = resolve_effective(&Overrides {
            repo_root: root.to_str(),
            output: Some("xml"),
            ..Default::default()
        });
        assert_eq!(eff.output, "human");
    }

    #[test]
    fn test_detect_repo_root_walks_up_to_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("iamval.toml"), "").unwrap();
        let nested = root.join("a/b");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(detect_repo_root(&nested), root.to_path_buf());
    }
}
