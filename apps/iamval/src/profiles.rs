//! Named-profile discovery from the shared AWS config and credentials files.
//!
//! Only section headers are read; credential material is never parsed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

fn shared_file(env_key: &str, default_name: &str) -> Option<PathBuf> {
    std::env::var_os(env_key)
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|h| h.join(".aws").join(default_name)))
}

/// Section names from an INI-style file. `[profile x]` yields `x` when
/// `strip_profile_prefix` is set (config file), `[sso-session x]` is skipped.
pub fn section_names(text: &str, strip_profile_prefix: bool) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
            if inner.is_empty() {
                return None;
            }
            if strip_profile_prefix {
                if let Some(name) = inner.strip_prefix("profile ") {
                    return Some(name.trim().to_string());
                }
                if inner == "default" {
                    return Some(inner.to_string());
                }
                None
            } else {
                Some(inner.to_string())
            }
        })
        .collect()
}

fn read_sections(path: &Path, strip_profile_prefix: bool) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(s) => section_names(&s, strip_profile_prefix),
        Err(_) => Vec::new(),
    }
}

/// Profiles from `AWS_SHARED_CREDENTIALS_FILE` and `AWS_CONFIG_FILE`
/// (defaulting to `~/.aws/credentials` and `~/.aws/config`).
///
/// Sorted and deduplicated; `["default"]` when nothing is configured.
pub fn list_profiles() -> Vec<String> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    if let Some(p) = shared_file("AWS_SHARED_CREDENTIALS_FILE", "credentials") {
        names.extend(read_sections(&p, false));
    }
    if let Some(p) = shared_file("AWS_CONFIG_FILE", "config") {
        names.extend(read_sections(&p, true));
    }
    if names.is_empty() {
        return vec!["default".to_string()];
    }
    names.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_sections_strip_profile_prefix() {
        let text = "[default]\nregion = us-east-1\n\n[profile spoke]\nregion=eu-west-1\n[sso-session corp]\nsso_region = us-east-1\n";
        assert_eq!(section_names(text, true), vec!["default", "spoke"]);
    }

    #[test]
    fn test_credentials_sections_are_verbatim() {
        let text = "[default]\naws_access_key_id = x\n[audit]\n  [ ci ]  \n";
        assert_eq!(section_names(text, false), vec!["default", "audit", "ci"]);
    }
}
