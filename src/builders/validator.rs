use anyhow::Result;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::builders::rules::{RewriteRule, TOAST_RULES};
use crate::core::config::{self, DevkitConfig};

/// Checks a `DevkitConfig` before any command relies on it.
///
/// The `validate` command goes through this trait, so a stricter or more
/// lenient validator can stand in for `StandardValidator`.
pub trait ConfigValidator {
    /// Runs every check over the configuration and the built-in rewrite rules.
    ///
    /// # Arguments
    /// * `config`: The `DevkitConfig` to check.
    ///
    /// # Returns
    /// A `Result<Vec<String>>` with one message per issue found. An empty
    /// vector means the configuration is usable.
    fn validate_config(&self, config: &DevkitConfig) -> Result<Vec<String>>;

    /// Checks that a single `RewriteRule` compiles and captures a description.
    ///
    /// # Arguments
    /// * `rule`: The `RewriteRule` to check.
    ///
    /// # Returns
    /// A `Result<Vec<String>>` with the issues found for this rule.
    fn validate_rule(&self, rule: &RewriteRule) -> Result<Vec<String>>;
}

/// Resolves relative paths against `root` and checks they exist.
pub struct StandardValidator {
    root: PathBuf,
}

impl StandardValidator {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Checks whether `path`, taken relative to the validator's root, exists.
    ///
    /// # Arguments
    /// * `path`: A path from the configuration.
    ///
    /// # Returns
    /// `true` if something exists at the resolved path.
    fn check_file_exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    /// Duplicate entries would be rewritten twice in one run.
    fn check_duplicate_files(&self, files: &[String]) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for file in files {
            if !seen.insert(file.as_str()) {
                warnings.push(format!("Duplicate file in toast list: {file}"));
            }
        }
        warnings
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_config(&self, config: &DevkitConfig) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        if config.version != config::CONFIG_VERSION {
            issues.push(format!("Unsupported config version: {}", config.version));
        }

        if !self.check_file_exists(&config.env.file) {
            issues.push(format!("Env file not found: {}", config.env.file.display()));
        }

        if config.probe.table.trim().is_empty() {
            issues.push("Probe table name is empty".to_string());
        }
        if config.probe.schema.trim().is_empty() {
            issues.push("Probe schema name is empty".to_string());
        }

        let base_dir = self.root.join(&config.toast.base_dir);
        if !base_dir.is_dir() {
            issues.push(format!(
                "Toast base directory not found: {}",
                config.toast.base_dir.display()
            ));
        }

        if config.toast.files.is_empty() {
            issues.push("Toast file list is empty".to_string());
        }
        issues.extend(self.check_duplicate_files(&config.toast.files));

        for file in &config.toast.files {
            if !base_dir.join(file).exists() {
                issues.push(format!("File not found: {file}"));
            }
        }

        for rule in &TOAST_RULES {
            issues.extend(self.validate_rule(rule)?);
        }

        Ok(issues)
    }

    fn validate_rule(&self, rule: &RewriteRule) -> Result<Vec<String>> {
        let mut issues = Vec::new();

        match rule.compile() {
            Ok(regex) => {
                // The replacement refers to group 1.
                if regex.captures_len() < 2 {
                    issues.push(format!("Rule '{}' has no capture group", rule.name));
                }
            }
            Err(e) => issues.push(format!("{e:#}")),
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::rules::ToastVariant;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_complete_workspace_is_valid() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".env.local"), "A=1\n").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/App.tsx"), "").unwrap();

        let mut config = DevkitConfig::default();
        config.toast.files = vec!["src/App.tsx".to_string()];

        let validator = StandardValidator::new(dir.path().to_path_buf());
        assert!(validator.validate_config(&config).unwrap().is_empty());
    }

    #[test]
    fn test_reports_missing_and_duplicate_entries() {
        let dir = tempdir().unwrap();
        let mut config = DevkitConfig::default();
        config.version = "2.0".to_string();
        config.toast.files = vec!["x.tsx".to_string(), "x.tsx".to_string()];

        let validator = StandardValidator::new(dir.path().to_path_buf());
        let issues = validator.validate_config(&config).unwrap();

        assert!(issues.contains(&"Unsupported config version: 2.0".to_string()));
        assert!(issues.contains(&"Env file not found: .env.local".to_string()));
        assert!(issues.contains(&"Duplicate file in toast list: x.tsx".to_string()));
        assert!(issues.contains(&"File not found: x.tsx".to_string()));
    }

    #[test]
    fn test_rule_without_capture_group() {
        let validator = StandardValidator::new(PathBuf::from("."));
        let rule = RewriteRule {
            name: "no-group",
            variant: ToastVariant::Success,
            pattern: r"toast\(\)",
        };
        assert_eq!(
            validator.validate_rule(&rule).unwrap(),
            vec!["Rule 'no-group' has no capture group".to_string()]
        );
    }

    #[test]
    fn test_invalid_rule_pattern() {
        let validator = StandardValidator::new(PathBuf::from("."));
        let rule = RewriteRule {
            name: "broken",
            variant: ToastVariant::Error,
            pattern: r"toast\((",
        };
        let issues = validator.validate_rule(&rule).unwrap();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Invalid rewrite rule 'broken'"));
    }
}
