use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Key holding the base URL of the database service.
pub const URL_KEY: &str = "NEXT_PUBLIC_SUPABASE_URL";
/// Privileged credential, preferred by the schema probe.
pub const SERVICE_ROLE_KEY: &str = "NEXT_PUBLIC_SUPABASE_SERVICE_ROLE_KEY";
/// Public credential, used as the fallback and by the migration runner.
pub const ANON_KEY: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

/// Which credential was picked out of the env file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    ServiceRole,
    Anon,
}

/// The two literal values a client is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub key: String,
    pub key_kind: KeyKind,
}

/// An in-memory view of a `KEY=value` file such as `.env.local`.
///
/// Lines that do not look like an assignment (comments, blank lines) are
/// skipped. When a key is assigned more than once the last assignment wins.
#[derive(Debug, Default, Clone)]
pub struct EnvFile {
    values: HashMap<String, String>,
}

impl EnvFile {
    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read env file {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parses env file content.
    pub fn parse(content: &str) -> Result<Self> {
        let line_re = Regex::new(ASSIGNMENT_PATTERN).context("Invalid env assignment pattern")?;
        let mut values = HashMap::new();

        for line in content.lines() {
            let Some(caps) = line_re.captures(line) else {
                continue;
            };
            let key = caps[1].to_string();
            let raw = caps.get(2).map_or("", |m| m.as_str()).trim_end();
            values.insert(key, unquote(raw).to_string());
        }

        Ok(Self { values })
    }

    /// Returns the value for `key`, treating an empty value as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// URL plus the service-role key, falling back to the anon key.
    pub fn privileged_credentials(&self) -> Option<Credentials> {
        let url = self.get(URL_KEY)?;
        let (key, key_kind) = match self.get(SERVICE_ROLE_KEY) {
            Some(key) => (key, KeyKind::ServiceRole),
            None => (self.get(ANON_KEY)?, KeyKind::Anon),
        };
        Some(Credentials {
            url: url.to_string(),
            key: key.to_string(),
            key_kind,
        })
    }

    /// URL plus the anon key only.
    pub fn anon_credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            url: self.get(URL_KEY)?.to_string(),
            key: self.get(ANON_KEY)?.to_string(),
            key_kind: KeyKind::Anon,
        })
    }
}

const ASSIGNMENT_PATTERN: &str = r"^\s*([\w.-]+)\s*=\s*(.*)?\s*$";

/// Strips one pair of double quotes, then one pair of single quotes.
fn unquote(value: &str) -> &str {
    let value = strip_pair(value, '"');
    strip_pair(value, '\'')
}

/// A lone quote counts as both ends of the pair and leaves nothing.
fn strip_pair(value: &str, quote: char) -> &str {
    match value.strip_prefix(quote) {
        Some(inner) if value.ends_with(quote) => inner.strip_suffix(quote).unwrap_or(""),
        _ => value,
    }
}
