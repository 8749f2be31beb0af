use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;

/// The two single-argument toast functions calls are rewritten into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
}

/// Displays the method name, as in `toast.success(...)`.
impl fmt::Display for ToastVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastVariant::Success => write!(f, "success"),
            ToastVariant::Error => write!(f, "error"),
        }
    }
}

/// One call-shape substitution.
///
/// `pattern` must capture the description expression in group 1; the match
/// is replaced by `toast.<variant>(<group 1>)`.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pub name: &'static str,
    pub variant: ToastVariant,
    pub pattern: &'static str,
}

impl RewriteRule {
    pub fn replacement(&self) -> String {
        format!("toast.{}(${{1}})", self.variant)
    }

    pub fn compile(&self) -> Result<Regex> {
        Regex::new(self.pattern).with_context(|| format!("Invalid rewrite rule '{}'", self.name))
    }
}

/// The object-payload shapes, in the order they are applied.
///
/// All patterns run with `(?s)` so a call may span several lines. Rule 3 is a
/// narrower form of rule 2 and only fires on text rule 2 left alone.
pub const TOAST_RULES: [RewriteRule; 4] = [
    RewriteRule {
        name: "success-with-description",
        variant: ToastVariant::Success,
        pattern: r#"(?s)toast\(\{\s*title:\s*['"]Success['"]\s*,\s*description:\s*(['"].*?['"])\s*,?\s*\}\)"#,
    },
    RewriteRule {
        name: "destructive-error",
        variant: ToastVariant::Error,
        pattern: r#"(?s)toast\(\{\s*title:\s*['"]Error['"]\s*,\s*description:\s*(['"].*?['"]|.*?)\s*,?\s*variant:\s*['"]destructive['"]\s*,?\s*\}\)"#,
    },
    RewriteRule {
        name: "destructive-result-error",
        variant: ToastVariant::Error,
        pattern: r#"(?s)toast\(\{\s*title:\s*['"]Error['"]\s*,\s*description:\s*(result\.error\s*\|\|\s*['"].*?['"])\s*,?\s*variant:\s*['"]destructive['"]\s*,?\s*\}\)"#,
    },
    RewriteRule {
        name: "plain-error",
        variant: ToastVariant::Error,
        pattern: r#"(?s)toast\(\{\s*title:\s*['"]Error['"]\s*,\s*description:\s*(.*?)\s*,?\s*\}\)"#,
    },
];

/// Text after a rewrite, with how often each rule fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub content: String,
    /// `(rule name, replacements)` in rule order.
    pub counts: Vec<(&'static str, usize)>,
}

impl Rewrite {
    pub fn replacements(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }
}

/// Something that can rewrite the full text of a source file.
pub trait TextRewriter {
    fn rewrite(&self, content: &str) -> Rewrite;
}

/// Applies a fixed list of rules, each globally, in order.
pub struct RulePipeline {
    rules: Vec<(RewriteRule, Regex)>,
}

impl RulePipeline {
    pub fn new(rules: &[RewriteRule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| -> Result<(RewriteRule, Regex)> { Ok((rule.clone(), rule.compile()?)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// The `toast({...})` to `toast.success/error(...)` pipeline.
    pub fn toast_api() -> Result<Self> {
        Self::new(&TOAST_RULES)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|(rule, _)| rule.name).collect()
    }
}

impl TextRewriter for RulePipeline {
    fn rewrite(&self, content: &str) -> Rewrite {
        let mut text = content.to_string();
        let mut counts = Vec::with_capacity(self.rules.len());

        for (rule, regex) in &self.rules {
            let hits = regex.find_iter(&text).count();
            if hits > 0 {
                text = regex
                    .replace_all(&text, rule.replacement().as_str())
                    .into_owned();
            }
            counts.push((rule.name, hits));
        }

        Rewrite {
            content: text,
            counts,
        }
    }
}

/// Rewrites every object-payload toast call in `content`.
pub fn fix_toast_calls(content: &str) -> Result<String> {
    Ok(RulePipeline::toast_api()?.rewrite(content).content)
}
