//! Per-deployment selection and aliasing of provider tools.

use std::borrow::Cow;

use agent_primitives::NAMESPACE_SEPARATOR;
use serde::{Deserialize, Serialize};

/// Maps several source names onto one canonical capability base name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    sources: Vec<String>,
    target: String,
}

impl AliasRule {
    /// Creates a rule renaming any of `sources` to `target`.
    pub fn new<I, S>(sources: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            target: target.into(),
        }
    }

    /// Returns the canonical target name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// A source matches the full provider name or its last namespace segment.
    fn matches(&self, name: &str) -> bool {
        let function = name.rsplit(NAMESPACE_SEPARATOR).next().unwrap_or(name);
        self.sources
            .iter()
            .any(|source| source == name || source == function)
    }
}

/// Decides which tools become capabilities and under which base name.
///
/// Evaluation order: prefix filter, exclusion filter, then the first alias
/// rule that matches. The default policy accepts every tool unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    excluded: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    aliases: Vec<AliasRule>,
}

impl SelectionPolicy {
    /// Policy accepting every tool under its own name.
    #[must_use]
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Only admits tools whose provider name starts with `prefix`.
    #[must_use]
    pub fn allow_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Rejects tools whose provider name contains `fragment`.
    #[must_use]
    pub fn exclude_containing(mut self, fragment: impl Into<String>) -> Self {
        self.excluded.push(fragment.into());
        self
    }

    /// Appends an alias rule. Earlier rules take precedence.
    #[must_use]
    pub fn alias<I, S>(mut self, sources: I, target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.push(AliasRule::new(sources, target));
        self
    }

    /// Returns the base name to build under, or `None` when the tool is skipped.
    #[must_use]
    pub fn select<'a>(&'a self, name: &'a str) -> Option<Cow<'a, str>> {
        if let Some(prefix) = &self.prefix {
            if !name.starts_with(prefix.as_str()) {
                return None;
            }
        }

        if self
            .excluded
            .iter()
            .any(|fragment| name.contains(fragment.as_str()))
        {
            return None;
        }

        let base = self
            .aliases
            .iter()
            .find(|rule| rule.matches(name))
            .map_or(Cow::Borrowed(name), |rule| Cow::Borrowed(rule.target()));
        Some(base)
    }
}
