//! Capability namespace names.

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator used by providers to qualify tool names (`dexscreener.search_pairs`).
///
/// The capability namespace only accepts `[A-Za-z0-9_-]`, so every occurrence is
/// rewritten to an underscore.
pub const NAMESPACE_SEPARATOR: char = '.';

/// Tool name rewritten to satisfy the capability namespace.
///
/// Formatting is not injective: `a.b_c` and `a_b.c` both become `a_b_c`. The
/// registry resolves such collisions, not the name itself.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FormattedName(String);

impl FormattedName {
    /// Wraps an already formatted name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if the name is empty or still contains
    /// the namespace separator.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::InvalidName {
                name,
                reason: "name cannot be empty".into(),
            });
        }
        if name.contains(NAMESPACE_SEPARATOR) {
            return Err(Error::InvalidName {
                name,
                reason: format!("name cannot contain `{NAMESPACE_SEPARATOR}`"),
            });
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Rewrites a provider-qualified tool name into the capability namespace.
///
/// Pure and total: every [`NAMESPACE_SEPARATOR`] becomes `_`, all other
/// characters pass through unchanged. An empty input yields an empty name,
/// which [`FormattedName::new`] would reject; the capability builder skips
/// such tools instead of registering them.
#[must_use]
pub fn format_name(name: &str) -> FormattedName {
    FormattedName(name.replace(NAMESPACE_SEPARATOR, "_"))
}

impl Display for FormattedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FormattedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FormattedName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FormattedName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<FormattedName> for String {
    fn from(value: FormattedName) -> Self {
        value.0
    }
}
