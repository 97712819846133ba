//! Registry configuration: which scopes exist and which aliases apply.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::names;
use crate::error::{Error, Result};

static SCOPE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("scope name pattern is valid")
});

/// One named scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSpec {
    /// Scope name, matched ignoring case
    pub name: String,
    /// Whether every write through the registry is rejected
    #[serde(default)]
    pub read_only: bool,
    /// Whether the scope appears in memory snapshots
    #[serde(default = "default_true")]
    pub include_in_snapshot: bool,
}

impl ScopeSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_only: false,
            include_in_snapshot: true,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn excluded_from_snapshot(mut self) -> Self {
        self.include_in_snapshot = false;
        self
    }
}

/// One path alias: `alias` at the start of a path becomes `prefix`, and
/// `postfix` is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    /// Leading shorthand, e.g. `$`
    pub alias: String,
    /// Replacement, e.g. `dialog.`
    pub prefix: String,
    /// Appended to the rewritten path
    #[serde(default)]
    pub postfix: String,
}

impl AliasSpec {
    pub fn new(alias: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            prefix: prefix.into(),
            postfix: String::new(),
        }
    }

    pub fn with_postfix(mut self, postfix: impl Into<String>) -> Self {
        self.postfix = postfix.into();
        self
    }
}

/// Configuration for a [`ScopeRegistry`](super::ScopeRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Scopes, in lookup and snapshot order
    #[serde(default)]
    pub scopes: Vec<ScopeSpec>,
    /// Aliases, applied in order
    #[serde(default)]
    pub aliases: Vec<AliasSpec>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            scopes: vec![
                ScopeSpec::new(names::USER),
                ScopeSpec::new(names::CONVERSATION),
                ScopeSpec::new(names::TURN),
                ScopeSpec::new(names::SETTINGS).read_only(),
                ScopeSpec::new(names::DIALOG),
                ScopeSpec::new(names::DIALOG_CLASS),
                ScopeSpec::new(names::CLASS)
                    .read_only()
                    .excluded_from_snapshot(),
                ScopeSpec::new(names::THIS),
            ],
            aliases: vec![
                AliasSpec::new("$", "dialog."),
                AliasSpec::new("#", "turn.recognized.intents."),
                AliasSpec::new("@@", "turn.recognized.entities."),
                AliasSpec::new("@", "turn.recognized.entities.").with_postfix(".first()"),
                AliasSpec::new("%", "class."),
            ],
        }
    }
}

impl RegistryConfig {
    /// The standard scopes without any aliases.
    pub fn without_aliases() -> Self {
        Self {
            aliases: Vec::new(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check names and aliases.
    pub fn validate(&self) -> Result<()> {
        for (i, scope) in self.scopes.iter().enumerate() {
            if !SCOPE_NAME.is_match(&scope.name) {
                return Err(Error::Config(format!(
                    "invalid scope name '{}': expected letters, digits or '_', not starting with a digit",
                    scope.name
                )));
            }
            if self.scopes[..i]
                .iter()
                .any(|s| s.name.eq_ignore_ascii_case(&scope.name))
            {
                return Err(Error::Config(format!("duplicate scope '{}'", scope.name)));
            }
        }

        for alias in &self.aliases {
            if alias.alias.is_empty() {
                return Err(Error::Config("alias cannot be empty".to_string()));
            }
            if alias.alias.chars().any(char::is_alphanumeric) {
                return Err(Error::Config(format!(
                    "alias '{}' must not contain letters or digits",
                    alias.alias
                )));
            }
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}
