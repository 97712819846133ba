//! Path shorthands such as `$name` for `dialog.name`.

use std::borrow::Cow;
use std::fmt;

use super::config::AliasSpec;

/// Rewrites a path before scope resolution.
pub trait PathResolver: Send + Sync + fmt::Debug {
    /// Return the rewritten path, or `path` unchanged when this resolver does
    /// not apply.
    fn transform_path<'p>(&self, path: &'p str) -> Cow<'p, str>;
}

/// Replaces a leading alias with a prefix and appends a postfix.
///
/// The alias only applies when it is directly followed by a letter, so `$`
/// alone or `$1` pass through unchanged, and `@@x` is never taken for `@`
/// followed by `@x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasResolver {
    alias: String,
    prefix: String,
    postfix: String,
}

impl AliasResolver {
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

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl From<&AliasSpec> for AliasResolver {
    fn from(spec: &AliasSpec) -> Self {
        Self::new(spec.alias.clone(), spec.prefix.clone()).with_postfix(spec.postfix.clone())
    }
}

impl PathResolver for AliasResolver {
    fn transform_path<'p>(&self, path: &'p str) -> Cow<'p, str> {
        let trimmed = path.trim();
        match trimmed.strip_prefix(self.alias.as_str()) {
            Some(rest) if rest.starts_with(char::is_alphabetic) => {
                Cow::Owned(format!("{}{}{}", self.prefix, rest, self.postfix))
            }
            _ => Cow::Borrowed(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::config::RegistryConfig;

    fn standard() -> Vec<AliasResolver> {
        RegistryConfig::default()
            .aliases
            .iter()
            .map(AliasResolver::from)
            .collect()
    }

    fn apply(path: &str) -> String {
        standard()
            .iter()
            .fold(path.to_string(), |p, r| r.transform_path(&p).into_owned())
    }

    #[test]
    fn test_standard_aliases() {
        assert_eq!(apply("$name"), "dialog.name");
        assert_eq!(apply("#Greeting.score"), "turn.recognized.intents.Greeting.score");
        assert_eq!(apply("@@city"), "turn.recognized.entities.city");
        assert_eq!(apply("@city"), "turn.recognized.entities.city.first()");
        assert_eq!(apply("%options"), "class.options");
        assert_eq!(apply("  $padded "), "dialog.padded");
    }

    #[test]
    fn test_alias_requires_letter() {
        assert_eq!(apply("$"), "$");
        assert_eq!(apply("$1"), "$1");
        assert_eq!(apply("@"), "@");
        assert_eq!(apply("user.name"), "user.name");
        assert_eq!(apply("dialog.$x"), "dialog.$x");
    }

    #[test]
    fn test_unchanged_path_is_borrowed() {
        let resolver = AliasResolver::new("$", "dialog.");
        assert_eq!(resolver.alias(), "$");
        assert!(matches!(resolver.transform_path("user.x"), Cow::Borrowed(_)));
    }
}
