//! Wildcard patterns for asset name matching.
//!
//! A pattern is compiled into an anchored regular expression: `*` matches any
//! sequence of characters (including none), `?` matches exactly one, and
//! everything else matches literally. The expression is built one character
//! at a time, so regex metacharacters and literal backslashes in the pattern
//! never need a second unescaping pass.

use regex::Regex;

use crate::platform::PlatformTag;
use crate::process::{ProcessSpec, SourceFileType};
use crate::{Error, Result};

/// A compiled wildcard pattern. Matches whole strings, not substrings.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    pattern: String,
    regex: Regex,
}

impl WildcardPattern {
    /// Compile a wildcard pattern.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the derived expression fails to
    /// compile (pathological pattern length).
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut source = String::with_capacity(pattern.len() + 2);
        source.push('^');
        for ch in pattern.chars() {
            match ch {
                '*' => source.push_str(".*"),
                '?' => source.push('.'),
                other => source.push_str(&regex::escape(&other.to_string())),
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|e| {
            Error::configuration(format!("Invalid wildcard pattern '{pattern}': {e}"))
        })?;

        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Whether `candidate` matches the whole pattern.
    #[must_use]
    pub fn is_match(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The original pattern text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }
}

impl std::fmt::Display for WildcardPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// The asset/file selection predicate for one effective spec: either
/// platform-tag substring containment (the default) or a compiled wildcard
/// pattern. Both resolvers select the first candidate this matches.
#[derive(Debug, Clone)]
pub enum AssetMatcher {
    /// Substring match against the platform tag.
    Platform(PlatformTag),
    /// Whole-string wildcard match.
    Pattern(WildcardPattern),
}

impl AssetMatcher {
    /// Build the matcher for an effective spec.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `sourceFileType` is
    /// `pattern-match` but no `sourceFilePattern` was supplied. This is
    /// checked before any network or filesystem access.
    pub fn for_spec(spec: &ProcessSpec, platform: PlatformTag) -> Result<Self> {
        match spec.source_file_type {
            SourceFileType::PatternMatch => {
                let pattern = spec.source_file_pattern.as_deref().ok_or_else(|| {
                    Error::configuration(
                        "sourceFilePattern is required when sourceFileType is \"pattern-match\"",
                    )
                })?;
                Ok(Self::Pattern(WildcardPattern::compile(pattern)?))
            }
            SourceFileType::PlatformBinary => Ok(Self::Platform(platform)),
        }
    }

    /// Whether `candidate` is selected by this matcher.
    #[must_use]
    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Platform(tag) => tag.matches(candidate),
            Self::Pattern(pattern) => pattern.is_match(candidate),
        }
    }
}

impl std::fmt::Display for AssetMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Platform(tag) => write!(f, "platform tag '{tag}'"),
            Self::Pattern(pattern) => write!(f, "pattern '{pattern}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_any_run() {
        let p = WildcardPattern::compile("*.tar.gz").unwrap();
        assert!(p.is_match("app-osx.tar.gz"));
        assert!(p.is_match(".tar.gz"));
        assert!(!p.is_match("app-osx.zip"));
    }

    #[test]
    fn question_mark_matches_exactly_one() {
        let p = WildcardPattern::compile("app-?").unwrap();
        assert!(p.is_match("app-1"));
        assert!(!p.is_match("app-12"));
        assert!(!p.is_match("app-"));
    }

    #[test]
    fn match_is_anchored() {
        let p = WildcardPattern::compile("tool").unwrap();
        assert!(p.is_match("tool"));
        assert!(!p.is_match("tool-linux"));
        assert!(!p.is_match("my-tool"));
    }

    #[test]
    fn metacharacters_are_literal() {
        let p = WildcardPattern::compile("a.b").unwrap();
        assert!(p.is_match("a.b"));
        assert!(!p.is_match("axb"));

        let p = WildcardPattern::compile("v1+2(x)").unwrap();
        assert!(p.is_match("v1+2(x)"));
    }

    #[test]
    fn literal_backslash_is_literal() {
        let p = WildcardPattern::compile(r"dir\*.bin").unwrap();
        assert!(p.is_match(r"dir\tool.bin"));
        assert!(!p.is_match("dirtool.bin"));

        let p = WildcardPattern::compile(r"a\\b").unwrap();
        assert!(p.is_match(r"a\\b"));
        assert!(!p.is_match(r"a\b"));
    }

    #[test]
    fn empty_pattern_matches_only_empty() {
        let p = WildcardPattern::compile("").unwrap();
        assert!(p.is_match(""));
        assert!(!p.is_match("x"));
    }

    #[test]
    fn matcher_defaults_to_platform_substring() {
        let spec: ProcessSpec =
            serde_json::from_value(serde_json::json!({ "source": "acme/tool" })).unwrap();
        let matcher = AssetMatcher::for_spec(&spec, PlatformTag::Linux).unwrap();
        assert!(matcher.is_match("tool-linux"));
        assert!(!matcher.is_match("tool-win.exe"));
    }

    #[test]
    fn matcher_requires_pattern_in_pattern_mode() {
        let spec: ProcessSpec = serde_json::from_value(serde_json::json!({
            "source": "acme/tool",
            "sourceFileType": "pattern-match"
        }))
        .unwrap();
        let err = AssetMatcher::for_spec(&spec, PlatformTag::Linux).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn matcher_uses_supplied_pattern() {
        let spec: ProcessSpec = serde_json::from_value(serde_json::json!({
            "source": "acme/tool",
            "sourceFileType": "pattern-match",
            "sourceFilePattern": "tool-*.zip"
        }))
        .unwrap();
        let matcher = AssetMatcher::for_spec(&spec, PlatformTag::Linux).unwrap();
        assert!(matcher.is_match("tool-1.2.3.zip"));
        assert!(!matcher.is_match("tool-1.2.3.tar.gz"));
    }
}
