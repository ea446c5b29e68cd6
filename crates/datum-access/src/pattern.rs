//! Colon-delimited resource and action patterns.
//!
//! A pattern is a list of segments separated by `:`, for example
//! `dataset:alice:census` or `remote:*`. Two segment values are special:
//!
//! - `*` matches the candidate segment at its position and everything after
//!   it. It may only appear as the last segment.
//! - `_subject` (resources only) stands for the username of the subject the
//!   request is evaluated for.
//!
//! Containment is checked left to right. A receiver without a trailing
//! wildcard must have exactly as many segments as the candidate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{AccessError, AccessResult};

/// Segment matching the rest of a candidate.
pub const WILDCARD_SEGMENT: &str = "*";

/// Segment replaced by the requesting subject's username.
pub const SUBJECT_SEGMENT: &str = "_subject";

const SEPARATOR: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Pattern {
    raw: String,
    segments: Vec<String>,
}

impl Pattern {
    fn parse(s: &str) -> AccessResult<Self> {
        if s.is_empty() {
            return Err(AccessError::InvalidPattern(s.to_string()));
        }

        let segments: Vec<String> = s.split(SEPARATOR).map(str::to_string).collect();
        let last = segments.len().saturating_sub(1);
        if segments
            .iter()
            .enumerate()
            .any(|(i, seg)| seg == WILDCARD_SEGMENT && i != last)
        {
            return Err(AccessError::InvalidPattern(s.to_string()));
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }

    /// Build from a literal known to parse.
    fn from_valid(s: &'static str) -> Self {
        Self {
            raw: s.to_string(),
            segments: s.split(SEPARATOR).map(str::to_string).collect(),
        }
    }

    fn is_wildcard(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == WILDCARD_SEGMENT
    }

    fn contains(&self, candidate: &Self, subject: Option<&str>) -> bool {
        if self.is_wildcard() {
            return true;
        }

        for (i, seg) in self.segments.iter().enumerate() {
            if seg == WILDCARD_SEGMENT {
                // The wildcard covers a segment, it does not stand for "nothing".
                return i < candidate.segments.len();
            }
            let Some(theirs) = candidate.segments.get(i) else {
                return false;
            };
            let ours = match subject {
                Some(username) if seg == SUBJECT_SEGMENT => username,
                _ => seg.as_str(),
            };
            if ours != theirs {
                return false;
            }
        }

        self.segments.len() == candidate.segments.len()
    }
}

macro_rules! pattern_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(Pattern);

        impl $name {
            /// Parse a pattern string.
            ///
            /// # Errors
            ///
            /// Returns [`AccessError::InvalidPattern`] if the string is empty
            /// or a `*` segment is followed by further segments.
            pub fn parse(s: &str) -> AccessResult<Self> {
                Pattern::parse(s).map(Self)
            }

            pub(crate) fn from_valid(s: &'static str) -> Self {
                Self(Pattern::from_valid(s))
            }

            /// The pattern as written.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0.raw
            }

            /// The colon-separated segments.
            #[must_use]
            pub fn segments(&self) -> &[String] {
                &self.0.segments
            }

            /// Whether this is the bare `*` pattern.
            #[must_use]
            pub fn is_wildcard(&self) -> bool {
                self.0.is_wildcard()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0.raw)
            }
        }

        impl FromStr for $name {
            type Err = AccessError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = AccessError;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                Self::parse(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0.raw)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

pattern_type!(
    /// A protected object, e.g. `dataset:alice:census` or `dataset:_subject:*`.
    Resource
);

pattern_type!(
    /// An operation category, e.g. `remote:push` or `*`.
    Action
);

impl Resource {
    /// Whether `candidate` is covered by this pattern.
    ///
    /// `_subject` segments of the receiver are compared as `subject`.
    #[must_use]
    pub fn contains(&self, candidate: &Resource, subject: &str) -> bool {
        self.0.contains(&candidate.0, Some(subject))
    }
}

impl Action {
    /// Whether `candidate` is covered by this pattern.
    ///
    /// Actions have no subject substitution; `_subject` is an ordinary
    /// segment here.
    #[must_use]
    pub fn contains(&self, candidate: &Action) -> bool {
        self.0.contains(&candidate.0, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn res(s: &str) -> Resource {
        Resource::parse(s).unwrap()
    }

    fn act(s: &str) -> Action {
        Action::parse(s).unwrap()
    }

    #[test]
    fn test_parse_rejects_empty_and_inner_wildcards() {
        for bad in ["", "*:foo", "dataset:*:foo", "*:*"] {
            assert!(
                matches!(Resource::parse(bad), Err(AccessError::InvalidPattern(_))),
                "{bad:?} should not parse"
            );
            assert!(Action::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_parse_accepts_plain_and_trailing_wildcards() {
        for good in ["*", "dataset", "dataset:*", "dataset:a:b", "a::b", ":", "a:"] {
            let r = Resource::parse(good).unwrap();
            assert_eq!(r.as_str(), good);
        }
        assert_eq!(res("a::b").segments(), ["a", "", "b"]);
    }

    #[test]
    fn test_bare_wildcard_contains_everything() {
        let all = res("*");
        assert!(all.is_wildcard());
        for c in ["apples", "dataset:foo:bar:baz", "*", "a::b"] {
            assert!(all.contains(&res(c), "anyone"));
        }
        assert!(act("*").contains(&act("remote:push")));
    }

    #[test]
    fn test_exact_and_prefix_matches() {
        assert!(!res("candy:*").contains(&res("apples"), ""));
        assert!(res("candy:apples").contains(&res("candy:apples"), ""));
        assert!(!res("candy:apples").contains(&res("candy:applez"), ""));
        assert!(!res("candy:apples").contains(&res("candy"), ""));
    }

    #[test]
    fn test_trailing_wildcard_depth() {
        assert!(!res("dataset:foo:bar").contains(&res("dataset:foo:bar:baz"), ""));
        assert!(res("dataset:foo:*").contains(&res("dataset:foo:bar:baz"), ""));
        assert!(res("dataset:foo:bar:*").contains(&res("dataset:foo:bar:baz"), ""));
        assert!(res("dataset:*").contains(&res("dataset:x"), ""));
    }

    #[test]
    fn test_wildcard_needs_a_segment_to_cover() {
        assert!(!res("dataset:*").contains(&res("dataset"), ""));
        assert!(!res("dataset:foo:*").contains(&res("dataset:foo"), ""));
    }

    #[test]
    fn test_subject_substitution() {
        let pat = res("dataset:_subject:bar:*");
        let candidate = res("dataset:user:bar:baz");
        assert!(pat.contains(&candidate, "user"));
        assert!(!pat.contains(&candidate, "other_user"));

        // Only the position holding `_subject` is substituted.
        assert!(!res("dataset:_subject").contains(&res("user:user"), "user"));
    }

    #[test]
    fn test_candidate_wildcard_is_literal() {
        assert!(!res("dataset:foo").contains(&res("dataset:*"), ""));
        assert!(res("dataset:*").contains(&res("dataset:*"), ""));
    }

    #[test]
    fn test_actions_do_not_substitute() {
        let pat = act("remote:_subject");
        assert!(!pat.contains(&act("remote:bob")));
        assert!(pat.contains(&act("remote:_subject")));
        assert!(act("remote:*").contains(&act("remote:push")));
        assert!(!act("remote:push").contains(&act("remote:pull")));
    }

    #[test]
    fn test_display_and_from_str() {
        let r: Resource = "dataset:alice:*".parse().unwrap();
        assert_eq!(r.to_string(), "dataset:alice:*");
        assert!("*:x".parse::<Action>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let r = res("dataset:_subject:*");
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"dataset:_subject:*\"");
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);

        assert!(serde_json::from_str::<Action>("\"\"").is_err());
    }
}
