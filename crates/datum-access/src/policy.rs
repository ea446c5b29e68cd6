//! Rule-based access policy.

use std::fmt;
use std::path::Path;

use datum_core::Profile;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AccessError, AccessResult};
use crate::pattern::{Action, Resource};

/// Subject value matching every profile.
const ANY_SUBJECT: &str = "*";

const ERR_SUBJECT: &str = "rule.Subject is required";
const ERR_RESOURCES: &str = "rule.Resources field is required";
const ERR_EFFECT: &str = r#"rule.Effect must be one of ("allow"|"deny")"#;
const ERR_ACTIONS: &str = "rule.Actions field is required";

/// Outcome a rule assigns to the requests it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Permit the request.
    Allow,
    /// Refuse the request.
    Deny,
}

impl Effect {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "allow" => Some(Self::Allow),
            "deny" => Some(Self::Deny),
            _ => None,
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

/// One row of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Free-form description.
    pub title: String,
    /// Effect when the rule applies.
    pub effect: Effect,
    /// Profile id the rule is about, or `*` for everyone.
    pub subject: String,
    /// Resources the rule covers. Never empty.
    pub resources: Vec<Resource>,
    /// Actions the rule covers. Never empty.
    pub actions: Vec<Action>,
}

impl Rule {
    /// Build a rule from pattern strings.
    ///
    /// # Errors
    ///
    /// Fails on an empty subject, an empty pattern list or an invalid
    /// pattern, with the same errors as document loading.
    pub fn new(
        title: impl Into<String>,
        effect: Effect,
        subject: impl Into<String>,
        resources: &[&str],
        actions: &[&str],
    ) -> AccessResult<Self> {
        let subject = subject.into();
        if subject.is_empty() {
            return Err(AccessError::InvalidRule(ERR_SUBJECT.to_string()));
        }
        if resources.is_empty() {
            return Err(AccessError::InvalidRule(ERR_RESOURCES.to_string()));
        }
        if actions.is_empty() {
            return Err(AccessError::InvalidRule(ERR_ACTIONS.to_string()));
        }
        Ok(Self {
            title: title.into(),
            effect,
            subject,
            resources: resources
                .iter()
                .map(|s| Resource::parse(s))
                .collect::<AccessResult<_>>()?,
            actions: actions
                .iter()
                .map(|s| Action::parse(s))
                .collect::<AccessResult<_>>()?,
        })
    }

    /// Whether this rule applies to `subject` requesting `action` on `resource`.
    #[must_use]
    pub fn applies(&self, subject: &Profile, resource: &Resource, action: &Action) -> bool {
        (self.subject == ANY_SUBJECT || self.subject == subject.id.as_str())
            && self
                .resources
                .iter()
                .any(|r| r.contains(resource, &subject.username))
            && self.actions.iter().any(|a| a.contains(action))
    }
}

/// A rule as it appears in a document, before validation.
///
/// Fields stay untyped so that a wrong shape reports the field-specific
/// message instead of a serde type error.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRule {
    title: Option<Value>,
    effect: Option<Value>,
    subject: Option<Value>,
    resources: Option<Value>,
    actions: Option<Value>,
}

fn string_list(value: Option<&Value>) -> Option<Vec<&str>> {
    let items = value?.as_array()?;
    if items.is_empty() {
        return None;
    }
    items.iter().map(Value::as_str).collect()
}

impl TryFrom<RawRule> for Rule {
    type Error = AccessError;

    fn try_from(raw: RawRule) -> AccessResult<Self> {
        let subject = raw
            .subject
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AccessError::InvalidRule(ERR_SUBJECT.to_string()))?;

        let resources = string_list(raw.resources.as_ref())
            .ok_or_else(|| AccessError::InvalidRule(ERR_RESOURCES.to_string()))?;

        let effect = raw
            .effect
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Effect::from_name)
            .ok_or_else(|| AccessError::InvalidRule(ERR_EFFECT.to_string()))?;

        let actions = string_list(raw.actions.as_ref())
            .ok_or_else(|| AccessError::InvalidRule(ERR_ACTIONS.to_string()))?;

        let title = raw
            .title
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or_default();

        Rule::new(title, effect, subject, &resources, &actions)
    }
}

/// Result of evaluating a policy against one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Whether any rule applied.
    pub matched: bool,
    /// Effect of the last applying rule; [`Effect::Deny`] when none applied.
    pub effect: Effect,
}

impl Decision {
    /// The decision when no rule applies.
    pub const UNMATCHED: Self = Self {
        matched: false,
        effect: Effect::Deny,
    };

    /// Whether the request is permitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.matched && self.effect == Effect::Allow
    }
}

/// An ordered list of rules.
///
/// Policies are immutable once loaded and safe to share between threads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Policy {
    rules: Vec<Rule>,
}

impl Policy {
    /// Create a policy from rules, in evaluation order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The policy used when none is configured: everyone may pull any
    /// dataset, and users have full remote access to their own datasets.
    #[must_use]
    pub fn default_policy() -> Self {
        Self::new(vec![
            Rule {
                title: "pull all datasets".to_string(),
                effect: Effect::Allow,
                subject: ANY_SUBJECT.to_string(),
                resources: vec![Resource::from_valid("dataset:*")],
                actions: vec![Action::from_valid("remote:pull")],
            },
            Rule {
                title: "full access to own datasets".to_string(),
                effect: Effect::Allow,
                subject: ANY_SUBJECT.to_string(),
                resources: vec![Resource::from_valid("dataset:_subject:*")],
                actions: vec![Action::from_valid("remote:*")],
            },
        ])
    }

    /// Parse a JSON policy document: an array of rule objects.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Json`] for malformed JSON,
    /// [`AccessError::InvalidRule`] for a rule missing a required field and
    /// [`AccessError::InvalidPattern`] for a bad pattern string.
    pub fn from_json(json: &str) -> AccessResult<Self> {
        let raw: Vec<RawRule> = serde_json::from_str(json)?;
        let rules = raw
            .into_iter()
            .map(Rule::try_from)
            .collect::<AccessResult<Vec<_>>>()?;
        Ok(Self::new(rules))
    }

    /// Load a JSON policy document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Io`] if the file cannot be read, otherwise as
    /// [`Policy::from_json`].
    pub fn from_file(path: impl AsRef<Path>) -> AccessResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AccessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let policy = Self::from_json(&json)?;
        tracing::debug!(path = %path.display(), rules = policy.len(), "loaded access policy");
        Ok(policy)
    }

    /// Serialize as a JSON policy document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> AccessResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the policy has no rules (and so denies everything).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluate a request. Every rule is visited; the last one that applies
    /// sets the effect.
    #[must_use]
    pub fn decide(&self, subject: &Profile, resource: &Resource, action: &Action) -> Decision {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.applies(subject, resource, action))
            .fold(Decision::UNMATCHED, |_, (index, rule)| {
                tracing::trace!(index, title = %rule.title, effect = %rule.effect, "rule applies");
                Decision {
                    matched: true,
                    effect: rule.effect,
                }
            })
    }

    /// Check that `subject` may perform `action` on `resource`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::InvalidPattern`] if either string does not
    /// parse, and [`AccessError::AccessDenied`] unless the decision is allow.
    pub fn enforce(&self, subject: &Profile, resource: &str, action: &str) -> AccessResult<()> {
        let resource = Resource::parse(resource)?;
        let action = Action::parse(action)?;

        let decision = self.decide(subject, &resource, &action);
        tracing::debug!(
            subject = %subject.id,
            %resource,
            %action,
            matched = decision.matched,
            effect = %decision.effect,
            "access decision"
        );

        if decision.is_allowed() {
            Ok(())
        } else {
            Err(AccessError::AccessDenied)
        }
    }
}

impl<'de> Deserialize<'de> for Policy {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Vec::<RawRule>::deserialize(deserializer)?;
        raw.into_iter()
            .map(Rule::try_from)
            .collect::<AccessResult<Vec<_>>>()
            .map(Self::new)
            .map_err(serde::de::Error::custom)
    }
}
