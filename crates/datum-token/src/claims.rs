//! Token claims and the parsed token value.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use datum_core::{Profile, ProfileId};
use jsonwebtoken::{Algorithm, Header};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::Clock;

/// Kind of client a token was issued to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientType {
    /// A human-operated client.
    #[default]
    User,
    /// A machine client, e.g. another node.
    Node,
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Node => f.write_str("node"),
        }
    }
}

/// A JWT `NumericDate` kept at millisecond precision.
///
/// Whole seconds go on the wire as an integer, anything finer as a
/// fractional number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericDate {
    millis: i64,
}

impl NumericDate {
    /// A date `secs` seconds after the Unix epoch.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            millis: secs.saturating_mul(1000),
        }
    }

    /// A date `millis` milliseconds after the Unix epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// The instant `at`, truncated to the millisecond.
    #[must_use]
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self::from_millis(at.timestamp_millis())
    }

    /// Milliseconds since the Unix epoch.
    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.millis
    }

    /// The date as a UTC instant, if representable.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}

impl fmt::Display for NumericDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (secs, millis) = (self.millis.div_euclid(1000), self.millis.rem_euclid(1000));
        if millis == 0 {
            write!(f, "{secs}")
        } else {
            write!(f, "{secs}.{millis:03}")
        }
    }
}

impl Serialize for NumericDate {
    #[allow(clippy::cast_precision_loss)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.millis.rem_euclid(1000) == 0 {
            serializer.serialize_i64(self.millis.div_euclid(1000))
        } else {
            serializer.serialize_f64(self.millis as f64 / 1000.0)
        }
    }
}

impl<'de> Deserialize<'de> for NumericDate {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Integers up to 2^53 are exact as f64, far beyond any real date.
        let secs = f64::deserialize(deserializer)?;
        let millis = (secs * 1000.0).round();
        if !millis.is_finite() || millis.abs() >= 9.2e18 {
            return Err(serde::de::Error::custom(format!(
                "NumericDate {secs} out of range"
            )));
        }
        Ok(Self::from_millis(millis as i64))
    }
}

/// Claims carried by every datum token.
///
/// ```json
/// {
///   "iss": "<signer key id>",
///   "sub": "<profile id>",
///   "exp": 1700000000,
///   "username": "alice",
///   "clientType": "user"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Key id of the signer.
    #[serde(default)]
    pub iss: String,
    /// Profile id the token speaks for.
    #[serde(default)]
    pub sub: String,
    /// Expiry. Absent means the token never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<NumericDate>,
    /// Username of the subject at issue time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Kind of client the token was issued to.
    #[serde(rename = "clientType", default)]
    pub client_type: ClientType,
}

impl Claims {
    /// Claims for `subject` with no issuer, expiry or username yet.
    #[must_use]
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            iss: String::new(),
            sub: subject.into(),
            exp: None,
            username: None,
            client_type: ClientType::User,
        }
    }

    /// Claims naming a profile as subject.
    #[must_use]
    pub fn for_profile(profile: &Profile) -> Self {
        Self::new(profile.id.as_str()).with_username(profile.username.clone())
    }

    /// Set the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the client type.
    #[must_use]
    pub fn with_client_type(mut self, client_type: ClientType) -> Self {
        self.client_type = client_type;
        self
    }

    /// Whether the claims are past their expiry at `now`.
    ///
    /// A token is still valid at the exact instant its `exp` names.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp
            .is_some_and(|exp| NumericDate::from_datetime(now) > exp)
    }
}

/// A token whose signature has been verified.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    header: Header,
    claims: Claims,
}

impl Token {
    pub(crate) fn new(raw: impl Into<String>, header: Header, claims: Claims) -> Self {
        Self {
            raw: raw.into(),
            header,
            claims,
        }
    }

    /// The compact serialization the token was parsed from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Signature algorithm named in the header.
    #[must_use]
    pub fn algorithm(&self) -> Algorithm {
        self.header.alg
    }

    /// All claims.
    #[must_use]
    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    /// Subject profile id.
    #[must_use]
    pub fn subject(&self) -> ProfileId {
        ProfileId::new(self.claims.sub.as_str())
    }

    /// Issuer key id as written in the token.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.claims.iss
    }

    /// Username claim, if present.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.claims.username.as_deref()
    }

    /// Client type claim.
    #[must_use]
    pub fn client_type(&self) -> ClientType {
        self.claims.client_type
    }

    /// Expiry instant, if the token expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.claims.exp.and_then(NumericDate::to_datetime)
    }

    /// Whether the token is expired according to `clock`.
    #[must_use]
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        self.claims.is_expired_at(clock.now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims::new("QmSub")
            .with_username("alice")
            .with_client_type(ClientType::Node);
        let json = serde_json::to_value(&claims).unwrap();

        assert_eq!(json["sub"], "QmSub");
        assert_eq!(json["username"], "alice");
        assert_eq!(json["clientType"], "node");
        assert!(json.get("exp").is_none());
    }

    #[test]
    fn test_claims_defaults_when_absent() {
        let claims: Claims = serde_json::from_str(r#"{"sub":"QmSub"}"#).unwrap();
        assert_eq!(claims.client_type, ClientType::User);
        assert!(claims.exp.is_none());
        assert!(claims.iss.is_empty());
    }

    #[test]
    fn test_expiry_boundary() {
        let mut claims = Claims::new("s");
        claims.exp = Some(NumericDate::from_secs(100));

        let at = |millis| Utc.timestamp_millis_opt(millis).single().unwrap();
        assert!(!claims.is_expired_at(at(99_000)));
        assert!(!claims.is_expired_at(at(100_000)));
        assert!(claims.is_expired_at(at(100_001)));

        claims.exp = None;
        assert!(!claims.is_expired_at(at(2_147_483_647_000)));
    }

    #[test]
    fn test_sub_second_expiry() {
        let mut claims = Claims::new("s");
        claims.exp = Some(NumericDate::from_millis(1_700_000_000_010));

        let at = |millis| Utc.timestamp_millis_opt(millis).single().unwrap();
        assert!(!claims.is_expired_at(at(1_700_000_000_010)));
        assert!(claims.is_expired_at(at(1_700_000_000_011)));
        assert!(claims.is_expired_at(at(1_700_000_000_500)));
    }

    #[test]
    fn test_numeric_date_wire_form() {
        let mut claims = Claims::new("s");
        claims.exp = Some(NumericDate::from_secs(1_700_000_000));
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["exp"], serde_json::json!(1_700_000_000));

        claims.exp = Some(NumericDate::from_millis(1_700_000_000_010));
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains(r#""exp":1700000000.01"#), "{json}");
        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.exp, Some(NumericDate::from_millis(1_700_000_000_010)));

        let whole: Claims = serde_json::from_str(r#"{"sub":"s","exp":1700000000}"#).unwrap();
        assert_eq!(whole.exp, Some(NumericDate::from_secs(1_700_000_000)));
        assert_eq!(NumericDate::from_millis(1_700_000_000_010).to_string(), "1700000000.010");

        assert!(serde_json::from_str::<Claims>(r#"{"sub":"s","exp":1e300}"#).is_err());
    }

    #[test]
    fn test_for_profile() {
        let profile = Profile::new("QmBob", "bob");
        let claims = Claims::for_profile(&profile);
        assert_eq!(claims.sub, "QmBob");
        assert_eq!(claims.username.as_deref(), Some("bob"));
    }
}
