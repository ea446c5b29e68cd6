//! Prelude module - commonly used types for convenient import.
//!
//! Use `use datum_token::prelude::*;` to import all essential types.

// Errors
pub use crate::{TokenError, TokenResult};

// Tokens
pub use crate::{Claims, ClientType, Token, TokenSource, decode_unverified, parse_token};

// Time
pub use crate::{Clock, ManualClock, SharedClock, SystemClock};

// Storage
pub use crate::{ROOT_TOKEN_KEY, RawToken, TokenStore};

// Grants
pub use crate::{GrantType, LocalProvider, TokenProvider, TokenRequest, TokenResponse};

// Request identity
pub use crate::AuthContext;
