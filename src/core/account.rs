use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an account in the community currency network.
///
/// An account can represent an individual wallet, a business, a community
/// fund, or any entity that sends or receives transfers. The engine treats
/// the identifier as opaque — typically a blockchain address or an
/// indexer-assigned handle.
///
/// # Examples
///
/// ```
/// use circulation_engine::core::account::AccountId;
///
/// let bakery = AccountId::new("0x3f2a-bakery");
/// let school = AccountId::new("0x91cc-school");
/// assert_ne!(bakery, school);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create a new account identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this account ID.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
