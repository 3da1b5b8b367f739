//! Common types used across the settlement ledger

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Error;

/// Role carried by an authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Issuer of a security; may trade and list holders
    Issuer,
    /// Ordinary trading participant
    Trader,
    /// Operator bot that funds money accounts
    Bot,
    /// Securities depository; mints shares and maintains security profiles
    #[serde(rename = "tsd")]
    Depository,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Issuer => "issuer",
            Role::Trader => "trader",
            Role::Bot => "bot",
            Role::Depository => "tsd",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "issuer" => Ok(Role::Issuer),
            "trader" => Ok(Role::Trader),
            "bot" => Ok(Role::Bot),
            "tsd" => Ok(Role::Depository),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

/// Resolved identity of the caller of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub account_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(account_id: impl Into<String>, role: Role) -> Self {
        Self {
            account_id: account_id.into(),
            role,
        }
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.account_id, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Issuer, Role::Trader, Role::Bot, Role::Depository] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_is_case_sensitive() {
        assert!("Trader".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_name() {
        assert_eq!(serde_json::to_string(&Role::Depository).unwrap(), "\"tsd\"");
    }

    #[test]
    fn test_caller_display() {
        assert_eq!(Caller::new("A01", Role::Trader).to_string(), "A01(trader)");
    }
}
