//! Caller identity
//!
//! The ledger does not authenticate anyone. An [`IdentityProvider`] hands
//! over the account id and role that were already verified upstream.

use common::{Caller, Role};

use crate::error::SettlementError;
use crate::Result;

/// Source of the verified account id and role of the current caller
pub trait IdentityProvider: Send + Sync {
    fn resolve_account_id(&self) -> Result<String>;

    fn resolve_role(&self) -> Result<String>;
}

/// Resolve and parse the caller; an unknown role string is an authorization failure
pub fn resolve_caller(identity: &dyn IdentityProvider) -> Result<Caller> {
    let role: Role = identity.resolve_role()?.parse()?;
    let account_id = identity.resolve_account_id()?;
    if account_id.is_empty() {
        return Err(SettlementError::NotAuthenticated(
            "empty account id".to_string(),
        ));
    }
    Ok(Caller::new(account_id, role))
}

/// Fixed identity, used by the replay runner and in tests
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    account_id: Option<String>,
    role: Option<String>,
}

impl StaticIdentity {
    pub fn new(account_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            role: Some(role.into()),
        }
    }

    /// No attributes at all
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An account id but no role attribute
    pub fn without_role(account_id: impl Into<String>) -> Self {
        Self {
            account_id: Some(account_id.into()),
            role: None,
        }
    }
}

impl From<&Caller> for StaticIdentity {
    fn from(caller: &Caller) -> Self {
        Self::new(caller.account_id.clone(), caller.role.as_str())
    }
}

impl IdentityProvider for StaticIdentity {
    fn resolve_account_id(&self) -> Result<String> {
        self.account_id
            .clone()
            .ok_or_else(|| SettlementError::NotAuthenticated("cannot get account id".to_string()))
    }

    fn resolve_role(&self) -> Result<String> {
        self.role
            .clone()
            .ok_or_else(|| SettlementError::NotAuthenticated("cannot get role".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_resolve_caller() {
        let caller = resolve_caller(&StaticIdentity::new("A01", "tsd")).unwrap();
        assert_eq!(caller, Caller::new("A01", Role::Depository));
    }

    #[test]
    fn test_missing_attributes() {
        assert_matches!(
            resolve_caller(&StaticIdentity::anonymous()),
            Err(SettlementError::NotAuthenticated(_))
        );
        assert_matches!(
            resolve_caller(&StaticIdentity::without_role("A01")),
            Err(SettlementError::NotAuthenticated(_))
        );
        assert_matches!(
            resolve_caller(&StaticIdentity::new("", "trader")),
            Err(SettlementError::NotAuthenticated(_))
        );
    }

    #[test]
    fn test_unknown_role() {
        assert_matches!(
            resolve_caller(&StaticIdentity::new("A01", "admin")),
            Err(SettlementError::UnknownRole(role)) if role == "admin"
        );
    }

    #[test]
    fn test_from_caller() {
        let identity = StaticIdentity::from(&Caller::new("A05", Role::Bot));
        assert_eq!(identity.resolve_role().unwrap(), "bot");
    }
}
