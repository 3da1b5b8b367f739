//! The closed set of ledger operations and their call rules

use common::Role;
use std::str::FromStr;

use crate::error::SettlementError;

/// Whether an operation may write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Invoke,
    Query,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Sell,
    ConfirmBuy,
    Cancel,
    IssueStock,
    AddMoney,
    SetMaxNumberHolder,
    GetTransaction,
    GetBalance,
    GetMoney,
    FindUnconfirmedTransaction,
    FindCompletedTransaction,
    FindConfirmedTransactionBySymbol,
    GetHolders,
    GetMaxNumberHolder,
}

/// Name, arguments and permitted roles of one operation
#[derive(Debug)]
pub struct OperationSpec {
    pub operation: Operation,
    pub name: &'static str,
    pub args: &'static [&'static str],
    /// How many trailing `args` may be omitted
    pub optional: usize,
    pub roles: &'static [Role],
    pub kind: OperationKind,
}

const TRADING: &[Role] = &[Role::Trader, Role::Issuer];
const DEPOSITORY: &[Role] = &[Role::Depository];

/// Indexed by `Operation as usize`
pub static OPERATIONS: [OperationSpec; 14] = [
    OperationSpec {
        operation: Operation::Sell,
        name: "sell",
        args: &["symbol", "buyerID", "price", "volume"],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::ConfirmBuy,
        name: "confirmBuy",
        args: &["transactionID"],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::Cancel,
        name: "cancel",
        args: &["transactionID"],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::IssueStock,
        name: "issueStock",
        args: &["accountID", "symbol", "volume"],
        optional: 0,
        roles: DEPOSITORY,
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::AddMoney,
        name: "addMoney",
        args: &["accountID", "amount"],
        optional: 0,
        roles: &[Role::Bot],
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::SetMaxNumberHolder,
        name: "setMaxNumberHolder",
        args: &["symbol", "maxNumberHolder"],
        optional: 0,
        roles: DEPOSITORY,
        kind: OperationKind::Invoke,
    },
    OperationSpec {
        operation: Operation::GetTransaction,
        name: "getTransaction",
        args: &["transactionID"],
        optional: 1,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::GetBalance,
        name: "getBalance",
        args: &[],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::GetMoney,
        name: "getMoney",
        args: &[],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::FindUnconfirmedTransaction,
        name: "findUnconfirmedTransaction",
        args: &[],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::FindCompletedTransaction,
        name: "findCompletedTransaction",
        args: &[],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::FindConfirmedTransactionBySymbol,
        name: "findConfirmedTransactionBySymbol",
        args: &["symbol"],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::GetHolders,
        name: "getHolders",
        args: &["symbol"],
        optional: 0,
        roles: &[Role::Issuer],
        kind: OperationKind::Query,
    },
    OperationSpec {
        operation: Operation::GetMaxNumberHolder,
        name: "getMaxNumberHolder",
        args: &["symbol"],
        optional: 0,
        roles: TRADING,
        kind: OperationKind::Query,
    },
];

impl Operation {
    pub fn spec(self) -> &'static OperationSpec {
        &OPERATIONS[self as usize]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> OperationKind {
        self.spec().kind
    }

    pub fn allows(self, role: Role) -> bool {
        self.spec().roles.contains(&role)
    }

    /// Check the argument count against the table
    pub fn check_arity(self, got: usize) -> Result<(), SettlementError> {
        let spec = self.spec();
        let max = spec.args.len();
        let min = max - spec.optional;
        if got < min || got > max {
            let expected = if min == max {
                max.to_string()
            } else {
                format!("{} to {}", min, max)
            };
            return Err(SettlementError::ArgumentCount {
                operation: spec.name,
                expected,
                got,
            });
        }
        Ok(())
    }

    pub fn all() -> impl Iterator<Item = Operation> {
        OPERATIONS.iter().map(|s| s.operation)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OPERATIONS
            .iter()
            .find(|spec| spec.name == s)
            .map(|spec| spec.operation)
            .ok_or_else(|| SettlementError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_table_is_indexed_by_discriminant() {
        for (i, spec) in OPERATIONS.iter().enumerate() {
            assert_eq!(spec.operation as usize, i, "{}", spec.name);
            assert!(spec.optional <= spec.args.len());
            assert!(!spec.roles.is_empty());
        }
    }

    #[test]
    fn test_names_round_trip() {
        for op in Operation::all() {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert_matches!(
            "buy".parse::<Operation>(),
            Err(SettlementError::UnknownOperation(name)) if name == "buy"
        );
    }

    #[test]
    fn test_roles() {
        assert!(Operation::Sell.allows(Role::Trader));
        assert!(Operation::Sell.allows(Role::Issuer));
        assert!(!Operation::Sell.allows(Role::Bot));
        assert!(Operation::IssueStock.allows(Role::Depository));
        assert!(!Operation::IssueStock.allows(Role::Issuer));
        assert!(Operation::AddMoney.allows(Role::Bot));
        assert!(Operation::GetHolders.allows(Role::Issuer));
        assert!(!Operation::GetHolders.allows(Role::Trader));
    }

    #[test]
    fn test_arity() {
        assert!(Operation::Sell.check_arity(4).is_ok());
        assert_matches!(
            Operation::Sell.check_arity(3),
            Err(SettlementError::ArgumentCount { expected, got: 3, .. }) if expected == "4"
        );
        assert!(Operation::GetTransaction.check_arity(0).is_ok());
        assert!(Operation::GetTransaction.check_arity(1).is_ok());
        assert_matches!(
            Operation::GetTransaction.check_arity(2),
            Err(SettlementError::ArgumentCount { expected, .. }) if expected == "0 to 1"
        );
        assert_eq!(Operation::GetMoney.kind(), OperationKind::Query);
    }
}
