//! Settlement core of the securities ledger
//!
//! This crate keeps account cash balances, per-symbol share holdings and
//! bilaterally agreed trades, and settles a trade by exchanging cash for
//! shares in one atomic step, subject to each symbol's holder cap.
//!
//! # Components
//!
//! - [`MoneyLedger`] - per-account cash balances
//! - [`HoldingLedger`] - per-(account, symbol) share balances and the
//!   term-sheet holder-cap check
//! - [`SecurityProfiles`] - per-symbol holder caps
//! - [`TransactionLedger`] - trade records, id counter and account index
//! - [`SettlementService`] - the authorized entry-point operations
//!
//! [`dispatch`] routes an operation name and text arguments through the
//! [`Operation`] table to the service; [`initialize_ledger`] creates and
//! seeds the tables.

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod operation;
pub mod service;
pub mod types;

#[cfg(test)]
mod testing;

pub use bootstrap::initialize_ledger;
pub use dispatch::dispatch;
pub use error::{ErrorKind, SettlementError};
pub use identity::{resolve_caller, IdentityProvider, StaticIdentity};
pub use ledger::{term_sheet_allows, HoldingLedger, MoneyLedger, SecurityProfiles, TransactionLedger};
pub use operation::{Operation, OperationKind, OperationSpec, OPERATIONS};
pub use service::SettlementService;
pub use types::{Holding, MoneyAccount, SecurityProfile, Transaction, TransactionStatus};

/// Result type for settlement operations
pub type Result<T> = std::result::Result<T, SettlementError>;
