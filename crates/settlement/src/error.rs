//! Settlement error types

use storage::StorageError;
use thiserror::Error;

use crate::types::TransactionStatus;

/// Errors that can occur during settlement operations
#[derive(Error, Debug)]
pub enum SettlementError {
    /// Malformed or out-of-range argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrong number of arguments for an operation
    #[error("Incorrect number of arguments for {operation}. Expecting {expected}, got {got}")]
    ArgumentCount {
        operation: &'static str,
        expected: String,
        got: usize,
    },

    /// Operation name not in the dispatch table
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Arithmetic on balances or notional would overflow
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Identity could not be resolved
    #[error("Not authenticated: {0}")]
    NotAuthenticated(String),

    /// Role string is not one of the known roles
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Role not permitted for the operation
    #[error("Role {role} may not call {operation}")]
    InvalidRole {
        role: String,
        operation: &'static str,
    },

    /// Caller is not the buyer of the transaction
    #[error("Invalid buyer: {caller} is not the buyer of transaction {transaction_id}")]
    InvalidBuyer { caller: String, transaction_id: u64 },

    /// Caller is neither buyer nor seller of the transaction
    #[error("Invalid party: {caller} is neither buyer nor seller of transaction {transaction_id}")]
    InvalidParty { caller: String, transaction_id: u64 },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(u64),

    #[error("Money account not found: {0}")]
    AccountNotFound(String),

    #[error("Holding not found: {account_id}/{symbol}")]
    HoldingNotFound { account_id: String, symbol: String },

    /// Seller has no holding row for the symbol
    #[error("Seller {account_id} holds no {symbol}")]
    SellerNotFound { account_id: String, symbol: String },

    #[error("Security profile not found: {0}")]
    ProfileNotFound(String),

    /// Row already exists
    #[error("{0} was already assigned")]
    AlreadyAssigned(String),

    #[error("Insufficient funds in {account_id}: required {required}, available {available}")]
    InsufficientFunds {
        account_id: String,
        required: u64,
        available: u64,
    },

    #[error("Insufficient {symbol} in {account_id}: required {required}, available {available}")]
    InsufficientHolding {
        account_id: String,
        symbol: String,
        required: u64,
        available: u64,
    },

    /// Holder cap or seller eligibility check failed
    #[error("Transaction {transaction_id} does not pass term sheet validation for {symbol}")]
    TermSheetViolation { transaction_id: u64, symbol: String },

    /// Operation requires a waiting transaction
    #[error("Invalid status: transaction {transaction_id} is {status}")]
    InvalidState {
        transaction_id: u64,
        status: TransactionStatus,
    },

    /// Status change outside `Waiting -> terminal`
    #[error("Invalid transition for transaction {transaction_id}: {from} -> {to}")]
    InvalidTransition {
        transaction_id: u64,
        from: TransactionStatus,
        to: TransactionStatus,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Response could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error category, used for metrics labels and by callers deciding how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    InsufficientFunds,
    InsufficientHolding,
    TermSheetViolation,
    InvalidState,
    Store,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authorization => "authorization",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::InsufficientHolding => "insufficient_holding",
            ErrorKind::TermSheetViolation => "termsheet_violation",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Store => "store",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SettlementError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SettlementError::InvalidArgument(_)
            | SettlementError::ArgumentCount { .. }
            | SettlementError::UnknownOperation(_)
            | SettlementError::Overflow(_) => ErrorKind::Validation,
            SettlementError::NotAuthenticated(_)
            | SettlementError::UnknownRole(_)
            | SettlementError::InvalidRole { .. }
            | SettlementError::InvalidBuyer { .. }
            | SettlementError::InvalidParty { .. } => ErrorKind::Authorization,
            SettlementError::TransactionNotFound(_)
            | SettlementError::AccountNotFound(_)
            | SettlementError::HoldingNotFound { .. }
            | SettlementError::SellerNotFound { .. }
            | SettlementError::ProfileNotFound(_) => ErrorKind::NotFound,
            SettlementError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            SettlementError::InsufficientHolding { .. } => ErrorKind::InsufficientHolding,
            SettlementError::TermSheetViolation { .. } => ErrorKind::TermSheetViolation,
            SettlementError::AlreadyAssigned(_)
            | SettlementError::InvalidState { .. }
            | SettlementError::InvalidTransition { .. } => ErrorKind::InvalidState,
            SettlementError::Storage(_)
            | SettlementError::Serialization(_)
            | SettlementError::Internal(_) => ErrorKind::Store,
        }
    }
}

impl From<common::Error> for SettlementError {
    fn from(err: common::Error) -> Self {
        match err {
            common::Error::InvalidInput(msg) => SettlementError::InvalidArgument(msg),
            common::Error::UnknownRole(role) => SettlementError::UnknownRole(role),
        }
    }
}
