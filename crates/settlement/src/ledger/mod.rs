//! The four ledgers
//!
//! Each ledger owns one table (the transaction ledger owns two) and is the
//! only code that reads or writes its rows. Ledgers hold no state of their
//! own: every method takes the [`Tables`](storage::Tables) to operate on, so
//! the same code runs against the committed store or inside a
//! [`StoreTransaction`](storage::StoreTransaction).

pub mod holding;
pub mod money;
pub mod profile;
pub mod transaction;

pub use holding::{term_sheet_allows, HoldingLedger};
pub use money::MoneyLedger;
pub use profile::SecurityProfiles;
pub use transaction::TransactionLedger;
