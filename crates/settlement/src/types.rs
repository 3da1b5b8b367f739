//! Ledger records
//!
//! Field names on the wire follow the ledger's established JSON payloads
//! (`AccountID`, `TransactionID`, ...), hence the explicit renames.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::SettlementError;
use crate::Result;

/// Trade status. `Waiting` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Waiting,
    Confirmed,
    CancelledByBuyer,
    CancelledBySeller,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Waiting => "Waiting",
            TransactionStatus::Confirmed => "Confirmed",
            TransactionStatus::CancelledByBuyer => "CancelledByBuyer",
            TransactionStatus::CancelledBySeller => "CancelledBySeller",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Waiting)
    }

    /// Only `Waiting -> terminal` is allowed
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        !self.is_terminal() && next.is_terminal()
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Waiting" => Ok(TransactionStatus::Waiting),
            "Confirmed" => Ok(TransactionStatus::Confirmed),
            "CancelledByBuyer" => Ok(TransactionStatus::CancelledByBuyer),
            "CancelledBySeller" => Ok(TransactionStatus::CancelledBySeller),
            other => Err(SettlementError::Internal(format!(
                "unknown transaction status: {}",
                other
            ))),
        }
    }
}

/// A bilaterally agreed trade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "TransactionID")]
    pub transaction_id: u64,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "BuyerID")]
    pub buyer_id: String,
    #[serde(rename = "SellerID")]
    pub seller_id: String,
    /// Decimal text of an unsigned integer
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Volume")]
    pub volume: u64,
    #[serde(rename = "Status")]
    pub status: TransactionStatus,
    /// RFC 3339, UTC
    #[serde(rename = "LastUpdated")]
    pub last_updated: String,
}

impl Transaction {
    pub fn price_value(&self) -> Result<u64> {
        Ok(common::parse_u64("price", &self.price)?)
    }

    /// `price * volume`, the cash leg of the trade
    pub fn notional(&self) -> Result<u64> {
        notional(self.price_value()?, self.volume)
    }

    pub fn is_party(&self, account_id: &str) -> bool {
        self.buyer_id == account_id || self.seller_id == account_id
    }
}

pub(crate) fn notional(price: u64, volume: u64) -> Result<u64> {
    price.checked_mul(volume).ok_or_else(|| {
        SettlementError::Overflow(format!("price {} * volume {}", price, volume))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyAccount {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    #[serde(rename = "Amount")]
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(rename = "AccountID")]
    pub account_id: String,
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Balance")]
    pub balance: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityProfile {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "MaxNumberHolder")]
    pub max_number_holder: u64,
}
