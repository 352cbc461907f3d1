// Domain errors shared by the ledger, escrow, queue and lifecycle

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::Asset;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CoreError {
    #[error("Insufficient {asset} balance: requested {requested}, available {available}")]
    InsufficientFunds {
        asset: Asset,
        requested: Decimal,
        available: Decimal,
    },

    #[error("Amount must not be negative (got {0})")]
    InvalidAmount(Decimal),

    #[error("Stake must be greater than zero (got {0})")]
    InvalidStake(Decimal),

    #[error("Asset {0} is not available yet")]
    AssetUnavailable(Asset),

    #[error("Cannot {action} while {state}")]
    IllegalTransition {
        state: &'static str,
        action: &'static str,
    },

    #[error("Store error: {0}")]
    Store(String),
}

impl From<anyhow::Error> for CoreError {
    fn from(e: anyhow::Error) -> Self {
        CoreError::Store(e.to_string())
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
