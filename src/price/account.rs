//! Boundary to the host's economy.

use serde::{Deserialize, Serialize};

use crate::core::ids::PlayerId;
use crate::error::AccountError;

use super::decimal::Decimal;

/// A currency known to the account service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency {
    /// Stable id used as the balance key.
    pub id: String,
    /// Symbol shown in front of amounts.
    pub symbol: String,
}

impl Currency {
    /// Create a new currency.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
        }
    }
}

/// Handle to an account held by the service.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AccountRef {
    /// Owning player.
    pub owner: PlayerId,
    /// Service-specific account identifier.
    pub handle: String,
}

/// The host's economy, consumed synchronously.
///
/// Every call may fail when the service is unavailable; callers treat a
/// failure the same as "no money".
pub trait AccountService {
    /// Check if the player has an account.
    fn has_account(&self, player: PlayerId) -> Result<bool, AccountError>;

    /// Get the player's account, creating it if needed.
    fn find_or_create_account(&self, player: PlayerId) -> Result<AccountRef, AccountError>;

    /// Balance of an account in one currency.
    fn balance(&self, account: &AccountRef, currency: &Currency) -> Result<Decimal, AccountError>;
}
