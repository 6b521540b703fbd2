//! Costs evaluated against a player's or a zone's balance.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::ids::PlayerId;
use crate::error::PriceError;
use crate::zones::Zone;

use super::account::{AccountService, Currency};
use super::decimal::{format_amount, parse_amount, Decimal};

/// Who pays a price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    /// Paid from a player's account through the account service.
    Player,
    /// Paid from the zone's own balance flag.
    Zone,
}

/// What a price is paid in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PriceKind {
    /// Money from the economy.
    #[default]
    Eco,
}

/// The party a price is evaluated against.
#[derive(Clone, Copy, Debug)]
pub enum PriceSubject<'a> {
    /// A player, resolved through the account service.
    Player(PlayerId),
    /// A zone, using its balance flag.
    Zone(&'a Zone),
}

impl PriceSubject<'_> {
    /// The kind of subject.
    #[must_use]
    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Player(_) => SubjectKind::Player,
            Self::Zone(_) => SubjectKind::Zone,
        }
    }
}

/// A stateless cost.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// How much.
    pub amount: Decimal,
    /// In which currency.
    pub currency: Currency,
    /// Who pays.
    pub subject: SubjectKind,
    /// What is paid.
    #[serde(default)]
    pub kind: PriceKind,
}

impl Price {
    /// A money price paid by a player.
    #[must_use]
    pub fn player(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            subject: SubjectKind::Player,
            kind: PriceKind::Eco,
        }
    }

    /// A money price paid by a zone.
    #[must_use]
    pub fn zone(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount,
            currency,
            subject: SubjectKind::Zone,
            kind: PriceKind::Eco,
        }
    }

    /// The subject's balance in this price's currency.
    ///
    /// `None` when the subject is of the wrong kind, has no account, or the
    /// service is unavailable.
    fn balance_of(&self, subject: PriceSubject<'_>, accounts: &dyn AccountService) -> Option<Decimal> {
        if subject.kind() != self.subject {
            return None;
        }
        match subject {
            PriceSubject::Zone(zone) => Some(zone.balance(&self.currency.id)),
            PriceSubject::Player(player) => {
                let lookup = accounts
                    .has_account(player)
                    .and_then(|exists| {
                        if exists {
                            accounts.find_or_create_account(player).map(Some)
                        } else {
                            Ok(None)
                        }
                    })
                    .and_then(|account| match account {
                        Some(account) => accounts.balance(&account, &self.currency).map(Some),
                        None => Ok(None),
                    });
                match lookup {
                    Ok(balance) => balance,
                    Err(err) => {
                        debug!(%player, error = %err, "balance lookup failed");
                        None
                    }
                }
            }
        }
    }

    /// True iff the subject's balance is strictly greater than the amount.
    ///
    /// A balance equal to the amount is not enough.
    #[must_use]
    pub fn has_enough(&self, subject: PriceSubject<'_>, accounts: &dyn AccountService) -> bool {
        self.balance_of(subject, accounts)
            .is_some_and(|balance| balance > self.amount)
    }

    /// `min(balance, amount) / balance * 100`.
    ///
    /// Returns 0 when the subject has no account or a balance that is not
    /// positive.
    #[must_use]
    pub fn percent_left(&self, subject: PriceSubject<'_>, accounts: &dyn AccountService) -> f32 {
        match self.balance_of(subject, accounts) {
            Some(balance) if balance > Decimal::ZERO => balance
                .min(self.amount)
                .checked_div(balance)
                .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
                .and_then(|percent| percent.to_f32())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// A builder that reproduces this price.
    #[must_use]
    pub fn as_builder(&self) -> PriceBuilder {
        PriceBuilder::new()
            .amount(self.amount)
            .currency(self.currency.clone())
            .kind(self.kind)
    }

    /// Currency symbol followed by the amount.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}{}", self.currency.symbol, format_amount(self.amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

/// Rebuilds a price for either subject kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBuilder {
    amount: Option<Decimal>,
    currency: Option<Currency>,
    #[serde(default)]
    kind: PriceKind,
}

impl PriceBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the amount.
    #[must_use]
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Parse and set the amount.
    pub fn amount_text(mut self, text: &str) -> Result<Self, PriceError> {
        self.amount = Some(parse_amount(text)?);
        Ok(self)
    }

    /// Set the currency.
    #[must_use]
    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    /// Set the price kind.
    #[must_use]
    pub fn kind(mut self, kind: PriceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Build a price paid by `subject`.
    pub fn build(&self, subject: SubjectKind) -> Result<Price, PriceError> {
        Ok(Price {
            amount: self.amount.ok_or(PriceError::MissingAmount)?,
            currency: self.currency.clone().ok_or(PriceError::MissingCurrency)?,
            subject,
            kind: self.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_round_trip() {
        let price = Price::player(Decimal::from(25), Currency::new("dollar", "$"));
        let rebuilt = price.as_builder().build(SubjectKind::Player).unwrap();
        assert_eq!(rebuilt, price);

        let for_zone = price.as_builder().build(SubjectKind::Zone).unwrap();
        assert_eq!(for_zone.subject, SubjectKind::Zone);
        assert_eq!(for_zone.amount, price.amount);
    }

    #[test]
    fn test_builder_missing_parts() {
        assert_eq!(
            PriceBuilder::new().build(SubjectKind::Player),
            Err(PriceError::MissingAmount)
        );
        assert_eq!(
            PriceBuilder::new()
                .amount(Decimal::ONE)
                .build(SubjectKind::Player),
            Err(PriceError::MissingCurrency)
        );
        assert!(PriceBuilder::new().amount_text("x").is_err());
    }

    #[test]
    fn test_display_name() {
        let price = Price::zone(Decimal::new(125, 2), Currency::new("dollar", "$"));
        assert_eq!(price.display_name(), "$1.25");

        let fine = Price::zone(Decimal::new(1, 5), Currency::new("dollar", "$"));
        assert_eq!(fine.display_name(), "$0.00001");
    }

    #[test]
    fn test_amount_text_keeps_all_digits() {
        let price = PriceBuilder::new()
            .amount_text("0.00001")
            .unwrap()
            .currency(Currency::new("dollar", "$"))
            .build(SubjectKind::Player)
            .unwrap();
        assert_eq!(price.amount, Decimal::new(1, 5));
    }
}
