//! Prices and the account-service boundary.
//!
//! A `Price` is a cost in some currency, paid either by a player (through
//! the host's `AccountService`) or by a zone (from its balance flag).
//! Evaluation never fails: an unreachable service reads as "no money".

pub mod account;
pub mod decimal;
#[allow(clippy::module_inception)]
pub mod price;

pub use account::{AccountRef, AccountService, Currency};
pub use decimal::{format_amount, parse_amount, Decimal};
pub use price::{Price, PriceBuilder, PriceKind, PriceSubject, SubjectKind};
