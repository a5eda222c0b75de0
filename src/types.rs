//! Core types and data structures for closing and stock operations

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use crate::utils::money::format_brl;

/// Monetary amount in integer minor units (centavos)
///
/// All closing arithmetic happens on this type. Conversion to decimal major
/// units only happens at the display and wire boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    /// Create an amount from minor units
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create an amount from whole major units
    pub const fn from_major(units: i64) -> Self {
        Self(units.saturating_mul(100))
    }

    /// Parse free-text form input.
    ///
    /// Every non-digit character is dropped and the remaining digits are read
    /// as minor units, so `"R$ 12,34"` becomes 1234. Empty or overflowing
    /// input is zero.
    pub fn from_input(raw: &str) -> Self {
        let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
        Self(digits.parse::<i64>().unwrap_or(0))
    }

    /// Raw minor units
    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    /// Clamp to zero from below
    pub const fn non_negative(self) -> Self {
        if self.0 < 0 {
            Self(0)
        } else {
            self
        }
    }

    /// Decimal value in major units with two decimal places
    pub fn to_decimal(self) -> BigDecimal {
        (BigDecimal::from(self.0) / BigDecimal::from(100)).with_scale(2)
    }

    /// Convert a decimal major-unit value, rounding half-up to the cent
    pub fn from_decimal(value: &BigDecimal) -> Option<Self> {
        (value * BigDecimal::from(100))
            .with_scale_round(0, RoundingMode::HalfUp)
            .to_i64()
            .map(Self)
    }

    /// Apply a percentage rate (e.g. `8` for 8%), rounding half-up to the cent
    pub fn percent(self, rate: &BigDecimal) -> Self {
        let exact = BigDecimal::from(self.0) * rate / BigDecimal::from(100);
        exact
            .with_scale_round(0, RoundingMode::HalfUp)
            .to_i64()
            .map(Self)
            .unwrap_or(if self.0 < 0 { Self(i64::MIN) } else { Self(i64::MAX) })
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_brl(*self))
    }
}

impl Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Cents {
    fn add_assign(&mut self, rhs: Cents) {
        *self = *self + rhs;
    }
}

impl Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Cents) -> Cents {
        Cents(self.0.saturating_sub(rhs.0))
    }
}

impl SubAssign for Cents {
    fn sub_assign(&mut self, rhs: Cents) {
        *self = *self - rhs;
    }
}

impl Neg for Cents {
    type Output = Cents;

    fn neg(self) -> Cents {
        Cents(self.0.saturating_neg())
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Cents>>(iter: I) -> Cents {
        iter.fold(Cents::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Cents> for Cents {
    fn sum<I: Iterator<Item = &'a Cents>>(iter: I) -> Cents {
        iter.copied().sum()
    }
}

// On the wire amounts are JSON numbers in major units (12.34).
impl Serialize for Cents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0 as f64 / 100.0)
    }
}

impl<'de> Deserialize<'de> for Cents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MajorUnitsVisitor)
    }
}

struct MajorUnitsVisitor;

impl<'de> Visitor<'de> for MajorUnitsVisitor {
    type Value = Cents;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amount in major currency units")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cents, E> {
        Ok(Cents::from_major(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cents, E> {
        i64::try_from(v)
            .map(Cents::from_major)
            .map_err(|_| E::custom(format!("amount out of range: {v}")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Cents, E> {
        if !v.is_finite() {
            return Err(E::custom("amount must be finite"));
        }
        Ok(Cents((v * 100.0).round() as i64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cents, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Ok(Cents::ZERO);
        }
        let value: BigDecimal = trimmed
            .replace(',', ".")
            .parse()
            .map_err(|_| E::custom(format!("invalid amount: {v}")))?;
        Cents::from_decimal(&value).ok_or_else(|| E::custom(format!("amount out of range: {v}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Cents, E> {
        Ok(Cents::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Cents, E> {
        Ok(Cents::ZERO)
    }
}

/// An optional adjustment gated by a yes/no switch on the form
///
/// The amount only counts while `applied` is set. A value typed before the
/// switch was turned off is kept but ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub applied: bool,
    pub amount: Cents,
}

impl Adjustment {
    pub const NONE: Adjustment = Adjustment {
        applied: false,
        amount: Cents::ZERO,
    };

    /// An adjustment switched on with the given amount
    pub const fn of(amount: Cents) -> Self {
        Self {
            applied: true,
            amount,
        }
    }

    /// Amount that takes part in the arithmetic
    pub fn effective(&self) -> Cents {
        if self.applied {
            self.amount.non_negative()
        } else {
            Cents::ZERO
        }
    }
}

/// Amounts and switches entered on a closing form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingInput {
    /// Gross sales reported by the card machine
    pub gross_sales: Cents,
    pub credit: Cents,
    pub debit: Cents,
    /// Instant payments (PIX)
    pub instant_payment: Cents,
    /// Prepaid cashless card sales
    pub stored_value: Cents,
    /// Physical cash counted at the end of the shift
    pub physical_cash: Cents,
    /// Manual reversal done on the machine
    pub reversal: Adjustment,
    /// Change float received at the start of the shift
    pub change: Adjustment,
}

impl ClosingInput {
    /// Start an input from the gross sales figure
    pub fn with_gross_sales(gross_sales: Cents) -> Self {
        Self {
            gross_sales,
            ..Self::default()
        }
    }

    /// Sum of every non-cash payment instrument
    pub fn electronic_total(&self) -> Cents {
        self.credit.non_negative()
            + self.debit.non_negative()
            + self.instant_payment.non_negative()
            + self.stored_value.non_negative()
    }
}

/// Which way the waiter settlement goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettlementDirection {
    /// The house owes the waiter (commission exceeds the cash they hold)
    PayToWaiter,
    /// The waiter hands cash over to the house
    CollectFromWaiter,
}

impl SettlementDirection {
    /// Label shown on the form and stored by the back office
    pub fn label(&self) -> &'static str {
        match self {
            SettlementDirection::PayToWaiter => "Pagar ao Garçom:",
            SettlementDirection::CollectFromWaiter => "Receber do Garçom:",
        }
    }

    /// Parse a stored label back into a direction
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_end_matches(':').to_lowercase();
        if label.starts_with("pagar") {
            Some(SettlementDirection::PayToWaiter)
        } else if label.starts_with("receber") {
            Some(SettlementDirection::CollectFromWaiter)
        } else {
            None
        }
    }
}

impl fmt::Display for SettlementDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementDirection::PayToWaiter => f.write_str("pay to waiter"),
            SettlementDirection::CollectFromWaiter => f.write_str("collect from waiter"),
        }
    }
}

impl Serialize for SettlementDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SettlementDirection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        SettlementDirection::from_label(&label)
            .ok_or_else(|| de::Error::custom(format!("unknown settlement label: {label}")))
    }
}

/// Outcome of comparing counted cash with the expected amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceState {
    /// Less cash than expected
    Shortfall,
    /// More cash than expected
    Surplus,
    Balanced,
}

impl BalanceState {
    pub fn of(difference: Cents) -> Self {
        if difference.is_negative() {
            BalanceState::Shortfall
        } else if difference.is_positive() {
            BalanceState::Surplus
        } else {
            BalanceState::Balanced
        }
    }

    /// Display colour used by the closing screens
    pub fn color(&self) -> &'static str {
        match self {
            BalanceState::Shortfall => "red",
            BalanceState::Surplus => "green",
            BalanceState::Balanced => "blue",
        }
    }
}

/// A selectable waiter or cashier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    pub cpf: String,
    pub name: String,
}

impl Person {
    pub fn new(cpf: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cpf: cpf.into(),
            name: name.into(),
        }
    }

    /// CPF with punctuation removed
    pub fn cpf_digits(&self) -> String {
        self.cpf.chars().filter(char::is_ascii_digit).collect()
    }
}

/// Errors raised around the calculator: validation, back office, export
#[derive(Debug, thiserror::Error)]
pub enum EventBarError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Session incomplete: {0}")]
    SessionIncomplete(String),
    #[error("Insufficient stock for {product}: requested {requested} units, {available} available")]
    InsufficientStock {
        product: String,
        requested: u64,
        available: u64,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Back office error: {0}")]
    Backend(String),
    #[error("Invalid commission policy: {0}")]
    InvalidPolicy(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Back office responded with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Export error: {0}")]
    Export(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for EventBarError {
    fn from(err: csv::Error) -> Self {
        EventBarError::Export(err.to_string())
    }
}

impl From<serde_json::Error> for EventBarError {
    fn from(err: serde_json::Error) -> Self {
        EventBarError::Decode(err.to_string())
    }
}

impl From<::config::ConfigError> for EventBarError {
    fn from(err: ::config::ConfigError) -> Self {
        EventBarError::Config(err.to_string())
    }
}

/// Result type for fallible operations
pub type EventBarResult<T> = Result<T, EventBarError>;
