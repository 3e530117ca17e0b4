use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The type an input code is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Amount,
    Count,
    Status,
    Flag,
}

impl fmt::Display for InputKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(match self {
            Self::Amount => "amount",
            Self::Count => "count",
            Self::Status => "status",
            Self::Flag => "flag",
        })
    }
}

/// One typed taxpayer-supplied value.
///
/// Serialized as `{"type": "amount", "value": "85000.00"}` so that counts
/// and amounts never get confused on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum InputValue {
    Amount(Decimal),
    Count(u32),
    Status(String),
    Flag(bool),
}

impl InputValue {
    /// Largest magnitude accepted for an amount, one quadrillion. Every form
    /// formula stays inside `Decimal`'s range for amounts up to it.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Amount(_) => InputKind::Amount,
            Self::Count(_) => InputKind::Count,
            Self::Status(_) => InputKind::Status,
            Self::Flag(_) => InputKind::Flag,
        }
    }

    /// Numeric view used when tracing provenance; statuses have none.
    pub fn numeric(&self) -> Option<Decimal> {
        match self {
            Self::Amount(amount) => Some(*amount),
            Self::Count(count) => Some(Decimal::from(*count)),
            Self::Flag(flag) => Some(if *flag { Decimal::ONE } else { Decimal::ZERO }),
            Self::Status(_) => None,
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Amount(amount) => write!(f, "{amount}"),
            Self::Count(count) => write!(f, "{count}"),
            Self::Status(status) => f.write_str(status),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// Input-line code → typed value for one calculation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxpayerInput {
    values: BTreeMap<String, InputValue>,
}

impl TaxpayerInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        code: impl Into<String>,
        value: InputValue,
    ) -> Self {
        self.insert(code, value);
        self
    }

    pub fn with_amount(
        self,
        code: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        self.with(code, InputValue::Amount(amount))
    }

    pub fn with_count(
        self,
        code: impl Into<String>,
        count: u32,
    ) -> Self {
        self.with(code, InputValue::Count(count))
    }

    pub fn with_status(
        self,
        code: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        self.with(code, InputValue::Status(status.into()))
    }

    pub fn with_flag(
        self,
        code: impl Into<String>,
        flag: bool,
    ) -> Self {
        self.with(code, InputValue::Flag(flag))
    }

    pub fn insert(
        &mut self,
        code: impl Into<String>,
        value: InputValue,
    ) -> Option<InputValue> {
        self.values.insert(code.into(), value)
    }

    pub fn get(
        &self,
        code: &str,
    ) -> Option<&InputValue> {
        self.values.get(code)
    }

    pub fn contains(
        &self,
        code: &str,
    ) -> bool {
        self.values.contains_key(code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, InputValue)> for TaxpayerInput {
    fn from_iter<T: IntoIterator<Item = (K, InputValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
