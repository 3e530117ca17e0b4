use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RoundingMode;
use crate::graph::NodeId;

/// Rounding applied when a line was finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rounding {
    pub precision: u32,
    pub mode: RoundingMode,
    /// Rounded value minus the formula's raw result.
    pub adjustment: Decimal,
}

/// One computed form line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: String,
    pub value: Decimal,
    pub formula: String,
    pub depends_on: Vec<NodeId>,
    pub rounding: Rounding,
    pub clamped: bool,
}
