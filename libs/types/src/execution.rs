//! Execution report types
//!
//! The matching engine writes sides and statuses as free text. Both are
//! normalized into enums here, with a catch-all variant that keeps the raw
//! value, so consumers never branch on the wire representation.

use crate::ids::{ClientOrderId, EngineOrderId};
use crate::numeric::{Price, ReportedQuantity};
use crate::order::Side;
use serde::{Serialize, Serializer};
use std::fmt;

/// Execution status as reported by the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExecutionStatus {
    /// Resting on the book ("New")
    New,
    /// Partially filled ("PFill")
    PartiallyFilled,
    /// Fully filled ("Fill")
    Filled,
    /// Refused by the engine ("Rejected")
    Rejected,
    /// Any status text outside the four above, kept verbatim
    Unrecognized(String),
}

impl ExecutionStatus {
    /// Exact, case-sensitive match against the engine's status vocabulary
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "New" => ExecutionStatus::New,
            "PFill" => ExecutionStatus::PartiallyFilled,
            "Fill" => ExecutionStatus::Filled,
            "Rejected" => ExecutionStatus::Rejected,
            other => ExecutionStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            ExecutionStatus::New => "New",
            ExecutionStatus::PartiallyFilled => "PFill",
            ExecutionStatus::Filled => "Fill",
            ExecutionStatus::Rejected => "Rejected",
            ExecutionStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ExecutionStatus::Unrecognized(_))
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for ExecutionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

/// Side as reported by the engine
///
/// The engine may write either the numeric code or the label. Values that
/// are neither are preserved in `Unrecognized`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReportedSide {
    Known(Side),
    Unrecognized(String),
}

impl ReportedSide {
    pub fn from_wire(raw: &str) -> Self {
        match Side::from_label(raw) {
            Some(side) => ReportedSide::Known(side),
            None => ReportedSide::Unrecognized(raw.to_string()),
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, ReportedSide::Known(Side::Buy))
    }
}

impl From<Side> for ReportedSide {
    fn from(side: Side) -> Self {
        ReportedSide::Known(side)
    }
}

impl Serialize for ReportedSide {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReportedSide::Known(side) => side.serialize(serializer),
            ReportedSide::Unrecognized(raw) => serializer.serialize_str(raw),
        }
    }
}

/// One row of the engine's execution report
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub order_id: EngineOrderId,
    pub client_order_id: ClientOrderId,
    /// Instrument text as echoed by the engine; rejected orders may carry
    /// names outside the tradable set
    pub instrument: String,
    pub execution_status: ExecutionStatus,
    pub side: ReportedSide,
    pub quantity: ReportedQuantity,
    pub price: Price,
    /// Engine-supplied rejection reason, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
