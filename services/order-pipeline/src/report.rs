//! Execution report decoder
//!
//! The engine writes its report with a header whose names carry stray
//! leading spaces:
//!
//! ```text
//! Order ID, Client Order ID, Instrument, Side, Execution Status, Quantity, Price, error
//! ord1,aa13,Rose,1,Rejected,100,55.5,Invalid size
//! ```
//!
//! Columns are located by trimmed header name, so either spacing convention
//! and any column order decode the same way. Decoding is all-or-nothing: one
//! malformed row fails the whole report.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use types::execution::{ExecutionRecord, ExecutionStatus, ReportedSide};
use types::ids::{ClientOrderId, EngineOrderId};
use types::numeric::{Price, ReportedQuantity};

const ORDER_ID: &str = "Order ID";
const CLIENT_ORDER_ID: &str = "Client Order ID";
const INSTRUMENT: &str = "Instrument";
const SIDE: &str = "Side";
const EXECUTION_STATUS: &str = "Execution Status";
const QUANTITY: &str = "Quantity";
const PRICE: &str = "Price";
const REASON_COLUMNS: [&str; 2] = ["error", "reason"];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Report header is missing column {0:?}")]
    MissingColumn(&'static str),

    #[error("Malformed record on line {line}: {field} = {value:?}")]
    MalformedRecord {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// Column positions resolved from the header row
#[derive(Debug)]
struct ReportLayout {
    order_id: usize,
    client_order_id: usize,
    instrument: usize,
    side: usize,
    status: usize,
    quantity: usize,
    price: usize,
    reason: Option<usize>,
}

impl ReportLayout {
    fn from_header(header: &str) -> Result<Self, ReportError> {
        let header = header.trim_start_matches('\u{feff}');
        let positions: HashMap<String, usize> = header
            .split(',')
            .enumerate()
            .map(|(index, name)| (name.trim().to_string(), index))
            .collect();

        let find = |name: &'static str| {
            positions
                .get(name)
                .copied()
                .ok_or(ReportError::MissingColumn(name))
        };

        let reason = positions
            .iter()
            .find(|(name, _)| REASON_COLUMNS.iter().any(|c| name.eq_ignore_ascii_case(c)))
            .map(|(_, index)| *index);

        Ok(Self {
            order_id: find(ORDER_ID)?,
            client_order_id: find(CLIENT_ORDER_ID)?,
            instrument: find(INSTRUMENT)?,
            side: find(SIDE)?,
            status: find(EXECUTION_STATUS)?,
            quantity: find(QUANTITY)?,
            price: find(PRICE)?,
            reason,
        })
    }

    fn decode_row(&self, line: usize, row: &str) -> Result<ExecutionRecord, ReportError> {
        let cells: Vec<&str> = row.split(',').map(str::trim).collect();
        let cell = |index: usize, field: &'static str| {
            cells.get(index).copied().ok_or_else(|| ReportError::MalformedRecord {
                line,
                field,
                value: row.to_string(),
            })
        };

        let quantity_raw = cell(self.quantity, QUANTITY)?;
        let quantity: ReportedQuantity =
            quantity_raw.parse().map_err(|_| ReportError::MalformedRecord {
                line,
                field: QUANTITY,
                value: quantity_raw.to_string(),
            })?;

        let price_raw = cell(self.price, PRICE)?;
        let price: Price = price_raw.parse().map_err(|_| ReportError::MalformedRecord {
            line,
            field: PRICE,
            value: price_raw.to_string(),
        })?;

        let side = ReportedSide::from_wire(cell(self.side, SIDE)?);
        if let ReportedSide::Unrecognized(raw) = &side {
            warn!(line, side = %raw, "Unrecognized side in execution report");
        }
        let execution_status = ExecutionStatus::from_wire(cell(self.status, EXECUTION_STATUS)?);
        if let ExecutionStatus::Unrecognized(raw) = &execution_status {
            warn!(line, status = %raw, "Unrecognized execution status in report");
        }

        let reason = self
            .reason
            .and_then(|index| cells.get(index))
            .filter(|text| !text.is_empty())
            .map(|text| text.to_string());

        Ok(ExecutionRecord {
            order_id: EngineOrderId::new(cell(self.order_id, ORDER_ID)?),
            client_order_id: ClientOrderId::new(cell(self.client_order_id, CLIENT_ORDER_ID)?),
            instrument: cell(self.instrument, INSTRUMENT)?.to_string(),
            execution_status,
            side,
            quantity,
            price,
            reason,
        })
    }
}

/// Decode report text into execution records, preserving row order
///
/// An empty document has no records. Blank lines are skipped.
pub fn parse_report(text: &str) -> Result<Vec<ExecutionRecord>, ReportError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty());

    let layout = match lines.next() {
        Some((_, header)) => ReportLayout::from_header(header)?,
        None => return Ok(Vec::new()),
    };

    lines
        .map(|(line, row)| layout.decode_row(line, row))
        .collect()
}

/// Read and decode the report file
///
/// A report that does not exist yet decodes to an empty sequence.
pub async fn read_report(path: &Path) -> Result<Vec<ExecutionRecord>, ReportError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "No execution report yet");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let records = parse_report(&text)?;
    debug!(path = %path.display(), records = records.len(), "Decoded execution report");
    Ok(records)
}
