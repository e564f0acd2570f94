//! Order encoder
//!
//! Writes order requests in the engine's input schema:
//!
//! ```text
//! Client Order ID,Instrument,Side,Quantity,Price
//! aa13,Rose,1,100,55.5
//! ```
//!
//! Rows keep submission order. Quantities and prices are written exactly as
//! given; lot-size and sign checks belong to the caller.

use crate::error::PipelineError;
use std::fmt::Write;
use types::order::OrderRequest;

pub const BATCH_HEADER: &str = "Client Order ID,Instrument,Side,Quantity,Price";

/// Encode a non-empty batch of orders into the engine's CSV document
pub fn encode_batch(orders: &[OrderRequest]) -> Result<String, PipelineError> {
    if orders.is_empty() {
        return Err(PipelineError::InvalidInput("no orders submitted".into()));
    }

    let mut csv = String::with_capacity(BATCH_HEADER.len() + 1 + orders.len() * 32);
    csv.push_str(BATCH_HEADER);
    csv.push('\n');

    for (index, order) in orders.iter().enumerate() {
        let client_order_id = order.client_order_id.as_str();
        if order.client_order_id.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "order {} is missing a client order ID",
                index + 1
            )));
        }
        // The engine splits on bare commas and lines; no quoting is understood.
        if client_order_id.contains([',', '\n', '\r']) {
            return Err(PipelineError::InvalidInput(format!(
                "order {}: client order ID {:?} contains a separator",
                index + 1,
                client_order_id
            )));
        }

        writeln!(
            csv,
            "{},{},{},{},{}",
            client_order_id,
            order.instrument,
            order.side.code(),
            order.quantity,
            order.price
        )
        .map_err(|e| PipelineError::Internal(format!("failed to encode order batch: {}", e)))?;
    }

    Ok(csv)
}
