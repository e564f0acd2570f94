//! Order book projection
//!
//! Pure view over decoded execution records: a buy list, a sell list and
//! per-status counts. No I/O, so it is tested independently of the engine.

use serde::Serialize;
use types::execution::{ExecutionRecord, ExecutionStatus, ReportedSide};
use types::order::Side;

/// Counts over the full, unfiltered record set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderBookStats {
    pub total: usize,
    pub filled: usize,
    pub partial: usize,
    pub new: usize,
    pub rejected: usize,
}

impl OrderBookStats {
    /// Sum of the four status buckets; below `total` when some statuses
    /// were unrecognized
    pub fn classified(&self) -> usize {
        self.filled + self.partial + self.new + self.rejected
    }
}

/// Two-sided view of the current execution report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookProjection {
    pub buy_orders: Vec<ExecutionRecord>,
    pub sell_orders: Vec<ExecutionRecord>,
    pub stats: OrderBookStats,
}

impl OrderBookProjection {
    /// Partition and count records, keeping their report order on each side
    pub fn project(records: &[ExecutionRecord]) -> Self {
        let mut projection = OrderBookProjection {
            stats: OrderBookStats {
                total: records.len(),
                ..OrderBookStats::default()
            },
            ..OrderBookProjection::default()
        };

        for record in records {
            match &record.side {
                ReportedSide::Known(Side::Buy) => projection.buy_orders.push(record.clone()),
                ReportedSide::Known(Side::Sell) => projection.sell_orders.push(record.clone()),
                // No unknown-side bucket: anything unrecognized is shown as a sell.
                ReportedSide::Unrecognized(_) => projection.sell_orders.push(record.clone()),
            }

            match record.execution_status {
                ExecutionStatus::Filled => projection.stats.filled += 1,
                ExecutionStatus::PartiallyFilled => projection.stats.partial += 1,
                ExecutionStatus::New => projection.stats.new += 1,
                ExecutionStatus::Rejected => projection.stats.rejected += 1,
                ExecutionStatus::Unrecognized(_) => {}
            }
        }

        projection
    }
}
