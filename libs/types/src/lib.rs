//! Types library for the flower exchange order pipeline
//!
//! Core type definitions shared by the order pipeline and the gateway:
//! what callers submit, what the matching engine reports back, and the
//! validation rules the calling layer applies before a batch is encoded.
//!
//! # Modules
//! - `ids`: Identifiers (BatchId, ClientOrderId, EngineOrderId)
//! - `numeric`: Price, Quantity and ReportedQuantity newtypes
//! - `order`: Instruments, sides and order requests
//! - `execution`: Execution records and statuses as reported by the engine
//! - `errors`: Order validation errors

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod execution;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::execution::*;
    pub use crate::errors::*;
}
