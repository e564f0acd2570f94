//! Error types for order validation
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Reasons an order request is refused before it reaches the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Invalid client order ID: {0}")]
    InvalidClientOrderId(String),

    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),

    #[error("Invalid size: {0}")]
    InvalidQuantity(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display() {
        let err = OrderError::InvalidPrice("negative".to_string());
        assert_eq!(err.to_string(), "Invalid price: negative");
    }

    #[test]
    fn test_quantity_error_uses_engine_wording() {
        let err = OrderError::InvalidQuantity("15 is not a multiple of 10".to_string());
        assert!(err.to_string().starts_with("Invalid size"));
    }
}
