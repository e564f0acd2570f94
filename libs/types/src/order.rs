//! Order request types
//!
//! An order request is one instruction to trade a flower instrument. The
//! matching engine consumes sides as numeric codes (1 = Buy, 2 = Sell), so
//! `Side` serializes to its code while still accepting the label forms the
//! callers send.

use crate::errors::OrderError;
use crate::ids::ClientOrderId;
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Smallest order size accepted by the engine
pub const MIN_QUANTITY: u32 = 10;
/// Largest order size accepted by the engine
pub const MAX_QUANTITY: u32 = 1000;
/// Quantities must be a whole multiple of this lot size
pub const LOT_SIZE: u32 = 10;

/// Tradable flower instruments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instrument {
    Rose,
    Lavender,
    Tulip,
    Orchid,
    Lotus,
}

impl Instrument {
    pub const ALL: [Instrument; 5] = [
        Instrument::Rose,
        Instrument::Lavender,
        Instrument::Tulip,
        Instrument::Orchid,
        Instrument::Lotus,
    ];

    /// Name as written in the engine's CSV files
    pub fn as_str(&self) -> &'static str {
        match self {
            Instrument::Rose => "Rose",
            Instrument::Lavender => "Lavender",
            Instrument::Tulip => "Tulip",
            Instrument::Orchid => "Orchid",
            Instrument::Lotus => "Lotus",
        }
    }
}

impl FromStr for Instrument {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|instrument| instrument.as_str() == s.trim())
            .ok_or_else(|| OrderError::InvalidInstrument(s.to_string()))
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Buy order, engine code 1
    Buy,
    /// Sell order, engine code 2
    Sell,
}

impl Side {
    /// Numeric code used by the engine's CSV schema
    pub fn code(&self) -> u8 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Side::Buy),
            2 => Some(Side::Sell),
            _ => None,
        }
    }

    /// Parse either the numeric code as text or the side label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label == "1" || label.eq_ignore_ascii_case("buy") {
            Some(Side::Buy)
        } else if label == "2" || label.eq_ignore_ascii_case("sell") {
            Some(Side::Sell)
        } else {
            None
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.write_str("Buy"),
            Side::Sell => f.write_str("Sell"),
        }
    }
}

impl Serialize for Side {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SideRepr {
    Code(u64),
    Label(String),
}

impl<'de> Deserialize<'de> for Side {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let side = match SideRepr::deserialize(deserializer)? {
            SideRepr::Code(code) => Side::from_code(code),
            SideRepr::Label(label) => Side::from_label(&label),
        };
        side.ok_or_else(|| serde::de::Error::custom("side must be 1 (Buy) or 2 (Sell)"))
    }
}

/// One instruction to trade, as submitted by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub client_order_id: ClientOrderId,
    pub instrument: Instrument,
    pub side: Side,
    pub quantity: Quantity,
    pub price: Price,
}

impl OrderRequest {
    pub fn new(
        client_order_id: impl Into<ClientOrderId>,
        instrument: Instrument,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> Self {
        Self {
            client_order_id: client_order_id.into(),
            instrument,
            side,
            quantity,
            price,
        }
    }

    /// Check the bounds the engine enforces on every order
    ///
    /// The calling layer runs this before handing orders to the pipeline;
    /// the encoder itself writes whatever it is given.
    pub fn validate(&self) -> Result<(), OrderError> {
        if self.client_order_id.is_empty() {
            return Err(OrderError::InvalidClientOrderId(
                "client order ID is required".into(),
            ));
        }

        let quantity = self.quantity.value();
        if quantity < MIN_QUANTITY || quantity > MAX_QUANTITY {
            return Err(OrderError::InvalidQuantity(format!(
                "{} is outside {}..={}",
                quantity, MIN_QUANTITY, MAX_QUANTITY
            )));
        }
        if quantity % LOT_SIZE != 0 {
            return Err(OrderError::InvalidQuantity(format!(
                "{} is not a multiple of {}",
                quantity, LOT_SIZE
            )));
        }

        if self.price.is_negative() {
            return Err(OrderError::InvalidPrice(format!("{} is negative", self.price)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rose_buy(quantity: u32, price: &str) -> OrderRequest {
        OrderRequest::new(
            "aa13",
            Instrument::Rose,
            Side::Buy,
            Quantity::new(quantity),
            Price::from_str(price).unwrap(),
        )
    }

    #[test]
    fn test_side_codes() {
        assert_eq!(Side::Buy.code(), 1);
        assert_eq!(Side::Sell.code(), 2);
        assert_eq!(Side::from_code(1), Some(Side::Buy));
        assert_eq!(Side::from_code(3), None);
    }

    #[test]
    fn test_side_labels() {
        assert_eq!(Side::from_label("1"), Some(Side::Buy));
        assert_eq!(Side::from_label(" Sell "), Some(Side::Sell));
        assert_eq!(Side::from_label("BUY"), Some(Side::Buy));
        assert_eq!(Side::from_label("hold"), None);
    }

    #[test]
    fn test_side_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Side::Sell).unwrap(), "2");
    }

    #[test]
    fn test_side_deserializes_number_and_string_forms() {
        let from_number: Side = serde_json::from_str("1").unwrap();
        let from_text: Side = serde_json::from_str("\"1\"").unwrap();
        let from_label: Side = serde_json::from_str("\"Sell\"").unwrap();
        assert_eq!(from_number, Side::Buy);
        assert_eq!(from_text, Side::Buy);
        assert_eq!(from_label, Side::Sell);
        assert!(serde_json::from_str::<Side>("7").is_err());
    }

    #[test]
    fn test_instrument_parsing() {
        assert_eq!(Instrument::from_str("Lotus").unwrap(), Instrument::Lotus);
        assert!(matches!(
            Instrument::from_str("Daisy"),
            Err(OrderError::InvalidInstrument(_))
        ));
    }

    #[test]
    fn test_order_request_from_ui_json() {
        let json = r#"{"clientOrderId":"aa13","instrument":"Rose","side":"1","quantity":100,"price":55.5}"#;
        let order: OrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(order, rose_buy(100, "55.5"));
    }

    #[test]
    fn test_order_request_missing_field_fails() {
        let json = r#"{"clientOrderId":"aa13","instrument":"Rose","side":1,"quantity":100}"#;
        assert!(serde_json::from_str::<OrderRequest>(json).is_err());
    }

    #[test]
    fn test_validate_accepts_engine_bounds() {
        assert!(rose_buy(10, "0").validate().is_ok());
        assert!(rose_buy(1000, "55.5").validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_quantity() {
        assert!(matches!(rose_buy(0, "1").validate(), Err(OrderError::InvalidQuantity(_))));
        assert!(matches!(rose_buy(15, "1").validate(), Err(OrderError::InvalidQuantity(_))));
        assert!(matches!(rose_buy(1010, "1").validate(), Err(OrderError::InvalidQuantity(_))));
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        assert!(matches!(rose_buy(100, "-0.5").validate(), Err(OrderError::InvalidPrice(_))));
    }

    #[test]
    fn test_validate_rejects_blank_client_id() {
        let mut order = rose_buy(100, "1");
        order.client_order_id = ClientOrderId::new(" ");
        assert!(matches!(order.validate(), Err(OrderError::InvalidClientOrderId(_))));
    }
}
