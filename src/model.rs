//! Input records handed over by the order/accounting side of the POS.
//!
//! Generators only ever borrow these; nothing in the crate mutates a record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DocumentError;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OrderItem {
    pub product_name_local: String,
    #[serde(default)]
    pub product_name_alt: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    #[serde(default)]
    pub line_discount: Decimal,
}

impl OrderItem {
    /// VAT-inclusive line amount before the line discount.
    pub fn gross(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    pub fn net(&self) -> Decimal {
        self.gross() - self.line_discount
    }
}

/// Invoice-level promo discount.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DiscountInfo {
    pub code: String,
    #[serde(default)]
    pub percentage: Decimal,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
    Other,
}

impl PaymentMethod {
    pub fn needs_signature(self) -> bool {
        self == Self::Card
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    DineIn,
    Takeaway,
    Delivery,
    Pickup,
}

impl OrderType {
    pub fn label(self) -> &'static str {
        match self {
            Self::DineIn => "Dine-in",
            Self::Takeaway => "Takeaway",
            Self::Delivery => "Delivery",
            Self::Pickup => "Pickup",
        }
    }

    pub fn label_alt(self) -> &'static str {
        match self {
            Self::DineIn => "محلي",
            Self::Takeaway => "سفري",
            Self::Delivery => "توصيل",
            Self::Pickup => "استلام",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::DineIn => "badge-dine-in",
            Self::Takeaway => "badge-takeaway",
            Self::Delivery => "badge-delivery",
            Self::Pickup => "badge-pickup",
        }
    }
}

/// One completed transaction.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct InvoiceRecord {
    pub order_number: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    pub total: Decimal,
    #[serde(default)]
    pub discount: Option<DiscountInfo>,
    #[serde(default)]
    pub invoice_discount: Option<Decimal>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// ISO-8601 timestamp; also the ZATCA timestamp field.
    pub date: String,
    #[serde(default)]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub branch_name: Option<String>,
    #[serde(default)]
    pub branch_address: Option<String>,
    #[serde(default)]
    pub employee_name: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_method_label: String,
    #[serde(default)]
    pub order_type: Option<OrderType>,
}

impl InvoiceRecord {
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.order_number.trim().is_empty() {
            return Err(DocumentError::InvalidRecord("order_number is empty".into()));
        }
        if self.total < Decimal::ZERO {
            return Err(DocumentError::InvalidRecord(format!(
                "order {} has a negative total",
                self.order_number
            )));
        }
        for item in &self.items {
            if item.quantity == 0 {
                return Err(DocumentError::InvalidRecord(format!(
                    "item {} has zero quantity",
                    item.product_name_local
                )));
            }
            if item.line_discount < Decimal::ZERO {
                return Err(DocumentError::InvalidRecord(format!(
                    "item {} has a negative discount",
                    item.product_name_local
                )));
            }
        }
        if let Some(discount) = &self.discount {
            if discount.amount < Decimal::ZERO
                || discount.percentage < Decimal::ZERO
                || discount.percentage > Decimal::ONE_HUNDRED
            {
                return Err(DocumentError::InvalidRecord(format!(
                    "discount {} is out of range",
                    discount.code
                )));
            }
        }
        if self.invoice_discount.is_some_and(|d| d < Decimal::ZERO) {
            return Err(DocumentError::InvalidRecord(
                "invoice_discount is negative".into(),
            ));
        }
        Ok(())
    }

    /// Label shown for the payment, falling back to the method name.
    pub fn payment_label(&self) -> &str {
        let label = self.payment_method_label.trim();
        if !label.is_empty() {
            return label;
        }
        match self.payment_method {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Online => "Online",
            PaymentMethod::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    Urgent,
}

/// What the kitchen needs to prepare an order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct KitchenOrder {
    pub order_number: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub order_type: Option<OrderType>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// The five fields of the ZATCA phase-1 QR payload, already formatted.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ZatcaFields {
    pub seller_name: String,
    pub vat_number: String,
    pub timestamp: String,
    pub total_with_vat: String,
    pub vat_amount: String,
}

/// Trimmed, non-empty view of an optional text field.
pub(crate) fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32) -> OrderItem {
        OrderItem {
            product_name_local: "Latte".to_string(),
            quantity,
            unit_price: Decimal::new(1500, 2),
            ..OrderItem::default()
        }
    }

    #[test]
    fn deserializes_minimal_record_with_defaults() {
        let record: InvoiceRecord = serde_json::from_str(
            r#"{
                "order_number": "A-1",
                "total": 114.0,
                "date": "2026-03-01T10:00:00Z",
                "items": [{"product_name_local": "Mocha", "quantity": 1, "unit_price": "100"}]
            }"#,
        )
        .unwrap();
        assert_eq!(record.payment_method, PaymentMethod::Cash);
        assert!(record.discount.is_none());
        assert!(record.order_type.is_none());
        assert_eq!(record.items[0].line_discount, Decimal::ZERO);
        assert_eq!(record.total, Decimal::new(114, 0));
    }

    #[test]
    fn order_type_uses_snake_case() {
        let parsed: OrderType = serde_json::from_str("\"dine_in\"").unwrap();
        assert_eq!(parsed, OrderType::DineIn);
    }

    #[test]
    fn validate_rejects_zero_quantity() {
        let record = InvoiceRecord {
            order_number: "A-2".to_string(),
            items: vec![item(0)],
            ..InvoiceRecord::default()
        };
        assert!(matches!(
            record.validate(),
            Err(DocumentError::InvalidRecord(_))
        ));
    }

    #[test]
    fn validate_rejects_discount_over_hundred_percent() {
        let record = InvoiceRecord {
            order_number: "A-3".to_string(),
            items: vec![item(1)],
            discount: Some(DiscountInfo {
                code: "ALL".to_string(),
                percentage: Decimal::new(150, 0),
                amount: Decimal::ZERO,
            }),
            ..InvoiceRecord::default()
        };
        assert!(record.validate().is_err());
    }

    #[test]
    fn payment_label_falls_back_to_method() {
        let record = InvoiceRecord {
            payment_method: PaymentMethod::Card,
            ..InvoiceRecord::default()
        };
        assert_eq!(record.payment_label(), "Card");
        let labelled = InvoiceRecord {
            payment_method_label: " mada ".to_string(),
            ..record
        };
        assert_eq!(labelled.payment_label(), "mada");
    }

    #[test]
    fn priority_parses_lowercase() {
        let parsed: Priority = serde_json::from_str("\"urgent\"").unwrap();
        assert_eq!(parsed, Priority::Urgent);
        assert_eq!(Priority::default(), Priority::Normal);
    }
}
