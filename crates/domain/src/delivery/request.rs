//! Delivery intake request and validation.

use chrono::NaiveDate;
use common::ProductId;
use rust_decimal::Decimal;

use crate::error::{DomainError, Result};

/// One delivered line.
#[derive(Debug, Clone)]
pub struct DeliveryLineRequest {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
}

/// Request to record a supplier delivery.
#[derive(Debug, Clone)]
pub struct RecordDeliveryRequest {
    pub supplier_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub items: Vec<DeliveryLineRequest>,
}

impl RecordDeliveryRequest {
    /// Validates the request against `today` and returns the trimmed
    /// supplier name and invoice number. Product existence/activity is
    /// checked by the service.
    pub fn validate(&self, today: NaiveDate) -> Result<(String, String)> {
        let supplier = self.supplier_name.trim();
        if supplier.len() < 2 {
            return Err(DomainError::Validation(
                "Supplier name is required (at least 2 characters).".to_string(),
            ));
        }
        if supplier.len() > 200 {
            return Err(DomainError::Validation(
                "Supplier name cannot exceed 200 characters.".to_string(),
            ));
        }

        let invoice_number = self.invoice_number.trim();
        if invoice_number.is_empty() {
            return Err(DomainError::Validation(
                "Invoice number is required.".to_string(),
            ));
        }
        if invoice_number.len() > 50 {
            return Err(DomainError::Validation(
                "Invoice number cannot exceed 50 characters.".to_string(),
            ));
        }

        if self.invoice_date > today {
            return Err(DomainError::Validation(
                "Invoice date cannot be in the future.".to_string(),
            ));
        }

        if self.items.is_empty() {
            return Err(DomainError::Validation(
                "A delivery must contain at least one item.".to_string(),
            ));
        }
        for item in &self.items {
            if item.quantity <= Decimal::ZERO {
                return Err(DomainError::Validation(
                    "Item quantity must be greater than zero.".to_string(),
                ));
            }
            if item.purchase_price < Decimal::ZERO {
                return Err(DomainError::Validation(
                    "Purchase price cannot be negative.".to_string(),
                ));
            }
        }

        Ok((supplier.to_string(), invoice_number.to_string()))
    }
}
