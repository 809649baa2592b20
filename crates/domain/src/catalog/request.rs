//! Catalog management inputs and validation.

use common::{CategoryId, UnitOfMeasure};
use rust_decimal::Decimal;

use crate::error::{DomainError, Result};

/// Input for creating or renaming a category.
#[derive(Debug, Clone)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    /// Returns the trimmed name; must be 2–100 characters.
    pub fn validate(&self) -> Result<String> {
        let name = self.name.trim();
        if name.len() < 2 {
            return Err(DomainError::Validation(
                "Category name must be at least 2 characters.".to_string(),
            ));
        }
        if name.len() > 100 {
            return Err(DomainError::Validation(
                "Category name cannot exceed 100 characters.".to_string(),
            ));
        }
        Ok(name.to_string())
    }
}

/// Input shared by product create and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: Option<String>,
    pub category_id: CategoryId,
    pub price_without_vat: Decimal,
    pub vat_amount: Decimal,
    pub price_with_vat: Decimal,
    pub unit: UnitOfMeasure,
    pub stock_quantity: Decimal,
}

impl ProductInput {
    /// Returns the trimmed name after checking field rules, including the
    /// price identity `price_with_vat == price_without_vat + vat_amount`.
    pub fn validate(&self) -> Result<String> {
        let name = self.name.trim();
        if name.len() < 2 {
            return Err(DomainError::Validation(
                "Product name must be at least 2 characters.".to_string(),
            ));
        }
        if name.len() > 200 {
            return Err(DomainError::Validation(
                "Product name cannot exceed 200 characters.".to_string(),
            ));
        }
        if let Some(description) = &self.description
            && description.len() > 2000
        {
            return Err(DomainError::Validation(
                "Description cannot exceed 2000 characters.".to_string(),
            ));
        }
        if self.price_without_vat <= Decimal::ZERO {
            return Err(DomainError::Validation(
                "Price without VAT must be greater than zero.".to_string(),
            ));
        }
        if self.vat_amount < Decimal::ZERO {
            return Err(DomainError::Validation(
                "VAT amount cannot be negative.".to_string(),
            ));
        }
        if self.price_with_vat != self.price_without_vat + self.vat_amount {
            return Err(DomainError::Validation(
                "Price with VAT must equal price without VAT plus the VAT amount.".to_string(),
            ));
        }
        if self.stock_quantity < Decimal::ZERO {
            return Err(DomainError::Validation(
                "Stock quantity cannot be negative.".to_string(),
            ));
        }
        Ok(name.to_string())
    }
}
