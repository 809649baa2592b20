//! Catalog management service.

use std::collections::HashMap;

use chrono::Utc;
use common::{CategoryId, Page, PageRequest, ProductId};
use rust_decimal::Decimal;
use store::{Category, CategoryDelete, Product, ProductFilter, Store, StoreError};

use crate::error::{DomainError, Result};

use super::{CategoryRequest, ProductInput, ProductWithCategory};

/// Service for category and product management plus the catalog reports.
#[derive(Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    /// Creates a new catalog service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    // -- categories --

    /// All categories ordered by name, with product counts.
    pub async fn categories(&self) -> Result<Vec<(Category, i64)>> {
        Ok(self.store.categories().await?)
    }

    /// One category with its product count.
    pub async fn category(&self, id: CategoryId) -> Result<(Category, i64)> {
        self.store
            .categories()
            .await?
            .into_iter()
            .find(|(category, _)| category.id == id)
            .ok_or(DomainError::NotFound("Category"))
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn create_category(&self, request: CategoryRequest) -> Result<Category> {
        let name = request.validate()?;
        let now = Utc::now();
        let category = Category {
            id: CategoryId::new(),
            name,
            created_at: now,
            updated_at: now,
        };
        match self.store.insert_category(category.clone()).await {
            Ok(()) => Ok(category),
            Err(StoreError::Duplicate(_)) => Err(DomainError::Validation(
                "A category with this name already exists.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn rename_category(
        &self,
        id: CategoryId,
        request: CategoryRequest,
    ) -> Result<Category> {
        let name = request.validate()?;
        match self.store.rename_category(id, name, Utc::now()).await {
            Ok(Some(category)) => Ok(category),
            Ok(None) => Err(DomainError::NotFound("Category")),
            Err(StoreError::Duplicate(_)) => Err(DomainError::Validation(
                "A category with this name already exists.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes a category; a category that still owns products cannot be
    /// deleted.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<()> {
        match self.store.delete_category(id).await? {
            CategoryDelete::Deleted => Ok(()),
            CategoryDelete::HasProducts(_) => Err(DomainError::Validation(
                "The category cannot be deleted while it still has products.".to_string(),
            )),
            CategoryDelete::NotFound => Err(DomainError::NotFound("Category")),
        }
    }

    // -- products --

    #[tracing::instrument(skip(self, input))]
    pub async fn create_product(&self, input: ProductInput) -> Result<ProductWithCategory> {
        let name = input.validate()?;
        let category = self
            .store
            .category(input.category_id)
            .await?
            .ok_or_else(|| DomainError::Validation("Category not found.".to_string()))?;

        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name,
            description: input.description,
            category_id: input.category_id,
            price_without_vat: input.price_without_vat,
            vat_amount: input.vat_amount,
            price_with_vat: input.price_with_vat,
            unit: input.unit,
            stock_quantity: input.stock_quantity,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.save_checking_name(&product).await?;
        Ok(ProductWithCategory {
            product,
            category_name: category.name,
        })
    }

    #[tracing::instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: ProductId,
        input: ProductInput,
    ) -> Result<ProductWithCategory> {
        let existing = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound("Product"))?;
        let name = input.validate()?;
        let category = self
            .store
            .category(input.category_id)
            .await?
            .ok_or_else(|| DomainError::Validation("Category not found.".to_string()))?;

        let product = Product {
            id,
            name,
            description: input.description,
            category_id: input.category_id,
            price_without_vat: input.price_without_vat,
            vat_amount: input.vat_amount,
            price_with_vat: input.price_with_vat,
            unit: input.unit,
            stock_quantity: input.stock_quantity,
            is_active: existing.is_active,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };
        self.save_checking_name(&product).await?;
        Ok(ProductWithCategory {
            product,
            category_name: category.name,
        })
    }

    /// Deactivates a product. Products referenced by orders are never
    /// physically deleted; inactive products stay out of listings and can
    /// no longer be ordered or restocked.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate_product(&self, id: ProductId) -> Result<()> {
        let mut product = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound("Product"))?;
        product.is_active = false;
        product.updated_at = Utc::now();
        self.store.save_product(&product).await?;
        Ok(())
    }

    pub async fn product(&self, id: ProductId) -> Result<ProductWithCategory> {
        let product = self
            .store
            .product(id)
            .await?
            .ok_or(DomainError::NotFound("Product"))?;
        let category = self
            .store
            .category(product.category_id)
            .await?
            .ok_or(DomainError::NotFound("Category"))?;
        Ok(ProductWithCategory {
            product,
            category_name: category.name,
        })
    }

    /// Paginated product listing with category names resolved.
    pub async fn products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductWithCategory>> {
        let products = self.store.products(filter, page).await?;
        let names = self.category_names().await?;
        Ok(products.map(|product| {
            let category_name = names
                .get(&product.category_id)
                .cloned()
                .unwrap_or_default();
            ProductWithCategory {
                product,
                category_name,
            }
        }))
    }

    /// Active products with stock at or below the threshold, ascending by
    /// stock.
    pub async fn low_stock(&self, threshold: Decimal) -> Result<Vec<ProductWithCategory>> {
        let products = self.store.low_stock_products(threshold).await?;
        let names = self.category_names().await?;
        Ok(products
            .into_iter()
            .map(|product| {
                let category_name = names
                    .get(&product.category_id)
                    .cloned()
                    .unwrap_or_default();
                ProductWithCategory {
                    product,
                    category_name,
                }
            })
            .collect())
    }

    async fn category_names(&self) -> Result<HashMap<CategoryId, String>> {
        Ok(self
            .store
            .categories()
            .await?
            .into_iter()
            .map(|(category, _)| (category.id, category.name))
            .collect())
    }

    async fn save_checking_name(&self, product: &Product) -> Result<()> {
        match self.store.save_product(product).await {
            Ok(()) => Ok(()),
            Err(StoreError::Duplicate(_)) => Err(DomainError::Validation(
                "A product with this name already exists in this category.".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
