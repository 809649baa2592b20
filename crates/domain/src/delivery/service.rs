//! Delivery intake service.

use chrono::Utc;
use common::{InvoiceId, Page, PageRequest, ProductId};
use store::{InvoiceItem, NewInvoice, Store};

use crate::error::{DomainError, Result};

use super::{DeliveryLine, InvoiceDetail, InvoiceSummary, RecordDeliveryRequest, RecordedDelivery};

/// Service recording supplier deliveries and serving their views.
#[derive(Clone)]
pub struct DeliveryService<S: Store> {
    store: S,
}

impl<S: Store> DeliveryService<S> {
    /// Creates a new delivery service over the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a delivery: persists the invoice with its lines and
    /// increments each referenced product's stock, all in one atomic
    /// store operation. This is the only path besides seeding that
    /// increases stock.
    #[tracing::instrument(skip(self, request))]
    pub async fn record(&self, request: RecordDeliveryRequest) -> Result<RecordedDelivery> {
        let now = Utc::now();
        let (supplier_name, invoice_number) = request.validate(now.date_naive())?;

        let mut ids: Vec<ProductId> = request.items.iter().map(|i| i.product_id).collect();
        ids.sort();
        ids.dedup();
        let products = self.store.products_by_ids(&ids).await?;
        for item in &request.items {
            let Some(product) = products.get(&item.product_id) else {
                return Err(DomainError::Validation(format!(
                    "Product with ID {} was not found.",
                    item.product_id
                )));
            };
            if !product.is_active {
                return Err(DomainError::Validation(format!(
                    "Product '{}' is not active.",
                    product.name
                )));
            }
        }

        let items: Vec<InvoiceItem> = request
            .items
            .iter()
            .map(|i| InvoiceItem {
                product_id: i.product_id,
                quantity: i.quantity,
                purchase_price: i.purchase_price,
            })
            .collect();

        let id = self
            .store
            .insert_invoice(
                NewInvoice {
                    supplier_name: supplier_name.clone(),
                    invoice_number: invoice_number.clone(),
                    invoice_date: request.invoice_date,
                    items,
                },
                now,
            )
            .await?;

        metrics::counter!("deliveries_recorded_total").increment(1);
        tracing::info!(%id, supplier = %supplier_name, "delivery recorded, stock updated");
        Ok(RecordedDelivery {
            id,
            supplier_name,
            invoice_number,
        })
    }

    /// Paginated listing, most recent entry first.
    pub async fn list(&self, page: PageRequest) -> Result<Page<InvoiceSummary>> {
        let invoices = self.store.invoices(page).await?;
        Ok(invoices.map(InvoiceSummary::from_invoice))
    }

    /// Full delivery detail with product names and units resolved.
    pub async fn get(&self, id: InvoiceId) -> Result<InvoiceDetail> {
        let invoice = self
            .store
            .invoice(id)
            .await?
            .ok_or(DomainError::NotFound("Delivery"))?;

        let ids: Vec<ProductId> = invoice.items.iter().map(|i| i.product_id).collect();
        let products = self.store.products_by_ids(&ids).await?;

        let mut invoice_total = rust_decimal::Decimal::ZERO;
        let mut lines = Vec::with_capacity(invoice.items.len());
        for item in &invoice.items {
            let product = products
                .get(&item.product_id)
                .ok_or(DomainError::NotFound("Product"))?;
            let row_total = item.quantity * item.purchase_price;
            invoice_total += row_total;
            lines.push(DeliveryLine {
                product_id: item.product_id,
                product_name: product.name.clone(),
                unit: product.unit,
                quantity: item.quantity,
                purchase_price: item.purchase_price,
                row_total,
            });
        }

        Ok(InvoiceDetail {
            id: invoice.id,
            supplier_name: invoice.supplier_name,
            invoice_number: invoice.invoice_number,
            invoice_date: invoice.invoice_date,
            entry_date: invoice.entry_date,
            lines,
            invoice_total,
        })
    }
}
