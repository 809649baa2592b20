//! PostgreSQL store implementation.
//!
//! Every multi-row write runs inside an explicit transaction. The two
//! check-then-act races are handled here:
//!
//! - order-number allocation takes a transaction-scoped advisory lock on
//!   the day prefix before reading the day's greatest number, so two
//!   concurrent creates cannot compute the same suffix (the unique index
//!   on `order_number` is the backstop);
//! - confirmation locks the order row, then the affected product rows
//!   (`FOR UPDATE`, ordered by id so concurrent confirmations acquire
//!   locks in the same order), re-checks state and stock, and commits the
//!   decrements together with the status change.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use common::{
    CategoryId, CustomerType, DeliveryMethod, InvoiceId, OrderId, OrderNumber, OrderStatus, Page,
    PageRequest, ProductId, UnitOfMeasure,
};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::records::{Category, CustomerInfo, Invoice, InvoiceItem, Order, OrderItem, Product};
use crate::store::{
    CategoryDelete, ConfirmApply, CreatedOrder, NewInvoice, NewOrder, ProductFilter, ShortageRow,
    StatusCounts, StockDemand, Store, TransitionApply,
};
use crate::{Result, StoreError};

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("database migrations applied");
        Ok(())
    }

    fn row_to_category(row: &PgRow) -> Result<Category> {
        Ok(Category {
            id: CategoryId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::from_uuid(row.try_get::<Uuid, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category_id: CategoryId::from_uuid(row.try_get::<Uuid, _>("category_id")?),
            price_without_vat: row.try_get("price_without_vat")?,
            vat_amount: row.try_get("vat_amount")?,
            price_with_vat: row.try_get("price_with_vat")?,
            unit: UnitOfMeasure::try_from(row.try_get::<i16, _>("unit")?)?,
            stock_quantity: row.try_get("stock_quantity")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_order_head(row: &PgRow) -> Result<Order> {
        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            order_number: OrderNumber::from_stored(row.try_get("order_number")?),
            customer_type: CustomerType::try_from(row.try_get::<i16, _>("customer_type")?)?,
            delivery_method: DeliveryMethod::try_from(row.try_get::<i16, _>("delivery_method")?)?,
            status: OrderStatus::try_from(row.try_get::<i16, _>("status")?)?,
            is_cancelled: row.try_get("is_cancelled")?,
            delivery_fee: row.try_get("delivery_fee")?,
            created_at: row.try_get("created_at")?,
            confirmed_at: row.try_get("confirmed_at")?,
            completed_at: row.try_get("completed_at")?,
            updated_at: row.try_get("updated_at")?,
            customer: CustomerInfo::default(),
            items: Vec::new(),
        })
    }

    fn row_to_customer(row: &PgRow) -> Result<CustomerInfo> {
        Ok(CustomerInfo {
            full_name: row.try_get("full_name")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            company_name: row.try_get("company_name")?,
            tax_id: row.try_get("tax_id")?,
            representative: row.try_get("representative")?,
            contact_person: row.try_get("contact_person")?,
            contact_phone: row.try_get("contact_phone")?,
        })
    }

    fn row_to_order_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            unit_price_without_vat: row.try_get("unit_price_without_vat")?,
            vat_amount: row.try_get("vat_amount")?,
            unit_price_with_vat: row.try_get("unit_price_with_vat")?,
            unit: UnitOfMeasure::try_from(row.try_get::<i16, _>("unit")?)?,
        })
    }

    fn row_to_invoice_head(row: &PgRow) -> Result<Invoice> {
        Ok(Invoice {
            id: InvoiceId::from_uuid(row.try_get::<Uuid, _>("id")?),
            supplier_name: row.try_get("supplier_name")?,
            invoice_number: row.try_get("invoice_number")?,
            invoice_date: row.try_get("invoice_date")?,
            entry_date: row.try_get("entry_date")?,
            created_at: row.try_get("created_at")?,
            items: Vec::new(),
        })
    }

    fn row_to_invoice_item(row: &PgRow) -> Result<InvoiceItem> {
        Ok(InvoiceItem {
            product_id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
            quantity: row.try_get("quantity")?,
            purchase_price: row.try_get("purchase_price")?,
        })
    }

    /// Attaches customer snapshots and items to a set of order heads.
    async fn hydrate_orders(&self, mut orders: Vec<Order>) -> Result<Vec<Order>> {
        if orders.is_empty() {
            return Ok(orders);
        }
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id.as_uuid()).collect();

        let customer_rows = sqlx::query(
            "SELECT * FROM order_customer_info WHERE order_id = ANY($1)",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut customers: HashMap<OrderId, CustomerInfo> = HashMap::new();
        for row in &customer_rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
            customers.insert(order_id, Self::row_to_customer(row)?);
        }

        let item_rows = sqlx::query(
            "SELECT * FROM order_items WHERE order_id = ANY($1) ORDER BY position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut items: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for row in &item_rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?);
            items
                .entry(order_id)
                .or_default()
                .push(Self::row_to_order_item(row)?);
        }

        for order in &mut orders {
            if let Some(customer) = customers.remove(&order.id) {
                order.customer = customer;
            }
            if let Some(lines) = items.remove(&order.id) {
                order.items = lines;
            }
        }
        Ok(orders)
    }

    /// Attaches items to a set of invoice heads.
    async fn hydrate_invoices(&self, mut invoices: Vec<Invoice>) -> Result<Vec<Invoice>> {
        if invoices.is_empty() {
            return Ok(invoices);
        }
        let ids: Vec<Uuid> = invoices.iter().map(|i| i.id.as_uuid()).collect();
        let rows = sqlx::query(
            "SELECT * FROM invoice_items WHERE invoice_id = ANY($1) ORDER BY position",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let mut items: HashMap<InvoiceId, Vec<InvoiceItem>> = HashMap::new();
        for row in &rows {
            let invoice_id = InvoiceId::from_uuid(row.try_get::<Uuid, _>("invoice_id")?);
            items
                .entry(invoice_id)
                .or_default()
                .push(Self::row_to_invoice_item(row)?);
        }
        for invoice in &mut invoices {
            if let Some(lines) = items.remove(&invoice.id) {
                invoice.items = lines;
            }
        }
        Ok(invoices)
    }
}

/// Maps a unique-constraint violation to `Duplicate`, everything else to
/// `Database`.
fn map_unique_violation(e: sqlx::Error, constraint: &str, what: &'static str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some(constraint)
    {
        return StoreError::Duplicate(what);
    }
    StoreError::Database(e)
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_category(&self, category: Category) -> Result<()> {
        sqlx::query(
            "INSERT INTO categories (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "categories_name_key", "category name"))?;
        Ok(())
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: String,
        now: DateTime<Utc>,
    ) -> Result<Option<Category>> {
        let row = sqlx::query(
            "UPDATE categories SET name = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id.as_uuid())
        .bind(&name)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "categories_name_key", "category name"))?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn delete_category(&self, id: CategoryId) -> Result<CategoryDelete> {
        let mut tx = self.pool.begin().await?;
        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if product_count > 0 {
            return Ok(CategoryDelete::HasProducts(product_count));
        }
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        if result.rows_affected() == 0 {
            Ok(CategoryDelete::NotFound)
        } else {
            Ok(CategoryDelete::Deleted)
        }
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_category).transpose()
    }

    async fn categories(&self) -> Result<Vec<(Category, i64)>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.created_at, c.updated_at, COUNT(p.id) AS product_count
            FROM categories c
            LEFT JOIN products p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| {
                let category = Self::row_to_category(row)?;
                let count: i64 = row.try_get("product_count")?;
                Ok((category, count))
            })
            .collect()
    }

    async fn save_product(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, category_id,
                price_without_vat, vat_amount, price_with_vat,
                unit, stock_quantity, is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                category_id = EXCLUDED.category_id,
                price_without_vat = EXCLUDED.price_without_vat,
                vat_amount = EXCLUDED.vat_amount,
                price_with_vat = EXCLUDED.price_with_vat,
                unit = EXCLUDED.unit,
                stock_quantity = EXCLUDED.stock_quantity,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.as_uuid())
        .bind(product.price_without_vat)
        .bind(product.vat_amount)
        .bind(product.price_with_vat)
        .bind(product.unit.as_i16())
        .bind(product.stock_quantity)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                "products_name_unique_per_category",
                "product name within category",
            )
        })?;
        Ok(())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn products_by_ids(&self, ids: &[ProductId]) -> Result<HashMap<ProductId, Product>> {
        let uuids: Vec<Uuid> = ids.iter().map(|id| id.as_uuid()).collect();
        let rows = sqlx::query("SELECT * FROM products WHERE id = ANY($1)")
            .bind(&uuids)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                let product = Self::row_to_product(row)?;
                Ok((product.id, product))
            })
            .collect()
    }

    async fn products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
        // Build the shared WHERE clause dynamically, binding in order.
        let mut conditions = String::new();
        let mut param = 0;
        if !filter.include_inactive {
            conditions.push_str(" AND is_active");
        }
        if filter.category_id.is_some() {
            param += 1;
            conditions.push_str(&format!(" AND category_id = ${param}"));
        }
        if filter.search.is_some() {
            param += 1;
            conditions.push_str(&format!(" AND name ILIKE ${param}"));
        }

        let search_pattern = filter.search.as_ref().map(|s| format!("%{s}%"));

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE 1=1{conditions}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(category_id) = filter.category_id {
            count_query = count_query.bind(category_id.as_uuid());
        }
        if let Some(ref pattern) = search_pattern {
            count_query = count_query.bind(pattern);
        }
        let total_count = count_query.fetch_one(&self.pool).await?;

        let list_sql = format!(
            "SELECT * FROM products WHERE 1=1{conditions} ORDER BY name LIMIT ${} OFFSET ${}",
            param + 1,
            param + 2
        );
        let mut list_query = sqlx::query(&list_sql);
        if let Some(category_id) = filter.category_id {
            list_query = list_query.bind(category_id.as_uuid());
        }
        if let Some(ref pattern) = search_pattern {
            list_query = list_query.bind(pattern);
        }
        let rows = list_query
            .bind(page.page_size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let items: Result<Vec<Product>> = rows.iter().map(Self::row_to_product).collect();
        Ok(Page::new(items?, total_count, page))
    }

    async fn low_stock_products(&self, threshold: Decimal) -> Result<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE is_active AND stock_quantity <= $1 ORDER BY stock_quantity",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_product).collect()
    }

    async fn active_product_count(&self) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active")
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn insert_order(
        &self,
        order: NewOrder,
        day: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<CreatedOrder> {
        let prefix = OrderNumber::day_prefix(day);
        let mut tx = self.pool.begin().await?;

        // Serialize allocation per day prefix; released at commit/rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1)::bigint)")
            .bind(&prefix)
            .execute(&mut *tx)
            .await?;

        let last: Option<String> = sqlx::query_scalar(
            "SELECT order_number FROM orders WHERE order_number LIKE $1 ORDER BY order_number DESC LIMIT 1",
        )
        .bind(format!("{prefix}%"))
        .fetch_optional(&mut *tx)
        .await?;
        let order_number = OrderNumber::next_for_day(day, last.as_deref())?;

        let id = OrderId::new();
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_type, delivery_method, status,
                is_cancelled, delivery_fee, created_at, confirmed_at, completed_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, FALSE, NULL, $6, NULL, NULL, $6)
            "#,
        )
        .bind(id.as_uuid())
        .bind(order_number.as_str())
        .bind(order.customer_type.as_i16())
        .bind(order.delivery_method.as_i16())
        .bind(OrderStatus::Pending.as_i16())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "orders_order_number_key", "order number"))?;

        sqlx::query(
            r#"
            INSERT INTO order_customer_info (
                order_id, full_name, phone, address, company_name,
                tax_id, representative, contact_person, contact_phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&order.customer.full_name)
        .bind(&order.customer.phone)
        .bind(&order.customer.address)
        .bind(&order.customer.company_name)
        .bind(&order.customer.tax_id)
        .bind(&order.customer.representative)
        .bind(&order.customer.contact_person)
        .bind(&order.customer.contact_phone)
        .execute(&mut *tx)
        .await?;

        for (position, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    order_id, position, product_id, product_name, quantity,
                    unit_price_without_vat, vat_amount, unit_price_with_vat, unit
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_uuid())
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_without_vat)
            .bind(item.vat_amount)
            .bind(item.unit_price_with_vat)
            .bind(item.unit.as_i16())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(CreatedOrder { id, order_number })
    }

    async fn order(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let head = Self::row_to_order_head(&row)?;
        let mut hydrated = self.hydrate_orders(vec![head]).await?;
        Ok(hydrated.pop())
    }

    async fn orders(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>> {
        let (total_count, rows) = match status {
            Some(status) => {
                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = $1")
                        .bind(status.as_i16())
                        .fetch_one(&self.pool)
                        .await?;
                let rows = sqlx::query(
                    "SELECT * FROM orders WHERE status = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(status.as_i16())
                .bind(page.page_size())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;
                (total, rows)
            }
            None => {
                let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
                    .fetch_one(&self.pool)
                    .await?;
                let rows = sqlx::query(
                    "SELECT * FROM orders ORDER BY created_at DESC LIMIT $1 OFFSET $2",
                )
                .bind(page.page_size())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await?;
                (total, rows)
            }
        };

        let heads: Result<Vec<Order>> = rows.iter().map(Self::row_to_order_head).collect();
        let orders = self.hydrate_orders(heads?).await?;
        Ok(Page::new(orders, total_count, page))
    }

    async fn recent_orders(&self, limit: i64) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        let heads: Result<Vec<Order>> = rows.iter().map(Self::row_to_order_head).collect();
        self.hydrate_orders(heads?).await
    }

    async fn order_status_counts(&self) -> Result<StatusCounts> {
        let rows = sqlx::query(
            "SELECT status, COUNT(*) AS cnt FROM orders WHERE NOT is_cancelled GROUP BY status",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut counts = StatusCounts::default();
        for row in &rows {
            let status = OrderStatus::try_from(row.try_get::<i16, _>("status")?)?;
            let count: i64 = row.try_get("cnt")?;
            match status {
                OrderStatus::Pending => counts.pending = count,
                OrderStatus::Confirmed => counts.confirmed = count,
                OrderStatus::Completed => counts.completed = count,
            }
        }
        Ok(counts)
    }

    async fn apply_confirmation(
        &self,
        id: OrderId,
        demands: &[StockDemand],
        now: DateTime<Utc>,
    ) -> Result<ConfirmApply> {
        let mut tx = self.pool.begin().await?;

        // Lock the order row and re-check its state inside the
        // transaction; the caller's earlier check may be stale.
        let order_row =
            sqlx::query("SELECT status, is_cancelled FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        let Some(order_row) = order_row else {
            return Ok(ConfirmApply::NotFound);
        };
        let status = OrderStatus::try_from(order_row.try_get::<i16, _>("status")?)?;
        let is_cancelled: bool = order_row.try_get("is_cancelled")?;
        if is_cancelled || !status.can_confirm() {
            return Ok(ConfirmApply::InvalidState {
                status,
                is_cancelled,
            });
        }

        // Lock the affected product rows in a deterministic order.
        let product_ids: Vec<Uuid> = demands.iter().map(|d| d.product_id.as_uuid()).collect();
        let product_rows = sqlx::query(
            "SELECT id, name, stock_quantity, unit FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        struct Locked {
            name: String,
            stock: Decimal,
            unit: UnitOfMeasure,
        }
        let mut locked: HashMap<ProductId, Locked> = HashMap::new();
        for row in &product_rows {
            let product_id = ProductId::from_uuid(row.try_get::<Uuid, _>("id")?);
            locked.insert(
                product_id,
                Locked {
                    name: row.try_get("name")?,
                    stock: row.try_get("stock_quantity")?,
                    unit: UnitOfMeasure::try_from(row.try_get::<i16, _>("unit")?)?,
                },
            );
        }

        // Check every line; shortages are collected, not short-circuited.
        let mut shortages = Vec::new();
        for demand in demands {
            let product = locked
                .get(&demand.product_id)
                .ok_or(StoreError::UnknownProduct(demand.product_id))?;
            if product.stock < demand.quantity {
                shortages.push(ShortageRow {
                    product_id: demand.product_id,
                    product_name: product.name.clone(),
                    ordered: demand.quantity,
                    available: product.stock,
                    unit: product.unit,
                });
            }
        }
        if !shortages.is_empty() {
            // Dropping the transaction rolls back; nothing was written.
            return Ok(ConfirmApply::InsufficientStock(shortages));
        }

        for demand in demands {
            sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity - $2, updated_at = $3 WHERE id = $1",
            )
            .bind(demand.product_id.as_uuid())
            .bind(demand.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE orders SET status = $2, confirmed_at = $3, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(OrderStatus::Confirmed.as_i16())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(ConfirmApply::Applied)
    }

    async fn apply_completion(&self, id: OrderId, now: DateTime<Utc>) -> Result<TransitionApply> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET status = $2, completed_at = $3, updated_at = $3
            WHERE id = $1 AND status = $4 AND NOT is_cancelled
            "#,
        )
        .bind(id.as_uuid())
        .bind(OrderStatus::Completed.as_i16())
        .bind(now)
        .bind(OrderStatus::Confirmed.as_i16())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(TransitionApply::Applied);
        }

        // The conditional update missed: report why.
        let row = sqlx::query("SELECT status, is_cancelled FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(TransitionApply::InvalidState {
                status: OrderStatus::try_from(row.try_get::<i16, _>("status")?)?,
                is_cancelled: row.try_get("is_cancelled")?,
            }),
            None => Ok(TransitionApply::NotFound),
        }
    }

    async fn apply_cancellation(
        &self,
        id: OrderId,
        now: DateTime<Utc>,
    ) -> Result<TransitionApply> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET is_cancelled = TRUE, updated_at = $2
            WHERE id = $1 AND status = $3 AND NOT is_cancelled
            "#,
        )
        .bind(id.as_uuid())
        .bind(now)
        .bind(OrderStatus::Pending.as_i16())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(TransitionApply::Applied);
        }

        let row = sqlx::query("SELECT status, is_cancelled FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(TransitionApply::InvalidState {
                status: OrderStatus::try_from(row.try_get::<i16, _>("status")?)?,
                is_cancelled: row.try_get("is_cancelled")?,
            }),
            None => Ok(TransitionApply::NotFound),
        }
    }

    async fn set_delivery_fee(
        &self,
        id: OrderId,
        fee: Decimal,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result =
            sqlx::query("UPDATE orders SET delivery_fee = $2, updated_at = $3 WHERE id = $1")
                .bind(id.as_uuid())
                .bind(fee)
                .bind(now)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_invoice(&self, invoice: NewInvoice, now: DateTime<Utc>) -> Result<InvoiceId> {
        let id = InvoiceId::new();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (id, supplier_name, invoice_number, invoice_date, entry_date, created_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(id.as_uuid())
        .bind(&invoice.supplier_name)
        .bind(&invoice.invoice_number)
        .bind(invoice.invoice_date)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for (position, item) in invoice.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (invoice_id, position, product_id, quantity, purchase_price)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id.as_uuid())
            .bind(position as i32)
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.purchase_price)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                "UPDATE products SET stock_quantity = stock_quantity + $2, updated_at = $3 WHERE id = $1",
            )
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(StoreError::UnknownProduct(item.product_id));
            }
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn invoice(&self, id: InvoiceId) -> Result<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let head = Self::row_to_invoice_head(&row)?;
        let mut hydrated = self.hydrate_invoices(vec![head]).await?;
        Ok(hydrated.pop())
    }

    async fn invoices(&self, page: PageRequest) -> Result<Page<Invoice>> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query("SELECT * FROM invoices ORDER BY entry_date DESC LIMIT $1 OFFSET $2")
            .bind(page.page_size())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;
        let heads: Result<Vec<Invoice>> = rows.iter().map(Self::row_to_invoice_head).collect();
        let invoices = self.hydrate_invoices(heads?).await?;
        Ok(Page::new(invoices, total_count, page))
    }
}
