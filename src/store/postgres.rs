//! Postgres-backed record store.
//!
//! Uniqueness of `issued_tickets.ticket_code` and the single-use
//! `validated_at` transition are both enforced by the database, so several
//! API instances can share one database safely.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{RecordStore, StoreError};
use crate::models::{
    Customer, CustomerDetails, Event, IssuedTicket, NewEvent, NewOrder, NewTicketType, Order,
    OrderLineItem, OrderWithItems, TicketType,
};

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

/// `orders` row as stored; `payment_method` is plain text in the table.
#[derive(FromRow)]
struct OrderRow {
    id: i64,
    order_id: String,
    customer_id: i64,
    event_id: i64,
    customer_name: Option<String>,
    total: Decimal,
    payment_method: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Order {
            payment_method: row.payment_method.parse().map_err(StoreError::InvalidData)?,
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            event_id: row.event_id,
            customer_name: row.customer_name,
            total: row.total,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str =
    "id, order_id, customer_id, event_id, customer_name, total, payment_method, created_at";
const LINE_ITEM_COLUMNS: &str = "order_id, ticket_type_id, ticket_name, quantity, unit_price";
const TICKET_COLUMNS: &str = "order_id, event_id, ticket_type_id, ticket_code, ticket_name, \
                              unit_price, customer_name, validated_at";

/// Postgres accepts at most this many bind parameters per statement.
const MAX_BIND_PARAMS: usize = 65_535;
const TICKET_BINDS: usize = 8;
const TICKETS_PER_INSERT: usize = MAX_BIND_PARAMS / TICKET_BINDS;

fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::UniqueViolation(
                db_err.constraint().unwrap_or("unique constraint").to_string(),
            );
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::Conflict(
                db_err.constraint().unwrap_or("foreign key").to_string(),
            );
        }
    }
    StoreError::Database(err)
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn create_event(&self, event: NewEvent) -> Result<Event, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (name, date, location, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, date, location, description
            "#,
        )
        .bind(&event.name)
        .bind(&event.date)
        .bind(&event.location)
        .bind(&event.description)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(event)
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let events = sqlx::query_as::<_, Event>(
            "SELECT id, name, date, location, description FROM events ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn get_event(&self, event_id: i64) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>(
            "SELECT id, name, date, location, description FROM events WHERE id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    async fn delete_event(&self, event_id: i64) -> Result<(), StoreError> {
        // orders and issued_tickets reference events ON DELETE RESTRICT;
        // ticket_types cascade.
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("event {}", event_id)));
        }
        Ok(())
    }

    async fn create_ticket_type(
        &self,
        event_id: i64,
        ticket_type: NewTicketType,
    ) -> Result<TicketType, StoreError> {
        let created = sqlx::query_as::<_, TicketType>(
            r#"
            INSERT INTO ticket_types (event_id, name, price, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, event_id, name, price, description
            "#,
        )
        .bind(event_id)
        .bind(&ticket_type.name)
        .bind(ticket_type.price)
        .bind(&ticket_type.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_write_error(e) {
            StoreError::Conflict(_) => StoreError::NotFound(format!("event {}", event_id)),
            other => other,
        })?;

        Ok(created)
    }

    async fn list_ticket_types(&self, event_id: i64) -> Result<Vec<TicketType>, StoreError> {
        let ticket_types = sqlx::query_as::<_, TicketType>(
            r#"
            SELECT id, event_id, name, price, description
            FROM ticket_types
            WHERE event_id = $1
            ORDER BY id
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ticket_types)
    }

    async fn get_ticket_type(&self, ticket_type_id: i64) -> Result<Option<TicketType>, StoreError> {
        let ticket_type = sqlx::query_as::<_, TicketType>(
            "SELECT id, event_id, name, price, description FROM ticket_types WHERE id = $1",
        )
        .bind(ticket_type_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket_type)
    }

    async fn upsert_customer(&self, details: &CustomerDetails) -> Result<Customer, StoreError> {
        let updated = sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, email = $4
            WHERE id = (SELECT id FROM customers WHERE cpf = $1 ORDER BY id LIMIT 1)
            RETURNING id, name, phone, email, cpf
            "#,
        )
        .bind(&details.cpf)
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(customer) = updated {
            return Ok(customer);
        }

        let created = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, phone, email, cpf)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, phone, email, cpf
            "#,
        )
        .bind(&details.name)
        .bind(&details.phone)
        .bind(&details.email)
        .bind(&details.cpf)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(created)
    }

    async fn create_order(&self, order: NewOrder) -> Result<OrderWithItems, StoreError> {
        let total = order.total().ok_or_else(|| {
            StoreError::InvalidData(format!("total of order {} overflows", order.order_id))
        })?;
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r#"
            INSERT INTO orders
                (order_id, customer_id, event_id, customer_name, total, payment_method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        ))
        .bind(&order.order_id)
        .bind(order.customer_id)
        .bind(order.event_id)
        .bind(&order.customer_name)
        .bind(total)
        .bind(order.payment_method.as_str())
        .bind(order.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let line_items = if order.line_items.is_empty() {
            Vec::new()
        } else {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO order_line_items (order_id, ticket_type_id, ticket_name, quantity, unit_price) ",
            );
            builder.push_values(&order.line_items, |mut b, item| {
                b.push_bind(&row.order_id)
                    .push_bind(item.ticket_type_id)
                    .push_bind(&item.ticket_name)
                    .push_bind(item.quantity)
                    .push_bind(item.unit_price);
            });
            builder.push(" RETURNING ");
            builder.push(LINE_ITEM_COLUMNS);

            builder
                .build_query_as::<OrderLineItem>()
                .fetch_all(&mut *tx)
                .await
                .map_err(map_write_error)?
        };

        tx.commit().await?;

        Ok(OrderWithItems {
            order: row.try_into()?,
            line_items,
        })
    }

    async fn get_order_with_line_items(
        &self,
        order_id: &str,
    ) -> Result<Option<OrderWithItems>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let line_items = sqlx::query_as::<_, OrderLineItem>(&format!(
            "SELECT {} FROM order_line_items WHERE order_id = $1 ORDER BY id",
            LINE_ITEM_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderWithItems {
            order: row.try_into()?,
            line_items,
        }))
    }

    async fn insert_issued_tickets(&self, rows: &[IssuedTicket]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        // Chunks share one transaction so the batch still lands completely
        // or not at all.
        let mut tx = self.pool.begin().await?;
        for chunk in rows.chunks(TICKETS_PER_INSERT) {
            let mut builder: QueryBuilder<Postgres> =
                QueryBuilder::new(format!("INSERT INTO issued_tickets ({}) ", TICKET_COLUMNS));
            builder.push_values(chunk, |mut b, ticket| {
                b.push_bind(&ticket.order_id)
                    .push_bind(ticket.event_id)
                    .push_bind(ticket.ticket_type_id)
                    .push_bind(&ticket.ticket_code)
                    .push_bind(&ticket.ticket_name)
                    .push_bind(ticket.unit_price)
                    .push_bind(&ticket.customer_name)
                    .push_bind(ticket.validated_at);
            });

            builder
                .build()
                .execute(&mut *tx)
                .await
                .map_err(map_write_error)?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn find_issued_ticket_by_code(
        &self,
        ticket_code: &str,
    ) -> Result<Option<IssuedTicket>, StoreError> {
        let ticket = sqlx::query_as::<_, IssuedTicket>(&format!(
            "SELECT {} FROM issued_tickets WHERE ticket_code = $1",
            TICKET_COLUMNS
        ))
        .bind(ticket_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    async fn find_issued_tickets_by_order(
        &self,
        order_id: &str,
    ) -> Result<Vec<IssuedTicket>, StoreError> {
        let tickets = sqlx::query_as::<_, IssuedTicket>(&format!(
            "SELECT {} FROM issued_tickets WHERE order_id = $1 ORDER BY ticket_code",
            TICKET_COLUMNS
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    async fn conditional_mark_validated(
        &self,
        ticket_code: &str,
        validated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE issued_tickets
            SET validated_at = $2
            WHERE ticket_code = $1 AND validated_at IS NULL
            "#,
        )
        .bind(ticket_code)
        .bind(validated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
