//! Repository layer for the `grocery_items` table.
//!
//! Every method issues exactly one SQL statement, except `seed_if_empty`
//! which is a count followed by sequential single-row inserts.

use crate::domain::{GroceryDraft, GroceryItem, ItemId, TimeMs};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{debug, warn};

/// Repository for grocery item persistence.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Insert a draft and return the store-assigned id.
    ///
    /// # Errors
    /// Returns an error on constraint violation or I/O failure.
    pub async fn create(&self, draft: &GroceryDraft) -> Result<ItemId, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO grocery_items (name, quantity, category, bought, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.name)
        .bind(draft.quantity)
        .bind(&draft.category)
        .bind(draft.bought as i64)
        .bind(draft.created_at.as_i64())
        .execute(&self.pool)
        .await?;

        let id = ItemId::new(result.last_insert_rowid());
        debug!(id = %id, name = %draft.name, "Inserted grocery item");
        Ok(id)
    }

    /// Fetch all rows in insertion order.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_all(&self) -> Result<Vec<GroceryItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, quantity, category, bought, created_at
            FROM grocery_items
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(item_from_row).collect()
    }

    /// Fetch a single row; `None` when no row has this id.
    pub async fn get_by_id(&self, id: ItemId) -> Result<Option<GroceryItem>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, quantity, category, bought, created_at
            FROM grocery_items
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(item_from_row).transpose()
    }

    /// Overwrite name, quantity, category and bought for `item.id`.
    ///
    /// Returns `false` when no row matched.
    pub async fn update(&self, item: &GroceryItem) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE grocery_items
            SET name = ?, quantity = ?, category = ?, bought = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.name)
        .bind(item.quantity)
        .bind(&item.category)
        .bind(item.bought as i64)
        .bind(item.id.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete the row with this id. Returns `false` when it did not exist.
    pub async fn delete(&self, id: ItemId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM grocery_items WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored rows.
    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM grocery_items")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("count"))
    }

    /// Insert `samples` in order when the table is empty.
    ///
    /// Returns the number of rows inserted (0 if the table already had rows).
    pub async fn seed_if_empty(&self, samples: &[GroceryDraft]) -> Result<usize, sqlx::Error> {
        if self.count().await? > 0 {
            return Ok(0);
        }

        for sample in samples {
            self.create(sample).await?;
        }
        Ok(samples.len())
    }
}

/// Decode one row. NULL columns take their defaults; a value of the wrong
/// type is a decode error.
fn item_from_row(row: &SqliteRow) -> Result<GroceryItem, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let created_at_ms: Option<i64> = row.try_get("created_at")?;

    let created_at = created_at_ms
        .and_then(|ms| TimeMs::new(ms).to_datetime())
        .unwrap_or_else(|| {
            warn!(
                id,
                created_at = ?created_at_ms,
                "Missing or invalid created_at, using Unix epoch"
            );
            DateTime::<Utc>::UNIX_EPOCH
        });

    Ok(GroceryItem {
        id: ItemId::new(id),
        name: row.try_get("name")?,
        quantity: row
            .try_get::<Option<i64>, _>("quantity")?
            .unwrap_or(crate::domain::DEFAULT_QUANTITY),
        category: row
            .try_get::<Option<String>, _>("category")?
            .unwrap_or_default(),
        bought: row.try_get::<Option<i64>, _>("bought")?.unwrap_or(0) != 0,
        created_at,
    })
}
