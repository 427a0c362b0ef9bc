//! Database operations for the `products` snapshot table.

use chrono::{DateTime, Utc};
use shopwatch_core::{CanonicalTz, Product};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub url: String,
    pub name: String,
    pub price: i64,
    pub available: bool,
    pub tags: Vec<String>,
    pub image_url: String,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    /// Converts the row into a [`Product`] with `last_seen` in the canonical timezone.
    #[must_use]
    pub fn into_product(self, tz: CanonicalTz) -> Product {
        Product {
            url: self.url,
            name: self.name,
            price: self.price,
            available: self.available,
            tags: self.tags,
            image_url: self.image_url,
            last_seen: tz.normalize(&self.last_seen),
        }
    }
}

/// Lists the whole snapshot ordered by product name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(pool: &PgPool) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT url, name, price, available, tags, image_url, last_seen, created_at, updated_at \
         FROM products \
         ORDER BY name, url",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Upserts a snapshot row keyed by `url`.
///
/// Conflicts update every observed field and `updated_at`; `created_at`
/// keeps the first time the product entered the snapshot.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product(pool: &PgPool, product: &Product) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO products (url, name, price, available, tags, image_url, last_seen) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (url) DO UPDATE SET \
             name       = EXCLUDED.name, \
             price      = EXCLUDED.price, \
             available  = EXCLUDED.available, \
             tags       = EXCLUDED.tags, \
             image_url  = EXCLUDED.image_url, \
             last_seen  = EXCLUDED.last_seen, \
             updated_at = NOW()",
    )
    .bind(&product.url)
    .bind(&product.name)
    .bind(product.price)
    .bind(product.available)
    .bind(&product.tags)
    .bind(&product.image_url)
    .bind(product.last_seen)
    .execute(pool)
    .await?;

    Ok(())
}

/// Deletes the snapshot rows for `urls`. Returns the number of rows removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_products_by_url(pool: &PgPool, urls: &[String]) -> Result<u64, DbError> {
    if urls.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM products WHERE url = ANY($1)")
        .bind(urls)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
