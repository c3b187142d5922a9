//! Read/write operations for taxonomy terms.

use sqlx::PgPool;

/// A row from the `terms` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TermRow {
    pub id: i64,
    pub taxonomy: String,
    pub slug: String,
    pub name: String,
}

/// All terms of one taxonomy, ordered by name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_terms(pool: &PgPool, taxonomy: &str) -> Result<Vec<TermRow>, sqlx::Error> {
    sqlx::query_as::<_, TermRow>(
        "SELECT id, taxonomy, slug, name FROM terms \
         WHERE taxonomy = $1 \
         ORDER BY name ASC",
    )
    .bind(taxonomy)
    .fetch_all(pool)
    .await
}

/// Insert or update a term, returning its id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_term(
    pool: &PgPool,
    taxonomy: &str,
    slug: &str,
    name: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO terms (taxonomy, slug, name) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (taxonomy, slug) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(taxonomy)
    .bind(slug)
    .bind(name)
    .fetch_one(pool)
    .await
}
