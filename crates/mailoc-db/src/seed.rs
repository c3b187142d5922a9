use mailoc_core::taxonomies::TaxonomyConfig;
use sqlx::PgPool;

use crate::DbError;

/// Upsert the terms declared in the taxonomy registry.
///
/// Returns the number of terms processed (inserted or updated). All upserts
/// run inside a single transaction; if any operation fails the entire batch
/// is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_terms(pool: &PgPool, taxonomies: &[TaxonomyConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for taxonomy in taxonomies {
        for term in &taxonomy.terms {
            sqlx::query(
                "INSERT INTO terms (taxonomy, slug, name) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (taxonomy, slug) DO UPDATE SET name = EXCLUDED.name",
            )
            .bind(&taxonomy.slug)
            .bind(&term.slug)
            .bind(&term.name)
            .execute(&mut *tx)
            .await?;

            count += 1;
        }
    }

    tx.commit().await?;
    Ok(count)
}
