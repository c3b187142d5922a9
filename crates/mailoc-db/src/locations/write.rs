//! Write operations for the `locations` tables.

use sqlx::PgPool;
use uuid::Uuid;

use super::meta;
use super::types::{LocationRow, NewLocation};
use crate::DbError;

/// Create a location with its attribute rows and term assignments in one
/// transaction.
///
/// Attribute rows are written only for fields that are present; coordinates
/// are formatted as decimal strings under the stored coordinate keys. Term
/// slugs that do not exist in their taxonomy are skipped, not created.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is
/// rolled back.
pub async fn insert_location(pool: &PgPool, location: &NewLocation) -> Result<LocationRow, DbError> {
    let mut tx = pool.begin().await?;

    let row = sqlx::query_as::<_, LocationRow>(
        "INSERT INTO locations (title, summary, status, phone, url, email) \
         VALUES ($1, $2, 'publish', $3, $4, $5) \
         RETURNING id, public_id, title, summary, status, phone, url, email, \
                   created_at, updated_at",
    )
    .bind(&location.title)
    .bind(&location.summary)
    .bind(&location.phone)
    .bind(&location.url)
    .bind(&location.email)
    .fetch_one(&mut *tx)
    .await?;

    let mut attributes: Vec<(&str, String)> = Vec::new();
    let text_fields = [
        (meta::ADDRESS_STREET, &location.street),
        (meta::ADDRESS_STREET_2, &location.street_2),
        (meta::ADDRESS_CITY, &location.city),
        (meta::ADDRESS_STATE, &location.state),
        (meta::ADDRESS_STATE_INT, &location.state_int),
        (meta::ADDRESS_POSTCODE, &location.postcode),
        (meta::ADDRESS_COUNTRY, &location.country),
        (meta::PLACE_ID, &location.place_id),
    ];
    for (key, value) in text_fields {
        if let Some(value) = value {
            attributes.push((key, value.clone()));
        }
    }
    if let Some(lat) = location.latitude {
        attributes.push((meta::LOCATION_LAT, format_coordinate(lat)));
    }
    if let Some(lng) = location.longitude {
        attributes.push((meta::LOCATION_LNG, format_coordinate(lng)));
    }

    for (key, value) in &attributes {
        sqlx::query(
            "INSERT INTO location_meta (location_id, meta_key, meta_value) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (location_id, meta_key) DO UPDATE SET \
                 meta_value = EXCLUDED.meta_value",
        )
        .bind(row.id)
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }

    for (taxonomy, slugs) in &location.terms {
        sqlx::query(
            "INSERT INTO location_terms (location_id, term_id) \
             SELECT $1, t.id FROM terms t \
             WHERE t.taxonomy = $2 AND t.slug = ANY($3) \
             ON CONFLICT DO NOTHING",
        )
        .bind(row.id)
        .bind(taxonomy)
        .bind(slugs)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(row)
}

/// Replace a location's stored coordinates (the geocode-refresh path).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a statement fails.
pub async fn update_location_coordinates(
    pool: &PgPool,
    location_id: i64,
    latitude: f64,
    longitude: f64,
) -> Result<(), DbError> {
    meta::upsert_location_meta(
        pool,
        location_id,
        meta::LOCATION_LAT,
        &format_coordinate(latitude),
    )
    .await?;
    meta::upsert_location_meta(
        pool,
        location_id,
        meta::LOCATION_LNG,
        &format_coordinate(longitude),
    )
    .await?;

    sqlx::query("UPDATE locations SET updated_at = NOW() WHERE id = $1")
        .bind(location_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Find a location by an exact attribute match, e.g. the external place
/// identifier. Returns the first match by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn find_location_id_by_meta(
    pool: &PgPool,
    meta_key: &str,
    meta_value: &str,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT location_id FROM location_meta \
         WHERE meta_key = $1 AND meta_value = $2 \
         ORDER BY location_id ASC \
         LIMIT 1",
    )
    .bind(meta_key)
    .bind(meta_value)
    .fetch_optional(pool)
    .await
}

/// Delete a location by public identifier. Attribute rows and term
/// assignments cascade. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_location(pool: &PgPool, public_id: Uuid) -> Result<bool, DbError> {
    let rows_affected = sqlx::query("DELETE FROM locations WHERE public_id = $1")
        .bind(public_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(rows_affected > 0)
}

/// Coordinates are stored as text attributes; six decimal places preserves
/// ~0.1m of precision, matching what geocoders return.
fn format_coordinate(value: f64) -> String {
    format!("{value:.6}")
}
