//! Well-known attribute-store keys and meta accessors.

use sqlx::PgPool;

/// Stored latitude, written as a decimal-formatted string.
pub const LOCATION_LAT: &str = "location_lat";
/// Stored longitude, written as a decimal-formatted string.
pub const LOCATION_LNG: &str = "location_lng";
/// External place identifier from the upstream geocoder.
pub const PLACE_ID: &str = "place_id";
pub const ADDRESS_STREET: &str = "address_street";
pub const ADDRESS_STREET_2: &str = "address_street_2";
pub const ADDRESS_CITY: &str = "address_city";
/// US state abbreviation.
pub const ADDRESS_STATE: &str = "address_state";
/// Non-US region/province name.
pub const ADDRESS_STATE_INT: &str = "address_state_int";
pub const ADDRESS_POSTCODE: &str = "address_postcode";
pub const ADDRESS_COUNTRY: &str = "address_country";

/// Insert or replace one attribute value for a location.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn upsert_location_meta(
    pool: &PgPool,
    location_id: i64,
    meta_key: &str,
    meta_value: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO location_meta (location_id, meta_key, meta_value) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (location_id, meta_key) DO UPDATE SET \
             meta_value = EXCLUDED.meta_value",
    )
    .bind(location_id)
    .bind(meta_key)
    .bind(meta_value)
    .execute(pool)
    .await?;
    Ok(())
}

