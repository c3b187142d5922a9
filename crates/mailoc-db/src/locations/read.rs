//! Read operations for the `locations` tables.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::meta;
use super::types::{LocationListingRow, LocationPinRow, LocationRow, MetaRow};
use crate::geo_query::DISTANCE_COLUMN;
use crate::query::{ListingQuery, OrderBy};
use crate::terms::TermRow;

/// Append a scalar subquery reading one attribute value off the current
/// `locations` row. `key` must be a compile-known attribute name, never
/// request input.
fn push_meta_select(qb: &mut QueryBuilder<'_, Postgres>, key: &str) {
    qb.push(format_args!(
        "(SELECT m.meta_value FROM location_meta m \
         WHERE m.location_id = l.id AND m.meta_key = '{key}')"
    ));
}

/// Execute an archive listing query.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_locations(
    pool: &PgPool,
    query: &ListingQuery,
) -> Result<Vec<LocationListingRow>, sqlx::Error> {
    let mut qb = listing_query_builder(query);
    qb.build_query_as::<LocationListingRow>()
        .fetch_all(pool)
        .await
}

/// Compose the listing SQL in the fixed stage order fields, join, filter,
/// order: the geo spec (when attached) contributes its computed distance
/// column, its two attribute-store joins, its key/threshold predicates, and
/// its sort; taxonomy clauses contribute one membership subquery each.
/// Without a geo spec the distance column is NULL and the title sort applies.
fn listing_query_builder(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<'static, Postgres> =
        QueryBuilder::new("SELECT l.id, l.public_id, l.title, l.summary, l.phone, l.url, l.email, ");

    push_meta_select(&mut qb, meta::ADDRESS_STREET);
    qb.push(" AS street, ");
    push_meta_select(&mut qb, meta::ADDRESS_CITY);
    qb.push(" AS city, COALESCE(");
    push_meta_select(&mut qb, meta::ADDRESS_STATE);
    qb.push(", ");
    push_meta_select(&mut qb, meta::ADDRESS_STATE_INT);
    qb.push(") AS region, ");
    push_meta_select(&mut qb, meta::ADDRESS_POSTCODE);
    qb.push(" AS postcode, NULLIF(");
    push_meta_select(&mut qb, meta::LOCATION_LAT);
    qb.push(", '')::float8 AS latitude, NULLIF(");
    push_meta_select(&mut qb, meta::LOCATION_LNG);
    qb.push(", '')::float8 AS longitude");

    // Fields stage.
    if let Some(geo) = &query.geo {
        geo.push_distance_field(&mut qb);
    } else {
        qb.push(format_args!(", NULL::float8 AS {DISTANCE_COLUMN}"));
    }

    qb.push(" FROM locations l");

    // Join stage.
    if let Some(geo) = &query.geo {
        geo.push_joins(&mut qb);
    }

    qb.push(" WHERE l.status = 'publish'");

    // Filter stage.
    if let Some(geo) = &query.geo {
        geo.push_filter(&mut qb);
    }
    if let Some(tax) = &query.tax {
        tax.push_sql(&mut qb);
    }

    // Order stage. The distance sort is only available with a geo spec
    // attached; anything else falls back to the title default.
    match (query.order, &query.geo) {
        (OrderBy::Distance(direction), Some(geo)) => geo.push_order(&mut qb, direction),
        _ => {
            qb.push(" ORDER BY l.title ASC");
        }
    }

    qb.push(" LIMIT ");
    qb.push_bind(query.limit);
    qb.push(" OFFSET ");
    qb.push_bind(query.offset);

    qb
}

/// Fetch one published-or-draft location by its public identifier.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn get_location_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<LocationRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationRow>(
        "SELECT id, public_id, title, summary, status, phone, url, email, \
                created_at, updated_at \
         FROM locations \
         WHERE public_id = $1",
    )
    .bind(public_id)
    .fetch_optional(pool)
    .await
}

/// All attribute rows for a location, ordered by key.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_location_meta(
    pool: &PgPool,
    location_id: i64,
) -> Result<Vec<MetaRow>, sqlx::Error> {
    sqlx::query_as::<_, MetaRow>(
        "SELECT meta_key, meta_value FROM location_meta \
         WHERE location_id = $1 \
         ORDER BY meta_key ASC",
    )
    .bind(location_id)
    .fetch_all(pool)
    .await
}

/// All terms assigned to a location, ordered by taxonomy then name.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_location_terms(
    pool: &PgPool,
    location_id: i64,
) -> Result<Vec<TermRow>, sqlx::Error> {
    sqlx::query_as::<_, TermRow>(
        "SELECT t.id, t.taxonomy, t.slug, t.name \
         FROM terms t \
         JOIN location_terms lt ON lt.term_id = t.id \
         WHERE lt.location_id = $1 \
         ORDER BY t.taxonomy ASC, t.name ASC",
    )
    .bind(location_id)
    .fetch_all(pool)
    .await
}

/// All published locations with both coordinates set, for map rendering.
/// Ordered by title.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_location_pins(pool: &PgPool) -> Result<Vec<LocationPinRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationPinRow>(
        "SELECT l.id, l.public_id, l.title, \
                lat.meta_value::float8 AS latitude, \
                lng.meta_value::float8 AS longitude, \
                (SELECT m.meta_value FROM location_meta m \
                 WHERE m.location_id = l.id AND m.meta_key = 'address_city') AS city, \
                COALESCE(\
                    (SELECT m.meta_value FROM location_meta m \
                     WHERE m.location_id = l.id AND m.meta_key = 'address_state'), \
                    (SELECT m.meta_value FROM location_meta m \
                     WHERE m.location_id = l.id AND m.meta_key = 'address_state_int')\
                ) AS region \
         FROM locations l \
         INNER JOIN location_meta lat \
             ON lat.location_id = l.id AND lat.meta_key = 'location_lat' \
         INNER JOIN location_meta lng \
             ON lng.location_id = l.id AND lng.meta_key = 'location_lng' \
         WHERE l.status = 'publish' \
           AND lat.meta_value != '' \
           AND lng.meta_value != '' \
         ORDER BY l.title ASC",
    )
    .fetch_all(pool)
    .await
}
