use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use mailoc_core::filters::{FilterDefaults, FilterParams};
use mailoc_db::{build_listing_query, locations::meta};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct LocationListingItem {
    pub public_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postcode: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Distance from the requested point, rounded to two decimals. Present
    /// only on geo-filtered requests.
    pub distance: Option<f64>,
}

/// The archive listing. Recognized filter parameters are resolved against
/// the configured key set; anything else in the query string is ignored.
pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ApiResponse<Vec<LocationListingItem>>>, ApiError> {
    let defaults = FilterDefaults::build(&state.config, &state.taxonomies);
    let params = FilterParams::from_pairs(&defaults, &pairs);

    let limit = normalize_limit(scalar_i64(&pairs, "limit"), state.config.default_limit);
    let offset = scalar_i64(&pairs, "offset").unwrap_or(0).max(0);

    let query = build_listing_query(&params, &defaults, limit, offset);

    let rows = mailoc_db::list_locations(&state.pool, &query)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?;

    let data = rows
        .into_iter()
        .map(|row| LocationListingItem {
            distance: row.distance_rounded(2),
            public_id: row.public_id,
            title: row.title,
            summary: row.summary,
            phone: row.phone,
            url: row.url,
            email: row.email,
            street: row.street,
            city: row.city,
            region: row.region,
            postcode: row.postcode,
            latitude: row.latitude,
            longitude: row.longitude,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Pagination values ride alongside the filter parameters; pull one out of
/// the raw pairs without widening the recognized filter key set.
fn scalar_i64(pairs: &[(String, String)], key: &str) -> Option<i64> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .and_then(|(_, v)| v.trim().parse::<i64>().ok())
}

#[derive(Debug, Serialize)]
pub(super) struct AddressItem {
    pub street: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub state_int: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationTermItem {
    pub taxonomy: String,
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationDetailItem {
    pub public_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub status: String,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub address: AddressItem,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
    pub terms: Vec<LocationTermItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<LocationDetailItem>>, ApiError> {
    let row = mailoc_db::get_location_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "location not found"))?;

    let meta_rows = mailoc_db::list_location_meta(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?;
    let term_rows = mailoc_db::list_location_terms(&state.pool, row.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?;

    let mut attributes: HashMap<String, String> = meta_rows
        .into_iter()
        .map(|m| (m.meta_key, m.meta_value))
        .collect();

    let parse_coord = |value: Option<String>| value.and_then(|s| s.parse::<f64>().ok());

    let detail = LocationDetailItem {
        public_id: row.public_id,
        title: row.title,
        summary: row.summary,
        status: row.status,
        phone: row.phone,
        url: row.url,
        email: row.email,
        address: AddressItem {
            street: attributes.remove(meta::ADDRESS_STREET),
            street_2: attributes.remove(meta::ADDRESS_STREET_2),
            city: attributes.remove(meta::ADDRESS_CITY),
            state: attributes.remove(meta::ADDRESS_STATE),
            state_int: attributes.remove(meta::ADDRESS_STATE_INT),
            postcode: attributes.remove(meta::ADDRESS_POSTCODE),
            country: attributes.remove(meta::ADDRESS_COUNTRY),
        },
        latitude: parse_coord(attributes.remove(meta::LOCATION_LAT)),
        longitude: parse_coord(attributes.remove(meta::LOCATION_LNG)),
        place_id: attributes.remove(meta::PLACE_ID),
        terms: term_rows
            .into_iter()
            .map(|t| LocationTermItem {
                taxonomy: t.taxonomy,
                slug: t.slug,
                name: t.name,
            })
            .collect(),
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    Ok(Json(ApiResponse {
        data: detail,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct LocationPinItem {
    pub public_id: Uuid,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
}

pub(super) async fn list_location_pins(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<LocationPinItem>>>, ApiError> {
    let rows = mailoc_db::list_location_pins(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &mailoc_db::DbError::from(e)))?;

    let data = rows
        .into_iter()
        .map(|row| LocationPinItem {
            public_id: row.public_id,
            title: row.title,
            latitude: row.latitude,
            longitude: row.longitude,
            city: row.city,
            region: row.region,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
