//! Row types for the `locations` tables.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Input record for creating a location.
#[derive(Debug, Clone, Default)]
pub struct NewLocation {
    pub title: String,
    pub summary: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub street: Option<String>,
    pub street_2: Option<String>,
    pub city: Option<String>,
    /// US state abbreviation.
    pub state: Option<String>,
    /// Non-US region/province name.
    pub state_int: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub place_id: Option<String>,
    /// Term slugs to assign, keyed by taxonomy slug. Unknown slugs are
    /// skipped by the writer.
    pub terms: Vec<(String, Vec<String>)>,
}

/// A row from the `locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub status: String,
    pub phone: Option<String>,
    pub url: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An archive listing row: core columns plus the display attributes the
/// archive cards need, and the computed distance on geo-filtered queries.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationListingRow {
    pub id: i64,
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
    /// Present only on rows returned by a geo-filtered query.
    #[sqlx(rename = "geo_query_distance")]
    pub distance: Option<f64>,
}

impl LocationListingRow {
    /// The computed distance rounded to `decimals` places, or `None` for a
    /// row that was never part of a geo-filtered query.
    #[must_use]
    pub fn distance_rounded(&self, decimals: u32) -> Option<f64> {
        let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
        self.distance.map(|d| (d * factor).round() / factor)
    }
}

/// A pin row for the map: published locations with both coordinates set.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationPinRow {
    pub id: i64,
    pub public_id: Uuid,
    pub title: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: Option<String>,
    pub region: Option<String>,
}

/// One attribute-store row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetaRow {
    pub meta_key: String,
    pub meta_value: String,
}
