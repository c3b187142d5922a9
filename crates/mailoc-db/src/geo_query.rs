//! Great-circle distance SQL over the `location_meta` attribute store.
//!
//! A [`GeoQuery`] contributes four composable fragments to a listing query,
//! applied in a fixed order: computed distance column (fields), the two
//! attribute-store joins (join), the attribute-name and threshold predicates
//! (filter), and the distance sort (order). Every request-derived literal is
//! bound, never spliced into SQL text; only the per-unit Earth radius — a
//! compile-known constant — appears inline.

use sqlx::{Postgres, QueryBuilder};

use mailoc_core::geo::DistanceUnit;

use crate::locations::meta;

/// Alias of the computed distance column on geo-filtered result rows.
pub const DISTANCE_COLUMN: &str = "geo_query_distance";

/// Join aliases for the latitude and longitude attribute rows.
const LAT_ALIAS: &str = "geo_lat";
const LNG_ALIAS: &str = "geo_lng";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Request-scoped distance filter/sort parameters. Constructed per query,
/// discarded after execution; never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQuery {
    /// Attribute-store key holding each record's latitude.
    pub lat_field: String,
    /// Attribute-store key holding each record's longitude.
    pub lng_field: String,
    /// Reference point latitude, degrees.
    pub latitude: f64,
    /// Reference point longitude, degrees.
    pub longitude: f64,
    /// Radius threshold in `unit`; `0` disables the threshold while keeping
    /// the computed column.
    pub distance: u32,
    pub unit: DistanceUnit,
}

impl GeoQuery {
    /// A spec over the stored coordinate attribute keys.
    #[must_use]
    pub fn for_stored_coordinates(
        latitude: f64,
        longitude: f64,
        distance: u32,
        unit: DistanceUnit,
    ) -> Self {
        Self {
            lat_field: meta::LOCATION_LAT.to_string(),
            lng_field: meta::LOCATION_LNG.to_string(),
            latitude,
            longitude,
            distance,
            unit,
        }
    }

    /// Fields stage: appends `, <expr> AS geo_query_distance` to the SELECT
    /// list.
    pub fn push_distance_field(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(", ");
        self.push_distance_expr(qb);
        qb.push(format_args!(" AS {DISTANCE_COLUMN}"));
    }

    /// Join stage: the two attribute-store joins the distance expression
    /// reads from. Must run before the filter stage.
    pub fn push_joins(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(format_args!(
            " INNER JOIN location_meta {LAT_ALIAS} ON {LAT_ALIAS}.location_id = l.id"
        ));
        qb.push(format_args!(
            " INNER JOIN location_meta {LNG_ALIAS} ON {LNG_ALIAS}.location_id = l.id"
        ));
    }

    /// Filter stage: pins the joined rows to the configured attribute keys
    /// and, for a nonzero threshold, constrains the distance. Appended to an
    /// open WHERE clause.
    pub fn push_filter(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(format_args!(" AND {LAT_ALIAS}.meta_key = "));
        qb.push_bind(self.lat_field.clone());
        qb.push(format_args!(" AND {LNG_ALIAS}.meta_key = "));
        qb.push_bind(self.lng_field.clone());

        if self.distance > 0 {
            // The SELECT alias is not visible in WHERE, so the expression is
            // restated here.
            qb.push(" AND ");
            self.push_distance_expr(qb);
            qb.push(" <= ");
            qb.push_bind(f64::from(self.distance));
        }
    }

    /// Order stage: replaces the order clause with the distance sort.
    pub fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>, direction: SortDirection) {
        qb.push(format_args!(
            " ORDER BY {DISTANCE_COLUMN} {}",
            direction.as_sql()
        ));
    }

    /// Spherical-law-of-cosines distance from the bound reference point to
    /// the joined coordinate attributes, in `unit`.
    fn push_distance_expr(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        // acos errors outside [-1, 1]; float rounding can push identical
        // points fractionally past 1, so the operand is clamped.
        qb.push(format_args!(
            "{} * acos(LEAST(1.0, GREATEST(-1.0, cos(radians(",
            radius_sql(self.unit)
        ));
        qb.push_bind(self.latitude);
        qb.push(format_args!(
            ")) * cos(radians({LAT_ALIAS}.meta_value::float8)) * cos(radians({LNG_ALIAS}.meta_value::float8) - radians("
        ));
        qb.push_bind(self.longitude);
        qb.push(")) + sin(radians(");
        qb.push_bind(self.latitude);
        qb.push(format_args!(
            ")) * sin(radians({LAT_ALIAS}.meta_value::float8)))))"
        ));
    }
}

/// Earth radius constant for the given unit, as SQL text.
fn radius_sql(unit: DistanceUnit) -> &'static str {
    match unit {
        DistanceUnit::Miles => "3959",
        DistanceUnit::Kilometers => "6371",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(distance: u32, unit: DistanceUnit) -> GeoQuery {
        GeoQuery::for_stored_coordinates(38.5, -98.0, distance, unit)
    }

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut QueryBuilder<'_, Postgres>),
    {
        let mut qb = QueryBuilder::new("");
        f(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn fields_stage_emits_aliased_distance_column() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_distance_field(qb));
        assert!(sql.contains("AS geo_query_distance"), "sql: {sql}");
        assert!(sql.contains("acos"), "sql: {sql}");
    }

    #[test]
    fn miles_radius_is_3959() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_distance_field(qb));
        assert!(sql.contains("3959"), "sql: {sql}");
        assert!(!sql.contains("6371"), "sql: {sql}");
    }

    #[test]
    fn kilometers_radius_is_6371() {
        let sql = render(|qb| spec(50, DistanceUnit::Kilometers).push_distance_field(qb));
        assert!(sql.contains("6371"), "sql: {sql}");
        assert!(!sql.contains("3959"), "sql: {sql}");
    }

    #[test]
    fn join_stage_joins_attribute_store_twice() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_joins(qb));
        assert_eq!(sql.matches("INNER JOIN location_meta").count(), 2);
        assert!(sql.contains("geo_lat.location_id = l.id"), "sql: {sql}");
        assert!(sql.contains("geo_lng.location_id = l.id"), "sql: {sql}");
    }

    #[test]
    fn filter_stage_binds_attribute_keys() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_filter(qb));
        assert!(sql.contains("geo_lat.meta_key = $1"), "sql: {sql}");
        assert!(sql.contains("geo_lng.meta_key = $2"), "sql: {sql}");
    }

    #[test]
    fn nonzero_distance_appends_threshold() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_filter(qb));
        assert!(sql.contains("<="), "sql: {sql}");
    }

    #[test]
    fn zero_distance_omits_threshold_but_keeps_column() {
        let filter_sql = render(|qb| spec(0, DistanceUnit::Miles).push_filter(qb));
        assert!(!filter_sql.contains("<="), "sql: {filter_sql}");

        let fields_sql = render(|qb| spec(0, DistanceUnit::Miles).push_distance_field(qb));
        assert!(
            fields_sql.contains("AS geo_query_distance"),
            "sql: {fields_sql}"
        );
    }

    #[test]
    fn coordinates_are_bound_not_inlined() {
        let sql = render(|qb| spec(50, DistanceUnit::Miles).push_distance_field(qb));
        assert!(!sql.contains("38.5"), "latitude leaked into SQL: {sql}");
        assert!(!sql.contains("-98"), "longitude leaked into SQL: {sql}");
        assert!(sql.contains("$1"), "sql: {sql}");
    }

    #[test]
    fn order_stage_uses_requested_direction() {
        let asc = render(|qb| spec(50, DistanceUnit::Miles).push_order(qb, SortDirection::Asc));
        assert_eq!(asc, " ORDER BY geo_query_distance ASC");

        let desc = render(|qb| spec(50, DistanceUnit::Miles).push_order(qb, SortDirection::Desc));
        assert_eq!(desc, " ORDER BY geo_query_distance DESC");
    }

    #[test]
    fn stored_coordinate_spec_uses_meta_keys() {
        let s = spec(50, DistanceUnit::Miles);
        assert_eq!(s.lat_field, "location_lat");
        assert_eq!(s.lng_field, "location_lng");
    }
}
