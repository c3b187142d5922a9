//! Listing-query construction for the location archive.
//!
//! One request resolves to exactly one of two states: `default` (no
//! recognized filter present, alphabetical order) or `filtered` (geo and/or
//! taxonomy constraints attached). Geo and taxonomy constraints are
//! independent; when both apply, taxonomy clauses narrow the result set but
//! the distance sort keeps the order.

use sqlx::{Postgres, QueryBuilder};

use mailoc_core::filters::{FilterDefaults, FilterParams};

use crate::geo_query::{GeoQuery, SortDirection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// Deterministic lexical default for unfiltered views.
    TitleAsc,
    /// Distance sort; only meaningful with a geo spec attached.
    Distance(SortDirection),
}

/// How multiple clauses of a taxonomy query combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxRelation {
    And,
}

/// Constraint on one taxonomy: the record must carry every listed term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxClause {
    pub taxonomy: String,
    pub terms: Vec<String>,
}

impl TaxClause {
    #[must_use]
    pub fn new(taxonomy: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            terms,
        }
    }

    /// Membership subquery: the record carries all of the clause's terms.
    /// Appended to an open WHERE clause.
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(
            " AND l.id IN (SELECT lt.location_id FROM location_terms lt \
             JOIN terms t ON t.id = lt.term_id WHERE t.taxonomy = ",
        );
        qb.push_bind(self.taxonomy.clone());
        qb.push(" AND t.slug IN (");
        let mut separated = qb.separated(", ");
        for term in &self.terms {
            separated.push_bind(term.clone());
        }
        qb.push(") GROUP BY lt.location_id HAVING COUNT(DISTINCT t.slug) = ");
        qb.push_bind(i64::try_from(self.terms.len()).unwrap_or(i64::MAX));
        qb.push(")");
    }
}

/// Taxonomy constraint list for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxQuery {
    clauses: Vec<TaxClause>,
}

impl TaxQuery {
    #[must_use]
    pub fn clauses(&self) -> &[TaxClause] {
        &self.clauses
    }

    /// Append a clause, keeping any already present.
    pub fn push_clause(&mut self, clause: TaxClause) {
        self.clauses.push(clause);
    }

    /// The top-level relation: `And` only when more than one clause is
    /// present. A single clause never carries a relation operator.
    #[must_use]
    pub fn relation(&self) -> Option<TaxRelation> {
        (self.clauses.len() > 1).then_some(TaxRelation::And)
    }

    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        for clause in &self.clauses {
            clause.push_sql(qb);
        }
    }
}

/// Everything needed to execute one archive listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub order: OrderBy,
    pub geo: Option<GeoQuery>,
    pub tax: Option<TaxQuery>,
    pub limit: i64,
    pub offset: i64,
}

impl ListingQuery {
    #[must_use]
    pub fn unfiltered(limit: i64, offset: i64) -> Self {
        Self {
            order: OrderBy::TitleAsc,
            geo: None,
            tax: None,
            limit,
            offset,
        }
    }

    /// Merge taxonomy clauses into the existing constraint list without
    /// overwriting clauses already attached.
    pub fn merge_tax_clauses(&mut self, clauses: impl IntoIterator<Item = TaxClause>) {
        let tax = self.tax.get_or_insert_with(TaxQuery::default);
        for clause in clauses {
            tax.push_clause(clause);
        }
    }
}

/// Decide the query for one request: the two-state classification.
///
/// Unfiltered requests get the stable title sort. Filtered requests attach a
/// geo spec when both coordinates are present (distance sort, ascending) and
/// one taxonomy clause per selected taxonomy; both may apply at once, and
/// the geo sort wins whenever it is set.
#[must_use]
pub fn build_listing_query(
    params: &FilterParams,
    defaults: &FilterDefaults,
    limit: i64,
    offset: i64,
) -> ListingQuery {
    let mut query = ListingQuery::unfiltered(limit, offset);

    if !params.is_filtered() {
        return query;
    }

    if params.has_coordinates() {
        let distance = params.distance().unwrap_or_else(|| defaults.default_distance());
        let unit = params.unit().unwrap_or_else(|| defaults.default_unit());
        query.geo = Some(GeoQuery::for_stored_coordinates(
            params.latitude(),
            params.longitude(),
            distance,
            unit,
        ));
        query.order = OrderBy::Distance(SortDirection::Asc);
    }

    let term_filters = params.term_filters();
    if !term_filters.is_empty() {
        query.merge_tax_clauses(
            term_filters
                .into_iter()
                .map(|(taxonomy, terms)| TaxClause::new(taxonomy, terms)),
        );
    }

    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    use mailoc_core::app_config::{AppConfig, Environment};
    use mailoc_core::geo::DistanceUnit;
    use mailoc_core::taxonomies::TaxonomyConfig;

    fn test_defaults() -> FilterDefaults {
        let config = AppConfig {
            database_url: "postgres://example".to_string(),
            env: Environment::Test,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
            log_level: "info".to_string(),
            taxonomies_path: PathBuf::from("./config/taxonomies.yaml"),
            db_max_connections: 10,
            db_min_connections: 1,
            db_acquire_timeout_secs: 10,
            distance_options: vec![25, 50, 100, 200],
            unit_options: vec![DistanceUnit::Miles, DistanceUnit::Kilometers],
            default_limit: 50,
        };
        let taxonomies = vec![
            TaxonomyConfig {
                slug: "category".to_string(),
                label: "Categories".to_string(),
                terms: Vec::new(),
            },
            TaxonomyConfig {
                slug: "amenity".to_string(),
                label: "Amenities".to_string(),
                terms: Vec::new(),
            },
        ];
        FilterDefaults::build(&config, &taxonomies)
    }

    fn params(defaults: &FilterDefaults, raw: &[(&str, &str)]) -> FilterParams {
        let pairs: Vec<(String, String)> = raw
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        FilterParams::from_pairs(defaults, &pairs)
    }

    #[test]
    fn unfiltered_request_orders_by_title() {
        let defaults = test_defaults();
        let query = build_listing_query(&params(&defaults, &[]), &defaults, 50, 0);
        assert_eq!(query.order, OrderBy::TitleAsc);
        assert!(query.geo.is_none());
        assert!(query.tax.is_none());
    }

    #[test]
    fn unrecognized_parameters_leave_the_default_state() {
        let defaults = test_defaults();
        let query =
            build_listing_query(&params(&defaults, &[("foo", "bar")]), &defaults, 50, 0);
        assert_eq!(query.order, OrderBy::TitleAsc);
        assert!(query.geo.is_none());
    }

    #[test]
    fn geo_request_attaches_spec_and_distance_sort() {
        let defaults = test_defaults();
        let query = build_listing_query(
            &params(
                &defaults,
                &[
                    ("lat", "38.5"),
                    ("lng", "-98.0"),
                    ("distance", "50"),
                    ("unit", "mi"),
                ],
            ),
            &defaults,
            50,
            0,
        );

        let geo = query.geo.expect("geo spec attached");
        assert_eq!(geo.lat_field, "location_lat");
        assert_eq!(geo.lng_field, "location_lng");
        assert!((geo.latitude - 38.5).abs() < f64::EPSILON);
        assert!((geo.longitude + 98.0).abs() < f64::EPSILON);
        assert_eq!(geo.distance, 50);
        assert_eq!(geo.unit, DistanceUnit::Miles);
        assert_eq!(query.order, OrderBy::Distance(SortDirection::Asc));
    }

    #[test]
    fn geo_request_without_distance_uses_configured_default() {
        let defaults = test_defaults();
        let query = build_listing_query(
            &params(&defaults, &[("lat", "38.5"), ("lng", "-98.0")]),
            &defaults,
            50,
            0,
        );
        let geo = query.geo.expect("geo spec attached");
        assert_eq!(geo.distance, 25);
        assert_eq!(geo.unit, DistanceUnit::Miles);
    }

    #[test]
    fn single_coordinate_does_not_attach_geo() {
        let defaults = test_defaults();
        let query =
            build_listing_query(&params(&defaults, &[("lat", "38.5")]), &defaults, 50, 0);
        assert!(query.geo.is_none());
        // Still a filtered view; order falls back to the title default.
        assert_eq!(query.order, OrderBy::TitleAsc);
    }

    #[test]
    fn two_terms_one_taxonomy_is_a_single_relationless_clause() {
        let defaults = test_defaults();
        let query = build_listing_query(
            &params(&defaults, &[("_category", "cafes,bakeries")]),
            &defaults,
            50,
            0,
        );
        let tax = query.tax.expect("tax query attached");
        assert_eq!(tax.clauses().len(), 1);
        assert_eq!(tax.clauses()[0].taxonomy, "category");
        assert_eq!(tax.clauses()[0].terms, vec!["cafes", "bakeries"]);
        assert_eq!(tax.relation(), None);
    }

    #[test]
    fn two_taxonomies_get_a_top_level_and_relation() {
        let defaults = test_defaults();
        let query = build_listing_query(
            &params(&defaults, &[("_category", "cafes"), ("_amenity", "wifi")]),
            &defaults,
            50,
            0,
        );
        let tax = query.tax.expect("tax query attached");
        assert_eq!(tax.clauses().len(), 2);
        assert_eq!(tax.relation(), Some(TaxRelation::And));
    }

    #[test]
    fn geo_and_taxonomy_attach_independently_and_geo_sort_wins() {
        let defaults = test_defaults();
        let query = build_listing_query(
            &params(
                &defaults,
                &[("lat", "38.5"), ("lng", "-98.0"), ("_category", "cafes")],
            ),
            &defaults,
            50,
            0,
        );
        assert!(query.geo.is_some());
        assert!(query.tax.is_some());
        assert_eq!(query.order, OrderBy::Distance(SortDirection::Asc));
    }

    #[test]
    fn merge_keeps_existing_clauses() {
        let mut query = ListingQuery::unfiltered(50, 0);
        query.merge_tax_clauses([TaxClause::new("category", vec!["cafes".to_string()])]);
        query.merge_tax_clauses([TaxClause::new("amenity", vec!["wifi".to_string()])]);

        let tax = query.tax.expect("tax query attached");
        assert_eq!(tax.clauses().len(), 2);
        assert_eq!(tax.clauses()[0].taxonomy, "category");
        assert_eq!(tax.clauses()[1].taxonomy, "amenity");
    }

    #[test]
    fn tax_clause_sql_binds_taxonomy_terms_and_count() {
        let clause = TaxClause::new(
            "category",
            vec!["cafes".to_string(), "bakeries".to_string()],
        );
        let mut qb = QueryBuilder::new("");
        clause.push_sql(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("t.taxonomy = $1"), "sql: {sql}");
        assert!(sql.contains("t.slug IN ($2, $3)"), "sql: {sql}");
        assert!(
            sql.contains("HAVING COUNT(DISTINCT t.slug) = $4"),
            "sql: {sql}"
        );
        assert!(!sql.contains("cafes"), "term leaked into SQL: {sql}");
    }
}
