//! Terminal proximity search.
//!
//! Feeds the same resolver and integrator the HTTP archive uses, so results
//! match what the API would return for the equivalent query string.

use mailoc_core::filters::{FilterDefaults, FilterParams};
use mailoc_core::geo::DistanceUnit;
use mailoc_core::AppConfig;
use mailoc_db::build_listing_query;

pub(crate) struct SearchArgs {
    pub lat: f64,
    pub lng: f64,
    pub distance: Option<u32>,
    pub unit: String,
    pub terms: Vec<String>,
    pub limit: i64,
}

/// Run a proximity search and print a result table.
///
/// # Errors
///
/// Returns an error if a `--terms` value is malformed, the taxonomy registry
/// cannot be loaded, or the database query fails.
pub(crate) async fn run_search(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    args: SearchArgs,
) -> anyhow::Result<()> {
    let registry = mailoc_core::load_taxonomies(&config.taxonomies_path)?;
    let defaults = FilterDefaults::build(config, &registry.taxonomies);

    let mut pairs: Vec<(String, String)> = vec![
        ("lat".to_string(), args.lat.to_string()),
        ("lng".to_string(), args.lng.to_string()),
        ("unit".to_string(), args.unit.clone()),
    ];
    if let Some(distance) = args.distance {
        pairs.push(("distance".to_string(), distance.to_string()));
    }
    for spec in &args.terms {
        let (taxonomy, slugs) = parse_term_filter(spec)?;
        pairs.push((format!("_{taxonomy}"), slugs.to_string()));
    }

    let params = FilterParams::from_pairs(&defaults, &pairs);
    let query = build_listing_query(&params, &defaults, args.limit.clamp(1, 200), 0);

    let rows = mailoc_db::list_locations(pool, &query).await?;

    if rows.is_empty() {
        println!("no locations found; widen the radius or run `import` first");
        return Ok(());
    }

    let unit = DistanceUnit::parse_lenient(&args.unit);
    let header = format!("{:<32}{:<20}{:<8}DISTANCE", "TITLE", "CITY", "REGION");
    println!("{header}");
    for row in &rows {
        let city = row.city.as_deref().unwrap_or("\u{2014}");
        let region = row.region.as_deref().unwrap_or("\u{2014}");
        let distance = row
            .distance_rounded(1)
            .map_or_else(|| "\u{2014}".to_string(), |d| format!("{d} {unit}"));
        let title_display = if row.title.chars().count() > 30 {
            format!("{}...", row.title.chars().take(30).collect::<String>())
        } else {
            row.title.clone()
        };
        println!("{title_display:<32}{city:<20}{region:<8}{distance}");
    }

    Ok(())
}

/// Split a `taxonomy=slug,slug` filter argument.
fn parse_term_filter(spec: &str) -> anyhow::Result<(&str, &str)> {
    let (taxonomy, slugs) = spec
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("invalid --terms value '{spec}'; expected taxonomy=slug,slug"))?;
    if taxonomy.is_empty() || slugs.is_empty() {
        anyhow::bail!("invalid --terms value '{spec}'; expected taxonomy=slug,slug");
    }
    Ok((taxonomy, slugs))
}
