//! Bulk location import from a JSON file.
//!
//! Records are processed sequentially; a record that fails to insert is
//! counted and reported, never fatal to the rest of the batch. Records
//! carrying a `place_id` that already exists update the stored coordinates
//! of the existing location instead of creating a duplicate.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use mailoc_db::{locations::meta, NewLocation};

/// One location record in the import file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ImportRecord {
    pub title: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub street_2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_int: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub place_id: Option<String>,
    /// Term slugs keyed by taxonomy slug.
    #[serde(default)]
    pub terms: BTreeMap<String, Vec<String>>,
}

impl ImportRecord {
    fn into_new_location(self) -> NewLocation {
        NewLocation {
            title: self.title,
            summary: self.summary,
            phone: self.phone,
            url: self.url,
            email: self.email,
            street: self.street,
            street_2: self.street_2,
            city: self.city,
            state: self.state,
            state_int: self.state_int,
            postcode: self.postcode,
            country: self.country,
            latitude: self.lat,
            longitude: self.lng,
            place_id: self.place_id,
            terms: self.terms.into_iter().collect(),
        }
    }
}

/// Import location records from `path`.
///
/// When `dry_run` is `true`, prints what would be imported and returns
/// without touching the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if every
/// record fails. Per-record failures are logged and skipped.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    path: &Path,
    dry_run: bool,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read import file {}", path.display()))?;
    let records: Vec<ImportRecord> =
        serde_json::from_str(&content).context("import file is not a JSON array of records")?;

    if records.is_empty() {
        anyhow::bail!("import file contains no records");
    }

    if dry_run {
        println!("dry-run: would import {} record(s):", records.len());
        for record in &records {
            let place = record.city.as_deref().unwrap_or("?");
            println!("  {} \u{2014} {place}", record.title);
        }
        return Ok(());
    }

    println!("Importing {} location record(s)...", records.len());

    let mut created: usize = 0;
    let mut updated: usize = 0;
    let mut failed: usize = 0;

    for record in records {
        let title = record.title.clone();
        match import_record(pool, record).await {
            Ok(RecordOutcome::Created) => {
                created += 1;
                println!("  \u{2713} {title}");
            }
            Ok(RecordOutcome::Updated) => {
                updated += 1;
                println!("  \u{2713} {title} (updated)");
            }
            Err(e) => {
                failed += 1;
                tracing::warn!(title = %title, error = %format!("{e:#}"), "record import failed");
                println!("  \u{2717} {title}: {e:#}");
            }
        }
    }

    if created == 0 && updated == 0 {
        anyhow::bail!("all {failed} record(s) failed to import");
    }

    println!("Import complete: {created} created, {updated} updated, {failed} failed");

    Ok(())
}

enum RecordOutcome {
    Created,
    Updated,
}

async fn import_record(pool: &sqlx::PgPool, record: ImportRecord) -> anyhow::Result<RecordOutcome> {
    if let Some(place_id) = record.place_id.as_deref() {
        if let Some(existing_id) =
            mailoc_db::find_location_id_by_meta(pool, meta::PLACE_ID, place_id).await?
        {
            if let (Some(lat), Some(lng)) = (record.lat, record.lng) {
                mailoc_db::update_location_coordinates(pool, existing_id, lat, lng).await?;
            }
            return Ok(RecordOutcome::Updated);
        }
    }

    mailoc_db::insert_location(pool, &record.into_new_location()).await?;
    Ok(RecordOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_parses_with_minimal_fields() {
        let record: ImportRecord =
            serde_json::from_str(r#"{"title": "Prairie Roasters"}"#).expect("parse");
        assert_eq!(record.title, "Prairie Roasters");
        assert!(record.lat.is_none());
        assert!(record.terms.is_empty());
    }

    #[test]
    fn record_parses_full_shape() {
        let json = r#"{
            "title": "Prairie Roasters",
            "street": "123 E Douglas Ave",
            "city": "Wichita",
            "state": "KS",
            "postcode": "67202",
            "country": "US",
            "lat": 37.6872,
            "lng": -97.3301,
            "place_id": "pl_abc123",
            "terms": {"category": ["cafes"]}
        }"#;
        let record: ImportRecord = serde_json::from_str(json).expect("parse");
        assert_eq!(record.city.as_deref(), Some("Wichita"));
        assert_eq!(record.terms["category"], vec!["cafes"]);
    }

    #[test]
    fn conversion_preserves_terms_and_coordinates() {
        let json = r#"{
            "title": "Prairie Roasters",
            "lat": 37.6872,
            "lng": -97.3301,
            "terms": {"category": ["cafes", "bakeries"], "amenity": ["wifi"]}
        }"#;
        let record: ImportRecord = serde_json::from_str(json).expect("parse");
        let location = record.into_new_location();
        assert_eq!(location.latitude, Some(37.6872));
        assert_eq!(location.terms.len(), 2);
        assert!(location
            .terms
            .iter()
            .any(|(tax, slugs)| tax == "category" && slugs.len() == 2));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let result: Result<Vec<ImportRecord>, _> =
            serde_json::from_str(r#"[{"title": "A", "latitude": 1.0}]"#);
        assert!(result.is_ok());
    }
}
