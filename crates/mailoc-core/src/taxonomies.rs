use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A taxonomy registered against the location content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomyConfig {
    pub slug: String,
    pub label: String,
    /// Terms to seed for this taxonomy. Optional; imports may create more.
    #[serde(default)]
    pub terms: Vec<TermConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermConfig {
    pub slug: String,
    pub name: String,
}

impl TaxonomyConfig {
    /// Request-parameter key for this taxonomy's term filter.
    ///
    /// Underscore-prefixed so taxonomy keys can never collide with the scalar
    /// filter keys (`address`, `lat`, ...).
    #[must_use]
    pub fn param_key(&self) -> String {
        format!("_{}", self.slug)
    }
}

#[derive(Debug, Deserialize)]
pub struct TaxonomiesFile {
    pub taxonomies: Vec<TaxonomyConfig>,
}

/// Load and validate the taxonomy registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_taxonomies(path: &Path) -> Result<TaxonomiesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::TaxonomiesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: TaxonomiesFile = serde_yaml::from_str(&content)?;

    validate_taxonomies(&file)?;

    Ok(file)
}

fn validate_taxonomies(file: &TaxonomiesFile) -> Result<(), ConfigError> {
    let mut seen_slugs = HashSet::new();

    for taxonomy in &file.taxonomies {
        if taxonomy.slug.is_empty() {
            return Err(ConfigError::Validation(
                "taxonomy slug must be non-empty".to_string(),
            ));
        }

        if !taxonomy
            .slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        {
            return Err(ConfigError::Validation(format!(
                "taxonomy slug '{}' may only contain lowercase letters, digits, '_' and '-'",
                taxonomy.slug
            )));
        }

        if !seen_slugs.insert(taxonomy.slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate taxonomy slug: '{}'",
                taxonomy.slug
            )));
        }

        let mut seen_terms = HashSet::new();
        for term in &taxonomy.terms {
            if term.slug.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "taxonomy '{}' has a term with an empty slug",
                    taxonomy.slug
                )));
            }
            if !seen_terms.insert(term.slug.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate term slug '{}' in taxonomy '{}'",
                    term.slug, taxonomy.slug
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy(slug: &str) -> TaxonomyConfig {
        TaxonomyConfig {
            slug: slug.to_string(),
            label: slug.to_string(),
            terms: Vec::new(),
        }
    }

    #[test]
    fn param_key_is_underscore_prefixed() {
        assert_eq!(taxonomy("category").param_key(), "_category");
    }

    #[test]
    fn validate_accepts_well_formed_registry() {
        let file = TaxonomiesFile {
            taxonomies: vec![taxonomy("category"), taxonomy("amenity")],
        };
        assert!(validate_taxonomies(&file).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_slugs() {
        let file = TaxonomiesFile {
            taxonomies: vec![taxonomy("category"), taxonomy("category")],
        };
        assert!(matches!(
            validate_taxonomies(&file),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_bad_slug_characters() {
        let file = TaxonomiesFile {
            taxonomies: vec![taxonomy("Category Name")],
        };
        assert!(matches!(
            validate_taxonomies(&file),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_duplicate_term_slugs() {
        let mut tax = taxonomy("category");
        tax.terms = vec![
            TermConfig {
                slug: "cafes".to_string(),
                name: "Cafes".to_string(),
            },
            TermConfig {
                slug: "cafes".to_string(),
                name: "Coffee Shops".to_string(),
            },
        ];
        let file = TaxonomiesFile {
            taxonomies: vec![tax],
        };
        assert!(matches!(
            validate_taxonomies(&file),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn registry_parses_from_yaml() {
        let yaml = "taxonomies:\n  - slug: category\n    label: Categories\n    terms:\n      - slug: cafes\n        name: Cafes\n";
        let file: TaxonomiesFile = serde_yaml::from_str(yaml).expect("parse yaml");
        assert_eq!(file.taxonomies.len(), 1);
        assert_eq!(file.taxonomies[0].terms[0].slug, "cafes");
    }
}
