//! Normalized record shape and the label-fallback resolution that builds it.
//!
//! Detail pages label the same attribute inconsistently across product
//! categories ("weight (kg)" vs "weight", "color" vs "colour"). Each target
//! attribute therefore carries an ordered chain of acceptable source labels,
//! and resolution takes the first chain entry present with a non-empty value.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::region::extract_region;

/// Raw label -> value table scraped from one detail page. Keys are
/// lower-cased and trimmed; a repeated literal label overwrites, while
/// distinct synonyms coexist until resolved.
pub type RawFieldTable = HashMap<String, String>;

pub const NO_DESCRIPTION: &str = "No description available.";

/// The three fixed-selector scrapes, each independently optional.
#[derive(Debug, Clone, Default)]
pub struct Scraped {
    pub title: String,
    pub price: Option<f64>,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// The run keyword, constant across a run.
    #[serde(rename = "type")]
    pub category: String,
    pub subtype: String,
    pub material: String,
    pub color: String,
    pub packaging_material: String,
    pub size: String,
    pub dimensions: String,
    pub weight: String,
    pub region: String,
    pub packer_name: String,
    /// None when the page had no parseable price. Zero is a valid price.
    pub price: Option<f64>,
    pub description: String,
    pub food_preference: String,
    pub no_onion_garlic: String,
    pub shelf_life_days: String,
    pub flavour_variant: String,
    pub no_of_pieces: String,
    pub skin_type: String,
    pub application_area: String,
    pub purpose: String,
    pub speciality_or_feature: String,
    pub key_ingredients: String,
}

impl ProductRecord {
    /// Dataset column order. Must stay in sync with the struct fields.
    pub const COLUMNS: [&'static str; 23] = [
        "title",
        "type",
        "subtype",
        "material",
        "color",
        "packaging_material",
        "size",
        "dimensions",
        "weight",
        "region",
        "packer_name",
        "price",
        "description",
        "food_preference",
        "no_onion_garlic",
        "shelf_life_days",
        "flavour_variant",
        "no_of_pieces",
        "skin_type",
        "application_area",
        "purpose",
        "speciality_or_feature",
        "key_ingredients",
    ];

    /// Column name -> cell text, with `None` price rendered as an empty
    /// cell so "unknown" never turns into a number.
    pub fn to_columns(&self) -> Result<HashMap<String, String>> {
        let value = serde_json::to_value(self)?;
        let object = value
            .as_object()
            .ok_or_else(|| anyhow!("record did not serialize to an object"))?;
        let mut columns = HashMap::with_capacity(object.len());
        for (name, cell) in object {
            let text = match cell {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            columns.insert(name.clone(), text);
        }
        Ok(columns)
    }
}

/// Immutable resolution configuration: one synonym chain per attribute plus
/// the known-region list. Injected rather than hardcoded at the use site so
/// tests can run with alternate chains.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub known_regions: Vec<String>,
    pub subtype: Vec<String>,
    pub material: Vec<String>,
    pub color: Vec<String>,
    pub packaging_material: Vec<String>,
    pub size: Vec<String>,
    /// Composed into "LxWxH" when all three labels are present.
    pub dimension_parts: Vec<String>,
    pub dimension_fallback: Vec<String>,
    pub weight: Vec<String>,
    pub packer_name: Vec<String>,
    /// Address fields scanned for a known locality, in priority order.
    pub address_sources: Vec<String>,
    pub origin_fallback: Vec<String>,
    pub food_preference: Vec<String>,
    pub no_onion_garlic: Vec<String>,
    pub shelf_life: Vec<String>,
    pub flavour: Vec<String>,
    pub pieces: Vec<String>,
    pub skin_type: Vec<String>,
    pub application_area: Vec<String>,
    pub purpose: Vec<String>,
    pub speciality: Vec<String>,
    pub key_ingredients: Vec<String>,
}

fn chain(labels: &[&str]) -> Vec<String> {
    labels.iter().map(|l| l.to_string()).collect()
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            known_regions: Vec::new(),
            subtype: chain(&["variant name", "variant", "type"]),
            material: chain(&["material"]),
            color: chain(&["color", "colour"]),
            packaging_material: chain(&["packaging material", "packaging type"]),
            size: chain(&["size"]),
            dimension_parts: chain(&["length", "width", "height"]),
            dimension_fallback: chain(&["dimension", "dimension (lxbxh in cm)"]),
            weight: chain(&["weight (kg)", "weight"]),
            packer_name: chain(&["packer's name & address"]),
            address_sources: chain(&[
                "packer's name & address",
                "manufacturer's name & address",
                "importer's name & address",
            ]),
            origin_fallback: chain(&["country of origin or manufacture or assembly"]),
            food_preference: chain(&["food preference"]),
            no_onion_garlic: chain(&["no onion no garlic"]),
            shelf_life: chain(&["shelf life(in days)", "shelf life"]),
            flavour: chain(&["flavour/variant (actual)", "flavour"]),
            pieces: chain(&["number of pieces", "no. of pieces"]),
            skin_type: chain(&["skin type"]),
            application_area: chain(&["application area"]),
            purpose: chain(&["purpose"]),
            speciality: chain(&["speciality", "feature", "speciality/feature", "benefits/features"]),
            key_ingredients: chain(&["key ingredients (actual)", "ingredients"]),
        }
    }
}

impl ResolverConfig {
    pub fn with_regions(known_regions: Vec<String>) -> Self {
        Self {
            known_regions,
            ..Self::default()
        }
    }

    /// Pure: the same inputs always produce the same record.
    pub fn resolve(&self, specs: &RawFieldTable, scraped: &Scraped, keyword: &str) -> ProductRecord {
        let first = |labels: &[String]| -> String {
            labels
                .iter()
                .filter_map(|label| specs.get(label.as_str()))
                .find(|value| !value.is_empty())
                .cloned()
                .unwrap_or_default()
        };

        let subtype = {
            let resolved = first(&self.subtype);
            if resolved.is_empty() {
                keyword.to_string()
            } else {
                resolved
            }
        };

        let dimensions = {
            let parts: Vec<&str> = self
                .dimension_parts
                .iter()
                .filter_map(|label| specs.get(label.as_str()))
                .map(String::as_str)
                .filter(|value| !value.is_empty())
                .collect();
            if !parts.is_empty() && parts.len() == self.dimension_parts.len() {
                parts.join("x")
            } else {
                first(&self.dimension_fallback)
            }
        };

        let region = {
            let from_address = self
                .address_sources
                .iter()
                .filter_map(|label| specs.get(label.as_str()))
                .find(|value| !value.is_empty())
                .map(|address| extract_region(address, &self.known_regions))
                .unwrap_or_default();
            if from_address.is_empty() {
                first(&self.origin_fallback)
            } else {
                from_address
            }
        };

        let description = if scraped.description.trim().is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            scraped.description.trim().to_string()
        };

        ProductRecord {
            title: scraped.title.trim().to_string(),
            category: keyword.to_string(),
            subtype,
            material: first(&self.material),
            color: first(&self.color),
            packaging_material: first(&self.packaging_material),
            size: first(&self.size),
            dimensions,
            weight: first(&self.weight),
            region,
            packer_name: first(&self.packer_name),
            price: scraped.price,
            description,
            food_preference: first(&self.food_preference),
            no_onion_garlic: first(&self.no_onion_garlic),
            shelf_life_days: first(&self.shelf_life),
            flavour_variant: first(&self.flavour),
            no_of_pieces: first(&self.pieces),
            skin_type: first(&self.skin_type),
            application_area: first(&self.application_area),
            purpose: first(&self.purpose),
            speciality_or_feature: first(&self.speciality),
            key_ingredients: first(&self.key_ingredients),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(&str, &str)]) -> RawFieldTable {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn resolver() -> ResolverConfig {
        ResolverConfig::with_regions(vec!["Surat".to_string(), "Mumbai".to_string()])
    }

    #[test]
    fn first_synonym_with_a_value_wins() {
        let specs = table(&[("weight (kg)", "0.4"), ("weight", "500")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Pickle");
        assert_eq!(record.weight, "0.4");
    }

    #[test]
    fn empty_synonym_values_fall_through() {
        let specs = table(&[("weight (kg)", ""), ("weight", "500")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Pickle");
        assert_eq!(record.weight, "500");
    }

    #[test]
    fn resolution_is_deterministic() {
        let specs = table(&[
            ("weight", "500"),
            ("color", "red"),
            ("packer's name & address", "Plot 4, Surat"),
        ]);
        let scraped = Scraped {
            title: "Mango Pickle".to_string(),
            price: Some(120.0),
            description: "Tangy.".to_string(),
        };
        let cfg = resolver();
        assert_eq!(cfg.resolve(&specs, &scraped, "Pickle"), cfg.resolve(&specs, &scraped, "Pickle"));
    }

    #[test]
    fn dimensions_compose_when_all_parts_present() {
        let specs = table(&[("length", "10"), ("width", "5"), ("height", "2")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Rakhi");
        assert_eq!(record.dimensions, "10x5x2");
    }

    #[test]
    fn dimensions_fall_back_when_a_part_is_missing() {
        let specs = table(&[("length", "10"), ("width", "5"), ("dimension", "30 cm")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Rakhi");
        assert_eq!(record.dimensions, "30 cm");
    }

    #[test]
    fn region_comes_from_address_then_origin_label() {
        let specs = table(&[("packer's name & address", "Plot 4, Surat, Gujarat")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Pickle");
        assert_eq!(record.region, "Surat");

        let specs = table(&[
            ("manufacturer's name & address", "somewhere unlisted"),
            ("country of origin or manufacture or assembly", "India"),
        ]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Pickle");
        assert_eq!(record.region, "India");
    }

    #[test]
    fn subtype_falls_back_to_keyword() {
        let record = resolver().resolve(&RawFieldTable::new(), &Scraped::default(), "Rakhi");
        assert_eq!(record.subtype, "Rakhi");
        assert_eq!(record.category, "Rakhi");

        let specs = table(&[("type", "kids rakhi")]);
        let record = resolver().resolve(&specs, &Scraped::default(), "Rakhi");
        assert_eq!(record.subtype, "kids rakhi");
    }

    #[test]
    fn missing_description_gets_the_sentinel() {
        let record = resolver().resolve(&RawFieldTable::new(), &Scraped::default(), "Pickle");
        assert_eq!(record.description, NO_DESCRIPTION);
    }

    #[test]
    fn missing_attributes_resolve_to_empty_strings() {
        let record = resolver().resolve(&RawFieldTable::new(), &Scraped::default(), "Pickle");
        assert_eq!(record.material, "");
        assert_eq!(record.weight, "");
        assert_eq!(record.region, "");
        assert_eq!(record.price, None);
    }

    #[test]
    fn columns_render_price_absence_as_empty_cell() {
        let mut record = resolver().resolve(&RawFieldTable::new(), &Scraped::default(), "Pickle");
        let columns = record.to_columns().unwrap();
        assert_eq!(columns["price"], "");
        assert_eq!(columns["type"], "Pickle");

        record.price = Some(1299.0);
        let columns = record.to_columns().unwrap();
        assert_eq!(columns["price"], "1299.0");
    }

    #[test]
    fn column_list_matches_the_serialized_shape() {
        let record = ProductRecord::default();
        let columns = record.to_columns().unwrap();
        assert_eq!(columns.len(), ProductRecord::COLUMNS.len());
        for name in ProductRecord::COLUMNS {
            assert!(columns.contains_key(name), "missing column {name}");
        }
    }
}
