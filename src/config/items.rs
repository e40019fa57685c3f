//! Static item data: templates per category and per-category stat tables.
//!
//! Loaded once at startup from `data/items.toml` and `data/attributes.toml`.
//! The data is validated on load so the generator can rely on every category
//! having at least one template and a stat table.

use crate::api::Stat;
use crate::core::catalogue::{Category, RARITY_OFFSET};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Inclusive range of local rarity ids a template may roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RarityRange {
    pub min: i64,
    pub max: i64,
}

/// Static definition of an item the store can stock.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemTemplate {
    pub name: String,
    pub description: String,
    /// Remote type id, resolved at generation time.
    #[serde(rename = "type")]
    pub type_id: i64,
    pub rarity: RarityRange,
    /// Fixed stats copied onto every generated instance.
    #[serde(default)]
    pub stats: Vec<Stat>,
}

/// A stat whose value scales with rarity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatBase {
    pub name: String,
    pub value: f64,
}

/// Pricing and scaling rules shared by every item in a category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryStats {
    /// Base price, multiplied by the absolute rarity.
    pub price: i64,
    /// Smallest stack the store sells.
    pub stack_amount: u32,
    pub rarity_modifier: f64,
    #[serde(default)]
    pub stats: Vec<StatBase>,
}

/// All static item data, keyed by category.
#[derive(Debug, Clone)]
pub struct ItemData {
    templates: HashMap<Category, Vec<ItemTemplate>>,
    stats: HashMap<Category, CategoryStats>,
}

impl ItemData {
    /// Builds item data from the two TOML documents and validates it.
    pub fn from_toml(items: &str, attributes: &str) -> Result<Self> {
        let templates: HashMap<String, Vec<ItemTemplate>> =
            toml::from_str(items).map_err(|e| Error::Config {
                message: format!("Failed to parse item templates: {e}"),
            })?;
        let stats: HashMap<String, CategoryStats> =
            toml::from_str(attributes).map_err(|e| Error::Config {
                message: format!("Failed to parse category attributes: {e}"),
            })?;

        let data = Self {
            templates: by_category(templates)?,
            stats: by_category(stats)?,
        };
        data.validate()?;
        Ok(data)
    }

    /// Loads item data from files.
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        items_path: P,
        attributes_path: Q,
    ) -> Result<Self> {
        let items = read(items_path.as_ref())?;
        let attributes = read(attributes_path.as_ref())?;
        Self::from_toml(&items, &attributes)
    }

    /// Templates the store may pick from for `category`.
    pub fn templates(&self, category: Category) -> Result<&[ItemTemplate]> {
        self.templates
            .get(&category)
            .map(Vec::as_slice)
            .filter(|templates| !templates.is_empty())
            .ok_or_else(|| Error::UnknownCategory {
                category: category.to_string(),
            })
    }

    /// Stat table for `category`.
    pub fn stats(&self, category: Category) -> Result<&CategoryStats> {
        self.stats
            .get(&category)
            .ok_or_else(|| Error::UnknownCategory {
                category: category.to_string(),
            })
    }

    fn validate(&self) -> Result<()> {
        for category in Category::ALL {
            let templates = self.templates(category).map_err(|_| Error::Config {
                message: format!("No item templates defined for '{category}'"),
            })?;
            let stats = self.stats(category).map_err(|_| Error::Config {
                message: format!("No attributes defined for '{category}'"),
            })?;
            if stats.price < 0 {
                return Err(Error::Config {
                    message: format!("Category '{category}' has negative price {}", stats.price),
                });
            }
            if stats.stack_amount == 0 {
                return Err(Error::Config {
                    message: format!("Category '{category}' has a stack amount of zero"),
                });
            }

            for template in templates {
                validate_rarity(template)?;
            }
        }
        Ok(())
    }
}

/// Absolute rarity must be at least 1 across the whole range.
fn validate_rarity(template: &ItemTemplate) -> Result<()> {
    let RarityRange { min, max } = template.rarity;
    if min > max {
        return Err(Error::Config {
            message: format!(
                "Item '{}' has rarity min {min} above max {max}",
                template.name
            ),
        });
    }
    if min + RARITY_OFFSET < 1 {
        return Err(Error::Config {
            message: format!(
                "Item '{}' has rarity min {min} below {}",
                template.name,
                1 - RARITY_OFFSET
            ),
        });
    }
    Ok(())
}

fn by_category<T>(raw: HashMap<String, T>) -> Result<HashMap<Category, T>> {
    raw.into_iter()
        .map(|(key, value)| {
            let category = key.parse::<Category>().map_err(|_| Error::Config {
                message: format!("Unknown item category '{key}'"),
            })?;
            Ok((category, value))
        })
        .collect()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{SAMPLE_ATTRIBUTES, SAMPLE_ITEMS};

    #[test]
    fn test_parse_sample_data() {
        let data = ItemData::from_toml(SAMPLE_ITEMS, SAMPLE_ATTRIBUTES).unwrap();

        let weapons = data.templates(Category::Weapons).unwrap();
        assert_eq!(weapons.len(), 2);
        assert_eq!(weapons[0].name, "Rusty Sword");
        assert_eq!(weapons[0].rarity, RarityRange { min: 0, max: 2 });
        assert_eq!(weapons[0].stats.len(), 1);

        let food = data.stats(Category::Food).unwrap();
        assert_eq!(food.price, 5);
        assert_eq!(food.stack_amount, 2);
    }

    #[test]
    fn test_bundled_data_is_valid() {
        let data = ItemData::from_toml(
            include_str!("../../data/items.toml"),
            include_str!("../../data/attributes.toml"),
        )
        .unwrap();
        for category in Category::ALL {
            assert!(!data.templates(category).unwrap().is_empty());
        }
    }

    #[test]
    fn test_missing_category_is_rejected() {
        let items = r#"
            [[weapons]]
            name = "Stick"
            description = "A stick"
            type = 1
            rarity = { min = 0, max = 0 }
        "#;
        let err = ItemData::from_toml(items, SAMPLE_ATTRIBUTES).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_inverted_rarity_range_is_rejected() {
        let items = SAMPLE_ITEMS.replacen(
            "rarity = { min = 0, max = 2 }",
            "rarity = { min = 3, max = 1 }",
            1,
        );
        let err = ItemData::from_toml(&items, SAMPLE_ATTRIBUTES).unwrap_err();
        match err {
            Error::Config { message } => assert!(message.contains("Rusty Sword")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rarity_below_lowest_tier_is_rejected() {
        let items = SAMPLE_ITEMS.replacen(
            "rarity = { min = 0, max = 2 }",
            "rarity = { min = -6, max = 2 }",
            1,
        );
        let err = ItemData::from_toml(&items, SAMPLE_ATTRIBUTES).unwrap_err();
        match err {
            Error::Config { message } => assert!(message.contains("Rusty Sword")),
            other => panic!("unexpected error: {other:?}"),
        }

        let lowest = SAMPLE_ITEMS.replacen(
            "rarity = { min = 0, max = 2 }",
            "rarity = { min = -5, max = 2 }",
            1,
        );
        assert!(ItemData::from_toml(&lowest, SAMPLE_ATTRIBUTES).is_ok());
    }

    #[test]
    fn test_negative_price_and_empty_stack_are_rejected() {
        let negative = SAMPLE_ATTRIBUTES.replacen("price = 10", "price = -10", 1);
        match ItemData::from_toml(SAMPLE_ITEMS, &negative).unwrap_err() {
            Error::Config { message } => assert!(message.contains("negative price")),
            other => panic!("unexpected error: {other:?}"),
        }

        let empty_stack = SAMPLE_ATTRIBUTES.replacen("stack_amount = 1", "stack_amount = 0", 1);
        match ItemData::from_toml(SAMPLE_ITEMS, &empty_stack).unwrap_err() {
            Error::Config { message } => assert!(message.contains("stack amount of zero")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_category_key_is_rejected() {
        let items = format!(
            "{SAMPLE_ITEMS}\n[[trinkets]]\nname = \"Ring\"\ndescription = \"Shiny\"\ntype = 9\nrarity = {{ min = 0, max = 1 }}\n"
        );
        assert!(ItemData::from_toml(&items, SAMPLE_ATTRIBUTES).is_err());
    }
}
