//! Catalogue generation - turns static item templates into priced store items.
//!
//! Each store slot is drawn from a category pool: a random template, a random
//! rarity inside the template's range, rarity and type metadata resolved against
//! the economy service, then price, stack size and stats derived from the
//! category's stat table.

use crate::{
    api::{AttributeKind, AttributeRecord, EconomyApi, NewItem, Stat},
    config::items::ItemData,
    errors::{Error, Result},
};
use rand::{Rng, seq::SliceRandom};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, instrument, warn};

/// Offset between local rarity tiers and the service's absolute rarity ids.
pub const RARITY_OFFSET: i64 = 6;

/// Number of slots in every catalogue.
pub const CATALOGUE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Weapons,
    Armour,
    Food,
    Potions,
    Spells,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Weapons,
        Self::Armour,
        Self::Food,
        Self::Potions,
        Self::Spells,
    ];

    /// Key used for the category in the data files.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Weapons => "weapons",
            Self::Armour => "armour",
            Self::Food => "food",
            Self::Potions => "potions",
            Self::Spells => "spells",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.key() == s)
            .ok_or_else(|| Error::UnknownCategory {
                category: s.to_string(),
            })
    }
}

/// A priced, stat-assigned instance of an item template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedItem {
    pub category: Category,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stack_amount: u32,
    /// Local rarity tier drawn from the template's range.
    pub rarity_id: i64,
    pub rarity: AttributeRecord,
    pub item_type: AttributeRecord,
    pub attributes: Vec<Stat>,
}

impl GeneratedItem {
    #[must_use]
    pub const fn absolute_rarity(&self) -> i64 {
        self.rarity_id + RARITY_OFFSET
    }

    /// Body of the service call that materialises this item for `owner`.
    #[must_use]
    pub fn to_new_item(&self, owner: u64) -> NewItem {
        NewItem {
            name: self.name.clone(),
            description: self.description.clone(),
            rarity_id: self.rarity.id,
            type_id: self.item_type.id,
            amount: self.stack_amount,
            owner_id: owner.to_string(),
            attributes: self.attributes.clone(),
        }
    }
}

/// `base_price * (rarity_id + RARITY_OFFSET)`
#[must_use]
pub const fn price_for(base_price: i64, rarity_id: i64) -> i64 {
    base_price * (rarity_id + RARITY_OFFSET)
}

/// `ceil(base * modifier * absolute_rarity)`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn scale_stat(base: f64, modifier: f64, absolute_rarity: i64) -> i64 {
    (base * modifier * absolute_rarity as f64).ceil() as i64
}

/// Category of each slot: two weapons, an armour, a food and a potion or spell.
pub fn catalogue_layout<R: Rng + ?Sized>(rng: &mut R) -> [Category; CATALOGUE_SIZE] {
    let last = if rng.gen_bool(0.5) {
        Category::Potions
    } else {
        Category::Spells
    };
    [
        Category::Weapons,
        Category::Weapons,
        Category::Armour,
        Category::Food,
        last,
    ]
}

/// Generates store items from the static item data.
#[derive(Debug, Clone)]
pub struct CatalogueGenerator {
    data: Arc<ItemData>,
}

impl CatalogueGenerator {
    #[must_use]
    pub const fn new(data: Arc<ItemData>) -> Self {
        Self { data }
    }

    /// Generates a single item of `category`.
    ///
    /// Fails without producing an item if the category has no templates or if
    /// either metadata lookup fails.
    #[instrument(skip(self, api, rng))]
    pub async fn generate<R: Rng + Send>(
        &self,
        api: &dyn EconomyApi,
        category: Category,
        rng: &mut R,
    ) -> Result<GeneratedItem> {
        let templates = self.data.templates(category)?;
        let stats = self.data.stats(category)?;
        let template = templates
            .choose(rng)
            .ok_or_else(|| Error::UnknownCategory {
                category: category.to_string(),
            })?;

        let rarity_id = rng.gen_range(template.rarity.min..=template.rarity.max);
        let absolute_rarity = rarity_id + RARITY_OFFSET;

        let rarity = api
            .get_attribute(AttributeKind::Rarity, absolute_rarity)
            .await?;
        let item_type = api
            .get_attribute(AttributeKind::Type, template.type_id)
            .await?;

        let min_stack = stats.stack_amount;
        let max_stack = item_type.max_stack_amount.unwrap_or(min_stack).max(min_stack);
        let stack_amount = rng.gen_range(min_stack..=max_stack);

        let mut attributes = template.stats.clone();
        attributes.extend(stats.stats.iter().map(|stat| Stat {
            name: stat.name.clone(),
            value: scale_stat(stat.value, stats.rarity_modifier, absolute_rarity),
        }));

        debug!(name = %template.name, rarity_id, "Generated store item");

        Ok(GeneratedItem {
            category,
            name: template.name.clone(),
            description: template.description.clone(),
            price: price_for(stats.price, rarity_id),
            stack_amount,
            rarity_id,
            rarity,
            item_type,
            attributes,
        })
    }

    /// Generates all five slots of a catalogue, in layout order.
    ///
    /// The first failing slot aborts the whole catalogue so a partial
    /// catalogue is never produced.
    pub async fn generate_catalogue<R: Rng + Send>(
        &self,
        api: &dyn EconomyApi,
        rng: &mut R,
    ) -> Result<Vec<GeneratedItem>> {
        let layout = catalogue_layout(rng);
        let mut items = Vec::with_capacity(CATALOGUE_SIZE);
        for category in layout {
            let item = self
                .generate(api, category, rng)
                .await
                .inspect_err(|e| warn!(%category, "Failed to generate store slot: {e}"))?;
            items.push(item);
        }
        Ok(items)
    }
}
