//! Wire types exchanged with the economy service.

use serde::{Deserialize, Deserializer, Serialize};

/// A user's account: balance plus the items they own.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(default, deserialize_with = "optional_id")]
    pub id: Option<String>,
    pub dollars: i64,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

impl Account {
    /// Finds an owned item by id.
    #[must_use]
    pub fn item(&self, item_id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| item.id == item_id)
    }
}

/// An item stack held by some account.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_amount")]
    pub amount: u32,
    #[serde(rename = "ownerID", default, deserialize_with = "optional_id")]
    pub owner_id: Option<String>,
    #[serde(rename = "type")]
    pub item_type: AttributeRecord,
    pub rarity: AttributeRecord,
    #[serde(default)]
    pub attributes: Vec<Stat>,
}

impl InventoryItem {
    /// Whether the service lists `user_id` as the current owner.
    #[must_use]
    pub fn is_owned_by(&self, user_id: u64) -> bool {
        self.owner_id
            .as_deref()
            .is_some_and(|owner| owner == user_id.to_string())
    }
}

const fn default_amount() -> u32 {
    1
}

/// Rarity or type metadata.
///
/// Both kinds share one record shape; only types carry `max_stack_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub emoji_name: String,
    #[serde(default)]
    pub max_stack_amount: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Rarity,
    Type,
}

impl AttributeKind {
    /// Path segment used by the attribute endpoint.
    #[must_use]
    pub const fn as_path(self) -> &'static str {
        match self {
            Self::Rarity => "rarity",
            Self::Type => "type",
        }
    }
}

/// A named stat and its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub name: String,
    pub value: i64,
}

/// Body of the item creation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    #[serde(rename = "rarityID")]
    pub rarity_id: i64,
    #[serde(rename = "typeID")]
    pub type_id: i64,
    pub amount: u32,
    #[serde(rename = "ownerID")]
    pub owner_id: String,
    pub attributes: Vec<Stat>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(value: RawId) -> Self {
        match value {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

// The service is not consistent about numeric vs string ids.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}
