//! Shared test utilities for the store bot.
//!
//! Provides sample item data, ready-made catalogue items and [`MockEconomy`], an
//! in-memory economy service that records every call and can be told to fail.

#![allow(clippy::unwrap_used)]

use crate::{
    api::{Account, AttributeKind, AttributeRecord, EconomyApi, InventoryItem, NewItem, Stat},
    config::items::ItemData,
    core::catalogue::{CATALOGUE_SIZE, Category, GeneratedItem},
    errors::{Error, Result},
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Mutex};

/// Item templates covering every category.
pub const SAMPLE_ITEMS: &str = r#"
[[weapons]]
name = "Rusty Sword"
description = "Better than nothing."
type = 1
rarity = { min = 0, max = 2 }
stats = [{ name = "durability", value = 10 }]

[[weapons]]
name = "Oak Bow"
description = "Bends, rarely breaks."
type = 2
rarity = { min = 1, max = 3 }

[[armour]]
name = "Leather Vest"
description = "Smells of cow."
type = 3
rarity = { min = 0, max = 1 }

[[food]]
name = "Bread"
description = "Slightly stale."
type = 4
rarity = { min = 0, max = 0 }

[[food]]
name = "Apple"
description = "Keeps the healer away."
type = 4
rarity = { min = 0, max = 1 }

[[potions]]
name = "Healing Draught"
description = "Tastes like cough syrup."
type = 5
rarity = { min = 1, max = 2 }

[[spells]]
name = "Fireball"
description = "Hot."
type = 6
rarity = { min = 2, max = 4 }
stats = [{ name = "mana", value = -5 }]

[[spells]]
name = "Frost Nova"
description = "Cold."
type = 6
rarity = { min = 1, max = 3 }
"#;

/// Category stat tables matching [`SAMPLE_ITEMS`].
pub const SAMPLE_ATTRIBUTES: &str = r#"
[weapons]
price = 10
stack_amount = 1
rarity_modifier = 0.5
stats = [{ name = "damage", value = 1.5 }]

[armour]
price = 12
stack_amount = 1
rarity_modifier = 0.75
stats = [{ name = "defence", value = 2.0 }]

[food]
price = 5
stack_amount = 2
rarity_modifier = 0.25
stats = [{ name = "healing", value = 2.0 }]

[potions]
price = 8
stack_amount = 1
rarity_modifier = 0.5

[spells]
price = 15
stack_amount = 1
rarity_modifier = 1.0
stats = [{ name = "power", value = 1.25 }]
"#;

pub fn sample_item_data() -> ItemData {
    ItemData::from_toml(SAMPLE_ITEMS, SAMPLE_ATTRIBUTES).unwrap()
}

/// A catalogue item with fixed metadata and the given price.
pub fn sample_generated_item(category: Category, price: i64) -> GeneratedItem {
    GeneratedItem {
        category,
        name: format!("Sample {category}"),
        description: "A sample item.".to_string(),
        price,
        stack_amount: 1,
        rarity_id: 1,
        rarity: rarity_record(7),
        item_type: type_record(1, 5),
        attributes: vec![Stat {
            name: "damage".to_string(),
            value: 4,
        }],
    }
}

/// Five catalogue items named `Item 0` to `Item 4` in layout order.
pub fn sample_items(prices: [i64; CATALOGUE_SIZE]) -> Vec<GeneratedItem> {
    const LAYOUT: [Category; CATALOGUE_SIZE] = [
        Category::Weapons,
        Category::Weapons,
        Category::Armour,
        Category::Food,
        Category::Potions,
    ];
    LAYOUT
        .into_iter()
        .zip(prices)
        .enumerate()
        .map(|(index, (category, price))| GeneratedItem {
            name: format!("Item {index}"),
            ..sample_generated_item(category, price)
        })
        .collect()
}

fn rarity_record(id: i64) -> AttributeRecord {
    AttributeRecord {
        id,
        name: format!("rarity-{id}"),
        emoji_name: "⭐".to_string(),
        max_stack_amount: None,
    }
}

fn type_record(id: i64, max_stack: u32) -> AttributeRecord {
    AttributeRecord {
        id,
        name: format!("type-{id}"),
        emoji_name: "📦".to_string(),
        max_stack_amount: Some(max_stack),
    }
}

/// A call received by [`MockEconomy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    GetAccount(u64),
    AdjustBalance(u64, i64),
    /// Owner and item name.
    CreateItem(u64, String),
    GetItem(String),
    TransferItem(String, u64),
    GetAttribute(AttributeKind, i64),
}

impl MockCall {
    const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AdjustBalance(..) | Self::CreateItem(..) | Self::TransferItem(..)
        )
    }
}

#[derive(Debug, Default)]
struct Failures {
    attributes: Option<u16>,
    create_item: Option<u16>,
    transfer: Option<u16>,
    /// Status per user, applied to debits only.
    debit: HashMap<u64, u16>,
    /// Status per user, applied to credits only.
    credit: HashMap<u64, u16>,
}

#[derive(Debug, Default)]
struct MockState {
    accounts: HashMap<u64, i64>,
    items: HashMap<String, InventoryItem>,
    next_item: u64,
    calls: Vec<MockCall>,
    failures: Failures,
}

/// In-memory economy service.
#[derive(Debug)]
pub struct MockEconomy {
    state: Mutex<MockState>,
    type_max_stack: u32,
    yield_calls: bool,
}

impl Default for MockEconomy {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEconomy {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            type_max_stack: 5,
            yield_calls: false,
        }
    }

    #[must_use]
    pub fn with_account(self, user_id: u64, dollars: i64) -> Self {
        self.state.lock().unwrap().accounts.insert(user_id, dollars);
        self
    }

    /// Sets `max_stack_amount` reported for every item type.
    #[must_use]
    pub fn with_type_max_stack(mut self, max_stack: u32) -> Self {
        self.type_max_stack = max_stack;
        self
    }

    /// Yields to the scheduler at the start of every call, so concurrent
    /// operations interleave at each remote round trip.
    #[must_use]
    pub fn yielding(mut self) -> Self {
        self.yield_calls = true;
        self
    }

    /// Puts a new item in `owner`'s inventory and returns its id.
    pub fn give_item(&self, owner: u64, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_item += 1;
        let id = format!("item-{}", state.next_item);
        let item = InventoryItem {
            id: id.clone(),
            name: name.to_string(),
            description: Some(format!("A {name}.")),
            amount: 1,
            owner_id: Some(owner.to_string()),
            item_type: type_record(1, self.type_max_stack),
            rarity: rarity_record(7),
            attributes: vec![Stat {
                name: "damage".to_string(),
                value: 3,
            }],
        };
        state.items.insert(id.clone(), item);
        id
    }

    pub fn fail_attributes(&self, status: u16) {
        self.state.lock().unwrap().failures.attributes = Some(status);
    }

    pub fn fail_create_item(&self, status: u16) {
        self.state.lock().unwrap().failures.create_item = Some(status);
    }

    pub fn fail_transfer(&self, status: u16) {
        self.state.lock().unwrap().failures.transfer = Some(status);
    }

    /// Makes every debit of `user_id` fail.
    pub fn fail_debit(&self, user_id: u64, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .debit
            .insert(user_id, status);
    }

    /// Makes every credit of `user_id` fail.
    pub fn fail_credit(&self, user_id: u64, status: u16) {
        self.state
            .lock()
            .unwrap()
            .failures
            .credit
            .insert(user_id, status);
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().failures = Failures::default();
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that would change remote state, failed ones included.
    pub fn mutations(&self) -> Vec<MockCall> {
        self.calls()
            .into_iter()
            .filter(MockCall::is_mutation)
            .collect()
    }

    pub fn reset_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn balance(&self, user_id: u64) -> Option<i64> {
        self.state.lock().unwrap().accounts.get(&user_id).copied()
    }

    pub fn owner_of(&self, item_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .items
            .get(item_id)
            .and_then(|item| item.owner_id.clone())
    }

    pub fn items_owned_by(&self, user_id: u64) -> Vec<InventoryItem> {
        let state = self.state.lock().unwrap();
        let mut items: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| item.is_owned_by(user_id))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        items
    }

    async fn round_trip(&self) {
        if self.yield_calls {
            tokio::task::yield_now().await;
        }
    }

    fn record(&self, call: MockCall) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn account(state: &MockState, user_id: u64) -> Result<Account> {
        let dollars = *state
            .accounts
            .get(&user_id)
            .ok_or(Error::AccountNotFound { user_id })?;
        let mut inventory: Vec<InventoryItem> = state
            .items
            .values()
            .filter(|item| item.is_owned_by(user_id))
            .cloned()
            .collect();
        inventory.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Account {
            id: Some(user_id.to_string()),
            dollars,
            inventory,
        })
    }
}

#[async_trait]
impl EconomyApi for MockEconomy {
    async fn get_account(&self, user_id: u64) -> Result<Account> {
        self.round_trip().await;
        self.record(MockCall::GetAccount(user_id));
        let state = self.state.lock().unwrap();
        Self::account(&state, user_id)
    }

    async fn adjust_balance(&self, user_id: u64, delta: i64) -> Result<Account> {
        self.round_trip().await;
        self.record(MockCall::AdjustBalance(user_id, delta));
        let mut state = self.state.lock().unwrap();
        let failure = if delta < 0 {
            state.failures.debit.get(&user_id)
        } else {
            state.failures.credit.get(&user_id)
        };
        if let Some(&status) = failure {
            return Err(Error::Remote { status });
        }
        let balance = state
            .accounts
            .get_mut(&user_id)
            .ok_or(Error::AccountNotFound { user_id })?;
        *balance += delta;
        Self::account(&state, user_id)
    }

    async fn create_item(&self, item: &NewItem) -> Result<()> {
        self.round_trip().await;
        let owner: u64 = item.owner_id.parse().unwrap();
        self.record(MockCall::CreateItem(owner, item.name.clone()));
        if let Some(status) = self.state.lock().unwrap().failures.create_item {
            return Err(Error::Remote { status });
        }
        let id = self.give_item(owner, &item.name);
        let mut state = self.state.lock().unwrap();
        if let Some(created) = state.items.get_mut(&id) {
            created.description = Some(item.description.clone());
            created.amount = item.amount;
            created.rarity = rarity_record(item.rarity_id);
            created.item_type = type_record(item.type_id, self.type_max_stack);
            created.attributes.clone_from(&item.attributes);
        }
        Ok(())
    }

    async fn get_item(&self, item_id: &str) -> Result<InventoryItem> {
        self.round_trip().await;
        self.record(MockCall::GetItem(item_id.to_string()));
        self.state
            .lock()
            .unwrap()
            .items
            .get(item_id)
            .cloned()
            .ok_or_else(|| Error::ItemNotFound {
                item_id: item_id.to_string(),
            })
    }

    async fn transfer_item(&self, item_id: &str, new_owner: u64) -> Result<()> {
        self.round_trip().await;
        self.record(MockCall::TransferItem(item_id.to_string(), new_owner));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.failures.transfer {
            return Err(Error::Remote { status });
        }
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| Error::ItemNotFound {
                item_id: item_id.to_string(),
            })?;
        item.owner_id = Some(new_owner.to_string());
        Ok(())
    }

    async fn get_attribute(&self, kind: AttributeKind, id: i64) -> Result<AttributeRecord> {
        self.round_trip().await;
        self.record(MockCall::GetAttribute(kind, id));
        if let Some(status) = self.state.lock().unwrap().failures.attributes {
            return Err(Error::Remote { status });
        }
        Ok(match kind {
            AttributeKind::Rarity => rarity_record(id),
            AttributeKind::Type => type_record(id, self.type_max_stack),
        })
    }
}
