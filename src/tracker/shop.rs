//! Hunter store: a fixed catalog of items bought with gold.
//!
//! Potions can be bought any number of times. Equipment and skills are
//! one-time purchases. Stat and gold changes go through the account store's
//! additional-stats channel like every other reward.

use log::info;

use crate::tracker::account::{settle_award, AccountStore, AwardOutcome};
use crate::tracker::errors::TrackerError;
use crate::tracker::notify::{NotifierExt, Severity};
use crate::tracker::types::StatChanges;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Potion,
    Equipment,
    Skill,
}

impl ItemKind {
    /// Equipment and skills can only be owned once.
    pub fn is_one_time(&self) -> bool {
        !matches!(self, ItemKind::Potion)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Strength,
    Intelligence,
    Dexterity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemEffect {
    RaiseAttribute { attribute: Attribute, amount: u32 },
    GrantExperience(u64),
    Weapon,
    ShadowExtraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreItem {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub price: u64,
    pub kind: ItemKind,
    pub effect: ItemEffect,
}

pub const CATALOG: [StoreItem; 6] = [
    StoreItem {
        id: "1",
        name: "Elixir of Strength",
        description: "Increases strength by 5 points",
        price: 150,
        kind: ItemKind::Potion,
        effect: ItemEffect::RaiseAttribute {
            attribute: Attribute::Strength,
            amount: 5,
        },
    },
    StoreItem {
        id: "2",
        name: "Intelligence Scroll",
        description: "Increases intelligence by 5 points",
        price: 150,
        kind: ItemKind::Potion,
        effect: ItemEffect::RaiseAttribute {
            attribute: Attribute::Intelligence,
            amount: 5,
        },
    },
    StoreItem {
        id: "3",
        name: "Dexterity Tonic",
        description: "Increases dexterity by 5 points",
        price: 150,
        kind: ItemKind::Potion,
        effect: ItemEffect::RaiseAttribute {
            attribute: Attribute::Dexterity,
            amount: 5,
        },
    },
    StoreItem {
        id: "4",
        name: "XP Boost",
        description: "Instantly gain 500 XP",
        price: 300,
        kind: ItemKind::Potion,
        effect: ItemEffect::GrantExperience(500),
    },
    StoreItem {
        id: "5",
        name: "Basic Sword",
        description: "A standard sword for hunters",
        price: 500,
        kind: ItemKind::Equipment,
        effect: ItemEffect::Weapon,
    },
    StoreItem {
        id: "6",
        name: "Shadow Extraction",
        description: "Extract a shadow from defeated enemies",
        price: 1000,
        kind: ItemKind::Skill,
        effect: ItemEffect::ShadowExtraction,
    },
];

pub fn find_item(item_id: &str) -> Option<&'static StoreItem> {
    CATALOG.iter().find(|item| item.id == item_id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub item: StoreItem,
    pub remaining_gold: u64,
    /// Set when the item granted experience.
    pub award: Option<AwardOutcome>,
}

/// Ids of everything the session account has bought, in purchase order.
pub fn purchased_items(accounts: &AccountStore) -> Result<Vec<String>, TrackerError> {
    Ok(accounts
        .load_record()?
        .map(|record| record.purchased_items)
        .unwrap_or_default())
}

/// Buy `item_id` for the session account. `Ok(None)` without a session.
///
/// Gold, attribute, experience and ownership changes land in a single record
/// write; level-up notifications follow once it is persisted.
pub fn purchase(accounts: &mut AccountStore, item_id: &str) -> Result<Option<Purchase>, TrackerError> {
    let Some(record) = accounts.load_record()? else {
        return Ok(None);
    };
    let item = *find_item(item_id)
        .ok_or_else(|| TrackerError::NotFound(format!("store item: {}", item_id)))?;

    if item.kind.is_one_time() && record.purchased_items.iter().any(|id| id == item.id) {
        accounts
            .notifier()
            .send(Severity::Error, format!("You already own {}!", item.name));
        return Err(TrackerError::AlreadyOwned(item.name.to_string()));
    }
    if record.gold < item.price {
        accounts
            .notifier()
            .send(Severity::Error, "Not enough gold to purchase this item!");
        return Err(TrackerError::InsufficientFunds {
            needed: item.price,
            available: record.gold,
        });
    }

    let outcome = accounts.modify_record(|record| {
        let mut changes = StatChanges::gold(record.gold - item.price);
        let mut xp = 0;
        match item.effect {
            ItemEffect::RaiseAttribute { attribute, amount } => match attribute {
                Attribute::Strength => changes.strength = Some(record.stats.strength + amount),
                Attribute::Intelligence => {
                    changes.intelligence = Some(record.stats.intelligence + amount)
                }
                Attribute::Dexterity => changes.dexterity = Some(record.stats.dexterity + amount),
            },
            ItemEffect::GrantExperience(amount) => xp = amount,
            ItemEffect::Weapon | ItemEffect::ShadowExtraction => {}
        }
        let outcome = settle_award(record, xp, &changes);
        record.purchased_items.push(item.id.to_string());
        Ok(outcome)
    })?;
    let Some(outcome) = outcome else {
        return Ok(None);
    };
    accounts.announce_level_ups(&outcome.level_ups);

    info!("account {} bought {} for {} gold", record.id, item.name, item.price);
    accounts
        .notifier()
        .send(Severity::Success, format!("Successfully purchased {}!", item.name));
    let award = matches!(item.effect, ItemEffect::GrantExperience(_)).then_some(outcome);
    Ok(Some(Purchase {
        item,
        remaining_gold: accounts.gold(),
        award,
    }))
}
