use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const ACCOUNT_SCHEMA_VERSION: u8 = 1;

pub const STARTING_GOLD: u64 = 500;
pub const STARTING_MAX_XP: u64 = 800;

/// Coarse tier label derived from level. Ordered from lowest to highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rank {
    #[serde(rename = "E-RANK")]
    E,
    #[serde(rename = "D-RANK")]
    D,
    #[serde(rename = "C-RANK")]
    C,
    #[serde(rename = "B-RANK")]
    B,
    #[serde(rename = "A-RANK")]
    A,
    #[serde(rename = "S-RANK")]
    S,
}

impl Rank {
    /// Rank for a level using the fixed breakpoints, or `None` below level 3
    /// where the existing rank is kept.
    pub fn for_level(level: u32) -> Option<Rank> {
        match level {
            l if l >= 20 => Some(Rank::S),
            l if l >= 15 => Some(Rank::A),
            l if l >= 10 => Some(Rank::B),
            l if l >= 5 => Some(Rank::C),
            l if l >= 3 => Some(Rank::D),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rank::E => "E-RANK",
            Rank::D => "D-RANK",
            Rank::C => "C-RANK",
            Rank::B => "B-RANK",
            Rank::A => "A-RANK",
            Rank::S => "S-RANK",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Character class chosen at registration. Only decides starting attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CharacterClass {
    #[serde(rename = "Rookie Hunter")]
    RookieHunter,
    #[serde(rename = "Mage Hunter")]
    MageHunter,
    #[serde(rename = "Assassin Hunter")]
    AssassinHunter,
    #[serde(rename = "Shadow Monarch")]
    ShadowMonarch,
}

impl CharacterClass {
    pub const ALL: [CharacterClass; 4] = [
        CharacterClass::RookieHunter,
        CharacterClass::MageHunter,
        CharacterClass::AssassinHunter,
        CharacterClass::ShadowMonarch,
    ];

    /// Parse a class label (case-insensitive). Unknown labels fall back to
    /// Assassin Hunter, which carries the dexterity-favoring preset.
    pub fn parse(label: &str) -> CharacterClass {
        match label.trim().to_ascii_lowercase().as_str() {
            "rookie hunter" | "rookie" => CharacterClass::RookieHunter,
            "mage hunter" | "mage" => CharacterClass::MageHunter,
            "shadow monarch" | "monarch" => CharacterClass::ShadowMonarch,
            _ => CharacterClass::AssassinHunter,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CharacterClass::RookieHunter => "Rookie Hunter",
            CharacterClass::MageHunter => "Mage Hunter",
            CharacterClass::AssassinHunter => "Assassin Hunter",
            CharacterClass::ShadowMonarch => "Shadow Monarch",
        }
    }

    /// Starting (strength, intelligence, dexterity).
    fn attributes(&self) -> (u32, u32, u32) {
        match self {
            CharacterClass::RookieHunter => (8, 10, 8),
            CharacterClass::MageHunter => (6, 14, 6),
            CharacterClass::AssassinHunter | CharacterClass::ShadowMonarch => (7, 7, 12),
        }
    }

    pub fn starting_stats(&self) -> CharacterStats {
        let (strength, intelligence, dexterity) = self.attributes();
        CharacterStats {
            level: 1,
            rank: Rank::E,
            strength,
            intelligence,
            dexterity,
            current_xp: 0,
            max_xp: STARTING_MAX_XP,
        }
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(value: &str) -> Option<Gender> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Gender::Male),
            "female" | "f" => Some(Gender::Female),
            "other" | "o" => Some(Gender::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharacterStats {
    pub level: u32,
    pub rank: Rank,
    pub strength: u32,
    pub intelligence: u32,
    pub dexterity: u32,
    pub current_xp: u64,
    pub max_xp: u64,
}

/// Partial overwrite of gold and attributes carried alongside an XP award.
/// Only fields that are `Some` are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatChanges {
    pub gold: Option<u64>,
    pub strength: Option<u32>,
    pub intelligence: Option<u32>,
    pub dexterity: Option<u32>,
}

impl StatChanges {
    pub fn gold(gold: u64) -> Self {
        Self {
            gold: Some(gold),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Habit {
    pub id: u64,
    pub name: String,
    pub icon: String,
    pub xp_reward: u32,
    pub streak: u32,
    #[serde(default)]
    pub completed_days: BTreeSet<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_date: Option<NaiveDate>,
}

impl Habit {
    pub fn new(id: u64, name: &str, icon: &str, xp_reward: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            icon: icon.to_string(),
            xp_reward,
            streak: 0,
            completed_days: BTreeSet::new(),
            last_completed_date: None,
        }
    }

    pub fn is_completed_on(&self, day: NaiveDate) -> bool {
        self.completed_days.contains(&day)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quest {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub xp_reward: u32,
    #[serde(default)]
    pub completed: bool,
}

impl Quest {
    pub fn new(id: u64, name: &str, description: &str, xp_reward: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: description.to_string(),
            xp_reward,
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeIcon {
    Award,
    Shield,
    Sword,
    Zap,
    Star,
    Trophy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    Blue,
    Green,
    Cyan,
    Amber,
    Purple,
}

/// What a badge was awarded for. Each kind carries only its own key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BadgeKind {
    Level { level: u32 },
    Streak { habit_id: u64, milestone: u32 },
    Achievement { quest_id: u64 },
}

/// Immutable, append-only award record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Badge {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: BadgeIcon,
    pub color: BadgeColor,
    pub kind: BadgeKind,
    pub earned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Friend {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub level: u32,
    pub character_class: CharacterClass,
    pub strength: u32,
    pub intelligence: u32,
    pub dexterity: u32,
    pub online: bool,
    pub last_active: DateTime<Utc>,
}

/// Starter habits handed to records saved before habits were tracked.
pub fn starter_habits() -> Vec<Habit> {
    vec![
        Habit::new(1, "Exercise", "dumbbell", 50),
        Habit::new(2, "Read", "book-open", 30),
        Habit::new(3, "No Junk Food", "salad", 40),
    ]
}

/// Starter quests handed to records saved before quests were tracked.
pub fn starter_quests() -> Vec<Quest> {
    vec![
        Quest::new(
            1,
            "Complete 3-Day Workout Challenge",
            "Complete 3 consecutive days of exercise to level up your strength.",
            150,
        ),
        Quest::new(
            2,
            "Study Session",
            "Complete a 30-minute focused study session to increase intelligence.",
            100,
        ),
    ]
}

/// Full account record as stored. Never leaves the storage and account layers;
/// everything else sees [`Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub character_class: CharacterClass,
    pub gold: u64,
    pub stats: CharacterStats,
    #[serde(default = "starter_habits")]
    pub habits: Vec<Habit>,
    #[serde(default = "starter_quests")]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub friends: Vec<Friend>,
    #[serde(default)]
    pub purchased_items: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl AccountRecord {
    pub fn new(
        id: u64,
        username: &str,
        email: &str,
        password_hash: String,
        class: CharacterClass,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            profile_image: None,
            gender: None,
            character_class: class,
            gold: STARTING_GOLD,
            stats: class.starting_stats(),
            habits: Vec::new(),
            quests: Vec::new(),
            badges: Vec::new(),
            friends: Vec::new(),
            purchased_items: Vec::new(),
            created_at: now,
            updated_at: now,
            schema_version: ACCOUNT_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Credential-stripped copy for the live session.
    pub fn to_account(&self) -> Account {
        Account {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
            gender: self.gender,
            character_class: self.character_class,
            gold: self.gold,
            stats: self.stats.clone(),
        }
    }
}

/// Account as held by the session: identity, economy and stats, no credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub character_class: CharacterClass,
    pub gold: u64,
    pub stats: CharacterStats,
}

/// Persisted pointer to the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub account: Account,
    pub started_at: DateTime<Utc>,
}
