//! Rule engine and record store for the hunter tracker.
//! Accounts hold XP, level, rank and gold; progress covers habits, quests,
//! streaks and badges. Both persist to a Sled-backed store of JSON records.

pub mod account;
pub mod badges;
pub mod clock;
pub mod credentials;
pub mod errors;
pub mod notify;
pub mod progress;
pub mod roster;
pub mod scheduler;
pub mod shop;
pub mod storage;
pub mod types;

pub use account::{apply_experience, AccountStore, AwardOutcome, LevelUp, ProfileUpdate};
pub use badges::{is_streak_milestone, streak_bonus_xp, STREAK_MILESTONES};
pub use clock::{Clock, FixedClock, SystemClock};
pub use credentials::Credentials;
pub use errors::TrackerError;
pub use notify::{LogNotifier, MemoryNotifier, Notification, Notifier, NotifierExt, Severity};
pub use progress::{HabitToggle, ProgressStore, QuestCompletion};
pub use roster::{add_friend, list_friends, remove_friend};
pub use scheduler::{duration_until_next_midnight, SchedulerReport};
pub use shop::{find_item, purchase, purchased_items, ItemKind, Purchase, StoreItem, CATALOG};
pub use storage::{TrackerStore, TrackerStoreBuilder};
pub use types::*;
