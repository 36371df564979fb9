//! # Hunterlog - a gamified habit and quest tracker
//!
//! Hunterlog turns daily habits and one-off quests into experience, gold and
//! badges for a single hunter account. Levels grow with experience, ranks follow
//! levels, and streaks of consecutive days unlock milestone badges.
//!
//! ## Features
//!
//! - **Accounts**: Argon2id password hashes, a persisted session pointer and profile editing.
//! - **Progression**: Multi-level XP awards with a 1.2x growing threshold and E to S ranks.
//! - **Habits and Streaks**: Per-day completion toggling with milestone badges and bonus XP.
//! - **Quests**: One-way completion paying XP, gold and an achievement badge.
//! - **Hunter Store and Shadow Army**: Spend gold on items and keep a roster of friends.
//! - **Day Rollover**: Streak resets on load and at each local midnight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hunterlog::tracker::{
//!     AccountStore, CharacterClass, Credentials, LogNotifier, ProgressStore, SystemClock,
//!     TrackerStore,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(TrackerStore::open("data/hunterlog")?);
//!     let mut accounts = AccountStore::open(
//!         store,
//!         Arc::new(LogNotifier::new(true)),
//!         Arc::new(SystemClock),
//!         Credentials::default(),
//!     )?;
//!     accounts.register("Jinwoo", "jinwoo@hunters.kr", "arise", CharacterClass::RookieHunter)?;
//!
//!     let mut progress = ProgressStore::load(&accounts)?;
//!     if let Some(habit) = progress.add_habit(&accounts, "Push-ups", "dumbbell", 50)? {
//!         let today = accounts.clock().today();
//!         progress.complete_habit(&mut accounts, habit.id, today)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`tracker`] - Account and progress stores, rules and persistence
//! - [`config`] - Configuration loading
//! - [`validation`] - Input validation helpers

pub mod config;
pub mod tracker;
pub mod validation;
