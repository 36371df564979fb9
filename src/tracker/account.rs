//! Account store: credentials, the live session, and the experience rule.
//!
//! The session is an explicit context held by [`AccountStore`]. It is
//! restored from the persisted session pointer when the store opens and torn
//! down by [`AccountStore::logout`].

use std::sync::Arc;

use log::{info, warn};

use crate::tracker::clock::Clock;
use crate::tracker::credentials::Credentials;
use crate::tracker::errors::TrackerError;
use crate::tracker::notify::{Notifier, NotifierExt, Severity};
use crate::tracker::storage::TrackerStore;
use crate::tracker::types::{
    Account, AccountRecord, CharacterClass, CharacterStats, Gender, Rank, SessionRecord,
    StatChanges,
};
use crate::validation::{require, validate_email, validate_name};

/// One level gained during an award.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub level: u32,
    pub previous_rank: Rank,
    pub rank: Rank,
}

impl LevelUp {
    pub fn ranked_up(&self) -> bool {
        self.rank != self.previous_rank
    }
}

/// Result of [`AccountStore::award_experience`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardOutcome {
    pub level_ups: Vec<LevelUp>,
    pub level: u32,
    pub rank: Rank,
    pub current_xp: u64,
    pub max_xp: u64,
}

/// Add `xp` to `stats` and settle it: every time the running total reaches
/// the threshold a level is gained, the threshold is subtracted and then grown
/// by a fifth (rounded down), and the rank is recomputed. Afterwards
/// `current_xp < max_xp` holds.
pub fn apply_experience(stats: &mut CharacterStats, xp: u64) -> Vec<LevelUp> {
    let mut level_ups = Vec::new();
    if xp > 0 {
        stats.current_xp += xp;
    }
    while stats.current_xp >= stats.max_xp {
        let previous_rank = stats.rank;
        stats.level += 1;
        stats.current_xp -= stats.max_xp;
        stats.max_xp = stats.max_xp * 6 / 5;
        if let Some(rank) = Rank::for_level(stats.level) {
            stats.rank = rank;
        }
        level_ups.push(LevelUp {
            level: stats.level,
            previous_rank,
            rank: stats.rank,
        });
    }
    level_ups
}

/// Apply `xp` and then the `changes` overwrites to `record` in memory.
pub(crate) fn settle_award(record: &mut AccountRecord, xp: u64, changes: &StatChanges) -> AwardOutcome {
    let level_ups = apply_experience(&mut record.stats, xp);
    merge_changes(record, changes);
    AwardOutcome {
        level_ups,
        level: record.stats.level,
        rank: record.stats.rank,
        current_xp: record.stats.current_xp,
        max_xp: record.stats.max_xp,
    }
}

fn merge_changes(record: &mut AccountRecord, changes: &StatChanges) {
    if let Some(gold) = changes.gold {
        record.gold = gold;
    }
    if let Some(strength) = changes.strength {
        record.stats.strength = strength;
    }
    if let Some(intelligence) = changes.intelligence {
        record.stats.intelligence = intelligence;
    }
    if let Some(dexterity) = changes.dexterity {
        record.stats.dexterity = dexterity;
    }
}

/// Fields overwritten by [`AccountStore::update_profile`].
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub profile_image: Option<String>,
    pub gender: Option<Gender>,
}

pub struct AccountStore {
    store: Arc<TrackerStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    credentials: Credentials,
    session: Option<Account>,
}

impl AccountStore {
    /// Open the account store and restore any persisted session.
    pub fn open(
        store: Arc<TrackerStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        credentials: Credentials,
    ) -> Result<Self, TrackerError> {
        let mut accounts = Self {
            store,
            notifier,
            clock,
            credentials,
            session: None,
        };
        accounts.restore_session()?;
        Ok(accounts)
    }

    /// Re-read the persisted session pointer. The account is reloaded from
    /// its record so the session never holds a stale copy. Returns whether a
    /// session is active afterwards.
    pub fn restore_session(&mut self) -> Result<bool, TrackerError> {
        self.session = None;
        let Some(pointer) = self.store.get_session()? else {
            return Ok(false);
        };
        match self.store.get_account(pointer.account.id) {
            Ok(record) => {
                self.session = Some(record.to_account());
                Ok(true)
            }
            Err(TrackerError::NotFound(_)) => {
                warn!(
                    "session pointer references missing account {}; clearing",
                    pointer.account.id
                );
                self.store.clear_session()?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub fn store(&self) -> &Arc<TrackerStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn current(&self) -> Option<&Account> {
        self.session.as_ref()
    }

    /// Gold balance of the session account (zero without a session).
    pub fn gold(&self) -> u64 {
        self.session.as_ref().map_or(0, |a| a.gold)
    }

    fn establish_session(&mut self, record: &AccountRecord) -> Result<Account, TrackerError> {
        let account = record.to_account();
        self.store.put_session(&SessionRecord {
            account: account.clone(),
            started_at: self.clock.now(),
        })?;
        self.session = Some(account.clone());
        Ok(account)
    }

    fn report<T>(&self, result: Result<T, TrackerError>, context: &str) -> Result<T, TrackerError> {
        if let Err(e) = &result {
            if e.is_user_facing() {
                self.notifier
                    .send(Severity::Error, format!("{} failed: {}", context, e));
            }
        }
        result
    }

    /// Check credentials and establish a session.
    pub fn authenticate(&mut self, email: &str, password: &str) -> Result<Account, TrackerError> {
        let result = self.try_authenticate(email, password);
        let result = self.report(result, "Login");
        if let Ok(account) = &result {
            info!("login: account {} ({})", account.id, account.username);
            self.notifier.send(Severity::Success, "Login successful!");
        }
        result
    }

    fn try_authenticate(&mut self, email: &str, password: &str) -> Result<Account, TrackerError> {
        let email = validate_email(email)?;
        require("password", password)?;
        let Some(record) = self.store.find_account_by_email(&email)? else {
            return Err(TrackerError::Authentication);
        };
        if !self.credentials.verify(password, &record.password_hash)? {
            return Err(TrackerError::Authentication);
        }
        self.establish_session(&record)
    }

    /// Create an account and establish a session for it.
    pub fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        class: CharacterClass,
    ) -> Result<Account, TrackerError> {
        let result = self.try_register(username, email, password, class);
        let result = self.report(result, "Registration");
        if let Ok(account) = &result {
            info!(
                "registered account {} ({}, {})",
                account.id, account.username, account.character_class
            );
            self.notifier.send(Severity::Success, "Registration successful!");
        }
        result
    }

    fn try_register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        class: CharacterClass,
    ) -> Result<Account, TrackerError> {
        let username = validate_name("username", username)?;
        let email = validate_email(email)?;
        require("password", password)?;
        if self.store.find_account_id_by_email(&email)?.is_some() {
            return Err(TrackerError::DuplicateAccount(email));
        }
        let hash = self.credentials.hash(password)?;
        let id = self.store.next_account_id()?;
        let record = AccountRecord::new(id, &username, &email, hash, class);
        self.store.put_account(record.clone())?;
        self.establish_session(&record)
    }

    /// Load the session's record, apply `f`, persist it and refresh the
    /// session. `Ok(None)` without a session.
    pub(crate) fn modify_record<R>(
        &mut self,
        f: impl FnOnce(&mut AccountRecord) -> Result<R, TrackerError>,
    ) -> Result<Option<R>, TrackerError> {
        let Some(id) = self.session.as_ref().map(|a| a.id) else {
            return Ok(None);
        };
        let mut record = self.store.get_account(id)?;
        let out = f(&mut record)?;
        self.store.put_account(record.clone())?;
        self.establish_session(&record)?;
        Ok(Some(out))
    }

    /// Read the session's full record. `Ok(None)` without a session.
    pub(crate) fn load_record(&self) -> Result<Option<AccountRecord>, TrackerError> {
        match self.session.as_ref() {
            Some(account) => Ok(Some(self.store.get_account(account.id)?)),
            None => Ok(None),
        }
    }

    /// Award experience and apply optional gold/attribute overwrites.
    /// A zero `xp` is allowed and only applies `changes`.
    pub fn award_experience(
        &mut self,
        xp: u64,
        changes: StatChanges,
    ) -> Result<Option<AwardOutcome>, TrackerError> {
        let outcome = self.modify_record(|record| Ok(settle_award(record, xp, &changes)))?;
        if let Some(outcome) = &outcome {
            self.announce_level_ups(&outcome.level_ups);
        }
        Ok(outcome)
    }

    /// Level and rank notifications for an award that has been persisted.
    pub(crate) fn announce_level_ups(&self, level_ups: &[LevelUp]) {
        for up in level_ups {
            info!("level up: now level {} ({})", up.level, up.rank);
            self.notifier.send(
                Severity::Celebration,
                format!("LEVEL UP! You are now level {}!", up.level),
            );
            if up.ranked_up() {
                self.notifier
                    .send(Severity::Celebration, format!("RANK UP! You are now {}!", up.rank));
            }
        }
    }

    /// Overwrite profile fields on the session's account.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<Option<Account>, TrackerError> {
        if self.session.is_none() {
            return Ok(None);
        }
        let username = validate_name("username", &update.username)?;
        let email = validate_email(&update.email)?;
        if let (Some(current), Some(owner)) =
            (self.session.as_ref(), self.store.find_account_id_by_email(&email)?)
        {
            if owner != current.id {
                return self.report(Err(TrackerError::DuplicateAccount(email)), "Profile update");
            }
        }
        let updated = self.modify_record(|record| {
            record.username = username;
            record.email = email;
            if update.profile_image.is_some() {
                record.profile_image = update.profile_image;
            }
            if update.gender.is_some() {
                record.gender = update.gender;
            }
            Ok(record.to_account())
        })?;
        if updated.is_some() {
            self.notifier.send(Severity::Success, "Profile updated successfully!");
        }
        Ok(updated)
    }

    /// Clear the session and its persisted pointer.
    pub fn logout(&mut self) -> Result<(), TrackerError> {
        self.store.clear_session()?;
        if let Some(account) = self.session.take() {
            info!("logout: account {}", account.id);
            self.notifier.send(Severity::Success, "Logged out successfully");
        }
        Ok(())
    }

    pub fn remember_email(&self, email: &str) -> Result<(), TrackerError> {
        self.store.set_remembered_email(email)
    }

    pub fn forget_email(&self) -> Result<(), TrackerError> {
        self.store.clear_remembered_email()
    }

    pub fn remembered_email(&self) -> Result<Option<String>, TrackerError> {
        self.store.remembered_email()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::clock::FixedClock;
    use crate::tracker::notify::MemoryNotifier;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        notifier: MemoryNotifier,
        accounts: AccountStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TrackerStore::open(dir.path()).unwrap());
        let notifier = MemoryNotifier::new();
        let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()));
        let accounts =
            AccountStore::open(store, Arc::new(notifier.clone()), clock, Credentials::low_cost())
                .unwrap();
        Fixture {
            _dir: dir,
            notifier,
            accounts,
        }
    }

    fn stats(level: u32, rank: Rank, current_xp: u64, max_xp: u64) -> CharacterStats {
        CharacterStats {
            level,
            rank,
            strength: 8,
            intelligence: 10,
            dexterity: 8,
            current_xp,
            max_xp,
        }
    }

    #[test]
    fn level_and_rank_up_at_threshold() {
        let mut s = stats(4, Rank::D, 750, 800);
        let ups = apply_experience(&mut s, 100);
        assert_eq!((s.level, s.current_xp, s.max_xp, s.rank), (5, 50, 960, Rank::C));
        assert_eq!(ups.len(), 1);
        assert!(ups[0].ranked_up());
    }

    #[test]
    fn large_award_crosses_several_levels() {
        let mut s = stats(1, Rank::E, 0, 800);
        let ups = apply_experience(&mut s, 800 + 960 + 10);
        assert_eq!(ups.len(), 2);
        assert_eq!(s.level, 3);
        assert_eq!(s.rank, Rank::D);
        assert_eq!(s.current_xp, 10);
        assert_eq!(s.max_xp, 1152);
    }

    #[test]
    fn zero_award_changes_nothing() {
        let mut s = stats(2, Rank::E, 5, 960);
        assert!(apply_experience(&mut s, 0).is_empty());
        assert_eq!(s, stats(2, Rank::E, 5, 960));
    }

    #[test]
    fn settled_xp_stays_below_threshold() {
        let mut s = stats(1, Rank::E, 0, 800);
        let mut last_level = s.level;
        for xp in [0u64, 1, 799, 5000, 123, 40_000, 7, 960, 0, 250_000] {
            apply_experience(&mut s, xp);
            assert!(s.current_xp < s.max_xp);
            assert!(s.level >= last_level);
            last_level = s.level;
        }
    }

    #[test]
    fn award_without_session_is_a_noop() {
        let mut fx = fixture();
        assert_eq!(fx.accounts.award_experience(500, StatChanges::gold(1)).unwrap(), None);
        assert!(fx.notifier.drain().is_empty());
    }

    #[test]
    fn award_only_overwrites_present_fields() {
        let mut fx = fixture();
        fx.accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::RookieHunter)
            .unwrap();
        let changes = StatChanges {
            strength: Some(13),
            ..StatChanges::default()
        };
        fx.accounts.award_experience(0, changes).unwrap();
        let account = fx.accounts.current().unwrap();
        assert_eq!(account.stats.strength, 13);
        assert_eq!(account.stats.intelligence, 10);
        assert_eq!(account.gold, 500);
    }

    #[test]
    fn award_fires_level_and_rank_notifications() {
        let mut fx = fixture();
        fx.accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::RookieHunter)
            .unwrap();
        fx.accounts
            .modify_record(|r| {
                r.stats = stats(4, Rank::D, 750, 800);
                Ok(())
            })
            .unwrap();
        fx.notifier.drain();

        let outcome = fx.accounts.award_experience(100, StatChanges::default()).unwrap().unwrap();
        assert_eq!(outcome.level, 5);
        assert_eq!(outcome.rank, Rank::C);
        let messages: Vec<String> = fx.notifier.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec!["LEVEL UP! You are now level 5!", "RANK UP! You are now C-RANK!"]
        );
    }

    #[test]
    fn duplicate_email_is_rejected_case_insensitively() {
        let mut fx = fixture();
        fx.accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::MageHunter)
            .unwrap();
        fx.accounts.logout().unwrap();
        let err = fx
            .accounts
            .register("Other", "JINWOO@hunters.kr", "pw2", CharacterClass::MageHunter)
            .unwrap_err();
        assert!(matches!(err, TrackerError::DuplicateAccount(_)));
        assert!(!fx.accounts.is_authenticated());
        assert_eq!(fx.notifier.count(Severity::Error), 1);
    }

    #[test]
    fn profile_update_keeps_unspecified_image() {
        let mut fx = fixture();
        fx.accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::RookieHunter)
            .unwrap();
        fx.accounts
            .update_profile(ProfileUpdate {
                username: "Sung Jinwoo".into(),
                email: "monarch@hunters.kr".into(),
                profile_image: Some("avatars/jinwoo.png".into()),
                gender: Some(Gender::Male),
            })
            .unwrap();
        let updated = fx
            .accounts
            .update_profile(ProfileUpdate {
                username: "Sung Jinwoo".into(),
                email: "monarch@hunters.kr".into(),
                ..ProfileUpdate::default()
            })
            .unwrap()
            .unwrap();
        assert_eq!(updated.profile_image.as_deref(), Some("avatars/jinwoo.png"));
        assert_eq!(updated.gender, Some(Gender::Male));
        assert_eq!(updated.email, "monarch@hunters.kr");
    }

    #[test]
    fn profile_update_without_session_is_a_noop() {
        let mut fx = fixture();
        let updated = fx
            .accounts
            .update_profile(ProfileUpdate {
                username: String::new(),
                email: "not-an-email".into(),
                ..ProfileUpdate::default()
            })
            .unwrap();
        assert_eq!(updated, None);
        assert_eq!(fx.notifier.count(Severity::Error), 0);
    }

    #[test]
    fn profile_update_rejects_empty_username() {
        let mut fx = fixture();
        fx.accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::RookieHunter)
            .unwrap();
        let err = fx
            .accounts
            .update_profile(ProfileUpdate {
                username: " ".into(),
                email: "jinwoo@hunters.kr".into(),
                ..ProfileUpdate::default()
            })
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }
}
