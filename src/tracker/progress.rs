//! Progress store: habits, quests and badges for the session account.
//!
//! Streaks and badges are derived here from completion events; experience and
//! gold are applied through the [`AccountStore`]. Every mutation rewrites the
//! whole habit, quest and badge collections into the account record.

use chrono::NaiveDate;
use log::{debug, info, warn};

use crate::tracker::account::AccountStore;
use crate::tracker::badges::{
    achievement_badge, has_achievement_badge, has_level_badge, has_streak_badge,
    is_streak_milestone, level_badge, streak_badge, streak_bonus_xp,
};
use crate::tracker::errors::TrackerError;
use crate::tracker::notify::{NotifierExt, Severity};
use crate::tracker::types::{Badge, Habit, Quest, StatChanges};
use crate::validation::{validate_name, validate_reward, validate_text, TextRules};

/// What [`ProgressStore::complete_habit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HabitToggle {
    Completed {
        streak: u32,
        /// Milestone whose streak badge was created by this completion.
        milestone: Option<u32>,
        xp_awarded: u64,
        gold_awarded: u64,
    },
    Uncompleted {
        streak: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestCompletion {
    pub quest_id: u64,
    pub xp_awarded: u64,
    pub gold_awarded: u64,
    pub badge: Badge,
}

fn next_id<I: Iterator<Item = u64>>(ids: I) -> u64 {
    ids.max().unwrap_or(0) + 1
}

#[derive(Debug, Default)]
pub struct ProgressStore {
    account_id: Option<u64>,
    habits: Vec<Habit>,
    quests: Vec<Quest>,
    badges: Vec<Badge>,
}

impl ProgressStore {
    /// Load the session account's collections and run the session-start
    /// checks: missed-day streak resets and level badge derivation. Without a
    /// session the store is empty and every operation is a no-op.
    pub fn load(accounts: &AccountStore) -> Result<Self, TrackerError> {
        Self::load_with_resets(accounts).map(|(progress, _)| progress)
    }

    /// [`ProgressStore::load`], also returning the ids of habits whose streak
    /// the session-start check broke.
    pub fn load_with_resets(accounts: &AccountStore) -> Result<(Self, Vec<u64>), TrackerError> {
        let Some(record) = accounts.load_record()? else {
            return Ok((Self::default(), Vec::new()));
        };
        let mut progress = Self {
            account_id: Some(record.id),
            habits: record.habits,
            quests: record.quests,
            badges: record.badges,
        };
        let broken = progress.reset_streak_if_needed(accounts)?;
        progress.sync_level_badge(accounts)?;
        Ok((progress, broken))
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn habit(&self, habit_id: u64) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == habit_id)
    }

    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    pub fn badges(&self) -> &[Badge] {
        &self.badges
    }

    /// True when this store belongs to the account currently signed in.
    fn is_active(&self, accounts: &AccountStore) -> bool {
        match (self.account_id, accounts.current()) {
            (Some(id), Some(account)) => account.id == id,
            _ => false,
        }
    }

    fn persist(&self, accounts: &AccountStore) -> Result<(), TrackerError> {
        let Some(id) = self.account_id else {
            return Ok(());
        };
        let store = accounts.store();
        let mut record = store.get_account(id)?;
        record.habits = self.habits.clone();
        record.quests = self.quests.clone();
        record.badges = self.badges.clone();
        store.put_account(record)?;
        debug!(
            "progress persisted for account {}: {} habits, {} quests, {} badges",
            id,
            self.habits.len(),
            self.quests.len(),
            self.badges.len()
        );
        Ok(())
    }

    pub fn add_habit(
        &mut self,
        accounts: &AccountStore,
        name: &str,
        icon: &str,
        xp_reward: u32,
    ) -> Result<Option<Habit>, TrackerError> {
        if !self.is_active(accounts) {
            return Ok(None);
        }
        let name = validate_name("habit name", name)?;
        let icon = validate_name("icon", icon)?;
        let xp_reward = validate_reward("xp reward", xp_reward)?;
        let habit = Habit::new(next_id(self.habits.iter().map(|h| h.id)), &name, &icon, xp_reward);
        self.habits.push(habit.clone());
        self.persist(accounts)?;
        accounts
            .notifier()
            .send(Severity::Success, format!("New habit \"{}\" created!", habit.name));
        Ok(Some(habit))
    }

    /// Toggle a habit's completion for `day`.
    ///
    /// A day already in the set is removed again. Streaks only move when `day`
    /// is today: completing extends the streak when yesterday was done (or
    /// starts it from zero), uncompleting gives a day back when yesterday was
    /// not done. Completing always pays the habit's XP plus half of it in gold.
    pub fn complete_habit(
        &mut self,
        accounts: &mut AccountStore,
        habit_id: u64,
        day: NaiveDate,
    ) -> Result<Option<HabitToggle>, TrackerError> {
        if !self.is_active(accounts) {
            return Ok(None);
        }
        let today = accounts.clock().today();
        let yesterday = accounts.clock().yesterday();
        let is_today = day == today;

        let habit = self
            .habits
            .iter_mut()
            .find(|h| h.id == habit_id)
            .ok_or_else(|| TrackerError::NotFound(format!("habit: {}", habit_id)))?;
        let yesterday_done = habit.is_completed_on(yesterday);

        if habit.completed_days.remove(&day) {
            if is_today && !yesterday_done && habit.streak > 0 {
                habit.streak -= 1;
            }
            habit.last_completed_date = habit.completed_days.iter().next_back().copied();
            let streak = habit.streak;
            let message = format!("Marked \"{}\" as incomplete for {}", habit.name, day);
            self.persist(accounts)?;
            accounts.notifier().send(Severity::Info, message);
            return Ok(Some(HabitToggle::Uncompleted { streak }));
        }

        habit.completed_days.insert(day);
        let mut new_badge = None;
        if is_today {
            if yesterday_done || habit.streak == 0 {
                habit.streak += 1;
                if is_streak_milestone(habit.streak)
                    && !has_streak_badge(&self.badges, habit.id, habit.streak)
                {
                    new_badge = Some(streak_badge(habit, habit.streak, accounts.clock().now()));
                }
            }
            habit.last_completed_date = Some(today);
        }
        let (name, xp_reward, streak) = (habit.name.clone(), habit.xp_reward, habit.streak);

        let mut xp_awarded = 0u64;
        let milestone = match new_badge {
            Some(badge) => {
                let bonus = streak_bonus_xp(xp_reward, streak);
                self.badges.push(badge);
                info!("habit {} reached a {} day streak", habit_id, streak);
                accounts.notifier().send(
                    Severity::Celebration,
                    format!("{} DAY STREAK! \"{}\" +{} bonus XP!", streak, name, bonus),
                );
                accounts.award_experience(bonus, StatChanges::default())?;
                xp_awarded += bonus;
                Some(streak)
            }
            None => None,
        };

        accounts.notifier().send(
            Severity::Success,
            format!("Completed \"{}\" for {}! +{} XP", name, day, xp_reward),
        );
        accounts.award_experience(u64::from(xp_reward), StatChanges::default())?;
        xp_awarded += u64::from(xp_reward);

        let gold_awarded = u64::from(xp_reward / 2);
        accounts.award_experience(0, StatChanges::gold(accounts.gold() + gold_awarded))?;
        accounts
            .notifier()
            .send(Severity::Success, format!("Earned {} gold!", gold_awarded));

        self.derive_level_badge(accounts);
        self.persist(accounts)?;
        Ok(Some(HabitToggle::Completed {
            streak,
            milestone,
            xp_awarded,
            gold_awarded,
        }))
    }

    /// Zero the streak of every habit that was neither completed today nor
    /// last completed yesterday. Returns the ids of habits whose streak was
    /// broken. Running it again without new completions changes nothing.
    pub fn reset_streak_if_needed(&mut self, accounts: &AccountStore) -> Result<Vec<u64>, TrackerError> {
        if !self.is_active(accounts) {
            return Ok(Vec::new());
        }
        let today = accounts.clock().today();
        let yesterday = accounts.clock().yesterday();
        let mut broken = Vec::new();

        for habit in &mut self.habits {
            let Some(last) = habit.last_completed_date else {
                continue;
            };
            if habit.is_completed_on(today) || last == yesterday || habit.streak == 0 {
                continue;
            }
            if habit.streak >= 3 {
                warn!("habit {} lost a {} day streak", habit.id, habit.streak);
                accounts.notifier().send(
                    Severity::Warning,
                    format!(
                        "Oh no! You broke your {} day streak for \"{}\"",
                        habit.streak, habit.name
                    ),
                );
            }
            habit.streak = 0;
            broken.push(habit.id);
        }

        if !broken.is_empty() {
            self.persist(accounts)?;
        }
        Ok(broken)
    }

    pub fn add_quest(
        &mut self,
        accounts: &AccountStore,
        name: &str,
        description: &str,
        xp_reward: u32,
    ) -> Result<Option<Quest>, TrackerError> {
        if !self.is_active(accounts) {
            return Ok(None);
        }
        let name = validate_name("quest name", name)?;
        let description = validate_text("description", description, &TextRules::description())?;
        let xp_reward = validate_reward("xp reward", xp_reward)?;
        let quest = Quest::new(
            next_id(self.quests.iter().map(|q| q.id)),
            &name,
            &description,
            xp_reward,
        );
        self.quests.push(quest.clone());
        self.persist(accounts)?;
        accounts
            .notifier()
            .send(Severity::Success, format!("New quest \"{}\" created!", quest.name));
        Ok(Some(quest))
    }

    /// Complete an open quest: XP, the same amount in gold, and an
    /// achievement badge. Unknown or already completed quests are ignored.
    pub fn complete_quest(
        &mut self,
        accounts: &mut AccountStore,
        quest_id: u64,
    ) -> Result<Option<QuestCompletion>, TrackerError> {
        if !self.is_active(accounts) {
            return Ok(None);
        }
        let Some(quest) = self
            .quests
            .iter_mut()
            .find(|q| q.id == quest_id && !q.completed)
        else {
            return Ok(None);
        };
        quest.completed = true;
        let quest = quest.clone();

        let xp = u64::from(quest.xp_reward);
        accounts.notifier().send(
            Severity::Success,
            format!("Quest \"{}\" completed! +{} XP", quest.name, xp),
        );
        accounts.award_experience(xp, StatChanges::default())?;
        accounts.award_experience(0, StatChanges::gold(accounts.gold() + xp))?;
        accounts
            .notifier()
            .send(Severity::Success, format!("Earned {} gold!", xp));

        let badge = achievement_badge(&quest, accounts.clock().now());
        if !has_achievement_badge(&self.badges, quest.id) {
            self.badges.push(badge.clone());
        }
        info!("quest {} completed", quest.id);

        self.derive_level_badge(accounts);
        self.persist(accounts)?;
        Ok(Some(QuestCompletion {
            quest_id,
            xp_awarded: xp,
            gold_awarded: xp,
            badge,
        }))
    }

    fn derive_level_badge(&mut self, accounts: &AccountStore) -> Option<Badge> {
        if !self.is_active(accounts) {
            return None;
        }
        let level = accounts.current()?.stats.level;
        if level <= 1 || has_level_badge(&self.badges, level) {
            return None;
        }
        let badge = level_badge(level, accounts.clock().now());
        self.badges.push(badge.clone());
        accounts.notifier().send(
            Severity::Celebration,
            format!("New Badge Earned: Level {} Hunter!", level),
        );
        Some(badge)
    }

    /// Create the level badge for the session's current level if it is above
    /// 1 and not yet awarded. Call after anything outside this store changes
    /// the level (store purchases).
    pub fn sync_level_badge(&mut self, accounts: &AccountStore) -> Result<Option<Badge>, TrackerError> {
        let badge = self.derive_level_badge(accounts);
        if badge.is_some() {
            self.persist(accounts)?;
        }
        Ok(badge)
    }

    /// Mark the daily quest as started today. Returns false if it already was.
    pub fn start_daily_quest(&self, accounts: &AccountStore) -> Result<bool, TrackerError> {
        if self.daily_quest_started_today(accounts)? {
            return Ok(false);
        }
        accounts.store().set_daily_quest_day(accounts.clock().today())?;
        accounts.notifier().send(
            Severity::Success,
            "Daily quest started! Complete your habits to earn rewards.",
        );
        Ok(true)
    }

    pub fn daily_quest_started_today(&self, accounts: &AccountStore) -> Result<bool, TrackerError> {
        let today = accounts.clock().today();
        Ok(accounts.store().daily_quest_day()? == Some(today))
    }
}
