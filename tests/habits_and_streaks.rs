//! Habit completion, streak milestones and day rollover.

mod common;

use common::{day, Harness};
use hunterlog::tracker::{BadgeKind, CharacterClass, Clock, HabitToggle, ProgressStore, Severity};

fn with_habit(xp: u32) -> (Harness, ProgressStore, u64) {
    let h = Harness::registered(CharacterClass::RookieHunter);
    let mut progress = ProgressStore::load(&h.accounts).unwrap();
    let habit = progress
        .add_habit(&h.accounts, "Push-ups", "dumbbell", xp)
        .unwrap()
        .unwrap();
    h.notifier.drain();
    (h, progress, habit.id)
}

fn complete_today(h: &mut Harness, progress: &mut ProgressStore, id: u64) -> HabitToggle {
    let today = h.clock.today();
    progress
        .complete_habit(&mut h.accounts, id, today)
        .unwrap()
        .unwrap()
}

#[test]
fn third_consecutive_day_earns_streak_badge_and_bonus() {
    let (mut h, mut progress, id) = with_habit(50);
    complete_today(&mut h, &mut progress, id);
    h.clock.advance_days(1);
    complete_today(&mut h, &mut progress, id);
    h.clock.advance_days(1);
    assert_eq!(progress.habit(id).unwrap().streak, 2);

    let toggle = complete_today(&mut h, &mut progress, id);
    assert_eq!(
        toggle,
        HabitToggle::Completed {
            streak: 3,
            milestone: Some(3),
            xp_awarded: 100,
            gold_awarded: 25,
        }
    );
    let streak_badges: Vec<_> = progress
        .badges()
        .iter()
        .filter(|b| matches!(b.kind, BadgeKind::Streak { milestone: 3, .. }))
        .collect();
    assert_eq!(streak_badges.len(), 1);
    let account = h.accounts.current().unwrap();
    assert_eq!(account.stats.current_xp, 50 + 50 + 100);
    assert_eq!(account.gold, 500 + 3 * 25);
}

#[test]
fn streak_badge_is_created_at_most_once() {
    let (mut h, mut progress, id) = with_habit(40);
    for _ in 0..3 {
        complete_today(&mut h, &mut progress, id);
        h.clock.advance_days(1);
    }
    // Skip two days, then rebuild the streak.
    h.clock.advance_days(2);
    let mut progress = ProgressStore::load(&h.accounts).unwrap();
    assert_eq!(progress.habit(id).unwrap().streak, 0);

    let mut last = None;
    for _ in 0..3 {
        last = Some(complete_today(&mut h, &mut progress, id));
        h.clock.advance_days(1);
    }
    assert_eq!(
        last,
        Some(HabitToggle::Completed {
            streak: 3,
            milestone: None,
            xp_awarded: 40,
            gold_awarded: 20,
        })
    );
    let streak_badges = progress
        .badges()
        .iter()
        .filter(|b| matches!(b.kind, BadgeKind::Streak { .. }))
        .count();
    assert_eq!(streak_badges, 1);
}

#[test]
fn reset_is_idempotent() {
    let (mut h, mut progress, id) = with_habit(30);
    for _ in 0..4 {
        complete_today(&mut h, &mut progress, id);
        h.clock.advance_days(1);
    }
    h.clock.advance_days(1);

    assert_eq!(progress.reset_streak_if_needed(&h.accounts).unwrap(), vec![id]);
    let after_first = progress.habits().to_vec();
    assert!(h
        .messages()
        .iter()
        .any(|m| m.contains("streak") && m.contains("Push-ups")));

    assert!(progress.reset_streak_if_needed(&h.accounts).unwrap().is_empty());
    assert_eq!(progress.habits(), after_first.as_slice());
    assert!(h.messages().is_empty());
}

#[test]
fn double_toggle_restores_completed_days() {
    let (mut h, mut progress, id) = with_habit(30);
    let yesterday = day(2024, 6, 9);
    progress.complete_habit(&mut h.accounts, id, yesterday).unwrap();
    let before = progress.habit(id).unwrap().completed_days.clone();

    complete_today(&mut h, &mut progress, id);
    let toggle = complete_today(&mut h, &mut progress, id);
    assert_eq!(toggle, HabitToggle::Uncompleted { streak: 1 });
    assert_eq!(progress.habit(id).unwrap().completed_days, before);
    assert_eq!(progress.habit(id).unwrap().last_completed_date, Some(yesterday));
}

#[test]
fn uncompleting_today_keeps_streak_when_yesterday_is_done() {
    let (mut h, mut progress, id) = with_habit(30);
    complete_today(&mut h, &mut progress, id);
    h.clock.advance_days(1);
    complete_today(&mut h, &mut progress, id);
    assert_eq!(progress.habit(id).unwrap().streak, 2);

    let toggle = complete_today(&mut h, &mut progress, id);
    assert_eq!(toggle, HabitToggle::Uncompleted { streak: 2 });
    let habit = progress.habit(id).unwrap();
    assert_eq!(habit.streak, 2);
    assert_eq!(habit.last_completed_date, Some(day(2024, 6, 10)));
}

#[test]
fn short_streak_resets_without_a_warning() {
    let (mut h, mut progress, id) = with_habit(30);
    complete_today(&mut h, &mut progress, id);
    h.clock.advance_days(1);
    complete_today(&mut h, &mut progress, id);
    h.notifier.drain();

    h.clock.advance_days(2);
    assert_eq!(progress.reset_streak_if_needed(&h.accounts).unwrap(), vec![id]);
    assert_eq!(progress.habit(id).unwrap().streak, 0);
    assert_eq!(h.notifier.count(Severity::Warning), 0);
    assert!(h.messages().is_empty());
}

#[test]
fn progress_is_persisted_in_the_account_record() {
    let (mut h, mut progress, id) = with_habit(30);
    complete_today(&mut h, &mut progress, id);
    let h = h.reopen();
    let progress = ProgressStore::load(&h.accounts).unwrap();
    let habit = progress.habit(id).unwrap();
    assert_eq!(habit.streak, 1);
    assert!(habit.is_completed_on(day(2024, 6, 10)));
}
