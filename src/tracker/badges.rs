/// Badge construction and the scales badges are drawn from.
///
/// Three kinds exist: level badges (one per level reached above 1), streak
/// badges (one per habit and milestone) and achievement badges (one per
/// completed quest).
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::tracker::types::{Badge, BadgeColor, BadgeIcon, BadgeKind, Habit, Quest};

/// Streak lengths that earn a badge.
pub const STREAK_MILESTONES: [u32; 6] = [3, 7, 14, 30, 60, 100];

pub fn is_streak_milestone(streak: u32) -> bool {
    STREAK_MILESTONES.contains(&streak)
}

/// Bonus XP for reaching a streak milestone: the habit reward scaled by a
/// third of the streak, rounded down.
pub fn streak_bonus_xp(xp_reward: u32, streak: u32) -> u64 {
    u64::from(xp_reward) * u64::from(streak) / 3
}

pub fn level_badge_icon(level: u32) -> BadgeIcon {
    if level >= 10 {
        BadgeIcon::Trophy
    } else {
        BadgeIcon::Star
    }
}

pub fn level_badge_color(level: u32) -> BadgeColor {
    match level {
        l if l >= 20 => BadgeColor::Purple,
        l if l >= 15 => BadgeColor::Amber,
        l if l >= 10 => BadgeColor::Cyan,
        l if l >= 5 => BadgeColor::Green,
        _ => BadgeColor::Blue,
    }
}

pub fn streak_badge_icon(streak: u32) -> BadgeIcon {
    match streak {
        s if s >= 100 => BadgeIcon::Trophy,
        s if s >= 30 => BadgeIcon::Award,
        s if s >= 14 => BadgeIcon::Sword,
        _ => BadgeIcon::Zap,
    }
}

pub fn streak_badge_color(streak: u32) -> BadgeColor {
    match streak {
        s if s >= 100 => BadgeColor::Purple,
        s if s >= 60 => BadgeColor::Amber,
        s if s >= 30 => BadgeColor::Cyan,
        s if s >= 14 => BadgeColor::Green,
        _ => BadgeColor::Blue,
    }
}

fn badge_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

pub fn level_badge(level: u32, earned_at: DateTime<Utc>) -> Badge {
    Badge {
        id: badge_id(&format!("level-{}", level)),
        name: format!("Level {}", level),
        description: format!("Reached Hunter Level {}", level),
        icon: level_badge_icon(level),
        color: level_badge_color(level),
        kind: BadgeKind::Level { level },
        earned_at,
    }
}

pub fn streak_badge(habit: &Habit, milestone: u32, earned_at: DateTime<Utc>) -> Badge {
    Badge {
        id: badge_id(&format!("streak-{}-{}", habit.id, milestone)),
        name: format!("{} Day Streak", milestone),
        description: format!("Completed \"{}\" for {} days in a row!", habit.name, milestone),
        icon: streak_badge_icon(milestone),
        color: streak_badge_color(milestone),
        kind: BadgeKind::Streak {
            habit_id: habit.id,
            milestone,
        },
        earned_at,
    }
}

pub fn achievement_badge(quest: &Quest, earned_at: DateTime<Utc>) -> Badge {
    Badge {
        id: badge_id(&format!("quest-{}", quest.id)),
        name: quest.name.clone(),
        description: format!("Completed the quest: {}", quest.name),
        icon: BadgeIcon::Shield,
        color: BadgeColor::Green,
        kind: BadgeKind::Achievement { quest_id: quest.id },
        earned_at,
    }
}

pub fn has_level_badge(badges: &[Badge], level: u32) -> bool {
    badges
        .iter()
        .any(|b| matches!(b.kind, BadgeKind::Level { level: l } if l == level))
}

pub fn has_streak_badge(badges: &[Badge], habit_id: u64, milestone: u32) -> bool {
    badges.iter().any(|b| {
        matches!(b.kind, BadgeKind::Streak { habit_id: h, milestone: m } if h == habit_id && m == milestone)
    })
}

pub fn has_achievement_badge(badges: &[Badge], quest_id: u64) -> bool {
    badges
        .iter()
        .any(|b| matches!(b.kind, BadgeKind::Achievement { quest_id: q } if q == quest_id))
}

/// Short label for listings.
pub fn kind_label(kind: &BadgeKind) -> &'static str {
    match kind {
        BadgeKind::Level { .. } => "level",
        BadgeKind::Streak { .. } => "streak",
        BadgeKind::Achievement { .. } => "achievement",
    }
}
