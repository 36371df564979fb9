/// Shadow army roster: friends listed alongside the hunter.
///
/// Friends are not linked accounts. Adding one records the name and email and
/// rolls a class, level and attributes for display.
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::tracker::account::AccountStore;
use crate::tracker::errors::TrackerError;
use crate::tracker::notify::{NotifierExt, Severity};
use crate::tracker::types::{CharacterClass, Friend};
use crate::validation::{validate_email, validate_name, FieldError};

/// Add a friend to the session account's roster. `Ok(None)` without a session.
pub fn add_friend(
    accounts: &mut AccountStore,
    name: &str,
    email: &str,
) -> Result<Option<Friend>, TrackerError> {
    add_friend_with_rng(accounts, name, email, &mut rand::thread_rng())
}

pub fn add_friend_with_rng<R: Rng + ?Sized>(
    accounts: &mut AccountStore,
    name: &str,
    email: &str,
    rng: &mut R,
) -> Result<Option<Friend>, TrackerError> {
    let validated = validate_name("friend name", name)
        .and_then(|name| validate_email(email).map(|email| (name, email)));
    let (name, email) = match validated {
        Ok(fields) => fields,
        Err(err) => {
            let message = match err {
                FieldError::Required { field: "friend name" } => {
                    "Please enter a name for your friend".to_string()
                }
                FieldError::Required { .. } | FieldError::InvalidEmail { .. } => {
                    "Please enter a valid email for your friend".to_string()
                }
                ref other => other.to_string(),
            };
            accounts.notifier().send(Severity::Error, message);
            return Err(err.into());
        }
    };

    let now = accounts.clock().now();
    let class = CharacterClass::ALL
        .choose(rng)
        .copied()
        .unwrap_or(CharacterClass::RookieHunter);
    let friend = accounts.modify_record(|record| {
        let friend = Friend {
            id: record.friends.iter().map(|f| f.id).max().unwrap_or(0) + 1,
            name,
            email,
            level: rng.gen_range(1..=10),
            character_class: class,
            strength: rng.gen_range(1..=10),
            intelligence: rng.gen_range(1..=10),
            dexterity: rng.gen_range(1..=10),
            online: rng.gen_bool(0.5),
            last_active: now,
        };
        record.friends.push(friend.clone());
        Ok(friend)
    })?;

    if let Some(friend) = &friend {
        info!("roster: added friend {} ({})", friend.id, friend.character_class);
        accounts.notifier().send(
            Severity::Success,
            format!("{} has been added to your Shadow army!", friend.name),
        );
    }
    Ok(friend)
}

/// Remove a friend by id. Returns the removed friend, or `None` when there is
/// no session or no such friend.
pub fn remove_friend(accounts: &mut AccountStore, friend_id: u64) -> Result<Option<Friend>, TrackerError> {
    let present = list_friends(accounts)?.iter().any(|f| f.id == friend_id);
    if !present {
        return Ok(None);
    }
    let removed = accounts
        .modify_record(|record| {
            let pos = record.friends.iter().position(|f| f.id == friend_id);
            Ok(pos.map(|p| record.friends.remove(p)))
        })?
        .flatten();
    if let Some(friend) = &removed {
        accounts.notifier().send(
            Severity::Success,
            format!("{} has been removed from your Shadow army.", friend.name),
        );
    }
    Ok(removed)
}

pub fn list_friends(accounts: &AccountStore) -> Result<Vec<Friend>, TrackerError> {
    Ok(accounts
        .load_record()?
        .map(|record| record.friends)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::clock::FixedClock;
    use crate::tracker::credentials::Credentials;
    use crate::tracker::notify::MemoryNotifier;
    use crate::tracker::storage::TrackerStore;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn registered() -> (TempDir, MemoryNotifier, AccountStore) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(TrackerStore::open(dir.path()).unwrap());
        let notifier = MemoryNotifier::new();
        let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()));
        let mut accounts =
            AccountStore::open(store, Arc::new(notifier.clone()), clock, Credentials::low_cost())
                .unwrap();
        accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::ShadowMonarch)
            .unwrap();
        notifier.drain();
        (dir, notifier, accounts)
    }

    #[test]
    fn added_friends_get_rolled_stats_in_range() {
        let (_dir, _n, mut accounts) = registered();
        let mut rng = StdRng::seed_from_u64(7);
        let friend = add_friend_with_rng(&mut accounts, "Igris", "igris@shadows.kr", &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(friend.id, 1);
        assert!((1..=10).contains(&friend.level));
        assert!((1..=10).contains(&friend.strength));
        assert!((1..=10).contains(&friend.dexterity));
        let second = add_friend(&mut accounts, "Beru", "beru@shadows.kr").unwrap().unwrap();
        assert_eq!(second.id, 2);
        assert_eq!(list_friends(&accounts).unwrap().len(), 2);
    }

    #[test]
    fn name_and_email_are_validated() {
        let (_dir, notifier, mut accounts) = registered();
        let err = add_friend(&mut accounts, "  ", "igris@shadows.kr").unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        let err = add_friend(&mut accounts, "Igris", "igris").unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        let messages: Vec<String> = notifier.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(
            messages,
            vec![
                "Please enter a name for your friend",
                "Please enter a valid email for your friend"
            ]
        );
        assert!(list_friends(&accounts).unwrap().is_empty());
    }

    #[test]
    fn remove_friend_returns_removed_entry() {
        let (_dir, _n, mut accounts) = registered();
        let friend = add_friend(&mut accounts, "Tank", "tank@shadows.kr").unwrap().unwrap();
        assert_eq!(remove_friend(&mut accounts, 9).unwrap(), None);
        let removed = remove_friend(&mut accounts, friend.id).unwrap().unwrap();
        assert_eq!(removed.name, "Tank");
        assert!(list_friends(&accounts).unwrap().is_empty());
    }
}
