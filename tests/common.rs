//! Test utilities & fixtures.
//! Builds throwaway record stores with a fixed clock and an in-memory notifier.

use std::sync::Arc;

use chrono::NaiveDate;
use hunterlog::tracker::{
    AccountStore, CharacterClass, Credentials, FixedClock, MemoryNotifier, TrackerStore,
};
use tempfile::TempDir;

pub struct Harness {
    pub dir: TempDir,
    pub clock: Arc<FixedClock>,
    pub notifier: MemoryNotifier,
    pub accounts: AccountStore,
}

#[allow(dead_code)]
pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

impl Harness {
    /// Fresh store, nobody logged in, clock on 2024-06-10.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = Arc::new(FixedClock::new(day(2024, 6, 10)));
        let notifier = MemoryNotifier::new();
        let accounts = open(&dir, &clock, &notifier);
        Harness {
            dir,
            clock,
            notifier,
            accounts,
        }
    }

    /// Fresh store with a logged-in account and an empty notification log.
    #[allow(dead_code)]
    pub fn registered(class: CharacterClass) -> Self {
        let mut harness = Harness::new();
        harness
            .accounts
            .register("Jinwoo", "jinwoo@hunters.kr", "arise", class)
            .unwrap();
        harness.notifier.drain();
        harness
    }

    /// Close the store and open it again from disk, as a restarted app would.
    #[allow(dead_code)]
    pub fn reopen(self) -> Self {
        let Harness {
            dir,
            clock,
            notifier,
            accounts,
        } = self;
        drop(accounts);
        let accounts = open(&dir, &clock, &notifier);
        Harness {
            dir,
            clock,
            notifier,
            accounts,
        }
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> Vec<String> {
        self.notifier.drain().into_iter().map(|n| n.message).collect()
    }
}

fn open(dir: &TempDir, clock: &Arc<FixedClock>, notifier: &MemoryNotifier) -> AccountStore {
    let store = Arc::new(TrackerStore::open(dir.path().join("hunterlog")).unwrap());
    AccountStore::open(
        store,
        Arc::new(notifier.clone()),
        clock.clone(),
        Credentials::low_cost(),
    )
    .unwrap()
}
