//! Midnight streak-reset scheduler.
//!
//! Sleeps until the next local calendar boundary, runs the streak reset on the
//! session's progress, and repeats until shutdown. The boundary math is kept
//! separate from the loop so it can be checked against fixed instants.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use log::{debug, info};

use crate::tracker::account::AccountStore;
use crate::tracker::progress::ProgressStore;

/// Slack added after midnight so the clock reliably reports the new day.
const ROLLOVER_SLACK: Duration = Duration::from_secs(1);

/// Fallback wait when the next midnight cannot be resolved in `now`'s zone.
const RETRY_INTERVAL: Duration = Duration::from_secs(3600);

/// Time from `now` until the start of the next calendar day in the same zone.
///
/// Midnights skipped by a daylight-saving change resolve to `None` in the
/// zone; the retry interval is returned for those.
pub fn duration_until_next_midnight<Tz: TimeZone>(now: &DateTime<Tz>) -> Duration {
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| now.timezone().from_local_datetime(&midnight).earliest());
    match next {
        Some(next) => next
            .signed_duration_since(now.clone())
            .to_std()
            .unwrap_or(RETRY_INTERVAL),
        None => RETRY_INTERVAL,
    }
}

/// Result of a scheduler run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SchedulerReport {
    /// Midnight boundaries processed.
    pub rollovers: u32,
    /// Habit ids whose streak was reset, across all rollovers.
    pub reset_habits: Vec<u64>,
}

/// One day rollover: open the account store, run the streak reset for the
/// persisted session, and close the store again before returning.
///
/// The record store is only held for the duration of the call, so other
/// processes can use it between rollovers.
pub fn rollover<O>(open: &mut O) -> Result<Vec<u64>>
where
    O: FnMut() -> Result<AccountStore>,
{
    let accounts = open()?;
    let (_, broken) = ProgressStore::load_with_resets(&accounts)?;
    drop(accounts);
    Ok(broken)
}

/// Run [`rollover`] at every local midnight until Ctrl-C.
pub async fn run_until_ctrl_c<O>(open: O) -> Result<SchedulerReport>
where
    O: FnMut() -> Result<AccountStore>,
{
    run_with_shutdown(open, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to listen for ctrl-c: {}", e);
        }
    })
    .await
}

/// Run [`rollover`] at every local midnight until `shutdown` resolves.
pub async fn run_with_shutdown<O, F>(mut open: O, shutdown: F) -> Result<SchedulerReport>
where
    O: FnMut() -> Result<AccountStore>,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut report = SchedulerReport::default();
    loop {
        let wait = duration_until_next_midnight(&Local::now()) + ROLLOVER_SLACK;
        debug!("next streak check in {}s", wait.as_secs());
        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let reset = rollover(&mut open)?;
                report.rollovers += 1;
                info!("day rollover: {} streak(s) reset", reset.len());
                report.reset_habits.extend(reset);
            }
            _ = &mut shutdown => {
                info!("streak scheduler stopping after {} rollover(s)", report.rollovers);
                return Ok(report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn counts_down_to_utc_midnight() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 23, 59, 30).unwrap();
        assert_eq!(duration_until_next_midnight(&now), Duration::from_secs(30));
    }

    #[test]
    fn exactly_midnight_waits_a_full_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        assert_eq!(duration_until_next_midnight(&now), Duration::from_secs(86_400));
    }

    #[test]
    fn uses_the_zone_of_now() {
        let zone = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = zone.with_ymd_and_hms(2024, 12, 31, 22, 0, 0).unwrap();
        assert_eq!(duration_until_next_midnight(&now), Duration::from_secs(7200));
    }

    mod rollovers {
        use super::super::*;
        use crate::tracker::clock::{Clock, FixedClock};
        use crate::tracker::credentials::Credentials;
        use crate::tracker::notify::MemoryNotifier;
        use crate::tracker::storage::TrackerStore;
        use crate::tracker::types::CharacterClass;
        use chrono::NaiveDate;
        use std::path::Path;
        use std::sync::Arc;

        fn open_at(path: &Path, clock: &Arc<FixedClock>) -> Result<AccountStore> {
            let store = Arc::new(TrackerStore::open(path)?);
            Ok(AccountStore::open(
                store,
                Arc::new(MemoryNotifier::new()),
                clock.clone(),
                Credentials::low_cost(),
            )?)
        }

        #[test]
        fn rollover_resets_and_releases_the_store() {
            let dir = tempfile::TempDir::new().unwrap();
            let path = dir.path().join("hunterlog");
            let clock = Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()));

            let habit_id = {
                let mut accounts = open_at(&path, &clock).unwrap();
                accounts
                    .register("Jinwoo", "jinwoo@hunters.kr", "pw", CharacterClass::RookieHunter)
                    .unwrap();
                let mut progress = ProgressStore::load(&accounts).unwrap();
                let habit = progress
                    .add_habit(&accounts, "Read", "book-open", 30)
                    .unwrap()
                    .unwrap();
                let today = clock.today();
                progress.complete_habit(&mut accounts, habit.id, today).unwrap();
                habit.id
            };

            clock.advance_days(2);
            let mut open = || open_at(&path, &clock);
            assert_eq!(rollover(&mut open).unwrap(), vec![habit_id]);
            assert!(rollover(&mut open).unwrap().is_empty());

            // Nothing is left holding the sled lock.
            let accounts = open_at(&path, &clock).unwrap();
            let progress = ProgressStore::load(&accounts).unwrap();
            assert_eq!(progress.habit(habit_id).unwrap().streak, 0);
        }

        #[tokio::test]
        async fn immediate_shutdown_never_opens_the_store() {
            let mut opened = 0;
            let report = run_with_shutdown(
                || {
                    opened += 1;
                    Err(anyhow::anyhow!("store should not be opened"))
                },
                async {},
            )
            .await
            .unwrap();
            assert_eq!(report, SchedulerReport::default());
            assert_eq!(opened, 0);
        }
    }
}
