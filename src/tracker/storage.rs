use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use log::debug;
use sled::IVec;

use crate::tracker::errors::TrackerError;
use crate::tracker::types::{AccountRecord, SessionRecord, ACCOUNT_SCHEMA_VERSION};

const TREE_ACCOUNTS: &str = "accounts";
const TREE_META: &str = "meta";

const KEY_SESSION: &[u8] = b"session:current";
const KEY_REMEMBERED_EMAIL: &[u8] = b"login:remembered_email";
const KEY_DAILY_QUEST_DAY: &[u8] = b"daily_quest:last_started";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct TrackerStoreBuilder {
    path: PathBuf,
}

impl TrackerStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<TrackerStore, TrackerError> {
        TrackerStore::open(self.path)
    }
}

/// Sled-backed persistence for account records and the session pointer.
///
/// Each account is one JSON document holding its stats, gold and the embedded
/// habit, quest, badge and friend collections. Writers always replace the whole
/// document.
pub struct TrackerStore {
    _db: sled::Db,
    accounts: sled::Tree,
    meta: sled::Tree,
}

impl TrackerStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TrackerError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let accounts = db.open_tree(TREE_ACCOUNTS)?;
        let meta = db.open_tree(TREE_META)?;
        Ok(Self {
            _db: db,
            accounts,
            meta,
        })
    }

    fn account_key(id: u64) -> Vec<u8> {
        format!("accounts:{:020}", id).into_bytes()
    }

    fn email_key(email: &str) -> Vec<u8> {
        format!("email:{}", email.trim().to_ascii_lowercase()).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, TrackerError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, TrackerError> {
        Ok(serde_json::from_slice::<T>(&bytes)?)
    }

    /// Pick an id for a new account from the creation time in milliseconds,
    /// stepping forward past any id already taken.
    pub fn next_account_id(&self) -> Result<u64, TrackerError> {
        let mut id = Utc::now().timestamp_millis().max(1) as u64;
        while self.accounts.contains_key(Self::account_key(id))? {
            id += 1;
        }
        Ok(id)
    }

    /// Insert or update an account record and its email index entry.
    pub fn put_account(&self, mut account: AccountRecord) -> Result<(), TrackerError> {
        account.schema_version = ACCOUNT_SCHEMA_VERSION;
        account.touch();
        let key = Self::account_key(account.id);

        if let Some(previous) = self.accounts.get(&key)? {
            let previous: AccountRecord = Self::deserialize(previous)?;
            if !previous.email.eq_ignore_ascii_case(&account.email) {
                self.accounts.remove(Self::email_key(&previous.email))?;
            }
        }

        let bytes = Self::serialize(&account)?;
        self.accounts.insert(key, bytes)?;
        self.accounts
            .insert(Self::email_key(&account.email), account.id.to_be_bytes().to_vec())?;
        self.accounts.flush()?;
        debug!("persisted account {}", account.id);
        Ok(())
    }

    /// Fetch an account record by id.
    pub fn get_account(&self, id: u64) -> Result<AccountRecord, TrackerError> {
        let Some(bytes) = self.accounts.get(Self::account_key(id))? else {
            return Err(TrackerError::NotFound(format!("account: {}", id)));
        };
        let record: AccountRecord = Self::deserialize(bytes)?;
        if record.schema_version != ACCOUNT_SCHEMA_VERSION {
            return Err(TrackerError::SchemaMismatch {
                entity: "account",
                expected: ACCOUNT_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Look up an account id by email (case-insensitive).
    pub fn find_account_id_by_email(&self, email: &str) -> Result<Option<u64>, TrackerError> {
        let Some(bytes) = self.accounts.get(Self::email_key(email))? else {
            return Ok(None);
        };
        let raw: [u8; 8] = (&bytes[..])
            .try_into()
            .map_err(|_| TrackerError::Corrupt(format!("email index for {}", email)))?;
        Ok(Some(u64::from_be_bytes(raw)))
    }

    pub fn find_account_by_email(&self, email: &str) -> Result<Option<AccountRecord>, TrackerError> {
        match self.find_account_id_by_email(email)? {
            Some(id) => Ok(Some(self.get_account(id)?)),
            None => Ok(None),
        }
    }

    /// List all account ids currently stored.
    pub fn list_account_ids(&self) -> Result<Vec<u64>, TrackerError> {
        let mut ids = Vec::new();
        for entry in self.accounts.scan_prefix(b"accounts:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("accounts:").and_then(|s| s.parse().ok()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    pub fn put_session(&self, session: &SessionRecord) -> Result<(), TrackerError> {
        self.meta.insert(KEY_SESSION, Self::serialize(session)?)?;
        self.meta.flush()?;
        Ok(())
    }

    pub fn get_session(&self) -> Result<Option<SessionRecord>, TrackerError> {
        match self.meta.get(KEY_SESSION)? {
            Some(bytes) => Ok(Some(Self::deserialize(bytes)?)),
            None => Ok(None),
        }
    }

    pub fn clear_session(&self) -> Result<(), TrackerError> {
        self.meta.remove(KEY_SESSION)?;
        self.meta.flush()?;
        Ok(())
    }

    pub fn set_remembered_email(&self, email: &str) -> Result<(), TrackerError> {
        self.meta.insert(KEY_REMEMBERED_EMAIL, email.as_bytes())?;
        self.meta.flush()?;
        Ok(())
    }

    pub fn remembered_email(&self) -> Result<Option<String>, TrackerError> {
        match self.meta.get(KEY_REMEMBERED_EMAIL)? {
            Some(bytes) => Ok(Some(std::str::from_utf8(&bytes).map(str::to_string).map_err(
                |e| TrackerError::Corrupt(format!("remembered email is not utf-8: {}", e)),
            )?)),
            None => Ok(None),
        }
    }

    pub fn clear_remembered_email(&self) -> Result<(), TrackerError> {
        self.meta.remove(KEY_REMEMBERED_EMAIL)?;
        self.meta.flush()?;
        Ok(())
    }

    /// Record the day the daily quest was last started.
    pub fn set_daily_quest_day(&self, day: NaiveDate) -> Result<(), TrackerError> {
        self.meta.insert(KEY_DAILY_QUEST_DAY, Self::serialize(&day)?)?;
        self.meta.flush()?;
        Ok(())
    }

    pub fn daily_quest_day(&self) -> Result<Option<NaiveDate>, TrackerError> {
        match self.meta.get(KEY_DAILY_QUEST_DAY)? {
            Some(bytes) => Ok(Some(Self::deserialize(bytes)?)),
            None => Ok(None),
        }
    }
}
