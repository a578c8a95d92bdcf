//! Key-Value Store with Expiry Support
//!
//! This module implements the core store for microkv: a map from key to
//! string value plus an optional expiry instant, with the conditional SET and
//! EXPIRE operators, regex key enumeration and the active-expiry sweep.
//!
//! ## Design Decisions
//!
//! 1. **No internal locking**: every operation takes `&mut self` (or `&self`).
//!    The whole store sits behind one exclusive lock owned by [`Db`], so each
//!    command is linearizable with respect to every other command and sweep.
//! 2. **Lazy Expiry**: any operation that touches a key first discards it if
//!    its expiry has passed, then proceeds as if it never existed.
//! 3. **Active Expiry**: [`Store::sweep_expired`] removes every expired entry
//!    and is driven by the background sweeper.
//!
//! An entry whose expiry is at or before "now" counts as expired.
//!
//! [`Db`]: crate::storage::Db

use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Default interval between active expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration =
    Duration::from_millis(crate::DEFAULT_SWEEP_INTERVAL_MS);

/// A stored value with optional expiry time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The actual value stored
    pub value: String,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
}

impl Entry {
    /// Creates a new entry without expiry.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_at: None,
        }
    }

    /// Creates a new entry with the given expiry.
    pub fn with_expiry(value: impl Into<String>, expires_at: Option<Instant>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// Checks if this entry has expired as of `now`.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

/// Options for [`Store::set`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Expiry for the new value (None = never expires)
    pub expires_at: Option<Instant>,
    /// Report the previous value on a successful write
    pub return_old: bool,
    /// Inherit the previous entry's expiry instead of `expires_at`
    pub keep_ttl: bool,
    /// Only write if the key already exists (XX)
    pub only_if_exists: bool,
    /// Only write if the key does not exist (NX)
    pub only_if_absent: bool,
}

/// Result of [`Store::set`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOutcome {
    /// Whether the write happened
    pub applied: bool,
    /// The previous value, only on an applied write with `return_old`
    pub old_value: Option<String>,
}

impl SetOutcome {
    fn rejected() -> Self {
        Self::default()
    }
}

/// Guard flags for [`Store::expire`]. At most one may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpireOptions {
    /// NX: only if the key has no expiry
    pub only_if_no_expiry: bool,
    /// XX: only if the key has an expiry
    pub only_if_has_expiry: bool,
    /// GT: only if the new expiry is later than the current one
    pub only_if_greater: bool,
    /// LT: only if the new expiry is earlier than the current one
    pub only_if_less: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpireCondition {
    Always,
    NoExpiry,
    HasExpiry,
    Greater,
    Less,
}

impl ExpireOptions {
    /// Resolves the flags to a single condition, or `None` if more than one is set.
    fn condition(&self) -> Option<ExpireCondition> {
        let flags = [
            (self.only_if_no_expiry, ExpireCondition::NoExpiry),
            (self.only_if_has_expiry, ExpireCondition::HasExpiry),
            (self.only_if_greater, ExpireCondition::Greater),
            (self.only_if_less, ExpireCondition::Less),
        ];

        let mut set = flags.iter().filter(|(on, _)| *on).map(|(_, c)| *c);
        match (set.next(), set.next()) {
            (None, _) => Some(ExpireCondition::Always),
            (Some(condition), None) => Some(condition),
            (Some(_), Some(_)) => None,
        }
    }
}

/// A KEYS pattern that is not a valid regular expression.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

/// Returns `now + seconds`, or `None` if that instant can't be represented.
///
/// Non-positive `seconds` yield `now` itself, which already counts as expired.
pub fn deadline_after(now: Instant, seconds: i64) -> Option<Instant> {
    deadline_after_millis(now, seconds.checked_mul(1000)?)
}

/// Returns `now + millis`, or `None` if that instant can't be represented.
///
/// Non-positive `millis` yield `now` itself, which already counts as expired.
pub fn deadline_after_millis(now: Instant, millis: i64) -> Option<Instant> {
    if millis <= 0 {
        return Some(now);
    }
    now.checked_add(Duration::from_millis(millis as u64))
}

/// The key-value store.
///
/// # Example
///
/// ```
/// use microkv::storage::{ExpireOptions, SetOptions, Store};
///
/// let mut store = Store::new();
///
/// store.set("name".to_string(), "Ariz".to_string(), SetOptions::default());
/// assert_eq!(store.get("name"), Some("Ariz".to_string()));
/// assert_eq!(store.ttl("name"), -1);
///
/// assert!(store.expire("name", 60, ExpireOptions::default()));
/// assert!(store.ttl("name") >= 59);
/// ```
#[derive(Debug)]
pub struct Store {
    data: HashMap<String, Entry>,
    sweep_interval: Duration,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store with the default sweep interval.
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    /// Creates an empty store swept every `interval`.
    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            data: HashMap::new(),
            sweep_interval: interval,
        }
    }

    /// How often the background sweeper should run against this store.
    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Returns the live entry for `key`, discarding it first if it has expired.
    fn live_entry(&mut self, key: &str, now: Instant) -> Option<&mut Entry> {
        if self.data.get(key).is_some_and(|e| e.is_expired_at(now)) {
            self.data.remove(key);
            return None;
        }
        self.data.get_mut(key)
    }

    /// Gets the value for a key.
    ///
    /// Returns `None` if the key doesn't exist or has expired; an expired
    /// entry is removed on the way out.
    pub fn get(&mut self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.live_entry(key, now).map(|entry| entry.value.clone())
    }

    /// Sets `key` to `value`, subject to the guards in `options`.
    ///
    /// An expired entry counts as absent for both guards; setting both guards
    /// rejects the write. A write whose resulting expiry has already passed
    /// removes the key instead of storing it, and still counts as applied.
    pub fn set(&mut self, key: String, value: String, options: SetOptions) -> SetOutcome {
        let now = Instant::now();
        let prior_expiry = self.live_entry(&key, now).map(|entry| entry.expires_at);
        let exists = prior_expiry.is_some();

        if (options.only_if_exists && !exists) || (options.only_if_absent && exists) {
            return SetOutcome::rejected();
        }

        let expires_at = match prior_expiry {
            Some(expiry) if options.keep_ttl => expiry,
            _ => options.expires_at,
        };

        let previous = if expires_at.is_some_and(|exp| now >= exp) {
            self.data.remove(&key)
        } else {
            self.data.insert(key, Entry::with_expiry(value, expires_at))
        };

        SetOutcome {
            applied: true,
            old_value: if options.return_old {
                previous.map(|entry| entry.value)
            } else {
                None
            },
        }
    }

    /// Deletes each of `keys` and returns how many live keys were removed.
    pub fn del<S: AsRef<str>>(&mut self, keys: &[S]) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        for key in keys {
            let key = key.as_ref();
            if self.live_entry(key, now).is_some() {
                self.data.remove(key);
                removed += 1;
            }
        }

        removed
    }

    /// Sets the expiry of an existing key to `seconds` from now.
    ///
    /// Returns `true` when the call is counted as a success:
    ///
    /// | guard | applies when | `seconds <= 0` |
    /// |---|---|---|
    /// | none | always | deletes, returns `false` |
    /// | NX | key has no expiry | deletes, returns `true` |
    /// | XX | key has an expiry | deletes, returns `true` |
    /// | GT | key has an expiry and the new one is later | deletes, returns `false` |
    /// | LT | key has an expiry and the new one is earlier | deletes, returns `false` |
    ///
    /// Setting more than one guard, a missing or expired key, or a failed
    /// guard all return `false` without touching the key.
    pub fn expire(&mut self, key: &str, seconds: i64, options: ExpireOptions) -> bool {
        let Some(condition) = options.condition() else {
            return false;
        };

        let now = Instant::now();
        let Some(current) = self.live_entry(key, now).map(|entry| entry.expires_at) else {
            return false;
        };

        if seconds <= 0 {
            let (delete, success) = match condition {
                ExpireCondition::Always => (true, false),
                ExpireCondition::NoExpiry => (current.is_none(), current.is_none()),
                ExpireCondition::HasExpiry => (current.is_some(), current.is_some()),
                ExpireCondition::Greater | ExpireCondition::Less => (current.is_some(), false),
            };
            if delete {
                self.data.remove(key);
            }
            return success;
        }

        let Some(deadline) = deadline_after(now, seconds) else {
            return false;
        };

        let apply = match condition {
            ExpireCondition::Always => true,
            ExpireCondition::NoExpiry => current.is_none(),
            ExpireCondition::HasExpiry => current.is_some(),
            ExpireCondition::Greater => current.is_some_and(|cur| deadline > cur),
            ExpireCondition::Less => current.is_some_and(|cur| deadline < cur),
        };

        if apply {
            if let Some(entry) = self.data.get_mut(key) {
                entry.expires_at = Some(deadline);
            }
        }

        apply
    }

    /// Gets the remaining TTL for a key in whole seconds, rounded down.
    ///
    /// # Returns
    ///
    /// - `-2` if the key doesn't exist (or just expired, which removes it)
    /// - `-1` if the key exists but has no expiry
    /// - the remaining seconds otherwise
    pub fn ttl(&mut self, key: &str) -> i64 {
        let now = Instant::now();
        match self.live_entry(key, now) {
            None => -2,
            Some(entry) => match entry.expires_at {
                None => -1,
                Some(exp) => exp.saturating_duration_since(now).as_secs() as i64,
            },
        }
    }

    /// Returns every unexpired key matching the regular expression `pattern`.
    ///
    /// The match is a search anywhere in the key; anchor with `^`/`$` for a
    /// full match. Expired entries are skipped but left for the sweeper. The
    /// scan visits every key, so a large keyspace holds the store lock for
    /// the whole scan.
    pub fn keys(&self, pattern: &str) -> Result<Vec<String>, PatternError> {
        let re = Regex::new(pattern).map_err(|e| PatternError {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let now = Instant::now();
        Ok(self
            .data
            .iter()
            .filter(|(key, entry)| !entry.is_expired_at(now) && re.is_match(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn sweep_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.data.len();
        self.data.retain(|_, entry| !entry.is_expired_at(now));
        before - self.data.len()
    }

    /// Number of mapped entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
