//! Shared Store Handle
//!
//! `Db` is the single owner of the store across connection tasks and the
//! sweeper. Every command and every sweep runs under one exclusive lock, so
//! multi-step operations like conditional SET or EXPIRE observe and mutate
//! the store atomically.

use crate::storage::Store;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A cheaply cloneable handle to the shared store.
#[derive(Debug, Clone, Default)]
pub struct Db {
    shared: Arc<Mutex<Store>>,
}

impl Db {
    /// Wraps `store` for sharing.
    pub fn new(store: Store) -> Self {
        Self {
            shared: Arc::new(Mutex::new(store)),
        }
    }

    /// Locks the store for the duration of the returned guard.
    ///
    /// A poisoned lock is recovered; no store operation leaves the map
    /// half-updated.
    pub fn lock(&self) -> MutexGuard<'_, Store> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The store's configured sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        self.lock().sweep_interval()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SetOptions;
    use std::thread;

    #[test]
    fn test_concurrent_access() {
        let db = Db::default();
        let mut handles = vec![];

        // Spawn multiple threads doing concurrent writes
        for i in 0..10 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                for j in 0..100 {
                    let key = format!("key_{}_{}", i, j);
                    db.lock()
                        .set(key, format!("value_{}", j), SetOptions::default());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.lock().len(), 1000);
    }

    #[test]
    fn test_concurrent_set_nx_has_one_winner() {
        let db = Db::default();
        let mut handles = vec![];

        for i in 0..16 {
            let db = db.clone();
            handles.push(thread::spawn(move || {
                db.lock()
                    .set(
                        "lock".to_string(),
                        format!("owner_{}", i),
                        SetOptions {
                            only_if_absent: true,
                            ..Default::default()
                        },
                    )
                    .applied
            }));
        }

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|applied| *applied)
            .count();

        assert_eq!(winners, 1);
    }

    #[test]
    fn test_racing_writers_leave_one_value() {
        let db = Db::default();

        let handles: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|value| {
                let db = db.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        db.lock()
                            .set("key".to_string(), value.to_string(), SetOptions::default());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let value = db.lock().get("key").unwrap();
        assert!(value == "left" || value == "right");
        assert_eq!(db.lock().len(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let db = Db::default();
        db.lock()
            .set("k".to_string(), "v".to_string(), SetOptions::default());

        let poisoner = db.clone();
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock();
            panic!("poison the lock");
        })
        .join();

        assert_eq!(db.lock().get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_sweep_interval() {
        let db = Db::new(Store::with_sweep_interval(Duration::from_millis(5)));
        assert_eq!(db.sweep_interval(), Duration::from_millis(5));
    }
}
