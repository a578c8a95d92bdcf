//! Command Dispatcher
//!
//! This module maps decoded requests onto store operations. It validates
//! argument counts and option syntax, takes the store lock once per command,
//! and turns the store's answer into a [`Reply`].
//!
//! ## Supported Commands
//!
//! - `GET key` - Get a key's value
//! - `SET key value [NX|XX] [GET] [EX s|PX ms|EXAT unix-s|PXAT unix-ms|KEEPTTL]` - Set a key
//! - `DEL key [key ...]` - Delete keys
//! - `EXPIRE key seconds [NX|XX|GT|LT]` - Set a key's expiry
//! - `TTL key` - Get remaining TTL in seconds
//! - `KEYS pattern` - Find keys matching a regular expression
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CommandDispatcher                         │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │  process()  │───>│  dispatch() │───>│   cmd_*()   │      │
//! │  └─────────────┘    └─────────────┘    └─────────────┘      │
//! │                                               │             │
//! │                                               ▼             │
//! │                                          Db (Store)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use crate::commands::CommandError;
use crate::protocol::Reply;
use crate::storage::{deadline_after, deadline_after_millis, Db, ExpireOptions, SetOptions};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// The expiry-style option of a SET, at most one per command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetExpiry {
    Seconds(i64),
    Millis(i64),
    UnixSeconds(i64),
    UnixMillis(i64),
    KeepTtl,
}

/// Dispatches commands to the store behind a [`Db`] handle.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    db: Db,
}

impl CommandDispatcher {
    /// Creates a new dispatcher over the given store handle.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// The store handle this dispatcher works against.
    pub fn db(&self) -> &Db {
        &self.db
    }

    /// Executes a command, folding any failure into an error reply.
    pub fn execute(&self, args: &[String]) -> Reply {
        self.process(args).unwrap_or_else(|err| Reply::error(err.to_string()))
    }

    /// Executes a command and returns its reply or the reason it failed.
    ///
    /// # Arguments
    ///
    /// * `args` - The decoded request; the first element is the command name
    ///
    /// # Example
    ///
    /// ```
    /// use microkv::commands::CommandDispatcher;
    /// use microkv::protocol::Reply;
    /// use microkv::storage::Db;
    ///
    /// let dispatcher = CommandDispatcher::new(Db::default());
    /// let set = vec!["SET".to_string(), "k".to_string(), "v".to_string()];
    /// assert_eq!(dispatcher.process(&set).unwrap(), Reply::ok());
    /// ```
    pub fn process(&self, args: &[String]) -> Result<Reply, CommandError> {
        let (name, rest) = args.split_first().ok_or(CommandError::EmptyCommand)?;
        self.dispatch(&name.to_uppercase(), rest)
    }

    /// Dispatches a command to its handler.
    fn dispatch(&self, cmd: &str, args: &[String]) -> Result<Reply, CommandError> {
        match cmd {
            "GET" => self.cmd_get(args),
            "SET" => self.cmd_set(args),
            "DEL" => self.cmd_del(args),
            "EXPIRE" => self.cmd_expire(args),
            "TTL" => self.cmd_ttl(args),
            "KEYS" => self.cmd_keys(args),
            _ => Err(CommandError::UnknownCommand(cmd.to_string())),
        }
    }

    /// GET key
    fn cmd_get(&self, args: &[String]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("GET".into()));
        };

        Ok(Reply::from_option(self.db.lock().get(key)))
    }

    /// SET key value [NX|XX] [GET] [EX s|PX ms|EXAT unix-s|PXAT unix-ms|KEEPTTL]
    fn cmd_set(&self, args: &[String]) -> Result<Reply, CommandError> {
        if args.len() < 2 {
            return Err(CommandError::WrongArity("SET".into()));
        }

        let mut options = SetOptions::default();
        let mut expiry: Option<SetExpiry> = None;

        let mut rest = args[2..].iter();
        while let Some(opt) = rest.next() {
            let opt = opt.to_uppercase();

            let parsed = match opt.as_str() {
                "NX" => {
                    options.only_if_absent = true;
                    None
                }
                "XX" => {
                    options.only_if_exists = true;
                    None
                }
                "GET" => {
                    options.return_old = true;
                    None
                }
                "KEEPTTL" => Some(SetExpiry::KeepTtl),
                "EX" | "PX" | "EXAT" | "PXAT" => {
                    let n = parse_integer(rest.next().ok_or_else(CommandError::syntax)?)?;
                    Some(match opt.as_str() {
                        "EX" => SetExpiry::Seconds(n),
                        "PX" => SetExpiry::Millis(n),
                        "EXAT" => SetExpiry::UnixSeconds(n),
                        _ => SetExpiry::UnixMillis(n),
                    })
                }
                _ => return Err(CommandError::syntax()),
            };

            if let Some(parsed) = parsed {
                if expiry.replace(parsed).is_some() {
                    return Err(CommandError::syntax());
                }
            }
        }

        if options.only_if_absent && options.only_if_exists {
            return Err(CommandError::syntax());
        }

        match expiry {
            Some(SetExpiry::KeepTtl) => options.keep_ttl = true,
            Some(expiry) => {
                options.expires_at = Some(
                    resolve_expiry(Instant::now(), expiry)
                        .ok_or_else(|| CommandError::invalid_expire_time("set"))?,
                );
            }
            None => {}
        }

        let return_old = options.return_old;
        let outcome = self
            .db
            .lock()
            .set(args[0].clone(), args[1].clone(), options);

        Ok(match (outcome.applied, return_old) {
            (false, _) => Reply::nil(),
            (true, true) => Reply::from_option(outcome.old_value),
            (true, false) => Reply::ok(),
        })
    }

    /// DEL key [key ...]
    fn cmd_del(&self, args: &[String]) -> Result<Reply, CommandError> {
        if args.is_empty() {
            return Err(CommandError::WrongArity("DEL".into()));
        }

        let deleted = self.db.lock().del(args);
        Ok(Reply::integer(deleted as i64))
    }

    /// EXPIRE key seconds [NX|XX|GT|LT]
    fn cmd_expire(&self, args: &[String]) -> Result<Reply, CommandError> {
        let (key, seconds, flag) = match args {
            [key, seconds] => (key, seconds, None),
            [key, seconds, flag] => (key, seconds, Some(flag)),
            _ => return Err(CommandError::WrongArity("EXPIRE".into())),
        };

        let seconds = parse_integer(seconds)?;
        if deadline_after(Instant::now(), seconds).is_none() {
            return Err(CommandError::invalid_expire_time("expire"));
        }

        let mut options = ExpireOptions::default();
        if let Some(flag) = flag {
            match flag.to_uppercase().as_str() {
                "NX" => options.only_if_no_expiry = true,
                "XX" => options.only_if_has_expiry = true,
                "GT" => options.only_if_greater = true,
                "LT" => options.only_if_less = true,
                _ => {
                    return Err(CommandError::InvalidArgument(format!(
                        "unsupported option {}",
                        flag
                    )))
                }
            }
        }

        let applied = self.db.lock().expire(key, seconds, options);
        Ok(Reply::integer(i64::from(applied)))
    }

    /// TTL key
    fn cmd_ttl(&self, args: &[String]) -> Result<Reply, CommandError> {
        let [key] = args else {
            return Err(CommandError::WrongArity("TTL".into()));
        };

        Ok(Reply::integer(self.db.lock().ttl(key)))
    }

    /// KEYS pattern
    fn cmd_keys(&self, args: &[String]) -> Result<Reply, CommandError> {
        let [pattern] = args else {
            return Err(CommandError::WrongArity("KEYS".into()));
        };

        let keys = self.db.lock().keys(pattern)?;
        Ok(Reply::array(keys))
    }
}

fn parse_integer(s: &str) -> Result<i64, CommandError> {
    s.parse().map_err(|_| CommandError::not_an_integer())
}

/// Turns a SET expiry option into an instant, or `None` on overflow.
fn resolve_expiry(now: Instant, expiry: SetExpiry) -> Option<Instant> {
    let wall = SystemTime::now();
    match expiry {
        SetExpiry::Seconds(s) => deadline_after(now, s),
        SetExpiry::Millis(ms) => deadline_after_millis(now, ms),
        SetExpiry::UnixSeconds(s) => deadline_at_unix_millis(now, wall, s.checked_mul(1000)?),
        SetExpiry::UnixMillis(ms) => deadline_at_unix_millis(now, wall, ms),
        SetExpiry::KeepTtl => None,
    }
}

/// Maps a wall-clock deadline onto the monotonic clock, with `wall` read at
/// `now`. A deadline at or before `wall` maps to `now`. A wall clock set
/// before the epoch gives `None`.
fn deadline_at_unix_millis(now: Instant, wall: SystemTime, unix_ms: i64) -> Option<Instant> {
    let wall_ms = i64::try_from(wall.duration_since(UNIX_EPOCH).ok()?.as_millis()).ok()?;
    deadline_after_millis(now, unix_ms.checked_sub(wall_ms)?)
}
