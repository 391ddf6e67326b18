#![allow(dead_code)]

use std::sync::Mutex;

use concurrency_insights::api::{AccountId, ConcurrencyPoint};
use concurrency_insights::gateway::LocalGateway;

/// 2024-03-01 00:00:00 UTC
pub const EPOCH_START: i64 = 1_709_251_200_000;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with the given environment variables set (`Some`) or removed
/// (`None`), restoring the previous values afterwards, even on panic.
///
/// Calls are serialized because the environment is process-global.
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _restore = EnvRestore::apply(changes);
    f()
}

struct EnvRestore {
    previous: Vec<(String, Option<String>)>,
}

impl EnvRestore {
    fn apply(changes: &[(&str, Option<&str>)]) -> Self {
        let mut previous: Vec<(String, Option<String>)> = Vec::new();
        for (key, value) in changes {
            if !previous.iter().any(|(k, _)| k == key) {
                previous.push((key.to_string(), std::env::var(key).ok()));
            }
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
        Self { previous }
    }
}

impl Drop for EnvRestore {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..).rev() {
            match value {
                Some(v) => std::env::set_var(&key, v),
                None => std::env::remove_var(&key),
            }
        }
    }
}

/// Local gateway with one account at limit 20 and the given hourly values.
pub fn gateway_with_hours(account: &AccountId, hours: &[(i64, f64)]) -> LocalGateway {
    let gateway = LocalGateway::new();
    gateway.seed_account(account, 20.0);
    gateway.add_samples(
        account,
        hours
            .iter()
            .map(|(hour, value)| ConcurrencyPoint::new(EPOCH_START + hour * 3_600_000, *value))
            .collect(),
    );
    gateway
}
