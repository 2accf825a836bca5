use super::store::{load_json, save_json, KeyValueStore, StoreError};
use super::ClientError;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

pub const AUTH_KEY: &str = "notepost-auth";

/// The gateway secret remembered after login, void once `expires_at` passes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthRecord {
    pub secret: String,
    /// Milliseconds since the unix epoch.
    pub expires_at: i64,
}

fn epoch_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}

impl AuthRecord {
    /// `None` if `now + ttl` falls outside the representable date range.
    pub fn new(secret: String, ttl: Duration, now: OffsetDateTime) -> Option<AuthRecord> {
        Some(AuthRecord {
            secret,
            expires_at: epoch_millis(now.checked_add(ttl)?),
        })
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        epoch_millis(now) > self.expires_at
    }
}

pub fn login(
    store: &mut impl KeyValueStore,
    secret: &str,
    ttl: Duration,
    now: OffsetDateTime,
) -> Result<AuthRecord, ClientError> {
    let secret = secret.trim();
    if secret.is_empty() {
        return Err(ClientError::BlankSecret);
    }

    let record = AuthRecord::new(secret.to_string(), ttl, now).ok_or(ClientError::TtlTooLong)?;
    save_json(store, AUTH_KEY, &record)?;
    Ok(record)
}

/// The saved record if it is still live. An expired one is deleted on read.
pub fn current(
    store: &mut impl KeyValueStore,
    now: OffsetDateTime,
) -> Result<Option<AuthRecord>, StoreError> {
    let Some(record) = load_json::<AuthRecord>(store, AUTH_KEY)? else {
        return Ok(None);
    };

    if record.is_expired(now) {
        tracing::info!("saved login expired");
        store.remove(AUTH_KEY)?;
        return Ok(None);
    }

    Ok(Some(record))
}

pub fn logout(store: &mut impl KeyValueStore) -> Result<(), StoreError> {
    store.remove(AUTH_KEY)
}
