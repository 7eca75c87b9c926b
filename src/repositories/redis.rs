use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use crate::{
    error::StoreError,
    models::paste::Paste,
    repositories::paste_store::{PasteStore, StoreResult},
};

const KEY_PREFIX: &str = "paste:";
const SCAN_BATCH: usize = 200;

// ARGV holds the field/value pairs of the new hash.
const CREATE_LUA: &str = r#"
if redis.call('EXISTS', KEYS[1]) == 1 then
  return 0
end
redis.call('HSET', KEYS[1], unpack(ARGV))
return 1
"#;

const CLAIM_VIEW_LUA: &str = r#"
local remaining = tonumber(redis.call('HGET', KEYS[1], 'remaining_views'))
if remaining == nil or remaining <= 0 then
  return false
end
return redis.call('HINCRBY', KEYS[1], 'remaining_views', -1)
"#;

// ARGV[1] is "now" in milliseconds since the epoch.
const PRUNE_LUA: &str = r#"
local fields = redis.call('HMGET', KEYS[1], 'expires_at', 'remaining_views')
local expires_at = tonumber(fields[1])
local remaining = tonumber(fields[2])
local now = tonumber(ARGV[1])
if (expires_at and now >= expires_at) or (remaining and remaining <= 0) then
  return redis.call('DEL', KEYS[1])
end
return 0
"#;

/// A `PasteStore` keeping each paste in a Redis hash under `paste:{id}`.
///
/// Creation and view claims run as Lua scripts, which Redis executes
/// atomically.
#[derive(Clone)]
pub struct RedisPasteStore {
    conn: ConnectionManager,
    create_script: Script,
    claim_script: Script,
    prune_script: Script,
}

impl RedisPasteStore {
    /// Creates a new `RedisPasteStore` over a connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            create_script: Script::new(CREATE_LUA),
            claim_script: Script::new(CLAIM_VIEW_LUA),
            prune_script: Script::new(PRUNE_LUA),
        }
    }

    /// Connects to the Redis server at `url`.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self::new(conn))
    }
}

fn key_for(id: &str) -> String {
    format!("{KEY_PREFIX}{id}")
}

/// Flattens a paste into hash fields. Absent limits are left out.
fn encode_fields(paste: &Paste) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("content", paste.content.clone()),
        ("created_at", paste.created_at.timestamp_millis().to_string()),
    ];
    if let Some(ttl) = paste.ttl_seconds {
        fields.push(("ttl_seconds", ttl.to_string()));
    }
    if let Some(expires_at) = paste.expires_at {
        fields.push(("expires_at", expires_at.timestamp_millis().to_string()));
    }
    if let Some(max_views) = paste.max_views {
        fields.push(("max_views", max_views.to_string()));
    }
    if let Some(remaining) = paste.remaining_views {
        fields.push(("remaining_views", remaining.to_string()));
    }
    fields
}

fn decode_fields(id: &str, mut fields: HashMap<String, String>) -> StoreResult<Paste> {
    let corrupt = |reason: String| StoreError::Corrupt {
        id: id.to_string(),
        reason,
    };

    fn parse<T: std::str::FromStr>(
        fields: &HashMap<String, String>,
        name: &str,
    ) -> Result<Option<T>, String> {
        fields
            .get(name)
            .map(|raw| raw.parse::<T>().map_err(|_| format!("invalid {name}: {raw}")))
            .transpose()
    }

    fn timestamp(millis: Option<i64>, name: &str) -> Result<Option<DateTime<Utc>>, String> {
        millis
            .map(|ms| DateTime::from_timestamp_millis(ms).ok_or_else(|| format!("invalid {name}")))
            .transpose()
    }

    let created_at = timestamp(parse(&fields, "created_at").map_err(corrupt)?, "created_at")
        .map_err(corrupt)?
        .ok_or_else(|| corrupt("missing created_at".to_string()))?;
    let expires_at =
        timestamp(parse(&fields, "expires_at").map_err(corrupt)?, "expires_at").map_err(corrupt)?;

    Ok(Paste {
        id: id.to_string(),
        created_at,
        expires_at,
        ttl_seconds: parse(&fields, "ttl_seconds").map_err(corrupt)?,
        max_views: parse(&fields, "max_views").map_err(corrupt)?,
        remaining_views: parse(&fields, "remaining_views").map_err(corrupt)?,
        content: fields
            .remove("content")
            .ok_or_else(|| corrupt("missing content".to_string()))?,
    })
}

#[async_trait]
impl PasteStore for RedisPasteStore {
    async fn create(&self, paste: &Paste) -> StoreResult<()> {
        let mut conn = self.conn.clone();
        let mut invocation = self.create_script.key(key_for(&paste.id));
        for (field, value) in encode_fields(paste) {
            invocation.arg(field).arg(value);
        }

        let created: i64 = invocation.invoke_async(&mut conn).await?;
        if created == 0 {
            return Err(StoreError::DuplicateId);
        }
        Ok(())
    }

    async fn fetch_by_id(&self, id: &str) -> StoreResult<Option<Paste>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(key_for(id)).await?;
        if fields.is_empty() {
            return Ok(None);
        }
        decode_fields(id, fields).map(Some)
    }

    async fn decrement_and_fetch_remaining(&self, id: &str) -> StoreResult<Option<i32>> {
        let mut conn = self.conn.clone();
        let remaining: Option<i64> = self
            .claim_script
            .key(key_for(id))
            .invoke_async(&mut conn)
            .await?;

        remaining
            .map(|value| {
                i32::try_from(value).map_err(|_| StoreError::Corrupt {
                    id: id.to_string(),
                    reason: format!("remaining_views out of range: {value}"),
                })
            })
            .transpose()
    }

    async fn prune_inaccessible(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut conn = self.conn.clone();
        let now_ms = now.timestamp_millis();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(format!("{KEY_PREFIX}*"))
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            for key in keys {
                let deleted: u64 = self
                    .prune_script
                    .key(key)
                    .arg(now_ms)
                    .invoke_async(&mut conn)
                    .await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }
}
