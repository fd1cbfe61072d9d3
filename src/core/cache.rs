use anyhow::Result;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct CacheEntry<V> {
    value: V,
    expires_at: SystemTime,
}

/// Keyed on-disk cache whose entries expire `ttl` after they were stored.
///
/// Entries outlive the process, so a repeated run inside the expiry window
/// is served without going back upstream. Expiry is checked on read; an
/// expired entry is evicted and reported as a miss. Storage errors are
/// logged and treated as misses.
pub struct Cache<K, V> {
    keyspace: Keyspace,
    partition: PartitionHandle,
    ttl: Duration,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V> Cache<K, V>
where
    K: Serialize + Debug,
    V: Serialize + DeserializeOwned,
{
    /// Opens (or creates) the cache stored under `path`.
    pub fn open(path: &Path, name: &str, ttl: Duration) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = Config::new(path).open()?;
        let partition = keyspace.open_partition(name, PartitionCreateOptions::default())?;
        debug!("Opened cache '{}' at {}", name, path.display());
        Ok(Self {
            keyspace,
            partition,
            ttl,
            _marker: PhantomData,
        })
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let res: Result<Option<V>> = (|| {
            let raw_key = serde_json::to_vec(key)?;
            let Some(bytes) = self.partition.get(&raw_key)? else {
                debug!("Cache MISS for key: {:?}", key);
                return Ok(None);
            };
            let entry: CacheEntry<V> = serde_json::from_slice(&bytes)?;
            if SystemTime::now() >= entry.expires_at {
                debug!("Cache entry expired for key: {:?}", key);
                self.partition.remove(raw_key)?;
                return Ok(None);
            }
            debug!("Cache HIT for key: {:?}", key);
            Ok(Some(entry.value))
        })();

        res.unwrap_or_else(|e| {
            debug!("Cache get error: {:#}", e);
            None
        })
    }

    pub async fn put(&self, key: &K, value: V) {
        let res: Result<()> = (|| {
            let entry = CacheEntry {
                value,
                expires_at: SystemTime::now() + self.ttl,
            };
            self.partition
                .insert(serde_json::to_vec(key)?, serde_json::to_vec(&entry)?)?;
            self.keyspace.persist(PersistMode::SyncAll)?;
            debug!("Cache PUT for key: {:?}", key);
            Ok(())
        })();
        if let Err(e) = res {
            debug!("Cache put error: {:#}", e);
        }
    }
}
