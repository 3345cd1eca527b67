use std::marker::PhantomData;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Store<K, V> {
    fn get(&self, key: &K) -> Option<V>;
    fn save(&self, key: &K, value: &V);
    fn remove(&self, key: &K) -> bool;
    fn exists(&self, key: &K) -> bool;
    fn list(&self) -> Vec<V>;
}

/// Typed key-value store backed by a dedicated sled database.
///
/// Values are stored as JSON. The stores hold chain state, so a storage or
/// codec failure must never pass silently; it aborts the process instead.
pub struct DefaultStore<K, V> {
    db: sled::Db,
    phantom: PhantomData<(K, V)>,
}

impl<K, V> DefaultStore<K, V> {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let db = sled::open(&path).unwrap_or_else(|e| {
            panic!(
                "Unable to open database {}: {:?}",
                path.as_ref().display(),
                e
            )
        });
        Self {
            db,
            phantom: PhantomData,
        }
    }
}

impl<K, V> DefaultStore<K, V>
where
    K: AsRef<[u8]>,
    V: Serialize + DeserializeOwned,
{
    /// key-value pairs in ascending key order
    pub fn entries(&self) -> Vec<(String, V)> {
        self.db
            .iter()
            .flatten()
            .map(|(k, v)| (String::from_utf8_lossy(&k).to_string(), decode(&v)))
            .collect()
    }
}

impl<K, V> Store<K, V> for DefaultStore<K, V>
where
    K: AsRef<[u8]>,
    V: Serialize + DeserializeOwned,
{
    fn get(&self, key: &K) -> Option<V> {
        self.db
            .get(key.as_ref())
            .expect("Unable to read from database")
            .map(|v| decode(&v))
    }

    fn save(&self, key: &K, value: &V) {
        let encoded = serde_json::to_vec(value).expect("Unable to serialize value");
        self.db
            .insert(key.as_ref(), encoded)
            .expect("Unable to write to database");
    }

    fn remove(&self, key: &K) -> bool {
        self.db
            .remove(key.as_ref())
            .expect("Unable to write to database")
            .is_some()
    }

    fn exists(&self, key: &K) -> bool {
        self.db
            .contains_key(key.as_ref())
            .expect("Unable to read from database")
    }

    /// values in ascending key order
    fn list(&self) -> Vec<V> {
        self.db.iter().flatten().map(|(_, v)| decode(&v)).collect()
    }
}

fn decode<V: DeserializeOwned>(bytes: &[u8]) -> V {
    serde_json::from_slice(bytes).expect("Unable to deserialize stored value")
}
