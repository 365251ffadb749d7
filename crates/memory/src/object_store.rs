use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use parking_lot::Mutex;
use sesman_provider::{ObjectStore, ProviderError};

use crate::faults::{Faults, ops};

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
}

/// In-memory [`ObjectStore`] with keys listed in lexicographic order.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    faults: Faults,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &Faults {
        &self.faults
    }

    /// Store an object without going through the trait.
    pub fn insert(&self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.lock().insert(
            key.into(),
            StoredObject {
                body: body.into(),
                content_type: "application/octet-stream".to_owned(),
            },
        );
    }

    pub fn object(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).map(|o| o.body.clone())
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().get(key).map(|o| o.content_type.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn verify_access(&self, _prefix: &str) -> Result<(), ProviderError> {
        self.faults.check(ops::VERIFY_ACCESS)
    }

    async fn list_keys(&self, prefix: &str, max_keys: i32) -> Result<Vec<String>, ProviderError> {
        self.faults.check(ops::LIST_KEYS)?;
        let limit = usize::try_from(max_keys).unwrap_or(0);
        Ok(self
            .objects
            .lock()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        self.faults.check(ops::GET_OBJECT)?;
        Ok(self.object(key))
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.faults.check(ops::PUT_OBJECT)?;
        self.objects.lock().insert(
            key.to_owned(),
            StoredObject {
                body,
                content_type: content_type.to_owned(),
            },
        );
        Ok(())
    }

    async fn put_new_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ProviderError> {
        self.faults.check(ops::PUT_OBJECT)?;
        match self.objects.lock().entry(key.to_owned()) {
            Entry::Occupied(_) => Err(ProviderError::AlreadyExists(format!("object {key}"))),
            Entry::Vacant(slot) => {
                slot.insert(StoredObject {
                    body,
                    content_type: content_type.to_owned(),
                });
                Ok(())
            }
        }
    }

    async fn delete_object(&self, key: &str) -> Result<(), ProviderError> {
        self.faults.check(ops::DELETE_OBJECT)?;
        self.objects
            .lock()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| ProviderError::NotFound(format!("object {key}")))
    }
}
