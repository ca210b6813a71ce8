use crate::errors::TrackerError;
use crate::models::{Completable, Entry, Record};
use crate::storage::{CollectionStore, StorageBackend};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

pub type SharedCollection<T, B> = Arc<Mutex<LocalCollection<T, B>>>;

/// In-memory collection mirrored to its store after every mutation.
///
/// Mutations are applied to a staged copy, written out, and only then
/// committed, so a failed write leaves memory at the last persisted value.
#[derive(Debug)]
pub struct LocalCollection<T, B> {
    store: CollectionStore<B>,
    items: Vec<Record<T>>,
}

impl<T: Entry, B: StorageBackend> LocalCollection<T, B> {
    pub async fn initialize(store: CollectionStore<B>) -> Self {
        let items = store.load(T::COLLECTION).await;
        Self { store, items }
    }

    pub fn shared(self) -> SharedCollection<T, B> {
        Arc::new(Mutex::new(self))
    }

    pub fn items(&self) -> &[Record<T>] {
        &self.items
    }

    pub async fn create(&mut self, fields: T) -> Result<Record<T>, TrackerError> {
        fields.validate().map_err(TrackerError::Invalid)?;
        let record = Record {
            id: self.next_id(),
            created_at: Utc::now(),
            fields,
        };

        let mut staged = self.items.clone();
        staged.push(record.clone());
        self.commit(staged).await?;

        info!(collection = T::COLLECTION, id = %record.id, "record created");
        Ok(record)
    }

    /// Overwrites the domain fields; `id`, `createdAt` and position stay.
    pub async fn update(&mut self, id: &str, fields: T) -> Result<Record<T>, TrackerError> {
        fields.validate().map_err(TrackerError::Invalid)?;
        let index = self.position(id)?;

        let mut staged = self.items.clone();
        staged[index].fields = fields;
        let record = staged[index].clone();
        self.commit(staged).await?;

        info!(collection = T::COLLECTION, id, "record updated");
        Ok(record)
    }

    /// Merges a partial JSON object into the record's domain fields.
    pub async fn patch(&mut self, id: &str, partial: Value) -> Result<Record<T>, TrackerError> {
        let Value::Object(partial) = partial else {
            return Err(TrackerError::Invalid("patch body must be a JSON object".into()));
        };
        let index = self.position(id)?;

        let mut merged = serde_json::to_value(&self.items[index].fields)
            .map_err(|err| TrackerError::Invalid(err.to_string()))?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(partial);
        }
        let fields: T =
            serde_json::from_value(merged).map_err(|err| TrackerError::Invalid(err.to_string()))?;

        self.update(id, fields).await
    }

    /// Removing an absent id is a no-op that still rewrites the store.
    pub async fn remove(&mut self, id: &str) -> Result<Option<Record<T>>, TrackerError> {
        let mut staged = self.items.clone();
        let removed = staged
            .iter()
            .position(|record| record.id == id)
            .map(|index| staged.remove(index));
        self.commit(staged).await?;

        if removed.is_some() {
            info!(collection = T::COLLECTION, id, "record removed");
        }
        Ok(removed)
    }

    fn position(&self, id: &str) -> Result<usize, TrackerError> {
        self.items
            .iter()
            .position(|record| record.id == id)
            .ok_or_else(|| TrackerError::NotFound(id.to_string()))
    }

    /// Millisecond timestamp, bumped past any id already in use.
    fn next_id(&self) -> String {
        let mut candidate = Utc::now().timestamp_millis();
        while self.items.iter().any(|record| record.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    async fn commit(&mut self, staged: Vec<Record<T>>) -> Result<(), TrackerError> {
        self.store.save(T::COLLECTION, &staged).await?;
        self.items = staged;
        Ok(())
    }
}

impl<T: Entry + Completable, B: StorageBackend> LocalCollection<T, B> {
    /// Flips `completed`; an absent id is a silent no-op returning `None`.
    pub async fn toggle(&mut self, id: &str) -> Result<Option<Record<T>>, TrackerError> {
        let Some(index) = self.items.iter().position(|record| record.id == id) else {
            return Ok(None);
        };

        let mut staged = self.items.clone();
        let completed = !staged[index].fields.is_completed();
        staged[index].fields.set_completed(completed);
        let record = staged[index].clone();
        self.commit(staged).await?;

        info!(collection = T::COLLECTION, id, completed, "record toggled");
        Ok(Some(record))
    }
}
