//! Entity repositories: CRUD over the local store with simulated latency.
//!
//! Both repositories share one generic [`EntityCollection`] performing the
//! sleep / read-modify-write cycle; entity-specific operations (completion
//! toggling, cascade delete) live in the typed wrappers. Identifiers and
//! creation timestamps are assigned here, never by the caller.

mod projects;
mod tasks;

pub use projects::ProjectRepository;
pub use tasks::TaskRepository;

use std::marker::PhantomData;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Error, Result};
use crate::store::LocalStore;

/// A record stored in one of the fixed collections.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned {
  fn id(&self) -> &str;

  /// The store key the collection is persisted under.
  fn collection_key() -> &'static str;

  /// Entity kind name used in errors and logs.
  fn kind() -> &'static str;
}

/// Generic collection of records under a single store key.
///
/// Every operation first sleeps for the configured latency (zero disables
/// it), then runs a full read-modify-write against the store.
#[derive(Clone)]
pub struct EntityCollection<T: Record> {
  store: LocalStore,
  latency: Duration,
  _marker: PhantomData<T>,
}

impl<T: Record> EntityCollection<T> {
  pub fn new(store: LocalStore, latency: Duration) -> Self {
    Self {
      store,
      latency,
      _marker: PhantomData,
    }
  }

  pub fn store(&self) -> &LocalStore {
    &self.store
  }

  async fn simulate_latency(&self) {
    if !self.latency.is_zero() {
      tokio::time::sleep(self.latency).await;
    }
  }

  pub async fn list(&self) -> Result<Vec<T>> {
    self.simulate_latency().await;
    Ok(self.store.load(T::collection_key())?)
  }

  pub async fn get_by_id(&self, id: &str) -> Result<Option<T>> {
    self.simulate_latency().await;
    let items: Vec<T> = self.store.load(T::collection_key())?;
    Ok(items.into_iter().find(|item| item.id() == id))
  }

  /// Like [`get_by_id`](Self::get_by_id) but absent ids are an error.
  pub async fn require(&self, id: &str) -> Result<T> {
    self
      .get_by_id(id)
      .await?
      .ok_or_else(|| Error::not_found(T::kind(), id))
  }

  /// Append a fully-formed record and return it.
  pub(crate) async fn insert(&self, record: T) -> Result<T> {
    self.simulate_latency().await;
    let mut items: Vec<T> = self.store.load(T::collection_key())?;
    items.push(record.clone());
    self.store.save(T::collection_key(), &items)?;
    Ok(record)
  }

  /// Mutate the record matching `id` in place. An unknown id leaves the
  /// collection unchanged and returns `None`; nothing is inserted.
  pub(crate) async fn modify(&self, id: &str, apply: impl FnOnce(&mut T)) -> Result<Option<T>> {
    self.simulate_latency().await;
    let mut items: Vec<T> = self.store.load(T::collection_key())?;

    let Some(item) = items.iter_mut().find(|item| item.id() == id) else {
      return Ok(None);
    };

    apply(item);
    let updated = item.clone();
    self.store.save(T::collection_key(), &items)?;
    Ok(Some(updated))
  }

  /// Remove the record matching `id`. Idempotent: removing an absent id
  /// returns `false` and writes nothing.
  pub(crate) async fn remove(&self, id: &str) -> Result<bool> {
    self.simulate_latency().await;
    let mut items: Vec<T> = self.store.load(T::collection_key())?;
    let before = items.len();
    items.retain(|item| item.id() != id);

    if items.len() == before {
      return Ok(false);
    }

    self.store.save(T::collection_key(), &items)?;
    Ok(true)
  }
}
