//! Process-wide keyed cache of query results.

use super::key::QueryKey;
use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, warn};

type AnyData = Arc<dyn Any + Send + Sync>;

/// Type-erased fetch function stored per key
type ErasedFetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<AnyData, String>> + Send + Sync>;

/// The state of a query
#[derive(Debug)]
pub enum QueryState<T> {
  /// Nothing fetched yet
  Idle,
  /// A fetch is in flight; the last successful data, if any, is still served
  Loading { previous: Option<Arc<T>> },
  /// Latest fetch succeeded
  Success(Arc<T>),
  /// Latest fetch failed
  Error(String),
}

impl<T> Clone for QueryState<T> {
  fn clone(&self) -> Self {
    match self {
      QueryState::Idle => QueryState::Idle,
      QueryState::Loading { previous } => QueryState::Loading {
        previous: previous.clone(),
      },
      QueryState::Success(data) => QueryState::Success(Arc::clone(data)),
      QueryState::Error(e) => QueryState::Error(e.clone()),
    }
  }
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading { .. })
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error(_))
  }

  /// Current data: the success value, or stale data while reloading
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      QueryState::Loading {
        previous: Some(data),
      } => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      QueryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

struct Entry {
  data: Option<AnyData>,
  error: Option<String>,
  fetching: bool,
  stale: bool,
  fetched_at: Option<Instant>,
  /// Id of the latest started fetch; older results are discarded
  fetch_id: u64,
  fetcher: Option<ErasedFetcher>,
  subscribers: usize,
  /// Version counter, bumped on every state change
  notify: watch::Sender<u64>,
}

impl Entry {
  fn new() -> Self {
    let (notify, _) = watch::channel(0);
    Self {
      data: None,
      error: None,
      fetching: false,
      stale: false,
      fetched_at: None,
      fetch_id: 0,
      fetcher: None,
      subscribers: 0,
      notify,
    }
  }

  fn bump(&self) {
    self.notify.send_modify(|version| *version = version.wrapping_add(1));
  }
}

/// Keyed cache of in-flight and completed fetches.
///
/// Cloning is cheap and every clone shares the same entries. One instance is
/// created at startup and handed to every view that needs data.
#[derive(Clone)]
pub struct QueryCache {
  entries: Arc<Mutex<HashMap<QueryKey, Entry>>>,
  /// Successful entries older than this refetch on the next `get`
  stale_time: Option<Duration>,
}

impl Default for QueryCache {
  fn default() -> Self {
    Self::new()
  }
}

impl QueryCache {
  pub fn new() -> Self {
    Self {
      entries: Arc::new(Mutex::new(HashMap::new())),
      stale_time: None,
    }
  }

  pub fn with_stale_time(mut self, stale_time: Option<Duration>) -> Self {
    self.stale_time = stale_time;
    self
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Return the cached state for `key`, fetching with `fetcher` when the key
  /// has no data yet or was invalidated.
  ///
  /// Concurrent callers share one in-flight fetch. A failed fetch is not
  /// retried until the key is refetched or invalidated.
  pub fn get<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> QueryState<T>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut entries = self.lock();
    let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
    entry.fetcher = Some(erase(fetcher));
    self.ensure_entry(key, entry)
  }

  /// Like `get`, but waits for the fetch to settle.
  pub async fn fetch_query<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<Arc<T>, String>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    self.get(key, fetcher);
    let mut receiver = self.watch(key);

    loop {
      match self.state::<T>(key) {
        QueryState::Success(data) => return Ok(data),
        QueryState::Error(e) => return Err(e),
        QueryState::Idle => return Err(format!("No fetcher registered for {}", key)),
        QueryState::Loading { .. } => {}
      }
      if receiver.changed().await.is_err() {
        return Err("Query was cancelled".to_string());
      }
    }
  }

  /// Snapshot of `key` without triggering a fetch
  pub fn state<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
    match self.lock().get(key) {
      Some(entry) => snapshot(key, entry),
      None => QueryState::Idle,
    }
  }

  /// Start a new fetch for `key` even if one is in flight.
  pub fn refetch(&self, key: &QueryKey) {
    if let Some(entry) = self.lock().get_mut(key) {
      self.start_fetch(key, entry);
    }
  }

  /// Mark every entry under `prefix` stale.
  ///
  /// Entries with live subscribers (or a fetch in flight) refetch right
  /// away; the rest refetch on their next `get`. Returns the number of
  /// entries matched.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.lock();
    let mut matched = 0;

    for (key, entry) in entries.iter_mut() {
      if !key.starts_with(prefix) {
        continue;
      }
      matched += 1;
      entry.stale = true;
      if entry.subscribers > 0 || entry.fetching {
        self.start_fetch(key, entry);
      } else {
        entry.bump();
      }
    }

    debug!(%prefix, matched, "invalidated");
    matched
  }

  /// Register a subscriber for `key` and return its change notifications
  pub(crate) fn subscribe<T, F, Fut>(&self, key: &QueryKey, fetcher: F) -> watch::Receiver<u64>
  where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let mut entries = self.lock();
    let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
    entry.fetcher = Some(erase(fetcher));
    entry.subscribers += 1;
    entry.notify.subscribe()
  }

  pub(crate) fn unsubscribe(&self, key: &QueryKey) {
    if let Some(entry) = self.lock().get_mut(key) {
      entry.subscribers = entry.subscribers.saturating_sub(1);
    }
  }

  fn watch(&self, key: &QueryKey) -> watch::Receiver<u64> {
    let mut entries = self.lock();
    entries
      .entry(key.clone())
      .or_insert_with(Entry::new)
      .notify
      .subscribe()
  }

  fn needs_fetch(&self, entry: &Entry) -> bool {
    if entry.fetching {
      return false;
    }
    if entry.stale {
      return true;
    }
    if entry.error.is_some() {
      return false;
    }
    if entry.data.is_none() {
      return true;
    }
    match (self.stale_time, entry.fetched_at) {
      (Some(stale_time), Some(fetched_at)) => fetched_at.elapsed() > stale_time,
      _ => false,
    }
  }

  fn ensure_entry<T: Send + Sync + 'static>(
    &self,
    key: &QueryKey,
    entry: &mut Entry,
  ) -> QueryState<T> {
    if self.needs_fetch(entry) {
      self.start_fetch(key, entry);
    }
    snapshot(key, entry)
  }

  fn start_fetch(&self, key: &QueryKey, entry: &mut Entry) {
    let Some(fetcher) = entry.fetcher.clone() else {
      return;
    };

    entry.fetch_id += 1;
    entry.fetching = true;
    entry.stale = false;
    entry.bump();

    let fetch_id = entry.fetch_id;
    let future = fetcher();
    let cache = self.clone();
    let key = key.clone();
    debug!(%key, fetch_id, "fetch started");

    tokio::spawn(async move {
      let result = AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err("Query was cancelled".to_string()));
      cache.complete(&key, fetch_id, result);
    });
  }

  fn complete(&self, key: &QueryKey, fetch_id: u64, result: Result<AnyData, String>) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(key) else {
      return;
    };

    if entry.fetch_id != fetch_id {
      debug!(%key, fetch_id, "discarding superseded fetch");
      return;
    }

    entry.fetching = false;
    match result {
      Ok(data) => {
        entry.data = Some(data);
        entry.error = None;
        entry.fetched_at = Some(Instant::now());
      }
      Err(e) => {
        warn!(%key, error = %e, "fetch failed");
        entry.error = Some(e);
      }
    }
    entry.bump();
  }
}

fn erase<T, F, Fut>(fetcher: F) -> ErasedFetcher
where
  T: Send + Sync + 'static,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, String>> + Send + 'static,
{
  Arc::new(move || {
    let future = fetcher();
    async move { future.await.map(|data| Arc::new(data) as AnyData) }.boxed()
  })
}

fn snapshot<T: Send + Sync + 'static>(key: &QueryKey, entry: &Entry) -> QueryState<T> {
  let data = match &entry.data {
    Some(any) => match Arc::clone(any).downcast::<T>() {
      Ok(data) => Some(data),
      Err(_) => return QueryState::Error(format!("Cached data for {} has another type", key)),
    },
    None => None,
  };

  if entry.fetching {
    QueryState::Loading { previous: data }
  } else if let Some(e) = &entry.error {
    QueryState::Error(e.clone())
  } else if let Some(data) = data {
    QueryState::Success(data)
  } else {
    QueryState::Idle
  }
}
