use super::cache::{QueryCache, QueryState};
use super::key::QueryKey;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// A view's subscription to one cache key.
///
/// Holding a `Query` keeps the key "live": invalidating it refetches right
/// away instead of waiting for the next read. Dropping it unsubscribes.
pub struct Query<T> {
  cache: QueryCache,
  key: QueryKey,
  fetcher: Fetcher<T>,
  receiver: watch::Receiver<u64>,
  state: QueryState<T>,
}

impl<T: Send + Sync + 'static> Query<T> {
  /// Subscribe to `key`. The fetcher is called each time the cache decides
  /// the key needs (re)fetching.
  ///
  /// Nothing is fetched until `fetch()` is called.
  pub fn new<F, Fut>(cache: &QueryCache, key: QueryKey, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    let fetcher: Fetcher<T> = Arc::new(move || fetcher().boxed());
    let registered = Arc::clone(&fetcher);
    let receiver = cache.subscribe(&key, move || registered());
    let state = cache.state(&key);
    Self {
      cache: cache.clone(),
      key,
      fetcher,
      receiver,
      state,
    }
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }

  /// Serve from cache, fetching only if the key has no usable data.
  pub fn fetch(&mut self) {
    let fetcher = Arc::clone(&self.fetcher);
    self.state = self.cache.get(&self.key, move || fetcher());
  }

  /// Force a refetch, superseding any pending one.
  pub fn refetch(&mut self) {
    self.cache.refetch(&self.key);
    self.state = self.cache.state(&self.key);
  }

  /// Pick up state changes published by the cache.
  ///
  /// Returns `true` if the state changed. Call this from the tick handler.
  pub fn poll(&mut self) -> bool {
    match self.receiver.has_changed() {
      Ok(true) => {
        self.receiver.borrow_and_update();
        self.state = self.cache.state(&self.key);
        true
      }
      _ => false,
    }
  }
}

impl<T> Drop for Query<T> {
  fn drop(&mut self) {
    self.cache.unsubscribe(&self.key);
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("state", &self.state)
      .finish_non_exhaustive()
  }
}
