//! Write operations that invalidate cached queries on success.

use super::cache::QueryCache;
use super::key::QueryKey;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Run `write`; on success invalidate every prefix in `invalidate`.
///
/// Invalidation happens before this resolves, so anyone observing the
/// success sees refetches already under way. A failed write invalidates
/// nothing.
pub async fn execute<O, Fut>(cache: &QueryCache, write: Fut, invalidate: &[QueryKey]) -> Result<O, String>
where
  Fut: Future<Output = Result<O, String>>,
{
  match write.await {
    Ok(output) => {
      for prefix in invalidate {
        cache.invalidate(prefix);
      }
      Ok(output)
    }
    Err(e) => {
      warn!(error = %e, "mutation failed");
      Err(e)
    }
  }
}

/// The state of a mutation
#[derive(Debug, Clone)]
pub enum MutationState<O> {
  Idle,
  Pending,
  Success(O),
  Error(String),
}

type MutatorFn<I, O> = Arc<dyn Fn(I) -> BoxFuture<'static, Result<O, String>> + Send + Sync>;

/// A reusable write operation bound to one call site.
///
/// Only one write may be in flight at a time: `mutate` is refused while the
/// previous one is pending.
pub struct Mutation<I, O> {
  cache: QueryCache,
  invalidates: Vec<QueryKey>,
  mutator: MutatorFn<I, O>,
  state: MutationState<O>,
  receiver: Option<mpsc::UnboundedReceiver<Result<O, String>>>,
}

impl<I: Send + 'static, O: Send + 'static> Mutation<I, O> {
  pub fn new<F, Fut>(cache: &QueryCache, mutator: F) -> Self
  where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, String>> + Send + 'static,
  {
    Self {
      cache: cache.clone(),
      invalidates: Vec::new(),
      mutator: Arc::new(move |input| mutator(input).boxed()),
      state: MutationState::Idle,
      receiver: None,
    }
  }

  /// Invalidate keys under `prefix` whenever this mutation succeeds
  pub fn invalidates(mut self, prefix: QueryKey) -> Self {
    self.invalidates.push(prefix);
    self
  }

  pub fn state(&self) -> &MutationState<O> {
    &self.state
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, MutationState::Pending)
  }

  /// Start the write. Returns `false` (and does nothing) if one is pending.
  pub fn mutate(&mut self, input: I) -> bool {
    if self.is_pending() {
      debug!("mutation already pending, ignoring");
      return false;
    }

    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = MutationState::Pending;

    let write = (self.mutator)(input);
    let cache = self.cache.clone();
    let invalidates = self.invalidates.clone();
    tokio::spawn(async move {
      let result = execute(&cache, write, &invalidates).await;
      // Receiver may have been dropped with its view
      let _ = tx.send(result);
    });

    true
  }

  /// Pick up the result of a pending write.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(output)) => {
        self.state = MutationState::Success(output);
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.state = MutationState::Error(error);
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        self.state = MutationState::Error("Mutation was cancelled".to_string());
        self.receiver = None;
        true
      }
    }
  }
}
