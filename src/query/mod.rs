//! Async query abstraction for data fetching with caching support.
//!
//! Inspired by TanStack Query. A single [`QueryCache`] holds the state of
//! every keyed query; views subscribe to keys through [`Query<T>`] and poll it
//! from their tick handler, and writes go through [`Mutation`], which
//! invalidates affected keys once the write succeeds.
//!
//! # Example
//!
//! ```ignore
//! let cache = QueryCache::new();
//! let api = gateway.clone();
//! let mut query = Query::new(&cache, QueryKey::new("courses").with(1_i64), move || {
//!     let api = api.clone();
//!     async move { api.list_courses(1).await.map_err(|e| e.to_string()) }
//! });
//!
//! // Start fetching (served from cache when already loaded)
//! query.fetch();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading { .. } => render_spinner(),
//!     QueryState::Success(data) => render_data(data),
//!     QueryState::Error(e) => render_error(e),
//!     QueryState::Idle => {}
//! }
//! ```

mod cache;
mod key;
mod mutation;
mod observer;

pub use cache::{QueryCache, QueryState};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationState};
pub use observer::Query;
