//! Reference-counted cache of lazily fetched resources.
//!
//! Placed shapes acquire resources (node images) by id. The first acquirer
//! of an id starts one fetch through the [`ResourceProvider`]; every later
//! acquirer shares the same watch channel, so late joiners see the value
//! that already arrived.
//!
//! ```text
//!   owner A ──acquire("img1")──┐
//!                              ├──► entry "img1" ──► one provider fetch
//!   owner B ──acquire("img1")──┘         │
//!                                        ▼
//!                              watch::Sender<Option<Arc<V>>>
//! ```
//!
//! The manager never blocks: fetches are polled from the render loop with
//! [`ResourceManager::poll_pending`], or driven to completion with
//! [`ResourceManager::settle`] when an executor is available. Entries whose
//! last owner left are kept for a grace period and evicted least recently
//! retired first by [`ResourceManager::maintenance`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use uuid::Uuid;

use crate::error::RenderResult;

/// Resolves resource ids to values.
#[async_trait(?Send)]
pub trait ResourceProvider<V> {
    /// Fetch the resource. `Ok(None)` means the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource exists but could not be loaded.
    async fn fetch(&self, id: &str) -> RenderResult<Option<V>>;
}

/// Identity of something holding resources, typically a placed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(Uuid);

impl OwnerId {
    /// A fresh random owner id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", self.0)
    }
}

/// Configuration for the resource cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceCacheConfig {
    /// Entries kept after their last owner leaves.
    pub max_retired: usize,
    /// How long a retired entry is kept before eviction.
    pub max_age: Duration,
}

impl Default for ResourceCacheConfig {
    fn default() -> Self {
        Self {
            max_retired: 128,
            max_age: Duration::from_secs(300),
        }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Acquisitions served by an existing entry.
    pub hits: u64,
    /// Acquisitions that started a fetch.
    pub misses: u64,
    /// Fetches that produced a value.
    pub loaded: u64,
    /// Fetches that failed or found nothing.
    pub failed: u64,
    /// Entries evicted.
    pub evictions: u64,
}

/// A live subscription to one resource.
#[derive(Debug, Clone)]
pub struct ResourceHandle<V> {
    id: String,
    receiver: watch::Receiver<Option<Arc<V>>>,
}

impl<V> ResourceHandle<V> {
    /// The resource id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The value, if it has arrived.
    #[must_use]
    pub fn current(&self) -> Option<Arc<V>> {
        self.receiver.borrow().clone()
    }

    /// Whether a value arrived since the last [`Self::mark_seen`].
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Acknowledge the current value.
    pub fn mark_seen(&mut self) {
        self.receiver.borrow_and_update();
    }

    /// Stream of values, starting with the current one.
    #[must_use]
    pub fn into_stream(self) -> WatchStream<Option<Arc<V>>>
    where
        V: Send + Sync + 'static,
    {
        WatchStream::new(self.receiver)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    Pending,
    Ready,
    Failed,
}

struct Entry<V> {
    sender: watch::Sender<Option<Arc<V>>>,
    owners: HashSet<OwnerId>,
    state: EntryState,
    generation: u64,
    retired_at: Option<Duration>,
}

type Fetch<V> = LocalBoxFuture<'static, (String, u64, RenderResult<Option<V>>)>;

/// Shares one fetch per id between any number of owners.
pub struct ResourceManager<V: 'static> {
    provider: Rc<dyn ResourceProvider<V>>,
    config: ResourceCacheConfig,
    entries: HashMap<String, Entry<V>>,
    held: HashMap<OwnerId, HashSet<String>>,
    pending: FuturesUnordered<Fetch<V>>,
    next_generation: u64,
    clock: Duration,
    stats: CacheStats,
}

impl<V: 'static> fmt::Debug for ResourceManager<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceManager")
            .field("entries", &self.entries.len())
            .field("owners", &self.held.len())
            .field("pending", &self.pending.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> ResourceManager<V> {
    /// Create a manager with default configuration.
    #[must_use]
    pub fn new(provider: impl ResourceProvider<V> + 'static) -> Self {
        Self::with_config(provider, ResourceCacheConfig::default())
    }

    /// Create a manager with custom configuration.
    #[must_use]
    pub fn with_config(provider: impl ResourceProvider<V> + 'static, config: ResourceCacheConfig) -> Self {
        Self {
            provider: Rc::new(provider),
            config,
            entries: HashMap::new(),
            held: HashMap::new(),
            pending: FuturesUnordered::new(),
            next_generation: 0,
            clock: Duration::ZERO,
            stats: CacheStats::default(),
        }
    }

    /// Subscribe `owner` to resource `id`, starting a fetch on first use.
    pub fn acquire(&mut self, owner: OwnerId, id: &str) -> ResourceHandle<V> {
        self.held.entry(owner).or_default().insert(id.to_string());

        if let Some(entry) = self.entries.get_mut(id) {
            entry.owners.insert(owner);
            entry.retired_at = None;
            self.stats.hits += 1;
            return ResourceHandle {
                id: id.to_string(),
                receiver: entry.sender.subscribe(),
            };
        }

        self.stats.misses += 1;
        let generation = self.next_generation;
        self.next_generation += 1;

        let (sender, receiver) = watch::channel(None);
        self.entries.insert(
            id.to_string(),
            Entry {
                sender,
                owners: HashSet::from([owner]),
                state: EntryState::Pending,
                generation,
                retired_at: None,
            },
        );

        tracing::debug!("Fetching resource {}", id);
        let provider = Rc::clone(&self.provider);
        let key = id.to_string();
        self.pending.push(
            async move {
                let result = provider.fetch(&key).await;
                (key, generation, result)
            }
            .boxed_local(),
        );

        ResourceHandle {
            id: id.to_string(),
            receiver,
        }
    }

    /// Detach `owner` from every resource it holds.
    pub fn release(&mut self, owner: OwnerId) {
        let Some(ids) = self.held.remove(&owner) else {
            return;
        };
        for id in ids {
            if let Some(entry) = self.entries.get_mut(&id) {
                entry.owners.remove(&owner);
                if entry.owners.is_empty() {
                    tracing::trace!("Resource {} retired", id);
                    entry.retired_at = Some(self.clock);
                }
            }
        }
    }

    /// The value of `id`, if loaded. Unknown ids yield `None`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<V>> {
        self.entries
            .get(id)
            .and_then(|entry| entry.sender.borrow().clone())
    }

    /// Number of owners currently holding `id`.
    #[must_use]
    pub fn owner_count(&self, id: &str) -> usize {
        self.entries.get(id).map_or(0, |entry| entry.owners.len())
    }

    /// Whether `id` is cached (held or retired).
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether `id` is still being fetched.
    #[must_use]
    pub fn is_pending(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.state == EntryState::Pending)
    }

    /// Number of fetches in flight.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache statistics.
    #[must_use]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Poll in-flight fetches once without blocking.
    ///
    /// Returns how many fetches finished. Fetches that need an external
    /// wakeup make progress on the next call.
    pub fn poll_pending(&mut self) -> usize {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        let mut finished = 0;
        while let Poll::Ready(Some((id, generation, result))) = self.pending.poll_next_unpin(&mut cx) {
            self.complete(&id, generation, result);
            finished += 1;
        }
        finished
    }

    /// Drive every in-flight fetch to completion.
    pub async fn settle(&mut self) -> usize {
        let mut finished = 0;
        while let Some((id, generation, result)) = self.pending.next().await {
            self.complete(&id, generation, result);
            finished += 1;
        }
        finished
    }

    /// Advance the cache clock and evict retired entries.
    ///
    /// Entries retired longer than `max_age` go first; then the oldest
    /// retired entries until at most `max_retired` remain.
    pub fn maintenance(&mut self, now: Duration) -> usize {
        self.clock = self.clock.max(now);
        let max_age = self.config.max_age;
        let clock = self.clock;

        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| {
                entry
                    .retired_at
                    .is_some_and(|at| clock.saturating_sub(at) > max_age)
            })
            .map(|(id, _)| id.clone())
            .collect();
        let mut evicted = self.evict(expired);

        let mut retired: Vec<(Duration, String)> = self
            .entries
            .iter()
            .filter_map(|(id, entry)| entry.retired_at.map(|at| (at, id.clone())))
            .collect();
        if retired.len() > self.config.max_retired {
            retired.sort();
            let excess = retired.len() - self.config.max_retired;
            evicted += self.evict(retired.into_iter().take(excess).map(|(_, id)| id).collect());
        }
        evicted
    }

    fn evict(&mut self, ids: Vec<String>) -> usize {
        let count = ids.len();
        for id in ids {
            tracing::debug!("Evicting resource {}", id);
            self.entries.remove(&id);
            self.stats.evictions += 1;
        }
        count
    }

    fn complete(&mut self, id: &str, generation: u64, result: RenderResult<Option<V>>) {
        let Some(entry) = self.entries.get_mut(id) else {
            tracing::trace!("Dropping fetch result for evicted resource {}", id);
            return;
        };
        if entry.generation != generation {
            return;
        }
        match result {
            Ok(Some(value)) => {
                tracing::debug!("Resource {} loaded", id);
                entry.state = EntryState::Ready;
                self.stats.loaded += 1;
                entry.sender.send_replace(Some(Arc::new(value)));
            }
            Ok(None) => {
                tracing::warn!("Resource {} not found", id);
                entry.state = EntryState::Failed;
                self.stats.failed += 1;
            }
            Err(e) => {
                tracing::warn!("Resource {} failed to load: {}", id, e);
                entry.state = EntryState::Failed;
                self.stats.failed += 1;
            }
        }
    }
}
