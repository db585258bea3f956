// ── Time-bounded snapshot cell ──

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::time::Instant;

struct Stamped<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

/// A lazily loaded value that expires after a fixed lifetime.
///
/// Readers never block: the current value is swapped in whole once a load
/// finishes. Concurrent readers that both find the cell stale will both
/// load; the later store wins.
pub struct TtlCell<T> {
    ttl: Duration,
    slot: ArcSwapOption<Stamped<T>>,
}

impl<T> TtlCell<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: ArcSwapOption::empty(),
        }
    }

    /// The cached value if it is younger than the TTL.
    pub fn fresh(&self) -> Option<Arc<T>> {
        let stamped = self.slot.load_full()?;
        (stamped.loaded_at.elapsed() < self.ttl).then(|| Arc::clone(&stamped.value))
    }

    /// The cached value regardless of age.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.slot.load_full().map(|stamped| Arc::clone(&stamped.value))
    }

    pub fn store(&self, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.slot.store(Some(Arc::new(Stamped {
            loaded_at: Instant::now(),
            value: Arc::clone(&value),
        })));
        value
    }

    pub fn invalidate(&self) {
        self.slot.store(None);
    }

    /// Return the fresh value, or run `load` and cache its result.
    ///
    /// Failed loads leave the previous (stale) value in place but are not
    /// served; the error goes to the caller.
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh() {
            return Ok(value);
        }
        let value = load().await?;
        Ok(self.store(value))
    }
}
