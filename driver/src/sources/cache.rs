use lru::LruCache;
use pirepgrid::GateScan;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Bounded cache of decoded scans, keyed by file path.
///
/// One batch run owns the cache and lends it to its row workers; it is
/// dropped with the run. The least recently used scan is evicted once
/// `capacity` scans are held.
pub struct ScanCache {
    inner: Mutex<CacheState>,
}

struct CacheState {
    entries: LruCache<PathBuf, Arc<GateScan>>,
    hits: u64,
    misses: u64,
}

impl ScanCache {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                hits: 0,
                misses: 0,
            }),
        }
    }

    /// Returns the cached scan for `path`, loading it on a miss.
    ///
    /// The loader runs without the lock held, so two workers may decode the
    /// same file at once; the later insert wins.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> anyhow::Result<Arc<GateScan>>
    where
        F: FnOnce(&Path) -> anyhow::Result<GateScan>,
    {
        {
            let mut state = self.lock()?;
            if let Some(scan) = state.entries.get(path).cloned() {
                state.hits += 1;
                return Ok(scan);
            }
            state.misses += 1;
        }

        let scan = Arc::new(load(path)?);
        self.lock()?.entries.put(path.to_path_buf(), scan.clone());
        Ok(scan)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    /// `(hits, misses)` since the cache was created.
    pub fn stats(&self) -> (u64, u64) {
        self.lock()
            .map(|state| (state.hits, state.misses))
            .unwrap_or((0, 0))
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, CacheState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow::anyhow!("scan cache lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn scan(name: &str) -> GateScan {
        GateScan::new(name, vec![0.0], vec![0.0], vec![0.0])
    }

    #[test]
    fn repeated_paths_load_once() {
        let cache = ScanCache::with_capacity(2);
        let loads = Cell::new(0);
        let loader = |path: &Path| {
            loads.set(loads.get() + 1);
            Ok(scan(&path.display().to_string()))
        };

        let first = cache.get_or_load(Path::new("a"), loader).unwrap();
        let again = cache.get_or_load(Path::new("a"), loader).unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(loads.get(), 1);
        assert_eq!(cache.stats(), (1, 1));
    }

    #[test]
    fn least_recently_used_scan_is_evicted() {
        let cache = ScanCache::with_capacity(2);
        let loader = |path: &Path| Ok(scan(&path.display().to_string()));
        cache.get_or_load(Path::new("a"), loader).unwrap();
        cache.get_or_load(Path::new("b"), loader).unwrap();
        cache.get_or_load(Path::new("a"), loader).unwrap();
        cache.get_or_load(Path::new("c"), loader).unwrap();
        assert_eq!(cache.len(), 2);

        cache.get_or_load(Path::new("a"), loader).unwrap();
        assert_eq!(cache.stats(), (2, 3));
        cache.get_or_load(Path::new("b"), loader).unwrap();
        assert_eq!(cache.stats(), (2, 4));
    }

    #[test]
    fn zero_capacity_still_holds_one_scan() {
        let cache = ScanCache::with_capacity(0);
        let loader = |path: &Path| Ok(scan(&path.display().to_string()));
        cache.get_or_load(Path::new("a"), loader).unwrap();
        cache.get_or_load(Path::new("a"), loader).unwrap();
        cache.get_or_load(Path::new("b"), loader).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats(), (1, 2));
    }

    #[test]
    fn loader_errors_are_not_cached() {
        let cache = ScanCache::with_capacity(1);
        let failing = |_: &Path| -> anyhow::Result<GateScan> { anyhow::bail!("corrupt volume") };
        assert!(cache.get_or_load(Path::new("bad"), failing).is_err());
        assert_eq!(cache.len(), 0);
    }
}
