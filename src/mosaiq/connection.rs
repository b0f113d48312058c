// ── connection.rs ───────────────────────────────────────────────────────────

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::qclerror::QclError;
use super::siteconfig::SiteConfig;

/// 建立 Mosaiq 連線所需的參數。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionParams {
    hostname: String,
    port: u16,
    alias: String
}

impl ConnectionParams {
    pub fn new(hostname: String, port: u16, alias: String) -> ConnectionParams {
        ConnectionParams { hostname, port, alias }
    }

    pub fn from_site(site: &SiteConfig) -> ConnectionParams {
        let mosaiq = site.mosaiq();
        ConnectionParams::new(mosaiq.hostname().to_owned(), mosaiq.port(), mosaiq.alias().to_owned())
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// 快取 key：同一台 server（hostname + port）共用連線，alias 只是顯示名稱。
    fn cache_key(&self) -> (String, u16) {
        (self.hostname.clone(), self.port)
    }
}

/// 連線提供者：實際的資料庫 driver 在 crate 之外。
pub trait ConnectionProvider {
    type Connection;

    fn connect(&self, params: &ConnectionParams) -> Result<Arc<Self::Connection>, QclError>;
}

// ── 快取 backend ─────────────────────────────────────────────────────────────

pub trait CacheBackend<C> {
    fn get_or_try_connect(
        &self,
        key: (String, u16),
        connect: impl FnOnce() -> Result<Arc<C>, QclError>,
    ) -> Result<Arc<C>, QclError>;

    fn len(&self) -> Result<usize, QclError>;
}

/// 單執行緒版：RefCell
pub struct RefCellBackend<C> {
    cache: RefCell<HashMap<(String, u16), Arc<C>>>
}

impl<C> RefCellBackend<C> {
    pub fn new() -> Self {
        Self { cache: RefCell::new(HashMap::new()) }
    }
}

impl<C> Default for RefCellBackend<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CacheBackend<C> for RefCellBackend<C> {
    fn get_or_try_connect(
        &self,
        key: (String, u16),
        connect: impl FnOnce() -> Result<Arc<C>, QclError>,
    ) -> Result<Arc<C>, QclError> {
        if let Some(connection) = self.cache.borrow().get(&key) {
            return Ok(Arc::clone(connection));
        }
        // 連線期間不持有 borrow，connect 失敗也不會留下任何 entry
        let connection = connect()?;
        self.cache.borrow_mut().insert(key, Arc::clone(&connection));
        Ok(connection)
    }

    fn len(&self) -> Result<usize, QclError> {
        Ok(self.cache.borrow().len())
    }
}

// ── 多執行緒版：RwLock ───────────────────────────────────────────────────────
//
// 兩條執行緒可能同時發現 key 不存在而各自連線，後寫入者會沿用先寫入的連線，
// 多建立的那條連線直接丟棄。

pub struct RwLockBackend<C> {
    cache: RwLock<HashMap<(String, u16), Arc<C>>>
}

impl<C> RwLockBackend<C> {
    pub fn new() -> Self {
        Self { cache: RwLock::new(HashMap::new()) }
    }
}

impl<C> Default for RwLockBackend<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> CacheBackend<C> for RwLockBackend<C> {
    fn get_or_try_connect(
        &self,
        key: (String, u16),
        connect: impl FnOnce() -> Result<Arc<C>, QclError>,
    ) -> Result<Arc<C>, QclError> {
        {
            let cache = self.cache.read().map_err(|_| QclError::CachePoisoned)?;
            if let Some(connection) = cache.get(&key) {
                return Ok(Arc::clone(connection));
            }
        }

        let connection = connect()?;
        let mut cache = self.cache.write().map_err(|_| QclError::CachePoisoned)?;
        Ok(Arc::clone(cache.entry(key).or_insert(connection)))
    }

    fn len(&self) -> Result<usize, QclError> {
        let cache = self.cache.read().map_err(|_| QclError::CachePoisoned)?;
        Ok(cache.len())
    }
}

/// 以 (hostname, port) 快取連線的 provider。
pub struct CachedConnectionProvider<P: ConnectionProvider, B: CacheBackend<P::Connection>> {
    provider: P,
    backend: B
}

impl<P: ConnectionProvider, B: CacheBackend<P::Connection>> CachedConnectionProvider<P, B> {
    fn new_with_backend(provider: P, backend: B) -> Self {
        Self { provider, backend }
    }

    pub fn cached_connections(&self) -> Result<usize, QclError> {
        self.backend.len()
    }
}

impl<P: ConnectionProvider> CachedConnectionProvider<P, RefCellBackend<P::Connection>> {
    pub fn new(provider: P) -> Self {
        Self::new_with_backend(provider, RefCellBackend::new())
    }
}

impl<P: ConnectionProvider> CachedConnectionProvider<P, RwLockBackend<P::Connection>> {
    pub fn new_threadsafe(provider: P) -> Self {
        Self::new_with_backend(provider, RwLockBackend::new())
    }
}

impl<P: ConnectionProvider, B: CacheBackend<P::Connection>> ConnectionProvider for CachedConnectionProvider<P, B> {
    type Connection = P::Connection;

    fn connect(&self, params: &ConnectionParams) -> Result<Arc<Self::Connection>, QclError> {
        self.backend.get_or_try_connect(params.cache_key(), || {
            log::info!("connecting to {} ({}:{})", params.alias(), params.hostname(), params.port());
            self.provider.connect(params)
        })
    }
}

pub type SingleThreadedConnectionCache<P> = CachedConnectionProvider<P, RefCellBackend<<P as ConnectionProvider>::Connection>>;
pub type MultiThreadedConnectionCache<P> = CachedConnectionProvider<P, RwLockBackend<<P as ConnectionProvider>::Connection>>;


#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingProvider {
        connects: Cell<usize>,
        fail_host: Option<&'static str>
    }

    impl ConnectionProvider for CountingProvider {
        type Connection = String;

        fn connect(&self, params: &ConnectionParams) -> Result<Arc<String>, QclError> {
            self.connects.set(self.connects.get() + 1);
            if Some(params.hostname()) == self.fail_host {
                return Err(QclError::Connection { alias: params.alias().to_owned(), message: "refused".to_owned() });
            }
            Ok(Arc::new(format!("{}:{}", params.hostname(), params.port())))
        }
    }

    fn params(hostname: &str, port: u16, alias: &str) -> ConnectionParams {
        ConnectionParams::new(hostname.to_owned(), port, alias.to_owned())
    }

    #[test]
    fn connects_once_per_server() {
        let cached = SingleThreadedConnectionCache::<CountingProvider>::new(CountingProvider { connects: Cell::new(0), fail_host: None });
        let a = cached.connect(&params("rccc", 1433, "RCCC")).unwrap();
        let b = cached.connect(&params("rccc", 1433, "RCCC again")).unwrap();
        let c = cached.connect(&params("rccc", 1434, "RCCC test")).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(cached.provider.connects.get(), 2);
        assert_eq!(cached.cached_connections(), Ok(2));
    }

    #[test]
    fn failed_connections_are_not_cached() {
        let cached = SingleThreadedConnectionCache::<CountingProvider>::new(CountingProvider { connects: Cell::new(0), fail_host: Some("down") });
        assert!(cached.connect(&params("down", 1433, "Down")).is_err());
        assert!(cached.connect(&params("down", 1433, "Down")).is_err());
        assert_eq!(cached.provider.connects.get(), 2);
        assert_eq!(cached.cached_connections(), Ok(0));
    }

    struct SharedProvider {
        connects: AtomicUsize
    }

    impl ConnectionProvider for SharedProvider {
        type Connection = u16;

        fn connect(&self, params: &ConnectionParams) -> Result<Arc<u16>, QclError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(params.port()))
        }
    }

    #[test]
    fn threadsafe_cache_is_shared_across_threads() {
        let cached = Arc::new(MultiThreadedConnectionCache::<SharedProvider>::new_threadsafe(SharedProvider { connects: AtomicUsize::new(0) }));
        cached.connect(&params("rccc", 1433, "RCCC")).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cached = Arc::clone(&cached);
                std::thread::spawn(move || *cached.connect(&params("rccc", 1433, "RCCC")).unwrap())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 1433);
        }
        assert_eq!(cached.provider.connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn poisoned_cache_is_reported() {
        let backend = Arc::new(RwLockBackend::<u16>::new());
        let writer = Arc::clone(&backend);
        let result = std::thread::spawn(move || {
            let _guard = writer.cache.write().unwrap();
            panic!("writer died holding the lock");
        }).join();
        assert!(result.is_err());

        assert_eq!(backend.len(), Err(QclError::CachePoisoned));
        assert_eq!(
            backend.get_or_try_connect(("rccc".to_owned(), 1433), || Ok(Arc::new(1433))),
            Err(QclError::CachePoisoned)
        );
    }
}
