//! Response cache for API calls
//!
//! Decoded JSON responses are kept in memory, keyed by a canonical form of
//! the request URL. Each entry expires according to its category, the cache
//! holds a bounded number of entries (least recently used go first), and the
//! whole entry list is persisted so it survives restarts. Persistence is
//! debounced: a burst of writes produces one storage write.

mod category;
mod entry;
mod flush;
mod key;
mod response;
mod storage;

pub use category::CacheCategory;
pub use entry::CacheEntry;
pub use flush::DebouncedFlush;
pub use key::{KeyPolicy, RequestKey};
pub use response::{CacheError, CacheStats, ResponseCache, CACHE_STORAGE_KEY};
pub use storage::{DurableStorage, FileStorage, MemoryStorage, StorageError};
