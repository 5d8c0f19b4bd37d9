/// 缓存操作
pub mod ttl;

pub use ttl::TtlCache;
