// 缓存模块
// 进程内带过期时间的键值缓存，用来在请求前预填数据

pub mod keys;
pub mod models;
pub mod operations;

// 重新导出常用类型
pub use models::CacheEntry;
pub use operations::TtlCache;
