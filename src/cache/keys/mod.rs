/// 缓存键模块
/// 每种资源一个键，参数化的资源用函数生成

// 公共资源缓存键
pub mod resource_keys;

// 文件管理缓存键
pub mod file_keys;

pub use file_keys::{files_key, folder_tree_key};
pub use resource_keys::{
    CATEGORIES, DASHBOARD_ANALYTICS, FEATURED_PUBLICATIONS_PREFIX, NAV_LINKS, PUBLIC_SETTINGS,
    featured_publications_key,
};
