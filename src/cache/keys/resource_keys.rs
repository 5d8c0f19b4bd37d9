/// 导航链接缓存键
pub const NAV_LINKS: &str = "nav_links";

/// 仪表盘统计缓存键
pub const DASHBOARD_ANALYTICS: &str = "dashboard_analytics";

/// 公开站点设置缓存键
pub const PUBLIC_SETTINGS: &str = "public_settings";

/// 分类列表缓存键
pub const CATEGORIES: &str = "categories";

/// 推荐文章缓存键前缀，文章变更后按前缀整体失效
pub const FEATURED_PUBLICATIONS_PREFIX: &str = "featured_publications:";

/// 生成推荐文章缓存键，不同数量分别缓存
pub fn featured_publications_key(limit: u32) -> String {
    format!("{}{}", FEATURED_PUBLICATIONS_PREFIX, limit)
}
