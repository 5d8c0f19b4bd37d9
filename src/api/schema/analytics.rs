use serde::{Deserialize, Serialize};

use super::publication::Publication;

// 仪表盘统计
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    #[serde(default)]
    pub total_publications: u64,
    #[serde(default)]
    pub total_categories: u64,
    #[serde(default)]
    pub total_users: u64,
    #[serde(default)]
    pub total_files: u64,
    #[serde(default)]
    pub total_views: u64,
    #[serde(default)]
    pub recent_publications: Vec<Publication>,
}
