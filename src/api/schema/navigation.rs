use serde::{Deserialize, Serialize};

// 导航链接，支持一层或多层子菜单
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavLink {
    pub id: String,
    pub label: String,
    pub href: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub children: Vec<NavLink>,
}
