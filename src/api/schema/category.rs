use serde::{Deserialize, Serialize};

// 分类
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

// 子分类
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: String,
}

// 创建/更新子分类请求
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryInput {
    pub name: String,
    pub slug: String,
    pub category_id: String,
}
