use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// 公开站点设置，未识别的字段保留在 extra 中
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    #[serde(default)]
    pub site_name: String,
    #[serde(default)]
    pub site_description: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}
