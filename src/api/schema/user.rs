use serde::{Deserialize, Serialize};

// 用户基本信息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

// 登录请求
#[derive(Debug, Serialize, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// 注册请求，人机验证令牌原样转发给后端
#[derive(Debug, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<String>,
}

// 登录/注册响应
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserProfile,
}

// /auth/me 可能直接返回用户，也可能包一层 user
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum CurrentUserPayload {
    Wrapped { user: UserProfile },
    Bare(UserProfile),
}

impl CurrentUserPayload {
    pub fn into_user(self) -> UserProfile {
        match self {
            CurrentUserPayload::Wrapped { user } => user,
            CurrentUserPayload::Bare(user) => user,
        }
    }
}
