use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::api::schema::UserProfile;

/// 视为管理员的角色，比较时不区分大小写
pub const ADMIN_ROLES: [&str; 2] = ["admin", "superadmin"];

/// 当前登录会话
///
/// 令牌持久化在本地存储，其余字段只保存在内存中。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
    pub roles: BTreeSet<String>,
    pub permissions: BTreeSet<String>,
    pub is_admin: bool,
}

impl Session {
    pub fn new(token: String, user: UserProfile) -> Self {
        let roles: BTreeSet<String> = user.roles.iter().cloned().collect();
        let permissions: BTreeSet<String> = user.permissions.iter().cloned().collect();
        let is_admin = roles
            .iter()
            .any(|role| ADMIN_ROLES.iter().any(|admin| role.eq_ignore_ascii_case(admin)));

        Self {
            token: Some(token),
            user: Some(user),
            roles,
            permissions,
            is_admin,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// 认证状态机
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Unauthenticated,
    Checking,
    Authenticated(Session),
    /// 服务器认证成功但本地无法保存令牌
    Error(String),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }
}

/// login/register 的返回结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub success: bool,
    pub is_admin: bool,
    pub error: Option<String>,
}

impl LoginOutcome {
    pub fn ok(is_admin: bool) -> Self {
        Self {
            success: true,
            is_admin,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            is_admin: false,
            error: Some(message.into()),
        }
    }
}
