use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 本地存储中保存令牌的键
pub const AUTH_TOKEN_KEY: &str = "authToken";

/// 令牌持久化
///
/// 只保存一个不透明的 bearer 令牌，没有令牌即视为未登录。
/// 读取失败一律当作没有令牌。
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), AppError>;
    fn clear(&self);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredToken {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
}

/// 以 JSON 文件保存令牌
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Option<String>, AppError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let stored: StoredToken =
            serde_json::from_str(&raw).map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(stored.auth_token.filter(|t| !t.is_empty()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match self.read() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Failed to read token from {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&StoredToken {
            auth_token: Some(token.to_string()),
        })
        .map_err(|e| AppError::Storage(e.to_string()))?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn clear(&self) {
        if !self.path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to remove token file {}: {}", self.path.display(), e);
        }
    }
}

/// 内存中的令牌存储，进程退出即丢失
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn save(&self, token: &str) -> Result<(), AppError> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| AppError::Storage("令牌存储锁已损坏".into()))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}
