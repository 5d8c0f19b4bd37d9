// 认证模块
// 会话状态机与令牌持久化

pub mod manager;
pub mod session;
pub mod token_store;

pub use manager::AuthSessionManager;
pub use session::{AuthState, LoginOutcome, Session};
pub use token_store::{AUTH_TOKEN_KEY, FileTokenStore, MemoryTokenStore, TokenStore};
