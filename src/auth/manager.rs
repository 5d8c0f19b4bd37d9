use std::sync::{Arc, RwLock};

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::api::schema::{ApiResponse, AuthPayload, LoginRequest, RegisterRequest, UserProfile};
use crate::auth::session::{AuthState, LoginOutcome, Session};
use crate::auth::token_store::TokenStore;
use crate::utils::{Clock, SystemClock, token_expired_locally};

/// 会话管理
///
/// 唯一持有会话的组件。令牌写入 [`TokenStore`]，用户、角色和权限只保存在内存中。
/// 状态变化通过 watch 通道广播。
#[derive(Debug)]
pub struct AuthSessionManager {
    api: ApiClient,
    tokens: Arc<dyn TokenStore>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<AuthState>,
    last_error: RwLock<Option<String>>,
}

impl AuthSessionManager {
    pub fn new(api: ApiClient, tokens: Arc<dyn TokenStore>) -> Self {
        Self::with_clock(api, tokens, Arc::new(SystemClock))
    }

    pub fn with_clock(api: ApiClient, tokens: Arc<dyn TokenStore>, clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            api,
            tokens,
            clock,
            state,
            last_error: RwLock::new(None),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state
            .borrow()
            .session()
            .and_then(|session| session.user.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.state.borrow().session().is_some_and(|s| s.is_admin)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.state.borrow().session().is_some_and(|s| s.has_role(role))
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.state
            .borrow()
            .session()
            .is_some_and(|s| s.has_permission(permission))
    }

    /// 最近一次登录/注册失败的消息
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().ok().and_then(|e| e.clone())
    }

    fn set_state(&self, state: AuthState) {
        self.state.send_replace(state);
    }

    fn set_last_error(&self, message: Option<String>) {
        if let Ok(mut slot) = self.last_error.write() {
            *slot = message;
        }
    }

    /// 启动时检查本地令牌
    ///
    /// 没有令牌直接进入 Unauthenticated；有令牌则向服务器确认，任何失败都会清除令牌。
    pub async fn bootstrap(&self) -> AuthState {
        let Some(token) = self.tokens.load() else {
            self.set_state(AuthState::Unauthenticated);
            return AuthState::Unauthenticated;
        };

        if token_expired_locally(&token, self.clock.now()) {
            tracing::info!("Stored token already expired, clearing");
            self.tokens.clear();
            self.set_state(AuthState::Unauthenticated);
            return AuthState::Unauthenticated;
        }

        self.set_state(AuthState::Checking);
        let result = self.api.get_current_user().await.into_result();

        // 检查期间可能已经注销或重新登录
        if self.tokens.load().as_deref() != Some(token.as_str()) {
            tracing::debug!("Token changed while checking, discarding result");
            return self.state();
        }

        let next = match result {
            Ok(user) => {
                tracing::info!("Session restored for {}", user.email);
                AuthState::Authenticated(Session::new(token, user))
            }
            Err(e) => {
                tracing::info!("Stored token rejected: {}", e);
                self.tokens.clear();
                AuthState::Unauthenticated
            }
        };
        self.set_state(next.clone());
        next
    }

    pub async fn login(&self, email: &str, password: &str) -> LoginOutcome {
        self.set_state(AuthState::Checking);
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let resp = self.api.login(&req).await;
        self.complete(resp)
    }

    /// 注册，人机验证令牌原样传给服务器
    pub async fn register(&self, req: RegisterRequest) -> LoginOutcome {
        self.set_state(AuthState::Checking);
        let resp = self.api.register(&req).await;
        self.complete(resp)
    }

    fn complete(&self, resp: ApiResponse<AuthPayload>) -> LoginOutcome {
        match resp.into_result() {
            Ok(payload) => {
                if let Err(e) = self.tokens.save(&payload.token) {
                    let message = e.message();
                    tracing::error!("Failed to persist token: {}", message);
                    self.set_last_error(Some(message.clone()));
                    self.set_state(AuthState::Error(message.clone()));
                    return LoginOutcome::failed(message);
                }

                let session = Session::new(payload.token, payload.user);
                let is_admin = session.is_admin;
                self.set_last_error(None);
                self.set_state(AuthState::Authenticated(session));
                LoginOutcome::ok(is_admin)
            }
            Err(e) => {
                let message = e.message();
                tracing::info!("Authentication failed: {}", message);
                self.tokens.clear();
                self.set_last_error(Some(message.clone()));
                self.set_state(AuthState::Unauthenticated);
                LoginOutcome::failed(message)
            }
        }
    }

    /// 同步注销，不等待服务器确认
    ///
    /// 在 tokio 运行时中调用时会另起任务通知服务器，结果被忽略。
    pub fn logout(&self) {
        let token = self.tokens.load();
        self.tokens.clear();
        self.set_last_error(None);
        self.set_state(AuthState::Unauthenticated);

        if let (Some(token), Ok(handle)) = (token, tokio::runtime::Handle::try_current()) {
            let api = self.api.clone();
            handle.spawn(async move {
                let _ = api.logout(&token).await;
            });
        }
    }

    /// 任意接口返回 401 时重置会话，返回是否发生了重置
    pub fn handle_unauthorized<T>(&self, resp: &ApiResponse<T>) -> bool {
        if !resp.is_unauthorized() {
            return false;
        }
        // 只处理当前令牌被拒绝的情况，旧请求的 401 不影响新会话
        if resp.token != self.tokens.load() {
            tracing::debug!("Ignoring 401 for a token that is no longer current");
            return false;
        }
        tracing::info!("Server rejected token, resetting session");
        self.tokens.clear();
        self.set_state(AuthState::Unauthenticated);
        true
    }
}
