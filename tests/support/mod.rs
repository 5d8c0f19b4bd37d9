#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::http::HeaderMap;
use media_hub::AppState;
use media_hub::auth::{MemoryTokenStore, TokenStore};
use media_hub::config::Config;
use serde_json::{Value, json};

/// 在随机端口上启动模拟后端，返回基础地址
pub async fn spawn_backend(api: Router) -> String {
    let app = Router::new().nest("/api", api);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock backend");
    });
    format!("http://{}", addr)
}

pub fn app_state(base_url: &str, tokens: Arc<dyn TokenStore>) -> AppState {
    AppState::builder()
        .config(Config::new(base_url))
        .token_store(tokens)
        .build()
        .expect("build app state")
}

pub async fn app_with(api: Router) -> (AppState, Arc<MemoryTokenStore>) {
    let url = spawn_backend(api).await;
    let tokens = Arc::new(MemoryTokenStore::new());
    (app_state(&url, tokens.clone()), tokens)
}

pub fn ok(data: Value) -> axum::Json<Value> {
    axum::Json(json!({"success": true, "data": data}))
}

pub fn fail(message: &str) -> axum::Json<Value> {
    axum::Json(json!({"success": false, "error": {"message": message}}))
}

pub fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

pub fn user_json(roles: &[&str]) -> Value {
    json!({
        "id": "u1",
        "email": "editor@example.com",
        "name": "Editor",
        "roles": roles,
        "permissions": ["publications.write"]
    })
}

/// 请求计数器
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn hit(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
