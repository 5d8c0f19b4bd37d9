// API 模块
// schema 定义与后端交互的数据结构，client 负责发送请求

pub mod client;
pub mod schema;

pub use client::{ApiClient, decode_envelope};
pub use schema::ApiResponse;
