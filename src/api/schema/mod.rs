// API 数据传输对象模块
// 与后端交互的全部数据结构，网络层解析后再交给领域代码

pub mod analytics;
pub mod category;
pub mod common;
pub mod file_manager;
pub mod navigation;
pub mod publication;
pub mod settings;
pub mod user;

// 重新导出常用类型
pub use analytics::*;
pub use category::*;
pub use common::*;
pub use file_manager::*;
pub use navigation::*;
pub use publication::*;
pub use settings::*;
pub use user::*;
