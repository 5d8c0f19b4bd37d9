/// 目录树缓存键前缀
const FOLDER_TREE_PREFIX: &str = "file_manager:tree:";

/// 文件列表缓存键前缀
const FILES_PREFIX: &str = "file_manager:files:";

/// 根目录在键中的占位名
const ROOT: &str = "root";

/// 生成目录树缓存键
pub fn folder_tree_key(folder_id: Option<&str>) -> String {
    format!("{}{}", FOLDER_TREE_PREFIX, folder_id.unwrap_or(ROOT))
}

/// 生成文件列表缓存键
pub fn files_key(folder_id: Option<&str>) -> String {
    format!("{}{}", FILES_PREFIX, folder_id.unwrap_or(ROOT))
}
