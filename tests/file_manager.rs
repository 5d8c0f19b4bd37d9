mod support;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::{Multipart, Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use media_hub::api::schema::{FileItem, Folder, UploadFile};
use media_hub::cache::keys::{files_key, folder_tree_key};
use media_hub::error::AppError;
use media_hub::store::UploadBatch;
use media_hub::utils::NoticeLevel;
use serde_json::{Value, json};
use support::{Hits, app_with, fail, ok};

fn file_json(id: &str, name: &str, folder: &str) -> Value {
    json!({"id": id, "name": name, "folderId": folder, "url": format!("/uploads/{}", name)})
}

fn tree_route() -> Router {
    Router::new().route(
        "/file-manager/folders/tree",
        get(|| async { ok(json!([{"id": "F", "name": "Photos"}, {"id": "G", "name": "Docs"}])) }),
    )
}

/// 文件列表接口，每次请求前等待 `delay_ms`
fn files_route(hits: Hits, delay_ms: u64, listing: Value) -> Router {
    Router::new().route(
        "/file-manager/files",
        get(move |Query(_params): Query<HashMap<String, String>>| {
            let hits = hits.clone();
            let listing = listing.clone();
            async move {
                hits.hit();
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                ok(listing)
            }
        }),
    )
}

fn upload_ok_route() -> Router {
    Router::new().route("/file-manager/upload", post(|| async { ok(json!([])) }))
}

fn batch(folder: &str, names: &[&str]) -> UploadBatch {
    UploadBatch::new(
        Some(folder.to_string()),
        names
            .iter()
            .map(|name| UploadFile::new(*name, b"png-bytes".to_vec()))
            .collect(),
    )
}

#[tokio::test]
async fn upload_selects_only_files_found_in_target_folder() {
    let listing = json!([
        file_json("1", "a.png", "F"),
        file_json("2", "c.png", "F"),
        file_json("3", "b.png", "G"),
    ]);
    let api = tree_route()
        .merge(files_route(Hits::default(), 0, listing))
        .merge(upload_ok_route());
    let (state, _) = app_with(api).await;
    let mut notices = state.notifier.subscribe();

    let uploaded = state
        .file_manager
        .upload(batch("F", &["a.png", "b.png"]))
        .await
        .unwrap();

    let names: Vec<&str> = uploaded.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.png"]);

    let fm = state.file_manager.state();
    assert_eq!(fm.selected, vec!["1".to_string()]);
    assert_eq!(fm.current_folder.as_deref(), Some("F"));
    assert_eq!(state.file_manager.selected_files()[0].name, "a.png");

    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
}

#[tokio::test]
async fn upload_sends_files_and_folder_as_multipart() {
    let seen = Arc::new(Mutex::new(Vec::<(String, Option<String>, String)>::new()));
    let captured = seen.clone();
    let api = tree_route()
        .merge(files_route(Hits::default(), 0, json!([])))
        .route(
            "/file-manager/upload",
            post(move |mut multipart: Multipart| {
                let captured = captured.clone();
                async move {
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let file_name = field.file_name().map(str::to_string);
                        let text = String::from_utf8_lossy(&field.bytes().await.unwrap()).to_string();
                        captured.lock().unwrap().push((name, file_name, text));
                    }
                    ok(json!([]))
                }
            }),
        );
    let (state, _) = app_with(api).await;

    state
        .file_manager
        .upload(batch("F", &["a.png", "b.png"]))
        .await
        .unwrap();

    let fields = seen.lock().unwrap().clone();
    assert!(fields.contains(&("folderId".to_string(), None, "F".to_string())));
    let files: Vec<_> = fields
        .iter()
        .filter(|(name, _, _)| name == "files")
        .map(|(_, file_name, body)| (file_name.clone().unwrap(), body.clone()))
        .collect();
    assert_eq!(
        files,
        vec![
            ("a.png".to_string(), "png-bytes".to_string()),
            ("b.png".to_string(), "png-bytes".to_string()),
        ]
    );
}

#[tokio::test]
async fn refresh_after_upload_never_shows_loading() {
    let api = tree_route()
        .merge(files_route(
            Hits::default(),
            150,
            json!([file_json("1", "a.png", "F")]),
        ))
        .merge(upload_ok_route());
    let (state, _) = app_with(api).await;

    let fm = state.file_manager.clone();
    let upload = tokio::spawn(async move { fm.upload(batch("F", &["a.png"])).await });

    // 文件列表请求进行中
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(!state.file_manager.state().loading);

    let uploaded = upload.await.unwrap().unwrap();
    assert_eq!(uploaded.len(), 1);
    assert!(!state.file_manager.state().loading);
}

#[tokio::test]
async fn failed_silent_refresh_falls_back_to_full_refresh() {
    let hits = Hits::default();
    let counter = hits.clone();
    let api = tree_route().merge(upload_ok_route()).route(
        "/file-manager/files",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.hit() == 1 {
                    (StatusCode::INTERNAL_SERVER_ERROR, fail("temporarily unavailable")).into_response()
                } else {
                    ok(json!([file_json("1", "a.png", "F")])).into_response()
                }
            }
        }),
    );
    let (state, _) = app_with(api).await;

    let uploaded = state
        .file_manager
        .upload(batch("F", &["a.png"]))
        .await
        .unwrap();

    assert_eq!(hits.count(), 2);
    assert_eq!(uploaded.len(), 1);
    let fm = state.file_manager.state();
    assert!(!fm.loading);
    assert_eq!(fm.error, None);
    assert!(fm.last_updated.is_some());
}

#[tokio::test]
async fn failed_upload_reports_error_and_skips_refresh() {
    let hits = Hits::default();
    let api = tree_route()
        .merge(files_route(hits.clone(), 0, json!([])))
        .route(
            "/file-manager/upload",
            post(|| async { fail("Quota exceeded") }),
        );
    let (state, _) = app_with(api).await;
    let mut notices = state.notifier.subscribe();

    let result = state.file_manager.upload(batch("F", &["a.png"])).await;

    assert_eq!(result, Err(AppError::Api("Quota exceeded".into())));
    assert_eq!(hits.count(), 0);
    let notice = notices.try_recv().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("Quota exceeded"));
}

#[tokio::test]
async fn open_folder_seeds_listing_from_cache() {
    let api = tree_route().merge(files_route(
        Hits::default(),
        150,
        json!([file_json("2", "fresh.png", "F")]),
    ));
    let (state, _) = app_with(api).await;
    let cached_files = vec![FileItem {
        id: "1".into(),
        name: "cached.png".into(),
        folder_id: Some("F".into()),
        url: "/uploads/cached.png".into(),
        mime_type: None,
        size: None,
    }];
    let cached_tree = vec![Folder {
        id: "F".into(),
        name: "Photos".into(),
        parent_id: None,
        children: vec![],
    }];
    state.cache.set(&files_key(Some("F")), &cached_files);
    state.cache.set(&folder_tree_key(Some("F")), &cached_tree);

    let fm = state.file_manager.clone();
    let opening = tokio::spawn(async move { fm.open_folder(Some("F")).await });

    tokio::time::sleep(Duration::from_millis(60)).await;
    let seeded = state.file_manager.state();
    assert_eq!(seeded.files, cached_files);
    assert!(seeded.loading);

    let loaded = opening.await.unwrap();
    assert_eq!(loaded.files[0].name, "fresh.png");
    assert!(!loaded.loading);
    let recached: Vec<FileItem> = state.cache.get(&files_key(Some("F"))).unwrap();
    assert_eq!(recached[0].name, "fresh.png");
}

#[tokio::test]
async fn deleting_a_file_removes_it_from_selection() {
    let deleted = Arc::new(Mutex::new(Vec::<String>::new()));
    let captured = deleted.clone();
    let api = tree_route()
        .merge(files_route(
            Hits::default(),
            0,
            json!([file_json("x", "x.png", "F"), file_json("y", "y.png", "F")]),
        ))
        .route(
            "/file-manager/files/{id}",
            delete(move |Path(id): Path<String>| {
                let captured = captured.clone();
                async move {
                    captured.lock().unwrap().push(id);
                    ok(Value::Null)
                }
            }),
        );
    let (state, _) = app_with(api).await;

    state.file_manager.open_folder(Some("F")).await;
    state.file_manager.select(vec!["x".into(), "y".into()]);

    state.file_manager.delete_file("x").await.unwrap();

    assert_eq!(deleted.lock().unwrap().clone(), vec!["x".to_string()]);
    assert_eq!(state.file_manager.state().selected, vec!["y".to_string()]);
}

#[tokio::test]
async fn empty_folder_name_is_rejected_locally() {
    let (state, _) = app_with(tree_route()).await;

    let result = state.file_manager.create_folder("   ", None).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_folder_posts_name_and_refreshes_current_folder() {
    let body_seen = Arc::new(Mutex::new(None::<Value>));
    let listed = Arc::new(Mutex::new(Vec::<Option<String>>::new()));
    let captured_body = body_seen.clone();
    let captured_list = listed.clone();
    let api = tree_route()
        .route(
            "/file-manager/files",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let captured = captured_list.clone();
                async move {
                    captured.lock().unwrap().push(params.get("folderId").cloned());
                    ok(json!([file_json("1", "a.png", "F")]))
                }
            }),
        )
        .route(
            "/file-manager/folders",
            post(move |axum::Json(body): axum::Json<Value>| {
                let captured = captured_body.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    ok(json!({"id": "N", "name": "Raw", "parentId": "F"}))
                }
            }),
        );
    let (state, _) = app_with(api).await;
    state.file_manager.open_folder(Some("F")).await;

    let folder = state
        .file_manager
        .create_folder("  Raw ", Some("F"))
        .await
        .unwrap();

    assert_eq!(folder.id, "N");
    assert_eq!(folder.parent_id.as_deref(), Some("F"));
    assert_eq!(
        body_seen.lock().unwrap().clone().unwrap(),
        json!({"name": "Raw", "parentId": "F"})
    );
    // 打开目录一次，创建后静默刷新当前目录一次
    assert_eq!(
        listed.lock().unwrap().clone(),
        vec![Some("F".to_string()), Some("F".to_string())]
    );
    let fm = state.file_manager.state();
    assert_eq!(fm.current_folder.as_deref(), Some("F"));
    assert!(!fm.loading);
}

#[tokio::test]
async fn failed_open_does_not_show_previous_folder() {
    let api = tree_route().route(
        "/file-manager/files",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            match params.get("folderId").map(String::as_str) {
                Some("G") => ok(json!([file_json("9", "g.png", "G")])).into_response(),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, fail("Folder unavailable")).into_response(),
            }
        }),
    );
    let (state, _) = app_with(api).await;
    state.file_manager.open_folder(Some("G")).await;
    state.file_manager.select(vec!["9".into()]);
    let mut notices = state.notifier.subscribe();

    let fm = state.file_manager.open_folder(Some("F")).await;

    assert_eq!(fm.current_folder.as_deref(), Some("F"));
    assert!(fm.files.is_empty());
    assert!(fm.selected.is_empty());
    assert_eq!(fm.error.as_deref(), Some("Folder unavailable"));
    assert_eq!(notices.try_recv().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn failed_refresh_of_same_folder_keeps_listing() {
    let hits = Hits::default();
    let counter = hits.clone();
    let api = tree_route().route(
        "/file-manager/files",
        get(move || {
            let counter = counter.clone();
            async move {
                if counter.hit() == 1 {
                    ok(json!([file_json("1", "a.png", "F")])).into_response()
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, fail("down")).into_response()
                }
            }
        }),
    );
    let (state, _) = app_with(api).await;
    state.file_manager.open_folder(Some("F")).await;

    let fm = state.file_manager.refresh(Some("F")).await;

    assert_eq!(fm.files.len(), 1);
    assert_eq!(fm.error, None);
    assert!(!fm.loading);
}
