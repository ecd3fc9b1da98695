mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;

use ngo_dashboard::constants::ERR_UPLOAD_TOO_LARGE;

use common::{get, post_form, send, setup_test_app, setup_test_app_with_upload_limit, upload_request};

#[tokio::test]
async fn test_root_folder_lists_contents() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/folders/root/contents",
        json!({
            "folders": [{"id": 1, "name": "Reports", "parent_id": null}],
            "files": [{"id": 9, "name": "budget.pdf", "folder_id": null}]
        }),
    );

    let page = get(&app.router, "/files", "").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Reports"));
    assert!(page.body.contains("/files/folders/1"));
    assert!(page.body.contains("fa-file-pdf"));
    assert!(page.body.contains("/files/items/9/download"));
    Ok(())
}

#[tokio::test]
async fn test_subfolder_shows_breadcrumb() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/folders/2/path",
        json!([{"id": 1, "name": "Reports"}, {"id": 2, "name": "2024"}]),
    );
    app.backend
        .respond("GET", "/folders/2/contents", json!({"folders": [], "files": []}));

    let page = get(&app.router, "/files/folders/2", "").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("breadcrumb"));
    assert!(page.body.contains("href=\"/files/folders/1\""));
    assert!(page.body.contains("This folder is empty"));
    Ok(())
}

#[tokio::test]
async fn test_create_folder_posts_name_and_parent() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let response = post_form(
        &app.router,
        "/files/folders",
        "",
        &[("name", "Receipts"), ("parent_id", "2"), ("back", "/files/folders/2")],
    )
    .await?;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/files/folders/2"));

    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/folders/");
    assert_eq!(writes[0].body, Some(json!({"name": "Receipts", "parent_id": "2"})));
    Ok(())
}

#[tokio::test]
async fn test_rename_requires_a_name() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let response = post_form(
        &app.router,
        "/files/items/9/rename",
        "",
        &[("confirm", "yes"), ("name", " ")],
    )
    .await?;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Please enter a name"));
    assert!(app.backend.writes().is_empty());

    post_form(
        &app.router,
        "/files/folders/1/rename",
        "",
        &[("confirm", "yes"), ("name", "Archive")],
    )
    .await?;
    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "PUT");
    assert_eq!(writes[0].path, "/folders/1");
    assert_eq!(writes[0].body, Some(json!({"name": "Archive"})));
    Ok(())
}

#[tokio::test]
async fn test_delete_needs_confirmation() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    post_form(&app.router, "/files/items/9/delete", "", &[("confirm", "no")]).await?;
    assert!(app.backend.writes().is_empty());

    let response = post_form(
        &app.router,
        "/files/items/9/delete",
        "",
        &[("confirm", "yes"), ("back", "https://elsewhere.example")],
    )
    .await?;
    assert_eq!(response.location.as_deref(), Some("/files"));
    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "DELETE");
    assert_eq!(writes[0].path, "/files/9");
    Ok(())
}

#[tokio::test]
async fn test_download_keeps_content_type() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend
        .respond("GET", "/files/9/download", json!({"content": "report"}));

    let response = get(&app.router, "/files/items/9/download", "").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_type.as_deref(), Some("application/json"));
    assert!(response.body.contains("report"));
    Ok(())
}

#[tokio::test]
async fn test_upload_forwards_multipart_file() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let boundary = "X-NGO-BOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"folder_id\"\r\n\r\n2\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"minutes.txt\"\r\nContent-Type: text/plain\r\n\r\nboard minutes\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::builder()
        .method("POST")
        .uri("/files/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))?;

    let response = send(&app.router, request).await?;
    assert_eq!(response.status, StatusCode::SEE_OTHER);

    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/upload/");
    assert!(writes[0].raw_body.contains("minutes.txt"));
    assert!(writes[0].raw_body.contains("board minutes"));
    assert!(writes[0].raw_body.contains("name=\"folder_id\""));
    Ok(())
}

#[tokio::test]
async fn test_upload_over_limit_redirects_with_flash() -> anyhow::Result<()> {
    let app = setup_test_app_with_upload_limit(1024).await?;

    let request = upload_request("2", "/files/folders/2", "scan.pdf", &vec![b'x'; 4096])?;
    let response = send(&app.router, request).await?;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/files/folders/2"));
    assert!(app.backend.writes().is_empty());

    let cookie = response.cookie_or("");
    let page = get(&app.router, "/files/folders/2", &cookie).await?;
    assert!(page.body.contains(ERR_UPLOAD_TOO_LARGE));
    assert!(page.body.contains("1 KB"));
    Ok(())
}

#[tokio::test]
async fn test_upload_above_axum_default_is_forwarded() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let request = upload_request("", "/files", "annual-report.pdf", &vec![b'r'; 3 * 1024 * 1024])?;
    let response = send(&app.router, request).await?;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some("/files"));

    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].path, "/upload/");
    assert!(writes[0].raw_body.contains("annual-report.pdf"));
    assert!(!writes[0].raw_body.contains("name=\"folder_id\""));
    Ok(())
}

#[tokio::test]
async fn test_preview_picks_embed_by_extension() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let pdf = get(&app.router, "/files/items/9/preview?name=minutes.pdf&back=%2Ffiles%2Ffolders%2F2", "").await?;
    assert_eq!(pdf.status, StatusCode::OK);
    assert!(pdf.body.contains("<iframe"));
    assert!(pdf.body.contains("/files/items/9/preview/content"));
    assert!(pdf.body.contains("href=\"/files/folders/2\""));

    let image = get(&app.router, "/files/items/9/preview?name=site.JPG", "").await?;
    assert!(image.body.contains("<img"));

    app.backend
        .respond("GET", "/files/9", json!({"id": 9, "name": "budget.xlsx"}));
    let other = get(&app.router, "/files/items/9/preview", "").await?;
    assert!(other.body.contains("budget.xlsx"));
    assert!(other.body.contains("No preview available for this file type"));
    Ok(())
}

#[tokio::test]
async fn test_preview_content_is_served_inline() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend
        .respond("GET", "/files/9/preview", json!({"content": "minutes"}));

    let response = get(&app.router, "/files/items/9/preview/content", "").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.content_disposition.as_deref(), Some("inline"));
    assert!(response.body.contains("minutes"));

    let requested: Vec<_> = app
        .backend
        .requests()
        .into_iter()
        .filter(|r| r.path == "/files/9/preview")
        .collect();
    assert_eq!(requested.len(), 1);
    Ok(())
}
