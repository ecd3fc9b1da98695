//! Document manager: folder browsing, folder and file maintenance, uploads
//! and downloads proxied to the backend.

use axum::{
    Form, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State, multipart::MultipartError},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::AppState;
use crate::constants::*;
use crate::html::{Markup, div, element, heading, link, message_row, paragraph, span, submit_button, table};
use crate::layout::{self, hidden_input};
use crate::models::{CreateFolderPayload, FileEntry, FolderContents, NamedRecord, RenamePayload};
use crate::navigation::Section;
use crate::panel::FormField;
use crate::panel::form::{form_error, render_field};
use crate::session::{self, Flash};
use crate::utils::{file_icon, format_size};
use crate::validation::FormData;

const FILES_HOME: &str = "/files";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

impl EntryKind {
    fn noun(self) -> &'static str {
        match self {
            EntryKind::Folder => "folder",
            EntryKind::File => "file",
        }
    }

    fn upstream_path(self, id: &str) -> String {
        let id = urlencoding::encode(id);
        match self {
            EntryKind::Folder => format!("/folders/{}", id),
            EntryKind::File => format!("/files/{}", id),
        }
    }

    fn href(self, id: &str) -> String {
        let id = urlencoding::encode(id);
        match self {
            EntryKind::Folder => format!("/files/folders/{}", id),
            EntryKind::File => format!("/files/items/{}", id),
        }
    }
}

/// Where to go after a form: only pages of the file manager are accepted.
pub fn return_target(raw: &str) -> String {
    if raw.starts_with(FILES_HOME) && !raw.contains("//") {
        raw.to_string()
    } else {
        FILES_HOME.to_string()
    }
}

pub fn folder_href(folder_id: Option<&str>) -> String {
    match folder_id {
        Some(id) => EntryKind::Folder.href(id),
        None => FILES_HOME.to_string(),
    }
}

fn contents_path(folder_id: Option<&str>) -> String {
    match folder_id {
        Some(id) => format!("/folders/{}/contents", urlencoding::encode(id)),
        None => "/folders/root/contents".to_string(),
    }
}

fn entry_link(kind: EntryKind, id: &str, name: &str, back: &str, action: &str) -> String {
    format!(
        "{}/{}?name={}&back={}",
        kind.href(id),
        action,
        urlencoding::encode(name),
        urlencoding::encode(back)
    )
}

fn entry_actions(kind: EntryKind, id: &str, name: &str, back: &str) -> Markup {
    let mut out = Markup::new();
    if kind == EntryKind::File {
        out.push(link(&entry_link(kind, id, name, back, "preview"), "btn btn-view", "Preview"));
        out.push(link(
            &format!("{}/download", kind.href(id)),
            "btn btn-view",
            "Download",
        ));
    }
    out.push(link(&entry_link(kind, id, name, back, "rename"), "btn btn-edit", "Rename"));
    out.push(link(&entry_link(kind, id, name, back, "delete"), "btn btn-danger", "Delete"));
    out
}

fn icon(class: &str) -> Markup {
    element("i", &[("class", &format!("fas {}", class))], Markup::new())
}

/// Folder and file rows for one folder.
pub fn contents_table(contents: &FolderContents, back: &str) -> Markup {
    let columns = ["Name", "Type", "Actions"];
    if contents.is_empty() {
        return table(
            "data-table files-table",
            &columns,
            message_row(columns.len(), "empty-state", "This folder is empty"),
        );
    }
    let folders = contents.folders.iter().map(|folder| {
        let mut name = icon("fa-folder");
        name.push(link(&EntryKind::Folder.href(&folder.id), "folder-link", &folder.name));
        row(
            &folder.id,
            name,
            "Folder",
            entry_actions(EntryKind::Folder, &folder.id, &folder.name, back),
        )
    });
    let files = contents.files.iter().map(|file| {
        let mut name = icon(file_icon(&file.name));
        name.push(span("file-name", Markup::text(&file.name)));
        row(
            &file.id,
            name,
            file.file_type.as_deref().unwrap_or("File"),
            entry_actions(EntryKind::File, &file.id, &file.name, back),
        )
    });
    table(
        "data-table files-table",
        &columns,
        folders.chain(files).collect(),
    )
}

fn row(id: &str, name: Markup, kind: &str, actions: Markup) -> Markup {
    let mut cells = element("td", &[], name);
    cells.push(element("td", &[], Markup::text(kind)));
    cells.push(element("td", &[("class", "row-actions")], actions));
    element("tr", &[("data-id", id)], cells)
}

/// `Home / a / b` trail; the last folder is not a link.
pub fn breadcrumb(path: &[NamedRecord]) -> Markup {
    let mut out = link(FILES_HOME, "breadcrumb-item", "Home");
    for (i, folder) in path.iter().enumerate() {
        out.push(span("breadcrumb-separator", Markup::text("/")));
        if i + 1 == path.len() {
            out.push(span("breadcrumb-item current", Markup::text(&folder.name)));
        } else {
            out.push(link(
                &EntryKind::Folder.href(&folder.id),
                "breadcrumb-item",
                &folder.name,
            ));
        }
    }
    div("breadcrumb", out)
}

fn toolbar(folder_id: Option<&str>, back: &str) -> Markup {
    let parent = hidden_input("parent_id", folder_id.unwrap_or(""));
    let mut create = parent;
    create.push(hidden_input("back", back));
    create.push(element(
        "input",
        &[("type", "text"), ("name", "name"), ("placeholder", "New folder name")],
        Markup::new(),
    ));
    create.push(submit_button("confirm", "yes", "btn btn-primary", "Create Folder"));

    let mut upload = hidden_input("folder_id", folder_id.unwrap_or(""));
    upload.push(hidden_input("back", back));
    upload.push(element("input", &[("type", "file"), ("name", "file")], Markup::new()));
    upload.push(submit_button("confirm", "yes", "btn", "Upload File"));

    let mut out = element(
        "form",
        &[("method", "post"), ("action", "/files/folders"), ("class", "inline-form")],
        create,
    );
    let upload_action = format!("/files/upload?back={}", urlencoding::encode(back));
    out.push(element(
        "form",
        &[
            ("method", "post"),
            ("action", &upload_action),
            ("enctype", "multipart/form-data"),
            ("class", "inline-form"),
        ],
        upload,
    ));
    div("panel-toolbar", out)
}

async fn browse_page(app_state: &AppState, session: &Session, folder_id: Option<&str>) -> Response {
    let back = folder_href(folder_id);
    let mut body = heading(1, "Documents");

    if let Some(id) = folder_id {
        let path = format!("/folders/{}/path", urlencoding::encode(id));
        let trail = app_state
            .api
            .list::<NamedRecord>(&path, &[])
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(folder = id, error = %e, "failed to load folder path");
                Vec::new()
            });
        body.push(breadcrumb(&trail));
    } else {
        body.push(breadcrumb(&[]));
    }
    body.push(toolbar(folder_id, &back));

    let status = match app_state
        .api
        .get::<FolderContents>(&contents_path(folder_id))
        .await
    {
        Ok(contents) => {
            body.push(contents_table(&contents, &back));
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(folder = ?folder_id, error = %e, "failed to load folder contents");
            body.push(paragraph("error", &format!("Failed to load folder contents: {}", e)));
            if e.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_GATEWAY
            }
        }
    };
    let page = layout::render(session, "Documents", Some(Section::Files), body).await;
    (status, page).into_response()
}

async fn browse_root(State(app_state): State<AppState>, session: Session) -> Response {
    browse_page(&app_state, &session, None).await
}

async fn browse_folder(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    browse_page(&app_state, &session, Some(&id)).await
}

async fn create_folder(
    State(app_state): State<AppState>,
    session: Session,
    Form(form): Form<FormData>,
) -> Redirect {
    let back = return_target(form.get("back"));
    let flash = match form.optional("name") {
        None => Flash::error(ERR_NAME_REQUIRED),
        Some(name) => {
            let payload = CreateFolderPayload {
                name,
                parent_id: form.optional("parent_id"),
            };
            match app_state
                .api
                .send_json::<serde_json::Value, _>(reqwest::Method::POST, "/folders/", &payload)
                .await
            {
                Ok(_) => Flash::success("Folder created successfully"),
                Err(e) => {
                    tracing::error!(error = %e, "failed to create folder");
                    Flash::error(format!("Failed to create folder: {}", e))
                }
            }
        }
    };
    session::push_flash(&session, flash).await;
    Redirect::to(&back)
}

fn rename_form(kind: EntryKind, id: &str, values: &FormData, error: Option<&str>) -> Markup {
    let mut page = heading(2, &format!("Rename {}", kind.noun()));
    let mut inner = Markup::new();
    if let Some(error) = error {
        inner.push(form_error(error));
    }
    inner.push(hidden_input("back", &return_target(values.get("back"))));
    inner.push(render_field(
        &FormField::text("name", "New name").required(),
        values.get("name"),
        None,
    ));
    let mut buttons = submit_button("confirm", "yes", "btn btn-primary", "Rename");
    buttons.push(submit_button("confirm", "no", "btn btn-cancel", "Cancel"));
    inner.push(div("form-actions", buttons));
    page.push(element(
        "form",
        &[
            ("method", "post"),
            ("action", &format!("{}/rename", kind.href(id))),
            ("class", "action-form"),
        ],
        inner,
    ));
    page
}

fn delete_prompt(kind: EntryKind, id: &str, values: &FormData) -> Markup {
    let name = values.optional("name").unwrap_or_else(|| format!("#{}", id));
    let mut page = heading(2, &format!("Delete {}: {}", kind.noun(), name));
    let message = match kind {
        EntryKind::Folder => "Are you sure you want to delete this folder and all its contents?",
        EntryKind::File => "Are you sure you want to delete this file?",
    };
    page.push(paragraph("prompt-message", message));
    let mut inner = hidden_input("back", &return_target(values.get("back")));
    let mut buttons = submit_button("confirm", "yes", "btn btn-danger", "Delete");
    buttons.push(submit_button("confirm", "no", "btn btn-cancel", "Cancel"));
    inner.push(div("form-actions", buttons));
    page.push(element(
        "form",
        &[
            ("method", "post"),
            ("action", &format!("{}/delete", kind.href(id))),
            ("class", "action-form"),
        ],
        inner,
    ));
    page
}

fn capitalized(noun: &str) -> String {
    let mut chars = noun.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

async fn rename_page(session: &Session, kind: EntryKind, id: &str, values: &FormData) -> Markup {
    let body = rename_form(kind, id, values, None);
    layout::render(session, "Rename", Some(Section::Files), body).await
}

async fn rename_submit(
    app_state: &AppState,
    session: &Session,
    kind: EntryKind,
    id: &str,
    form: &FormData,
) -> Response {
    let back = return_target(form.get("back"));
    if !form.confirmed() {
        session::push_flash(session, Flash::info("Cancelled")).await;
        return Redirect::to(&back).into_response();
    }
    let Some(name) = form.optional("name") else {
        let body = rename_form(kind, id, form, Some(ERR_NAME_REQUIRED));
        let page = layout::render(session, "Rename", Some(Section::Files), body).await;
        return (StatusCode::UNPROCESSABLE_ENTITY, page).into_response();
    };
    let flash = match app_state
        .api
        .send_json::<serde_json::Value, _>(
            reqwest::Method::PUT,
            &kind.upstream_path(id),
            &RenamePayload { name },
        )
        .await
    {
        Ok(_) => Flash::success(format!("{} renamed successfully", capitalized(kind.noun()))),
        Err(e) => {
            tracing::error!(kind = kind.noun(), id = %id, error = %e, "rename failed");
            Flash::error(format!("Failed to rename {}: {}", kind.noun(), e))
        }
    };
    session::push_flash(session, flash).await;
    Redirect::to(&back).into_response()
}

async fn delete_page(session: &Session, kind: EntryKind, id: &str, values: &FormData) -> Markup {
    let body = delete_prompt(kind, id, values);
    layout::render(session, "Delete", Some(Section::Files), body).await
}

async fn delete_submit(
    app_state: &AppState,
    session: &Session,
    kind: EntryKind,
    id: &str,
    form: &FormData,
) -> Redirect {
    let back = return_target(form.get("back"));
    let flash = if !form.confirmed() {
        Flash::info("Cancelled")
    } else {
        match app_state.api.delete(&kind.upstream_path(id)).await {
            Ok(()) => {
                tracing::info!(kind = kind.noun(), id = %id, "deleted");
                Flash::success(format!("{} deleted successfully", capitalized(kind.noun())))
            }
            Err(e) => {
                tracing::error!(kind = kind.noun(), id = %id, error = %e, "delete failed");
                Flash::error(format!("Failed to delete {}: {}", kind.noun(), e))
            }
        }
    };
    session::push_flash(session, flash).await;
    // A deleted folder cannot be shown again; go back to the top instead.
    if kind == EntryKind::Folder && back == EntryKind::Folder.href(id) {
        return Redirect::to(FILES_HOME);
    }
    Redirect::to(&back)
}

async fn rename_folder_page(
    session: Session,
    Path(id): Path<String>,
    Query(values): Query<FormData>,
) -> Markup {
    rename_page(&session, EntryKind::Folder, &id, &values).await
}

async fn rename_folder(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Response {
    rename_submit(&app_state, &session, EntryKind::Folder, &id, &form).await
}

async fn delete_folder_page(
    session: Session,
    Path(id): Path<String>,
    Query(values): Query<FormData>,
) -> Markup {
    delete_page(&session, EntryKind::Folder, &id, &values).await
}

async fn delete_folder(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Redirect {
    delete_submit(&app_state, &session, EntryKind::Folder, &id, &form).await
}

async fn rename_file_page(
    session: Session,
    Path(id): Path<String>,
    Query(values): Query<FormData>,
) -> Markup {
    rename_page(&session, EntryKind::File, &id, &values).await
}

async fn rename_file(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Response {
    rename_submit(&app_state, &session, EntryKind::File, &id, &form).await
}

async fn delete_file_page(
    session: Session,
    Path(id): Path<String>,
    Query(values): Query<FormData>,
) -> Markup {
    delete_page(&session, EntryKind::File, &id, &values).await
}

async fn delete_file(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Redirect {
    delete_submit(&app_state, &session, EntryKind::File, &id, &form).await
}

async fn download_file(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let path = format!("{}/download", EntryKind::File.upstream_path(&id));
    let download = app_state.api.download(&path).await.map_err(|e| {
        tracing::error!(id = %id, error = %e, "file download failed");
        <(StatusCode, String)>::from(e)
    })?;
    Ok(([(header::CONTENT_TYPE, download.content_type)], download.bytes).into_response())
}

/// How a file is shown inline, picked from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Pdf,
    Image,
    Unsupported,
}

impl PreviewKind {
    pub fn for_file(file_name: &str) -> Self {
        match file_icon(file_name) {
            "fa-file-pdf" => PreviewKind::Pdf,
            "fa-file-image" => PreviewKind::Image,
            _ => PreviewKind::Unsupported,
        }
    }
}

fn preview_body(id: &str, name: &str, back: &str) -> Markup {
    let content = format!("{}/preview/content", EntryKind::File.href(id));
    let download = format!("{}/download", EntryKind::File.href(id));
    let mut page = heading(1, name);
    let embed = match PreviewKind::for_file(name) {
        PreviewKind::Pdf => element(
            "iframe",
            &[("class", "file-preview-iframe"), ("src", &content), ("title", name)],
            Markup::new(),
        ),
        PreviewKind::Image => element(
            "img",
            &[("class", "file-preview-image"), ("src", &content), ("alt", name)],
            Markup::new(),
        ),
        PreviewKind::Unsupported => {
            let mut inner = icon("fa-file-alt");
            inner.push(paragraph("", "No preview available for this file type"));
            inner.push(paragraph("", "Please download the file to view it"));
            div("unsupported-preview", inner)
        }
    };
    page.push(div("file-preview", embed));
    let mut actions = link(&download, "btn btn-primary", "Download");
    actions.push(link(back, "btn btn-back", "Back"));
    page.push(div("record-actions", actions));
    page
}

async fn preview_page(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Query(values): Query<FormData>,
) -> Markup {
    let name = match values.optional("name") {
        Some(name) => name,
        None => match app_state
            .api
            .get::<FileEntry>(&EntryKind::File.upstream_path(&id))
            .await
        {
            Ok(file) => file.name,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "failed to load file for preview");
                format!("File #{}", id)
            }
        },
    };
    let body = preview_body(&id, &name, &return_target(values.get("back")));
    layout::render(&session, "Preview", Some(Section::Files), body).await
}

/// Streams the backend's inline rendition of a file.
async fn preview_content(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let path = format!("{}/preview", EntryKind::File.upstream_path(&id));
    let preview = app_state.api.download(&path).await.map_err(|e| {
        tracing::error!(id = %id, error = %e, "file preview failed");
        <(StatusCode, String)>::from(e)
    })?;
    Ok((
        [
            (header::CONTENT_TYPE, preview.content_type),
            (header::CONTENT_DISPOSITION, "inline".to_string()),
        ],
        preview.bytes,
    )
        .into_response())
}

/// Fields of the upload form, filled in as the multipart stream is read.
#[derive(Debug)]
struct UploadForm {
    back: String,
    folder_id: Option<String>,
    file: Option<(String, Option<String>, Vec<u8>)>,
}

async fn read_upload(multipart: &mut Multipart, form: &mut UploadForm) -> Result<(), MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "back" => form.back = return_target(field.text().await?.trim()),
            "folder_id" => {
                let value = field.text().await?;
                form.folder_id = Some(value.trim().to_string()).filter(|v| !v.is_empty());
            }
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !file_name.is_empty() {
                    form.file = Some((file_name, content_type, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn upload_error(e: &MultipartError, max_bytes: usize) -> Flash {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Flash::error(format!(
            "{}. The maximum size is {}.",
            ERR_UPLOAD_TOO_LARGE,
            format_size(max_bytes)
        ))
    } else {
        Flash::error(format!("Invalid upload: {}", e.body_text()))
    }
}

/// Forwards one file to the backend. Every outcome, including a body over
/// the configured limit, ends in a flash and a redirect. The return target
/// is also carried in the query string, so it survives a body that cannot
/// be read.
async fn upload_file(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<FormData>,
    mut multipart: Multipart,
) -> Redirect {
    let mut form = UploadForm {
        back: return_target(query.get("back")),
        folder_id: None,
        file: None,
    };
    let flash = match read_upload(&mut multipart, &mut form).await {
        Err(e) => {
            tracing::warn!(status = %e.status(), error = %e, "upload rejected");
            upload_error(&e, app_state.upload_max_bytes)
        }
        Ok(()) => match form.file {
            None => Flash::error(ERR_NO_FILE_SELECTED),
            Some((file_name, content_type, bytes)) => {
                let size = bytes.len();
                match app_state
                    .api
                    .upload("/upload/", file_name.clone(), content_type, bytes, form.folder_id)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(file = %file_name, size, "file uploaded");
                        Flash::success("File uploaded successfully")
                    }
                    Err(e) => {
                        tracing::error!(file = %file_name, error = %e, "upload failed");
                        Flash::error(format!("Failed to upload file: {}", e))
                    }
                }
            }
        },
    };
    session::push_flash(&session, flash).await;
    Redirect::to(&form.back)
}

pub fn routes(upload_max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/files", get(browse_root))
        .route(
            "/files/upload",
            post(upload_file).layer(DefaultBodyLimit::max(upload_max_bytes)),
        )
        .route("/files/folders", post(create_folder))
        .route("/files/folders/{id}", get(browse_folder))
        .route(
            "/files/folders/{id}/rename",
            get(rename_folder_page).post(rename_folder),
        )
        .route(
            "/files/folders/{id}/delete",
            get(delete_folder_page).post(delete_folder),
        )
        .route("/files/items/{id}/download", get(download_file))
        .route("/files/items/{id}/preview", get(preview_page))
        .route("/files/items/{id}/preview/content", get(preview_content))
        .route(
            "/files/items/{id}/rename",
            get(rename_file_page).post(rename_file),
        )
        .route(
            "/files/items/{id}/delete",
            get(delete_file_page).post(delete_file),
        )
}
