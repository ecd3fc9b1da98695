//! Page handlers shared by every panel. The `*_page` and `*_submit`
//! functions take an explicit [`PanelScope`] so that nested panels (budget
//! items of one activity, projects of one program area) reuse them; the
//! private axum handlers below bind them to the resource's root scope.

use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use tower_sessions::Session;

use crate::AppState;
use crate::constants::*;
use crate::html::{Markup, detail_row, div, heading, link, paragraph};
use crate::layout;
use crate::session::{self, Flash};
use crate::validation::FormData;

use super::actions::{self, ActionOutcome};
use super::form::{self, FormMode, SubmitOutcome};
use super::list::{render_list, row_actions};
use super::{Editable, PanelScope, Resource};

pub async fn list_page<R: Resource>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    params: &FormData,
) -> Markup {
    let role = session::current_role(session).await;
    let mut header = heading(1, &scope.title);
    if scope.editable {
        header.push(link(
            &format!("{}/new", scope.base),
            "btn btn-primary",
            &format!("Add {}", R::SINGULAR),
        ));
    }
    let mut body = div("panel-header", header);
    body.push(scope.toolbar.clone());
    body.push(R::list_controls(params, scope));
    body.push(render_list::<R>(&app_state.api, scope, role, params).await);
    layout::render(session, &scope.title, Some(scope.section), body).await
}

pub async fn show_page<R: Resource>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    id: &str,
) -> Response {
    let record: R::Record = match app_state.api.get(&R::item_path(id)).await {
        Ok(record) => record,
        Err(e) => {
            let status = if e.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_GATEWAY
            };
            let body = paragraph(
                "error",
                &format!("Failed to load {}: {}", R::SINGULAR.to_lowercase(), e),
            );
            let page = layout::render(session, R::SINGULAR, Some(scope.section), body).await;
            return (status, page).into_response();
        }
    };

    let role = session::current_role(session).await;
    let mut body = heading(1, &R::record_label(&record));
    let mut details = R::details(&record);
    details.extend(R::extra_details(&app_state.api, &record).await);
    let rows: Markup = details
        .into_iter()
        .map(|(label, value)| detail_row(label, value))
        .collect();
    body.push(div("record-details", rows));
    let mut actions = row_actions::<R>(&record, scope, role);
    actions.push(link(&scope.base, "btn btn-back", "Back to list"));
    body.push(div("record-actions", actions));
    layout::render(session, R::SINGULAR, Some(scope.section), body)
        .await
        .into_response()
}

pub async fn new_page<R: Editable>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
) -> Response {
    let values = R::defaults();
    let body = form::render::<R>(&app_state.api, scope, &FormMode::Create, &values, None).await;
    layout::render(session, &format!("Add {}", R::SINGULAR), Some(scope.section), body)
        .await
        .into_response()
}

pub async fn edit_page<R: Editable>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    id: &str,
) -> Response {
    let mode = FormMode::Edit(id.to_string());
    let title = format!("Edit {}", R::SINGULAR);
    match form::open::<R>(&app_state.api, &mode).await {
        Ok(values) => {
            let body = form::render::<R>(&app_state.api, scope, &mode, &values, None).await;
            layout::render(session, &title, Some(scope.section), body)
                .await
                .into_response()
        }
        Err(e) => {
            tracing::error!(resource = R::SLUG, id, error = %e, "failed to load record for editing");
            let status = if e.is_not_found() {
                StatusCode::NOT_FOUND
            } else {
                StatusCode::BAD_GATEWAY
            };
            let body = paragraph(
                "error",
                &format!("Failed to load {} details: {}", R::SINGULAR.to_lowercase(), e),
            );
            let page = layout::render(session, &title, Some(scope.section), body).await;
            (status, page).into_response()
        }
    }
}

/// Saves a create or edit form. Invalid input and backend failures keep the
/// form open with the submitted values.
pub async fn save_submit<R: Editable>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    mode: FormMode,
    submitted: &FormData,
) -> Response {
    let (status, message) = match form::submit::<R>(&app_state.api, scope, &mode, submitted).await {
        SubmitOutcome::Saved(created) => {
            let verb = if mode.is_edit() { "updated" } else { "created" };
            let mut target = scope.base.clone();
            let mut message = format!("{} {} successfully", R::SINGULAR, verb);
            if !mode.is_edit() {
                if let Some((redirect, follow_up)) = R::after_create(created.as_ref()) {
                    target = redirect;
                    message = follow_up;
                }
            }
            session::push_flash(session, Flash::success(message)).await;
            return Redirect::to(&target).into_response();
        }
        SubmitOutcome::Invalid(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.message),
        SubmitOutcome::Failed(e) => (
            StatusCode::BAD_GATEWAY,
            format!("Failed to save {}: {}", R::SINGULAR.to_lowercase(), e),
        ),
    };
    let body = form::render::<R>(&app_state.api, scope, &mode, submitted, Some(&message)).await;
    let title = match mode {
        FormMode::Create => format!("Add {}", R::SINGULAR),
        FormMode::Edit(_) => format!("Edit {}", R::SINGULAR),
    };
    let page = layout::render(session, &title, Some(scope.section), body).await;
    (status, page).into_response()
}

pub async fn action_page<R: Resource>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    id: &str,
    name: &str,
) -> Result<Response, (StatusCode, String)> {
    let action = actions::find::<R>(name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, ERR_UNKNOWN_ACTION.to_string()))?;

    let (label, values) = match app_state.api.get::<R::Record>(&R::item_path(id)).await {
        Ok(record) => (R::record_label(&record), (action.prefill)(&record)),
        Err(e) if e.is_not_found() => return Err(e.into()),
        Err(e) => {
            tracing::warn!(resource = R::SLUG, id, error = %e, "failed to load record for prompt");
            (fallback_label::<R>(id), FormData::new())
        }
    };
    let body = actions::render_prompt(scope, &action, id, &label, &values, None);
    Ok(layout::render(session, action.label, Some(scope.section), body)
        .await
        .into_response())
}

pub async fn action_submit<R: Resource>(
    app_state: &AppState,
    session: &Session,
    scope: &PanelScope,
    id: &str,
    name: &str,
    submitted: &FormData,
) -> Result<Response, (StatusCode, String)> {
    let action = actions::find::<R>(name)
        .ok_or_else(|| (StatusCode::NOT_FOUND, ERR_UNKNOWN_ACTION.to_string()))?;

    let flash = match actions::dispatch(&app_state.api, &action, id, submitted).await {
        ActionOutcome::Declined => Flash::info("Cancelled"),
        ActionOutcome::Done(_) => Flash::success(action.success),
        ActionOutcome::Failed(e) => Flash::error(format!(
            "Failed to {}: {}",
            action.label.to_lowercase(),
            e
        )),
        ActionOutcome::Invalid(e) => {
            let body = actions::render_prompt(
                scope,
                &action,
                id,
                &fallback_label::<R>(id),
                submitted,
                Some(&e.message),
            );
            let page = layout::render(session, action.label, Some(scope.section), body).await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };
    session::push_flash(session, flash).await;
    Ok(Redirect::to(&scope.base).into_response())
}

fn fallback_label<R: Resource>(id: &str) -> String {
    format!("{} #{}", R::SINGULAR, id)
}

async fn list<R: Resource>(
    State(app_state): State<AppState>,
    session: Session,
    Query(params): Query<FormData>,
) -> Markup {
    list_page::<R>(&app_state, &session, &PanelScope::root::<R>(), &params).await
}

async fn show<R: Resource>(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    show_page::<R>(&app_state, &session, &PanelScope::root::<R>(), &id).await
}

async fn new_form<R: Editable>(State(app_state): State<AppState>, session: Session) -> Response {
    new_page::<R>(&app_state, &session, &PanelScope::root::<R>()).await
}

async fn create<R: Editable>(
    State(app_state): State<AppState>,
    session: Session,
    Form(submitted): Form<FormData>,
) -> Response {
    let scope = PanelScope::root::<R>();
    save_submit::<R>(&app_state, &session, &scope, FormMode::Create, &submitted).await
}

async fn edit_form<R: Editable>(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    edit_page::<R>(&app_state, &session, &PanelScope::root::<R>(), &id).await
}

async fn update<R: Editable>(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(submitted): Form<FormData>,
) -> Response {
    let scope = PanelScope::root::<R>();
    save_submit::<R>(&app_state, &session, &scope, FormMode::Edit(id), &submitted).await
}

async fn action_prompt<R: Resource>(
    State(app_state): State<AppState>,
    session: Session,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, (StatusCode, String)> {
    action_page::<R>(&app_state, &session, &PanelScope::root::<R>(), &id, &name).await
}

async fn action_run<R: Resource>(
    State(app_state): State<AppState>,
    session: Session,
    Path((id, name)): Path<(String, String)>,
    Form(submitted): Form<FormData>,
) -> Result<Response, (StatusCode, String)> {
    let scope = PanelScope::root::<R>();
    action_submit::<R>(&app_state, &session, &scope, &id, &name, &submitted).await
}

/// List, detail and action routes for a resource under `/panels/{slug}`.
pub fn read_only_routes<R: Resource>() -> Router<AppState> {
    let base = format!("/panels/{}", R::SLUG);
    Router::new()
        .route(&base, get(list::<R>))
        .route(&format!("{}/{{id}}", base), get(show::<R>))
        .route(
            &format!("{}/{{id}}/actions/{{action}}", base),
            get(action_prompt::<R>).post(action_run::<R>),
        )
}

/// Full create/read/update/delete routes for an editable resource.
pub fn routes<R: Editable>() -> Router<AppState> {
    let base = format!("/panels/{}", R::SLUG);
    Router::new()
        .route(&base, get(list::<R>).post(create::<R>))
        .route(&format!("{}/new", base), get(new_form::<R>))
        .route(&format!("{}/{{id}}", base), get(show::<R>).post(update::<R>))
        .route(&format!("{}/{{id}}/edit", base), get(edit_form::<R>))
        .route(
            &format!("{}/{{id}}/actions/{{action}}", base),
            get(action_prompt::<R>).post(action_run::<R>),
        )
}
