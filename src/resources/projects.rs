use axum::{
    Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::AppState;
use crate::api::ApiClient;
use crate::constants::*;
use crate::error::ValidationError;
use crate::html::{Markup, detail_row, div, heading, link, paragraph};
use crate::layout;
use crate::models::{ProgramArea, Project};
use crate::navigation::Section;
use crate::panel::handlers::list_page;
use crate::panel::list::render_list;
use crate::panel::{Action, Editable, FieldKind, FormField, PanelScope, Resource};
use crate::session;
use crate::utils::{format_date, format_ugx, or_na, status_badge};
use crate::validation::FormData;

use super::id_value;

pub struct Projects;

impl Resource for Projects {
    type Record = Project;

    const SLUG: &'static str = "projects";
    const TITLE: &'static str = "Projects";
    const SINGULAR: &'static str = "Project";
    const COLLECTION: &'static str = "/projects/";
    const EMPTY_MESSAGE: &'static str = "No projects found";
    const SECTION: Section = Section::Projects;
    const EDITABLE: bool = true;

    fn record_id(record: &Project) -> &str {
        &record.id
    }

    fn record_label(record: &Project) -> String {
        record.name.clone()
    }

    fn columns() -> &'static [&'static str] {
        &["Project", "Program Area", "Start Date", "End Date", "Budget", "Status"]
    }

    fn cells(record: &Project) -> Vec<Markup> {
        vec![
            Markup::text(&record.name),
            Markup::text(or_na(record.program_area.as_deref())),
            Markup::text(&optional_date(record.start_date.as_deref())),
            Markup::text(&optional_date(record.end_date.as_deref())),
            Markup::text(&format_ugx(record.budget.unwrap_or(0.0))),
            status_badge(record.status.as_deref(), "planned"),
        ]
    }

    fn details(record: &Project) -> Vec<(&'static str, Markup)> {
        vec![
            ("Project", Markup::text(&record.name)),
            ("Program Area", Markup::text(or_na(record.program_area.as_deref()))),
            ("Description", Markup::text(or_na(record.description.as_deref()))),
            ("Start Date", Markup::text(&optional_date(record.start_date.as_deref()))),
            ("End Date", Markup::text(&optional_date(record.end_date.as_deref()))),
            ("Budget", Markup::text(&format_ugx(record.budget.unwrap_or(0.0)))),
            ("Status", status_badge(record.status.as_deref(), "planned")),
        ]
    }
}

impl Editable for Projects {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Project Name").required(),
            FormField::new(
                "program_area_id",
                "Program Area",
                FieldKind::Lookup("/program_areas/"),
            )
            .required(),
            FormField::new("description", "Description", FieldKind::TextArea),
            FormField::new("start_date", "Start Date", FieldKind::Date),
            FormField::new("end_date", "End Date", FieldKind::Date),
            FormField::money("budget", "Budget (UGX)"),
        ]
    }

    fn form_values(record: &Project) -> FormData {
        let day = |d: &Option<String>| {
            d.as_deref()
                .map(|d| d.get(..10).unwrap_or(d).to_string())
                .unwrap_or_default()
        };
        FormData::new()
            .with("name", record.name.as_str())
            .with(
                "program_area_id",
                record.program_area_id.clone().unwrap_or_default(),
            )
            .with("description", record.description.clone().unwrap_or_default())
            .with("start_date", day(&record.start_date))
            .with("end_date", day(&record.end_date))
            .with("budget", record.budget.map(|b| b.to_string()).unwrap_or_default())
    }

    fn payload(form: &FormData) -> Result<Value, ValidationError> {
        let name = form.required("name", "Project name")?;
        let program_area_id = form.required("program_area_id", "Program area")?;
        let start_date = match form.optional("start_date") {
            Some(_) => Some(form.date("start_date", "Start date")?),
            None => None,
        };
        let end_date = match form.optional("end_date") {
            Some(_) => Some(form.date("end_date", "End date")?),
            None => None,
        };
        let budget = form.optional_number("budget", "Budget")?;
        Ok(json!({
            "name": name,
            "program_area_id": id_value(&program_area_id),
            "description": form.get("description"),
            "start_date": start_date,
            "end_date": end_date,
            "budget": budget,
        }))
    }
}

fn optional_date(value: Option<&str>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .map(format_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Program areas with their balances. Read only.
pub struct ProgramAreas;

impl Resource for ProgramAreas {
    type Record = ProgramArea;

    const SLUG: &'static str = "program-areas";
    const TITLE: &'static str = "Program Areas";
    const SINGULAR: &'static str = "Program Area";
    const COLLECTION: &'static str = "/program_areas/";
    const EMPTY_MESSAGE: &'static str = "No program areas found";
    const SECTION: Section = Section::ProgramAreas;

    fn record_id(record: &ProgramArea) -> &str {
        &record.id
    }

    fn record_label(record: &ProgramArea) -> String {
        record.name.clone()
    }

    fn columns() -> &'static [&'static str] {
        &["Program Area", "Balance"]
    }

    fn cells(record: &ProgramArea) -> Vec<Markup> {
        vec![
            Markup::text(&record.name),
            Markup::text(&format_ugx(record.balance.unwrap_or(0.0))),
        ]
    }

    fn details(record: &ProgramArea) -> Vec<(&'static str, Markup)> {
        vec![
            ("Program Area", Markup::text(&record.name)),
            (
                "Balance",
                Markup::text(&format_ugx(record.balance.unwrap_or(0.0))),
            ),
        ]
    }

    fn actions() -> Vec<Action<Self>> {
        Vec::new()
    }
}

fn program_area_scope() -> PanelScope {
    PanelScope {
        base: "/program-areas".to_string(),
        ..PanelScope::root::<ProgramAreas>()
    }
}

/// Projects of one program area; rows link into the projects panel.
fn area_projects_scope(area_id: &str) -> PanelScope {
    PanelScope {
        upstream: format!("/program_areas/{}/projects/", urlencoding::encode(area_id)),
        ..PanelScope::root::<Projects>()
    }
}

/// Balance cards for the Director's dashboard.
pub async fn program_area_summary(api: &ApiClient) -> Markup {
    let mut section = heading(2, "Program Areas");
    match api.list::<ProgramArea>(ProgramAreas::COLLECTION, &[]).await {
        Ok(areas) if areas.is_empty() => {
            section.push(paragraph("empty-state", ProgramAreas::EMPTY_MESSAGE));
        }
        Ok(areas) => {
            let scope = program_area_scope();
            let cards: Markup = areas
                .iter()
                .map(|area| {
                    let mut card = link(&scope.record_href(&area.id), "program-card-title", &area.name);
                    card.push(paragraph(
                        "program-card-balance",
                        &format_ugx(area.balance.unwrap_or(0.0)),
                    ));
                    div("program-card", card)
                })
                .collect();
            section.push(div("program-cards", cards));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to load program areas");
            section.push(paragraph(
                "error",
                &format!("Failed to load program areas: {}", e),
            ));
        }
    }
    div("program-areas", section)
}

async fn program_areas(
    State(app_state): State<AppState>,
    session: Session,
    Query(params): Query<FormData>,
) -> Markup {
    list_page::<ProgramAreas>(&app_state, &session, &program_area_scope(), &params).await
}

async fn program_area_projects(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let role = session::current_role(&session).await;
    let mut body = match app_state
        .api
        .get::<ProgramArea>(&ProgramAreas::item_path(&id))
        .await
    {
        Ok(area) => {
            let mut header = heading(1, &area.name);
            let rows: Markup = ProgramAreas::details(&area)
                .into_iter()
                .map(|(label, value)| detail_row(label, value))
                .collect();
            header.push(div("record-details", rows));
            header
        }
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "failed to load program area");
            heading(1, &format!("Program Area #{}", id))
        }
    };
    body.push(heading(2, "Projects"));
    body.push(render_list::<Projects>(&app_state.api, &area_projects_scope(&id), role, &FormData::new()).await);
    body.push(link("/program-areas", "btn btn-back", "Back to program areas"));
    layout::render(&session, "Program Area", Some(Section::ProgramAreas), body)
        .await
        .into_response()
}

pub fn program_area_routes() -> Router<AppState> {
    Router::new()
        .route("/program-areas", get(program_areas))
        .route("/program-areas/{id}", get(program_area_projects))
}
