use axum::{
    Form, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use reqwest::Method;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::AppState;
use crate::api::{ApiClient, UpstreamCall};
use crate::constants::*;
use crate::error::ValidationError;
use crate::html::{Markup, div, element, heading, link, paragraph, submit_button};
use crate::layout;
use crate::models::{Activity, ApprovedBudget, BudgetApproval, BudgetItem, BudgetStatus};
use crate::navigation::Section;
use crate::panel::{self, Action, Editable, FieldKind, FormField, PanelScope, Prompt, Resource};
use crate::session::{self, Flash};
use crate::utils::{format_date, format_ugx, or_na, parse_date, status_badge};
use crate::validation::FormData;

use super::activity_approvals;
use super::budget_items::items_table;
use super::id_value;

pub struct Activities;

impl Resource for Activities {
    type Record = Activity;

    const SLUG: &'static str = "activities";
    const TITLE: &'static str = "Activities";
    const SINGULAR: &'static str = "Activity";
    const COLLECTION: &'static str = "/activities/";
    const EMPTY_MESSAGE: &'static str = "No activities found";
    const SECTION: Section = Section::Activities;
    const EDITABLE: bool = true;

    fn record_id(record: &Activity) -> &str {
        &record.id
    }

    fn record_label(record: &Activity) -> String {
        record.name.clone()
    }

    fn columns() -> &'static [&'static str] {
        &["Activity", "Project", "Start Date", "End Date", "Budget", "Status"]
    }

    fn cells(record: &Activity) -> Vec<Markup> {
        vec![
            Markup::text(&record.name),
            Markup::text(or_na(record.project_name.as_deref())),
            Markup::text(&date_or_na(record.start_date.as_deref())),
            Markup::text(&date_or_na(record.end_date.as_deref())),
            Markup::text(&format_ugx(record.budget.unwrap_or(0.0))),
            status_badge(record.status.as_deref(), ACTIVITY_STATUS_PLANNED),
        ]
    }

    fn details(record: &Activity) -> Vec<(&'static str, Markup)> {
        vec![
            ("Activity", Markup::text(&record.name)),
            ("Project", Markup::text(or_na(record.project_name.as_deref()))),
            ("Description", Markup::text(or_na(record.description.as_deref()))),
            ("Start Date", Markup::text(&date_or_na(record.start_date.as_deref()))),
            ("End Date", Markup::text(&date_or_na(record.end_date.as_deref()))),
            ("Budget", Markup::text(&format_ugx(record.budget.unwrap_or(0.0)))),
            (
                "Status",
                status_badge(record.status.as_deref(), ACTIVITY_STATUS_PLANNED),
            ),
        ]
    }

    fn links(record: &Activity, scope: &PanelScope) -> Vec<(String, &'static str)> {
        vec![(format!("{}/budget-items", scope.record_href(&record.id)), "Budget")]
    }

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new(
                "submit",
                "Submit",
                Prompt::confirm("Submit this activity budget for director approval?"),
                submit_for_approval,
                "Activity submitted for approval successfully",
            )
            .class("btn btn-submit")
            .when(is_open),
            Action::new(
                "submit-budget",
                "Submit Budget",
                Prompt::confirm("Are you sure you want to submit this budget for approval?"),
                submit_budget,
                "Budget submitted for approval successfully",
            )
            .class("btn btn-submit")
            .when(is_open),
            Action::new(
                "request-funding",
                "Request Funding",
                Prompt::with_fields(
                    "Enter the budget amount you're requesting for this activity",
                    activity_approvals::request_fields(),
                ),
                activity_approvals::request_call,
                "Approval request submitted successfully",
            )
            .class("btn btn-submit")
            .prefill(activity_approvals::request_prefill),
            Action::delete(),
        ]
    }

    /// Budget approval state, with the approved budget once there is one.
    fn extra_details(
        api: &ApiClient,
        record: &Activity,
    ) -> impl Future<Output = Vec<(&'static str, Markup)>> + Send {
        async move {
            let base = Activities::item_path(&record.id);
            let status = match api.get::<BudgetStatus>(&format!("{}/budget-status/", base)).await {
                Ok(status) => status.status,
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "failed to load budget status");
                    return Vec::new();
                }
            };
            let mut rows = vec![(
                "Budget Status",
                status_badge(status.as_deref(), BUDGET_STATUS_DRAFT),
            )];
            let approved = status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(BUDGET_STATUS_APPROVED));
            if approved {
                match api.get::<ApprovedBudget>(&format!("{}/approved-budget/", base)).await {
                    Ok(budget) => rows.extend(approved_budget_rows(&budget)),
                    Err(e) => {
                        tracing::warn!(id = %record.id, error = %e, "failed to load approved budget")
                    }
                }
            }
            rows
        }
    }
}

impl Editable for Activities {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Activity Name").required(),
            FormField::new("project_id", "Project", FieldKind::Lookup("/projects/")).required(),
            FormField::new("description", "Description", FieldKind::TextArea),
            FormField::new("start_date", "Start Date", FieldKind::Date).required(),
            FormField::new("end_date", "End Date", FieldKind::Date).required(),
            FormField::money("budget", "Budget (UGX)").required(),
            FormField::new("status", "Status", FieldKind::Select(ACTIVITY_STATUSES)),
        ]
    }

    fn defaults() -> FormData {
        FormData::new().with("status", ACTIVITY_STATUS_PLANNED)
    }

    fn form_values(record: &Activity) -> FormData {
        let day = |d: &Option<String>| {
            d.as_deref()
                .map(|d| d.get(..10).unwrap_or(d).to_string())
                .unwrap_or_default()
        };
        FormData::new()
            .with("name", record.name.as_str())
            .with("project_id", record.project_id.clone().unwrap_or_default())
            .with("description", record.description.clone().unwrap_or_default())
            .with("start_date", day(&record.start_date))
            .with("end_date", day(&record.end_date))
            .with("budget", record.budget.map(|b| b.to_string()).unwrap_or_default())
            .with(
                "status",
                record
                    .status
                    .clone()
                    .unwrap_or_else(|| ACTIVITY_STATUS_PLANNED.to_string()),
            )
    }

    fn payload(form: &FormData) -> Result<Value, ValidationError> {
        let name = form.required("name", "Activity name")?;
        let project_id = form.required("project_id", "Project")?;
        let start_date = form.date("start_date", "Start date")?;
        let end_date = form.date("end_date", "End date")?;
        if parse_date(&end_date) < parse_date(&start_date) {
            return Err(ValidationError::new(
                "end_date",
                "End date cannot be before the start date",
            ));
        }
        let budget = form.non_negative_number("budget", "Budget")?;
        let status = match form.optional("status") {
            Some(_) => form.choice("status", "Status", ACTIVITY_STATUSES)?,
            None => ACTIVITY_STATUS_PLANNED.to_string(),
        };
        Ok(json!({
            "name": name,
            "project_id": id_value(&project_id),
            "description": form.get("description"),
            "start_date": start_date,
            "end_date": end_date,
            "budget": budget,
            "status": status,
        }))
    }

    /// A new activity goes straight to its budget page.
    fn after_create(created: Option<&Value>) -> Option<(String, String)> {
        let created = created?;
        let id = match created.get("id")? {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        let name = created.get("name").and_then(Value::as_str).unwrap_or("the activity");
        Some((
            budget_href(&id),
            format!("Activity created successfully. Add budget items for \"{}\".", name),
        ))
    }
}

fn approved_budget_rows(budget: &ApprovedBudget) -> Vec<(&'static str, Markup)> {
    let total = budget
        .total_amount
        .unwrap_or_else(|| budget.items.iter().map(BudgetItem::line_total).sum());
    vec![
        ("Approved Budget", Markup::text(&format_ugx(total))),
        ("Approved By", Markup::text(or_na(budget.approved_by.as_deref()))),
        (
            "Approval Date",
            Markup::text(&date_or_na(budget.approval_date.as_deref())),
        ),
        ("Approved Items", items_table(&budget.items)),
    ]
}

fn date_or_na(value: Option<&str>) -> String {
    match value.filter(|v| !v.trim().is_empty()) {
        Some(v) => format_date(v),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn is_open(record: &Activity) -> bool {
    matches!(
        record.status.as_deref().map(str::to_lowercase).as_deref(),
        None | Some("") | Some("planned") | Some("draft")
    )
}

fn submit_for_approval(id: &str, _form: &FormData) -> Result<UpstreamCall, ValidationError> {
    Ok(UpstreamCall::new(Method::PUT, Activities::item_path(id))
        .with_body(json!({ "status": ACTIVITY_STATUS_PENDING_APPROVAL })))
}

fn submit_budget(id: &str, _form: &FormData) -> Result<UpstreamCall, ValidationError> {
    Ok(UpstreamCall::new(
        Method::POST,
        format!("{}/submit-budget/", Activities::item_path(id)),
    ))
}

pub fn budget_href(activity_id: &str) -> String {
    format!(
        "{}/budget-items",
        PanelScope::root::<Activities>().record_href(activity_id)
    )
}

fn request_href(activity_id: &str) -> String {
    format!(
        "{}/request-approval",
        PanelScope::root::<Activities>().record_href(activity_id)
    )
}

/// Toolbar shown above an activity's budget items.
pub fn budget_toolbar(activity_id: &str) -> Markup {
    div(
        "panel-toolbar",
        link(
            &request_href(activity_id),
            "btn btn-submit",
            "Request Director Approval",
        ),
    )
}

async fn request_approval_page(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let name = match app_state.api.get::<Activity>(&Activities::item_path(&id)).await {
        Ok(activity) => activity.name,
        Err(e) => {
            tracing::warn!(id = %id, error = %e, "failed to load activity");
            format!("Activity #{}", id)
        }
    };
    let mut body = heading(2, &format!("Request approval: {}", name));
    body.push(paragraph(
        "prompt-message",
        "Send this activity's budget to the Director for approval?",
    ));
    let mut buttons = submit_button("confirm", "yes", "btn btn-submit", "Submit for Approval");
    buttons.push(submit_button("confirm", "no", "btn btn-cancel", "Cancel"));
    let target = request_href(&id);
    body.push(element(
        "form",
        &[("method", "post"), ("action", &target), ("class", "action-form")],
        div("form-actions", buttons),
    ));
    layout::render(&session, "Request Approval", Some(Section::Activities), body)
        .await
        .into_response()
}

/// Creates a pending budget approval for the activity unless one is already
/// waiting for the Director.
async fn request_approval(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(submitted): Form<FormData>,
) -> Result<Response, (StatusCode, String)> {
    let back = budget_href(&id);
    if !submitted.confirmed() {
        session::push_flash(&session, Flash::info("Cancelled")).await;
        return Ok(Redirect::to(&back).into_response());
    }

    let existing_path = format!("/budget-approvals/activity/{}", urlencoding::encode(&id));
    match app_state.api.get::<BudgetApproval>(&existing_path).await {
        Ok(existing) if existing.is_pending() => {
            let name = existing.activity_name.unwrap_or_else(|| format!("Activity #{}", id));
            session::push_flash(
                &session,
                Flash::info(format!(
                    "There's already a pending approval request for \"{}\"",
                    name
                )),
            )
            .await;
            return Ok(Redirect::to(&back).into_response());
        }
        Ok(_) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => tracing::warn!(id = %id, error = %e, "could not check existing approval"),
    }

    let activity: Activity = match app_state.api.get(&Activities::item_path(&id)).await {
        Ok(activity) => activity,
        Err(e) => {
            session::push_flash(
                &session,
                Flash::error(format!("Failed to submit budget for approval: {}", e)),
            )
            .await;
            return Ok(Redirect::to(&back).into_response());
        }
    };

    let call = UpstreamCall::new(Method::POST, "/budget-approvals/").with_body(json!({
        "activity_id": id_value(&activity.id),
        "approved_amount": activity.budget.unwrap_or(0.0),
        "status": APPROVAL_STATUS_PENDING,
    }));
    let flash = match app_state.api.execute(&call).await {
        Ok(_) => {
            tracing::info!(id = %id, "budget approval requested");
            Flash::success(format!(
                "Budget approval request for \"{}\" has been submitted to the Director",
                activity.name
            ))
        }
        Err(e) => Flash::error(format!("Failed to submit budget for approval: {}", e)),
    };
    session::push_flash(&session, flash).await;
    Ok(Redirect::to(&back).into_response())
}

pub fn routes() -> Router<AppState> {
    panel::routes::<Activities>().route(
        "/panels/activities/{id}/request-approval",
        get(request_approval_page).post(request_approval),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> FormData {
        FormData::new()
            .with("name", "Borehole drilling")
            .with("project_id", "3")
            .with("start_date", "2024-02-01")
            .with("end_date", "2024-03-01")
            .with("budget", "1500000")
    }

    #[test]
    fn payload_defaults_to_planned() {
        let payload = Activities::payload(&form()).unwrap();
        assert_eq!(payload["project_id"], 3);
        assert_eq!(payload["status"], ACTIVITY_STATUS_PLANNED);
        assert_eq!(payload["budget"], 1500000.0);
    }

    #[test]
    fn end_date_must_not_precede_start() {
        let bad = form().with("end_date", "2024-01-01");
        assert_eq!(Activities::payload(&bad).unwrap_err().field, "end_date");
    }

    #[test]
    fn after_create_points_at_budget_items() {
        let created = json!({"id": 9, "name": "Borehole drilling"});
        let (href, message) = Activities::after_create(Some(&created)).unwrap();
        assert_eq!(href, "/panels/activities/9/budget-items");
        assert!(message.contains("Borehole drilling"));
        assert!(Activities::after_create(None).is_none());
    }

    #[test]
    fn submit_sets_pending_status() {
        let call = submit_for_approval("4", &FormData::new()).unwrap();
        assert_eq!(call.method, Method::PUT);
        assert_eq!(call.path, "/activities/4");
        assert_eq!(call.body, Some(json!({"status": "pending approval"})));
    }

    #[test]
    fn approved_budget_falls_back_to_item_totals() {
        let budget: ApprovedBudget = serde_json::from_value(json!({
            "approved_by": "Director",
            "items": [{"item_name": "Cement", "quantity": 2, "unit_price": 5000}]
        }))
        .unwrap();
        let rows = approved_budget_rows(&budget);
        assert_eq!(rows[0].1.as_str(), "UGX 10,000");
        assert_eq!(rows[1].1.as_str(), "Director");
    }

    #[test]
    fn funding_request_starts_from_planned_budget() {
        let activity: Activity =
            serde_json::from_value(json!({"id": 1, "name": "A", "budget": 500000})).unwrap();
        let action = Activities::actions()
            .into_iter()
            .find(|a| a.name == "request-funding")
            .unwrap();
        assert_eq!((action.prefill)(&activity).get("requested_amount"), "500000");
    }

    #[test]
    fn only_open_activities_can_be_submitted() {
        let mut activity: Activity = serde_json::from_value(json!({"id": 1, "name": "A"})).unwrap();
        assert!(is_open(&activity));
        activity.status = Some("pending approval".to_string());
        assert!(!is_open(&activity));
    }
}
