use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
};
use reqwest::Method;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::AppState;
use crate::api::UpstreamCall;
use crate::constants::*;
use crate::error::ValidationError;
use crate::html::{Markup, element, message_row, table};
use crate::models::{Activity, BudgetItem};
use crate::navigation::Section;
use crate::panel::form::FormMode;
use crate::panel::handlers::{
    action_page, action_submit, edit_page, list_page, new_page, save_submit, show_page,
};
use crate::panel::{
    Action, Editable, FieldKind, FormField, PanelScope, Prompt, Resource, required_reason,
};
use crate::utils::{format_number, format_ugx, or_na, status_badge};
use crate::validation::FormData;

use super::activities::{Activities, budget_toolbar};

pub struct BudgetItems;

impl Resource for BudgetItems {
    type Record = BudgetItem;

    const SLUG: &'static str = "budget-items";
    const TITLE: &'static str = "Budget Items Pending Approval";
    const SINGULAR: &'static str = "Budget Item";
    const COLLECTION: &'static str = "/budget-items/pending-approval";
    const EMPTY_MESSAGE: &'static str = "No budget items found";
    const SECTION: Section = Section::BudgetQueue;
    const EDITABLE: bool = true;

    fn item_path(id: &str) -> String {
        format!("/budget-items/{}", urlencoding::encode(id))
    }

    fn record_id(record: &BudgetItem) -> &str {
        &record.id
    }

    fn record_label(record: &BudgetItem) -> String {
        record.item_name.clone()
    }

    fn columns() -> &'static [&'static str] {
        &[
            "Item",
            "Activity",
            "Description",
            "Quantity",
            "Unit Price",
            "Total",
            "Category",
            "Status",
        ]
    }

    /// The total is always recomputed from quantity and unit price; a total
    /// sent by the server is not shown.
    fn cells(record: &BudgetItem) -> Vec<Markup> {
        vec![
            Markup::text(&record.item_name),
            Markup::text(or_na(record.activity_name.as_deref())),
            Markup::text(record.description.as_deref().unwrap_or("-")),
            Markup::text(&format_number(record.quantity)),
            Markup::text(&format_ugx(record.unit_price)),
            Markup::text(&format_ugx(record.line_total())),
            Markup::text(&category_label(record.category.as_deref())),
            status_badge(record.status.as_deref(), BUDGET_STATUS_DRAFT),
        ]
    }

    fn footer(records: &[BudgetItem]) -> Option<Markup> {
        let total: f64 = records.iter().map(BudgetItem::line_total).sum();
        let columns = Self::columns().len() + 1;
        let label_span = (columns - 4).to_string();
        let mut cells = element(
            "td",
            &[("colspan", label_span.as_str()), ("class", "total-label")],
            Markup::text("Total Budget"),
        );
        cells.push(element(
            "td",
            &[("class", "budget-total")],
            Markup::text(&format_ugx(total)),
        ));
        cells.push(element("td", &[("colspan", "3")], Markup::new()));
        Some(element("tr", &[("class", "total-row")], cells))
    }

    fn details(record: &BudgetItem) -> Vec<(&'static str, Markup)> {
        vec![
            ("Item", Markup::text(&record.item_name)),
            ("Activity", Markup::text(or_na(record.activity_name.as_deref()))),
            ("Project", Markup::text(or_na(record.project_name.as_deref()))),
            ("Description", Markup::text(or_na(record.description.as_deref()))),
            ("Quantity", Markup::text(&format_number(record.quantity))),
            ("Unit Price", Markup::text(&format_ugx(record.unit_price))),
            ("Total", Markup::text(&format_ugx(record.line_total()))),
            (
                "Category",
                Markup::text(&category_label(record.category.as_deref())),
            ),
            (
                "Status",
                status_badge(record.status.as_deref(), BUDGET_STATUS_DRAFT),
            ),
            ("Submitted By", Markup::text(or_na(record.submitted_by.as_deref()))),
        ]
    }

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new(
                "submit",
                "Submit",
                Prompt::confirm("Are you sure you want to submit this budget item for approval?"),
                submit_call,
                "Budget item submitted for approval successfully",
            )
            .class("btn btn-submit")
            .when(is_draft),
            Action::new(
                "approve",
                "Approve",
                Prompt::confirm(
                    "Are you sure you want to approve this budget item? This will deduct funds from the program and main accounts.",
                ),
                approve_call,
                "Budget item approved successfully",
            )
            .class("btn btn-approve")
            .director_only()
            .when(is_submitted),
            Action::new(
                "reject",
                "Reject",
                Prompt::with_fields(
                    "Please enter the reason for rejection",
                    vec![FormField::new("reason", "Reason", FieldKind::TextArea).required()],
                ),
                reject_call,
                "Budget item rejected successfully",
            )
            .class("btn btn-danger")
            .director_only()
            .when(is_submitted),
            Action::delete().when(is_draft),
        ]
    }
}

impl Editable for BudgetItems {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("item_name", "Item Name").required(),
            FormField::new("description", "Description", FieldKind::TextArea),
            FormField::new(
                "quantity",
                "Quantity",
                FieldKind::Number { step: "1", min: "1" },
            )
            .required(),
            FormField::money("unit_price", "Unit Price (UGX)").required(),
            FormField::new("category", "Category", FieldKind::Select(BUDGET_CATEGORIES)).required(),
        ]
    }

    fn defaults() -> FormData {
        FormData::new().with("quantity", "1")
    }

    fn form_values(record: &BudgetItem) -> FormData {
        FormData::new()
            .with("item_name", record.item_name.as_str())
            .with("description", record.description.clone().unwrap_or_default())
            .with("quantity", record.quantity.to_string())
            .with("unit_price", record.unit_price.to_string())
            .with("category", record.category.clone().unwrap_or_default())
    }

    fn payload(form: &FormData) -> Result<Value, ValidationError> {
        let item_name = form.required("item_name", "Item name")?;
        let quantity = form.positive_number("quantity", "Quantity")?;
        let unit_price = form.non_negative_number("unit_price", "Unit price")?;
        let category = form.choice("category", "Category", BUDGET_CATEGORIES)?;
        Ok(json!({
            "item_name": item_name,
            "description": form.get("description"),
            "quantity": quantity,
            "unit_price": unit_price,
            "category": category,
        }))
    }
}

/// Read-only table of budget lines attached to an approval.
pub fn items_table(items: &[BudgetItem]) -> Markup {
    let columns = ["Item", "Description", "Qty", "Unit Price", "Total"];
    let rows: Markup = if items.is_empty() {
        message_row(columns.len(), "empty-state", "No budget items")
    } else {
        items
            .iter()
            .map(|item| {
                let cells: Markup = [
                    item.item_name.clone(),
                    item.description.clone().unwrap_or_else(|| "-".to_string()),
                    format_number(item.quantity),
                    format_ugx(item.unit_price),
                    format_ugx(item.line_total()),
                ]
                .iter()
                .map(|c| element("td", &[], Markup::text(c)))
                .collect();
                element("tr", &[], cells)
            })
            .collect()
    };
    table("data-table budget-lines", &columns, rows)
}

fn category_label(category: Option<&str>) -> String {
    match category {
        Some(key) => BUDGET_CATEGORIES
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| key.to_string()),
        None => "-".to_string(),
    }
}

fn status_is(record: &BudgetItem, status: &str) -> bool {
    record
        .status
        .as_deref()
        .map(|s| s.eq_ignore_ascii_case(status))
        .unwrap_or(false)
}

fn is_draft(record: &BudgetItem) -> bool {
    record.status.as_deref().is_none_or(str::is_empty) || status_is(record, BUDGET_STATUS_DRAFT)
}

fn is_submitted(record: &BudgetItem) -> bool {
    status_is(record, BUDGET_STATUS_SUBMITTED)
}

fn submit_call(id: &str, _form: &FormData) -> Result<UpstreamCall, ValidationError> {
    Ok(UpstreamCall::new(
        Method::PUT,
        format!("{}/submit", BudgetItems::item_path(id)),
    ))
}

fn approve_call(id: &str, _form: &FormData) -> Result<UpstreamCall, ValidationError> {
    Ok(UpstreamCall::new(
        Method::PUT,
        format!("{}/approve", BudgetItems::item_path(id)),
    ))
}

fn reject_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    let reason = required_reason(form, "reason")?;
    Ok(UpstreamCall::new(
        Method::PUT,
        format!("{}/reject", BudgetItems::item_path(id)),
    )
    .with_body(json!({ "reason": reason })))
}

/// The Director's queue of submitted items across all activities.
fn queue_scope() -> PanelScope {
    PanelScope {
        editable: false,
        ..PanelScope::root::<BudgetItems>()
    }
}

/// Budget items of one activity.
fn activity_scope(activity_id: &str, activity_name: Option<&str>) -> PanelScope {
    let encoded = urlencoding::encode(activity_id);
    PanelScope {
        upstream: format!("/activities/{}/budget-items/", encoded),
        base: format!("/panels/activities/{}/budget-items", encoded),
        title: match activity_name {
            Some(name) => format!("Budget Items: {}", name),
            None => "Budget Items".to_string(),
        },
        section: Section::Activities,
        editable: true,
        toolbar: budget_toolbar(activity_id),
    }
}

async fn queue(
    State(app_state): State<AppState>,
    session: Session,
    Query(params): Query<FormData>,
) -> Markup {
    list_page::<BudgetItems>(&app_state, &session, &queue_scope(), &params).await
}

async fn queue_show(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    show_page::<BudgetItems>(&app_state, &session, &queue_scope(), &id).await
}

async fn queue_action_prompt(
    State(app_state): State<AppState>,
    session: Session,
    Path((id, name)): Path<(String, String)>,
) -> Result<Response, (StatusCode, String)> {
    action_page::<BudgetItems>(&app_state, &session, &queue_scope(), &id, &name).await
}

async fn queue_action_run(
    State(app_state): State<AppState>,
    session: Session,
    Path((id, name)): Path<(String, String)>,
    Form(submitted): Form<FormData>,
) -> Result<Response, (StatusCode, String)> {
    action_submit::<BudgetItems>(&app_state, &session, &queue_scope(), &id, &name, &submitted).await
}

async fn activity_list(
    State(app_state): State<AppState>,
    session: Session,
    Path(activity_id): Path<String>,
    Query(params): Query<FormData>,
) -> Markup {
    let name = match app_state
        .api
        .get::<Activity>(&Activities::item_path(&activity_id))
        .await
    {
        Ok(activity) => Some(activity.name),
        Err(e) => {
            tracing::warn!(activity_id, error = %e, "failed to load activity for budget page");
            None
        }
    };
    let scope = activity_scope(&activity_id, name.as_deref());
    list_page::<BudgetItems>(&app_state, &session, &scope, &params).await
}

async fn activity_create(
    State(app_state): State<AppState>,
    session: Session,
    Path(activity_id): Path<String>,
    Form(submitted): Form<FormData>,
) -> Response {
    let scope = activity_scope(&activity_id, None);
    save_submit::<BudgetItems>(&app_state, &session, &scope, FormMode::Create, &submitted).await
}

async fn activity_new(
    State(app_state): State<AppState>,
    session: Session,
    Path(activity_id): Path<String>,
) -> Response {
    new_page::<BudgetItems>(&app_state, &session, &activity_scope(&activity_id, None)).await
}

async fn activity_show(
    State(app_state): State<AppState>,
    session: Session,
    Path((activity_id, id)): Path<(String, String)>,
) -> Response {
    show_page::<BudgetItems>(&app_state, &session, &activity_scope(&activity_id, None), &id).await
}

async fn activity_update(
    State(app_state): State<AppState>,
    session: Session,
    Path((activity_id, id)): Path<(String, String)>,
    Form(submitted): Form<FormData>,
) -> Response {
    let scope = activity_scope(&activity_id, None);
    save_submit::<BudgetItems>(&app_state, &session, &scope, FormMode::Edit(id), &submitted).await
}

async fn activity_edit(
    State(app_state): State<AppState>,
    session: Session,
    Path((activity_id, id)): Path<(String, String)>,
) -> Response {
    edit_page::<BudgetItems>(&app_state, &session, &activity_scope(&activity_id, None), &id).await
}

async fn activity_action_prompt(
    State(app_state): State<AppState>,
    session: Session,
    Path((activity_id, id, name)): Path<(String, String, String)>,
) -> Result<Response, (StatusCode, String)> {
    let scope = activity_scope(&activity_id, None);
    action_page::<BudgetItems>(&app_state, &session, &scope, &id, &name).await
}

async fn activity_action_run(
    State(app_state): State<AppState>,
    session: Session,
    Path((activity_id, id, name)): Path<(String, String, String)>,
    Form(submitted): Form<FormData>,
) -> Result<Response, (StatusCode, String)> {
    let scope = activity_scope(&activity_id, None);
    action_submit::<BudgetItems>(&app_state, &session, &scope, &id, &name, &submitted).await
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/panels/budget-items", get(queue))
        .route("/panels/budget-items/{id}", get(queue_show))
        .route(
            "/panels/budget-items/{id}/actions/{action}",
            get(queue_action_prompt).post(queue_action_run),
        )
        .route(
            "/panels/activities/{id}/budget-items",
            get(activity_list).post(activity_create),
        )
        .route("/panels/activities/{id}/budget-items/new", get(activity_new))
        .route(
            "/panels/activities/{id}/budget-items/{item_id}",
            get(activity_show).post(activity_update),
        )
        .route(
            "/panels/activities/{id}/budget-items/{item_id}/edit",
            get(activity_edit),
        )
        .route(
            "/panels/activities/{id}/budget-items/{item_id}/actions/{action}",
            get(activity_action_prompt).post(activity_action_run),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, unit_price: f64, total: Option<f64>, status: Option<&str>) -> BudgetItem {
        BudgetItem {
            id: "1".to_string(),
            activity_id: Some("2".to_string()),
            activity_name: None,
            project_name: None,
            item_name: "Cement".to_string(),
            description: None,
            quantity,
            unit_price,
            category: Some("materials".to_string()),
            status: status.map(str::to_string),
            total,
            submitted_by: None,
            submitted_at: None,
        }
    }

    #[test]
    fn displayed_total_ignores_server_total() {
        let cells = BudgetItems::cells(&item(3.0, 2500.0, Some(1.0), None));
        assert_eq!(cells[5].as_str(), "UGX 7,500");
    }

    #[test]
    fn footer_sums_line_totals() {
        let records = vec![
            item(3.0, 2500.0, Some(99.0), None),
            item(2.0, 1000.0, None, None),
        ];
        let footer = BudgetItems::footer(&records).unwrap();
        assert!(footer.as_str().contains("UGX 9,500"));
    }

    #[test]
    fn quantity_must_be_positive() {
        let form = FormData::new()
            .with("item_name", "Cement")
            .with("quantity", "0")
            .with("unit_price", "2500")
            .with("category", "materials");
        assert_eq!(BudgetItems::payload(&form).unwrap_err().field, "quantity");
    }

    #[test]
    fn reject_needs_a_reason() {
        let err = reject_call("5", &FormData::new().with("reason", "  ")).unwrap_err();
        assert_eq!(err.message, ERR_REASON_REQUIRED);
        let call = reject_call("5", &FormData::new().with("reason", "Too expensive")).unwrap();
        assert_eq!(call.path, "/budget-items/5/reject");
        assert_eq!(call.body, Some(json!({"reason": "Too expensive"})));
    }

    #[test]
    fn director_actions_only_for_submitted_items() {
        let actions = BudgetItems::actions();
        let approve = actions.iter().find(|a| a.name == "approve").unwrap();
        let submitted = item(1.0, 1.0, None, Some("submitted"));
        let draft = item(1.0, 1.0, None, None);
        assert!(approve.visible(&submitted, Some(crate::navigation::Role::Director)));
        assert!(!approve.visible(&submitted, Some(crate::navigation::Role::ProgramOfficer)));
        assert!(!approve.visible(&draft, Some(crate::navigation::Role::Director)));
    }

    #[test]
    fn items_table_recomputes_line_totals() {
        let html = items_table(&[item(4.0, 1500.0, Some(1.0), None)]);
        assert!(html.as_str().contains("UGX 6,000"));
        assert!(items_table(&[]).as_str().contains("No budget items"));
    }

    #[test]
    fn activity_scope_nests_under_activity() {
        let scope = activity_scope("7", Some("Borehole"));
        assert_eq!(scope.upstream, "/activities/7/budget-items/");
        assert_eq!(scope.record_href("3"), "/panels/activities/7/budget-items/3");
        assert_eq!(scope.title, "Budget Items: Borehole");
    }
}
