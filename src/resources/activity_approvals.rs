use reqwest::Method;
use serde_json::json;

use crate::api::UpstreamCall;
use crate::constants::*;
use crate::error::ValidationError;
use crate::html::Markup;
use crate::models::{Activity, ActivityApproval, ApprovalDecision};
use crate::navigation::Section;
use crate::panel::{Action, FieldKind, FormField, Prompt, Resource, required_reason};
use crate::utils::{format_date, format_ugx, or_na, status_badge};
use crate::validation::FormData;

use super::budget_items::items_table;
use super::{id_value, to_payload};

/// Funding requests for whole activities, waiting for the Director.
pub struct ActivityApprovals;

impl Resource for ActivityApprovals {
    type Record = ActivityApproval;

    const SLUG: &'static str = "activity-approvals";
    const TITLE: &'static str = "Pending Activity Approvals";
    const SINGULAR: &'static str = "Activity Approval";
    const COLLECTION: &'static str = "/activity-approvals/";
    const EMPTY_MESSAGE: &'static str = "No pending approvals";
    const SECTION: Section = Section::ActivityApprovals;

    fn record_id(record: &ActivityApproval) -> &str {
        &record.id
    }

    fn record_label(record: &ActivityApproval) -> String {
        record
            .activity_name
            .clone()
            .unwrap_or_else(|| format!("Approval #{}", record.id))
    }

    fn columns() -> &'static [&'static str] {
        &["Activity", "Requested By", "Amount", "Comments", "Requested On", "Status"]
    }

    fn cells(record: &ActivityApproval) -> Vec<Markup> {
        vec![
            Markup::text(or_na(record.activity_name.as_deref())),
            Markup::text(or_na(record.requested_by.as_deref())),
            Markup::text(&format_ugx(record.requested_amount)),
            Markup::text(record.comments.as_deref().unwrap_or("None")),
            Markup::text(&requested_on(record)),
            status_badge(record.status.as_deref(), APPROVAL_STATUS_PENDING),
        ]
    }

    fn list_query(_params: &FormData) -> Vec<(&'static str, String)> {
        vec![("status", APPROVAL_STATUS_PENDING.to_string())]
    }

    fn details(record: &ActivityApproval) -> Vec<(&'static str, Markup)> {
        vec![
            ("Activity", Markup::text(or_na(record.activity_name.as_deref()))),
            ("Requested By", Markup::text(or_na(record.requested_by.as_deref()))),
            ("Amount", Markup::text(&format_ugx(record.requested_amount))),
            ("Comments", Markup::text(record.comments.as_deref().unwrap_or("None"))),
            ("Requested On", Markup::text(&requested_on(record))),
            (
                "Status",
                status_badge(record.status.as_deref(), APPROVAL_STATUS_PENDING),
            ),
            ("Budget Items", items_table(&record.budget_items)),
        ]
    }

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new(
                "approve",
                "Approve",
                Prompt::with_fields(
                    "Are you sure you want to approve this activity? This will deduct the budget from the program area and main account.",
                    vec![FormField::new("response_comments", "Comments", FieldKind::TextArea)],
                ),
                approve_call,
                "Activity approved successfully",
            )
            .class("btn btn-approve")
            .director_only()
            .when(ActivityApproval::is_pending),
            Action::new(
                "reject",
                "Reject",
                Prompt::with_fields(
                    "Enter your comments for rejection",
                    vec![
                        FormField::new("response_comments", "Comments", FieldKind::TextArea)
                            .required(),
                    ],
                ),
                reject_call,
                "Activity rejected successfully",
            )
            .class("btn btn-danger")
            .director_only()
            .when(ActivityApproval::is_pending),
        ]
    }
}

fn requested_on(record: &ActivityApproval) -> String {
    record
        .created_at
        .as_deref()
        .map(format_date)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn decision_call(id: &str, decision: &str, comments: String) -> Result<UpstreamCall, ValidationError> {
    let body = to_payload(&ApprovalDecision {
        decision: decision.to_string(),
        approved_by: ACTIVITY_APPROVAL_APPROVER.to_string(),
        response_comments: comments,
    })?;
    Ok(UpstreamCall::new(Method::PUT, ActivityApprovals::item_path(id)).with_body(body))
}

fn approve_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    decision_call(id, BUDGET_STATUS_APPROVED, form.get("response_comments").to_string())
}

fn reject_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    let comments = required_reason(form, "response_comments")?;
    decision_call(id, BUDGET_STATUS_REJECTED, comments)
}

/// Builds the funding request for one activity. `id` is the activity id.
pub fn request_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    let amount = form
        .positive_number("requested_amount", "Requested amount")
        .map_err(|_| ValidationError::new("requested_amount", ERR_INVALID_REQUESTED_AMOUNT))?;
    Ok(
        UpstreamCall::new(Method::POST, ActivityApprovals::COLLECTION).with_body(json!({
            "activity_id": id_value(id),
            "requested_by": ACTIVITY_APPROVAL_REQUESTER,
            "requested_amount": amount,
            "comments": form.get("comments"),
        })),
    )
}

/// The request prompt starts from the activity's planned budget.
pub fn request_prefill(activity: &Activity) -> FormData {
    match activity.budget {
        Some(budget) if budget > 0.0 => FormData::new().with("requested_amount", budget.to_string()),
        _ => FormData::new(),
    }
}

pub fn request_fields() -> Vec<FormField> {
    vec![
        FormField::money("requested_amount", "Requested Amount (UGX)").required(),
        FormField::new("comments", "Comments for the Director", FieldKind::TextArea),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_posts_amount_and_comments() {
        let form = FormData::new()
            .with("requested_amount", "750000")
            .with("comments", " urgent ");
        let call = request_call("12", &form).unwrap();
        assert_eq!(call.method, Method::POST);
        assert_eq!(call.path, "/activity-approvals/");
        assert_eq!(
            call.body,
            Some(json!({
                "activity_id": 12,
                "requested_by": "Head of Programs",
                "requested_amount": 750000.0,
                "comments": "urgent"
            }))
        );
    }

    #[test]
    fn request_rejects_non_positive_amount() {
        let err = request_call("12", &FormData::new().with("requested_amount", "-5")).unwrap_err();
        assert_eq!(err.message, ERR_INVALID_REQUESTED_AMOUNT);
    }

    #[test]
    fn decisions_put_to_the_approval() {
        let call = approve_call("4", &FormData::new()).unwrap();
        assert_eq!(call.path, "/activity-approvals/4");
        assert_eq!(
            call.body,
            Some(json!({"decision": "approved", "approved_by": "Director", "response_comments": ""}))
        );

        assert_eq!(
            reject_call("4", &FormData::new()).unwrap_err().message,
            ERR_REASON_REQUIRED
        );
        let call = reject_call("4", &FormData::new().with("response_comments", "Too costly")).unwrap();
        assert_eq!(call.body.unwrap()["decision"], "rejected");
    }

    #[test]
    fn pending_queue_is_filtered_upstream() {
        assert_eq!(
            ActivityApprovals::list_query(&FormData::new()),
            vec![("status", "pending".to_string())]
        );
    }

    #[test]
    fn nested_items_without_ids_are_listed() {
        let record: ActivityApproval = serde_json::from_value(json!({
            "id": 4,
            "activity_name": "Borehole",
            "requested_amount": 900000,
            "budget_items": [{"item_name": "Cement", "quantity": 3, "unit_price": 2500}]
        }))
        .unwrap();
        let details = ActivityApprovals::details(&record);
        let (_, items) = details.iter().find(|(label, _)| *label == "Budget Items").unwrap();
        assert!(items.as_str().contains("Cement"));
        assert!(items.as_str().contains("UGX 7,500"));
    }
}
