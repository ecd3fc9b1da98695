use reqwest::Method;
use serde_json::json;

use crate::api::UpstreamCall;
use crate::constants::*;
use crate::error::ValidationError;
use crate::html::Markup;
use crate::models::BudgetApproval;
use crate::navigation::Section;
use crate::panel::{Action, FieldKind, FormField, Prompt, Resource, required_reason};
use crate::utils::{format_ugx, or_na, status_badge};
use crate::validation::FormData;

/// Budget approval requests waiting for the Director.
pub struct Approvals;

impl Resource for Approvals {
    type Record = BudgetApproval;

    const SLUG: &'static str = "approvals";
    const TITLE: &'static str = "Pending Budget Approvals";
    const SINGULAR: &'static str = "Budget Approval";
    const COLLECTION: &'static str = "/budget-approvals/pending";
    const EMPTY_MESSAGE: &'static str = "No pending budget approvals";
    const SECTION: Section = Section::Approvals;

    fn item_path(id: &str) -> String {
        format!("/budget-approvals/{}", urlencoding::encode(id))
    }

    fn record_id(record: &BudgetApproval) -> &str {
        &record.id
    }

    fn record_label(record: &BudgetApproval) -> String {
        record
            .activity_name
            .clone()
            .unwrap_or_else(|| format!("Approval #{}", record.id))
    }

    fn columns() -> &'static [&'static str] {
        &["Activity", "Project", "Requested", "Approved", "Status"]
    }

    fn cells(record: &BudgetApproval) -> Vec<Markup> {
        vec![
            Markup::text(or_na(record.activity_name.as_deref())),
            Markup::text(or_na(record.project_name.as_deref())),
            Markup::text(&format_ugx(record.requested())),
            Markup::text(&amount_or_dash(record.approved_amount)),
            status_badge(record.status.as_deref(), APPROVAL_STATUS_PENDING),
        ]
    }

    fn details(record: &BudgetApproval) -> Vec<(&'static str, Markup)> {
        vec![
            ("Activity", Markup::text(or_na(record.activity_name.as_deref()))),
            ("Project", Markup::text(or_na(record.project_name.as_deref()))),
            ("Requested Amount", Markup::text(&format_ugx(record.requested()))),
            (
                "Approved Amount",
                Markup::text(&amount_or_dash(record.approved_amount)),
            ),
            (
                "Status",
                status_badge(record.status.as_deref(), APPROVAL_STATUS_PENDING),
            ),
            (
                "Notes",
                Markup::text(or_na(
                    record
                        .approver_notes
                        .as_deref()
                        .or(record.remarks.as_deref()),
                )),
            ),
        ]
    }

    fn actions() -> Vec<Action<Self>> {
        vec![
            Action::new(
                "approve",
                "Approve",
                Prompt::with_fields(
                    "Approve this budget request? The approved amount will be deducted from the program area and main account.",
                    vec![
                        FormField::money("approved_amount", "Approved Amount (UGX)").required(),
                        FormField::new("approver_notes", "Notes", FieldKind::TextArea),
                    ],
                ),
                approve_call,
                "Budget approved successfully",
            )
            .class("btn btn-approve")
            .director_only()
            .when(BudgetApproval::is_pending)
            .prefill(requested_amount),
            Action::new(
                "reject",
                "Reject",
                Prompt::with_fields(
                    "Please enter the reason for rejection",
                    vec![FormField::new("remarks", "Reason", FieldKind::TextArea).required()],
                ),
                reject_call,
                "Budget rejected successfully",
            )
            .class("btn btn-danger")
            .director_only()
            .when(BudgetApproval::is_pending),
        ]
    }
}

fn amount_or_dash(amount: Option<f64>) -> String {
    amount.map(format_ugx).unwrap_or_else(|| "-".to_string())
}

fn requested_amount(record: &BudgetApproval) -> FormData {
    FormData::new().with("approved_amount", record.requested().to_string())
}

fn approve_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    let approved_amount = match form.positive_number("approved_amount", "Approved amount") {
        Ok(amount) => amount,
        Err(_) => {
            return Err(ValidationError::new(
                "approved_amount",
                ERR_INVALID_APPROVED_AMOUNT,
            ));
        }
    };
    Ok(
        UpstreamCall::new(Method::PUT, Approvals::item_path(id)).with_body(json!({
            "approved_amount": approved_amount,
            "approver_notes": form.get("approver_notes"),
            "status": BUDGET_STATUS_APPROVED,
        })),
    )
}

fn reject_call(id: &str, form: &FormData) -> Result<UpstreamCall, ValidationError> {
    let remarks = required_reason(form, "remarks")?;
    Ok(
        UpstreamCall::new(Method::PUT, Approvals::item_path(id)).with_body(json!({
            "approved_amount": 0,
            "approver_notes": remarks,
            "status": BUDGET_STATUS_REJECTED,
        })),
    )
}
