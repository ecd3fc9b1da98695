use serde_json::Value;

use crate::constants::*;
use crate::error::ValidationError;
use crate::html::{Markup, link, paragraph};
use crate::models::{Donation, DonationPayload};
use crate::navigation::Section;
use crate::panel::{Editable, FieldKind, FormField, PanelScope, Resource};
use crate::utils::{format_date, format_payment_method, format_ugx, or_na, parse_date, status_badge, today_iso};
use crate::validation::FormData;

use super::{empty_or, to_payload};

pub struct Donations;

impl Resource for Donations {
    type Record = Donation;

    const SLUG: &'static str = "donations";
    const TITLE: &'static str = "Donations";
    const SINGULAR: &'static str = "Donation";
    const COLLECTION: &'static str = "/donations/";
    const EMPTY_MESSAGE: &'static str = "No donations found";
    const SECTION: Section = Section::Donations;
    const EDITABLE: bool = true;

    fn record_id(record: &Donation) -> &str {
        &record.id
    }

    fn record_label(record: &Donation) -> String {
        format!("Donation from {}", record.donor_name)
    }

    fn columns() -> &'static [&'static str] {
        &["Donor", "Amount", "Payment Method", "Date", "Project", "Status"]
    }

    fn cells(record: &Donation) -> Vec<Markup> {
        vec![
            Markup::text(&record.donor_name),
            Markup::text(&format_ugx(record.amount)),
            Markup::text(&format_payment_method(record.payment_method.as_deref())),
            Markup::text(&format_date(&record.date)),
            Markup::text(empty_or(record.project.as_deref(), GENERAL_FUND)),
            status_badge(record.status.as_deref(), DONATION_STATUS_COMPLETED),
        ]
    }

    /// Newest first, and only the most recent ones unless `all` is set.
    fn prepare(records: &mut Vec<Donation>, params: &FormData) {
        records.sort_by(|a, b| parse_date(&b.date).cmp(&parse_date(&a.date)));
        if !show_all(params) {
            records.truncate(RECENT_DONATIONS_LIMIT);
        }
    }

    fn list_controls(params: &FormData, scope: &PanelScope) -> Markup {
        if show_all(params) {
            let mut out = paragraph("list-scope", "Showing all donations.");
            out.push(link(&scope.base, "btn", "Show recent only"));
            out
        } else {
            let mut out = paragraph(
                "list-scope",
                &format!("Showing the {} most recent donations.", RECENT_DONATIONS_LIMIT),
            );
            out.push(link(&format!("{}?all=1", scope.base), "btn", "Show all donations"));
            out
        }
    }

    fn details(record: &Donation) -> Vec<(&'static str, Markup)> {
        vec![
            ("Donor", Markup::text(&record.donor_name)),
            ("Amount", Markup::text(&format_ugx(record.amount))),
            (
                "Payment Method",
                Markup::text(&format_payment_method(record.payment_method.as_deref())),
            ),
            ("Date", Markup::text(&format_date(&record.date))),
            (
                "Project",
                Markup::text(empty_or(record.project.as_deref(), GENERAL_FUND)),
            ),
            ("Notes", Markup::text(or_na(record.notes.as_deref()))),
            (
                "Status",
                status_badge(record.status.as_deref(), DONATION_STATUS_COMPLETED),
            ),
        ]
    }

    fn links(record: &Donation, _scope: &PanelScope) -> Vec<(String, &'static str)> {
        vec![(format!("/donations/{}/receipt", urlencoding::encode(&record.id)), "Receipt")]
    }
}

impl Editable for Donations {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("donor_name", "Donor Name").required(),
            FormField::money("amount", "Amount (UGX)").required(),
            FormField::new(
                "payment_method",
                "Payment Method",
                FieldKind::Select(PAYMENT_METHODS),
            )
            .required(),
            FormField::new("date", "Date", FieldKind::Date).required(),
            FormField::text("project", "Project"),
            FormField::new("notes", "Notes", FieldKind::TextArea),
        ]
    }

    fn defaults() -> FormData {
        FormData::new().with("date", today_iso())
    }

    fn form_values(record: &Donation) -> FormData {
        FormData::new()
            .with("donor_name", record.donor_name.as_str())
            .with("amount", record.amount.to_string())
            .with("payment_method", record.payment_method.clone().unwrap_or_default())
            .with("date", record.date.get(..10).unwrap_or(&record.date))
            .with("project", record.project.clone().unwrap_or_default())
            .with("notes", record.notes.clone().unwrap_or_default())
    }

    fn payload(form: &FormData) -> Result<Value, ValidationError> {
        to_payload(&build_payload(form)?)
    }
}

fn show_all(params: &FormData) -> bool {
    params.get("all") == "1"
}

/// Donations recorded here are always completed; optional fields are only
/// sent when filled in.
pub fn build_payload(form: &FormData) -> Result<DonationPayload, ValidationError> {
    Ok(DonationPayload {
        donor_name: form.required("donor_name", "Donor name")?,
        amount: form.positive_number("amount", "Amount")?,
        payment_method: form.choice("payment_method", "Payment method", PAYMENT_METHODS)?,
        date: form.date("date", "Date")?,
        project: form.optional("project"),
        notes: form.optional("notes"),
        status: DONATION_STATUS_COMPLETED.to_string(),
    })
}
