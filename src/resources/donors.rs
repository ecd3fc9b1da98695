use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::AppState;
use crate::api::ApiClient;
use crate::constants::*;
use crate::error::{ApiError, ValidationError};
use crate::html::{Markup, div, element, link, paragraph};
use crate::layout;
use crate::models::{Donor, DonorHistory, DonorStats};
use crate::navigation::Section;
use crate::panel::{self, Editable, FieldKind, FormField, PanelScope, Resource};
use crate::receipt;
use crate::utils::{format_date, format_ugx, or_na};
use crate::validation::FormData;

pub struct Donors;

impl Resource for Donors {
    type Record = Donor;

    const SLUG: &'static str = "donors";
    const TITLE: &'static str = "Donors";
    const SINGULAR: &'static str = "Donor";
    const COLLECTION: &'static str = "/donors/";
    const EMPTY_MESSAGE: &'static str = "No donors found";
    const SECTION: Section = Section::Donors;
    const EDITABLE: bool = true;

    fn record_id(record: &Donor) -> &str {
        &record.id
    }

    fn record_label(record: &Donor) -> String {
        record.name.clone()
    }

    fn columns() -> &'static [&'static str] {
        &["Name", "Email", "Phone", "Type", "Category", "Donations", "Total Donated"]
    }

    fn cells(record: &Donor) -> Vec<Markup> {
        let (count, total) = match &record.stats {
            Some(stats) => (
                stats.donation_count.to_string(),
                format_ugx(stats.total_donated),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        vec![
            Markup::text(&record.name),
            Markup::text(or_na(record.email.as_deref())),
            Markup::text(or_na(record.phone.as_deref())),
            Markup::text(or_na(record.donor_type.as_deref())),
            Markup::text(or_na(record.category.as_deref())),
            Markup::text(&count),
            Markup::text(&total),
        ]
    }

    fn list_query(params: &FormData) -> Vec<(&'static str, String)> {
        params
            .optional("search")
            .map(|search| vec![("search", search)])
            .unwrap_or_default()
    }

    fn list_controls(params: &FormData, scope: &PanelScope) -> Markup {
        let mut inner = Markup::trusted(
            r#"<input type="search" name="search" placeholder="Search donors by name, email or phone" value=""#,
        );
        inner.push_text(params.get("search")).push_trusted("\">");
        inner.push_trusted(r#"<button type="submit" class="btn">Search</button>"#);
        element(
            "form",
            &[("method", "get"), ("action", &scope.base), ("class", "search-form")],
            inner,
        )
    }

    fn details(record: &Donor) -> Vec<(&'static str, Markup)> {
        let mut rows = vec![
            ("Name", Markup::text(&record.name)),
            ("Email", Markup::text(or_na(record.email.as_deref()))),
            ("Phone", Markup::text(or_na(record.phone.as_deref()))),
            ("Address", Markup::text(or_na(record.address.as_deref()))),
            ("Type", Markup::text(or_na(record.donor_type.as_deref()))),
            ("Category", Markup::text(or_na(record.category.as_deref()))),
            ("Notes", Markup::text(or_na(record.notes.as_deref()))),
        ];
        if let Some(stats) = &record.stats {
            rows.extend(stats_rows(stats));
        }
        rows
    }

    /// Stats aggregated from the donation history when the donor record
    /// came without them.
    fn extra_details(
        api: &ApiClient,
        record: &Donor,
    ) -> impl Future<Output = Vec<(&'static str, Markup)>> + Send {
        async move {
            if record.stats.is_some() {
                return Vec::new();
            }
            match api.get::<DonorHistory>(&history_path(&record.id)).await {
                Ok(history) => stats_rows(&DonorStats::from_history(&history)),
                Err(e) => {
                    tracing::warn!(id = %record.id, error = %e, "failed to aggregate donor stats");
                    Vec::new()
                }
            }
        }
    }

    fn links(record: &Donor, scope: &PanelScope) -> Vec<(String, &'static str)> {
        vec![(format!("{}/history", scope.record_href(&record.id)), "History")]
    }
}

impl Editable for Donors {
    fn fields() -> Vec<FormField> {
        vec![
            FormField::text("name", "Full Name").required(),
            FormField::new("email", "Email", FieldKind::Email),
            FormField::new("phone", "Phone", FieldKind::Tel),
            FormField::text("address", "Address"),
            FormField::new("donor_type", "Donor Type", FieldKind::Select(DONOR_TYPES)),
            FormField::new("category", "Category", FieldKind::Select(DONOR_CATEGORIES)),
            FormField::new("notes", "Notes", FieldKind::TextArea),
        ]
    }

    fn form_values(record: &Donor) -> FormData {
        FormData::new()
            .with("name", record.name.as_str())
            .with("email", record.email.clone().unwrap_or_default())
            .with("phone", record.phone.clone().unwrap_or_default())
            .with("address", record.address.clone().unwrap_or_default())
            .with("donor_type", record.donor_type.clone().unwrap_or_default())
            .with("category", record.category.clone().unwrap_or_default())
            .with("notes", record.notes.clone().unwrap_or_default())
    }

    fn payload(form: &FormData) -> Result<Value, ValidationError> {
        let name = form.required("name", "Full name")?;
        let email = form.email("email")?.unwrap_or_default();
        let phone = form.phone("phone")?.unwrap_or_default();
        Ok(json!({
            "name": name,
            "email": email,
            "phone": phone,
            "address": form.get("address"),
            "donor_type": form.get("donor_type"),
            "category": form.get("category"),
            "notes": form.get("notes"),
        }))
    }
}

pub fn stats_rows(stats: &DonorStats) -> Vec<(&'static str, Markup)> {
    let date_or_dash = |d: &Option<String>| {
        d.as_deref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string())
    };
    vec![
        ("Total Donated", Markup::text(&format_ugx(stats.total_donated))),
        ("Donations", Markup::text(&stats.donation_count.to_string())),
        ("First Donation", Markup::text(&date_or_dash(&stats.first_donation))),
        ("Last Donation", Markup::text(&date_or_dash(&stats.last_donation))),
    ]
}

fn history_path(id: &str) -> String {
    format!("{}/donations", Donors::item_path(id))
}

/// Donor and donation history, fetched together.
pub async fn load_history(
    app_state: &AppState,
    id: &str,
) -> Result<(Donor, DonorHistory), ApiError> {
    let donor_path = Donors::item_path(id);
    let history_path = history_path(id);
    let (donor, history) = tokio::try_join!(
        app_state.api.get::<Donor>(&donor_path),
        app_state.api.get::<DonorHistory>(&history_path),
    )?;
    Ok((donor, history))
}

/// Stats shown for a donor: the server's when present, otherwise
/// aggregated from the history.
pub fn effective_stats(donor: &Donor, history: &DonorHistory) -> DonorStats {
    donor
        .stats
        .clone()
        .unwrap_or_else(|| DonorStats::from_history(history))
}

async fn history(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Response {
    let body = match load_history(&app_state, &id).await {
        Ok((donor, history)) => {
            let stats = effective_stats(&donor, &history);
            let target = format!("donor-history-{}", donor.id);
            let mut body = element(
                "div",
                &[("id", &target), ("class", "donor-history")],
                receipt::donor_history(&donor, &history, &stats),
            );
            let filename = format!("{}_Donation_History_{}.pdf", ORG_SHORT_NAME, donor.id);
            let mut actions = receipt::pdf_export(&target, &filename);
            let href = format!("{}/history/download", PanelScope::root::<Donors>().record_href(&id));
            actions.push(link(&href, "btn", "Download HTML"));
            body.push(div("record-actions", actions));
            body
        }
        Err(e) => {
            tracing::error!(id = %id, error = %e, "failed to load donation history");
            let body = paragraph("error", &format!("Failed to load donation history: {}", e));
            let page = layout::render(&session, "Donation History", Some(Section::Donors), body).await;
            return (StatusCode::BAD_GATEWAY, page).into_response();
        }
    };
    layout::render(&session, "Donation History", Some(Section::Donors), body)
        .await
        .into_response()
}

async fn history_download(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let (donor, history) = load_history(&app_state, &id).await?;
    let stats = effective_stats(&donor, &history);
    let document = receipt::donor_history_document(&donor, &history, &stats);
    let filename = format!("{}_Donation_History_{}.html", ORG_SHORT_NAME, donor.id);
    Ok(receipt::attachment(&filename, document))
}

pub fn routes() -> Router<AppState> {
    panel::routes::<Donors>()
        .route("/panels/donors/{id}/history", get(history))
        .route("/panels/donors/{id}/history/download", get(history_download))
}
