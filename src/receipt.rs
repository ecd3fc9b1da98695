//! Donation receipts and donor history documents.
//!
//! Pages carry a "Download PDF" button that renders the document node to a
//! PDF in the browser with html2pdf.js. The HTML download is a standalone
//! copy of the same document, and the print page opens the print dialog.

use axum::{
    Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use time::{OffsetDateTime, macros::format_description};
use tower_sessions::Session;

use crate::AppState;
use crate::constants::*;
use crate::html::{Markup, detail_row, div, element, heading, link, message_row, paragraph, table};
use crate::layout::{self, document, script};
use crate::models::{Donation, Donor, DonorHistory, DonorStats};
use crate::navigation::Section;
use crate::resources::donors::stats_rows;
use crate::utils::{format_date, format_payment_method, format_number, format_ugx};

fn programme(donation: &Donation) -> &str {
    donation
        .project
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(GENERAL_FUND)
}

fn receipt_row(label: &str, value: &str) -> Markup {
    let mut inner = element("span", &[("class", "receipt-label")], Markup::text(label));
    inner.push(element("span", &[("class", "receipt-value")], Markup::text(value)));
    div("receipt-row", inner)
}

fn letterhead(title: &str) -> Markup {
    let mut header = div("receipt-org-info", element("h2", &[], Markup::text(ORG_NAME)));
    let mut lines = element("h3", &[], Markup::text(title));
    for line in ORG_LETTERHEAD_LINES {
        lines.push(element("p", &[], Markup::text(line)));
    }
    header.push(div("receipt-title", lines));
    div("receipt-header", header)
}

fn contact_lines() -> Markup {
    ORG_CONTACT_LINES
        .iter()
        .map(|line| element("p", &[], Markup::text(line)))
        .collect()
}

/// The receipt card for one donation. `issued_at` is the time of day the
/// receipt was produced.
pub fn receipt_card(donation: &Donation, issued_at: &str) -> Markup {
    let date = format_date(&donation.date);
    let amount = format_ugx(donation.amount);

    let mut details = receipt_row("To:", &donation.donor_name);
    details.push(receipt_row("Date:", &date));
    details.push(receipt_row("Amount:", &amount));
    details.push(receipt_row(
        "Payment Method:",
        &format_payment_method(donation.payment_method.as_deref()),
    ));
    details.push(receipt_row("Program Supported:", programme(donation)));

    let cause = donation
        .project
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("our cause");
    let mut message = paragraph("", &format!("Dear {},", donation.donor_name));
    message.push(paragraph(
        "",
        &format!(
            "{} confirms your donation of {} on {} at {}. Thank you so much for caring about {}. We are deeply grateful for your generous gift.",
            ORG_SHORT_NAME, amount, date, issued_at, cause
        ),
    ));
    message.push(div("receipt-contact-info", contact_lines()));

    let mut body = div("receipt-donor-info", details);
    body.push(div("receipt-message", message));
    let mut footer = paragraph(
        "",
        &format!(
            "This receipt serves as official confirmation of your donation to {}.",
            ORG_SHORT_NAME
        ),
    );
    footer.push(paragraph("", "Thank you for your support!"));
    body.push(div("receipt-footer", footer));

    let mut card = letterhead("DONATION CONFIRMATION");
    card.push(div("receipt-body", body));
    let id = format!("receipt-{}", donation.id);
    element("div", &[("class", "receipt-card"), ("id", &id)], card)
}

pub fn receipt_filename(donation_id: &str) -> String {
    format!("{}_Donation_Receipt_{}.html", ORG_SHORT_NAME, donation_id)
}

pub fn receipt_pdf_filename(donation_id: &str) -> String {
    format!("{}_Donation_Receipt_{}.pdf", ORG_SHORT_NAME, donation_id)
}

const PDF_EXPORT_SCRIPT: &str = r#"
document.querySelectorAll('[data-pdf-target]').forEach(function (button) {
  button.addEventListener('click', function () {
    var node = document.getElementById(button.dataset.pdfTarget);
    if (!node || typeof html2pdf === 'undefined') { window.print(); return; }
    html2pdf().set({
      margin: [10, 10, 10, 10],
      filename: button.dataset.pdfFilename,
      image: { type: 'jpeg', quality: 0.98 },
      html2canvas: { scale: 2, useCORS: true, scrollY: 0 },
      jsPDF: { unit: 'mm', format: 'a4', orientation: 'portrait' }
    }).from(node).save();
  });
});
"#;

/// Button that converts the element with id `target` to `filename` in the
/// browser, with the html2pdf bundle and the click handler.
pub fn pdf_export(target: &str, filename: &str) -> Markup {
    let mut out = element(
        "button",
        &[
            ("type", "button"),
            ("class", "btn btn-primary"),
            ("data-pdf-target", target),
            ("data-pdf-filename", filename),
        ],
        Markup::text("Download PDF"),
    );
    out.push(element("script", &[("src", HTML2PDF_SCRIPT_URL)], Markup::new()));
    out.push(script(PDF_EXPORT_SCRIPT));
    out
}

/// Gmail compose link with the fixed acknowledgement message.
pub fn email_link() -> String {
    format!(
        "{}&to={}&su={}&body={}",
        GMAIL_COMPOSE_URL,
        urlencoding::encode(RECEIPT_EMAIL_RECIPIENT),
        urlencoding::encode(RECEIPT_EMAIL_SUBJECT),
        urlencoding::encode(RECEIPT_EMAIL_BODY)
    )
}

fn issued_time() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]"))
        .unwrap_or_default()
}

pub fn receipt_document(donation: &Donation, print: bool) -> Markup {
    let mut body = receipt_card(donation, &issued_time());
    if print {
        body.push(script("window.onload = function () { window.print(); };"));
    }
    document(
        &format!("{} Donation Receipt #{}", ORG_SHORT_NAME, donation.id),
        body,
    )
}

fn donation_path(id: &str) -> String {
    format!("/donations/{}", urlencoding::encode(id))
}

async fn load_donation(app_state: &AppState, id: &str) -> Result<Donation, (StatusCode, String)> {
    app_state.api.get(&donation_path(id)).await.map_err(|e| {
        tracing::error!(id = %id, error = %e, "failed to load donation for receipt");
        e.into()
    })
}

async fn receipt_page(
    State(app_state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let donation = load_donation(&app_state, &id).await?;
    let base = format!("{}/receipt", donation_path(&id));

    let mut body = heading(1, "Donation Receipt");
    body.push(receipt_card(&donation, &issued_time()));
    let mut actions = pdf_export(
        &format!("receipt-{}", donation.id),
        &receipt_pdf_filename(&donation.id),
    );
    actions.push(link(&format!("{}/download", base), "btn", "Download HTML"));
    actions.push(link(&email_link(), "btn", "Email Receipt"));
    actions.push(link(&format!("{}/print", base), "btn", "Print Receipt"));
    actions.push(link("/panels/donations", "btn btn-back", "Back to donations"));
    body.push(div("receipt-actions", actions));

    Ok(layout::render(&session, "Donation Receipt", Some(Section::Donations), body)
        .await
        .into_response())
}

async fn receipt_print(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Markup, (StatusCode, String)> {
    let donation = load_donation(&app_state, &id).await?;
    Ok(receipt_document(&donation, true))
}

async fn receipt_download(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let donation = load_donation(&app_state, &id).await?;
    tracing::info!(id = %id, "receipt downloaded");
    Ok(attachment(
        &receipt_filename(&donation.id),
        receipt_document(&donation, false),
    ))
}

async fn receipt_email() -> Redirect {
    Redirect::to(&email_link())
}

pub fn attachment(filename: &str, document: Markup) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        document.into_string(),
    )
        .into_response()
}

/// Donor details, stats and the full donation table with its total.
pub fn donor_history(donor: &Donor, history: &DonorHistory, stats: &DonorStats) -> Markup {
    let mut out = heading(1, &format!("Donation History: {}", donor.name));

    let period = match (&stats.first_donation, &stats.last_donation) {
        (Some(first), Some(last)) => format!("{} - {}", format_date(first), format_date(last)),
        _ => "No donations yet".to_string(),
    };
    let project = history
        .donations
        .first()
        .and_then(|d| d.project.as_deref())
        .filter(|p| !p.trim().is_empty())
        .unwrap_or("Various Projects");

    let mut info = detail_row("Donor ID", Markup::text(&donor.id));
    info.push(detail_row(
        "Category",
        Markup::text(donor.category.as_deref().unwrap_or("Regular Donor")),
    ));
    info.push(detail_row(
        "Address",
        Markup::text(donor.address.as_deref().unwrap_or("Not specified")),
    ));
    info.push(detail_row("Project", Markup::text(project)));
    info.push(detail_row("Time Period", Markup::text(&period)));
    for (label, value) in stats_rows(stats) {
        info.push(detail_row(label, value));
    }
    out.push(div("donor-info", info));

    let columns = ["Date", "Amount (UGX)", "Payment Method", "Project", "Status"];
    let rows: Markup = if history.donations.is_empty() {
        message_row(columns.len(), "empty-state", "No donation history available")
    } else {
        history
            .donations
            .iter()
            .map(|d| {
                let cells: Markup = [
                    format_date(&d.date),
                    format_number(d.amount),
                    format_payment_method(d.payment_method.as_deref()),
                    programme(d).to_string(),
                    d.status.clone().unwrap_or_else(|| "Completed".to_string()),
                ]
                .iter()
                .map(|c| element("td", &[], Markup::text(c)))
                .collect();
                element("tr", &[], cells)
            })
            .collect()
    };
    out.push(table("data-table history-table", &columns, rows));
    out.push(paragraph(
        "history-total",
        &format!("Total: {}", format_ugx(history.total())),
    ));
    out
}

pub fn donor_history_document(donor: &Donor, history: &DonorHistory, stats: &DonorStats) -> Markup {
    let mut body = letterhead("DONATION HISTORY");
    body.push(donor_history(donor, history, stats));
    body.push(div("receipt-contact-info", contact_lines()));
    document(
        &format!("{} Donation History - {}", ORG_SHORT_NAME, donor.name),
        body,
    )
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/donations/{id}/receipt", get(receipt_page))
        .route("/donations/{id}/receipt/print", get(receipt_print))
        .route("/donations/{id}/receipt/download", get(receipt_download))
        .route("/donations/{id}/receipt/email", get(receipt_email))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn donation() -> Donation {
        Donation {
            id: "17".to_string(),
            donor_name: "Jane <Doe>".to_string(),
            amount: 50000.0,
            payment_method: Some("mobile_money".to_string()),
            date: "2024-01-01".to_string(),
            project: None,
            notes: None,
            status: Some("completed".to_string()),
        }
    }

    #[test]
    fn receipt_fills_template_and_escapes() {
        let card = receipt_card(&donation(), "10:30");
        let html = card.as_str();
        assert!(html.contains(ORG_NAME));
        assert!(html.contains("Tax ID No. 1027222682"));
        assert!(html.contains("Jane &lt;Doe&gt;"));
        assert!(html.contains("UGX 50,000"));
        assert!(html.contains("Mobile Money"));
        assert!(html.contains(GENERAL_FUND));
        assert!(html.contains("01 Jan 2024 at 10:30"));
        assert!(html.contains("caring about our cause"));
    }

    #[test]
    fn filename_follows_receipt_convention() {
        assert_eq!(receipt_filename("17"), "RCDNET_Donation_Receipt_17.html");
        assert_eq!(receipt_pdf_filename("17"), "RCDNET_Donation_Receipt_17.pdf");
    }

    #[test]
    fn pdf_export_targets_the_receipt_node() {
        let html = pdf_export("receipt-17", &receipt_pdf_filename("17"));
        let html = html.as_str();
        assert!(html.contains("data-pdf-target=\"receipt-17\""));
        assert!(html.contains("data-pdf-filename=\"RCDNET_Donation_Receipt_17.pdf\""));
        assert!(html.contains(HTML2PDF_SCRIPT_URL));
        assert!(html.contains("html2pdf().set("));
    }

    #[test]
    fn email_link_is_encoded() {
        let link = email_link();
        assert!(link.starts_with("https://mail.google.com/mail/?view=cm&fs=1&to="));
        assert!(link.contains("rcdnetciuganda%40gmail.com"));
        assert!(link.contains("su=Donation%20acknowledgement"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn print_document_triggers_print() {
        let doc = receipt_document(&donation(), true);
        assert!(doc.as_str().contains("window.print()"));
        assert!(!receipt_document(&donation(), false).as_str().contains("window.print()"));
    }

    #[test]
    fn history_totals_donations() {
        let donor: Donor = serde_json::from_value(serde_json::json!({"id": 3, "name": "Jane"})).unwrap();
        let mut second = donation();
        second.date = "2024-02-01".to_string();
        second.amount = 25000.0;
        let history = DonorHistory {
            donations: vec![donation(), second],
            total_donations: None,
            donation_count: None,
        };
        let stats = DonorStats::from_donations(&history.donations);
        let html = donor_history(&donor, &history, &stats);
        assert!(html.as_str().contains("Total: UGX 75,000"));
        assert!(html.as_str().contains("01 Jan 2024 - 01 Feb 2024"));
    }
}
