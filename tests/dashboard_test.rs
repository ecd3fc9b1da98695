mod common;

use axum::http::StatusCode;
use ngo_dashboard::constants::*;
use serde_json::json;

use common::{get, post_form, setup_test_app, sign_in};

#[tokio::test]
async fn test_healthz() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let response = get(&app.router, "/healthz", "").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "ok");
    Ok(())
}

#[tokio::test]
async fn test_home_without_role_offers_role_picker() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let response = get(&app.router, "/", "").await?;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("/roles/director"));
    assert!(response.body.contains("/roles/program_officer"));
    Ok(())
}

#[tokio::test]
async fn test_external_roles_are_redirected() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let hr = get(&app.router, "/roles/human_resource", "").await?;
    assert_eq!(hr.status, StatusCode::SEE_OTHER);
    assert_eq!(hr.location.as_deref(), Some(HUMAN_RESOURCE_URL));

    let finance = get(&app.router, "/roles/finance", "").await?;
    assert_eq!(finance.location.as_deref(), Some(FINANCE_URL));

    let unknown = get(&app.router, "/roles/treasurer", "").await?;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_director_dashboard_shows_program_area_balances() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/program_areas/",
        json!([{"id": 1, "name": "Education", "balance": "1500000"}]),
    );
    let cookie = sign_in(&app.router, "director").await?;

    let home = get(&app.router, "/", &cookie).await?;
    assert!(home.body.contains("Signed in as Director"));
    assert!(home.body.contains("Education"));
    assert!(home.body.contains("UGX 1,500,000"));
    assert!(home.body.contains("/panels/approvals"));
    Ok(())
}

#[tokio::test]
async fn test_approve_and_reject_only_rendered_for_director() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/budget-approvals/pending",
        json!([{"id": 3, "activity_name": "Borehole", "requested_amount": 1200000, "status": "pending"}]),
    );

    let director = sign_in(&app.router, "director").await?;
    let list = get(&app.router, "/panels/approvals", &director).await?;
    assert!(list.body.contains("/panels/approvals/3/actions/approve"));
    assert!(list.body.contains("/panels/approvals/3/actions/reject"));

    let officer = sign_in(&app.router, "program_officer").await?;
    let list = get(&app.router, "/panels/approvals", &officer).await?;
    assert!(list.body.contains("Borehole"));
    assert!(!list.body.contains("/actions/approve"));
    assert!(!list.body.contains("/actions/reject"));
    Ok(())
}

#[tokio::test]
async fn test_reset_role_returns_to_picker() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let cookie = sign_in(&app.router, "program_officer").await?;

    let reset = post_form(&app.router, "/roles/reset", &cookie, &[]).await?;
    assert_eq!(reset.status, StatusCode::SEE_OTHER);

    let home = get(&app.router, "/", &reset.cookie_or(&cookie)).await?;
    assert!(home.body.contains("/roles/director"));
    Ok(())
}

#[tokio::test]
async fn test_program_area_lists_its_projects() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/program_areas/4",
        json!({"id": 4, "name": "Health", "balance": 0}),
    );
    app.backend.respond(
        "GET",
        "/program_areas/4/projects/",
        json!({"projects": [{"id": 9, "name": "Clean Water", "budget": 300000}]}),
    );

    let page = get(&app.router, "/program-areas/4", "").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Health"));
    assert!(page.body.contains("Clean Water"));
    assert!(page.body.contains("/panels/projects/9"));
    Ok(())
}

#[tokio::test]
async fn test_receipt_download_is_named_attachment() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/donations/17",
        json!({"id": 17, "donor_name": "Jane", "amount": 50000, "payment_method": "mobile_money", "date": "2024-01-01"}),
    );

    let download = get(&app.router, "/donations/17/receipt/download", "").await?;
    assert_eq!(download.status, StatusCode::OK);
    assert_eq!(
        download.content_disposition.as_deref(),
        Some("attachment; filename=\"RCDNET_Donation_Receipt_17.html\"")
    );
    assert!(download.body.contains("DONATION CONFIRMATION"));
    assert!(download.body.contains("UGX 50,000"));
    assert!(download.body.contains(GENERAL_FUND));
    assert!(!download.body.contains("window.print()"));

    let print = get(&app.router, "/donations/17/receipt/print", "").await?;
    assert!(print.body.contains("window.print()"));

    let page = get(&app.router, "/donations/17/receipt", "").await?;
    assert!(page.body.contains("/donations/17/receipt/download"));
    assert!(page.body.contains("mail.google.com"));
    assert!(page.body.contains(HTML2PDF_SCRIPT_URL));
    assert!(page.body.contains("html2pdf()"));
    assert!(page.body.contains("data-pdf-target=\"receipt-17\""));
    assert!(page.body.contains("data-pdf-filename=\"RCDNET_Donation_Receipt_17.pdf\""));
    Ok(())
}

#[tokio::test]
async fn test_receipt_for_missing_donation_is_not_found() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond_with(
        "GET",
        "/donations/404",
        StatusCode::NOT_FOUND,
        json!({"detail": "Donation not found"}),
    );

    let response = get(&app.router, "/donations/404/receipt/download", "").await?;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, "Donation not found");
    Ok(())
}

#[tokio::test]
async fn test_receipt_email_redirects_to_compose() -> anyhow::Result<()> {
    let app = setup_test_app().await?;

    let response = get(&app.router, "/donations/17/receipt/email", "").await?;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    let location = response.location.unwrap_or_default();
    assert!(location.starts_with(GMAIL_COMPOSE_URL));
    assert!(location.contains("to=rcdnetciuganda%40gmail.com"));
    Ok(())
}

#[tokio::test]
async fn test_director_reviews_pending_activity_approvals() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/activity-approvals/",
        json!([{
            "id": 4,
            "activity_id": 12,
            "activity_name": "Borehole",
            "requested_by": "Head of Programs",
            "requested_amount": 900000,
            "status": "pending"
        }]),
    );
    app.backend.respond(
        "GET",
        "/activity-approvals/4",
        json!({
            "id": 4,
            "activity_name": "Borehole",
            "requested_amount": 900000,
            "status": "pending",
            "budget_items": [{"item_name": "Cement", "quantity": 3, "unit_price": 2500}]
        }),
    );

    let director = sign_in(&app.router, "director").await?;
    let home = get(&app.router, "/", &director).await?;
    assert!(home.body.contains("/panels/activity-approvals"));

    let list = get(&app.router, "/panels/activity-approvals", &director).await?;
    assert_eq!(list.status, StatusCode::OK);
    assert!(list.body.contains("Borehole"));
    assert!(list.body.contains("UGX 900,000"));
    assert!(list.body.contains("/panels/activity-approvals/4/actions/approve"));
    assert!(list.body.contains("/panels/activity-approvals/4/actions/reject"));
    let lists: Vec<_> = app
        .backend
        .requests()
        .into_iter()
        .filter(|r| r.path == "/activity-approvals/")
        .collect();
    assert_eq!(lists[0].query.as_deref(), Some("status=pending"));

    let detail = get(&app.router, "/panels/activity-approvals/4", &director).await?;
    assert!(detail.body.contains("Cement"));
    assert!(detail.body.contains("UGX 7,500"));

    let approved = post_form(
        &app.router,
        "/panels/activity-approvals/4/actions/approve",
        &director,
        &[("confirm", "yes"), ("response_comments", "Go ahead")],
    )
    .await?;
    assert_eq!(approved.location.as_deref(), Some("/panels/activity-approvals"));
    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "PUT");
    assert_eq!(writes[0].path, "/activity-approvals/4");
    assert_eq!(
        writes[0].body,
        Some(json!({"decision": "approved", "approved_by": "Director", "response_comments": "Go ahead"}))
    );
    Ok(())
}

#[tokio::test]
async fn test_activity_approval_reject_needs_comments() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let director = sign_in(&app.router, "director").await?;

    let response = post_form(
        &app.router,
        "/panels/activity-approvals/4/actions/reject",
        &director,
        &[("confirm", "yes"), ("response_comments", " ")],
    )
    .await?;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(app.backend.writes().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_activity_funding_request_posts_approval() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend.respond(
        "GET",
        "/activities/12",
        json!({"id": 12, "name": "Borehole", "budget": 500000}),
    );

    let prompt = get(&app.router, "/panels/activities/12/actions/request-funding", "").await?;
    assert_eq!(prompt.status, StatusCode::OK);
    assert!(prompt.body.contains("value=\"500000\""));

    let response = post_form(
        &app.router,
        "/panels/activities/12/actions/request-funding",
        "",
        &[("confirm", "yes"), ("requested_amount", "450000"), ("comments", "Phase one")],
    )
    .await?;
    assert_eq!(response.location.as_deref(), Some("/panels/activities"));

    let writes = app.backend.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].method, "POST");
    assert_eq!(writes[0].path, "/activity-approvals/");
    assert_eq!(
        writes[0].body,
        Some(json!({
            "activity_id": 12,
            "requested_by": "Head of Programs",
            "requested_amount": 450000.0,
            "comments": "Phase one"
        }))
    );
    Ok(())
}

#[tokio::test]
async fn test_activity_detail_shows_approved_budget() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend
        .respond("GET", "/activities/12", json!({"id": 12, "name": "Borehole"}));
    app.backend.respond(
        "GET",
        "/activities/12/budget-status/",
        json!({"status": "approved"}),
    );
    app.backend.respond(
        "GET",
        "/activities/12/approved-budget/",
        json!({
            "activity_name": "Borehole",
            "total_amount": 850000,
            "approved_by": "Director",
            "approval_date": "2024-04-02",
            "items": [{"item_name": "Pipes", "quantity": 2, "unit_price": 100000}]
        }),
    );

    let page = get(&app.router, "/panels/activities/12", "").await?;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Budget Status"));
    assert!(page.body.contains("Approved Budget"));
    assert!(page.body.contains("UGX 850,000"));
    assert!(page.body.contains("02 Apr 2024"));
    assert!(page.body.contains("Pipes"));
    Ok(())
}

#[tokio::test]
async fn test_activity_detail_skips_approved_budget_while_draft() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    app.backend
        .respond("GET", "/activities/12", json!({"id": 12, "name": "Borehole"}));
    app.backend.respond(
        "GET",
        "/activities/12/budget-status/",
        json!({"status": "draft"}),
    );

    let page = get(&app.router, "/panels/activities/12", "").await?;
    assert!(page.body.contains("Budget Status"));
    assert!(!page.body.contains("Approved Items"));
    assert!(
        !app.backend
            .requests()
            .iter()
            .any(|r| r.path == "/activities/12/approved-budget/")
    );
    Ok(())
}
