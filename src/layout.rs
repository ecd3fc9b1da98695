use tower_sessions::Session;

use crate::constants::ORG_SHORT_NAME;
use crate::html::{Markup, div, element, escape};
use crate::navigation::{Role, Section, nav_bar};
use crate::session::{self, Flash};

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; color: #1f2933; }
.sidebar { width: 220px; min-height: 100vh; background: #1f3a5f; padding: 1rem; }
.sidebar a { color: #fff; text-decoration: none; }
.nav-list { list-style: none; padding: 0; }
.nav-link { display: block; padding: .5rem; border-radius: 4px; }
.nav-link.active { background: #2f5a8f; }
.user-role { color: #cbd5e1; display: block; margin-top: 1rem; }
main { flex: 1; padding: 1.5rem; }
table { width: 100%; border-collapse: collapse; }
th, td { padding: .5rem; border-bottom: 1px solid #e5e7eb; text-align: left; }
.empty-state td { text-align: center; color: #6b7280; }
.error-state td { text-align: center; color: #b91c1c; }
.flash { padding: .75rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.flash-success { background: #dcfce7; }
.flash-info { background: #dbeafe; }
.flash-error, .form-error { background: #fee2e2; color: #991b1b; padding: .75rem; }
.status-badge { padding: .15rem .5rem; border-radius: 999px; background: #e5e7eb; }
.status-badge.approved, .status-badge.completed { background: #dcfce7; }
.status-badge.rejected { background: #fee2e2; }
.status-badge.pending, .status-badge.pending_approval, .status-badge.submitted { background: #fef3c7; }
.btn { display: inline-block; padding: .35rem .75rem; border: 1px solid #1f3a5f; border-radius: 4px; }
.form-group { margin-bottom: .75rem; display: flex; flex-direction: column; max-width: 28rem; }
.detail-row { display: flex; gap: 1rem; padding: .25rem 0; }
.detail-label { font-weight: 600; min-width: 10rem; }
"#;

/// Standalone HTML document around `body`.
pub fn document(title: &str, body: Markup) -> Markup {
    let mut doc = Markup::trusted("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    doc.push_trusted("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    doc.push_trusted("<title>")
        .push_text(title)
        .push_trusted("</title><style>")
        .push_trusted(STYLES)
        .push_trusted("</style></head><body>");
    doc.push(body);
    doc.push_trusted("</body></html>");
    doc
}

pub fn flash_banner(flash: &Flash) -> Markup {
    element(
        "div",
        &[("class", flash.kind.class()), ("role", "status")],
        Markup::text(&flash.message),
    )
}

/// Dashboard page with navigation for `role` and an optional flash on top.
pub fn page(
    title: &str,
    role: Option<Role>,
    section: Option<Section>,
    flash: Option<&Flash>,
    body: Markup,
) -> Markup {
    let mut inner = nav_bar(role, section);
    let mut main = Markup::new();
    if let Some(flash) = flash {
        main.push(flash_banner(flash));
    }
    main.push(body);
    inner.push(element("main", &[], main));
    document(&format!("{} | {}", title, ORG_SHORT_NAME), div("layout", inner))
}

/// Renders a dashboard page for the session, consuming its pending flash.
pub async fn render(
    session: &Session,
    title: &str,
    section: Option<Section>,
    body: Markup,
) -> Markup {
    let role = session::current_role(session).await;
    let flash = session::take_flash(session).await;
    page(title, role, section, flash.as_ref(), body)
}

/// Inline `<script>` content is not escaped, so only fixed strings go here.
pub fn script(source: &'static str) -> Markup {
    Markup::trusted(format!("<script>{}</script>", source))
}

pub fn hidden_input(name: &str, value: &str) -> Markup {
    Markup::trusted(format!(
        "<input type=\"hidden\" name=\"{}\" value=\"{}\">",
        escape(name),
        escape(value)
    ))
}
