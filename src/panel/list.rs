use crate::api::ApiClient;
use crate::html::{Markup, element, link, message_row, table};
use crate::navigation::Role;
use crate::validation::FormData;

use super::{PanelScope, Resource};

/// Fetches the scope's collection and renders it as a table. The result is
/// always a final state: rows, the empty-state row or an error row.
pub async fn render_list<R: Resource>(
    api: &ApiClient,
    scope: &PanelScope,
    role: Option<Role>,
    params: &FormData,
) -> Markup {
    let mut columns = R::columns().to_vec();
    columns.push("Actions");

    let query = R::list_query(params);
    let body = match api.list::<R::Record>(&scope.upstream, &query).await {
        Ok(mut records) => {
            R::prepare(&mut records, params);
            if records.is_empty() {
                message_row(columns.len(), "empty-state", R::EMPTY_MESSAGE)
            } else {
                let mut rows: Markup = records
                    .iter()
                    .map(|record| render_row::<R>(record, scope, role))
                    .collect();
                if let Some(footer) = R::footer(&records) {
                    rows.push(footer);
                }
                rows
            }
        }
        Err(e) => {
            tracing::error!(resource = R::SLUG, path = %scope.upstream, error = %e, "failed to load list");
            message_row(
                columns.len(),
                "error-state",
                &format!("Failed to load {}: {}", R::TITLE.to_lowercase(), e),
            )
        }
    };

    table(&format!("data-table {}-table", R::SLUG), &columns, body)
}

fn render_row<R: Resource>(record: &R::Record, scope: &PanelScope, role: Option<Role>) -> Markup {
    let mut cells: Markup = R::cells(record)
        .into_iter()
        .map(|cell| element("td", &[], cell))
        .collect();
    cells.push(element(
        "td",
        &[("class", "row-actions")],
        row_actions::<R>(record, scope, role),
    ));
    element("tr", &[("data-id", R::record_id(record))], cells)
}

/// Triggers for one record, each addressed by the record id in its URL.
pub fn row_actions<R: Resource>(
    record: &R::Record,
    scope: &PanelScope,
    role: Option<Role>,
) -> Markup {
    let id = R::record_id(record);
    let mut out = link(&scope.record_href(id), "btn btn-view", "View");
    if R::EDITABLE && scope.editable {
        out.push(link(
            &format!("{}/edit", scope.record_href(id)),
            "btn btn-edit",
            "Edit",
        ));
    }
    for (href, label) in R::links(record, scope) {
        out.push(link(&href, "btn", label));
    }
    for action in R::actions() {
        if action.visible(record, role) {
            out.push(link(
                &scope.action_href(id, action.name),
                action.class,
                action.label,
            ));
        }
    }
    out
}
