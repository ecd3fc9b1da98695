use reqwest::Method;
use serde_json::Value;

use crate::api::{ApiClient, UpstreamCall};
use crate::error::{ApiError, ValidationError};
use crate::html::{Markup, div, element, heading, link};
use crate::models::NamedRecord;
use crate::validation::FormData;

use super::{Editable, FieldKind, FormField, PanelScope};

#[derive(Debug, Clone, PartialEq)]
pub enum FormMode {
    Create,
    Edit(String),
}

impl FormMode {
    pub fn is_edit(&self) -> bool {
        matches!(self, FormMode::Edit(_))
    }

    fn target(&self, scope: &PanelScope) -> String {
        match self {
            FormMode::Create => scope.base.clone(),
            FormMode::Edit(id) => scope.record_href(id),
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Saved(Option<Value>),
    Invalid(ValidationError),
    Failed(ApiError),
}

/// Initial form values: blank defaults, or the stored record when editing.
pub async fn open<R: Editable>(api: &ApiClient, mode: &FormMode) -> Result<FormData, ApiError> {
    match mode {
        FormMode::Create => Ok(R::defaults()),
        FormMode::Edit(id) => {
            let record: R::Record = api.get(&R::item_path(id)).await?;
            Ok(R::form_values(&record))
        }
    }
}

/// Validates and saves. Nothing is sent when validation fails.
pub async fn submit<R: Editable>(
    api: &ApiClient,
    scope: &PanelScope,
    mode: &FormMode,
    form: &FormData,
) -> SubmitOutcome {
    let payload = match R::payload(form) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(resource = R::SLUG, field = %e.field, "form rejected");
            return SubmitOutcome::Invalid(e);
        }
    };
    let call = match mode {
        FormMode::Create => UpstreamCall::new(Method::POST, scope.upstream.clone()),
        FormMode::Edit(id) => UpstreamCall::new(Method::PUT, R::item_path(id)),
    }
    .with_body(payload);

    match api.execute(&call).await {
        Ok(body) => {
            tracing::info!(resource = R::SLUG, method = %call.method, "record saved");
            SubmitOutcome::Saved(body)
        }
        Err(e) => SubmitOutcome::Failed(e),
    }
}

pub async fn render<R: Editable>(
    api: &ApiClient,
    scope: &PanelScope,
    mode: &FormMode,
    values: &FormData,
    error: Option<&str>,
) -> Markup {
    let title = match mode {
        FormMode::Create => format!("Add {}", R::SINGULAR),
        FormMode::Edit(_) => format!("Edit {}", R::SINGULAR),
    };

    let mut inner = Markup::new();
    if let Some(error) = error {
        inner.push(form_error(error));
    }
    for field in R::fields() {
        let options = match field.kind {
            FieldKind::Lookup(path) => lookup_options(api, path).await,
            _ => None,
        };
        inner.push(render_field(&field, values.get(field.name), options.as_deref()));
    }
    let mut buttons = Markup::trusted(r#"<button type="submit" class="btn btn-primary">Save</button>"#);
    buttons.push(link(&scope.base, "btn btn-cancel", "Cancel"));
    inner.push(div("form-actions", buttons));

    let target = mode.target(scope);
    let mut page = heading(2, &title);
    page.push(element(
        "form",
        &[("method", "post"), ("action", &target), ("class", "panel-form")],
        inner,
    ));
    page
}

pub fn form_error(message: &str) -> Markup {
    element(
        "div",
        &[("class", "form-error"), ("role", "alert")],
        Markup::text(message),
    )
}

async fn lookup_options(api: &ApiClient, path: &str) -> Option<Vec<(String, String)>> {
    match api.list::<NamedRecord>(path, &[]).await {
        Ok(records) => Some(records.into_iter().map(|r| (r.id, r.name)).collect()),
        Err(e) => {
            tracing::warn!(path, error = %e, "failed to load form options");
            None
        }
    }
}

pub fn render_field(field: &FormField, value: &str, options: Option<&[(String, String)]>) -> Markup {
    let label_text = if field.required {
        format!("{} *", field.label)
    } else {
        field.label.to_string()
    };
    let mut group = element("label", &[("for", field.name)], Markup::text(&label_text));

    let mut attrs: Vec<(&str, &str)> = vec![("id", field.name), ("name", field.name)];
    if field.required {
        attrs.push(("required", "required"));
    }

    let control = match &field.kind {
        FieldKind::TextArea => element("textarea", &attrs, Markup::text(value)),
        FieldKind::Select(choices) => {
            let owned: Vec<(String, String)> = choices
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            select(&attrs, field.label, &owned, value)
        }
        FieldKind::Lookup(_) => match options {
            Some(options) => select(&attrs, field.label, options, value),
            None => input(&attrs, "text", value),
        },
        FieldKind::Number { step, min } => {
            attrs.push(("step", *step));
            attrs.push(("min", *min));
            input(&attrs, "number", value)
        }
        FieldKind::Date => input(&attrs, "date", value),
        FieldKind::Email => input(&attrs, "email", value),
        FieldKind::Tel => input(&attrs, "tel", value),
        FieldKind::Text => input(&attrs, "text", value),
    };
    group.push(control);
    div("form-group", group)
}

fn input(attrs: &[(&str, &str)], kind: &str, value: &str) -> Markup {
    let mut all = vec![("type", kind), ("value", value)];
    all.extend_from_slice(attrs);
    let mut out = Markup::trusted("<input");
    for (name, val) in all {
        out.push_trusted(" ")
            .push_trusted(name)
            .push_trusted("=\"")
            .push_text(val)
            .push_trusted("\"");
    }
    out.push_trusted(">");
    out
}

fn select(attrs: &[(&str, &str)], label: &str, options: &[(String, String)], value: &str) -> Markup {
    let mut inner = element(
        "option",
        &[("value", "")],
        Markup::text(&format!("Select {}", label.to_lowercase())),
    );
    for (key, text) in options {
        let mut option_attrs = vec![("value", key.as_str())];
        if key == value {
            option_attrs.push(("selected", "selected"));
        }
        inner.push(element("option", &option_attrs, Markup::text(text)));
    }
    element("select", attrs, inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::PAYMENT_METHODS;

    #[test]
    fn required_text_field_is_marked() {
        let field = FormField::text("donor_name", "Donor Name").required();
        let html = render_field(&field, "Jane \"J\"", None);
        assert!(html.as_str().contains("Donor Name *"));
        assert!(html.as_str().contains(r#"value="Jane &quot;J&quot;""#));
        assert!(html.as_str().contains(r#"required="required""#));
    }

    #[test]
    fn select_marks_current_choice() {
        let field = FormField::new("payment_method", "Payment Method", FieldKind::Select(PAYMENT_METHODS));
        let html = render_field(&field, "mobile_money", None);
        assert!(html
            .as_str()
            .contains(r#"<option value="mobile_money" selected="selected">Mobile Money</option>"#));
        assert!(html.as_str().contains(r#"<option value="cash">Cash</option>"#));
    }

    #[test]
    fn lookup_without_options_falls_back_to_text() {
        let field = FormField::new("project_id", "Project", FieldKind::Lookup("/projects/"));
        let html = render_field(&field, "7", None);
        assert!(html.as_str().contains(r#"type="text""#));

        let options = vec![("7".to_string(), "Clean Water".to_string())];
        let html = render_field(&field, "7", Some(&options));
        assert!(html.as_str().contains("Clean Water"));
        assert!(html.as_str().contains(r#"selected="selected""#));
    }

    #[test]
    fn textarea_escapes_content() {
        let field = FormField::new("notes", "Notes", FieldKind::TextArea);
        let html = render_field(&field, "</textarea><script>", None);
        assert!(html.as_str().contains("&lt;/textarea&gt;&lt;script&gt;"));
    }
}
