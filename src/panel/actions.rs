use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{ApiError, ValidationError};
use crate::html::{Markup, div, element, heading, paragraph, submit_button};
use crate::validation::FormData;

use super::form::{form_error, render_field};
use super::{Action, PanelScope, Resource};

#[derive(Debug)]
pub enum ActionOutcome {
    /// The user answered "no" to the prompt. Nothing was sent.
    Declined,
    Invalid(ValidationError),
    Done(Option<Value>),
    Failed(ApiError),
}

pub fn find<R: Resource>(name: &str) -> Option<Action<R>> {
    R::actions().into_iter().find(|action| action.name == name)
}

/// Runs an action for one record: confirmation first, then validation of the
/// prompt fields, then exactly one backend call.
pub async fn dispatch<R: Resource>(
    api: &ApiClient,
    action: &Action<R>,
    id: &str,
    form: &FormData,
) -> ActionOutcome {
    if !form.confirmed() {
        tracing::debug!(resource = R::SLUG, action = action.name, id = %id, "action declined");
        return ActionOutcome::Declined;
    }
    let call = match (action.call)(id, form) {
        Ok(call) => call,
        Err(e) => return ActionOutcome::Invalid(e),
    };
    match api.execute(&call).await {
        Ok(body) => {
            tracing::info!(resource = R::SLUG, action = action.name, id = %id, "action completed");
            ActionOutcome::Done(body)
        }
        Err(e) => ActionOutcome::Failed(e),
    }
}

/// Confirmation page for an action, with its extra fields when it has any.
pub fn render_prompt<R: Resource>(
    scope: &PanelScope,
    action: &Action<R>,
    id: &str,
    record_label: &str,
    values: &FormData,
    error: Option<&str>,
) -> Markup {
    let mut page = heading(2, &format!("{}: {}", action.label, record_label));
    page.push(paragraph("prompt-message", &action.prompt.message));

    let mut inner = Markup::new();
    if let Some(error) = error {
        inner.push(form_error(error));
    }
    for field in &action.prompt.fields {
        inner.push(render_field(field, values.get(field.name), None));
    }
    let mut buttons = submit_button("confirm", "yes", action.class, action.label);
    buttons.push(submit_button("confirm", "no", "btn btn-cancel", "Cancel"));
    inner.push(div("form-actions", buttons));

    let target = scope.action_href(id, action.name);
    page.push(element(
        "form",
        &[("method", "post"), ("action", &target), ("class", "action-form")],
        inner,
    ));
    page
}
