//! The Resource Panel: list, form, actions and detail pages for one REST
//! collection, implemented once and parameterised by a [`Resource`]
//! descriptor.

pub mod actions;
pub mod form;
pub mod handlers;
pub mod list;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::{ApiClient, UpstreamCall};
use crate::error::ValidationError;
use crate::html::Markup;
use crate::navigation::{Role, Section};
use crate::validation::FormData;

pub use handlers::{read_only_routes, routes};

/// Describes one backend collection: where it lives, how its records are
/// shown and which actions apply to them.
pub trait Resource: Sized + Send + Sync + 'static {
    type Record: DeserializeOwned + Send + Sync + 'static;

    /// URL segment under `/panels/`.
    const SLUG: &'static str;
    const TITLE: &'static str;
    const SINGULAR: &'static str;
    /// Backend collection endpoint.
    const COLLECTION: &'static str;
    const EMPTY_MESSAGE: &'static str;
    const SECTION: Section;
    const EDITABLE: bool = false;

    fn item_path(id: &str) -> String {
        format!(
            "{}/{}",
            Self::COLLECTION.trim_end_matches('/'),
            urlencoding::encode(id)
        )
    }

    fn record_id(record: &Self::Record) -> &str;

    fn record_label(record: &Self::Record) -> String;

    fn columns() -> &'static [&'static str];

    fn cells(record: &Self::Record) -> Vec<Markup>;

    /// Sorting or trimming applied after a successful fetch. `params` is the
    /// page's query string.
    fn prepare(_records: &mut Vec<Self::Record>, _params: &FormData) {}

    fn footer(_records: &[Self::Record]) -> Option<Markup> {
        None
    }

    /// Query parameters forwarded to the collection endpoint.
    fn list_query(_params: &FormData) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Controls rendered above the table (search boxes and the like).
    fn list_controls(_params: &FormData, _scope: &PanelScope) -> Markup {
        Markup::new()
    }

    fn details(record: &Self::Record) -> Vec<(&'static str, Markup)>;

    /// Detail rows that need more backend calls than the record itself.
    fn extra_details(
        _api: &ApiClient,
        _record: &Self::Record,
    ) -> impl Future<Output = Vec<(&'static str, Markup)>> + Send {
        async { Vec::new() }
    }

    /// Extra per-record links as `(href, label)`.
    fn links(_record: &Self::Record, _scope: &PanelScope) -> Vec<(String, &'static str)> {
        Vec::new()
    }

    fn actions() -> Vec<Action<Self>> {
        vec![Action::delete()]
    }
}

/// A resource that can be created and edited through the panel form.
pub trait Editable: Resource {
    fn fields() -> Vec<FormField>;

    fn defaults() -> FormData {
        FormData::new()
    }

    fn form_values(record: &Self::Record) -> FormData;

    fn payload(form: &FormData) -> Result<Value, ValidationError>;

    /// Where to go after a successful create, with the flash to show there.
    fn after_create(_created: Option<&Value>) -> Option<(String, String)> {
        None
    }
}

/// Where a panel is mounted and which backend collection feeds it.
#[derive(Debug, Clone)]
pub struct PanelScope {
    pub upstream: String,
    pub base: String,
    pub title: String,
    pub section: Section,
    /// Whether create and edit pages are mounted for this scope.
    pub editable: bool,
    /// Markup rendered between the heading and the table.
    pub toolbar: Markup,
}

impl PanelScope {
    pub fn root<R: Resource>() -> Self {
        Self {
            upstream: R::COLLECTION.to_string(),
            base: format!("/panels/{}", R::SLUG),
            title: R::TITLE.to_string(),
            section: R::SECTION,
            editable: R::EDITABLE,
            toolbar: Markup::new(),
        }
    }

    pub fn record_href(&self, id: &str) -> String {
        format!("{}/{}", self.base, urlencoding::encode(id))
    }

    pub fn action_href(&self, id: &str, action: &str) -> String {
        format!("{}/actions/{}", self.record_href(id), action)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    TextArea,
    Number { step: &'static str, min: &'static str },
    Date,
    Email,
    Tel,
    Select(&'static [(&'static str, &'static str)]),
    /// Select whose options come from a backend collection of `{id, name}`.
    Lookup(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
        }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn money(name: &'static str, label: &'static str) -> Self {
        Self::new(
            name,
            label,
            FieldKind::Number {
                step: "0.01",
                min: "0",
            },
        )
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// What the user sees before an action runs.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub message: String,
    pub fields: Vec<FormField>,
}

impl Prompt {
    pub fn confirm(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(message: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }
}

pub type CallBuilder = fn(&str, &FormData) -> Result<UpstreamCall, ValidationError>;

/// A single-round-trip operation on one record.
pub struct Action<R: Resource> {
    pub name: &'static str,
    pub label: &'static str,
    pub class: &'static str,
    pub prompt: Prompt,
    pub director_only: bool,
    pub applies: fn(&R::Record) -> bool,
    pub prefill: fn(&R::Record) -> FormData,
    pub call: CallBuilder,
    pub success: &'static str,
}

impl<R: Resource> Action<R> {
    pub fn new(
        name: &'static str,
        label: &'static str,
        prompt: Prompt,
        call: CallBuilder,
        success: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            class: "btn",
            prompt,
            director_only: false,
            applies: always::<R::Record>,
            prefill: no_prefill::<R::Record>,
            call,
            success,
        }
    }

    pub fn delete() -> Self {
        let mut action = Self::new(
            "delete",
            "Delete",
            Prompt::confirm(format!(
                "Are you sure you want to delete this {}?",
                R::SINGULAR.to_lowercase()
            )),
            delete_call::<R>,
            "Deleted successfully",
        );
        action.class = "btn btn-danger";
        action
    }

    pub fn class(mut self, class: &'static str) -> Self {
        self.class = class;
        self
    }

    pub fn director_only(mut self) -> Self {
        self.director_only = true;
        self
    }

    pub fn when(mut self, applies: fn(&R::Record) -> bool) -> Self {
        self.applies = applies;
        self
    }

    pub fn prefill(mut self, prefill: fn(&R::Record) -> FormData) -> Self {
        self.prefill = prefill;
        self
    }

    /// Whether the trigger is rendered for this record and role. Display
    /// gating only; the backend decides who may do what.
    pub fn visible(&self, record: &R::Record, role: Option<Role>) -> bool {
        (!self.director_only || Role::is_director(role)) && (self.applies)(record)
    }
}

fn always<T>(_: &T) -> bool {
    true
}

fn no_prefill<T>(_: &T) -> FormData {
    FormData::new()
}

pub fn delete_call<R: Resource>(id: &str, _form: &FormData) -> Result<UpstreamCall, ValidationError> {
    Ok(UpstreamCall::new(Method::DELETE, R::item_path(id)))
}

/// Required remarks for a rejection.
pub fn required_reason(form: &FormData, field: &str) -> Result<String, ValidationError> {
    form.optional(field)
        .ok_or_else(|| ValidationError::new(field, crate::constants::ERR_REASON_REQUIRED))
}
