//! Escape-by-default HTML assembly.
//!
//! Every dynamic string goes through [`Markup::text`] or [`escape`]. Markup
//! that is known to be safe (fixed templates assembled in this crate) is
//! opted in with [`Markup::trusted`].

use std::fmt;

use axum::response::{Html, IntoResponse, Response};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Escaped text node.
    pub fn text(value: &str) -> Self {
        Self(escape(value))
    }

    /// Trusted markup, inserted verbatim.
    pub fn trusted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn push(&mut self, other: Markup) -> &mut Self {
        self.0.push_str(&other.0);
        self
    }

    pub fn push_text(&mut self, value: &str) -> &mut Self {
        self.0.push_str(&escape(value));
        self
    }

    pub fn push_trusted(&mut self, value: &str) -> &mut Self {
        self.0.push_str(value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromIterator<Markup> for Markup {
    fn from_iter<I: IntoIterator<Item = Markup>>(iter: I) -> Self {
        let mut out = Markup::new();
        for item in iter {
            out.push(item);
        }
        out
    }
}

impl IntoResponse for Markup {
    fn into_response(self) -> Response {
        Html(self.0).into_response()
    }
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<tag a="v" ...>inner</tag>` with escaped attribute values.
pub fn element(tag: &str, attrs: &[(&str, &str)], inner: Markup) -> Markup {
    let mut out = Markup::new();
    out.push_trusted("<").push_trusted(tag);
    for (name, value) in attrs {
        out.push_trusted(" ")
            .push_trusted(name)
            .push_trusted("=\"")
            .push_text(value)
            .push_trusted("\"");
    }
    out.push_trusted(">").push(inner);
    out.push_trusted("</").push_trusted(tag).push_trusted(">");
    out
}

pub fn div(class: &str, inner: Markup) -> Markup {
    element("div", &[("class", class)], inner)
}

pub fn span(class: &str, inner: Markup) -> Markup {
    element("span", &[("class", class)], inner)
}

pub fn link(href: &str, class: &str, label: &str) -> Markup {
    element("a", &[("href", href), ("class", class)], Markup::text(label))
}

pub fn heading(level: u8, text: &str) -> Markup {
    let tag = match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        _ => "h4",
    };
    element(tag, &[], Markup::text(text))
}

pub fn paragraph(class: &str, text: &str) -> Markup {
    element("p", &[("class", class)], Markup::text(text))
}

/// `<button>` submitting its own name/value pair.
pub fn submit_button(name: &str, value: &str, class: &str, label: &str) -> Markup {
    element(
        "button",
        &[("type", "submit"), ("name", name), ("value", value), ("class", class)],
        Markup::text(label),
    )
}

/// Label/value pair used by detail views and receipts.
pub fn detail_row(label: &str, value: Markup) -> Markup {
    let mut inner = span("detail-label", Markup::text(label));
    inner.push(span("detail-value", value));
    div("detail-row", inner)
}

/// Table with a header row and pre-rendered body rows.
pub fn table(class: &str, columns: &[&str], body: Markup) -> Markup {
    let head: Markup = columns
        .iter()
        .map(|c| element("th", &[], Markup::text(c)))
        .collect();
    let mut inner = element("thead", &[], element("tr", &[], head));
    inner.push(element("tbody", &[], body));
    element("table", &[("class", class)], inner)
}

/// Single table row spanning all columns, used for empty and error states.
pub fn message_row(colspan: usize, class: &str, message: &str) -> Markup {
    let cols = colspan.max(1).to_string();
    element(
        "tr",
        &[("class", class)],
        element("td", &[("colspan", cols.as_str())], Markup::text(message)),
    )
}
