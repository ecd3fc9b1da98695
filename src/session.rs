use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::constants::*;
use crate::navigation::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    pub fn class(self) -> &'static str {
        match self {
            FlashKind::Success => "flash flash-success",
            FlashKind::Info => "flash flash-info",
            FlashKind::Error => "flash flash-error",
        }
    }
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

pub async fn current_role(session: &Session) -> Option<Role> {
    match session.get::<String>(SESSION_ROLE_KEY).await {
        Ok(slug) => slug.as_deref().and_then(Role::from_slug),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read role from session");
            None
        }
    }
}

pub async fn set_role(session: &Session, role: Role) -> Result<(), (StatusCode, String)> {
    session
        .insert(SESSION_ROLE_KEY, role.slug())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store role");
            (StatusCode::INTERNAL_SERVER_ERROR, ERR_SESSION.to_string())
        })
}

pub async fn clear_role(session: &Session) -> Result<(), (StatusCode, String)> {
    session
        .remove::<String>(SESSION_ROLE_KEY)
        .await
        .map(|_| ())
        .map_err(|e| {
            tracing::error!(error = %e, "failed to clear role");
            (StatusCode::INTERNAL_SERVER_ERROR, ERR_SESSION.to_string())
        })
}

/// Stores a flash for the next page. A lost flash is not worth failing the
/// request over, so errors are only logged.
pub async fn push_flash(session: &Session, flash: Flash) {
    if let Err(e) = session.insert(SESSION_FLASH_KEY, flash).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

pub async fn take_flash(session: &Session) -> Option<Flash> {
    match session.remove::<Flash>(SESSION_FLASH_KEY).await {
        Ok(flash) => flash,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read flash message");
            None
        }
    }
}
