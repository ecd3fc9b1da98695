use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::AppState;
use crate::constants::*;
use crate::html::{Markup, div, element, heading, link, paragraph};
use crate::layout;
use crate::resources::projects::program_area_summary;
use crate::session::{self, Flash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Director,
    ProgramOfficer,
    HumanResource,
    Finance,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Director,
        Role::ProgramOfficer,
        Role::HumanResource,
        Role::Finance,
    ];

    pub fn from_slug(slug: &str) -> Option<Role> {
        match slug {
            "director" => Some(Role::Director),
            "program_officer" => Some(Role::ProgramOfficer),
            "human_resource" => Some(Role::HumanResource),
            "finance" => Some(Role::Finance),
            _ => None,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::ProgramOfficer => "program_officer",
            Role::HumanResource => "human_resource",
            Role::Finance => "finance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Director => "Director",
            Role::ProgramOfficer => "Program Officer",
            Role::HumanResource => "Human Resource",
            Role::Finance => "Finance",
        }
    }

    /// Roles whose dashboards live outside this application.
    pub fn external_url(self) -> Option<&'static str> {
        match self {
            Role::HumanResource => Some(HUMAN_RESOURCE_URL),
            Role::Finance => Some(FINANCE_URL),
            _ => None,
        }
    }

    pub fn sections(self) -> &'static [Section] {
        match self {
            Role::Director => &[
                Section::Dashboard,
                Section::Approvals,
                Section::ActivityApprovals,
                Section::BudgetQueue,
                Section::Projects,
                Section::ProgramAreas,
                Section::Donations,
                Section::Donors,
                Section::Files,
            ],
            Role::ProgramOfficer => &[
                Section::Dashboard,
                Section::Activities,
                Section::Projects,
                Section::Donations,
                Section::Donors,
                Section::Files,
            ],
            Role::HumanResource | Role::Finance => &[Section::Dashboard],
        }
    }

    pub fn is_director(role: Option<Role>) -> bool {
        role == Some(Role::Director)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Activities,
    BudgetQueue,
    Approvals,
    ActivityApprovals,
    Projects,
    ProgramAreas,
    Donations,
    Donors,
    Files,
}

impl Section {
    pub fn href(self) -> &'static str {
        match self {
            Section::Dashboard => "/",
            Section::Activities => "/panels/activities",
            Section::BudgetQueue => "/panels/budget-items",
            Section::Approvals => "/panels/approvals",
            Section::ActivityApprovals => "/panels/activity-approvals",
            Section::Projects => "/panels/projects",
            Section::ProgramAreas => "/program-areas",
            Section::Donations => "/panels/donations",
            Section::Donors => "/panels/donors",
            Section::Files => "/files",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Activities => "Activities",
            Section::BudgetQueue => "Budget Items",
            Section::Approvals => "Budget Approvals",
            Section::ActivityApprovals => "Activity Approvals",
            Section::Projects => "Projects",
            Section::ProgramAreas => "Program Areas",
            Section::Donations => "Donations",
            Section::Donors => "Donors",
            Section::Files => "Files",
        }
    }
}

pub async fn home(State(app_state): State<AppState>, session: Session) -> Markup {
    let body = match session::current_role(&session).await {
        None => role_picker(),
        Some(role) => {
            let mut body = heading(1, &format!("{} Dashboard", role.label()));
            let cards: Markup = role
                .sections()
                .iter()
                .filter(|s| **s != Section::Dashboard)
                .map(|s| div("nav-card", link(s.href(), "nav-card-link", s.label())))
                .collect();
            body.push(div("nav-cards", cards));
            if role == Role::Director {
                body.push(program_area_summary(&app_state.api).await);
            }
            body
        }
    };
    layout::render(&session, "Dashboard", Some(Section::Dashboard), body).await
}

fn role_picker() -> Markup {
    let mut body = heading(1, &format!("{} Management System", ORG_SHORT_NAME));
    body.push(paragraph("muted", "Select your role to continue"));
    let cards: Markup = Role::ALL
        .iter()
        .map(|role| {
            let href = format!("/roles/{}", role.slug());
            div("role-card", link(&href, "role-card-link", role.label()))
        })
        .collect();
    body.push(div("role-cards", cards));
    body
}

pub async fn select_role(
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let role = Role::from_slug(&slug)
        .ok_or_else(|| (StatusCode::NOT_FOUND, ERR_UNKNOWN_ROLE.to_string()))?;

    if let Some(url) = role.external_url() {
        tracing::info!(role = role.slug(), "redirecting to external dashboard");
        return Ok(Redirect::to(url).into_response());
    }

    session::set_role(&session, role).await?;
    tracing::info!(role = role.slug(), "role selected");
    session::push_flash(&session, Flash::info(format!("Signed in as {}", role.label()))).await;
    Ok(Redirect::to("/").into_response())
}

pub async fn reset_role(session: Session) -> Result<Redirect, (StatusCode, String)> {
    session::clear_role(&session).await?;
    Ok(Redirect::to("/"))
}

/// Sidebar links for the current role.
pub fn nav_bar(role: Option<Role>, current: Option<Section>) -> Markup {
    let sections: &[Section] = match role {
        Some(role) => role.sections(),
        None => &[Section::Dashboard],
    };
    let items: Markup = sections
        .iter()
        .map(|section| {
            let class = if Some(*section) == current {
                "nav-link active"
            } else {
                "nav-link"
            };
            element("li", &[], link(section.href(), class, section.label()))
        })
        .collect();
    let mut nav = element("ul", &[("class", "nav-list")], items);
    if let Some(role) = role {
        let mut switch = Markup::new();
        switch.push_trusted(r#"<form method="post" action="/roles/reset" class="role-switch">"#);
        switch.push(element("span", &[("class", "user-role")], Markup::text(role.label())));
        switch.push_trusted(r#"<button type="submit" class="btn btn-link">Switch role</button></form>"#);
        nav.push(switch);
    }
    element("nav", &[("class", "sidebar")], nav)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_slug(role.slug()), Some(role));
        }
        assert_eq!(Role::from_slug("admin"), None);
    }

    #[test]
    fn director_sees_approvals_not_activities() {
        let sections = Role::Director.sections();
        assert!(sections.contains(&Section::Approvals));
        assert!(sections.contains(&Section::ActivityApprovals));
        assert!(sections.contains(&Section::Projects));
        assert!(!sections.contains(&Section::Activities));
    }

    #[test]
    fn program_officer_sees_activities() {
        let sections = Role::ProgramOfficer.sections();
        assert!(sections.contains(&Section::Activities));
        assert!(!sections.contains(&Section::Approvals));
    }

    #[test]
    fn only_hr_and_finance_leave_the_app() {
        assert_eq!(Role::HumanResource.external_url(), Some(HUMAN_RESOURCE_URL));
        assert_eq!(Role::Finance.external_url(), Some(FINANCE_URL));
        assert_eq!(Role::Director.external_url(), None);
    }

    #[test]
    fn nav_bar_marks_current_section() {
        let nav = nav_bar(Some(Role::ProgramOfficer), Some(Section::Activities));
        assert!(nav.as_str().contains(r#"<a href="/panels/activities" class="nav-link active">"#));
        assert!(nav.as_str().contains("Switch role"));
    }
}
