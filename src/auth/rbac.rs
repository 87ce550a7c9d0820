/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Maps each role tier to the pages it may open. Checks run client side,
 * before any request is sent; the backend still enforces its own rules.
 */

use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::warn;

use crate::errors::ClientError;
use crate::models::{Role, Stage};

/// A navigable page of the application.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, strum::Display, strum::EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum Page {
    Dashboard,
    Preparation,
    Control,
    Packing,
    Orders,
    Statistics,
    Scoreboard,
    PrestaOrders,
    Users,
}

const ALL_ROLES: &[Role] = &[Role::Agent, Role::SuperAgent, Role::Manager];
const SUPERVISORS: &[Role] = &[Role::SuperAgent, Role::Manager];
const MANAGERS: &[Role] = &[Role::Manager];

impl Page {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            Page::Dashboard | Page::Preparation | Page::Control | Page::Packing => ALL_ROLES,
            Page::Orders => SUPERVISORS,
            Page::Statistics | Page::Scoreboard | Page::PrestaOrders | Page::Users => MANAGERS,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Tableau de bord",
            Page::Preparation => "Préparation",
            Page::Control => "Contrôle",
            Page::Packing => "Emballage",
            Page::Orders => "Commandes",
            Page::Statistics => "Statistiques",
            Page::Scoreboard => "Classement",
            Page::PrestaOrders => "Commandes PrestaShop",
            Page::Users => "Utilisateurs",
        }
    }

    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::Preparation => Page::Preparation,
            Stage::Control => Page::Control,
            Stage::Packing => Page::Packing,
        }
    }
}

pub fn can_access(role: Role, page: Page) -> bool {
    page.allowed_roles().contains(&role)
}

/// Pages shown in the navigation for a role, in menu order.
pub fn visible_pages(role: Role) -> Vec<Page> {
    Page::iter().filter(|page| can_access(role, *page)).collect()
}

pub fn ensure_access(role: Role, page: Page) -> Result<(), ClientError> {
    if can_access(role, page) {
        Ok(())
    } else {
        warn!(role = %role, page = %page, "Access denied");
        Err(ClientError::Forbidden(format!(
            "Accès refusé : la page « {} » est réservée aux rôles {}.",
            page.title(),
            page.allowed_roles()
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}
