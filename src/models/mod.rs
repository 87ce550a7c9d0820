// Wire types shared by the client, the views and the reports
pub mod dashboard;
pub mod order;
pub mod presta;
pub mod stage;
pub mod user;

pub use dashboard::{AgentStat, AverageTimes, DashboardStats, DateFilter, OrderCounts};
pub use order::{
    BulkDeleteResult, NewOrder, Order, OrderId, OrderStatus, OrderUpdate, Participant, Timestamp,
    TransitionPayload,
};
pub use presta::{HandlerRecord, HandlerUser, PrestaHandlers, PrestaOrder, PrestaProduct};
pub use stage::{Stage, StageConfig};
pub use user::{Credentials, NewUser, PasswordReset, Role, RoleChange, User, UserId, UserUpdate};

/// Response of `POST /auth/login/`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct LoginResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Response of `POST /auth/token/refresh/`.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}
