// Façades over queries and commands, one per area of the application
pub mod auth;
pub mod dashboard;
pub mod orders;
pub mod presta;
pub mod users;

pub use auth::AuthService;
pub use dashboard::{DashboardService, OrderStatistics};
pub use orders::OrderService;
pub use presta::PrestaService;
pub use users::UserService;
