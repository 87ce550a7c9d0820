#![allow(dead_code)]

use std::sync::Arc;

use orderflow::{
    auth::{CredentialProvider, MemorySessionStore, Session, SessionStore},
    client::ApiClient,
    models::{Order, Role, User},
    services::{AuthService, DashboardService, OrderService, PrestaService, UserService},
};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "access-token-1";
pub const REFRESH_TOKEN: &str = "refresh-token-1";

/// A mock REST backend plus a client pointed at it.
pub struct TestBackend {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub credentials: Arc<CredentialProvider>,
    pub api: Arc<ApiClient>,
}

impl TestBackend {
    /// Backend with no session.
    pub async fn anonymous() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemorySessionStore::new());
        let shared: Arc<dyn SessionStore> = store.clone();
        let credentials = Arc::new(CredentialProvider::load(shared).expect("memory store loads"));
        let api = Arc::new(
            ApiClient::new(&format!("{}/api", server.uri()), None, credentials.clone())
                .expect("mock server url is valid"),
        );
        Self {
            server,
            store,
            credentials,
            api,
        }
    }

    /// Backend with a logged-in user of the given role.
    pub async fn logged_in(role: Role) -> Self {
        let backend = Self::anonymous().await;
        backend
            .credentials
            .install(Session::new(
                ACCESS_TOKEN,
                Some(REFRESH_TOKEN.to_string()),
                Some(user(1, "alice", role)),
            ))
            .expect("memory store accepts the session");
        backend
    }

    pub fn orders(&self) -> Arc<OrderService> {
        Arc::new(OrderService::new(self.api.clone()))
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.api.clone())
    }

    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    pub fn dashboard(&self) -> DashboardService {
        DashboardService::new(self.api.clone())
    }

    pub fn presta(&self) -> PrestaService {
        PrestaService::new(self.api.clone())
    }
}

pub fn user(id: i64, username: &str, role: Role) -> User {
    serde_json::from_value(user_json(id, username, role)).expect("valid user json")
}

pub fn user_json(id: i64, username: &str, role: Role) -> Value {
    let role = match role {
        Role::Agent => "AGENT",
        Role::SuperAgent => "SUPER_AGENT",
        Role::Manager => "MANAGER",
    };
    json!({
        "id": id,
        "username": username,
        "first_name": "",
        "last_name": "",
        "email": format!("{username}@example.com"),
        "role": role,
    })
}

pub fn order_json(id: i64, reference: &str, status: &str) -> Value {
    json!({
        "id": id,
        "reference": reference,
        "cart_number": format!("C-{id}"),
        "line_count": 3,
        "status": status,
        "creator": 1,
        "created_at": "2024-01-01T10:00:00Z",
    })
}

pub fn order(id: i64, reference: &str, status: &str) -> Order {
    serde_json::from_value(order_json(id, reference, status)).expect("valid order json")
}
