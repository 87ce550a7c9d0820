/*!
 * # Authentication and Authorization Module
 *
 * - `session`: token storage and the credential provider injected into the HTTP client
 * - `rbac`: role-gated navigation
 */

pub mod rbac;
pub mod session;

pub use rbac::{can_access, ensure_access, visible_pages, Page};
pub use session::{CredentialProvider, FileSessionStore, MemorySessionStore, Session, SessionStore};
