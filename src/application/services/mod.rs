//! Business logic services for the application layer.

pub mod link_service;
pub mod redirect_service;
pub mod session_service;

pub use link_service::{LinkDraft, LinkService};
pub use redirect_service::RedirectService;
pub use session_service::{SessionService, hash_session_token};
