//! Helpers shared by services and handlers.
//!
//! - [`code_generator`] - Short code and link id generation, custom code rules
//! - [`session_token`] - Session token generation and extraction from request headers

pub mod code_generator;
pub mod session_token;
