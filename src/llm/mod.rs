//! # Hosted Model Access
//!
//! - [`transport`]: the HTTP seam every outbound request goes through
//! - [`chat`]: OpenAI-compatible chat completions on top of a transport

pub mod chat;
pub mod transport;

pub use chat::{ChatClient, ChatModel, MessageContent};
pub use transport::{HttpReply, ReqwestTransport, Transport};
