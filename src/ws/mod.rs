//! WebSocket protocol, transport and session

pub mod protocol;
pub mod session;
pub mod transport;

pub use session::{ConnectionSession, SessionError, SessionHandle};
