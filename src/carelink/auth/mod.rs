//! One-time-code sign-in, password recovery and session handling.

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod flow;
pub mod identifier;
pub mod otp;
pub mod session;
pub mod throttle;
pub mod types;
pub mod widget;

pub use self::dispatcher::{Role, Route};
pub use self::error::FlowError;
pub use self::flow::{LoginFlow, OtpChannel, ResetFlow, ResetVerification, Step};
pub use self::session::{FileSessionStore, Session, SessionContext, SessionStore};
