mod session_middleware;

pub use session_middleware::{append_session_cookie, CurrentSession, SessionRejection};
