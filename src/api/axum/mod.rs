mod error;
mod middleware;

pub use error::SessionRejection;
pub use middleware::CurrentSession;
