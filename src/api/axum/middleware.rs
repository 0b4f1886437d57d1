use std::marker::PhantomData;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use super::error::SessionRejection;
use crate::session::{Session, SessionManager, Store};

/// resolves the session cookie against the manager held in router state
///
/// The state must provide `Arc<SessionManager<S>>` through `FromRef`.
#[derive(Debug, Clone)]
pub struct CurrentSession<S>
where
    S: Store,
{
    session: Session,
    _marker: PhantomData<S>,
}

impl<S> CurrentSession<S>
where
    S: Store,
{
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_inner(self) -> Session {
        self.session
    }
}

impl<S, St> FromRequestParts<St> for CurrentSession<S>
where
    S: Store + 'static,
    St: Send + Sync,
    Arc<SessionManager<S>>: FromRef<St>,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, state: &St) -> Result<Self, Self::Rejection> {
        let manager = Arc::<SessionManager<S>>::from_ref(state);
        let session = manager.retrieve(&parts.headers).await?;

        Ok(CurrentSession {
            session,
            _marker: PhantomData,
        })
    }
}
