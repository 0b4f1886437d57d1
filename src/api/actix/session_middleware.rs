//! Session extractor for actix-web.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, HttpResponse, HttpResponseBuilder, web};

use crate::api::ErrorResponse;
use crate::session::{CookieSource, NewSession, Session, SessionManager, Store};
use crate::SessionError;

impl CookieSource for HttpRequest {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookie(name).map(|c| {
            let value = c.value();
            // a value wrapped in one pair of DQUOTEs is read without them
            value
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(value)
                .to_owned()
        })
    }
}

/// Appends the `Set-Cookie` header for a newly created session.
pub fn append_session_cookie<'a>(
    builder: &'a mut HttpResponseBuilder,
    new: &NewSession,
) -> &'a mut HttpResponseBuilder {
    builder.append_header((header::SET_COOKIE, new.set_cookie_header()))
}

/// The session named by the request's session cookie.
///
/// Requires a `web::Data<SessionManager<S>>` in the app data.
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

#[derive(Debug)]
pub struct SessionRejection {
    pub error: SessionError,
}

impl std::fmt::Display for SessionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl actix_web::ResponseError for SessionRejection {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse::from(&self.error);

        if self.error.is_unauthenticated() {
            HttpResponse::Unauthorized().json(error_response)
        } else {
            HttpResponse::InternalServerError().json(error_response)
        }
    }
}

impl<S> FromRequest for CurrentSession<S>
where
    S: Store + 'static,
{
    type Error = SessionRejection;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let manager = req.app_data::<web::Data<SessionManager<S>>>().cloned();
        let req = req.clone();

        Box::pin(async move {
            let manager = manager.ok_or_else(|| SessionRejection {
                error: SessionError::Configuration("SessionManager not found".to_owned()),
            })?;

            let session = manager
                .retrieve(&req)
                .await
                .map_err(|error| SessionRejection { error })?;

            Ok(CurrentSession {
                session,
                _marker: PhantomData,
            })
        })
    }
}
