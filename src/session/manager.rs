//! Session lifecycle: create, retrieve, save.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cookie::Cookie;
use http::header::{HeaderValue, SET_COOKIE};

use super::cookie::{
    build_cookie, cookie_expiry, sign_session_id, verify_signed_cookie, CookieSource,
};
use super::id::{IdGenerator, RandomIdGenerator};
use super::store::Store;
use super::{codec, Session};
use crate::events::{Listener, SessionEvent};
use crate::{SecretString, SessionConfig, SessionError};

/// A freshly created session and the cookie that identifies it.
///
/// The caller attaches `cookie` to its response. Code later in the same
/// request can pass `&cookie` to [`SessionManager::retrieve`] directly.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub session: Session,
    pub cookie: Cookie<'static>,
}

impl NewSession {
    /// Renders the `Set-Cookie` header value.
    pub fn set_cookie_header(&self) -> String {
        self.cookie.to_string()
    }

    /// Appends a `Set-Cookie` header for the session cookie.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if the rendered cookie is not a
    /// valid header value, which happens only for a cookie name, path or
    /// domain containing control characters.
    pub fn append_to(&self, headers: &mut http::HeaderMap) -> Result<(), SessionError> {
        let value = HeaderValue::from_str(&self.set_cookie_header())
            .map_err(|e| SessionError::Configuration(format!("invalid cookie header: {e}")))?;
        headers.append(SET_COOKIE, value);
        Ok(())
    }
}

/// Issues and resolves cookie-identified sessions over a [`Store`].
///
/// The manager holds only immutable configuration and is safe to share
/// between requests when the store is. `save` reads then writes without a
/// lock, so concurrent saves of the same session are last-write-wins.
pub struct SessionManager<S: Store> {
    store: S,
    config: SessionConfig,
    id_generator: Arc<dyn IdGenerator>,
    listeners: Vec<Arc<dyn Listener>>,
}

impl<S: Store + Clone> Clone for SessionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            id_generator: Arc::clone(&self.id_generator),
            listeners: self.listeners.clone(),
        }
    }
}

impl<S: Store> fmt::Debug for SessionManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl<S: Store> SessionManager<S> {
    /// Creates a manager with random 32-character session ids.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if `config` fails validation.
    pub fn new(store: S, config: SessionConfig) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            id_generator: Arc::new(RandomIdGenerator::default()),
            listeners: Vec::new(),
        })
    }

    /// Replaces the session id generator.
    #[must_use]
    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    /// Registers a listener for session events.
    #[must_use]
    pub fn listen(mut self, listener: impl Listener) -> Self {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new session and builds its cookie.
    ///
    /// The session expires `session_duration` from now. Its store entry is
    /// an empty placeholder until the first `save`.
    ///
    /// # Returns
    ///
    /// - `Ok(NewSession)` - session persisted, cookie ready to send
    /// - `Err(SessionError::Store)` - the placeholder could not be written
    /// - `Err(SessionError::EmptySessionId)` - the generator produced an empty id
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session_new", skip_all, err)
    )]
    pub async fn new_session(&self) -> Result<NewSession, SessionError> {
        let now = Utc::now();
        let expires_at = self.expiry_from(now)?;
        // converted before create so a bad expiry leaves nothing in the store
        let expires = cookie_expiry(expires_at)?;

        let session = self.create(expires_at).await?;
        let cookie = build_cookie(&self.config, self.cookie_value(&session.id), expires);

        self.dispatch(SessionEvent::Created {
            session_id: SecretString::new(session.id.as_str()),
            expires_at,
            at: now,
        })
        .await;

        Ok(NewSession { session, cookie })
    }

    /// Loads the session named by the request's session cookie.
    ///
    /// # Returns
    ///
    /// - `Err(SessionError::NoCookie)` - no session cookie
    /// - `Err(SessionError::EmptySessionId)` - cookie present with an empty value
    /// - `Err(SessionError::InvalidSignature)` - signing is enabled and the value does not verify
    /// - `Err(SessionError::NotFound)` - no store entry for the id
    /// - `Err(SessionError::Expired)` - saved session past its `expires_at`
    /// - `Err(SessionError::MalformedPayload)` - stored record does not decode
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session_retrieve", skip_all, err)
    )]
    pub async fn retrieve<C>(&self, source: &C) -> Result<Session, SessionError>
    where
        C: CookieSource + ?Sized,
    {
        let value = source
            .cookie_value(&self.config.cookie_name)
            .ok_or(SessionError::NoCookie)?;
        if value.is_empty() {
            return Err(SessionError::EmptySessionId);
        }

        let session_id = match &self.config.signing_secret {
            Some(secret) => {
                verify_signed_cookie(&value, secret).ok_or(SessionError::InvalidSignature)?
            }
            None => value,
        };

        self.find(&session_id).await
    }

    /// Overwrites the stored record of an existing session.
    ///
    /// Never creates an entry: a session that is not in the store fails with
    /// `SessionError::NotFound` and the store is left untouched.
    ///
    /// The caller cannot move the expiry. Once a record carries `expires_at`
    /// that value is kept; the first save of a placeholder keeps the caller's
    /// value when it is no later than `now + session_duration` and uses that
    /// bound otherwise.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session_save", skip_all, err)
    )]
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let stored = self.find(&session.id).await?;

        let expires_at = match stored.data.expires_at {
            Some(expires_at) => expires_at,
            None => {
                let latest = self.expiry_from(Utc::now())?;
                session
                    .data
                    .expires_at
                    .filter(|requested| *requested <= latest)
                    .unwrap_or(latest)
            }
        };

        let mut record = session.clone();
        record.data.expires_at = Some(expires_at);

        let bytes = codec::encode(&record)?;
        self.store.put(&record.id, bytes).await?;

        log::debug!(target: "telehealth_session", "msg=\"session saved\"");

        self.dispatch(SessionEvent::Saved {
            session_id: SecretString::new(session.id.as_str()),
            at: Utc::now(),
        })
        .await;

        Ok(())
    }

    /// Generates an id and writes the empty placeholder under it.
    ///
    /// `expires_at` is kept on the returned session only; the store sees it
    /// once the session is saved.
    pub(crate) async fn create(&self, expires_at: DateTime<Utc>) -> Result<Session, SessionError> {
        let id = self.id_generator.generate();
        if id.is_empty() {
            return Err(SessionError::EmptySessionId);
        }

        self.store.put(&id, Vec::new()).await?;

        log::debug!(target: "telehealth_session", "msg=\"session created\"");

        let mut session = Session::new(id);
        session.data.expires_at = Some(expires_at);
        Ok(session)
    }

    pub(crate) async fn find(&self, id: &str) -> Result<Session, SessionError> {
        let bytes = self.store.get(id).await?.ok_or(SessionError::NotFound)?;
        let session = codec::decode(id, &bytes)?;

        if self.config.enforce_expiry && session.is_expired() {
            return Err(SessionError::Expired);
        }

        Ok(session)
    }

    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, SessionError> {
        now.checked_add_signed(self.config.session_duration)
            .ok_or_else(|| {
                SessionError::Configuration("session_duration overflows expiry".to_owned())
            })
    }

    fn cookie_value(&self, session_id: &str) -> String {
        match &self.config.signing_secret {
            Some(secret) => sign_session_id(session_id, secret),
            None => session_id.to_owned(),
        }
    }

    async fn dispatch(&self, event: SessionEvent) {
        for listener in &self.listeners {
            listener.handle(&event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration;
    use http::header::COOKIE;
    use http::HeaderMap;
    use serde_json::json;

    use super::*;
    use crate::session::MemoryStore;

    fn manager(store: MemoryStore) -> SessionManager<MemoryStore> {
        let counter = AtomicUsize::new(0);
        SessionManager::new(
            store,
            SessionConfig {
                session_duration: Duration::hours(1),
                ..Default::default()
            },
        )
        .unwrap()
        .with_id_generator(move || format!("sess-{}", counter.fetch_add(1, Ordering::SeqCst) + 1))
    }

    fn request_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    struct FailingStore;

    #[async_trait]
    impl Store for FailingStore {
        async fn put(&self, _key: &str, _value: Vec<u8>) -> Result<(), SessionError> {
            Err(SessionError::Store("connection refused".to_owned()))
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, SessionError> {
            Err(SessionError::Store("connection refused".to_owned()))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingListener {
        names: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Listener for RecordingListener {
        async fn handle(&self, event: &SessionEvent) {
            self.names.lock().unwrap().push(event.name());
        }
    }

    #[tokio::test]
    async fn test_create_writes_placeholder() {
        let store = MemoryStore::new();
        let manager = manager(store.clone());
        let expires_at = Utc::now() + Duration::hours(1);

        let session = manager.create(expires_at).await.unwrap();

        assert_eq!(session.id, "sess-1");
        assert_eq!(session.data.expires_at, Some(expires_at));
        assert_eq!(store.get("sess-1").await.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_id() {
        let store = MemoryStore::new();
        let manager = SessionManager::new(store.clone(), SessionConfig::default())
            .unwrap()
            .with_id_generator(String::new);

        let result = manager.create(Utc::now()).await;
        assert_eq!(result.unwrap_err(), SessionError::EmptySessionId);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_find_placeholder_has_empty_payload() {
        let store = MemoryStore::new();
        store.put("abc", Vec::new()).await.unwrap();

        let session = manager(store).find("abc").await.unwrap();
        assert_eq!(session.id, "abc");
        assert!(session.data.is_empty());
    }

    #[tokio::test]
    async fn test_find_missing() {
        let result = manager(MemoryStore::new()).find("nope").await;
        assert_eq!(result.unwrap_err(), SessionError::NotFound);
    }

    #[tokio::test]
    async fn test_find_malformed_is_not_masked() {
        let store = MemoryStore::new();
        store.put("abc", b"not json".to_vec()).await.unwrap();

        let result = manager(store).find("abc").await;
        assert!(matches!(result, Err(SessionError::MalformedPayload(_))));
    }

    #[tokio::test]
    async fn test_find_rejects_expired_record() {
        let store = MemoryStore::new();
        let mut session = Session::new("abc");
        session.data.expires_at = Some(Utc::now() - Duration::minutes(1));
        store.put("abc", codec::encode(&session).unwrap()).await.unwrap();

        let result = manager(store.clone()).find("abc").await;
        assert_eq!(result.unwrap_err(), SessionError::Expired);

        let lenient = SessionManager::new(
            store,
            SessionConfig {
                enforce_expiry: false,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(lenient.find("abc").await.unwrap(), session);
    }

    #[tokio::test]
    async fn test_new_session_issues_cookie() {
        let manager = manager(MemoryStore::new());
        let before = Utc::now();

        let new = manager.new_session().await.unwrap();

        assert_eq!(new.session.id, "sess-1");
        assert_eq!(new.cookie.name(), "session");
        assert_eq!(new.cookie.value(), "sess-1");

        let expires = new.cookie.expires_datetime().unwrap().unix_timestamp();
        let expected = (before + Duration::hours(1)).timestamp();
        assert!((expires - expected).abs() <= 1);
        assert_eq!(
            new.session.data.expires_at.map(|t| t.timestamp()),
            Some(expires)
        );
    }

    #[tokio::test]
    async fn test_new_session_appends_set_cookie() {
        let new = manager(MemoryStore::new()).new_session().await.unwrap();

        let mut headers = HeaderMap::new();
        new.append_to(&mut headers).unwrap();

        let header = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(header.starts_with("session=sess-1"));
        assert!(header.contains("Expires="));
        assert!(!header.contains("HttpOnly"));
        assert!(!header.contains("Secure"));
    }

    #[tokio::test]
    async fn test_retrieve_same_request_via_cookie() {
        let manager = manager(MemoryStore::new());
        let new = manager.new_session().await.unwrap();

        let session = manager.retrieve(&new.cookie).await.unwrap();
        assert_eq!(session.id, new.session.id);
    }

    #[tokio::test]
    async fn test_retrieve_from_headers() {
        let manager = manager(MemoryStore::new());
        manager.new_session().await.unwrap();

        let session = manager
            .retrieve(&request_with_cookie("session=sess-1"))
            .await
            .unwrap();
        assert_eq!(session.id, "sess-1");
    }

    #[tokio::test]
    async fn test_retrieve_without_cookie() {
        let result = manager(MemoryStore::new()).retrieve(&HeaderMap::new()).await;
        assert_eq!(result.unwrap_err(), SessionError::NoCookie);
    }

    #[tokio::test]
    async fn test_retrieve_empty_cookie() {
        let result = manager(MemoryStore::new())
            .retrieve(&request_with_cookie("session="))
            .await;
        assert_eq!(result.unwrap_err(), SessionError::EmptySessionId);
    }

    #[tokio::test]
    async fn test_retrieve_quoted_empty_cookie() {
        let result = manager(MemoryStore::new())
            .retrieve(&request_with_cookie("session=\"\""))
            .await;
        assert_eq!(result.unwrap_err(), SessionError::EmptySessionId);
    }

    #[tokio::test]
    async fn test_retrieve_unknown_id() {
        let result = manager(MemoryStore::new())
            .retrieve(&request_with_cookie("session=forged"))
            .await;
        assert_eq!(result.unwrap_err(), SessionError::NotFound);
    }

    #[tokio::test]
    async fn test_save_requires_existing_session() {
        let store = MemoryStore::new();
        let manager = manager(store.clone());

        let mut session = Session::new("never-created");
        session.insert("k", "v").unwrap();

        assert_eq!(manager.save(&session).await.unwrap_err(), SessionError::NotFound);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_save_overwrites() {
        let manager = manager(MemoryStore::new());
        let created = manager.create(Utc::now() + Duration::hours(1)).await.unwrap();

        let mut session = created.clone();
        session.insert("k", "v").unwrap();
        manager.save(&session).await.unwrap();
        assert_eq!(manager.find(&created.id).await.unwrap(), session);

        session.insert("k", "w").unwrap();
        manager.save(&session).await.unwrap();
        let found = manager.find(&created.id).await.unwrap();
        assert_eq!(found.data.values.get("k"), Some(&json!("w")));
    }

    #[tokio::test]
    async fn test_save_after_retrieve_records_expiry() {
        let manager = manager(MemoryStore::new());
        let before = Utc::now();
        let new = manager.new_session().await.unwrap();

        // a placeholder reads back without an expiry
        let mut session = manager.retrieve(&new.cookie).await.unwrap();
        assert_eq!(session.data.expires_at, None);

        session.insert("k", "v").unwrap();
        manager.save(&session).await.unwrap();

        let expires_at = manager.find("sess-1").await.unwrap().data.expires_at.unwrap();
        assert!(expires_at >= before + Duration::hours(1));
        assert!(expires_at <= Utc::now() + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_save_keeps_stored_expiry() {
        let manager = manager(MemoryStore::new());
        let new = manager.new_session().await.unwrap();
        manager.save(&new.session).await.unwrap();
        let original = new.session.data.expires_at;

        let mut session = manager.retrieve(&new.cookie).await.unwrap();
        session.data.expires_at = Some(Utc::now() + Duration::days(30));
        manager.save(&session).await.unwrap();
        assert_eq!(manager.find("sess-1").await.unwrap().data.expires_at, original);

        session.data.expires_at = None;
        manager.save(&session).await.unwrap();
        assert_eq!(manager.find("sess-1").await.unwrap().data.expires_at, original);
    }

    #[tokio::test]
    async fn test_first_save_caps_requested_expiry() {
        let manager = manager(MemoryStore::new());
        let created = manager.create(Utc::now() + Duration::hours(1)).await.unwrap();

        let mut session = created.clone();
        session.data.expires_at = Some(Utc::now() + Duration::days(30));
        manager.save(&session).await.unwrap();

        let expires_at = manager.find(&created.id).await.unwrap().data.expires_at.unwrap();
        assert!(expires_at <= Utc::now() + Duration::hours(1));
    }

    #[tokio::test]
    async fn test_new_session_bad_expiry_leaves_store_empty() {
        let store = MemoryStore::new();
        // bypasses validate, which would reject this duration
        let manager = SessionManager {
            store: store.clone(),
            config: SessionConfig {
                session_duration: Duration::days(365 * 20_000),
                ..Default::default()
            },
            id_generator: Arc::new(|| "sess-1".to_owned()),
            listeners: Vec::new(),
        };

        let result = manager.new_session().await;
        assert!(matches!(result, Err(SessionError::Configuration(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let manager = SessionManager::new(FailingStore, SessionConfig::default()).unwrap();

        let err = manager.new_session().await.unwrap_err();
        assert_eq!(err, SessionError::Store("connection refused".to_owned()));

        let err = manager.save(&Session::new("abc")).await.unwrap_err();
        assert_eq!(err, SessionError::Store("connection refused".to_owned()));
    }

    #[tokio::test]
    async fn test_signed_cookie_roundtrip() {
        let manager = SessionManager::new(
            MemoryStore::new(),
            SessionConfig {
                signing_secret: Some(SecretString::new("test-secret-key-that-is-long-enough")),
                ..Default::default()
            },
        )
        .unwrap()
        .with_id_generator(|| "sess-1".to_owned());

        let new = manager.new_session().await.unwrap();
        assert!(new.cookie.value().starts_with("sess-1."));

        let session = manager.retrieve(&new.cookie).await.unwrap();
        assert_eq!(session.id, "sess-1");

        // the raw id is not accepted once signing is on
        let result = manager.retrieve(&request_with_cookie("session=sess-1")).await;
        assert_eq!(result.unwrap_err(), SessionError::InvalidSignature);
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let result = SessionManager::new(
            MemoryStore::new(),
            SessionConfig {
                signing_secret: Some(SecretString::new("short")),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_listeners_receive_events() {
        let listener = RecordingListener::default();
        let manager = manager(MemoryStore::new()).listen(listener.clone());

        let new = manager.new_session().await.unwrap();
        manager.save(&new.session).await.unwrap();
        let _ = manager.save(&Session::new("missing")).await;

        assert_eq!(
            *listener.names.lock().unwrap(),
            vec!["session.created", "session.saved"]
        );
    }
}
