//! crates/careerhub_core/src/session.rs
//!
//! The session store: the single client-visible answer to "who is logged in",
//! and the auth operations that change it.
//!
//! The held user is a cache of the last successful relay answer. Operations run
//! as independent async tasks with no mutual exclusion on the user; the last
//! write wins. Loading is tracked per operation so that a fast call finishing
//! never clears the flag of a slower one still in flight.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::domain::{Endpoint, RegisterStep1Data, User};
use crate::envelope::{interpret, EnvelopeError, Interpreted, OperationResult};
use crate::ports::{PortError, RelayCall, RelayService};

//=========================================================================================
// Errors
//=========================================================================================

/// Why a login did not go through. The display text is meant for the user.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The backend refused; carries the derived failure message.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Transport(#[from] PortError),
    #[error(transparent)]
    Malformed(#[from] EnvelopeError),
}

//=========================================================================================
// Loading Tracking
//=========================================================================================

/// The store's operations, used to report loading per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Refresh,
    Login,
    Logout,
    RegisterStep1,
    VerifyEmail,
    CompleteProfile,
}

impl Operation {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        match self {
            Operation::Refresh => 0,
            Operation::Login => 1,
            Operation::Logout => 2,
            Operation::RegisterStep1 => 3,
            Operation::VerifyEmail => 4,
            Operation::CompleteProfile => 5,
        }
    }
}

#[derive(Default)]
struct LoadingTracker {
    in_flight: [AtomicUsize; Operation::COUNT],
    initialized: AtomicBool,
}

impl LoadingTracker {
    fn begin(&self, op: Operation) -> LoadingGuard<'_> {
        let counter = &self.in_flight[op.index()];
        counter.fetch_add(1, Ordering::SeqCst);
        LoadingGuard { counter }
    }

    fn any(&self) -> bool {
        !self.initialized.load(Ordering::SeqCst)
            || self.in_flight.iter().any(|c| c.load(Ordering::SeqCst) > 0)
    }

    fn of(&self, op: Operation) -> bool {
        self.in_flight[op.index()].load(Ordering::SeqCst) > 0
    }
}

/// Releases one in-flight slot on every exit path, including early returns.
struct LoadingGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

//=========================================================================================
// Session Store
//=========================================================================================

/// Owned by the composition root and handed to whatever needs it.
pub struct SessionStore {
    relay: Arc<dyn RelayService>,
    current_user: RwLock<Option<User>>,
    loading: LoadingTracker,
}

impl SessionStore {
    /// Creates a store that has not asked the relay anything yet. It reports
    /// `is_loading() == true` until its first refresh completes.
    pub fn new(relay: Arc<dyn RelayService>) -> Self {
        Self {
            relay,
            current_user: RwLock::new(None),
            loading: LoadingTracker::default(),
        }
    }

    /// Creates a store and immediately adopts whatever session the relay reports.
    pub async fn connect(relay: Arc<dyn RelayService>) -> Self {
        let store = Self::new(relay);
        store.refresh().await;
        store
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// `true` before the first refresh finishes and while any operation runs.
    pub fn is_loading(&self) -> bool {
        self.loading.any()
    }

    pub fn is_loading_op(&self, op: Operation) -> bool {
        self.loading.of(op)
    }

    fn set_user(&self, user: Option<User>) {
        *self
            .current_user
            .write()
            .unwrap_or_else(PoisonError::into_inner) = user;
    }

    /// Sends one call and reads the answer. Never inspects the status.
    async fn call(&self, call: RelayCall) -> Result<Interpreted, SessionError> {
        let endpoint = call.endpoint;
        let reply = self.relay.send(call).await?;
        debug!(
            endpoint = %endpoint,
            status = reply.status,
            content_type = reply.content_type.as_deref().unwrap_or(""),
            "relay replied"
        );
        Ok(interpret(&reply)?)
    }

    //-------------------------------------------------------------------------------------
    // Operations
    //-------------------------------------------------------------------------------------

    /// Re-reads the current user. Any failure leaves the store logged out.
    pub async fn refresh(&self) {
        let _guard = self.loading.begin(Operation::Refresh);

        let user = match self.call(RelayCall::new(Endpoint::CurrentUser)).await {
            Ok(interpreted) if interpreted.is_success() => {
                interpreted.response.current_user_payload()
            }
            Ok(interpreted) => {
                debug!(status = interpreted.status, "no active session");
                None
            }
            Err(e) => {
                warn!("Failed to refresh current user: {}", e);
                None
            }
        };

        self.set_user(user);
        self.loading.initialized.store(true, Ordering::SeqCst);
    }

    /// Logs in and adopts the returned user.
    ///
    /// The user is taken from `data.user`, else from a top-level `user`; when
    /// the answer carries neither, the store refreshes instead. On failure the
    /// held user is left untouched.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, SessionError> {
        let _guard = self.loading.begin(Operation::Login);

        let body = json!({ "email": email, "password": password });
        let interpreted = self
            .call(RelayCall::with_body(Endpoint::Login, body))
            .await
            .map_err(|e| {
                error!("Login error: {}", e);
                e
            })?;

        if !interpreted.is_success() {
            let message = interpreted.error_message();
            warn!(status = interpreted.status, "Login rejected: {}", message);
            return Err(SessionError::Rejected(message));
        }

        let response = interpreted.response;
        if response.explicitly_failed() {
            let message = response
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .or_else(|| response.error_text())
                .unwrap_or_else(|| "Login failed".to_string());
            warn!("Login rejected: {}", message);
            return Err(SessionError::Rejected(message));
        }

        match response.user_payload() {
            Some(user) => {
                info!(user_id = user.id, "logged in");
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            None => {
                debug!("login answer carried no user, refreshing");
                self.refresh().await;
                Ok(self.current_user())
            }
        }
    }

    /// Logs out. Best effort: the store forgets the user whatever happens.
    pub async fn logout(&self) {
        let _guard = self.loading.begin(Operation::Logout);

        match self.call(RelayCall::new(Endpoint::Logout)).await {
            Ok(interpreted) if !interpreted.is_success() => {
                warn!(status = interpreted.status, "Logout rejected: {}", interpreted.error_message());
            }
            Ok(_) => info!("logged out"),
            Err(e) => warn!("Logout error: {}", e),
        }

        self.set_user(None);
    }

    /// Submits the account form. No session exists yet, so the held user is
    /// not touched.
    pub async fn register_step1(&self, data: &RegisterStep1Data) -> OperationResult {
        let _guard = self.loading.begin(Operation::RegisterStep1);

        let body = json!({
            "first_name": data.first_name,
            "last_name": data.last_name,
            "email": data.email,
            "password": data.password,
            "password_confirmation": data.password_confirmation,
        });
        self.submit(Endpoint::RegisterStep1, body).await
    }

    /// Submits the emailed code. An apparent success (explicit `success: true`,
    /// or a message saying the email was verified) triggers one refresh so the
    /// freshly created session is adopted.
    pub async fn verify_email(&self, email: &str, code: &str) -> OperationResult {
        let _guard = self.loading.begin(Operation::VerifyEmail);

        let body = json!({ "email": email, "code": code });
        let interpreted = match self.call(RelayCall::with_body(Endpoint::VerifyEmail, body)).await {
            Ok(interpreted) => interpreted,
            Err(e) => {
                error!("Verify email error: {}", e);
                return OperationResult::failed(e.to_string());
            }
        };

        if !interpreted.is_success() {
            return OperationResult::rejected(interpreted);
        }

        let confirmed = interpreted.response.success == Some(true)
            || interpreted
                .response
                .message
                .as_deref()
                .map_or(false, |m| m.to_lowercase().contains("verified"));
        let result = OperationResult::accepted(interpreted.response);
        if confirmed {
            self.refresh().await;
        }
        result
    }

    /// Submits the completed profile. A returned user replaces the held one.
    pub async fn complete_profile(&self, data: Value) -> OperationResult {
        let _guard = self.loading.begin(Operation::CompleteProfile);

        let result = self.submit(Endpoint::CompleteProfile, data).await;
        if result.success {
            if let Some(user) = &result.user {
                info!(user_id = user.id, "profile completed");
                self.set_user(Some(user.clone()));
            }
        }
        result
    }

    /// Shared path of the operations that report a result instead of failing.
    async fn submit(&self, endpoint: Endpoint, body: Value) -> OperationResult {
        match self.call(RelayCall::with_body(endpoint, body)).await {
            Ok(interpreted) if interpreted.is_success() => {
                OperationResult::accepted(interpreted.response)
            }
            Ok(interpreted) => {
                debug!(endpoint = %endpoint, status = interpreted.status, "request rejected");
                OperationResult::rejected(interpreted)
            }
            Err(e) => {
                error!("{} error: {}", endpoint, e);
                OperationResult::failed(e.to_string())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedRelay;
    use super::*;
    use crate::ports::RelayReply;

    fn user_json(id: i64) -> Value {
        json!({
            "id": id,
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "registration_step": "completed"
        })
    }

    fn store(relay: &Arc<ScriptedRelay>) -> SessionStore {
        SessionStore::new(relay.clone())
    }

    #[tokio::test]
    async fn new_store_is_loading_until_first_refresh() {
        let relay = Arc::new(ScriptedRelay::default());
        let store = store(&relay);
        assert!(store.is_loading());

        store.refresh().await;
        assert!(!store.is_loading());
        assert!(store.current_user().is_none());
    }

    #[tokio::test]
    async fn connect_adopts_existing_session() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(3) })),
        );

        let store = SessionStore::connect(relay.clone()).await;
        assert_eq!(store.current_user().unwrap().id, 3);
        assert_eq!(relay.calls_to(Endpoint::CurrentUser).len(), 1);
    }

    #[tokio::test]
    async fn refresh_is_idempotent() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(9) })),
        );
        let store = store(&relay);

        store.refresh().await;
        let first = store.current_user();
        store.refresh().await;
        assert_eq!(store.current_user(), first);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn refresh_clears_user_on_transport_error() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::CurrentUser,
            Ok(RelayReply::json(200, &json!({ "success": true, "data": user_json(1) }))),
        );
        relay.push(
            Endpoint::CurrentUser,
            Err(PortError::Transport("connection refused".into())),
        );
        let store = store(&relay);

        store.refresh().await;
        assert!(store.is_authenticated());
        store.refresh().await;
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn login_adopts_nested_user_exactly() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::Login,
            Ok(RelayReply::json(200, &json!({ "success": true, "data": { "user": user_json(1) } }))),
        );
        let store = store(&relay);

        let user = store.login("ada@example.com", "analytical").await.unwrap();
        let expected: User = serde_json::from_value(user_json(1)).unwrap();
        assert_eq!(user.as_ref(), Some(&expected));
        assert_eq!(store.current_user(), Some(expected));
        assert!(relay.calls_to(Endpoint::CurrentUser).is_empty());
    }

    #[tokio::test]
    async fn login_accepts_top_level_user() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::Login,
            Ok(RelayReply::json(200, &json!({ "success": true, "user": user_json(5) }))),
        );
        let store = store(&relay);

        store.login("ada@example.com", "analytical").await.unwrap();
        assert_eq!(store.current_user().unwrap().id, 5);
    }

    #[tokio::test]
    async fn login_without_user_falls_back_to_refresh() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(Endpoint::Login, Ok(RelayReply::json(200, &json!({ "success": true }))));
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(8) })),
        );
        let store = store(&relay);

        let user = store.login("ada@example.com", "analytical").await.unwrap();
        assert_eq!(user.unwrap().id, 8);
        assert_eq!(relay.calls_to(Endpoint::CurrentUser).len(), 1);
    }

    #[tokio::test]
    async fn failed_login_reports_reason_and_keeps_user() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(2) })),
        );
        relay.push(
            Endpoint::Login,
            Ok(RelayReply::json(401, &json!({ "message": "Invalid credentials" }))),
        );
        let store = store(&relay);
        store.refresh().await;

        let err = store.login("ada@example.com", "wrong-password").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(store.current_user().unwrap().id, 2);
        assert!(!store.is_loading_op(Operation::Login));
    }

    #[tokio::test]
    async fn login_with_success_false_is_rejected() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::Login,
            Ok(RelayReply::json(200, &json!({ "success": false, "error": "Account locked" }))),
        );
        let store = store(&relay);

        let err = store.login("ada@example.com", "analytical").await.unwrap_err();
        assert!(matches!(err, SessionError::Rejected(ref m) if m == "Account locked"));
    }

    #[tokio::test]
    async fn logout_always_forgets_user() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(4) })),
        );
        relay.push(Endpoint::Logout, Err(PortError::Transport("network down".into())));
        let store = store(&relay);
        store.refresh().await;
        assert!(store.is_authenticated());

        store.logout().await;
        assert!(store.current_user().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn register_step1_returns_field_errors() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::RegisterStep1,
            Ok(RelayReply::json(422, &json!({ "errors": { "email": ["taken"] } }))),
        );
        let store = store(&relay);

        let result = store.register_step1(&RegisterStep1Data::default()).await;
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors["email"], vec!["taken"]);
        assert!(store.current_user().is_none());
    }

    #[tokio::test]
    async fn register_step1_transport_error_is_a_result() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::RegisterStep1,
            Err(PortError::Transport("connection reset".into())),
        );
        let store = store(&relay);

        let result = store.register_step1(&RegisterStep1Data::default()).await;
        assert!(!result.success);
        assert!(result.errors.contains_key("general"));
    }

    #[tokio::test]
    async fn verified_message_triggers_exactly_one_refresh() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::VerifyEmail,
            Ok(RelayReply::json(
                200,
                &json!({ "message": "Email verified successfully", "user": user_json(6) }),
            )),
        );
        relay.always(
            Endpoint::CurrentUser,
            RelayReply::json(200, &json!({ "success": true, "data": user_json(6) })),
        );
        let store = store(&relay);

        let result = store.verify_email("ada@example.com", "123456").await;
        assert!(result.success);
        assert_eq!(result.user.unwrap().id, 6);
        assert_eq!(relay.calls_to(Endpoint::CurrentUser).len(), 1);
        assert_eq!(store.current_user().unwrap().id, 6);
    }

    #[tokio::test]
    async fn unconfirmed_verification_does_not_refresh() {
        let relay = Arc::new(ScriptedRelay::default());
        relay.push(
            Endpoint::VerifyEmail,
            Ok(RelayReply::json(400, &json!({ "message": "Invalid code" }))),
        );
        let store = store(&relay);

        let result = store.verify_email("ada@example.com", "000000").await;
        assert!(!result.success);
        assert_eq!(result.message.as_deref(), Some("Invalid code"));
        assert!(relay.calls_to(Endpoint::CurrentUser).is_empty());
    }

    #[tokio::test]
    async fn complete_profile_adopts_returned_user() {
        let relay = Arc::new(ScriptedRelay::default());
        let mut completed = user_json(7);
        completed["bio"] = json!("Systems programmer.");
        relay.push(
            Endpoint::CompleteProfile,
            Ok(RelayReply::json(200, &json!({ "success": true, "data": { "user": completed } }))),
        );
        let store = store(&relay);

        let result = store
            .complete_profile(json!({ "user_id": 7, "birth_date": "1990-01-01" }))
            .await;
        assert!(result.success);
        assert_eq!(
            store.current_user().unwrap().bio.as_deref(),
            Some("Systems programmer.")
        );
        let sent = relay.calls_to(Endpoint::CompleteProfile);
        assert_eq!(sent[0].body.as_ref().unwrap()["user_id"], 7);
    }

    #[tokio::test]
    async fn fast_operation_does_not_clear_slow_loading() {
        let relay = Arc::new(ScriptedRelay::default());
        let gate = relay.gate(Endpoint::CurrentUser);
        relay.push(Endpoint::Logout, Ok(RelayReply::json(200, &json!({ "success": true }))));
        let store = Arc::new(store(&relay));

        let slow = {
            let store = store.clone();
            tokio::spawn(async move { store.refresh().await })
        };
        while !store.is_loading_op(Operation::Refresh) {
            tokio::task::yield_now().await;
        }

        store.logout().await;
        assert!(!store.is_loading_op(Operation::Logout));
        assert!(store.is_loading_op(Operation::Refresh));
        assert!(store.is_loading());

        gate.notify_one();
        slow.await.unwrap();
        assert!(!store.is_loading());
    }
}
