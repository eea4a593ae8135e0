//! crates/careerhub_core/src/registration.rs
//!
//! The three-step registration as an explicit state machine:
//!
//! ```text
//!   (start) --submit_account--> Created --await_verification--> EmailPending
//!   EmailPending --submit_code--> Verified --submit_profile--> ProfileComplete
//! ```
//!
//! Each transition validates its form locally, calls the session store, and
//! only advances on success. Calls made from the wrong state are refused
//! before anything is sent. The state is advisory: the backend stays the
//! authority on how far a user really got.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::domain::{RegisterStep1Data, User};
use crate::envelope::{FieldErrors, OperationResult};
use crate::profile::ProfileDraft;
use crate::session::SessionStore;
use crate::validation;

//=========================================================================================
// States and Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationState {
    /// The account exists; a code has been emailed.
    Created { email: String },
    /// The code entry form is open for this email.
    EmailPending { email: String },
    /// The email is verified and a session exists for this user.
    Verified { user_id: i64 },
    ProfileComplete,
}

impl RegistrationState {
    pub fn name(&self) -> &'static str {
        match self {
            RegistrationState::Created { .. } => "created",
            RegistrationState::EmailPending { .. } => "email_pending",
            RegistrationState::Verified { .. } => "verified",
            RegistrationState::ProfileComplete => "profile_complete",
        }
    }

    /// Best-effort reading of the backend's progress marker on a user record.
    ///
    /// Markers naming step 3 or completion map to `ProfileComplete`; markers
    /// naming step 2 or verification map to `Verified`; markers naming step 1
    /// or pending verification map to `EmailPending`. Anything else is unknown.
    pub fn from_user(user: &User) -> Option<Self> {
        let marker = user.registration_step.as_deref()?.trim().to_ascii_lowercase();
        if marker.contains("complete") || marker.contains("step3") || marker == "3" {
            Some(RegistrationState::ProfileComplete)
        } else if marker.contains("verified") || marker.contains("step2") || marker == "2" {
            Some(RegistrationState::Verified { user_id: user.id })
        } else if marker.contains("pending") || marker.contains("step1") || marker == "1" {
            Some(RegistrationState::EmailPending {
                email: user.email.clone(),
            })
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("cannot {action} while registration is {state}")]
    OutOfOrder {
        state: &'static str,
        action: &'static str,
    },
    /// Local validation failed; nothing was sent.
    #[error("invalid input")]
    Invalid(FieldErrors),
    /// The backend refused the step.
    #[error("{message}")]
    Rejected { message: String, errors: FieldErrors },
}

impl FlowError {
    fn rejected(result: OperationResult, fallback: &str) -> Self {
        FlowError::Rejected {
            message: result.message.unwrap_or_else(|| fallback.to_string()),
            errors: result.errors,
        }
    }
}

//=========================================================================================
// Flow
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct RegistrationFlow {
    state: Option<RegistrationState>,
}

impl RegistrationFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks the flow up from a known state, e.g. one derived from a user record.
    pub fn resume(state: RegistrationState) -> Self {
        Self { state: Some(state) }
    }

    pub fn state(&self) -> Option<&RegistrationState> {
        self.state.as_ref()
    }

    fn out_of_order(&self, action: &'static str) -> FlowError {
        FlowError::OutOfOrder {
            state: self.state.as_ref().map_or("not started", RegistrationState::name),
            action,
        }
    }

    /// Step 1: create the account.
    pub async fn submit_account(
        &mut self,
        store: &SessionStore,
        data: &RegisterStep1Data,
    ) -> Result<OperationResult, FlowError> {
        if self.state.is_some() {
            return Err(self.out_of_order("create an account"));
        }
        validation::validate_step1(data).map_err(FlowError::Invalid)?;

        let result = store.register_step1(data).await;
        if !result.success {
            return Err(FlowError::rejected(result, "Registration failed. Please try again."));
        }

        info!("account created, verification code sent");
        self.state = Some(RegistrationState::Created {
            email: data.email.trim().to_string(),
        });
        Ok(result)
    }

    /// Opens code entry for the account's email and returns that email.
    pub fn await_verification(&mut self) -> Result<String, FlowError> {
        let email = match &self.state {
            Some(RegistrationState::Created { email }) => email.clone(),
            _ => return Err(self.out_of_order("await verification")),
        };
        self.state = Some(RegistrationState::EmailPending {
            email: email.clone(),
        });
        Ok(email)
    }

    /// Step 2: verify the emailed code. The input is normalized the way the
    /// code field does before it is checked.
    pub async fn submit_code(
        &mut self,
        store: &SessionStore,
        code: &str,
    ) -> Result<OperationResult, FlowError> {
        let email = match &self.state {
            Some(RegistrationState::EmailPending { email }) => email.clone(),
            _ => return Err(self.out_of_order("verify a code")),
        };
        let code = validation::normalize_code(code);
        validation::validate_code(&code).map_err(FlowError::Invalid)?;

        let result = store.verify_email(&email, &code).await;
        if !result.success {
            return Err(FlowError::rejected(result, "Verification failed. Please try again."));
        }
        let Some(user_id) = result.user.as_ref().map(|u| u.id) else {
            debug!("verification answer carried no user");
            return Err(FlowError::rejected(
                OperationResult {
                    message: None,
                    ..result
                },
                "Verification failed. User data not found.",
            ));
        };

        info!(user_id, "email verified");
        self.state = Some(RegistrationState::Verified { user_id });
        Ok(result)
    }

    /// Step 3: submit the profile. The personal section is validated against
    /// `today`; incomplete education and certification entries are dropped.
    pub async fn submit_profile(
        &mut self,
        store: &SessionStore,
        draft: &ProfileDraft,
        today: NaiveDate,
    ) -> Result<OperationResult, FlowError> {
        let user_id = match &self.state {
            Some(RegistrationState::Verified { user_id }) => *user_id,
            _ => return Err(self.out_of_order("complete the profile")),
        };
        validation::validate_personal_info(&draft.personal, today).map_err(FlowError::Invalid)?;

        let result = store.complete_profile(draft.to_submission(user_id)).await;
        if !result.success {
            return Err(FlowError::rejected(
                result,
                "Profile completion failed. Please try again.",
            ));
        }

        info!(user_id, "registration complete");
        self.state = Some(RegistrationState::ProfileComplete);
        Ok(result)
    }
}
