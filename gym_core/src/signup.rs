//! Account creation: validate, create, sign in.
//!
//! ## Submission lifecycle
//!
//! ```text
//! Idle -> Validating -> Submitting -> Authenticating -> Idle
//!            |              |               |
//!            +-> Idle       +-> Idle        +-> Idle
//!          (inline errors) (notified)     (notified)
//! ```
//!
//! Creating the account and signing in are two separate remote calls with no
//! compensating action. A failure in `Authenticating` leaves an account on the
//! server that the local flow reports as failed. With a [`SessionStore`]
//! attached, a pending marker survives that failure so
//! [`SignUpPipeline::resume_sign_in`] can finish the second phase without
//! creating the account again.

use crate::feedback::{FallbackMessages, Notifier, Operation};
use crate::navigation::Navigator;
use crate::session::{PendingSignup, SessionEstablisher, SessionStore};
use crate::transport::{Resource, Transport};
use crate::validation::{self, Field, FieldErrors, FormInput, ValidatedInput};
use crate::{AuthError, NewAccount, RemoteError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::Instrument;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Submitting,
    Authenticating,
}

/// Which remote step of a submission failed
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("account creation failed: {0}")]
    CreateAccount(#[source] RemoteError),

    /// The account exists server-side; only the session is missing
    #[error("sign-in after account creation failed: {0}")]
    SignIn(#[source] AuthError),

    #[error("no pending sign-up to resume")]
    NothingPending,
}

impl SubmissionError {
    pub fn domain_message(&self) -> Option<&str> {
        match self {
            SubmissionError::CreateAccount(e) => e.domain_message(),
            SubmissionError::SignIn(e) => e.domain_message(),
            SubmissionError::NothingPending => None,
        }
    }

    pub fn account_created(&self) -> bool {
        matches!(self, SubmissionError::SignIn(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignUpError {
    #[error("invalid form: {0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

#[derive(Debug)]
struct PipelineState {
    phase: SubmissionPhase,
    loading: bool,
}

pub struct SignUpPipeline {
    transport: Arc<dyn Transport>,
    establisher: Arc<dyn SessionEstablisher>,
    notifier: Arc<dyn Notifier>,
    messages: FallbackMessages,
    pending: Option<SessionStore>,
    state: Mutex<PipelineState>,
}

impl SignUpPipeline {
    pub fn new(
        transport: Arc<dyn Transport>,
        establisher: Arc<dyn SessionEstablisher>,
        notifier: Arc<dyn Notifier>,
        messages: FallbackMessages,
    ) -> Self {
        Self {
            transport,
            establisher,
            notifier,
            messages,
            pending: None,
            state: Mutex::new(PipelineState {
                phase: SubmissionPhase::Idle,
                loading: false,
            }),
        }
    }

    /// Record a pending marker between account creation and sign-in
    pub fn with_pending_store(mut self, store: SessionStore) -> Self {
        self.pending = Some(store);
        self
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.state().phase
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    fn set_phase(&self, phase: SubmissionPhase) {
        self.state().phase = phase;
    }

    /// Mark the submission spinner active. Callers do this right before `submit`.
    pub fn begin_loading(&self) {
        self.state().loading = true;
    }

    /// Validate, raise the spinner, submit. Validation failures never reach
    /// the network and never raise the spinner.
    pub async fn handle_submit(&self, input: &FormInput) -> Result<(), SignUpError> {
        self.set_phase(SubmissionPhase::Validating);
        let validated = match validation::validate(input) {
            Ok(v) => v,
            Err(errors) => {
                tracing::debug!("Sign-up form rejected: {}", errors);
                self.set_phase(SubmissionPhase::Idle);
                return Err(SignUpError::Invalid(errors));
            }
        };

        self.begin_loading();
        self.submit(validated).await?;
        Ok(())
    }

    /// Create the account, then sign in with the same credentials.
    ///
    /// Every failure lowers the spinner and emits exactly one notification.
    pub async fn submit(&self, input: ValidatedInput) -> Result<(), SubmissionError> {
        let attempt = Uuid::new_v4();
        let span = tracing::info_span!("signup", %attempt, email = input.email());
        self.create_then_authenticate(input).instrument(span).await
    }

    async fn create_then_authenticate(&self, input: ValidatedInput) -> Result<(), SubmissionError> {
        self.set_phase(SubmissionPhase::Submitting);
        let account = NewAccount {
            name: input.name().to_string(),
            email: input.email().to_string(),
            password: input.password().to_string(),
        };
        let created = match serde_json::to_value(&account) {
            Ok(body) => self.transport.post(&Resource::Users, body).await.map(|_| ()),
            Err(e) => Err(RemoteError::transport(format!("failed to encode account: {}", e))),
        };
        if let Err(e) = created {
            return Err(self.fail(SubmissionError::CreateAccount(e)));
        }
        tracing::info!("Account created");

        if let Some(ref store) = self.pending {
            if let Err(e) = store.save_pending(&PendingSignup::new(input.name(), input.email())) {
                tracing::warn!("Could not record pending sign-up: {}", e);
            }
        }

        self.authenticate(input.email(), input.password()).await
    }

    /// Retry only the sign-in step of an earlier submission whose account was
    /// created but whose session was not.
    pub async fn resume_sign_in(&self, password: &str) -> Result<(), SubmissionError> {
        let pending = match self.pending.as_ref().map(|s| s.load_pending()) {
            Some(Ok(Some(p))) => p,
            Some(Err(e)) => {
                tracing::warn!("Could not read pending sign-up: {}", e);
                return Err(SubmissionError::NothingPending);
            }
            _ => return Err(SubmissionError::NothingPending),
        };

        tracing::info!(pending = %pending.id, "Resuming sign-in for {}", pending.email);
        self.begin_loading();
        self.authenticate(&pending.email, password).await
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<(), SubmissionError> {
        self.set_phase(SubmissionPhase::Authenticating);
        if let Err(e) = self.establisher.sign_in(email, password).await {
            return Err(self.fail(SubmissionError::SignIn(e)));
        }

        if let Some(ref store) = self.pending {
            if let Err(e) = store.clear_pending() {
                tracing::warn!("Could not clear pending sign-up: {}", e);
            }
        }

        let mut state = self.state();
        state.phase = SubmissionPhase::Idle;
        state.loading = false;
        tracing::info!("Signed in after sign-up");
        Ok(())
    }

    fn fail(&self, error: SubmissionError) -> SubmissionError {
        {
            let mut state = self.state();
            state.phase = SubmissionPhase::Idle;
            state.loading = false;
        }
        if error.account_created() {
            tracing::warn!("{} (account already exists server-side)", error);
        } else {
            tracing::warn!("{}", error);
        }
        self.notifier.show(
            self.messages
                .failure(Operation::CreateAccount, error.domain_message()),
        );
        error
    }
}

/// Sign-up screen driver: form contents, inline errors, submission.
///
/// Before the first submission fields are not validated while typing. After
/// it, every edit re-validates the whole form, so the confirmation message
/// follows changes to either password field.
pub struct SignUpScreen {
    pipeline: SignUpPipeline,
    navigator: Arc<dyn Navigator>,
    form: Mutex<FormState>,
}

#[derive(Debug, Default)]
struct FormState {
    input: FormInput,
    errors: FieldErrors,
    submitted: bool,
}

impl SignUpScreen {
    pub fn new(pipeline: SignUpPipeline, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            pipeline,
            navigator,
            form: Mutex::new(FormState::default()),
        }
    }

    fn form(&self) -> MutexGuard<'_, FormState> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        let mut form = self.form();
        form.input.set(field, value);
        if form.submitted {
            form.errors = match validation::validate(&form.input) {
                Ok(_) => FieldErrors::default(),
                Err(errors) => errors,
            };
        }
    }

    pub fn input(&self) -> FormInput {
        self.form().input.clone()
    }

    pub fn error(&self, field: Field) -> Option<String> {
        self.form().errors.get(field).map(str::to_string)
    }

    pub fn errors(&self) -> FieldErrors {
        self.form().errors.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.pipeline.is_loading()
    }

    pub async fn submit(&self) -> Result<(), SignUpError> {
        let input = {
            let mut form = self.form();
            form.submitted = true;
            form.input.clone()
        };

        let result = self.pipeline.handle_submit(&input).await;

        let mut form = self.form();
        match &result {
            Ok(()) => *form = FormState::default(),
            Err(SignUpError::Invalid(errors)) => form.errors = errors.clone(),
            Err(SignUpError::Submission(_)) => form.errors = FieldErrors::default(),
        }
        result
    }

    pub fn go_back(&self) {
        self.navigator.go_back();
    }
}
