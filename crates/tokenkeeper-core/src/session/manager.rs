//! The session state machine.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::claims::{ClaimsDecoder, DecodedClaims};
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, ServerError};
use crate::traits::{AuthBackend, CredentialStore};
use crate::{AccessCredential, Credentials, RefreshCredential, Result};

use super::schedule::{ScheduledRenewal, renewal_deadline};
use super::state::{CurrentUser, SessionState, SessionStatus, project};

/// Default margin between a scheduled renewal and the credential's expiry.
pub const DEFAULT_RENEW_SKEW: Duration = Duration::from_secs(60);

const REGISTRATION_DISABLED: &str = "Registration is disabled for guest users";
const REGISTER_FAILED: &str = "Register account failed, try again";
const CHANGE_PASSWORD_FAILED: &str = "Change password failed, try again";

/// Owns the token lifecycle for one process.
///
/// The manager loads the persisted refresh credential, exchanges it for an
/// access credential, decodes the identity it carries, and keeps it fresh by
/// renewing [`DEFAULT_RENEW_SKEW`] before expiry. Consumers observe the
/// current [`SessionState`] through [`SessionManager::subscribe`] and issue
/// the explicit commands (login, logout, register, change password).
///
/// Managers are cheap to clone; clones share the same session. Construct one
/// per process with [`SessionManager::builder`] and hand clones to whatever
/// needs the session.
///
/// # Failure policy
///
/// Failures during background renewal never reach the caller as errors:
/// they are logged and absorbed into [`SessionState::Error`] (or
/// [`SessionState::Anonymous`] when the refresh credential was rejected).
/// Explicit commands return their errors and leave the state untouched.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tokenkeeper_core::{AuthBackend, MemoryStore, SessionManager};
///
/// # async fn example(backend: Arc<dyn AuthBackend>) {
/// let session = SessionManager::builder(Arc::new(MemoryStore::new()), backend).build();
/// let state = session.start().await;
/// println!("session is {}", state.status());
/// # }
/// ```
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    decoder: ClaimsDecoder,
    clock: Arc<dyn Clock>,
    renew_skew: Duration,
    machine: Mutex<Machine>,
    state: watch::Sender<SessionState>,
}

/// Bookkeeping guarded by one lock so transitions never interleave.
#[derive(Debug, Default)]
struct Machine {
    /// Bumped whenever the held access credential is replaced or dropped.
    epoch: u64,
    /// A renewal exchange is awaiting the backend.
    renewing: bool,
    renewal: Option<ScheduledRenewal>,
}

impl Drop for Machine {
    fn drop(&mut self) {
        if let Some(renewal) = self.renewal.take() {
            renewal.cancel();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Trigger {
    Startup,
    Manual,
    Scheduled { epoch: u64 },
}

enum RenewalOutcome {
    Renewed(AccessCredential, DecodedClaims),
    Evict,
    Failed(Error),
}

/// Clears the in-flight flag if a renewal is abandoned mid-exchange, and
/// republishes the state `Pending` replaced unless a login or logout has
/// published its own since.
struct InFlight<'a> {
    inner: &'a SessionInner,
    epoch: u64,
    previous: Option<SessionState>,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.previous = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        warn!("Renewal abandoned before the exchange completed");
        let mut machine = lock(&self.inner.machine);
        machine.renewing = false;
        if machine.epoch == self.epoch {
            info!(status = %previous.status(), "Session state restored");
            self.inner.state.send_replace(previous);
        }
    }
}

fn lock(machine: &Mutex<Machine>) -> MutexGuard<'_, Machine> {
    machine
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder {
    store: Arc<dyn CredentialStore>,
    backend: Arc<dyn AuthBackend>,
    decoder: ClaimsDecoder,
    clock: Arc<dyn Clock>,
    renew_skew: Duration,
}

impl SessionManagerBuilder {
    /// Margin subtracted from the access credential's expiry to get the
    /// renewal time. Defaults to [`DEFAULT_RENEW_SKEW`].
    pub fn renew_skew(mut self, renew_skew: Duration) -> Self {
        self.renew_skew = renew_skew;
        self
    }

    /// Decoder used for access and refresh credentials.
    pub fn decoder(mut self, decoder: ClaimsDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Clock used for expiry comparisons. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build the manager in the `Uninitialized` state.
    pub fn build(self) -> SessionManager {
        let (state, _) = watch::channel(SessionState::Uninitialized);
        SessionManager {
            inner: Arc::new(SessionInner {
                store: self.store,
                backend: self.backend,
                decoder: self.decoder,
                clock: self.clock,
                renew_skew: self.renew_skew,
                machine: Mutex::new(Machine::default()),
                state,
            }),
        }
    }
}

impl SessionManager {
    /// Start building a manager over `store` and `backend`.
    pub fn builder(
        store: Arc<dyn CredentialStore>,
        backend: Arc<dyn AuthBackend>,
    ) -> SessionManagerBuilder {
        SessionManagerBuilder {
            store,
            backend,
            decoder: ClaimsDecoder::default(),
            clock: Arc::new(SystemClock),
            renew_skew: DEFAULT_RENEW_SKEW,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Returns the current user, if authenticated.
    pub fn current_user(&self) -> Option<CurrentUser> {
        project(&self.inner.state.borrow())
    }

    /// Returns the access credential held by an authenticated session.
    pub fn access_credential(&self) -> Option<AccessCredential> {
        match &*self.inner.state.borrow() {
            SessionState::Authenticated {
                access_credential, ..
            } => Some(access_credential.clone()),
            _ => None,
        }
    }

    /// Returns when the next scheduled renewal will fire.
    pub fn next_renewal_at(&self) -> Option<DateTime<Utc>> {
        self.machine().renewal.as_ref().map(ScheduledRenewal::renew_at)
    }

    /// Initialize from the persisted refresh credential.
    ///
    /// Without a stored refresh credential the session goes straight to
    /// `Anonymous`; otherwise a renewal is attempted. Calling `start` on a
    /// session that already left `Uninitialized` returns the current state.
    #[instrument(skip(self))]
    pub async fn start(&self) -> SessionState {
        if self.state().status() != SessionStatus::Uninitialized {
            debug!("Session already started");
            return self.state();
        }
        self.renew(Trigger::Startup).await
    }

    /// Renew the access credential now.
    ///
    /// A no-op returning `Pending` if a renewal is already in flight.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> SessionState {
        self.renew(Trigger::Manual).await
    }

    /// Log in with email and password.
    ///
    /// On success both credentials come straight from the login response and
    /// the session becomes `Authenticated`. On failure the error is returned
    /// and the session state is left as it was.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<CurrentUser> {
        info!("Logging in");

        let output = self.inner.backend.login(credentials).await?;
        let claims = self.inner.decoder.decode(&output.access_credential)?;
        let user = CurrentUser::new(&output.access_credential, &claims);

        let mut machine = self.machine();
        self.inner
            .store
            .write_refresh_credential(Some(&output.refresh_credential));
        let state = self.install(&mut machine, output.access_credential, claims);
        self.publish(state);

        debug!(user_id = %user.user_id, "Login succeeded");
        Ok(user)
    }

    /// Register a new account. Does not log in or change the session state.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        info!("Registering account");

        match self.inner.backend.register(credentials).await {
            Ok(0) => Err(ServerError::message(REGISTER_FAILED).into()),
            Ok(_) => Ok(()),
            Err(Error::Server(err)) if err.message == "Forbidden" => {
                Err(ServerError::new(REGISTRATION_DISABLED, err.code).into())
            }
            Err(err) => Err(err),
        }
    }

    /// Register a new account, then log in with the same credentials.
    pub async fn register_and_login(&self, credentials: &Credentials) -> Result<CurrentUser> {
        self.register(credentials).await?;
        self.login(credentials).await
    }

    /// Evict both credentials and become `Anonymous`. Idempotent.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        info!("Logging out");

        let mut machine = self.machine();
        self.inner.store.write_refresh_credential(None);
        self.drop_access(&mut machine);
        self.publish(SessionState::Anonymous);
    }

    /// Change the password of the logged-in user.
    ///
    /// Requires an authenticated session; never changes the session state.
    #[instrument(skip(self, new_password))]
    pub async fn change_password(&self, new_password: &str) -> Result<()> {
        let (access_credential, user_id) = match &*self.inner.state.borrow() {
            SessionState::Authenticated {
                access_credential,
                claims,
            } => (access_credential.clone(), claims.user_id.clone()),
            _ => return Err(Error::NotAuthenticated),
        };

        info!(%user_id, "Changing password");

        match self
            .inner
            .backend
            .change_password(&access_credential, &user_id, new_password)
            .await
        {
            Ok(0) => Err(ServerError::message(CHANGE_PASSWORD_FAILED).into()),
            Ok(_) => Ok(()),
            Err(Error::Server(err)) if err.message.is_empty() => {
                Err(ServerError::new(CHANGE_PASSWORD_FAILED, err.code).into())
            }
            Err(err) => Err(err),
        }
    }

    async fn renew(&self, trigger: Trigger) -> SessionState {
        let (refresh_credential, epoch, previous) = {
            let mut machine = self.machine();

            if let Trigger::Scheduled { epoch } = trigger {
                if machine.epoch != epoch {
                    debug!(epoch, current = machine.epoch, "Ignoring superseded renewal");
                    return self.state();
                }
                // This task is the timer; release the slot without aborting ourselves.
                if machine.renewal.as_ref().is_some_and(|r| r.epoch() == epoch) {
                    machine.renewal.take();
                }
            }

            if machine.renewing {
                debug!(?trigger, "Renewal already in flight");
                return self.state();
            }

            let Some(refresh_credential) = self.inner.store.read_refresh_credential() else {
                debug!(?trigger, "No refresh credential stored");
                self.drop_access(&mut machine);
                self.publish(SessionState::Anonymous);
                return SessionState::Anonymous;
            };

            let previous = self.state();
            machine.renewing = true;
            self.publish(SessionState::Pending);
            (refresh_credential, machine.epoch, previous)
        };

        let mut in_flight = InFlight {
            inner: &self.inner,
            epoch,
            previous: Some(previous),
        };

        let now = self.inner.clock.now();
        let outcome = match self.inner.decoder.expiry(refresh_credential.as_str()) {
            Ok(expires_at) if expires_at < now.timestamp() => {
                info!("Refresh credential expired");
                RenewalOutcome::Evict
            }
            Err(err) => {
                warn!(error = %err, "Stored refresh credential is undecodable");
                RenewalOutcome::Evict
            }
            Ok(_) => {
                info!(?trigger, "Renewing access credential");
                self.exchange(&refresh_credential).await
            }
        };

        in_flight.disarm();
        self.finish(epoch, outcome)
    }

    async fn exchange(&self, refresh_credential: &RefreshCredential) -> RenewalOutcome {
        match self.inner.backend.refresh(refresh_credential).await {
            Ok(access_credential) => match self.inner.decoder.decode(&access_credential) {
                Ok(claims) => RenewalOutcome::Renewed(access_credential, claims),
                Err(err) => {
                    warn!(error = %err, "Server issued an undecodable access credential");
                    RenewalOutcome::Failed(err.into())
                }
            },
            Err(Error::InvalidCredential) => {
                info!("Refresh credential rejected by server");
                RenewalOutcome::Evict
            }
            Err(err) => {
                warn!(error = %err, "Session renewal failed");
                RenewalOutcome::Failed(err)
            }
        }
    }

    fn finish(&self, epoch: u64, outcome: RenewalOutcome) -> SessionState {
        let mut machine = self.machine();
        machine.renewing = false;

        if machine.epoch != epoch {
            debug!("Discarding renewal result superseded by login or logout");
            return self.state();
        }

        let state = match outcome {
            RenewalOutcome::Renewed(access_credential, claims) => {
                self.install(&mut machine, access_credential, claims)
            }
            RenewalOutcome::Evict => {
                self.inner.store.write_refresh_credential(None);
                self.drop_access(&mut machine);
                SessionState::Anonymous
            }
            RenewalOutcome::Failed(cause) => {
                self.drop_access(&mut machine);
                SessionState::Error { cause }
            }
        };

        self.publish(state.clone());
        state
    }

    /// Hold a new access credential and schedule its renewal.
    fn install(
        &self,
        machine: &mut Machine,
        access_credential: AccessCredential,
        claims: DecodedClaims,
    ) -> SessionState {
        self.supersede(machine);
        self.inner
            .store
            .write_access_credential(Some(&access_credential));
        self.schedule_renewal(machine, &claims);

        SessionState::Authenticated {
            access_credential,
            claims,
        }
    }

    /// Forget the access credential and its pending renewal.
    fn drop_access(&self, machine: &mut Machine) {
        self.supersede(machine);
        self.inner.store.write_access_credential(None);
    }

    fn supersede(&self, machine: &mut Machine) {
        machine.epoch += 1;
        if let Some(renewal) = machine.renewal.take() {
            debug!(epoch = renewal.epoch(), "Cancelling superseded renewal");
            renewal.cancel();
        }
    }

    fn schedule_renewal(&self, machine: &mut Machine, claims: &DecodedClaims) {
        let now = self.inner.clock.now();
        let (renew_at, delay) = renewal_deadline(claims.expires_at, self.inner.renew_skew, now);
        let epoch = machine.epoch;

        if delay.is_zero() {
            warn!(%renew_at, "Access credential is already inside the renewal window");
        } else {
            debug!(%renew_at, delay_secs = delay.as_secs(), "Scheduling renewal");
        }

        let task = scheduled_renewal(Arc::downgrade(&self.inner), epoch);
        machine.renewal = Some(ScheduledRenewal::spawn(epoch, renew_at, delay, task));
    }

    fn publish(&self, state: SessionState) {
        info!(status = %state.status(), "Session state changed");
        self.inner.state.send_replace(state);
    }

    fn machine(&self) -> MutexGuard<'_, Machine> {
        lock(&self.inner.machine)
    }
}

/// The timer body. Holds the session weakly so an idle timer never keeps
/// a dropped session alive.
fn scheduled_renewal(session: Weak<SessionInner>, epoch: u64) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        if let Some(inner) = session.upgrade() {
            SessionManager { inner }
                .renew(Trigger::Scheduled { epoch })
                .await;
        }
    })
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("status", &self.inner.state.borrow().status())
            .field("renew_skew", &self.inner.renew_skew)
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
