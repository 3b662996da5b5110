//! Process-wide session state shared by the gateway, the store and the views.
//!
//! The context owns the current credential and tells subscribers when it goes
//! away. It is injected explicitly (`Arc<SessionContext>`) rather than read
//! from a global.

use std::fmt;
use std::sync::{
    Mutex,
    atomic::{AtomicU64, Ordering},
    mpsc::{Receiver, Sender, channel},
};

use tracing::{debug, info, warn};

/// Opaque authentication token for the current session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token, returning `None` when it is blank.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

/// Session transitions broadcast to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// A credential was stored.
    SignedIn,
    /// The credential was cleared on request (logout).
    SignedOut,
    /// The server rejected the credential; the user must sign in again.
    Expired,
}

#[derive(Default)]
pub struct SessionContext {
    credential: Mutex<Option<Credential>>,
    generation: AtomicU64,
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a context that already holds `credential`.
    pub fn with_credential(credential: Credential) -> Self {
        let context = Self::new();
        *context.lock_credential() = Some(credential);
        context
    }

    pub fn credential(&self) -> Option<Credential> {
        self.lock_credential().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock_credential().is_some()
    }

    /// Counter bumped on every credential change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn set(&self, credential: Credential) {
        *self.lock_credential() = Some(credential);
        self.generation.fetch_add(1, Ordering::SeqCst);
        info!("Session credential set");
        self.emit(SessionEvent::SignedIn);
    }

    /// Forget the credential (explicit logout).
    pub fn clear(&self) {
        if self.take_credential() {
            info!("Session credential cleared");
            self.emit(SessionEvent::SignedOut);
        }
    }

    /// Forget the credential because the server rejected it.
    ///
    /// Only the first rejection of a credential is broadcast.
    pub fn expire(&self) {
        if self.take_credential() {
            warn!("Session expired; credential cleared");
            self.emit(SessionEvent::Expired);
        } else {
            debug!("Session already cleared; ignoring repeated expiry");
        }
    }

    /// Expire only if `sent` is still the stored credential.
    ///
    /// A rejection of a request made under an earlier credential must not end
    /// a session that was started afterwards. Returns whether it expired.
    pub fn expire_if_current(&self, sent: &Credential) -> bool {
        let expired = {
            let mut current = self.lock_credential();
            if current.as_ref() == Some(sent) {
                *current = None;
                self.generation.fetch_add(1, Ordering::SeqCst);
                true
            } else {
                false
            }
        };
        if expired {
            warn!("Session expired; credential cleared");
            self.emit(SessionEvent::Expired);
        } else {
            debug!("Ignoring rejection of a credential that is no longer current");
        }
        expired
    }

    /// Receive every subsequent session event.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.lock_subscribers().push(tx);
        rx
    }

    fn take_credential(&self) -> bool {
        let previous = self.lock_credential().take();
        if previous.is_none() {
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }

    fn emit(&self, event: SessionEvent) {
        self.lock_subscribers()
            .retain(|subscriber| subscriber.send(event).is_ok());
    }

    fn lock_credential(&self) -> std::sync::MutexGuard<'_, Option<Credential>> {
        self.credential
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<Sender<SessionEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|err| err.into_inner())
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .field("generation", &self.generation())
            .finish()
    }
}
