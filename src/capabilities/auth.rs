use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum AuthOperation {
    SignIn { email: String, password: String },
    SignOut,
    /// Subscribe to principal-state changes. The provider persists sessions
    /// across reloads, so the first emission reports any restored session.
    WatchSession,
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("network error: {message}")]
    Network { message: String },

    #[error("unknown auth error: {message}")]
    Unknown { message: String },
}

impl AuthError {
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum AuthOutput {
    SignedIn { uid: String },
    SignedOut,
    /// Emitted by the session watch; `None` means no authenticated principal.
    Session { uid: Option<String> },
}

impl AuthOutput {
    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        match self {
            Self::SignedIn { uid } => Some(uid),
            Self::Session { uid } => uid.as_deref(),
            Self::SignedOut => None,
        }
    }
}

#[must_use = "auth operation results must be handled"]
pub type AuthResult = Result<AuthOutput, AuthError>;

impl Operation for AuthOperation {
    type Output = AuthResult;
}

#[derive(Clone)]
pub struct Auth<E> {
    context: CapabilityContext<AuthOperation, E>,
}

impl<Ev> Capability<Ev> for Auth<Ev> {
    type Operation = AuthOperation;
    type MappedSelf<MappedEv> = Auth<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Auth::new(self.context.map_event(f))
    }
}

impl<E> Auth<E>
where
    E: 'static,
{
    pub fn new(context: CapabilityContext<AuthOperation, E>) -> Self {
        Self { context }
    }

    pub fn sign_in<F>(&self, email: &str, password: &str, callback: F)
    where
        F: Fn(AuthResult) -> E + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        let operation = AuthOperation::SignIn {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.context.spawn(async move {
            let output = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(output));
        });
    }

    pub fn sign_out<F>(&self, callback: F)
    where
        F: Fn(AuthResult) -> E + Send + Sync + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let output = ctx.request_from_shell(AuthOperation::SignOut).await;
            ctx.update_app(callback(output));
        });
    }

    pub fn watch_session<F>(&self, callback: F)
    where
        F: Fn(AuthResult) -> E + Send + Sync + 'static,
    {
        use futures::StreamExt;
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let mut stream = ctx.stream_from_shell(AuthOperation::WatchSession);
            while let Some(output) = stream.next().await {
                ctx.update_app(callback(output));
            }
        });
    }
}
