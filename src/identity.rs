//! Who is using this session: one of a fixed set of identities, resolved from
//! the stored preference, a login, or a prompt.

use futures::future::LocalBoxFuture;

use crate::error::AuthError;
use crate::storage::{KEY_AUTHENTICATED, KEY_USER_IDENTITY, SharedStore};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Identity {
    Girlfriend,
    Boyfriend,
    /// Anonymous; never needs a secret.
    Other,
}

impl Identity {
    /// Every identity in leaderboard order.
    pub const ALL: [Identity; 3] = [Identity::Girlfriend, Identity::Boyfriend, Identity::Other];

    /// Display label, also the stored `userIdentity` value.
    pub fn label(self) -> &'static str {
        match self {
            Identity::Girlfriend => "Girlfriend Julia",
            Identity::Boyfriend => "Boyfriend Manny",
            Identity::Other => "Other",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.label() == label)
    }

    /// `data-identity` attribute on the login buttons.
    pub fn from_button_tag(tag: &str) -> Option<Self> {
        match tag {
            "julia" => Some(Identity::Girlfriend),
            "manny" => Some(Identity::Boyfriend),
            "other" => Some(Identity::Other),
            _ => None,
        }
    }

    /// Answer to the "1, 2 or 3" prompt. Anything unrecognised is Other.
    pub fn from_choice(choice: Option<&str>) -> Self {
        match choice {
            Some("1") => Identity::Girlfriend,
            Some("2") => Identity::Boyfriend,
            _ => Identity::Other,
        }
    }

    pub fn needs_secret(self) -> bool {
        !matches!(self, Identity::Other)
    }

    /// Key of this identity in the remote table.
    pub fn remote_key(self) -> String {
        sanitize_key(self.label())
    }

    pub fn from_remote_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.remote_key() == key)
    }
}

/// Restrict a string to `[A-Za-z0-9_-]` so it can be used as a path segment.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

pub const PROMPT_TEXT: &str =
    "Who are you? 💕\n\n1️⃣ Girlfriend Julia\n2️⃣ Boyfriend Manny\n3️⃣ Other >:(\n\nEnter 1, 2, or 3:";

/// Interactive fallback used when no identity has been stored yet.
pub trait IdentityPrompt {
    fn ask(&self) -> Option<String>;
}

/// `window.prompt` based chooser.
pub struct BrowserPrompt;

impl IdentityPrompt for BrowserPrompt {
    fn ask(&self) -> Option<String> {
        web_sys::window()?.prompt_with_message(PROMPT_TEXT).ok().flatten()
    }
}

/// Result of a successful credential check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    /// Opaque marker handed back by the credential service.
    pub marker: String,
}

/// Credential collaborator.
pub trait Authenticator {
    fn sign_in(
        &self,
        identity: Identity,
        secret: Option<String>,
    ) -> LocalBoxFuture<'static, Result<Session, AuthError>>;
}

/// Check the secret requirement locally, then ask `auth`. Other never sends a
/// secret; the rest need a non-empty one.
pub async fn sign_in(
    auth: &dyn Authenticator,
    identity: Identity,
    secret: Option<&str>,
) -> Result<Session, AuthError> {
    let secret = if identity.needs_secret() {
        match secret.filter(|s| !s.is_empty()) {
            Some(s) => Some(s.to_string()),
            None => return Err(AuthError::MissingSecret),
        }
    } else {
        None
    };
    let result = auth.sign_in(identity, secret).await;
    match &result {
        Ok(_) => log::info!("login successful: {}", identity.label()),
        Err(err) => log::warn!("login failed for {}: {err}", identity.label()),
    }
    result
}

pub struct IdentityResolver {
    local: SharedStore,
    session: SharedStore,
    cached: Option<Identity>,
}

impl IdentityResolver {
    pub fn new(local: SharedStore, session: SharedStore) -> Self {
        Self { local, session, cached: None }
    }

    /// Identity without prompting: memoized value, else the stored one.
    pub fn known(&mut self) -> Option<Identity> {
        if self.cached.is_none() {
            self.cached = self
                .local
                .get(KEY_USER_IDENTITY)
                .and_then(|label| Identity::from_label(&label));
        }
        self.cached
    }

    /// Known identity, or ask `prompt` and remember the answer.
    pub fn resolve(&mut self, prompt: &dyn IdentityPrompt) -> Identity {
        if let Some(id) = self.known() {
            return id;
        }
        let id = Identity::from_choice(prompt.ask().as_deref());
        self.remember(id);
        id
    }

    pub fn remember(&mut self, identity: Identity) {
        self.cached = Some(identity);
        if let Err(err) = self.local.set(KEY_USER_IDENTITY, identity.label()) {
            log::error!("could not store identity: {err}");
        }
    }

    /// Record a completed login for this identity and browser session.
    pub fn complete_login(&mut self, session: &Session) {
        self.remember(session.identity);
        if let Err(err) = self.session.set(KEY_AUTHENTICATED, "true") {
            log::warn!("could not mark session authenticated: {err}");
        }
    }

    pub fn session_authenticated(&self) -> bool {
        self.session.get(KEY_AUTHENTICATED).as_deref() == Some("true")
    }
}
