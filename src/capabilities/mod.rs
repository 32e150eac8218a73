mod auth;
mod navigate;
mod prefs;
mod store;
mod telemetry;

pub use self::auth::{Auth, AuthError, AuthOperation, AuthOutput, AuthResult};
pub use self::navigate::{NavOperation, Navigator};
pub use self::prefs::{
    keys as pref_keys, Prefs, PrefsError, PrefsOperation, PrefsOutput, PrefsResult, PrefsSnapshot,
};
pub use self::store::{
    Document, DocumentFilter, FieldValue, Fields, Store, StoreError, StoreOperation, StoreOutput,
    StoreResult, WatchToken, ADMINS_COLLECTION, CATEGORIES_COLLECTION, REQUESTS_COLLECTION,
    USERS_COLLECTION,
};
pub use self::telemetry::{Telemetry, TelemetryOperation};

// We use Crux's built-in Render capability directly because it provides
// all necessary functionality for triggering view updates.
pub use crux_core::render::Render;

use crate::Event;

pub type AppRender = Render<Event>;
pub type AppPrefs = Prefs<Event>;
pub type AppStore = Store<Event>;
pub type AppAuth = Auth<Event>;
pub type AppNav = Navigator<Event>;
pub type AppTelemetry = Telemetry<Event>;

#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("preference error: {0}")]
    Prefs(#[from] PrefsError),
}

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub prefs: Prefs<Event>,
    pub store: Store<Event>,
    pub auth: Auth<Event>,
    pub nav: Navigator<Event>,
    pub telemetry: Telemetry<Event>,
}
