#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]

pub mod capabilities;
pub mod routing;
pub mod wizard;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use capabilities::{
    pref_keys, AuthError, AuthOutput, AuthResult, Document, DocumentFilter, Fields, PrefsError,
    PrefsOutput, PrefsResult, PrefsSnapshot, StoreError, StoreOutput, StoreResult, WatchToken,
    ADMINS_COLLECTION, CATEGORIES_COLLECTION, REQUESTS_COLLECTION, USERS_COLLECTION,
};
use routing::{
    dashboard_url, onboarding_page_from_fragment, onboarding_url, NavTarget, Resolution, RouteUrl,
    Screen, ONBOARDING_PAGE_COUNT, PATH_ADMIN, PATH_ROOT,
};
use wizard::{next_field, WizardField, WizardState, WizardStep, WIZARD_STEP_COUNT};

pub use app::App;
pub use capabilities::{Capabilities, Effect};
pub use crux_core::{render::Render, App as CruxApp};
pub use routing::Screen as AppScreen;

/// Delay before a freshly shown step's first input receives focus, so the
/// shell has mounted the fields.
pub const FOCUS_DELAY_MS: u64 = 100;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Document field names as stored by the backend.
pub mod fields {
    pub const USER_ID: &str = "userId";
    pub const FIRST_NAME: &str = "firstName";
    pub const MIDDLE_NAME: &str = "middleName";
    pub const LAST_NAME: &str = "lastName";
    pub const GENDER: &str = "gender";
    pub const LOCATION: &str = "location";
    pub const CATEGORY: &str = "category";
    pub const PROBLEM_DESCRIPTION: &str = "problemDescription";
    pub const STATUS: &str = "status";
    pub const SUBMITTED_AT: &str = "submittedAt";
    pub const LAST_UPDATED_AT: &str = "lastUpdatedAt";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
    pub const MOBILE_NUMBER: &str = "mobileNumber";
}

/// User-visible notice texts (English fallback; shells translate by key).
pub mod messages {
    pub const FILL_REQUIRED_FIELDS: &str = "Please fill all required fields";
    pub const FILL_ALL_FIELDS: &str = "Please fill all fields";
    pub const SUBMITTED: &str = "Request submitted successfully";
    pub const SUBMIT_FAILED: &str = "Failed to submit request";
    pub const EXISTING_REQUEST_FOUND: &str = "You already submitted a request";
    pub const CHECK_MOBILE_FAILED: &str = "Failed to check mobile number";
    pub const CATEGORIES_LOAD_FAILED: &str = "Failed to load categories";
    pub const NO_CONNECTIVITY: &str = "No internet connection";
    pub const BACK_ONLINE: &str = "Back online";
    pub const CONNECTION_LOST: &str = "Connection lost";
    pub const REQUEST_DELETED: &str = "Request deleted";
    pub const DELETE_FAILED: &str = "Failed to delete request";
    pub const STATUS_UPDATED: &str = "Request status updated";
    pub const STATUS_UPDATE_FAILED: &str = "Failed to update status";
    pub const CATEGORY_NAME_REQUIRED: &str = "Category name is required";
    pub const CATEGORY_ADDED: &str = "Category added successfully";
    pub const CATEGORY_UPDATED: &str = "Category updated successfully";
    pub const CATEGORY_DELETED: &str = "Category deleted";
    pub const CATEGORY_ADD_FAILED: &str = "Failed to add category";
    pub const CATEGORY_UPDATE_FAILED: &str = "Failed to update category";
    pub const CATEGORY_DELETE_FAILED: &str = "Failed to delete category";
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
    pub const NOT_AUTHORIZED: &str = "You are not authorized to access the admin area";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Transient,
    Permanent,
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    Offline,
    Authentication,
    Authorization,
    Validation,
    NotFound,
    Storage,
    Serialization,
    InvalidState,
    Internal,
    Unknown,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::Offline => "OFFLINE",
            Self::Authentication => "AUTH_ERROR",
            Self::Authorization => "FORBIDDEN",
            Self::Validation => "VALIDATION_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::Internal => "INTERNAL_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> ErrorSeverity {
        match self {
            Self::Network | Self::Timeout | Self::Offline | Self::Storage => {
                ErrorSeverity::Transient
            }
            Self::Serialization | Self::InvalidState | Self::Internal => ErrorSeverity::Fatal,
            Self::Authentication
            | Self::Authorization
            | Self::Validation
            | Self::NotFound
            | Self::Unknown => ErrorSeverity::Permanent,
        }
    }

    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Storage)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppError {
    pub kind: ErrorKind,
    pub severity: ErrorSeverity,
    pub message: String,
    pub internal_message: Option<String>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            internal_message: None,
        }
    }

    #[must_use]
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal_message = Some(internal.into());
        self
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable() && !matches!(self.severity, ErrorSeverity::Fatal)
    }

    #[must_use]
    pub fn user_facing_message(&self) -> String {
        match self.kind {
            ErrorKind::Network => {
                "Unable to connect. Please check your internet connection and try again.".into()
            }
            ErrorKind::Timeout => "The request timed out. Please try again.".into(),
            ErrorKind::Offline => messages::NO_CONNECTIVITY.into(),
            ErrorKind::Authentication => messages::INVALID_CREDENTIALS.into(),
            ErrorKind::Authorization => messages::NOT_AUTHORIZED.into(),
            ErrorKind::Validation => self.message.clone(),
            ErrorKind::NotFound => "The requested item could not be found.".into(),
            ErrorKind::Storage => "Unable to save your preferences on this device.".into(),
            ErrorKind::Serialization => {
                "A data error occurred. Please contact support if this persists.".into()
            }
            ErrorKind::InvalidState => "The app is in an invalid state. Please reload.".into(),
            ErrorKind::Internal | ErrorKind::Unknown => {
                "An unexpected error occurred. Please try again.".into()
            }
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code(), self.message)?;
        if let Some(internal) = &self.internal_message {
            write!(f, " (internal: {internal})")?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        let kind = match &e {
            StoreError::Network { .. } => ErrorKind::Network,
            StoreError::Timeout => ErrorKind::Timeout,
            StoreError::PermissionDenied => ErrorKind::Authorization,
            StoreError::Malformed { .. } => ErrorKind::Serialization,
            StoreError::Unknown { .. } => ErrorKind::Unknown,
        };
        Self::new(kind, e.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        let kind = match &e {
            AuthError::InvalidCredentials => ErrorKind::Authentication,
            AuthError::Network { .. } => ErrorKind::Network,
            AuthError::Unknown { .. } => ErrorKind::Unknown,
        };
        Self::new(kind, e.to_string())
    }
}

impl From<PrefsError> for AppError {
    fn from(e: PrefsError) -> Self {
        let kind = match &e {
            PrefsError::InvalidKey { .. } => ErrorKind::InvalidState,
            PrefsError::Storage { .. } => ErrorKind::Storage,
        };
        Self::new(kind, e.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[must_use]
pub fn get_current_time_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnixTimeMs(pub u64);

impl UnixTimeMs {
    #[must_use]
    pub fn now() -> Self {
        Self(get_current_time_ms())
    }

    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub String);

impl CategoryId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewType {
    #[default]
    User,
    Admin,
}

impl ViewType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Request lifecycle status. The intended flow runs Pending → InProgress →
/// Resolved, but administrators may set any value directly; no transition
/// graph is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RequestStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
}

impl RequestStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Resolved];

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace([' ', '-'], "_").as_str() {
            "pending" | "open" => Some(Self::Pending),
            "in_progress" | "inprogress" => Some(Self::InProgress),
            "resolved" | "completed" | "done" | "closed" => Some(Self::Resolved),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "InProgress",
            Self::Resolved => "Resolved",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
        }
    }

    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DashboardTab {
    #[default]
    Requests,
    New,
    Settings,
}

impl DashboardTab {
    #[must_use]
    pub const fn as_fragment(self) -> &'static str {
        match self {
            Self::Requests => "requests",
            Self::New => "new",
            Self::Settings => "settings",
        }
    }

    /// Unknown fragments default to the requests tab.
    #[must_use]
    pub fn from_fragment(fragment: Option<&str>) -> Self {
        match fragment {
            Some("new") => Self::New,
            Some("settings") => Self::Settings,
            _ => Self::Requests,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdminTab {
    #[default]
    Requests,
    Categories,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language {
        code: "en",
        name: "English",
        native_name: "English",
    },
    Language {
        code: "hi",
        name: "Hindi",
        native_name: "हिंदी",
    },
    Language {
        code: "mr",
        name: "Marathi",
        native_name: "मराठी",
    },
];

#[must_use]
pub fn language_by_code(code: &str) -> Option<&'static Language> {
    SUPPORTED_LANGUAGES.iter().find(|l| l.code == code)
}

/// Process-wide configuration flags, read from the preference store at
/// startup and written through on user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceFlags {
    pub language: String,
    pub language_selected: bool,
    pub theme: ThemeMode,
    pub theme_selected: bool,
    pub view_type: ViewType,
    pub onboarding_completed: bool,
    pub current_user: Option<String>,
    pub admin_verified_cache: bool,
}

impl Default for PreferenceFlags {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            language_selected: false,
            theme: ThemeMode::Light,
            theme_selected: false,
            view_type: ViewType::User,
            onboarding_completed: false,
            current_user: None,
            admin_verified_cache: false,
        }
    }
}

impl PreferenceFlags {
    #[must_use]
    pub fn from_snapshot(snapshot: &PrefsSnapshot) -> Self {
        Self {
            language: snapshot
                .get(pref_keys::LANGUAGE)
                .filter(|code| language_by_code(code).is_some())
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
            language_selected: snapshot.flag(pref_keys::LANGUAGE_SELECTED),
            theme: snapshot
                .get(pref_keys::THEME)
                .and_then(ThemeMode::parse)
                .unwrap_or_default(),
            theme_selected: snapshot.flag(pref_keys::THEME_SELECTED),
            view_type: snapshot
                .get(pref_keys::VIEW_TYPE)
                .and_then(ViewType::parse)
                .unwrap_or_default(),
            onboarding_completed: snapshot.flag(pref_keys::ONBOARDING_COMPLETED),
            current_user: snapshot
                .get(pref_keys::CURRENT_USER)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            admin_verified_cache: snapshot.flag(pref_keys::ADMIN_VERIFIED),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalKind {
    Anonymous,
    EndUser,
    Admin,
}

/// The currently active principal, derived from the auth provider and the
/// privileged-principal registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    pub credential_uid: Option<String>,
    pub admin_verified: bool,
    pub end_user: Option<String>,
}

impl SessionIdentity {
    #[must_use]
    pub fn principal_kind(&self) -> PrincipalKind {
        if self.admin_verified {
            PrincipalKind::Admin
        } else if self.end_user.is_some() {
            PrincipalKind::EndUser
        } else {
            PrincipalKind::Anonymous
        }
    }

    #[must_use]
    pub const fn credential_present(&self) -> bool {
        self.credential_uid.is_some()
    }
}

/// One submitted help request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub user_id: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: String,
    pub location: String,
    pub category: String,
    pub problem_description: String,
    pub status: RequestStatus,
    pub submitted_at: UnixTimeMs,
    pub last_updated_at: Option<UnixTimeMs>,
}

impl RequestRecord {
    /// Convert a raw store document. Returns `None` when the document lacks
    /// the fields a request cannot exist without.
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let user_id = doc.str_field(fields::USER_ID)?.to_string();
        let status = doc
            .str_field(fields::STATUS)
            .and_then(RequestStatus::parse)
            .unwrap_or_default();
        let submitted_at = UnixTimeMs(u64::try_from(doc.int_field(fields::SUBMITTED_AT)?).ok()?);

        Some(Self {
            id: RequestId::new(&doc.id),
            user_id,
            first_name: doc.str_field_or_empty(fields::FIRST_NAME),
            middle_name: doc.str_field_or_empty(fields::MIDDLE_NAME),
            last_name: doc.str_field_or_empty(fields::LAST_NAME),
            gender: doc.str_field_or_empty(fields::GENDER),
            location: doc.str_field_or_empty(fields::LOCATION),
            category: doc.str_field_or_empty(fields::CATEGORY),
            problem_description: doc.str_field_or_empty(fields::PROBLEM_DESCRIPTION),
            status,
            submitted_at,
            last_updated_at: doc
                .int_field(fields::LAST_UPDATED_AT)
                .and_then(|n| u64::try_from(n).ok())
                .map(UnixTimeMs),
        })
    }

    #[must_use]
    pub fn is_owned_by(&self, user: &str) -> bool {
        self.user_id == user
    }
}

/// Newest first; ties keep their relative order.
pub fn sort_newest_first(records: &mut [RequestRecord]) {
    records.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub created_at: Option<UnixTimeMs>,
    pub updated_at: Option<UnixTimeMs>,
}

impl CategoryRecord {
    #[must_use]
    pub fn from_document(doc: &Document) -> Option<Self> {
        let name = doc.str_field(fields::NAME)?.to_string();
        Some(Self {
            id: CategoryId::new(&doc.id),
            name,
            description: doc.str_field_or_empty(fields::DESCRIPTION),
            created_at: doc
                .int_field(fields::CREATED_AT)
                .and_then(|n| u64::try_from(n).ok())
                .map(UnixTimeMs),
            updated_at: doc
                .int_field(fields::UPDATED_AT)
                .and_then(|n| u64::try_from(n).ok())
                .map(UnixTimeMs),
        })
    }
}

/// Profile pre-fill cache entry, keyed by mobile number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub mobile_number: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: String,
    pub location: String,
}

impl UserProfile {
    #[must_use]
    pub fn from_document(doc: &Document) -> Self {
        Self {
            mobile_number: doc
                .str_field(fields::MOBILE_NUMBER)
                .unwrap_or(&doc.id)
                .to_string(),
            first_name: doc.str_field_or_empty(fields::FIRST_NAME),
            middle_name: doc.str_field_or_empty(fields::MIDDLE_NAME),
            last_name: doc.str_field_or_empty(fields::LAST_NAME),
            gender: doc.str_field_or_empty(fields::GENDER),
            location: doc.str_field_or_empty(fields::LOCATION),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for part in [&self.first_name, &self.middle_name, &self.last_name] {
            if !part.is_empty() {
                parts.push(part);
            }
        }
        parts.join(" ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastMessage {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl ToastMessage {
    #[must_use]
    pub fn new(message: impl Into<String>, kind: ToastKind) -> Self {
        Self {
            message: message.into(),
            kind,
            duration_ms: kind.default_duration_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl ToastKind {
    #[must_use]
    pub const fn default_duration_ms(self) -> u64 {
        match self {
            Self::Info => 3000,
            Self::Success => 2000,
            Self::Warning => 4000,
            Self::Error => 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    Category,
    Description,
}

/// The dashboard "new request" form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequestDraft {
    pub category: String,
    pub description: String,
    pub is_submitting: bool,
}

impl NewRequestDraft {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.category.is_empty() && !self.description.is_empty()
    }

    pub fn clear(&mut self) {
        self.category.clear();
        self.description.clear();
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub active_tab: DashboardTab,
    pub requests: Vec<RequestRecord>,
    pub is_loading: bool,
    pub network_error: bool,
    pub watch: Option<WatchToken>,
    pub draft: NewRequestDraft,
    pub delete_confirm: Option<RequestId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct AdminLoginForm {
    pub email: String,
    pub password: String,
    pub is_submitting: bool,
}

impl AdminLoginForm {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.email.is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryField {
    Name,
    Description,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEdit {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub active_tab: AdminTab,
    pub requests: Vec<RequestRecord>,
    pub users: BTreeMap<String, UserProfile>,
    pub is_loading: bool,
    pub login: AdminLoginForm,
    pub category_draft: CategoryDraft,
    pub editing: Option<CategoryEdit>,
    pub delete_confirm: Option<RequestId>,
    pub requests_watch: Option<WatchToken>,
    pub categories_watch: Option<WatchToken>,
}

pub struct Model {
    pub screen: Screen,
    pub url: RouteUrl,
    pub prefs: PreferenceFlags,
    pub session: SessionIdentity,
    pub wizard: Option<WizardState>,
    pub onboarding_page: usize,
    pub categories: Vec<CategoryRecord>,
    pub dashboard: DashboardState,
    pub admin: AdminState,
    pub network_online: bool,
    pub active_error: Option<AppError>,
    pub active_toast: Option<ToastMessage>,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            screen: Screen::Loading,
            url: RouteUrl::root(),
            prefs: PreferenceFlags::default(),
            session: SessionIdentity::default(),
            wizard: None,
            onboarding_page: 0,
            categories: Vec::new(),
            dashboard: DashboardState::default(),
            admin: AdminState::default(),
            network_online: true,
            active_error: None,
            active_toast: None,
        }
    }
}

impl Model {
    pub fn show_toast(&mut self, message: impl Into<String>, kind: ToastKind) {
        self.active_toast = Some(ToastMessage::new(message, kind));
    }

    pub fn clear_toast(&mut self) {
        self.active_toast = None;
    }

    pub fn set_error(&mut self, error: AppError) {
        self.active_error = Some(error);
    }

    pub fn clear_error(&mut self) {
        self.active_error = None;
    }

    #[must_use]
    pub fn category_names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Noop,

    AppStarted {
        url: String,
    },
    PreferencesLoaded {
        result: Box<PrefsResult>,
    },
    PreferencePersisted {
        result: Box<PrefsResult>,
    },
    UrlChanged {
        url: String,
    },
    NetworkStatusChanged {
        online: bool,
    },

    LanguageChosen {
        code: String,
    },
    LanguageConfirmed,
    ThemeChosen {
        mode: ThemeMode,
    },
    ThemeConfirmed,

    OnboardingNext,
    OnboardingBack,

    WizardFieldChanged {
        field: WizardField,
        value: String,
    },
    WizardCommitKey {
        field: WizardField,
    },
    WizardNextRequested,
    WizardBackRequested,
    DuplicateCheckCompleted {
        result: Box<StoreResult>,
    },
    ProfileLookupCompleted {
        result: Box<StoreResult>,
    },
    WizardSubmitCompleted {
        result: Box<StoreResult>,
    },
    CategoriesLoaded {
        result: Box<StoreResult>,
    },

    DashboardTabSelected {
        tab: DashboardTab,
    },
    RequestsSnapshot {
        result: Box<StoreResult>,
    },
    DeleteRequested {
        id: String,
    },
    DeleteCancelled,
    DeleteConfirmed {
        id: String,
    },
    DeleteCompleted {
        result: Box<StoreResult>,
    },
    DraftFieldChanged {
        field: DraftField,
        value: String,
    },
    DraftSubmitted,
    DraftSubmitCompleted {
        result: Box<StoreResult>,
    },
    RetryRequested,
    LogoutRequested,

    SessionChanged {
        result: Box<AuthResult>,
    },
    AdminLoginFieldChanged {
        field: LoginField,
        value: String,
    },
    AdminLoginSubmitted,
    AdminLoginCompleted {
        result: Box<AuthResult>,
    },
    AdminGateChecked {
        result: Box<StoreResult>,
    },
    AdminSignedOut {
        result: Box<AuthResult>,
    },
    AdminLogoutRequested,

    AdminTabSelected {
        tab: AdminTab,
    },
    AdminRequestsSnapshot {
        result: Box<StoreResult>,
    },
    AdminCategoriesSnapshot {
        result: Box<StoreResult>,
    },
    AdminUsersLoaded {
        result: Box<StoreResult>,
    },
    StatusChangeRequested {
        id: String,
        status: RequestStatus,
    },
    StatusChangeCompleted {
        result: Box<StoreResult>,
    },
    AdminDeleteRequested {
        id: String,
    },
    AdminDeleteCancelled,
    AdminDeleteConfirmed {
        id: String,
    },
    AdminDeleteCompleted {
        result: Box<StoreResult>,
    },
    CategoryDraftChanged {
        field: CategoryField,
        value: String,
    },
    CategoryCreateRequested,
    CategoryCreateCompleted {
        result: Box<StoreResult>,
    },
    CategoryEditStarted {
        id: String,
    },
    CategoryEditChanged {
        field: CategoryField,
        value: String,
    },
    CategoryEditCancelled,
    CategoryEditSaved,
    CategoryUpdateCompleted {
        result: Box<StoreResult>,
    },
    CategoryDeleteRequested {
        id: String,
    },
    CategoryDeleteCompleted {
        result: Box<StoreResult>,
    },

    ShowToast {
        message: String,
        kind: ToastKind,
    },
    DismissToast,
    DismissError,
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::AppStarted { .. } => "app_started",
            Self::PreferencesLoaded { .. } => "preferences_loaded",
            Self::PreferencePersisted { .. } => "preference_persisted",
            Self::UrlChanged { .. } => "url_changed",
            Self::NetworkStatusChanged { .. } => "network_status_changed",
            Self::LanguageChosen { .. } => "language_chosen",
            Self::LanguageConfirmed => "language_confirmed",
            Self::ThemeChosen { .. } => "theme_chosen",
            Self::ThemeConfirmed => "theme_confirmed",
            Self::OnboardingNext => "onboarding_next",
            Self::OnboardingBack => "onboarding_back",
            Self::WizardFieldChanged { .. } => "wizard_field_changed",
            Self::WizardCommitKey { .. } => "wizard_commit_key",
            Self::WizardNextRequested => "wizard_next_requested",
            Self::WizardBackRequested => "wizard_back_requested",
            Self::DuplicateCheckCompleted { .. } => "duplicate_check_completed",
            Self::ProfileLookupCompleted { .. } => "profile_lookup_completed",
            Self::WizardSubmitCompleted { .. } => "wizard_submit_completed",
            Self::CategoriesLoaded { .. } => "categories_loaded",
            Self::DashboardTabSelected { .. } => "dashboard_tab_selected",
            Self::RequestsSnapshot { .. } => "requests_snapshot",
            Self::DeleteRequested { .. } => "delete_requested",
            Self::DeleteCancelled => "delete_cancelled",
            Self::DeleteConfirmed { .. } => "delete_confirmed",
            Self::DeleteCompleted { .. } => "delete_completed",
            Self::DraftFieldChanged { .. } => "draft_field_changed",
            Self::DraftSubmitted => "draft_submitted",
            Self::DraftSubmitCompleted { .. } => "draft_submit_completed",
            Self::RetryRequested => "retry_requested",
            Self::LogoutRequested => "logout_requested",
            Self::SessionChanged { .. } => "session_changed",
            Self::AdminLoginFieldChanged { .. } => "admin_login_field_changed",
            Self::AdminLoginSubmitted => "admin_login_submitted",
            Self::AdminLoginCompleted { .. } => "admin_login_completed",
            Self::AdminGateChecked { .. } => "admin_gate_checked",
            Self::AdminSignedOut { .. } => "admin_signed_out",
            Self::AdminLogoutRequested => "admin_logout_requested",
            Self::AdminTabSelected { .. } => "admin_tab_selected",
            Self::AdminRequestsSnapshot { .. } => "admin_requests_snapshot",
            Self::AdminCategoriesSnapshot { .. } => "admin_categories_snapshot",
            Self::AdminUsersLoaded { .. } => "admin_users_loaded",
            Self::StatusChangeRequested { .. } => "status_change_requested",
            Self::StatusChangeCompleted { .. } => "status_change_completed",
            Self::AdminDeleteRequested { .. } => "admin_delete_requested",
            Self::AdminDeleteCancelled => "admin_delete_cancelled",
            Self::AdminDeleteConfirmed { .. } => "admin_delete_confirmed",
            Self::AdminDeleteCompleted { .. } => "admin_delete_completed",
            Self::CategoryDraftChanged { .. } => "category_draft_changed",
            Self::CategoryCreateRequested => "category_create_requested",
            Self::CategoryCreateCompleted { .. } => "category_create_completed",
            Self::CategoryEditStarted { .. } => "category_edit_started",
            Self::CategoryEditChanged { .. } => "category_edit_changed",
            Self::CategoryEditCancelled => "category_edit_cancelled",
            Self::CategoryEditSaved => "category_edit_saved",
            Self::CategoryUpdateCompleted { .. } => "category_update_completed",
            Self::CategoryDeleteRequested { .. } => "category_delete_requested",
            Self::CategoryDeleteCompleted { .. } => "category_delete_completed",
            Self::ShowToast { .. } => "show_toast",
            Self::DismissToast => "dismiss_toast",
            Self::DismissError => "dismiss_error",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::LanguageChosen { .. }
                | Self::LanguageConfirmed
                | Self::ThemeChosen { .. }
                | Self::ThemeConfirmed
                | Self::OnboardingNext
                | Self::OnboardingBack
                | Self::WizardFieldChanged { .. }
                | Self::WizardCommitKey { .. }
                | Self::WizardNextRequested
                | Self::WizardBackRequested
                | Self::DashboardTabSelected { .. }
                | Self::DeleteRequested { .. }
                | Self::DeleteCancelled
                | Self::DeleteConfirmed { .. }
                | Self::DraftFieldChanged { .. }
                | Self::DraftSubmitted
                | Self::RetryRequested
                | Self::LogoutRequested
                | Self::AdminLoginFieldChanged { .. }
                | Self::AdminLoginSubmitted
                | Self::AdminLogoutRequested
                | Self::AdminTabSelected { .. }
                | Self::StatusChangeRequested { .. }
                | Self::AdminDeleteRequested { .. }
                | Self::AdminDeleteCancelled
                | Self::AdminDeleteConfirmed { .. }
                | Self::CategoryDraftChanged { .. }
                | Self::CategoryCreateRequested
                | Self::CategoryEditStarted { .. }
                | Self::CategoryEditChanged { .. }
                | Self::CategoryEditCancelled
                | Self::CategoryEditSaved
                | Self::CategoryDeleteRequested { .. }
                | Self::DismissToast
                | Self::DismissError
        )
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::Noop
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageOption {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub selected: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestView {
    pub id: String,
    pub category: String,
    pub problem_description: String,
    pub status: RequestStatus,
    pub status_label: String,
    pub submitted_at_ms: u64,
}

impl From<&RequestRecord> for RequestView {
    fn from(r: &RequestRecord) -> Self {
        Self {
            id: r.id.0.clone(),
            category: r.category.clone(),
            problem_description: r.problem_description.clone(),
            status: r.status,
            status_label: r.status.display_name().to_string(),
            submitted_at_ms: r.submitted_at.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminRequestView {
    pub id: String,
    pub user_id: String,
    pub requester_name: Option<String>,
    pub category: String,
    pub problem_description: String,
    pub status: RequestStatus,
    pub status_label: String,
    pub submitted_at_ms: u64,
    pub last_updated_at_ms: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<&CategoryRecord> for CategoryView {
    fn from(c: &CategoryRecord) -> Self {
        Self {
            id: c.id.0.clone(),
            name: c.name.clone(),
            description: c.description.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusOption {
    pub value: RequestStatus,
    pub label: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToastView {
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

impl From<&ToastMessage> for ToastView {
    fn from(t: &ToastMessage) -> Self {
        Self {
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub is_retryable: bool,
    pub error_code: String,
}

impl From<&AppError> for UserFacingError {
    fn from(e: &AppError) -> Self {
        Self {
            message: e.user_facing_message(),
            is_retryable: e.is_retryable(),
            error_code: e.code().to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WizardFormView {
    pub mobile_number: String,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub gender: String,
    pub location: String,
    pub category: String,
    pub problem_description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRequestDraftView {
    pub category: String,
    pub description: String,
    pub is_submitting: bool,
    pub can_submit: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEditView {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewState {
    Loading,
    LanguageSelect {
        languages: Vec<LanguageOption>,
    },
    ThemeSelect {
        selected: ThemeMode,
    },
    Onboarding {
        page: usize,
        page_count: usize,
        languages: Vec<LanguageOption>,
    },
    RequestWizard {
        step: usize,
        step_count: usize,
        step_slug: String,
        form: WizardFormView,
        focus: Option<WizardField>,
        focus_delay_ms: u64,
        is_checking: bool,
        is_submitting: bool,
        can_advance: bool,
        categories: Vec<String>,
    },
    Dashboard {
        tab: DashboardTab,
        user: String,
        requests: Vec<RequestView>,
        total_requests: usize,
        is_loading: bool,
        network_error: bool,
        delete_confirm: Option<String>,
        draft: NewRequestDraftView,
        categories: Vec<String>,
        languages: Vec<LanguageOption>,
        theme: ThemeMode,
    },
    AdminLogin {
        email: String,
        is_submitting: bool,
        can_submit: bool,
    },
    AdminDashboard {
        tab: AdminTab,
        requests: Vec<AdminRequestView>,
        categories: Vec<CategoryView>,
        statuses: Vec<StatusOption>,
        is_loading: bool,
        delete_confirm: Option<String>,
        category_draft: CategoryDraft,
        editing: Option<CategoryEditView>,
        languages: Vec<LanguageOption>,
        theme: ThemeMode,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewModel {
    pub state: ViewState,
    pub toast: Option<ToastView>,
    pub error: Option<UserFacingError>,
    pub online: bool,
    pub language: String,
    pub theme: ThemeMode,
}

pub mod app {
    use super::*;

    #[derive(Default)]
    pub struct App;

    impl App {
        fn language_options(model: &Model) -> Vec<LanguageOption> {
            SUPPORTED_LANGUAGES
                .iter()
                .map(|l| LanguageOption {
                    code: l.code.to_string(),
                    name: l.name.to_string(),
                    native_name: l.native_name.to_string(),
                    selected: l.code == model.prefs.language,
                })
                .collect()
        }

        fn parse_requests(documents: &[Document], caps: &Capabilities) -> Vec<RequestRecord> {
            let mut records: Vec<RequestRecord> = documents
                .iter()
                .filter_map(|doc| {
                    let record = RequestRecord::from_document(doc);
                    if record.is_none() {
                        tracing::warn!(id = %doc.id, "skipping malformed request document");
                        caps.telemetry.warn("request_doc_malformed", &doc.id);
                    }
                    record
                })
                .collect();
            sort_newest_first(&mut records);
            records
        }

        fn parse_categories(documents: &[Document], caps: &Capabilities) -> Vec<CategoryRecord> {
            documents
                .iter()
                .filter_map(|doc| {
                    let record = CategoryRecord::from_document(doc);
                    if record.is_none() {
                        caps.telemetry.warn("category_doc_malformed", &doc.id);
                    }
                    record
                })
                .collect()
        }

        fn request_fields_from_wizard(form: &wizard::WizardForm, now: UnixTimeMs) -> Fields {
            let mut f = Fields::new();
            f.insert(fields::USER_ID.into(), form.mobile_number.as_str().into());
            f.insert(fields::FIRST_NAME.into(), form.first_name.as_str().into());
            f.insert(fields::MIDDLE_NAME.into(), form.middle_name.as_str().into());
            f.insert(fields::LAST_NAME.into(), form.last_name.as_str().into());
            f.insert(fields::GENDER.into(), form.gender.as_str().into());
            f.insert(fields::LOCATION.into(), form.location.as_str().into());
            f.insert(fields::CATEGORY.into(), form.category.as_str().into());
            f.insert(
                fields::PROBLEM_DESCRIPTION.into(),
                form.problem_description.as_str().into(),
            );
            f.insert(
                fields::STATUS.into(),
                RequestStatus::Pending.as_str().into(),
            );
            f.insert(fields::SUBMITTED_AT.into(), now.0.into());
            f
        }

        fn persist_pref(caps: &Capabilities, key: &str, value: &str) {
            caps.prefs.set(key, value, |result| Event::PreferencePersisted {
                result: Box::new(result),
            });
        }

        fn remove_pref(caps: &Capabilities, key: &str) {
            caps.prefs.remove(key, |result| Event::PreferencePersisted {
                result: Box::new(result),
            });
        }

        fn navigate(model: &mut Model, caps: &Capabilities, target: &NavTarget) {
            match target.mode {
                routing::HistoryMode::Push => caps.nav.push(target.url.clone()),
                routing::HistoryMode::Replace => caps.nav.replace(target.url.clone()),
            }
            model.url = RouteUrl::parse(&target.url);
        }

        /// Re-run the resolver against the current flags/URL/session and
        /// apply the outcome.
        fn apply_resolution(&self, model: &mut Model, caps: &Capabilities) {
            // The resolved view type is sticky.
            let effective = routing::effective_view_type(&model.url, &model.prefs);
            if effective != model.prefs.view_type {
                model.prefs.view_type = effective;
            }
            Self::persist_pref(caps, pref_keys::VIEW_TYPE, effective.as_str());

            let Resolution { screen, redirect } =
                routing::resolve(&model.prefs, &model.url, &model.session);
            if let Some(target) = redirect {
                Self::navigate(model, caps, &target);
            }
            self.set_screen(model, caps, screen);
        }

        fn set_screen(&self, model: &mut Model, caps: &Capabilities, screen: Screen) {
            if model.screen == screen {
                caps.render.render();
                return;
            }

            Self::leave_screen(model, caps);
            model.screen = screen;
            self.enter_screen(model, caps);

            caps.telemetry.event("screen", &[("name", screen.as_str())]);
            caps.render.render();
        }

        fn leave_screen(model: &mut Model, caps: &Capabilities) {
            match model.screen {
                Screen::Dashboard => {
                    if let Some(token) = model.dashboard.watch.take() {
                        caps.store.unwatch(token);
                    }
                    caps.nav.guard_back(false);
                    model.dashboard = DashboardState::default();
                }
                Screen::AdminDashboard => {
                    if let Some(token) = model.admin.requests_watch.take() {
                        caps.store.unwatch(token);
                    }
                    if let Some(token) = model.admin.categories_watch.take() {
                        caps.store.unwatch(token);
                    }
                    model.admin.requests.clear();
                    model.admin.users.clear();
                    model.admin.editing = None;
                    model.admin.delete_confirm = None;
                }
                Screen::RequestWizard => {
                    // session-scoped; dies with the screen
                    model.wizard = None;
                }
                _ => {}
            }
        }

        fn enter_screen(&self, model: &mut Model, caps: &Capabilities) {
            match model.screen {
                Screen::Onboarding => {
                    let page = onboarding_page_from_fragment(model.url.fragment());
                    model.onboarding_page = page;
                    if model.url.fragment().is_none() {
                        // canonicalize the entry so a back-press has a
                        // well-known target to absorb
                        caps.nav.replace(onboarding_url(page));
                        model.url = RouteUrl::parse(&onboarding_url(page));
                    }
                }
                Screen::RequestWizard => {
                    let mut state = WizardState::new();
                    state.sync_from_fragment(model.url.fragment());
                    model.wizard = Some(state);
                    caps.store.query(CATEGORIES_COLLECTION, None, |result| {
                        Event::CategoriesLoaded {
                            result: Box::new(result),
                        }
                    });
                }
                Screen::Dashboard => {
                    model.dashboard = DashboardState::default();
                    model.dashboard.active_tab =
                        DashboardTab::from_fragment(model.url.fragment());
                    model.dashboard.is_loading = true;

                    if let Some(user) = model.prefs.current_user.clone() {
                        model.session.end_user = Some(user.clone());
                        let token = WatchToken::generate();
                        model.dashboard.watch = Some(token.clone());
                        caps.store.watch(
                            REQUESTS_COLLECTION,
                            Some(DocumentFilter::field_eq(fields::USER_ID, user)),
                            token,
                            |result| Event::RequestsSnapshot {
                                result: Box::new(result),
                            },
                        );
                    }
                    caps.store.query(CATEGORIES_COLLECTION, None, |result| {
                        Event::CategoriesLoaded {
                            result: Box::new(result),
                        }
                    });

                    // One extra entry plus the shell-side guard keeps back
                    // from re-entering the submission flow.
                    let canonical = dashboard_url(model.dashboard.active_tab);
                    caps.nav.replace(canonical.clone());
                    caps.nav.push(canonical.clone());
                    caps.nav.guard_back(true);
                    model.url = RouteUrl::parse(&canonical);
                }
                Screen::AdminLogin => {
                    model.admin.login = AdminLoginForm::default();
                }
                Screen::AdminDashboard => {
                    model.admin.is_loading = true;
                    model.admin.active_tab = AdminTab::Requests;

                    let requests_token = WatchToken::generate();
                    model.admin.requests_watch = Some(requests_token.clone());
                    caps.store
                        .watch(REQUESTS_COLLECTION, None, requests_token, |result| {
                            Event::AdminRequestsSnapshot {
                                result: Box::new(result),
                            }
                        });

                    let categories_token = WatchToken::generate();
                    model.admin.categories_watch = Some(categories_token.clone());
                    caps.store
                        .watch(CATEGORIES_COLLECTION, None, categories_token, |result| {
                            Event::AdminCategoriesSnapshot {
                                result: Box::new(result),
                            }
                        });

                    caps.store.query(USERS_COLLECTION, None, |result| {
                        Event::AdminUsersLoaded {
                            result: Box::new(result),
                        }
                    });
                }
                _ => {}
            }
        }

        fn go_to_dashboard(&self, model: &mut Model, caps: &Capabilities) {
            Self::navigate(
                model,
                caps,
                &NavTarget::replace(dashboard_url(DashboardTab::Requests)),
            );
            self.set_screen(model, caps, Screen::Dashboard);
        }

        fn set_current_user(model: &mut Model, caps: &Capabilities, mobile: &str) {
            model.prefs.current_user = Some(mobile.to_string());
            model.session.end_user = Some(mobile.to_string());
            Self::persist_pref(caps, pref_keys::CURRENT_USER, mobile);
        }

        fn advance_wizard(model: &mut Model, caps: &Capabilities) {
            let Some(wizard) = model.wizard.as_mut() else {
                return;
            };
            if let Some(next) = wizard.step.next() {
                wizard.enter_step(next);
                caps.nav.push(next.url());
                model.url = RouteUrl::parse(&next.url());
            }
        }

        fn submit_wizard(model: &mut Model, caps: &Capabilities) {
            let Some(wizard) = model.wizard.as_mut() else {
                return;
            };
            wizard.is_submitting = true;
            let payload = Self::request_fields_from_wizard(&wizard.form, UnixTimeMs::now());
            caps.store.create(REQUESTS_COLLECTION, payload, |result| {
                Event::WizardSubmitCompleted {
                    result: Box::new(result),
                }
            });
        }

        fn check_admin_gate(caps: &Capabilities, uid: &str) {
            caps.store.get(ADMINS_COLLECTION, uid, |result| {
                Event::AdminGateChecked {
                    result: Box::new(result),
                }
            });
        }

        fn handle_store_failure(model: &mut Model, caps: &Capabilities, context: &str, e: &StoreError) {
            tracing::warn!(context, error = %e, "store operation failed");
            caps.telemetry.error(context, &e.to_string());
            model.set_error(AppError::from(e.clone()));
        }
    }

    impl crux_core::App for App {
        type Event = Event;
        type Model = Model;
        type ViewModel = ViewModel;
        type Capabilities = Capabilities;

        fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
            let event_name = event.name();
            caps.telemetry.counter(&format!("event.{event_name}"), 1);
            if event.is_user_initiated() {
                caps.telemetry.event("user_action", &[("event", event_name)]);
            }

            match event {
                Event::Noop => {}

                Event::AppStarted { url } => {
                    model.url = RouteUrl::parse(&url);
                    model.screen = Screen::Loading;

                    caps.prefs.load(|result| Event::PreferencesLoaded {
                        result: Box::new(result),
                    });
                    caps.auth.watch_session(|result| Event::SessionChanged {
                        result: Box::new(result),
                    });

                    caps.telemetry.event("app_started", &[]);
                    caps.render.render();
                }

                Event::PreferencesLoaded { result } => {
                    match *result {
                        Ok(PrefsOutput::Snapshot(snapshot)) => {
                            model.prefs = PreferenceFlags::from_snapshot(&snapshot);
                        }
                        Ok(_) => {
                            caps.telemetry.warn("prefs_load", "unexpected output");
                        }
                        Err(e) => {
                            // fall through with defaults; the setup screens
                            // will collect everything again
                            tracing::warn!(error = %e, "preference load failed");
                            caps.telemetry.error("prefs_load_failed", &e.to_string());
                        }
                    }
                    self.apply_resolution(model, caps);
                }

                Event::PreferencePersisted { result } => {
                    if let Err(e) = *result {
                        tracing::warn!(error = %e, "preference write failed");
                        caps.telemetry.error("pref_persist_failed", &e.to_string());
                    }
                }

                Event::UrlChanged { url } => {
                    let parsed = RouteUrl::parse(&url);
                    let same_path = parsed.path == model.url.path;
                    model.url = parsed;

                    match model.screen {
                        Screen::Onboarding if same_path => {
                            let page = onboarding_page_from_fragment(model.url.fragment());
                            // a back-press that lands on page 1 is absorbed
                            // by re-arming the canonical entry
                            if page == 0 && model.onboarding_page == 0 {
                                caps.nav.push(onboarding_url(0));
                            }
                            model.onboarding_page = page;
                            caps.render.render();
                        }
                        Screen::RequestWizard if same_path => {
                            if let Some(wizard) = model.wizard.as_mut() {
                                wizard.sync_from_fragment(model.url.fragment());
                            }
                            caps.render.render();
                        }
                        Screen::Dashboard if same_path => {
                            model.dashboard.active_tab =
                                DashboardTab::from_fragment(model.url.fragment());
                            caps.render.render();
                        }
                        _ => self.apply_resolution(model, caps),
                    }
                }

                Event::NetworkStatusChanged { online } => {
                    let was_online = model.network_online;
                    model.network_online = online;

                    if online && !was_online {
                        model.show_toast(messages::BACK_ONLINE, ToastKind::Success);
                        if model.screen == Screen::Dashboard {
                            model.dashboard.network_error = false;
                        }
                    } else if !online && was_online {
                        model.show_toast(messages::CONNECTION_LOST, ToastKind::Error);
                        if model.screen == Screen::Dashboard {
                            model.dashboard.network_error = true;
                        }
                    }

                    caps.telemetry
                        .event("network_changed", &[("online", if online { "true" } else { "false" })]);
                    caps.render.render();
                }

                Event::LanguageChosen { code } => {
                    if language_by_code(&code).is_some() {
                        model.prefs.language = code.clone();
                        Self::persist_pref(caps, pref_keys::LANGUAGE, &code);
                    }
                    caps.render.render();
                }

                Event::LanguageConfirmed => {
                    model.prefs.language_selected = true;
                    Self::persist_pref(caps, pref_keys::LANGUAGE_SELECTED, "true");
                    self.apply_resolution(model, caps);
                }

                Event::ThemeChosen { mode } => {
                    model.prefs.theme = mode;
                    Self::persist_pref(caps, pref_keys::THEME, mode.as_str());
                    caps.render.render();
                }

                Event::ThemeConfirmed => {
                    model.prefs.theme_selected = true;
                    Self::persist_pref(caps, pref_keys::THEME_SELECTED, "true");
                    self.apply_resolution(model, caps);
                }

                Event::OnboardingNext => {
                    if model.screen != Screen::Onboarding {
                        return;
                    }
                    if model.onboarding_page + 1 < ONBOARDING_PAGE_COUNT {
                        model.onboarding_page += 1;
                        let url = onboarding_url(model.onboarding_page);
                        caps.nav.push(url.clone());
                        model.url = RouteUrl::parse(&url);
                        caps.render.render();
                    } else {
                        model.prefs.onboarding_completed = true;
                        Self::persist_pref(caps, pref_keys::ONBOARDING_COMPLETED, "true");

                        let target = NavTarget::replace(WizardStep::Mobile.url());
                        Self::navigate(model, caps, &target);
                        self.set_screen(model, caps, Screen::RequestWizard);
                    }
                }

                Event::OnboardingBack => {
                    if model.onboarding_page > 0 {
                        // the fragment-change event moves the page index
                        caps.nav.back();
                    }
                }

                Event::WizardFieldChanged { field, value } => {
                    if let Some(wizard) = model.wizard.as_mut() {
                        wizard.form.set(field, &value);
                        caps.render.render();
                    }
                }

                Event::WizardCommitKey { field } => {
                    let Some(wizard) = model.wizard.as_mut() else {
                        return;
                    };
                    if let Some(next) = next_field(wizard.step, field) {
                        wizard.focus = Some(next);
                        caps.render.render();
                    } else {
                        self.update(Event::WizardNextRequested, model, caps);
                    }
                }

                Event::WizardNextRequested => {
                    let (busy, valid, step) = match model.wizard.as_ref() {
                        Some(w) => (w.is_busy(), w.current_step_valid(), w.step),
                        None => return,
                    };
                    if busy {
                        return;
                    }
                    if !valid {
                        model.show_toast(messages::FILL_REQUIRED_FIELDS, ToastKind::Error);
                        caps.render.render();
                        return;
                    }

                    match step {
                        WizardStep::Mobile => {
                            let mobile = if let Some(wizard) = model.wizard.as_mut() {
                                wizard.is_checking = true;
                                wizard.form.mobile_number.clone()
                            } else {
                                return;
                            };
                            caps.store.query(
                                REQUESTS_COLLECTION,
                                Some(DocumentFilter::field_eq(fields::USER_ID, mobile)),
                                |result| Event::DuplicateCheckCompleted {
                                    result: Box::new(result),
                                },
                            );
                            caps.render.render();
                        }
                        step if step.is_last() => {
                            Self::submit_wizard(model, caps);
                            caps.render.render();
                        }
                        _ => {
                            Self::advance_wizard(model, caps);
                            caps.render.render();
                        }
                    }
                }

                Event::WizardBackRequested => {
                    if let Some(wizard) = &model.wizard {
                        if wizard.step.index() > 0 {
                            caps.nav.back();
                        }
                    }
                }

                Event::DuplicateCheckCompleted { result } => {
                    let Some(wizard) = model.wizard.as_mut() else {
                        return;
                    };
                    match *result {
                        Ok(StoreOutput::Documents(documents)) => {
                            if documents.is_empty() {
                                // fresh identifier; see if a profile exists
                                // for pre-fill before advancing
                                let mobile = wizard.form.mobile_number.clone();
                                caps.store.get(USERS_COLLECTION, &mobile, |result| {
                                    Event::ProfileLookupCompleted {
                                        result: Box::new(result),
                                    }
                                });
                            } else {
                                wizard.is_checking = false;
                                let mobile = wizard.form.mobile_number.clone();
                                Self::set_current_user(model, caps, &mobile);
                                model.show_toast(
                                    messages::EXISTING_REQUEST_FOUND,
                                    ToastKind::Success,
                                );
                                caps.telemetry.event("duplicate_short_circuit", &[]);
                                self.go_to_dashboard(model, caps);
                            }
                        }
                        Ok(_) => {
                            wizard.is_checking = false;
                            caps.telemetry.warn("duplicate_check", "unexpected output");
                            caps.render.render();
                        }
                        Err(e) => {
                            wizard.is_checking = false;
                            model.show_toast(messages::CHECK_MOBILE_FAILED, ToastKind::Error);
                            caps.telemetry.error("duplicate_check_failed", &e.to_string());
                            caps.render.render();
                        }
                    }
                }

                Event::ProfileLookupCompleted { result } => {
                    let Some(wizard) = model.wizard.as_mut() else {
                        return;
                    };
                    wizard.is_checking = false;
                    match *result {
                        Ok(StoreOutput::Document(found)) => {
                            if let Some(doc) = found {
                                let profile = UserProfile::from_document(&doc);
                                wizard.form.first_name = profile.first_name;
                                wizard.form.middle_name = profile.middle_name;
                                wizard.form.last_name = profile.last_name;
                                wizard.form.gender = profile.gender;
                                wizard.form.location = profile.location;
                                caps.telemetry.event("profile_prefilled", &[]);
                            }
                            Self::advance_wizard(model, caps);
                            caps.render.render();
                        }
                        Ok(_) => {
                            caps.telemetry.warn("profile_lookup", "unexpected output");
                            Self::advance_wizard(model, caps);
                            caps.render.render();
                        }
                        Err(e) => {
                            model.show_toast(messages::CHECK_MOBILE_FAILED, ToastKind::Error);
                            caps.telemetry.error("profile_lookup_failed", &e.to_string());
                            caps.render.render();
                        }
                    }
                }

                Event::WizardSubmitCompleted { result } => {
                    let Some(wizard) = model.wizard.as_mut() else {
                        return;
                    };
                    wizard.is_submitting = false;
                    match *result {
                        Ok(StoreOutput::Created { id }) => {
                            let mobile = wizard.form.mobile_number.clone();
                            Self::set_current_user(model, caps, &mobile);
                            model.show_toast(messages::SUBMITTED, ToastKind::Success);
                            caps.telemetry.event("request_created", &[("id", &id)]);
                            self.go_to_dashboard(model, caps);
                        }
                        Ok(_) => {
                            caps.telemetry.warn("wizard_submit", "unexpected output");
                            caps.render.render();
                        }
                        Err(e) => {
                            model.show_toast(messages::SUBMIT_FAILED, ToastKind::Error);
                            caps.telemetry.error("wizard_submit_failed", &e.to_string());
                            caps.render.render();
                        }
                    }
                }

                Event::CategoriesLoaded { result } => {
                    match *result {
                        Ok(StoreOutput::Documents(documents)) => {
                            model.categories = Self::parse_categories(&documents, caps);
                        }
                        Ok(_) => {
                            caps.telemetry.warn("categories_load", "unexpected output");
                        }
                        Err(e) => {
                            model.show_toast(messages::CATEGORIES_LOAD_FAILED, ToastKind::Error);
                            if model.screen == Screen::Dashboard {
                                model.dashboard.network_error = true;
                            }
                            caps.telemetry.error("categories_load_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::DashboardTabSelected { tab } => {
                    if model.screen != Screen::Dashboard {
                        return;
                    }
                    model.dashboard.active_tab = tab;
                    let url = dashboard_url(tab);
                    caps.nav.push(url.clone());
                    model.url = RouteUrl::parse(&url);
                    caps.render.render();
                }

                Event::RequestsSnapshot { result } => {
                    if model.screen != Screen::Dashboard {
                        return;
                    }
                    match *result {
                        Ok(StoreOutput::Snapshot { token, documents }) => {
                            if model.dashboard.watch.as_ref() != Some(&token) {
                                // stale emission from a released watch
                                return;
                            }
                            model.dashboard.requests = Self::parse_requests(&documents, caps);
                            model.dashboard.is_loading = false;
                            model.dashboard.network_error = false;
                        }
                        Ok(_) => {
                            caps.telemetry.warn("requests_snapshot", "unexpected output");
                        }
                        Err(e) => {
                            model.dashboard.is_loading = false;
                            model.dashboard.network_error = true;
                            tracing::warn!(error = %e, "request watch failed");
                            caps.telemetry.error("requests_watch_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::DeleteRequested { id } => {
                    model.dashboard.delete_confirm = Some(RequestId::new(id));
                    caps.render.render();
                }

                Event::DeleteCancelled => {
                    model.dashboard.delete_confirm = None;
                    caps.render.render();
                }

                Event::DeleteConfirmed { id } => {
                    if !model.network_online {
                        model.show_toast(messages::NO_CONNECTIVITY, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    model.dashboard.delete_confirm = None;
                    caps.store.delete(REQUESTS_COLLECTION, &id, |result| {
                        Event::DeleteCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::DeleteCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Deleted { .. }) => {
                            model.show_toast(messages::REQUEST_DELETED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::DELETE_FAILED, ToastKind::Error);
                            caps.telemetry.error("delete_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::DraftFieldChanged { field, value } => {
                    match field {
                        DraftField::Category => model.dashboard.draft.category = value,
                        DraftField::Description => model.dashboard.draft.description = value,
                    }
                    caps.render.render();
                }

                Event::DraftSubmitted => {
                    if !model.dashboard.draft.is_complete() {
                        model.show_toast(messages::FILL_ALL_FIELDS, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    if !model.network_online {
                        model.show_toast(messages::NO_CONNECTIVITY, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    let Some(user) = model.prefs.current_user.clone() else {
                        return;
                    };
                    model.dashboard.draft.is_submitting = true;

                    let now = UnixTimeMs::now();
                    let mut payload = Fields::new();
                    payload.insert(fields::USER_ID.into(), user.into());
                    payload.insert(
                        fields::CATEGORY.into(),
                        model.dashboard.draft.category.as_str().into(),
                    );
                    payload.insert(
                        fields::PROBLEM_DESCRIPTION.into(),
                        model.dashboard.draft.description.as_str().into(),
                    );
                    payload.insert(
                        fields::STATUS.into(),
                        RequestStatus::Pending.as_str().into(),
                    );
                    payload.insert(fields::SUBMITTED_AT.into(), now.0.into());
                    payload.insert(fields::LAST_UPDATED_AT.into(), now.0.into());

                    caps.store.create(REQUESTS_COLLECTION, payload, |result| {
                        Event::DraftSubmitCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::DraftSubmitCompleted { result } => {
                    model.dashboard.draft.is_submitting = false;
                    match *result {
                        Ok(StoreOutput::Created { .. }) => {
                            model.show_toast(messages::SUBMITTED, ToastKind::Success);
                            model.dashboard.draft.clear();
                            model.dashboard.active_tab = DashboardTab::Requests;
                            let url = dashboard_url(DashboardTab::Requests);
                            caps.nav.push(url.clone());
                            model.url = RouteUrl::parse(&url);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::SUBMIT_FAILED, ToastKind::Error);
                            caps.telemetry.error("draft_submit_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::RetryRequested => {
                    if model.screen != Screen::Dashboard || !model.network_online {
                        return;
                    }
                    model.dashboard.is_loading = true;
                    model.dashboard.network_error = false;

                    if let Some(token) = model.dashboard.watch.take() {
                        caps.store.unwatch(token);
                    }
                    if let Some(user) = model.prefs.current_user.clone() {
                        let token = WatchToken::generate();
                        model.dashboard.watch = Some(token.clone());
                        caps.store.watch(
                            REQUESTS_COLLECTION,
                            Some(DocumentFilter::field_eq(fields::USER_ID, user)),
                            token,
                            |result| Event::RequestsSnapshot {
                                result: Box::new(result),
                            },
                        );
                    }
                    caps.store.query(CATEGORIES_COLLECTION, None, |result| {
                        Event::CategoriesLoaded {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::LogoutRequested => {
                    model.prefs.current_user = None;
                    model.session.end_user = None;
                    Self::remove_pref(caps, pref_keys::CURRENT_USER);

                    Self::navigate(model, caps, &NavTarget::replace(PATH_ROOT));
                    self.apply_resolution(model, caps);
                }

                Event::SessionChanged { result } => {
                    match *result {
                        Ok(AuthOutput::Session { uid }) => {
                            model.session.credential_uid = uid.clone();
                            if let Some(uid) = uid {
                                Self::check_admin_gate(caps, &uid);
                            } else {
                                model.session.admin_verified = false;
                                model.prefs.admin_verified_cache = false;
                                Self::persist_pref(caps, pref_keys::ADMIN_VERIFIED, "false");
                                if model.screen == Screen::AdminDashboard {
                                    self.apply_resolution(model, caps);
                                }
                            }
                        }
                        Ok(_) => {}
                        Err(e) => {
                            caps.telemetry.error("session_watch_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::AdminLoginFieldChanged { field, value } => {
                    match field {
                        LoginField::Email => model.admin.login.email = value,
                        LoginField::Password => model.admin.login.password = value,
                    }
                    caps.render.render();
                }

                Event::AdminLoginSubmitted => {
                    if model.admin.login.is_submitting {
                        return;
                    }
                    if !model.admin.login.is_complete() {
                        model.show_toast(messages::FILL_REQUIRED_FIELDS, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    model.admin.login.is_submitting = true;
                    caps.auth.sign_in(
                        &model.admin.login.email,
                        &model.admin.login.password,
                        |result| Event::AdminLoginCompleted {
                            result: Box::new(result),
                        },
                    );
                    caps.render.render();
                }

                Event::AdminLoginCompleted { result } => {
                    match *result {
                        Ok(AuthOutput::SignedIn { uid }) => {
                            model.session.credential_uid = Some(uid.clone());
                            // privilege gate runs before any admin screen is
                            // shown; is_submitting stays up until then
                            Self::check_admin_gate(caps, &uid);
                        }
                        Ok(_) => {
                            model.admin.login.is_submitting = false;
                        }
                        Err(e) => {
                            model.admin.login.is_submitting = false;
                            let error = AppError::from(e.clone());
                            model.show_toast(error.user_facing_message(), ToastKind::Error);
                            caps.telemetry.error("admin_login_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::AdminGateChecked { result } => {
                    let was_submitting = model.admin.login.is_submitting;
                    model.admin.login.is_submitting = false;
                    match *result {
                        Ok(StoreOutput::Document(found)) => {
                            let verified = found.is_some();
                            model.session.admin_verified = verified;
                            model.prefs.admin_verified_cache = verified;
                            Self::persist_pref(
                                caps,
                                pref_keys::ADMIN_VERIFIED,
                                if verified { "true" } else { "false" },
                            );

                            if verified {
                                if model.screen == Screen::AdminLogin {
                                    Self::navigate(
                                        model,
                                        caps,
                                        &NavTarget::replace(routing::PATH_ADMIN_DASHBOARD),
                                    );
                                    self.set_screen(model, caps, Screen::AdminDashboard);
                                }
                            } else {
                                // authenticated but not privileged; no
                                // partial admin session survives
                                if was_submitting {
                                    model.show_toast(messages::NOT_AUTHORIZED, ToastKind::Error);
                                    caps.auth.sign_out(|result| Event::AdminSignedOut {
                                        result: Box::new(result),
                                    });
                                }
                                if model.screen == Screen::AdminDashboard {
                                    self.apply_resolution(model, caps);
                                }
                            }
                        }
                        Ok(_) => {
                            caps.telemetry.warn("admin_gate", "unexpected output");
                        }
                        Err(e) => {
                            model.session.admin_verified = false;
                            Self::handle_store_failure(model, caps, "admin_gate_failed", &e);
                        }
                    }
                    caps.render.render();
                }

                Event::AdminSignedOut { result } => {
                    if let Err(e) = *result {
                        caps.telemetry.error("sign_out_failed", &e.to_string());
                    }
                    model.session.credential_uid = None;
                    model.session.admin_verified = false;
                    caps.render.render();
                }

                Event::AdminLogoutRequested => {
                    model.prefs.current_user = None;
                    model.prefs.admin_verified_cache = false;
                    Self::remove_pref(caps, pref_keys::CURRENT_USER);
                    Self::persist_pref(caps, pref_keys::ADMIN_VERIFIED, "false");
                    caps.auth.sign_out(|result| Event::AdminSignedOut {
                        result: Box::new(result),
                    });
                    model.session.admin_verified = false;

                    Self::navigate(model, caps, &NavTarget::replace(PATH_ADMIN));
                    self.set_screen(model, caps, Screen::AdminLogin);
                }

                Event::AdminTabSelected { tab } => {
                    if model.screen != Screen::AdminDashboard {
                        return;
                    }
                    model.admin.active_tab = tab;
                    caps.render.render();
                }

                Event::AdminRequestsSnapshot { result } => {
                    if model.screen != Screen::AdminDashboard {
                        return;
                    }
                    match *result {
                        Ok(StoreOutput::Snapshot { token, documents }) => {
                            if model.admin.requests_watch.as_ref() != Some(&token) {
                                return;
                            }
                            model.admin.requests = Self::parse_requests(&documents, caps);
                        }
                        Ok(_) => {
                            caps.telemetry.warn("admin_requests", "unexpected output");
                        }
                        Err(e) => {
                            caps.telemetry.error("admin_requests_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::AdminCategoriesSnapshot { result } => {
                    if model.screen != Screen::AdminDashboard {
                        return;
                    }
                    match *result {
                        Ok(StoreOutput::Snapshot { token, documents }) => {
                            if model.admin.categories_watch.as_ref() != Some(&token) {
                                return;
                            }
                            model.categories = Self::parse_categories(&documents, caps);
                        }
                        Ok(_) => {
                            caps.telemetry.warn("admin_categories", "unexpected output");
                        }
                        Err(e) => {
                            caps.telemetry.error("admin_categories_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::AdminUsersLoaded { result } => {
                    if model.screen != Screen::AdminDashboard {
                        return;
                    }
                    model.admin.is_loading = false;
                    match *result {
                        Ok(StoreOutput::Documents(documents)) => {
                            model.admin.users = documents
                                .iter()
                                .map(|doc| {
                                    let profile = UserProfile::from_document(doc);
                                    (profile.mobile_number.clone(), profile)
                                })
                                .collect();
                        }
                        Ok(_) => {
                            caps.telemetry.warn("admin_users", "unexpected output");
                        }
                        Err(e) => {
                            caps.telemetry.error("admin_users_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::StatusChangeRequested { id, status } => {
                    let mut payload = Fields::new();
                    payload.insert(fields::STATUS.into(), status.as_str().into());
                    payload.insert(fields::LAST_UPDATED_AT.into(), UnixTimeMs::now().0.into());

                    caps.store.update(REQUESTS_COLLECTION, &id, payload, |result| {
                        Event::StatusChangeCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.telemetry
                        .event("status_change", &[("status", status.as_str())]);
                    caps.render.render();
                }

                Event::StatusChangeCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Updated { .. }) => {
                            model.show_toast(messages::STATUS_UPDATED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::STATUS_UPDATE_FAILED, ToastKind::Error);
                            caps.telemetry.error("status_update_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::AdminDeleteRequested { id } => {
                    model.admin.delete_confirm = Some(RequestId::new(id));
                    caps.render.render();
                }

                Event::AdminDeleteCancelled => {
                    model.admin.delete_confirm = None;
                    caps.render.render();
                }

                Event::AdminDeleteConfirmed { id } => {
                    if !model.network_online {
                        model.show_toast(messages::NO_CONNECTIVITY, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    model.admin.delete_confirm = None;
                    caps.store.delete(REQUESTS_COLLECTION, &id, |result| {
                        Event::AdminDeleteCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::AdminDeleteCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Deleted { .. }) => {
                            model.show_toast(messages::REQUEST_DELETED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::DELETE_FAILED, ToastKind::Error);
                            caps.telemetry.error("admin_delete_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::CategoryDraftChanged { field, value } => {
                    match field {
                        CategoryField::Name => model.admin.category_draft.name = value,
                        CategoryField::Description => {
                            model.admin.category_draft.description = value;
                        }
                    }
                    caps.render.render();
                }

                Event::CategoryCreateRequested => {
                    if model.admin.category_draft.name.trim().is_empty() {
                        model.show_toast(messages::CATEGORY_NAME_REQUIRED, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    let mut payload = Fields::new();
                    payload.insert(
                        fields::NAME.into(),
                        model.admin.category_draft.name.as_str().into(),
                    );
                    payload.insert(
                        fields::DESCRIPTION.into(),
                        model.admin.category_draft.description.as_str().into(),
                    );
                    payload.insert(fields::CREATED_AT.into(), UnixTimeMs::now().0.into());

                    caps.store.create(CATEGORIES_COLLECTION, payload, |result| {
                        Event::CategoryCreateCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::CategoryCreateCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Created { .. }) => {
                            model.admin.category_draft = CategoryDraft::default();
                            model.show_toast(messages::CATEGORY_ADDED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::CATEGORY_ADD_FAILED, ToastKind::Error);
                            caps.telemetry.error("category_add_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::CategoryEditStarted { id } => {
                    if let Some(category) = model.categories.iter().find(|c| c.id.0 == id) {
                        model.admin.editing = Some(CategoryEdit {
                            id: category.id.clone(),
                            name: category.name.clone(),
                            description: category.description.clone(),
                        });
                    }
                    caps.render.render();
                }

                Event::CategoryEditChanged { field, value } => {
                    if let Some(editing) = model.admin.editing.as_mut() {
                        match field {
                            CategoryField::Name => editing.name = value,
                            CategoryField::Description => editing.description = value,
                        }
                    }
                    caps.render.render();
                }

                Event::CategoryEditCancelled => {
                    model.admin.editing = None;
                    caps.render.render();
                }

                Event::CategoryEditSaved => {
                    let Some(editing) = model.admin.editing.clone() else {
                        return;
                    };
                    if editing.name.trim().is_empty() {
                        model.show_toast(messages::CATEGORY_NAME_REQUIRED, ToastKind::Error);
                        caps.render.render();
                        return;
                    }
                    let mut payload = Fields::new();
                    payload.insert(fields::NAME.into(), editing.name.as_str().into());
                    payload.insert(
                        fields::DESCRIPTION.into(),
                        editing.description.as_str().into(),
                    );
                    payload.insert(fields::UPDATED_AT.into(), UnixTimeMs::now().0.into());

                    caps.store
                        .update(CATEGORIES_COLLECTION, editing.id.as_str(), payload, |result| {
                            Event::CategoryUpdateCompleted {
                                result: Box::new(result),
                            }
                        });
                    caps.render.render();
                }

                Event::CategoryUpdateCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Updated { .. }) => {
                            model.admin.editing = None;
                            model.show_toast(messages::CATEGORY_UPDATED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::CATEGORY_UPDATE_FAILED, ToastKind::Error);
                            caps.telemetry.error("category_update_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::CategoryDeleteRequested { id } => {
                    // deletion is unconditional: requests keep the category
                    // name by value, so stale labels on old requests are
                    // accepted
                    caps.store.delete(CATEGORIES_COLLECTION, &id, |result| {
                        Event::CategoryDeleteCompleted {
                            result: Box::new(result),
                        }
                    });
                    caps.render.render();
                }

                Event::CategoryDeleteCompleted { result } => {
                    match *result {
                        Ok(StoreOutput::Deleted { .. }) => {
                            model.show_toast(messages::CATEGORY_DELETED, ToastKind::Success);
                        }
                        Ok(_) => {}
                        Err(e) => {
                            model.show_toast(messages::CATEGORY_DELETE_FAILED, ToastKind::Error);
                            caps.telemetry.error("category_delete_failed", &e.to_string());
                        }
                    }
                    caps.render.render();
                }

                Event::ShowToast { message, kind } => {
                    model.show_toast(message, kind);
                    caps.render.render();
                }

                Event::DismissToast => {
                    model.clear_toast();
                    caps.render.render();
                }

                Event::DismissError => {
                    model.clear_error();
                    caps.render.render();
                }
            }
        }

        fn view(&self, model: &Model) -> ViewModel {
            let state = match model.screen {
                Screen::Loading => ViewState::Loading,

                Screen::LanguageSelect => ViewState::LanguageSelect {
                    languages: Self::language_options(model),
                },

                Screen::ThemeSelect => ViewState::ThemeSelect {
                    selected: model.prefs.theme,
                },

                Screen::Onboarding => ViewState::Onboarding {
                    page: model.onboarding_page,
                    page_count: ONBOARDING_PAGE_COUNT,
                    languages: Self::language_options(model),
                },

                Screen::RequestWizard => {
                    let wizard = model.wizard.clone().unwrap_or_default();
                    ViewState::RequestWizard {
                        step: wizard.step.index(),
                        step_count: WIZARD_STEP_COUNT,
                        step_slug: wizard.step.slug().to_string(),
                        form: WizardFormView {
                            mobile_number: wizard.form.mobile_number.clone(),
                            first_name: wizard.form.first_name.clone(),
                            middle_name: wizard.form.middle_name.clone(),
                            last_name: wizard.form.last_name.clone(),
                            gender: wizard.form.gender.clone(),
                            location: wizard.form.location.clone(),
                            category: wizard.form.category.clone(),
                            problem_description: wizard.form.problem_description.clone(),
                        },
                        focus: wizard.focus,
                        focus_delay_ms: FOCUS_DELAY_MS,
                        is_checking: wizard.is_checking,
                        is_submitting: wizard.is_submitting,
                        can_advance: wizard.current_step_valid() && !wizard.is_busy(),
                        categories: model.category_names(),
                    }
                }

                Screen::Dashboard => ViewState::Dashboard {
                    tab: model.dashboard.active_tab,
                    user: model.prefs.current_user.clone().unwrap_or_default(),
                    requests: model.dashboard.requests.iter().map(RequestView::from).collect(),
                    total_requests: model.dashboard.requests.len(),
                    is_loading: model.dashboard.is_loading,
                    network_error: model.dashboard.network_error || !model.network_online,
                    delete_confirm: model
                        .dashboard
                        .delete_confirm
                        .as_ref()
                        .map(|id| id.0.clone()),
                    draft: NewRequestDraftView {
                        category: model.dashboard.draft.category.clone(),
                        description: model.dashboard.draft.description.clone(),
                        is_submitting: model.dashboard.draft.is_submitting,
                        can_submit: model.dashboard.draft.is_complete()
                            && !model.dashboard.draft.is_submitting
                            && model.network_online,
                    },
                    categories: model.category_names(),
                    languages: Self::language_options(model),
                    theme: model.prefs.theme,
                },

                Screen::AdminLogin => ViewState::AdminLogin {
                    email: model.admin.login.email.clone(),
                    is_submitting: model.admin.login.is_submitting,
                    can_submit: model.admin.login.is_complete()
                        && !model.admin.login.is_submitting,
                },

                Screen::AdminDashboard => ViewState::AdminDashboard {
                    tab: model.admin.active_tab,
                    requests: model
                        .admin
                        .requests
                        .iter()
                        .map(|r| AdminRequestView {
                            id: r.id.0.clone(),
                            user_id: r.user_id.clone(),
                            requester_name: model
                                .admin
                                .users
                                .get(&r.user_id)
                                .map(UserProfile::display_name)
                                .filter(|name| !name.is_empty()),
                            category: r.category.clone(),
                            problem_description: r.problem_description.clone(),
                            status: r.status,
                            status_label: r.status.display_name().to_string(),
                            submitted_at_ms: r.submitted_at.0,
                            last_updated_at_ms: r.last_updated_at.map(|t| t.0),
                        })
                        .collect(),
                    categories: model.categories.iter().map(CategoryView::from).collect(),
                    statuses: RequestStatus::ALL
                        .iter()
                        .map(|s| StatusOption {
                            value: *s,
                            label: s.display_name().to_string(),
                        })
                        .collect(),
                    is_loading: model.admin.is_loading,
                    delete_confirm: model.admin.delete_confirm.as_ref().map(|id| id.0.clone()),
                    category_draft: model.admin.category_draft.clone(),
                    editing: model.admin.editing.as_ref().map(|e| CategoryEditView {
                        id: e.id.0.clone(),
                        name: e.name.clone(),
                        description: e.description.clone(),
                    }),
                    languages: Self::language_options(model),
                    theme: model.prefs.theme,
                },
            };

            ViewModel {
                state,
                toast: model.active_toast.as_ref().map(ToastView::from),
                error: model.active_error.as_ref().map(UserFacingError::from),
                online: model.network_online,
                language: model.prefs.language.clone(),
                theme: model.prefs.theme,
            }
        }
    }
}
