use serde::{Deserialize, Serialize};
use url::Url;

use crate::{DashboardTab, PreferenceFlags, SessionIdentity, ViewType};

pub const PATH_ROOT: &str = "/";
pub const PATH_LANGUAGE: &str = "/language";
pub const PATH_THEME: &str = "/theme";
pub const PATH_ONBOARDING: &str = "/onboarding";
pub const PATH_REQUEST: &str = "/request";
pub const PATH_DASHBOARD: &str = "/dashboard";
pub const PATH_ADMIN: &str = "/admin";
pub const PATH_ADMIN_DASHBOARD: &str = "/admin/dashboard";

pub const VIEW_TYPE_PARAM: &str = "viewType";

pub const ONBOARDING_PAGE_COUNT: usize = 3;

/// The top-level screens the shell can render. Derived, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Loading,
    LanguageSelect,
    ThemeSelect,
    Onboarding,
    RequestWizard,
    Dashboard,
    AdminLogin,
    AdminDashboard,
}

impl Screen {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::LanguageSelect => "language_select",
            Self::ThemeSelect => "theme_select",
            Self::Onboarding => "onboarding",
            Self::RequestWizard => "request_wizard",
            Self::Dashboard => "dashboard",
            Self::AdminLogin => "admin_login",
            Self::AdminDashboard => "admin_dashboard",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::AdminLogin | Self::AdminDashboard)
    }
}

/// The parts of the URL the core reasons about: path, the `viewType` query
/// parameter, and the hash fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteUrl {
    pub path: String,
    pub view_type_param: Option<ViewType>,
    pub fragment: Option<String>,
}

impl Default for RouteUrl {
    fn default() -> Self {
        Self::root()
    }
}

impl RouteUrl {
    #[must_use]
    pub fn root() -> Self {
        Self {
            path: PATH_ROOT.to_string(),
            view_type_param: None,
            fragment: None,
        }
    }

    /// Parse a location string as reported by the shell. Never fails; a
    /// string the URL parser rejects resolves to the root.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let Ok(base) = Url::parse("app://shell/") else {
            return Self::root();
        };
        let Ok(parsed) = base.join(input) else {
            return Self::root();
        };

        let view_type_param = parsed
            .query_pairs()
            .find(|(key, _)| key == VIEW_TYPE_PARAM)
            .and_then(|(_, value)| ViewType::parse(&value));

        let fragment = parsed
            .fragment()
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        Self {
            path: parsed.path().to_string(),
            view_type_param,
            fragment,
        }
    }

    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryMode {
    Push,
    Replace,
}

/// A navigation the core wants the shell to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavTarget {
    pub url: String,
    pub mode: HistoryMode,
}

impl NavTarget {
    #[must_use]
    pub fn replace(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: HistoryMode::Replace,
        }
    }

    #[must_use]
    pub fn push(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mode: HistoryMode::Push,
        }
    }
}

/// Outcome of resolving the current location: the authoritative screen, and
/// the redirect to issue when the location does not already match it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub screen: Screen,
    pub redirect: Option<NavTarget>,
}

impl Resolution {
    #[must_use]
    pub const fn stay(screen: Screen) -> Self {
        Self {
            screen,
            redirect: None,
        }
    }

    #[must_use]
    pub const fn redirect(screen: Screen, target: NavTarget) -> Self {
        Self {
            screen,
            redirect: Some(target),
        }
    }
}

/// `viewType` precedence: URL query parameter, then the persisted choice,
/// then `user`.
#[must_use]
pub fn effective_view_type(url: &RouteUrl, flags: &PreferenceFlags) -> ViewType {
    url.view_type_param.unwrap_or(flags.view_type)
}

/// Resolve which screen is authoritative for the given flags, location and
/// session. Pure and total: identical inputs always produce the identical
/// resolution, and every input resolves to some screen.
#[must_use]
pub fn resolve(flags: &PreferenceFlags, url: &RouteUrl, session: &SessionIdentity) -> Resolution {
    // Setup gates come first. Redirects replace history so back-navigation
    // cannot land on a half-configured state.
    if !flags.language_selected {
        if url.path == PATH_LANGUAGE {
            return Resolution::stay(Screen::LanguageSelect);
        }
        return Resolution::redirect(Screen::LanguageSelect, NavTarget::replace(PATH_LANGUAGE));
    }
    if !flags.theme_selected {
        if url.path == PATH_THEME {
            return Resolution::stay(Screen::ThemeSelect);
        }
        return Resolution::redirect(Screen::ThemeSelect, NavTarget::replace(PATH_THEME));
    }

    match url.path.as_str() {
        PATH_LANGUAGE => Resolution::stay(Screen::LanguageSelect),
        PATH_THEME => Resolution::stay(Screen::ThemeSelect),
        PATH_ONBOARDING => Resolution::stay(Screen::Onboarding),
        PATH_REQUEST => Resolution::stay(Screen::RequestWizard),
        PATH_DASHBOARD => {
            if flags.current_user.is_some() {
                Resolution::stay(Screen::Dashboard)
            } else {
                resolve_root(flags, url, session)
            }
        }
        PATH_ADMIN => {
            if session.admin_verified {
                Resolution::redirect(
                    Screen::AdminDashboard,
                    NavTarget::replace(PATH_ADMIN_DASHBOARD),
                )
            } else {
                Resolution::stay(Screen::AdminLogin)
            }
        }
        PATH_ADMIN_DASHBOARD => {
            if session.admin_verified {
                Resolution::stay(Screen::AdminDashboard)
            } else {
                Resolution::redirect(Screen::AdminLogin, NavTarget::replace(PATH_ADMIN))
            }
        }
        _ => resolve_root(flags, url, session),
    }
}

fn resolve_root(flags: &PreferenceFlags, url: &RouteUrl, session: &SessionIdentity) -> Resolution {
    match effective_view_type(url, flags) {
        ViewType::Admin => {
            if session.admin_verified {
                Resolution::redirect(
                    Screen::AdminDashboard,
                    NavTarget::replace(PATH_ADMIN_DASHBOARD),
                )
            } else {
                Resolution::redirect(Screen::AdminLogin, NavTarget::replace(PATH_ADMIN))
            }
        }
        ViewType::User => {
            if flags.current_user.is_some() && flags.onboarding_completed {
                Resolution::redirect(
                    Screen::Dashboard,
                    NavTarget::replace(dashboard_url(DashboardTab::Requests)),
                )
            } else {
                Resolution::redirect(Screen::Onboarding, NavTarget::replace(onboarding_url(0)))
            }
        }
    }
}

/// 1-based page fragment → 0-based page index. Out-of-range or unparseable
/// fragments snap to the first page.
#[must_use]
pub fn onboarding_page_from_fragment(fragment: Option<&str>) -> usize {
    fragment
        .and_then(|f| f.parse::<usize>().ok())
        .filter(|n| (1..=ONBOARDING_PAGE_COUNT).contains(n))
        .map_or(0, |n| n - 1)
}

#[must_use]
pub fn onboarding_fragment(page: usize) -> String {
    format!("{}", page.min(ONBOARDING_PAGE_COUNT - 1) + 1)
}

#[must_use]
pub fn onboarding_url(page: usize) -> String {
    format!("{PATH_ONBOARDING}#{}", onboarding_fragment(page))
}

#[must_use]
pub fn dashboard_url(tab: DashboardTab) -> String {
    format!("{PATH_DASHBOARD}#{}", tab.as_fragment())
}
