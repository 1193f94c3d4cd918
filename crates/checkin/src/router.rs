//! Top-level view selection.
//!
//! The URL fragment picks the view: the admin marker selects the admin
//! console, anything else (including no fragment) the attendee flow. The
//! router is re-evaluated synchronously on every fragment change.

use std::fmt;

use tracing::debug;
use url::Url;

use crate::config::RouterConfig;

/// A top-level view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    /// The attendee registration flow.
    #[default]
    User,
    /// The admin console.
    Admin,
}

impl View {
    /// Page heading.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::User => "Registro de Capacitación",
            Self::Admin => "Panel de Administración",
        }
    }

    /// Line under the heading.
    #[must_use]
    pub fn subtitle(self) -> &'static str {
        match self {
            Self::User => "Complete los pasos para confirmar su asistencia",
            Self::Admin => "Gestione enlaces y vea los registros",
        }
    }

    /// The view the footer link switches to.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::User => Self::Admin,
            Self::Admin => Self::User,
        }
    }

    /// Label of the footer link to the other view.
    #[must_use]
    pub fn footer_link_label(self) -> &'static str {
        match self {
            Self::User => "Ir al panel de administrador",
            Self::Admin => "Ir a la vista de usuario",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Tracks the current view for a fragment-addressed page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    admin_fragment: String,
    view: View,
}

impl Router {
    /// A router on the user view.
    #[must_use]
    pub fn new(admin_fragment: impl Into<String>) -> Self {
        Self {
            admin_fragment: admin_fragment.into(),
            view: View::User,
        }
    }

    /// A router using the configured admin marker.
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new(config.admin_fragment.clone())
    }

    /// A router positioned on the view `url` selects.
    #[must_use]
    pub fn from_url(config: &RouterConfig, url: &Url) -> Self {
        let mut router = Self::from_config(config);
        router.on_fragment_change(url.fragment());
        router
    }

    /// A router positioned on the view `fragment` selects.
    #[must_use]
    pub fn from_fragment(config: &RouterConfig, fragment: Option<&str>) -> Self {
        let mut router = Self::from_config(config);
        router.on_fragment_change(fragment);
        router
    }

    /// The view `fragment` selects. A leading `#` is ignored.
    #[must_use]
    pub fn resolve(&self, fragment: Option<&str>) -> View {
        let fragment = fragment.map(|f| f.strip_prefix('#').unwrap_or(f));
        if fragment == Some(self.admin_fragment.as_str()) {
            View::Admin
        } else {
            View::User
        }
    }

    /// Re-evaluate after the fragment changed, returning the new view.
    pub fn on_fragment_change(&mut self, fragment: Option<&str>) -> View {
        let view = self.resolve(fragment);
        if view != self.view {
            debug!(from = %self.view, to = %view, "view changed");
        }
        self.view = view;
        view
    }

    /// Re-evaluate from a whole URL.
    pub fn on_url_change(&mut self, url: &Url) -> View {
        self.on_fragment_change(url.fragment())
    }

    /// Switch to `view`, returning the fragment the host should set.
    pub fn navigate(&mut self, view: View) -> String {
        let fragment = self.fragment_for(view);
        self.on_fragment_change(Some(fragment.as_str()));
        fragment
    }

    /// The fragment (with `#`, or empty) that selects `view`.
    #[must_use]
    pub fn fragment_for(&self, view: View) -> String {
        match view {
            View::Admin => format!("#{}", self.admin_fragment),
            View::User => String::new(),
        }
    }

    /// The current view.
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Whether the admin console is showing.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.view == View::Admin
    }
}
