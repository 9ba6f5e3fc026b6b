// ── Session-gated navigation ──
//
// Picks the screen tree from the session: splash while unknown, the
// auth screens while signed out, the main screens while signed in. Any
// request for a route outside the active tree lands on that tree's home.

use std::str::FromStr;

use tokio::sync::watch;
use tracing::debug;

use crate::model::Session;
use crate::stream::Feed;

/// Top-level screen trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ScreenTree {
    Splash,
    Auth,
    Main,
}

impl ScreenTree {
    pub fn for_session(session: &Session) -> Self {
        match session {
            Session::Unknown => Self::Splash,
            Session::SignedOut => Self::Auth,
            Session::SignedIn(_) => Self::Main,
        }
    }

    /// Where this tree starts.
    pub fn home(self) -> Route {
        match self {
            Self::Splash => Route::Splash,
            Self::Auth => Route::Login,
            Self::Main => Route::Products,
        }
    }
}

/// Individual screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum Route {
    Splash,
    Login,
    Signup,
    ForgotPassword,
    Products,
    AddProduct,
}

impl Route {
    pub fn tree(self) -> ScreenTree {
        match self {
            Self::Splash => ScreenTree::Splash,
            Self::Login | Self::Signup | Self::ForgotPassword => ScreenTree::Auth,
            Self::Products | Self::AddProduct => ScreenTree::Main,
        }
    }

    /// Parse a route name; unknown names resolve to the splash screen.
    pub fn resolve(name: &str) -> Self {
        Self::from_str(name.trim().trim_start_matches('/')).unwrap_or(Self::Splash)
    }
}

/// Current route, kept consistent with the session.
pub struct Navigator {
    session: watch::Sender<Session>,
    route: watch::Sender<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        let (session, _) = watch::channel(Session::Unknown);
        let (route, _) = watch::channel(Route::Splash);
        Self { session, route }
    }

    /// Apply a session change. Switching trees resets to the new tree's
    /// home; staying in the same tree keeps the current route.
    pub fn on_session(&self, session: &Session) -> Route {
        self.session.send_replace(session.clone());
        let tree = ScreenTree::for_session(session);
        let current = *self.route.borrow();
        if current.tree() == tree {
            return current;
        }
        let home = tree.home();
        debug!(from = %current, to = %home, "screen tree switched");
        self.route.send_replace(home);
        home
    }

    /// Navigate within the active tree. Returns the route actually shown.
    pub fn navigate(&self, route: Route) -> Route {
        let tree = ScreenTree::for_session(&self.session.borrow());
        let target = if route.tree() == tree { route } else { tree.home() };
        self.route.send_replace(target);
        target
    }

    pub fn current(&self) -> Route {
        *self.route.borrow()
    }

    pub fn tree(&self) -> ScreenTree {
        self.current().tree()
    }

    pub fn feed(&self) -> Feed<Route> {
        Feed::new(self.route.subscribe())
    }
}
