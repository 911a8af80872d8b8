//! Decides once, at the entry to a page, whether it may be shown.
//!
//! Protected pages are only reachable through an [AuthorizedView], which can
//! only be built from a logged in session.

use crate::{
    AuthenticatedUser,
    client::{Credential, api::AuthApi, session::Session},
};

/// The pages of the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The dashboard with statistics and the transaction list.
    Dashboard,
    /// The user's profile.
    Profile,
    /// The log-in form.
    LogIn,
    /// The registration form.
    Register,
}

impl Route {
    /// The path of the page.
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Profile => "/profile",
            Route::LogIn => "/login",
            Route::Register => "/register",
        }
    }

    /// Whether the page needs a logged in user.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Profile)
    }
}

/// What a protected page is rendered with.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorizedView {
    /// The page being shown.
    pub route: Route,
    /// The credential for the page's API calls.
    pub credential: Credential,
    /// The logged in user.
    pub user: AuthenticatedUser,
}

/// The outcome of [guard].
#[derive(Debug, Clone, PartialEq)]
pub enum Access {
    /// Show the protected page.
    Authorized(AuthorizedView),
    /// Show the public page.
    Public(Route),
    /// Navigate to this path instead.
    Redirect(&'static str),
}

/// Check whether `route` may be shown for `session`.
///
/// Protected pages redirect to the log-in page without a user. The log-in and
/// registration pages redirect a logged in user to the dashboard.
pub fn guard<A: AuthApi>(session: &Session<A>, route: Route) -> Access {
    match (route.is_protected(), session.user()) {
        (true, Some(user)) => Access::Authorized(AuthorizedView {
            route,
            credential: Credential::new(&user.token),
            user: user.clone(),
        }),
        (true, None) => Access::Redirect(Route::LogIn.path()),
        (false, Some(_)) => Access::Redirect(Route::Dashboard.path()),
        (false, None) => Access::Public(route),
    }
}

#[cfg(test)]
mod tests {
    use crate::client::{
        Credential,
        session::{
            Session,
            fake::{FakeAuthApi, ada},
        },
    };

    use super::{Access, AuthorizedView, Route, guard};

    #[test]
    fn protected_routes_redirect_without_user() {
        let session = Session::new(FakeAuthApi::default());

        for route in [Route::Dashboard, Route::Profile] {
            assert_eq!(guard(&session, route), Access::Redirect("/login"));
        }
    }

    #[test]
    fn protected_routes_are_authorized_with_user() {
        let session = Session::with_user(FakeAuthApi::default(), ada());

        assert_eq!(
            guard(&session, Route::Profile),
            Access::Authorized(AuthorizedView {
                route: Route::Profile,
                credential: Credential::new("ada-token"),
                user: ada(),
            })
        );
    }

    #[test]
    fn public_routes_redirect_logged_in_user_to_dashboard() {
        let logged_in = Session::with_user(FakeAuthApi::default(), ada());
        let logged_out = Session::new(FakeAuthApi::default());

        assert_eq!(guard(&logged_in, Route::LogIn), Access::Redirect("/"));
        assert_eq!(
            guard(&logged_out, Route::Register),
            Access::Public(Route::Register)
        );
    }

    #[test]
    fn logging_out_revokes_access() {
        let mut session = Session::with_user(FakeAuthApi::default(), ada());
        session.log_out();

        assert!(!matches!(
            guard(&session, Route::Dashboard),
            Access::Authorized(_)
        ));
    }
}
