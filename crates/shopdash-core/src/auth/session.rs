use serde::Serialize;

use crate::models::{Transactions, User};

/// In-memory view of who is signed in.
///
/// Published through a `watch` channel by `SessionManager`; front ends render
/// from the latest value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub user: Option<User>,
    pub transactions: Option<Transactions>,
    /// True while a startup restoration or an explicit login is in flight
    pub is_loading: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Which screen a front end should show for this state
    pub fn view(&self) -> SessionView {
        if self.is_loading {
            SessionView::Loading
        } else if self.is_authenticated() {
            SessionView::Dashboard
        } else {
            SessionView::Login
        }
    }

    pub(crate) fn signed_out(&mut self) {
        self.user = None;
        self.transactions = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView {
    Loading,
    Login,
    Dashboard,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: "1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_loading_gates_view() {
        let state = SessionState {
            user: Some(user()),
            transactions: None,
            is_loading: true,
        };
        assert_eq!(state.view(), SessionView::Loading);
    }

    #[test]
    fn test_view_follows_user() {
        let mut state = SessionState::default();
        assert_eq!(state.view(), SessionView::Login);
        assert!(!state.is_authenticated());

        state.user = Some(user());
        assert_eq!(state.view(), SessionView::Dashboard);

        state.signed_out();
        assert!(!state.is_authenticated());
        assert!(state.transactions.is_none());
    }
}
