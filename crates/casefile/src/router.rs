//! In-app router backing the case card navigation

use std::sync::{Mutex, PoisonError};

use casefile_core::case_card::{case_id_from_path, CASE_DETAILS_PREFIX, CASE_TAB_PARAM, UPLOAD_TAB};
use casefile_core::{Route, RouterPort};

/// Pages the shell knows how to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Page {
    CaseList,
    CaseDetails { case_id: String },
    EvidenceUpload { case_id: String },
    NotFound { href: String },
}

impl Page {
    pub fn from_route(route: &Route) -> Self {
        let path = route.path.trim_end_matches('/');
        if path.is_empty() || path == CASE_DETAILS_PREFIX {
            return Page::CaseList;
        }
        match case_id_from_path(path) {
            Some(case_id) if route.query_param(CASE_TAB_PARAM) == Some(UPLOAD_TAB) => {
                Page::EvidenceUpload { case_id }
            }
            Some(case_id) => Page::CaseDetails { case_id },
            None => Page::NotFound { href: route.href() },
        }
    }
}

#[derive(Debug, Default)]
pub struct AppRouter {
    history: Mutex<Vec<Route>>,
}

impl AppRouter {
    pub fn current(&self) -> Route {
        self.history()
            .last()
            .cloned()
            .unwrap_or_else(|| Route::new(CASE_DETAILS_PREFIX))
    }

    pub fn page(&self) -> Page {
        Page::from_route(&self.current())
    }

    pub fn can_go_back(&self) -> bool {
        !self.history().is_empty()
    }

    pub fn back(&self) {
        self.history().pop();
    }

    pub fn home(&self) {
        self.history().clear();
    }

    fn history(&self) -> std::sync::MutexGuard<'_, Vec<Route>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RouterPort for AppRouter {
    fn navigate(&self, route: Route) {
        tracing::debug!(href = %route, "navigate");
        self.history().push(route);
    }
}
