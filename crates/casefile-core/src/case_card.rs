use crate::domain::{evidence_label, CaseSummary, Role, Route, StatusClass};
use crate::ports::{PortError, RouterPort};

pub const CASE_DETAILS_PREFIX: &str = "/cases";
/// Query parameter selecting a tab on the case page.
pub const CASE_TAB_PARAM: &str = "tab";
pub const UPLOAD_TAB: &str = "upload";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseAction {
    ViewDetails,
    UploadEvidence,
}

impl CaseAction {
    pub fn label(self) -> &'static str {
        match self {
            CaseAction::ViewDetails => "View Details",
            CaseAction::UploadEvidence => "Upload Evidence",
        }
    }
}

/// View model behind one case card. Pure apart from `trigger`.
#[derive(Debug, Clone, Copy)]
pub struct CaseCard<'a> {
    pub case: &'a CaseSummary,
    pub role: Role,
}

impl<'a> CaseCard<'a> {
    pub fn new(case: &'a CaseSummary, role: Role) -> Self {
        Self { case, role }
    }

    pub fn status_class(&self) -> StatusClass {
        StatusClass::for_status(&self.case.status)
    }

    pub fn evidence_label(&self) -> String {
        evidence_label(self.case.evidence_count)
    }

    pub fn actions(&self) -> Vec<CaseAction> {
        let mut actions = vec![CaseAction::ViewDetails];
        if self.role == Role::Lawyer {
            actions.push(CaseAction::UploadEvidence);
        }
        actions
    }

    pub fn offers(&self, action: CaseAction) -> bool {
        self.actions().contains(&action)
    }

    pub fn route_for(&self, action: CaseAction) -> Route {
        let page = Route::new(case_path(&self.case.id));
        match action {
            CaseAction::ViewDetails => page,
            CaseAction::UploadEvidence => page.with_query(CASE_TAB_PARAM, UPLOAD_TAB),
        }
    }

    pub fn trigger(&self, action: CaseAction, router: &impl RouterPort) -> Result<(), PortError> {
        if !self.offers(action) {
            return Err(PortError::Policy(format!(
                "{} is not available to role {}",
                action.label(),
                self.role
            )));
        }
        let route = self.route_for(action);
        tracing::debug!(case_id = %self.case.id, route = %route, "case card navigation");
        router.navigate(route);
        Ok(())
    }
}

/// `/cases/{id}` with the id percent-encoded as a single path segment.
pub fn case_path(case_id: &str) -> String {
    format!("{CASE_DETAILS_PREFIX}/{}", urlencoding::encode(case_id))
}

/// Inverse of [`case_path`]; `None` for anything but a single non-empty segment.
pub fn case_id_from_path(path: &str) -> Option<String> {
    let segment = path
        .strip_prefix(CASE_DETAILS_PREFIX)?
        .strip_prefix('/')?
        .trim_end_matches('/');
    if segment.is_empty() || segment.contains('/') {
        return None;
    }
    urlencoding::decode(segment).ok().map(|id| id.into_owned())
}
