//! Shell configuration and case data loading

use casefile_core::{CaseSummary, Role};
use eyre::WrapErr;

pub const ENV_ROLE: &str = "CASEFILE_ROLE";
pub const ENV_CASES_PATH: &str = "CASEFILE_CASES_PATH";

/// Cases shown when no external list is configured
const SAMPLE_CASES: &str = include_str!("../assets/cases.json");

#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub role: Role,
    pub cases_path: Option<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            role: Role::Lawyer,
            cases_path: None,
        }
    }
}

impl ShellConfig {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::from_parts(
            std::env::var(ENV_ROLE).ok(),
            std::env::var(ENV_CASES_PATH).ok(),
        )
    }

    /// On the web the role comes from `?role=` in the page URL.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let role = web_sys::window()
            .and_then(|w| w.location().search().ok())
            .and_then(|search| {
                casefile_core::Route::parse(&format!("/{search}"))
                    .query_param("role")
                    .map(str::to_owned)
            });
        Self::from_parts(role, None)
    }

    fn from_parts(role: Option<String>, cases_path: Option<String>) -> Self {
        let role = match role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                tracing::warn!("{e}; falling back to lawyer");
                Role::Lawyer
            }
            None => Role::Lawyer,
        };
        Self {
            role,
            cases_path: cases_path.filter(|p| !p.trim().is_empty()),
        }
    }
}

pub fn parse_cases(raw: &str) -> eyre::Result<Vec<CaseSummary>> {
    serde_json::from_str(raw).wrap_err("case list must be a JSON array of case summaries")
}

pub fn sample_cases() -> eyre::Result<Vec<CaseSummary>> {
    parse_cases(SAMPLE_CASES)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_cases(config: &ShellConfig) -> eyre::Result<Vec<CaseSummary>> {
    match &config.cases_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read case list from {path}"))?;
            parse_cases(&raw)
        }
        None => sample_cases(),
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_cases(_config: &ShellConfig) -> eyre::Result<Vec<CaseSummary>> {
    sample_cases()
}
