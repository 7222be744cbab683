use std::sync::Arc;

use alloy::primitives::{Address, Bytes};
use thiserror::Error;

use crate::domain::{Notice, Route};

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected ({code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("policy error: {0}")]
    Policy(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

impl PortError {
    pub fn user_rejected(message: impl Into<String>) -> Self {
        PortError::Rejected {
            code: USER_REJECTED_CODE,
            message: message.into(),
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, PortError::Rejected { code, .. } if *code == USER_REJECTED_CODE)
    }

    pub fn is_missing_capability(&self) -> bool {
        matches!(self, PortError::NotFound(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

pub type AccountsListener = Arc<dyn Fn(&[Address]) + Send + Sync>;

/// Browser wallet capability (EIP-1193). Futures are awaited on a single-threaded loop.
#[allow(async_fn_in_trait)]
pub trait WalletProviderPort {
    /// Accounts already authorized for this origin; never prompts.
    async fn authorized_accounts(&self) -> Result<Vec<Address>, PortError>;
    /// Prompting account request; may be declined by the user.
    async fn request_accounts(&self) -> Result<Vec<Address>, PortError>;
    async fn personal_sign(&self, message: &str, signer: Address) -> Result<Bytes, PortError>;
    async fn revoke_permissions(&self) -> Result<(), PortError>;
    fn subscribe_accounts_changed(
        &self,
        listener: AccountsListener,
    ) -> Result<ListenerId, PortError>;
    fn unsubscribe(&self, id: ListenerId) -> Result<(), PortError>;
}

pub trait NotifierPort {
    fn notify(&self, notice: Notice);
}

pub trait RouterPort {
    fn navigate(&self, route: Route);
}

impl<T: NotifierPort + ?Sized> NotifierPort for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice)
    }
}

impl<T: RouterPort + ?Sized> RouterPort for Arc<T> {
    fn navigate(&self, route: Route) {
        (**self).navigate(route)
    }
}
