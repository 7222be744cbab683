use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Signing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletAction {
    ConnectStart,
    ConnectSuccess,
    ConnectFailure,
    SignStart,
    SignFinish,
    AccountsChanged { empty: bool },
    Disconnect,
    Restore { found: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal wallet transition: {from:?} --{action:?}-->")]
pub struct TransitionError {
    pub from: ConnectionStatus,
    pub action: WalletAction,
}

pub fn wallet_transition(
    from: ConnectionStatus,
    action: WalletAction,
) -> Result<(ConnectionStatus, &'static str), TransitionError> {
    use ConnectionStatus as S;
    use WalletAction as A;

    let next = match (from, action) {
        (_, A::Disconnect) => (S::Disconnected, "local disconnect"),
        (S::Disconnected | S::Connected, A::ConnectStart) => (S::Connecting, "account request issued"),
        (S::Connecting, A::ConnectSuccess) => (S::Connected, "accounts granted"),
        (S::Connecting, A::ConnectFailure) => (S::Disconnected, "account request failed"),
        (S::Connected, A::SignStart) => (S::Signing, "signature request issued"),
        (S::Signing, A::SignFinish) => (S::Connected, "signature request settled"),
        (_, A::AccountsChanged { empty: true }) => (S::Disconnected, "provider reported no accounts"),
        (S::Disconnected | S::Connected, A::AccountsChanged { empty: false }) => {
            (S::Connected, "provider switched account")
        }
        (S::Connecting | S::Signing, A::AccountsChanged { empty: false }) => {
            (from, "provider switched account mid-request")
        }
        (S::Disconnected | S::Connected, A::Restore { found: true }) => {
            (S::Connected, "authorized account restored")
        }
        (S::Disconnected | S::Connected, A::Restore { found: false }) => {
            (S::Disconnected, "no authorized account")
        }
        _ => return Err(TransitionError { from, action }),
    };
    Ok(next)
}
