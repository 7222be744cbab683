//! Wallet session context.
//!
//! One `WalletSession` is constructed by the shell at startup and handed down by
//! reference; there is no ambient lookup. All provider calls go through
//! [`WalletProviderPort`], all user feedback through [`NotifierPort`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::domain::{short_address, Notice};
use crate::ports::{AccountsListener, ListenerId, NotifierPort, PortError, WalletProviderPort};
use crate::state_machine::{wallet_transition, ConnectionStatus, TransitionError, WalletAction};

pub const MSG_EXTENSION_MISSING: &str = "Wallet extension not found. Install MetaMask to continue.";
pub const MSG_CONNECT_REJECTED: &str = "Connection request was rejected.";
pub const MSG_NO_ACCOUNTS: &str = "Wallet returned no accounts.";
pub const MSG_CONNECTED: &str = "Wallet connected";
pub const MSG_DISCONNECTED: &str = "Wallet disconnected";
pub const MSG_SIGN_NEEDS_ADDRESS: &str = "Connect a wallet before signing.";
pub const MSG_SIGN_REJECTED: &str = "Signature request was rejected.";
pub const MSG_SIGNED: &str = "Message signed";
pub const MSG_BUSY: &str = "A wallet request is already in progress.";

/// Read-only view of the session handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WalletSnapshot {
    pub address: Option<Address>,
    pub status: ConnectionStatus,
}

impl WalletSnapshot {
    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.status == ConnectionStatus::Connecting
    }

    pub fn is_signing(&self) -> bool {
        self.status == ConnectionStatus::Signing
    }
}

#[derive(Debug, Default)]
struct WalletState {
    status: ConnectionStatus,
    address: Option<Address>,
    // Bumped whenever local state is cleared; requests issued under an older
    // generation must not write back.
    generation: u64,
}

struct SessionInner<P, N> {
    provider: P,
    notifier: N,
    state: Mutex<WalletState>,
}

pub struct WalletSession<P, N> {
    inner: Arc<SessionInner<P, N>>,
}

impl<P, N> Clone for WalletSession<P, N> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, N> WalletSession<P, N>
where
    P: WalletProviderPort,
    N: NotifierPort,
{
    pub fn new(provider: P, notifier: N) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                provider,
                notifier,
                state: Mutex::new(WalletState::default()),
            }),
        }
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn notifier(&self) -> &N {
        &self.inner.notifier
    }

    pub fn snapshot(&self) -> WalletSnapshot {
        let g = self.lock();
        WalletSnapshot {
            address: g.address,
            status: g.status,
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.lock().address
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot().is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.snapshot().is_connecting()
    }

    pub fn is_signing(&self) -> bool {
        self.snapshot().is_signing()
    }

    /// Re-derive the address from already-authorized accounts without prompting.
    pub async fn restore(&self) -> Option<Address> {
        let generation = self.lock().generation;
        match self.inner.provider.authorized_accounts().await {
            Ok(accounts) => {
                let first = accounts.first().copied();
                let applied = self.settle(
                    generation,
                    WalletAction::Restore {
                        found: first.is_some(),
                    },
                    |s| s.address = first,
                );
                if applied {
                    first
                } else {
                    None
                }
            }
            Err(e) if e.is_missing_capability() => {
                tracing::debug!("restore skipped: {e}");
                None
            }
            Err(e) => {
                tracing::warn!("restore failed: {e}");
                None
            }
        }
    }

    /// Prompt the provider for account access.
    ///
    /// A second call while one is in flight is rejected without reaching the
    /// provider. Failures are reported through the notifier and never escape.
    pub async fn connect(&self) -> Option<Address> {
        let generation = match self.apply(WalletAction::ConnectStart, |_| {}) {
            Ok(generation) => generation,
            Err(e) => {
                tracing::debug!("connect refused: {e}");
                self.notify(Notice::info(MSG_BUSY));
                return None;
            }
        };

        match self.inner.provider.request_accounts().await {
            Ok(accounts) => match accounts.first().copied() {
                Some(address) => {
                    if self.settle(generation, WalletAction::ConnectSuccess, |s| {
                        s.address = Some(address)
                    }) {
                        self.notify(Notice::success(MSG_CONNECTED));
                        Some(address)
                    } else {
                        None
                    }
                }
                None => {
                    self.settle(generation, WalletAction::ConnectFailure, |s| s.address = None);
                    self.notify(Notice::error(MSG_NO_ACCOUNTS));
                    None
                }
            },
            Err(e) => {
                tracing::warn!("connect failed: {e}");
                self.settle(generation, WalletAction::ConnectFailure, |s| s.address = None);
                self.notify(Notice::error(connect_error_message(&e)));
                None
            }
        }
    }

    /// Clear local state. Extension-side permissions are left untouched.
    pub fn disconnect(&self) {
        let cleared = self.apply(WalletAction::Disconnect, |s| s.address = None);
        if let Err(e) = cleared {
            tracing::error!("disconnect rejected by transition table: {e}");
        }
        self.notify(Notice::info(MSG_DISCONNECTED));
    }

    /// Clear local state, then ask the provider to drop its permission grant.
    pub async fn disconnect_and_revoke(&self) {
        self.disconnect();
        match self.inner.provider.revoke_permissions().await {
            Ok(()) => tracing::info!("provider permissions revoked"),
            Err(PortError::NotImplemented(what)) => {
                tracing::debug!("permission revocation unsupported: {what}")
            }
            Err(e) => tracing::warn!("permission revocation failed: {e}"),
        }
    }

    /// Request a `personal_sign` signature from the connected address.
    pub async fn sign_message(&self, message: &str) -> Option<Bytes> {
        let Some(signer) = self.address() else {
            self.notify(Notice::error(MSG_SIGN_NEEDS_ADDRESS));
            return None;
        };
        let generation = match self.apply(WalletAction::SignStart, |_| {}) {
            Ok(generation) => generation,
            Err(e) => {
                tracing::debug!("sign refused: {e}");
                self.notify(Notice::info(MSG_BUSY));
                return None;
            }
        };

        let result = self.inner.provider.personal_sign(message, signer).await;
        if !self.settle(generation, WalletAction::SignFinish, |_| {}) {
            return None;
        }
        match result {
            Ok(signature) => {
                self.notify(Notice::success(MSG_SIGNED));
                Some(signature)
            }
            Err(e) => {
                tracing::warn!("sign failed: {e}");
                self.notify(Notice::error(sign_error_message(&e)));
                None
            }
        }
    }

    /// Apply an externally reported account list.
    pub fn on_accounts_changed(&self, accounts: &[Address]) {
        let previous = self.address();
        match accounts.first().copied() {
            None => {
                if let Err(e) = self.apply(WalletAction::AccountsChanged { empty: true }, |s| {
                    s.address = None
                }) {
                    tracing::error!("accounts reset rejected by transition table: {e}");
                }
                self.notify(Notice::info(MSG_DISCONNECTED));
            }
            Some(address) => {
                match self.apply(WalletAction::AccountsChanged { empty: false }, |s| {
                    s.address = Some(address)
                }) {
                    Ok(_) if previous != Some(address) => self.notify(Notice::info(format!(
                        "Switched to account {}",
                        short_address(address)
                    ))),
                    Ok(_) => {}
                    Err(e) => tracing::error!("account switch rejected by transition table: {e}"),
                }
            }
        }
    }

    fn apply(
        &self,
        action: WalletAction,
        update: impl FnOnce(&mut WalletState),
    ) -> Result<u64, TransitionError> {
        let mut g = self.lock();
        let from = g.status;
        let (to, reason) = wallet_transition(from, action)?;
        g.status = to;
        update(&mut *g);
        if matches!(
            action,
            WalletAction::Disconnect | WalletAction::AccountsChanged { empty: true }
        ) {
            g.generation = g.generation.saturating_add(1);
        }
        tracing::info!(?from, ?to, reason, "wallet transition");
        Ok(g.generation)
    }

    // Write back the outcome of a request issued under `generation`. Returns
    // false when the result is stale or no longer legal for the current status.
    fn settle(
        &self,
        generation: u64,
        action: WalletAction,
        update: impl FnOnce(&mut WalletState),
    ) -> bool {
        if self.lock().generation != generation {
            tracing::info!(?action, "discarding result issued before local reset");
            return false;
        }
        match self.apply(action, update) {
            Ok(_) => true,
            Err(e) => {
                tracing::info!("discarding result: {e}");
                false
            }
        }
    }

    fn notify(&self, notice: Notice) {
        self.inner.notifier.notify(notice);
    }

    fn lock(&self) -> MutexGuard<'_, WalletState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, N> WalletSession<P, N>
where
    P: WalletProviderPort + Send + Sync + 'static,
    N: NotifierPort + Send + Sync + 'static,
{
    /// Subscribe to the provider's account-change notifications. Dropping the
    /// returned handle removes exactly the listener registered here.
    pub fn attach(&self) -> Result<AccountsSubscription<P, N>, PortError> {
        let weak = Arc::downgrade(&self.inner);
        let listener: AccountsListener = Arc::new(move |accounts: &[Address]| {
            if let Some(inner) = weak.upgrade() {
                WalletSession { inner }.on_accounts_changed(accounts);
            }
        });
        let id = self.inner.provider.subscribe_accounts_changed(listener)?;
        tracing::debug!(?id, "accountsChanged listener attached");
        Ok(AccountsSubscription {
            session: Arc::downgrade(&self.inner),
            id: Some(id),
        })
    }
}

pub struct AccountsSubscription<P, N>
where
    P: WalletProviderPort,
{
    session: Weak<SessionInner<P, N>>,
    id: Option<ListenerId>,
}

impl<P, N> AccountsSubscription<P, N>
where
    P: WalletProviderPort,
{
    pub fn id(&self) -> Option<ListenerId> {
        self.id
    }

    pub fn unsubscribe(mut self) -> Result<(), PortError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), PortError> {
        let Some(id) = self.id.take() else {
            return Ok(());
        };
        match self.session.upgrade() {
            Some(inner) => {
                tracing::debug!(?id, "accountsChanged listener detached");
                inner.provider.unsubscribe(id)
            }
            None => Ok(()),
        }
    }
}

impl<P, N> Drop for AccountsSubscription<P, N>
where
    P: WalletProviderPort,
{
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!("failed to detach accountsChanged listener: {e}");
        }
    }
}

fn connect_error_message(e: &PortError) -> String {
    match e {
        PortError::NotFound(_) => MSG_EXTENSION_MISSING.to_owned(),
        e if e.is_user_rejection() => MSG_CONNECT_REJECTED.to_owned(),
        PortError::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

fn sign_error_message(e: &PortError) -> String {
    match e {
        PortError::NotFound(_) => MSG_EXTENSION_MISSING.to_owned(),
        e if e.is_user_rejection() => MSG_SIGN_REJECTED.to_owned(),
        PortError::Rejected { message, .. } => message.clone(),
        other => other.to_string(),
    }
}
