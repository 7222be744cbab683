#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes};
use tokio::sync::Notify;

use casefile_core::{
    AccountsListener, ListenerId, Notice, NoticeLevel, NotifierPort, PortError, Route, RouterPort,
    WalletProviderPort, WalletSession,
};

#[derive(Debug, Clone)]
pub enum AccountsBehavior {
    Absent,
    Grant(Vec<Address>),
    Reject,
}

#[derive(Debug, Clone)]
pub enum SignBehavior {
    Sign(Bytes),
    Reject,
    Fail(String),
}

pub struct FakeProvider {
    pub accounts: Mutex<AccountsBehavior>,
    pub authorized: Mutex<Vec<Address>>,
    pub sign: Mutex<SignBehavior>,
    pub gate: Option<Notify>,
    pub sign_gate: Option<Notify>,
    pub request_calls: AtomicUsize,
    pub authorized_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub revoke_calls: AtomicUsize,
    listeners: Mutex<Vec<(ListenerId, AccountsListener)>>,
    next_listener: AtomicU64,
}

impl FakeProvider {
    pub fn new(accounts: AccountsBehavior) -> Self {
        Self {
            accounts: Mutex::new(accounts),
            authorized: Mutex::new(Vec::new()),
            sign: Mutex::new(SignBehavior::Sign(signature_bytes(0xab))),
            gate: None,
            sign_gate: None,
            request_calls: AtomicUsize::new(0),
            authorized_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            revoke_calls: AtomicUsize::new(0),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
        }
    }

    pub fn gated(accounts: AccountsBehavior) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(accounts)
        }
    }

    /// Hold every `personal_sign` until [`FakeProvider::release_sign`].
    pub fn gate_signing(self) -> Self {
        Self {
            sign_gate: Some(Notify::new()),
            ..self
        }
    }

    pub fn release_sign(&self) {
        if let Some(gate) = &self.sign_gate {
            gate.notify_one();
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_sign(&self, behavior: SignBehavior) {
        *self.sign.lock().expect("sign lock") = behavior;
    }

    pub fn set_authorized(&self, accounts: Vec<Address>) {
        *self.authorized.lock().expect("authorized lock") = accounts;
    }

    pub fn listener_ids(&self) -> Vec<ListenerId> {
        self.listeners
            .lock()
            .expect("listeners lock")
            .iter()
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn emit_accounts_changed(&self, accounts: &[Address]) {
        let listeners: Vec<AccountsListener> = self
            .listeners
            .lock()
            .expect("listeners lock")
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(accounts);
        }
    }
}

impl WalletProviderPort for FakeProvider {
    async fn authorized_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.authorized_calls.fetch_add(1, Ordering::SeqCst);
        if matches!(*self.accounts.lock().expect("accounts lock"), AccountsBehavior::Absent) {
            return Err(PortError::NotFound("window.ethereum missing".to_owned()));
        }
        Ok(self.authorized.lock().expect("authorized lock").clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, PortError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let behavior = self.accounts.lock().expect("accounts lock").clone();
        match behavior {
            AccountsBehavior::Absent => {
                Err(PortError::NotFound("window.ethereum missing".to_owned()))
            }
            AccountsBehavior::Grant(accounts) => Ok(accounts),
            AccountsBehavior::Reject => Err(PortError::user_rejected("User rejected the request.")),
        }
    }

    async fn personal_sign(&self, _message: &str, _signer: Address) -> Result<Bytes, PortError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.sign_gate {
            gate.notified().await;
        }
        match self.sign.lock().expect("sign lock").clone() {
            SignBehavior::Sign(sig) => Ok(sig),
            SignBehavior::Reject => Err(PortError::user_rejected("User denied message signature.")),
            SignBehavior::Fail(message) => Err(PortError::Rejected {
                code: -32603,
                message,
            }),
        }
    }

    async fn revoke_permissions(&self) -> Result<(), PortError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe_accounts_changed(
        &self,
        listener: AccountsListener,
    ) -> Result<ListenerId, PortError> {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::SeqCst) + 1);
        self.listeners
            .lock()
            .expect("listeners lock")
            .push((id, listener));
        Ok(id)
    }

    fn unsubscribe(&self, id: ListenerId) -> Result<(), PortError> {
        let mut g = self.listeners.lock().expect("listeners lock");
        let before = g.len();
        g.retain(|(existing, _)| *existing != id);
        if g.len() == before {
            return Err(PortError::NotFound(format!("listener {id:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().expect("notices lock").clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        self.notices().iter().filter(|n| n.level == level).count()
    }
}

impl NotifierPort for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().expect("notices lock").push(notice);
    }
}

#[derive(Debug, Default)]
pub struct RecordingRouter {
    routes: Mutex<Vec<Route>>,
}

impl RecordingRouter {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("routes lock").clone()
    }
}

impl RouterPort for RecordingRouter {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("routes lock").push(route);
    }
}

pub type TestSession = WalletSession<FakeProvider, Arc<RecordingNotifier>>;

pub fn new_session(provider: FakeProvider) -> (TestSession, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    (WalletSession::new(provider, Arc::clone(&notifier)), notifier)
}

pub fn account_a() -> Address {
    "0x1000000000000000000000000000000000000001"
        .parse()
        .expect("account a")
}

pub fn account_b() -> Address {
    "0x2000000000000000000000000000000000000002"
        .parse()
        .expect("account b")
}

pub fn signature_bytes(seed: u8) -> Bytes {
    let mut v = vec![seed; 65];
    v[64] = 27;
    Bytes::from(v)
}
