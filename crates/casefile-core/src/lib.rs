pub mod case_card;
pub mod domain;
pub mod ports;
pub mod session;
pub mod state_machine;

pub use case_card::{CaseAction, CaseCard};
pub use domain::{
    evidence_label, short_address, CaseSummary, Notice, NoticeLevel, Role, Route, StatusClass,
};
pub use ports::{
    AccountsListener, ListenerId, NotifierPort, PortError, RouterPort, WalletProviderPort,
    USER_REJECTED_CODE,
};
pub use session::{AccountsSubscription, WalletSession, WalletSnapshot};
pub use state_machine::{wallet_transition, ConnectionStatus, TransitionError, WalletAction};
