mod common;

use std::sync::atomic::Ordering;

use casefile_core::session::{
    MSG_BUSY, MSG_CONNECTED, MSG_CONNECT_REJECTED, MSG_DISCONNECTED, MSG_EXTENSION_MISSING,
    MSG_SIGNED, MSG_SIGN_NEEDS_ADDRESS, MSG_SIGN_REJECTED,
};
use casefile_core::{ConnectionStatus, NoticeLevel};

use common::{
    account_a, account_b, new_session, signature_bytes, AccountsBehavior, FakeProvider,
    SignBehavior,
};

#[tokio::test]
async fn connect_without_extension_reports_single_error() {
    let (session, notifier) = new_session(FakeProvider::new(AccountsBehavior::Absent));

    let address = session.connect().await;

    assert_eq!(address, None);
    assert_eq!(session.address(), None);
    assert!(!session.is_connected());
    assert!(!session.is_connecting());
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, MSG_EXTENSION_MISSING);
}

#[tokio::test]
async fn connect_adopts_first_granted_account() {
    let (session, notifier) = new_session(FakeProvider::new(AccountsBehavior::Grant(vec![
        account_a(),
        account_b(),
    ])));

    let address = session.connect().await;

    assert_eq!(address, Some(account_a()));
    let snap = session.snapshot();
    assert_eq!(snap.address, Some(account_a()));
    assert!(snap.is_connected());
    assert!(!snap.is_connecting());
    assert_eq!(snap.status, ConnectionStatus::Connected);
    assert_eq!(notifier.notices().last().expect("notice").message, MSG_CONNECTED);
}

#[tokio::test]
async fn declined_connect_returns_to_disconnected() {
    let (session, notifier) = new_session(FakeProvider::new(AccountsBehavior::Reject));

    assert_eq!(session.connect().await, None);

    assert_eq!(session.snapshot().status, ConnectionStatus::Disconnected);
    assert!(!session.is_connecting());
    assert_eq!(notifier.count(NoticeLevel::Error), 1);
    assert_eq!(notifier.notices()[0].message, MSG_CONNECT_REJECTED);
}

#[tokio::test]
async fn empty_grant_is_reported_as_failure() {
    let (session, notifier) = new_session(FakeProvider::new(AccountsBehavior::Grant(vec![])));

    assert_eq!(session.connect().await, None);
    assert!(!session.is_connected());
    assert!(!session.is_connecting());
    assert_eq!(notifier.count(NoticeLevel::Error), 1);
}

#[tokio::test]
async fn sign_without_address_never_reaches_provider() {
    let (session, notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));

    let signature = session.sign_message("hello").await;

    assert_eq!(signature, None);
    assert_eq!(session.provider().sign_calls.load(Ordering::SeqCst), 0);
    let notices = notifier.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].message, MSG_SIGN_NEEDS_ADDRESS);
}

#[tokio::test]
async fn sign_returns_signature_and_keeps_address() {
    let (session, _notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");
    session
        .provider()
        .set_sign(SignBehavior::Sign(signature_bytes(7)));

    let signature = session.sign_message("case 42 evidence").await;

    assert_eq!(signature, Some(signature_bytes(7)));
    assert_eq!(session.address(), Some(account_a()));
    assert!(!session.is_signing());
    assert_eq!(session.snapshot().status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn sign_rejection_clears_signing_flag() {
    let (session, notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");
    session.provider().set_sign(SignBehavior::Reject);

    assert_eq!(session.sign_message("hello").await, None);

    assert!(!session.is_signing());
    assert!(session.is_connected());
    let last = notifier.notices().pop().expect("notice");
    assert_eq!(last.level, NoticeLevel::Error);
    assert_eq!(last.message, MSG_SIGN_REJECTED);
}

#[tokio::test]
async fn other_provider_errors_are_reported_verbatim() {
    let (session, notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");
    session
        .provider()
        .set_sign(SignBehavior::Fail("Internal JSON-RPC error.".to_owned()));

    assert_eq!(session.sign_message("hello").await, None);
    assert_eq!(
        notifier.notices().pop().expect("notice").message,
        "Internal JSON-RPC error."
    );
}

#[tokio::test]
async fn empty_accounts_event_disconnects_with_info() {
    let (session, notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");
    let _sub = session.attach().expect("attach");

    session.provider().emit_accounts_changed(&[]);

    assert_eq!(session.address(), None);
    assert!(!session.is_connected());
    let last = notifier.notices().pop().expect("notice");
    assert_eq!(last.level, NoticeLevel::Info);
    assert_eq!(last.message, MSG_DISCONNECTED);
}

#[tokio::test]
async fn non_empty_accounts_event_adopts_first_entry() {
    let (session, notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");
    let _sub = session.attach().expect("attach");

    session
        .provider()
        .emit_accounts_changed(&[account_b(), account_a()]);

    assert_eq!(session.address(), Some(account_b()));
    assert!(session.is_connected());
    let last = notifier.notices().pop().expect("notice");
    assert_eq!(last.level, NoticeLevel::Info);
    assert!(last.message.starts_with("Switched to account 0x2000"));
}

#[tokio::test]
async fn accounts_event_while_disconnected_connects() {
    let (session, _notifier) = new_session(FakeProvider::new(AccountsBehavior::Absent));

    session.on_accounts_changed(&[account_a()]);

    assert_eq!(session.address(), Some(account_a()));
    assert_eq!(session.snapshot().status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn disconnect_always_clears_state() {
    let (session, _notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));

    session.disconnect();
    assert_eq!(session.address(), None);
    assert!(!session.is_connected());

    session.connect().await.expect("connected");
    session.disconnect();
    assert_eq!(session.address(), None);
    assert!(!session.is_connected());
    assert_eq!(session.snapshot().status, ConnectionStatus::Disconnected);
    assert_eq!(session.provider().revoke_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disconnect_and_revoke_asks_provider() {
    let (session, _notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    session.connect().await.expect("connected");

    session.disconnect_and_revoke().await;

    assert!(!session.is_connected());
    assert_eq!(session.provider().revoke_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn overlapping_connect_is_refused() {
    let (session, notifier) =
        new_session(FakeProvider::gated(AccountsBehavior::Grant(vec![account_a()])));

    let (first, second) = tokio::join!(session.connect(), async {
        let refused = session.connect().await;
        assert!(session.is_connecting());
        session.provider().release();
        refused
    });

    assert_eq!(first, Some(account_a()));
    assert_eq!(second, None);
    assert_eq!(session.provider().request_calls.load(Ordering::SeqCst), 1);
    assert!(notifier
        .notices()
        .iter()
        .any(|n| n.level == NoticeLevel::Info && n.message == MSG_BUSY));
    assert!(session.is_connected());
    assert!(!session.is_connecting());
}

#[tokio::test]
async fn disconnect_during_connect_discards_late_grant() {
    let (session, notifier) =
        new_session(FakeProvider::gated(AccountsBehavior::Grant(vec![account_a()])));

    let (result, ()) = tokio::join!(session.connect(), async {
        session.disconnect();
        session.provider().release();
    });

    assert_eq!(result, None);
    assert_eq!(session.address(), None);
    assert_eq!(session.snapshot().status, ConnectionStatus::Disconnected);
    assert!(!notifier.notices().iter().any(|n| n.message == MSG_CONNECTED));
}

#[tokio::test]
async fn overlapping_sign_is_refused() {
    let (session, notifier) = new_session(
        FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])).gate_signing(),
    );
    session.connect().await.expect("connect");

    let (first, second) = tokio::join!(session.sign_message("manifest"), async {
        let refused = session.sign_message("manifest again").await;
        assert!(session.is_signing());
        session.provider().release_sign();
        refused
    });

    assert_eq!(first, Some(signature_bytes(0xab)));
    assert_eq!(second, None);
    assert_eq!(session.provider().sign_calls.load(Ordering::SeqCst), 1);
    let busy: Vec<_> = notifier
        .notices()
        .into_iter()
        .filter(|n| n.message == MSG_BUSY)
        .collect();
    assert_eq!(busy.len(), 1);
    assert_eq!(busy[0].level, NoticeLevel::Info);
    assert_eq!(session.snapshot().status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn disconnect_during_sign_discards_late_signature() {
    let (session, notifier) = new_session(
        FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])).gate_signing(),
    );
    session.connect().await.expect("connect");

    let (result, ()) = tokio::join!(session.sign_message("manifest"), async {
        session.disconnect();
        session.provider().release_sign();
    });

    assert_eq!(result, None);
    assert_eq!(session.address(), None);
    assert_eq!(session.snapshot().status, ConnectionStatus::Disconnected);
    assert!(!notifier.notices().iter().any(|n| n.message == MSG_SIGNED));
}

#[tokio::test]
async fn dropping_subscription_removes_its_listener() {
    let (session, _notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));

    let sub = session.attach().expect("attach");
    let id = sub.id().expect("listener id");
    assert_eq!(session.provider().listener_ids(), vec![id]);

    drop(sub);
    assert!(session.provider().listener_ids().is_empty());

    session.provider().emit_accounts_changed(&[account_b()]);
    assert_eq!(session.address(), None);
}

#[tokio::test]
async fn explicit_unsubscribe_detaches_once() {
    let (session, _notifier) =
        new_session(FakeProvider::new(AccountsBehavior::Grant(vec![account_a()])));
    let first = session.attach().expect("attach first");
    let second = session.attach().expect("attach second");
    let keep = second.id().expect("second id");

    first.unsubscribe().expect("unsubscribe");

    assert_eq!(session.provider().listener_ids(), vec![keep]);
    drop(second);
}

#[tokio::test]
async fn restore_uses_authorized_accounts_without_prompting() {
    let provider = FakeProvider::new(AccountsBehavior::Grant(vec![account_b()]));
    provider.set_authorized(vec![account_a()]);
    let (session, notifier) = new_session(provider);

    let restored = session.restore().await;

    assert_eq!(restored, Some(account_a()));
    assert!(session.is_connected());
    assert_eq!(session.provider().request_calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.provider().authorized_calls.load(Ordering::SeqCst), 1);
    assert!(notifier.notices().is_empty());
}

#[tokio::test]
async fn restore_without_extension_is_silent() {
    let (session, notifier) = new_session(FakeProvider::new(AccountsBehavior::Absent));

    assert_eq!(session.restore().await, None);
    assert!(!session.is_connected());
    assert!(notifier.notices().is_empty());
}
