//! Session lifecycle: discovery, teardown, cross-connection state and the
//! action mailbox.

use std::thread;

use ancs::app::mailbox::ActionMailbox;
use ancs::app::ports::{AttHandle, SubscriptionKind, TimerId};
use ancs::app::session::AncsSession;
use ancs::config::AncsConfig;
use ancs::error::{DiscoveryError, Error, GattError, MailboxError};
use ancs::fsm::ClientState;
use ancs::protocol::ActionId;

use crate::mock_gatt::*;

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn discovery_subscribes_notification_then_data_source() {
    let (session, peer) = connected();

    assert_eq!(
        peer.subscriptions,
        vec![(NS, SubscriptionKind::Notify), (DS, SubscriptionKind::Notify)]
    );
    assert!(session.is_active());
    assert_eq!(session.state(), Some(ClientState::Idle));
    assert!(session.can_handle(CP));
    assert!(!session.can_handle(AttHandle(0x0003)));
}

#[test]
fn incomplete_service_is_rejected() {
    let mut session = AncsSession::new(AncsConfig::default(), leaked_mailbox()).unwrap();
    let mut peer = MockPeer::new();
    let chars: Vec<_> = characteristics()
        .into_iter()
        .filter(|c| c.handle != CP)
        .collect();

    let err = session.service_discovered(&chars, &mut peer).unwrap_err();

    assert_eq!(
        err,
        Error::Discovery(DiscoveryError::MissingCharacteristic("Control Point"))
    );
    assert!(!session.is_active());
    assert!(peer.subscriptions.is_empty());
}

#[test]
fn invalid_config_is_rejected() {
    let config = AncsConfig {
        write_retry_delay_ms: 0,
        ..AncsConfig::default()
    };
    assert!(matches!(
        AncsSession::new(config, leaked_mailbox()),
        Err(Error::Config(_))
    ));
}

#[test]
fn subscribe_failure_reports_disconnect() {
    let mut session = AncsSession::new(AncsConfig::default(), leaked_mailbox()).unwrap();
    let mut peer = MockPeer::new();
    peer.subscribe_failure = Some(GattError::Link);

    session.service_discovered(&characteristics(), &mut peer).unwrap();

    assert_eq!(peer.disconnects(), 1);
    assert!(!peer.is_armed(TimerId::AliveCheck));
}

#[test]
fn async_subscribe_error_reports_disconnect() {
    let (mut session, mut peer) = connected();
    session.handle_subscribe(DS, SubscriptionKind::Notify, Err(GattError::Att(0x0F)), &mut peer);
    assert_eq!(peer.disconnects(), 1);
}

#[test]
fn rediscovery_replaces_client() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);

    session.service_discovered(&characteristics(), &mut peer).unwrap();

    assert_eq!(peer.disconnects(), 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
    assert_eq!(session.client().unwrap().in_flight(), None);
}

// ── Teardown ──────────────────────────────────────────────────

#[test]
fn callbacks_after_teardown_are_ignored() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);

    session.invalidate_references(&mut peer);
    assert!(!session.is_active());
    assert!(!peer.is_armed(TimerId::AliveCheck));
    assert_eq!(peer.events, vec![Recorded::Disconnected]);

    let writes = peer.writes.len();
    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &notification_response(1, b"", b"", b""), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_timer(TimerId::WriteRetry, &mut peer);
    session.handle_timer(TimerId::AliveCheck, &mut peer);

    assert_eq!(peer.writes.len(), writes);
    assert_eq!(peer.events, vec![Recorded::Disconnected]);
    assert!(!session.can_handle(NS));
    assert_eq!(session.state(), None);
}

#[test]
fn service_removed_without_client_is_silent() {
    let mut session = AncsSession::new(AncsConfig::default(), leaked_mailbox()).unwrap();
    let mut peer = MockPeer::new();
    session.service_removed(&mut peer);
    assert!(peer.events.is_empty());
}

#[test]
fn app_names_survive_reconnect() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);
    let response = notification_response(1, b"com.example.chat", b"Hi", b"");
    session.handle_notification_or_read(DS, &response, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &app_response(b"com.example.chat", b"Chat"), Ok(()), &mut peer);

    session.invalidate_references(&mut peer);
    session.service_discovered(&characteristics(), &mut peer).unwrap();
    peer.writes.clear();

    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);
    let response = notification_response(2, b"com.example.chat", b"Again", b"");
    session.handle_notification_or_read(DS, &response, Ok(()), &mut peer);

    assert_eq!(peer.writes.len(), 1, "no app lookup after reconnect");
    let last = peer.notifications().pop().unwrap().clone();
    assert_eq!(last.app_name.as_deref(), Some(&b"Chat"[..]));
}

#[test]
fn counters_survive_client_destruction() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &notification_response(1, b"", b"", b""), Ok(()), &mut peer);

    session.service_removed(&mut peer);
    session.service_discovered(&characteristics(), &mut peer).unwrap();

    assert_eq!(session.counters().notifications_delivered, 1);
}

// ── Mailbox ───────────────────────────────────────────────────

#[test]
fn mailbox_actions_run_in_posting_order() {
    static MAILBOX: ActionMailbox = ActionMailbox::new();
    let mut session = AncsSession::new(AncsConfig::default(), &MAILBOX).unwrap();
    let mut peer = MockPeer::new();
    session.service_discovered(&characteristics(), &mut peer).unwrap();

    thread::spawn(|| {
        MAILBOX.perform_action(10, ActionId::Positive).unwrap();
        MAILBOX.perform_action(11, ActionId::Negative).unwrap();
    })
    .join()
    .unwrap();

    assert_eq!(session.process_actions(&mut peer), 2);
    assert_eq!(peer.writes, vec![vec![2, 10, 0, 0, 0, 0]]);

    session.handle_write_response(CP, Ok(()), &mut peer);
    assert_eq!(peer.last_write(), Some(&[2, 11, 0, 0, 0, 1][..]));
}

#[test]
fn full_mailbox_reports_error() {
    let (mut session, mut peer) = connected();
    for uid in 0..8 {
        session.mailbox().perform_action(uid, ActionId::Positive).unwrap();
    }
    assert_eq!(
        session.perform_action(99, ActionId::Positive, &mut peer),
        Err(Error::Mailbox(MailboxError::Full))
    );
    assert_eq!(session.process_actions(&mut peer), 8);
}

#[test]
fn mailbox_requests_without_client_are_dropped() {
    let mut session = AncsSession::new(AncsConfig::default(), leaked_mailbox()).unwrap();
    let mut peer = MockPeer::new();
    session.mailbox().perform_action(1, ActionId::Positive).unwrap();

    assert_eq!(session.process_actions(&mut peer), 1);
    assert!(peer.writes.is_empty());
    assert!(session.mailbox().is_empty());
}
