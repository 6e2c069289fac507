//! End-to-end notification and action flows through `AncsSession`.
//!
//! Every test drives the session the way a GATT stack would: Notification
//! Source payloads, Control Point write responses, Data Source fragments
//! and timer expiries, then asserts on what the mock peer recorded.

use ancs::app::ports::TimerId;
use ancs::config::AncsConfig;
use ancs::error::GattError;
use ancs::fsm::ClientState;
use ancs::protocol::codec::encode_attribute;
use ancs::protocol::{ActionId, CategoryId, EventFlags};
use ancs::queue::QueueOp;
use embassy_time::Duration;

use crate::mock_gatt::*;

const PHONE_ID: &[u8] = b"com.apple.mobilephone";

/// Answer the in-flight fetch for `uid` with a complete response in one
/// packet.
fn answer_fetch(
    session: &mut ancs::AncsSession<'static>,
    peer: &mut MockPeer,
    uid: u32,
    app_id: &[u8],
) {
    session.handle_write_response(CP, Ok(()), peer);
    let response = notification_response(uid, app_id, b"Alice", b"Lunch?");
    session.handle_notification_or_read(DS, &response, Ok(()), peer);
}

// ── QA-1: Simple notification with app-name lookup ────────────

#[test]
fn simple_notification_resolves_app_name() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(7), Ok(()), &mut peer);
    assert_eq!(peer.last_write(), Some(fetch_request(7).as_slice()));
    assert_eq!(session.state(), Some(ClientState::RequestedNotification));

    session.handle_write_response(CP, Ok(()), &mut peer);
    let response = notification_response(7, PHONE_ID, b"Alice", b"Lunch?");
    let (head, tail) = response.split_at(20);
    session.handle_notification_or_read(DS, head, Ok(()), &mut peer);
    assert_eq!(session.state(), Some(ClientState::ReassemblingNotification));

    session.handle_notification_or_read(DS, tail, Ok(()), &mut peer);
    assert_eq!(session.state(), Some(ClientState::RequestedApp));
    assert_eq!(peer.last_write(), Some(app_request(PHONE_ID).as_slice()));
    assert!(peer.notifications().is_empty(), "held until the name arrives");

    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &app_response(PHONE_ID, b"Phone"), Ok(()), &mut peer);

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    let n = delivered[0];
    assert_eq!(n.uid, 7);
    assert_eq!(n.category, CategoryId::Social);
    assert_eq!(n.app_identifier, PHONE_ID);
    assert_eq!(n.app_name.as_deref(), Some(&b"Phone"[..]));
    assert_eq!(n.title, b"Alice");
    assert_eq!(n.subtitle, b"");
    assert_eq!(n.message, b"Lunch?");
    assert_eq!(n.date, DATE);
    assert_eq!(n.positive_action_label, None);

    assert_eq!(session.state(), Some(ClientState::Idle));
    assert_eq!(session.app_names().get(PHONE_ID), Some(&b"Phone"[..]));
    let counters = session.counters();
    assert_eq!(counters.notifications_delivered, 1);
    assert_eq!(counters.cache_misses, 1);
}

#[test]
fn cached_app_name_skips_second_lookup() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 1, PHONE_ID);
    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &app_response(PHONE_ID, b"Phone"), Ok(()), &mut peer);

    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 2, PHONE_ID);

    let lookups = peer.writes.iter().filter(|w| w[0] == 1).count();
    assert_eq!(lookups, 1);
    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].app_name.as_deref(), Some(&b"Phone"[..]));
    assert_eq!(session.counters().cache_hits, 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn empty_app_identifier_is_delivered_without_lookup() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(3), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 3, b"");

    assert_eq!(peer.writes.len(), 1);
    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].app_name, None);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

// ── QA-2: Malformed and mismatched responses ──────────────────

#[test]
fn malformed_dictionary_drops_op_and_advances() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);

    // Attribute id 0x33 is outside the schema.
    let bogus = [0, 1, 0, 0, 0, 0x33, 1, 0, b'x'];
    session.handle_notification_or_read(DS, &bogus, Ok(()), &mut peer);

    assert!(peer.notifications().is_empty());
    assert_eq!(session.counters().parse_errors, 1);
    assert_eq!(peer.last_write(), Some(fetch_request(2).as_slice()));
    assert_eq!(session.state(), Some(ClientState::RequestedNotification));
}

#[test]
fn response_for_other_uid_is_rejected() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 9, b"");

    assert!(peer.notifications().is_empty());
    assert_eq!(session.counters().parse_errors, 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn oversized_response_is_dropped() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(4), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);

    // App identifier claims 2000 bytes; it never fits the buffer.
    let mut first = vec![0, 4, 0, 0, 0, 0];
    first.extend_from_slice(&2000u16.to_le_bytes());
    first.resize(100, b'a');
    session.handle_notification_or_read(DS, &first, Ok(()), &mut peer);
    for _ in 0..4 {
        session.handle_notification_or_read(DS, &[b'a'; 200], Ok(()), &mut peer);
        assert_eq!(session.state(), Some(ClientState::ReassemblingNotification));
    }
    session.handle_notification_or_read(DS, &[b'a'; 200], Ok(()), &mut peer);

    assert_eq!(session.counters().overflows, 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
    assert!(peer.notifications().is_empty());
}

#[test]
fn partial_app_response_delivers_without_name() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(5), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 5, PHONE_ID);
    session.handle_write_response(CP, Ok(()), &mut peer);

    let full = app_response(PHONE_ID, b"Phone");
    session.handle_notification_or_read(DS, &full[..full.len() - 2], Ok(()), &mut peer);

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].app_name, None);
    assert!(!session.app_names().contains(PHONE_ID));
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn rejected_app_lookup_delivers_without_name() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(6), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 6, PHONE_ID);
    session.handle_write_response(CP, Err(GattError::Att(0xA0)), &mut peer);

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].app_name, None);
    assert_eq!(peer.disconnects(), 0);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn oversized_first_fragment_counts_as_overflow() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);

    let mut first = vec![0, 1, 0, 0, 0];
    first.resize(1100, 0);
    session.handle_notification_or_read(DS, &first, Ok(()), &mut peer);

    let counters = session.counters();
    assert_eq!(counters.overflows, 1);
    assert_eq!(counters.parse_errors, 0);
    assert_eq!(peer.last_write(), Some(fetch_request(2).as_slice()));
}

#[test]
fn data_source_error_mid_response_drops_op() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_write_response(CP, Ok(()), &mut peer);

    let response = notification_response(1, b"", b"Alice", b"Lunch?");
    session.handle_notification_or_read(DS, &response[..6], Ok(()), &mut peer);
    assert_eq!(session.state(), Some(ClientState::ReassemblingNotification));

    session.handle_notification_or_read(DS, &[], Err(GattError::Link), &mut peer);

    assert!(peer.notifications().is_empty());
    assert_eq!(peer.disconnects(), 0);
    assert_eq!(peer.last_write(), Some(fetch_request(2).as_slice()));
    assert_eq!(session.state(), Some(ClientState::RequestedNotification));

    // Reassembly starts clean for the next response.
    session.handle_write_response(CP, Ok(()), &mut peer);
    let next = notification_response(2, b"", b"Bob", b"Hi");
    session.handle_notification_or_read(DS, &next, Ok(()), &mut peer);
    assert_eq!(peer.notifications().len(), 1);
    assert_eq!(peer.notifications()[0].uid, 2);
}

#[test]
fn data_source_error_during_app_lookup_delivers_without_name() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 1, PHONE_ID);
    assert_eq!(session.state(), Some(ClientState::RequestedApp));

    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &[], Err(GattError::Att(0x0E)), &mut peer);

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].app_name, None);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn notification_source_error_is_ignored() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &ns_added(1), Err(GattError::Link), &mut peer);

    assert!(peer.writes.is_empty());
    assert_eq!(session.state(), Some(ClientState::Idle));
    assert_eq!(peer.disconnects(), 0);
}

// ── QA-3: Write failures and retry ────────────────────────────

#[test]
fn invalid_parameter_drops_fetch_without_retry() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_write_response(CP, Err(GattError::Att(0xA2)), &mut peer);

    assert_eq!(session.state(), Some(ClientState::Idle));
    assert!(!peer.is_armed(TimerId::WriteRetry));
    assert_eq!(session.counters().retries, 0);
    assert_eq!(peer.disconnects(), 0);
}

#[test]
fn rejected_fetch_is_retried_once() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_write_response(CP, Err(GattError::Att(0xA1)), &mut peer);

    assert_eq!(session.state(), Some(ClientState::Retrying));
    assert_eq!(
        peer.armed.get(&TimerId::WriteRetry),
        Some(&Duration::from_millis(1000))
    );

    session.handle_timer(TimerId::WriteRetry, &mut peer);
    assert_eq!(peer.writes.len(), 2);
    assert_eq!(peer.writes[0], peer.writes[1]);
    assert_eq!(session.state(), Some(ClientState::RequestedNotification));

    answer_fetch(&mut session, &mut peer, 1, b"");
    assert_eq!(peer.notifications().len(), 1);
    assert_eq!(session.counters().retries, 1);
}

#[test]
fn second_failure_flushes() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    session.handle_write_response(CP, Err(GattError::Att(0xA1)), &mut peer);
    session.handle_timer(TimerId::WriteRetry, &mut peer);
    session.handle_write_response(CP, Err(GattError::Att(0xA1)), &mut peer);

    assert_eq!(peer.disconnects(), 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
    let client = session.client().unwrap();
    assert!(client.queue().is_empty());
    assert_eq!(client.in_flight(), None);
    assert_eq!(session.counters().flushes, 1);
    assert!(session.is_active(), "a flush keeps the client");
}

#[test]
fn submission_failure_schedules_retry() {
    let (mut session, mut peer) = connected();
    peer.fail_next_write(GattError::Link);

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);

    assert!(peer.writes.is_empty());
    assert_eq!(session.state(), Some(ClientState::Retrying));
    session.handle_timer(TimerId::WriteRetry, &mut peer);
    assert_eq!(peer.last_write(), Some(fetch_request(1).as_slice()));
}

#[test]
fn link_loss_on_fetch_response_flushes() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_write_response(CP, Err(GattError::Link), &mut peer);

    assert_eq!(peer.disconnects(), 1);
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn stale_retry_timer_is_ignored() {
    let (mut session, mut peer) = connected();
    session.handle_timer(TimerId::WriteRetry, &mut peer);
    assert!(peer.writes.is_empty());
    assert_eq!(session.state(), Some(ClientState::Idle));
}

// ── QA-4: Notification Source handling ────────────────────────

#[test]
fn removal_drops_pending_fetches() {
    let (mut session, mut peer) = connected();

    for uid in 1..=3 {
        session.handle_notification_or_read(NS, &ns_added(uid), Ok(()), &mut peer);
    }
    session.handle_notification_or_read(NS, &ns_removed(2), Ok(()), &mut peer);

    let client = session.client().unwrap();
    let pending: Vec<u32> = client.queue().iter().map(QueueOp::uid).collect();
    assert_eq!(pending, vec![3]);
    assert_eq!(peer.events.last(), Some(&Recorded::Removed(2)));
}

#[test]
fn duplicate_events_are_coalesced() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.handle_notification_or_read(NS, &ns_added(2), Ok(()), &mut peer);
    let modified = ns_event(1, EventFlags::empty(), CategoryId::Social, 2);
    session.handle_notification_or_read(NS, &modified, Ok(()), &mut peer);

    assert_eq!(session.client().unwrap().queue().len(), 1);
    assert_eq!(session.counters().duplicates_dropped, 1);
}

#[test]
fn burst_of_events_is_queued_in_full() {
    let (mut session, mut peer) = connected();

    for uid in 1..=40 {
        session.handle_notification_or_read(NS, &ns_added(uid), Ok(()), &mut peer);
    }

    let client = session.client().unwrap();
    assert_eq!(client.queue().len(), 39);
    assert_eq!(client.queue().iter().last().map(QueueOp::uid), Some(40));

    for uid in 1..=40 {
        assert_eq!(peer.last_write(), Some(fetch_request(uid).as_slice()));
        session.handle_write_response(CP, Err(GattError::Att(0xA2)), &mut peer);
    }
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn pre_existing_notifications_are_skipped_by_default() {
    let (mut session, mut peer) = connected();
    let old = ns_event(0, EventFlags::PRE_EXISTING, CategoryId::Email, 1);

    session.handle_notification_or_read(NS, &old, Ok(()), &mut peer);

    assert!(peer.writes.is_empty());
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn pre_existing_notifications_fetched_when_configured() {
    let config = AncsConfig {
        fetch_pre_existing: true,
        ..AncsConfig::default()
    };
    let (mut session, mut peer) = connected_with(config);
    let old = ns_event(0, EventFlags::PRE_EXISTING, CategoryId::Email, 1);

    session.handle_notification_or_read(NS, &old, Ok(()), &mut peer);
    answer_fetch(&mut session, &mut peer, 1, b"");

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].category, CategoryId::Email);
    assert!(delivered[0].flags.contains(EventFlags::PRE_EXISTING));
}

#[test]
fn malformed_notification_source_is_ignored() {
    let (mut session, mut peer) = connected();
    session.handle_notification_or_read(NS, &[0, 0, 4], Ok(()), &mut peer);
    assert!(peer.writes.is_empty());
    assert!(peer.events.is_empty());
}

#[test]
fn requested_lengths_follow_config() {
    let config = AncsConfig {
        title_max_len: 20,
        message_max_len: 100,
        ..AncsConfig::default()
    };
    let (mut session, mut peer) = connected_with(config);

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);

    let expected = [0, 1, 0, 0, 0, 0, 1, 20, 0, 2, 40, 0, 3, 100, 0, 5];
    assert_eq!(peer.last_write(), Some(&expected[..]));
}

// ── QA-5: Actions and action labels ───────────────────────────

#[test]
fn action_completion_is_reported() {
    let (mut session, mut peer) = connected();

    session
        .perform_action(42, ActionId::Negative, &mut peer)
        .unwrap();
    assert_eq!(peer.last_write(), Some(&[2, 42, 0, 0, 0, 1][..]));
    assert_eq!(session.state(), Some(ClientState::PerformingAction));

    session.handle_write_response(CP, Err(GattError::Att(0xA3)), &mut peer);

    assert_eq!(
        peer.events,
        vec![Recorded::Action {
            uid: 42,
            action: ActionId::Negative,
            result: Err(GattError::Att(0xA3)),
        }]
    );
    assert_eq!(session.state(), Some(ClientState::Idle));
}

#[test]
fn action_waits_behind_fetch() {
    let (mut session, mut peer) = connected();

    session.handle_notification_or_read(NS, &ns_added(1), Ok(()), &mut peer);
    session.perform_action(1, ActionId::Positive, &mut peer).unwrap();
    assert_eq!(peer.writes.len(), 1);

    answer_fetch(&mut session, &mut peer, 1, b"");
    assert_eq!(peer.last_write(), Some(&[2, 1, 0, 0, 0, 0][..]));

    session.handle_write_response(CP, Ok(()), &mut peer);
    assert_eq!(
        peer.events.last(),
        Some(&Recorded::Action {
            uid: 1,
            action: ActionId::Positive,
            result: Ok(()),
        })
    );
}

#[test]
fn action_labels_requested_after_ios9() {
    let (mut session, mut peer) = connected();
    session.ios9_or_newer_detected();

    let flags = EventFlags::POSITIVE_ACTION | EventFlags::NEGATIVE_ACTION;
    let call = ns_event(0, flags, CategoryId::IncomingCall, 8);
    session.handle_notification_or_read(NS, &call, Ok(()), &mut peer);
    let request = peer.last_write().unwrap().to_vec();
    assert_eq!(&request[5..7], &[6, 7]);

    let mut response = vec![0, 8, 0, 0, 0];
    encode_attribute(&mut response, 6, b"Answer");
    encode_attribute(&mut response, 7, b"Decline");
    encode_attribute(&mut response, 0, b"");
    encode_attribute(&mut response, 1, b"Bob");
    encode_attribute(&mut response, 2, b"");
    encode_attribute(&mut response, 3, b"");
    encode_attribute(&mut response, 5, DATE);
    session.handle_write_response(CP, Ok(()), &mut peer);
    session.handle_notification_or_read(DS, &response, Ok(()), &mut peer);

    let delivered = peer.notifications();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].category, CategoryId::IncomingCall);
    assert_eq!(delivered[0].positive_action_label.as_deref(), Some(&b"Answer"[..]));
    assert_eq!(delivered[0].negative_action_label.as_deref(), Some(&b"Decline"[..]));
}
