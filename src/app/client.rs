//! ANCS client: the per-connection protocol state machine.
//!
//! [`AncsClient`] owns the operation queue, reassembly buffer and liveness
//! monitor for one connected peer.  It exposes a clean, stack-agnostic API;
//! all I/O flows through the port traits, making the whole protocol
//! testable with mock adapters.
//!
//! ```text
//!  Notification Source ──▶ ┌────────────────────────────┐ ──▶ EventSink
//!  Data Source ──────────▶ │         AncsClient         │
//!  write responses ──────▶ │ Queue · Reassembly · Probe │ ──▶ GattTransport
//!  timer expiries ───────▶ └────────────────────────────┘ ──▶ TimerPort
//! ```
//!
//! Exactly one Control Point request is in flight.  Every completion path
//! funnels through `advance`, which returns to `Idle` and starts the next
//! piece of work: an owed liveness probe first, then the queue head.

use heapless::Vec as HVec;
use log::{debug, info, warn};

use crate::cache::AppNameCache;
use crate::config::AncsConfig;
use crate::diagnostics::{self, AncsCounters};
use crate::error::{DiscoveryError, GattError, ReassemblyError};
use crate::fsm::{ClientState, StateMachine};
use crate::liveness::{CheckDecision, LivenessMonitor, ProbeState};
use crate::protocol::builders::{
    GetAppAttributes, GetNotificationAttributes, PerformNotificationAction, alive_probe,
};
use crate::protocol::parsers::{NotificationSourceEvent, Response, parse_response};
use crate::protocol::{
    ActionId, AncsAttError, CONTROL_POINT_UUID, DATA_SOURCE_UUID, EventId,
    NOTIFICATION_SOURCE_UUID, NotificationUid, PROBE_UID,
};
use crate::queue::{OperationQueue, PushOutcome, QueueOp};
use crate::reassembly::{MAX_RESPONSE_LEN, Reassembly};

use super::events::{AncsEvent, Notification};
use super::ports::{AttHandle, Characteristic, ClientPorts, SubscriptionKind, TimerId};

// ───────────────────────────────────────────────────────────────
// Characteristic set
// ───────────────────────────────────────────────────────────────

/// Role of an ANCS characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    NotificationSource,
    DataSource,
    ControlPoint,
}

impl Role {
    fn from_uuid(uuid: u128) -> Option<Self> {
        match uuid {
            NOTIFICATION_SOURCE_UUID => Some(Self::NotificationSource),
            DATA_SOURCE_UUID => Some(Self::DataSource),
            CONTROL_POINT_UUID => Some(Self::ControlPoint),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::NotificationSource => "Notification Source",
            Self::DataSource => "Data Source",
            Self::ControlPoint => "Control Point",
        }
    }
}

/// The three ANCS characteristic handles.  Built only when all three are
/// present and distinct, so it is never partially valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicSet {
    pub notification_source: AttHandle,
    pub data_source: AttHandle,
    pub control_point: AttHandle,
}

impl CharacteristicSet {
    /// Pick the ANCS roles out of a discovery result.  Characteristics
    /// with other UUIDs are ignored.
    pub fn from_discovered(characteristics: &[Characteristic]) -> Result<Self, DiscoveryError> {
        let mut notification_source = None;
        let mut data_source = None;
        let mut control_point = None;

        for c in characteristics {
            let Some(role) = Role::from_uuid(c.uuid) else {
                continue;
            };
            let slot = match role {
                Role::NotificationSource => &mut notification_source,
                Role::DataSource => &mut data_source,
                Role::ControlPoint => &mut control_point,
            };
            if slot.replace(c.handle).is_some() {
                return Err(DiscoveryError::DuplicateCharacteristic(role.name()));
            }
        }

        let missing = |role: Role| DiscoveryError::MissingCharacteristic(role.name());
        let set = Self {
            notification_source: notification_source
                .ok_or_else(|| missing(Role::NotificationSource))?,
            data_source: data_source.ok_or_else(|| missing(Role::DataSource))?,
            control_point: control_point.ok_or_else(|| missing(Role::ControlPoint))?,
        };

        if set.notification_source == set.data_source
            || set.notification_source == set.control_point
            || set.data_source == set.control_point
        {
            return Err(DiscoveryError::HandleCollision);
        }
        Ok(set)
    }

    pub fn role_of(&self, handle: AttHandle) -> Option<Role> {
        if handle == self.notification_source {
            Some(Role::NotificationSource)
        } else if handle == self.data_source {
            Some(Role::DataSource)
        } else if handle == self.control_point {
            Some(Role::ControlPoint)
        } else {
            None
        }
    }

    pub fn contains(&self, handle: AttHandle) -> bool {
        self.role_of(handle).is_some()
    }
}

// ───────────────────────────────────────────────────────────────
// AncsClient
// ───────────────────────────────────────────────────────────────

/// Outcome of testing the reassembly buffer after a fragment.
enum Completion {
    Incomplete,
    Delivered,
    Rejected,
    NeedAppName(Vec<u8>),
}

/// Protocol state for one connected peer.
pub struct AncsClient {
    characteristics: CharacteristicSet,
    state: StateMachine,
    queue: OperationQueue,
    /// The op the peer is currently working on.
    in_flight: Option<QueueOp>,
    reassembly: Reassembly,
    /// Completed notification response held while its app name is fetched.
    held: HVec<u8, MAX_RESPONSE_LEN>,
    liveness: LivenessMonitor,
    /// The in-flight fetch already used its one retry.
    retried: bool,
    with_action_labels: bool,
    config: AncsConfig,
    counters: AncsCounters,
}

impl AncsClient {
    /// Construct a client for a validated characteristic set.
    ///
    /// Does **not** touch the peer; call [`start`](Self::start) next.
    pub fn new(characteristics: CharacteristicSet, config: &AncsConfig, with_action_labels: bool) -> Self {
        Self {
            characteristics,
            state: StateMachine::new(),
            queue: OperationQueue::new(),
            in_flight: None,
            reassembly: Reassembly::new(),
            held: HVec::new(),
            liveness: LivenessMonitor::new(config),
            retried: false,
            with_action_labels,
            config: config.clone(),
            counters: AncsCounters::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Subscribe to the Notification Source, then the Data Source, and arm
    /// the first liveness check.
    pub fn start(&mut self, ports: &mut impl ClientPorts) {
        let targets = [
            self.characteristics.notification_source,
            self.characteristics.data_source,
        ];
        for handle in targets {
            if let Err(e) = ports.subscribe(handle, SubscriptionKind::Notify) {
                warn!("ANCS: subscribe to handle {} failed: {}", handle.0, e);
                self.flush("subscribe failed", ports);
                return;
            }
        }
        self.liveness.start(ports);
        info!("ANCS: client started");
    }

    /// Cancel every timer and drop all work.  The client is unusable
    /// afterwards.
    pub fn destroy(&mut self, ports: &mut impl ClientPorts) {
        let dropped = self.queue.reset();
        self.liveness.stop(ports);
        ports.cancel(TimerId::WriteRetry);
        self.clear_current();
        self.state.transition(ClientState::Idle);
        info!("ANCS: client destroyed, {} pending op(s) dropped", dropped);
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn state(&self) -> ClientState {
        self.state.current()
    }

    pub fn characteristics(&self) -> &CharacteristicSet {
        &self.characteristics
    }

    pub fn in_flight(&self) -> Option<QueueOp> {
        self.in_flight
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn probe_state(&self) -> ProbeState {
        self.liveness.state()
    }

    pub fn counters(&self) -> &AncsCounters {
        &self.counters
    }

    /// Request positive/negative action labels with every fetch.
    pub fn enable_action_labels(&mut self) {
        self.with_action_labels = true;
    }

    // ── Inbound traffic ───────────────────────────────────────

    /// Completion of a subscription request.
    pub fn handle_subscribe(
        &mut self,
        handle: AttHandle,
        kind: SubscriptionKind,
        result: Result<(), GattError>,
        ports: &mut impl ClientPorts,
    ) {
        match result {
            Ok(()) => debug!("ANCS: subscribed ({:?}) to handle {}", kind, handle.0),
            Err(e) => {
                warn!("ANCS: subscription to handle {} failed: {}", handle.0, e);
                self.flush("subscribe failed", ports);
            }
        }
    }

    /// A notification (or read result) on one of our characteristics.  An
    /// `Err` means the transport lost the value; `data` is then ignored.
    pub fn handle_notification(
        &mut self,
        handle: AttHandle,
        data: &[u8],
        result: Result<(), GattError>,
        cache: &mut AppNameCache,
        ports: &mut impl ClientPorts,
    ) {
        if let Err(e) = result {
            match self.characteristics.role_of(handle) {
                Some(Role::DataSource) => self.on_data_source_error(e, ports),
                _ => warn!("ANCS: read on handle {} failed: {}", handle.0, e),
            }
            return;
        }
        match self.characteristics.role_of(handle) {
            Some(Role::NotificationSource) => self.on_notification_source(data, ports),
            Some(Role::DataSource) => self.on_data_source(data, cache, ports),
            Some(Role::ControlPoint) | None => {
                debug!("ANCS: ignoring {} byte(s) on handle {}", data.len(), handle.0)
            }
        }
    }

    /// Response to our last Control Point write.
    pub fn handle_write_response(
        &mut self,
        handle: AttHandle,
        result: Result<(), GattError>,
        ports: &mut impl ClientPorts,
    ) {
        if handle != self.characteristics.control_point {
            debug!("ANCS: write response on handle {} ignored", handle.0);
            return;
        }

        match self.state.current() {
            ClientState::RequestedNotification => match result {
                Ok(()) => debug!("ANCS: fetch accepted"),
                Err(GattError::Link) => self.flush("fetch write failed", ports),
                Err(GattError::Att(code))
                    if AncsAttError::from_u8(code) == Some(AncsAttError::InvalidParameter) =>
                {
                    info!("ANCS: notification no longer exists, dropping fetch");
                    self.advance(ports);
                }
                Err(e) => {
                    warn!("ANCS: fetch rejected: {}", e);
                    self.retry_fetch(ports);
                }
            },
            ClientState::AliveCheck => {
                self.liveness.on_response(ports);
                match result {
                    Err(GattError::Link) => self.flush("probe write failed", ports),
                    _ => self.advance(ports),
                }
            }
            ClientState::PerformingAction => {
                if let Some(QueueOp::PerformAction { uid, action }) = self.in_flight {
                    ports.emit(&AncsEvent::ActionCompleted { uid, action, result });
                }
                self.complete(result, ports);
            }
            ClientState::RequestedApp => {
                if let Err(e) = result {
                    warn!("ANCS: app lookup rejected: {}", e);
                    self.deliver_held(None, ports);
                    self.complete(Err(e), ports);
                }
            }
            state @ (ClientState::Idle
            | ClientState::ReassemblingNotification
            | ClientState::Retrying) => {
                debug!("ANCS: late write response in {}", state.name());
            }
        }
    }

    /// A timer requested through [`TimerPort`](super::ports::TimerPort)
    /// expired.
    pub fn handle_timer(&mut self, timer: TimerId, ports: &mut impl ClientPorts) {
        match timer {
            TimerId::AliveCheck => match self.liveness.on_check_due(self.state.is_idle()) {
                CheckDecision::ProbeNow => self.send_probe(ports),
                CheckDecision::Deferred | CheckDecision::Ignore => {}
            },
            TimerId::AliveResponse => {
                if self.liveness.on_response_timeout(ports) {
                    diagnostics::bump(&mut self.counters.probe_timeouts);
                    warn!("ANCS: peer did not answer liveness probe");
                    self.flush("probe timeout", ports);
                }
            }
            TimerId::WriteRetry => {
                if self.state.current() == ClientState::Retrying {
                    self.send_fetch(ports);
                } else {
                    debug!("ANCS: stale retry timer in {}", self.state.current().name());
                }
            }
        }
    }

    /// Queue an action on notification `uid`.
    pub fn perform_action(
        &mut self,
        uid: NotificationUid,
        action: ActionId,
        ports: &mut impl ClientPorts,
    ) {
        self.push(QueueOp::PerformAction { uid, action }, ports);
    }

    // ── Queue discipline ──────────────────────────────────────

    /// Start `op` now if idle, else append it to the pending list.
    pub fn push(&mut self, op: QueueOp, ports: &mut impl ClientPorts) {
        if self.state.is_idle() {
            self.begin(op, ports);
            return;
        }
        match self.queue.enqueue(op) {
            PushOutcome::Queued => {}
            PushOutcome::Duplicate => diagnostics::bump(&mut self.counters.duplicates_dropped),
        }
    }

    /// Finish the current op and start the next piece of work.
    fn advance(&mut self, ports: &mut impl ClientPorts) {
        self.clear_current();
        self.state.transition(ClientState::Idle);

        match self.liveness.state() {
            ProbeState::Pending => self.send_probe(ports),
            ProbeState::Stopped | ProbeState::Waiting | ProbeState::AwaitingResponse => {
                if let Some(op) = self.queue.dequeue() {
                    self.begin(op, ports);
                }
            }
        }
    }

    /// Finish the current op after a write outcome; a link failure is
    /// transport-fatal.
    fn complete(&mut self, result: Result<(), GattError>, ports: &mut impl ClientPorts) {
        match result {
            Err(e) if e.is_fatal() => self.flush("write failed", ports),
            _ => self.advance(ports),
        }
    }

    fn begin(&mut self, op: QueueOp, ports: &mut impl ClientPorts) {
        self.in_flight = Some(op);
        match op {
            QueueOp::FetchAttributes { .. } => self.send_fetch(ports),
            QueueOp::PerformAction { uid, action } => {
                self.state.transition(ClientState::PerformingAction);
                let request = PerformNotificationAction { uid, action }.to_vec();
                if let Err(e) = ports.write(self.characteristics.control_point, &request) {
                    warn!("ANCS: action write for uid {} failed: {}", uid, e);
                    ports.emit(&AncsEvent::ActionCompleted {
                        uid,
                        action,
                        result: Err(e),
                    });
                    self.complete(Err(e), ports);
                }
            }
        }
    }

    /// Submit (or resubmit) the in-flight fetch.
    fn send_fetch(&mut self, ports: &mut impl ClientPorts) {
        let Some(QueueOp::FetchAttributes { uid, .. }) = self.in_flight else {
            return;
        };
        self.state.transition(ClientState::RequestedNotification);
        let request = GetNotificationAttributes {
            uid,
            with_action_labels: self.with_action_labels,
            title_max_len: self.config.title_max_len,
            subtitle_max_len: self.config.subtitle_max_len,
            message_max_len: self.config.message_max_len,
        }
        .to_vec();
        if let Err(e) = ports.write(self.characteristics.control_point, &request) {
            warn!("ANCS: fetch write for uid {} failed: {}", uid, e);
            self.retry_fetch(ports);
        }
    }

    /// First failure arms the retry timer; a second one is fatal.
    fn retry_fetch(&mut self, ports: &mut impl ClientPorts) {
        if self.retried {
            self.flush("fetch failed twice", ports);
            return;
        }
        self.retried = true;
        diagnostics::bump(&mut self.counters.retries);
        self.state.transition(ClientState::Retrying);
        ports.start(TimerId::WriteRetry, self.config.write_retry_delay());
    }

    fn send_probe(&mut self, ports: &mut impl ClientPorts) {
        self.state.transition(ClientState::AliveCheck);
        match ports.write(self.characteristics.control_point, &alive_probe(PROBE_UID)) {
            Ok(()) => {
                self.liveness.probe_sent(ports);
                diagnostics::bump(&mut self.counters.probes_sent);
                debug!("ANCS: liveness probe sent");
            }
            Err(e) => {
                warn!("ANCS: liveness probe write failed: {}", e);
                self.liveness.abandon_probe(ports);
                self.flush("probe submission failed", ports);
            }
        }
    }

    /// Transport-fatal recovery: drop everything and report disconnection.
    fn flush(&mut self, reason: &str, ports: &mut impl ClientPorts) {
        let dropped = self.queue.reset() + usize::from(self.in_flight.is_some());
        warn!("ANCS: {}, flushing {} op(s)", reason, dropped);

        ports.cancel(TimerId::WriteRetry);
        match self.liveness.state() {
            ProbeState::Pending | ProbeState::AwaitingResponse => self.liveness.abandon_probe(ports),
            ProbeState::Stopped | ProbeState::Waiting => {}
        }
        self.clear_current();
        self.state.transition(ClientState::Idle);
        diagnostics::bump(&mut self.counters.flushes);
        ports.emit(&AncsEvent::Disconnected);
    }

    fn clear_current(&mut self) {
        self.in_flight = None;
        self.retried = false;
        self.reassembly.clear();
        self.held.clear();
    }

    // ── Notification Source ───────────────────────────────────

    fn on_notification_source(&mut self, data: &[u8], ports: &mut impl ClientPorts) {
        let Some(event) = NotificationSourceEvent::parse(data) else {
            warn!("ANCS: malformed Notification Source event ({} bytes)", data.len());
            return;
        };
        diagnostics::record_observed_flags(event.flags.bits());
        debug!(
            "ANCS: {:?} uid={} category={:?} flags=0b{:08b}",
            event.event_id,
            event.uid,
            event.category,
            event.flags.bits()
        );

        let fetch = QueueOp::FetchAttributes {
            uid: event.uid,
            flags: event.flags,
            category: event.category,
        };
        match event.event_id {
            EventId::NotificationAdded if event.is_pre_existing() && !self.config.fetch_pre_existing => {
                debug!("ANCS: skipping pre-existing uid {}", event.uid);
            }
            EventId::NotificationAdded | EventId::NotificationModified => self.push(fetch, ports),
            EventId::NotificationRemoved => {
                let dropped = self.queue.remove_fetches(event.uid);
                if dropped > 0 {
                    debug!("ANCS: dropped {} pending fetch(es) for uid {}", dropped, event.uid);
                }
                ports.emit(&AncsEvent::NotificationRemoved { uid: event.uid });
            }
        }
    }

    // ── Data Source ───────────────────────────────────────────

    fn on_data_source(&mut self, data: &[u8], cache: &mut AppNameCache, ports: &mut impl ClientPorts) {
        match self.state.current() {
            ClientState::RequestedNotification => {
                if let Err(e) = self.reassembly.start(data) {
                    warn!("ANCS: bad first fragment: {}", e);
                    self.count_reassembly_error(e);
                    self.advance(ports);
                    return;
                }
                self.state.transition(ClientState::ReassemblingNotification);
                self.on_fragment(cache, ports);
            }
            ClientState::ReassemblingNotification => match self.reassembly.append(data) {
                Ok(()) => self.on_fragment(cache, ports),
                Err(e) => {
                    warn!("ANCS: dropping response: {}", e);
                    self.count_reassembly_error(e);
                    self.advance(ports);
                }
            },
            ClientState::RequestedApp => {
                let name = self.resolve_app_name(data, cache);
                self.deliver_held(name, ports);
                self.advance(ports);
            }
            state => debug!("ANCS: unexpected Data Source data in {}", state.name()),
        }
    }

    fn count_reassembly_error(&mut self, error: ReassemblyError) {
        match error {
            ReassemblyError::Overflow => diagnostics::bump(&mut self.counters.overflows),
            _ => diagnostics::bump(&mut self.counters.parse_errors),
        }
    }

    /// A Data Source value was lost; whatever was being assembled cannot
    /// complete.
    fn on_data_source_error(&mut self, error: GattError, ports: &mut impl ClientPorts) {
        match self.state.current() {
            ClientState::ReassemblingNotification => {
                warn!("ANCS: Data Source failed mid-response ({}), dropping op", error);
                self.advance(ports);
            }
            ClientState::RequestedApp => {
                warn!("ANCS: Data Source failed during app lookup ({})", error);
                self.deliver_held(None, ports);
                self.advance(ports);
            }
            state => debug!("ANCS: Data Source error in {}: {}", state.name(), error),
        }
    }

    /// Check whether the buffered response is whole and act on it.
    fn on_fragment(&mut self, cache: &AppNameCache, ports: &mut impl ClientPorts) {
        let completion = match self.reassembly.poll() {
            Ok(None) => Completion::Incomplete,
            Ok(Some(Response::Notification(n))) => match self.in_flight {
                Some(QueueOp::FetchAttributes { uid, flags, category }) if uid == n.uid => {
                    let app_id = n.app_identifier();
                    match cache.get(app_id) {
                        Some(name) => {
                            diagnostics::bump(&mut self.counters.cache_hits);
                            let notification = Notification::from_attributes(&n, flags, category, Some(name));
                            ports.emit(&AncsEvent::NotificationReceived(notification));
                            Completion::Delivered
                        }
                        None if app_id.is_empty() => {
                            let notification = Notification::from_attributes(&n, flags, category, None);
                            ports.emit(&AncsEvent::NotificationReceived(notification));
                            Completion::Delivered
                        }
                        None => {
                            diagnostics::bump(&mut self.counters.cache_misses);
                            Completion::NeedAppName(GetAppAttributes { app_id }.to_vec())
                        }
                    }
                }
                _ => {
                    warn!("ANCS: response for uid {} does not match the in-flight op", n.uid);
                    Completion::Rejected
                }
            },
            Ok(Some(Response::App(_))) => {
                warn!("ANCS: app response while fetching a notification");
                Completion::Rejected
            }
            Err(e) => {
                warn!("ANCS: malformed notification response: {}", e);
                Completion::Rejected
            }
        };

        match completion {
            Completion::Incomplete => {}
            Completion::Delivered => {
                diagnostics::bump(&mut self.counters.notifications_delivered);
                self.advance(ports);
            }
            Completion::Rejected => {
                diagnostics::bump(&mut self.counters.parse_errors);
                self.advance(ports);
            }
            Completion::NeedAppName(request) => {
                self.held = self.reassembly.take();
                self.state.transition(ClientState::RequestedApp);
                if let Err(e) = ports.write(self.characteristics.control_point, &request) {
                    warn!("ANCS: app lookup write failed: {}", e);
                    self.deliver_held(None, ports);
                    self.complete(Err(e), ports);
                }
            }
        }
    }

    /// Extract the display name from a single-packet app response and
    /// cache it.  Partial, malformed or mismatched responses yield `None`.
    fn resolve_app_name<'d>(&mut self, data: &'d [u8], cache: &mut AppNameCache) -> Option<&'d [u8]> {
        let expected = match parse_response(&self.held) {
            Ok(Some(Response::Notification(n))) => n.app_identifier(),
            _ => return None,
        };
        match parse_response(data) {
            Ok(Some(Response::App(app))) if app.attributes.is_complete() => {
                if app.app_id != expected {
                    warn!("ANCS: app response for a different app id");
                    return None;
                }
                let name = app.display_name()?;
                cache.store(app.app_id, name);
                Some(name)
            }
            Ok(_) => {
                debug!("ANCS: partial app response, delivering without name");
                None
            }
            Err(e) => {
                warn!("ANCS: malformed app response: {}", e);
                diagnostics::bump(&mut self.counters.parse_errors);
                None
            }
        }
    }

    /// Emit the notification held across the app-name lookup.
    fn deliver_held(&mut self, app_name: Option<&[u8]>, ports: &mut impl ClientPorts) {
        let Some(QueueOp::FetchAttributes { flags, category, .. }) = self.in_flight else {
            return;
        };
        match parse_response(&self.held) {
            Ok(Some(Response::Notification(n))) => {
                let notification = Notification::from_attributes(&n, flags, category, app_name);
                ports.emit(&AncsEvent::NotificationReceived(notification));
                diagnostics::bump(&mut self.counters.notifications_delivered);
            }
            _ => {
                warn!("ANCS: held notification unreadable");
                diagnostics::bump(&mut self.counters.parse_errors);
            }
        }
    }
}
