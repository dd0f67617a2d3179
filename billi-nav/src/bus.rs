//! Message bus adapter.
//!
//! The robot's services talk over a single broadcast channel of bare tags.
//! The navigator consumes lifecycle notices and manual turn requests and
//! produces turn status notices; everything else on the channel belongs to
//! other services and is ignored here.
//!
//! [`ChannelBus`] is the in-process implementation: every subscriber gets
//! its own `crossbeam_channel` receiver and sees every published message.

use crate::error::{NavError, Result};
use crossbeam_channel::{Receiver, Sender};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Every tag that can appear on the robot's message channel
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Message {
    // Internal lifecycle
    Update,
    Restart,
    Reboot,
    Shutdown,
    Restarting,
    BoardReady,
    ShuttingDown,
    Crashing,
    ErrorState,
    StartRecordingProximities,
    StopRecordingProximities,
    TurnRight,
    TurnLeft,

    // Remote clients
    ConnectionRequest,
    Connected,
    Conflict,
    Invalid,
    Error,
    ConnectionTest,
    ConnectionOk,
    RightTurnRequest,
    LeftTurnRequest,
    TurnInProgress,
    TurningRight,
    TurningLeft,
    TurnCompleted,
    CatDetected,
}

impl Message {
    pub const ALL: [Message; 27] = [
        Message::Update,
        Message::Restart,
        Message::Reboot,
        Message::Shutdown,
        Message::Restarting,
        Message::BoardReady,
        Message::ShuttingDown,
        Message::Crashing,
        Message::ErrorState,
        Message::StartRecordingProximities,
        Message::StopRecordingProximities,
        Message::TurnRight,
        Message::TurnLeft,
        Message::ConnectionRequest,
        Message::Connected,
        Message::Conflict,
        Message::Invalid,
        Message::Error,
        Message::ConnectionTest,
        Message::ConnectionOk,
        Message::RightTurnRequest,
        Message::LeftTurnRequest,
        Message::TurnInProgress,
        Message::TurningRight,
        Message::TurningLeft,
        Message::TurnCompleted,
        Message::CatDetected,
    ];

    /// Wire name of the tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Message::Update => "UPDATE",
            Message::Restart => "RESTART",
            Message::Reboot => "REBOOT",
            Message::Shutdown => "SHUTDOWN",
            Message::Restarting => "RESTARTING",
            Message::BoardReady => "BOARD_READY",
            Message::ShuttingDown => "SHUTTING_DOWN",
            Message::Crashing => "CRASHING",
            Message::ErrorState => "ERROR_STATE",
            Message::StartRecordingProximities => "START_RECORDING_PROXIMITIES",
            Message::StopRecordingProximities => "STOP_RECORDING_PROXIMITIES",
            Message::TurnRight => "TURN_RIGHT",
            Message::TurnLeft => "TURN_LEFT",
            Message::ConnectionRequest => "CONNECTION_REQUEST",
            Message::Connected => "CONNECTED",
            Message::Conflict => "CONFLICT",
            Message::Invalid => "INVALID",
            Message::Error => "ERROR",
            Message::ConnectionTest => "CONNECTION_TEST",
            Message::ConnectionOk => "CONNECTION_OK",
            Message::RightTurnRequest => "RIGHT_TURN_REQUEST",
            Message::LeftTurnRequest => "LEFT_TURN_REQUEST",
            Message::TurnInProgress => "TURN_IN_PROGRESS",
            Message::TurningRight => "TURNING_RIGHT",
            Message::TurningLeft => "TURNING_LEFT",
            Message::TurnCompleted => "TURN_COMPLETED",
            Message::CatDetected => "CAT_DETECTED",
        }
    }

    /// Notices that force the drivetrain to stop
    pub fn is_halt(&self) -> bool {
        matches!(
            self,
            Message::ShuttingDown | Message::Crashing | Message::ErrorState
        )
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Message {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        Message::ALL
            .iter()
            .find(|m| m.as_str() == s)
            .copied()
            .ok_or_else(|| NavError::Bus(format!("unknown message tag: {}", s)))
    }
}

/// Publish/subscribe access to the robot's message channel
pub trait MessageBus: Send {
    /// Broadcast a message to every subscriber
    fn publish(&self, message: Message) -> Result<()>;

    /// Open a new subscription receiving every later message
    fn subscribe(&self) -> Result<Receiver<Message>>;
}

/// In-process broadcast bus
#[derive(Clone, Default)]
pub struct ChannelBus {
    state: Arc<Mutex<BusState>>,
}

#[derive(Default)]
struct BusState {
    subscribers: Vec<Sender<Message>>,
    closed: bool,
}

impl ChannelBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Refuse further subscriptions and publishes, dropping all subscribers
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl MessageBus for ChannelBus {
    fn publish(&self, message: Message) -> Result<()> {
        let mut state = self.lock();
        if state.closed {
            return Err(NavError::Bus(format!("bus closed, dropped {}", message)));
        }
        // Subscribers that hung up are pruned on the way
        state.subscribers.retain(|tx| tx.send(message).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Result<Receiver<Message>> {
        let mut state = self.lock();
        if state.closed {
            return Err(NavError::Bus("cannot subscribe to a closed bus".to_string()));
        }
        let (tx, rx) = crossbeam_channel::unbounded();
        state.subscribers.push(tx);
        Ok(rx)
    }
}
