//! Tuple-space event log
//!
//! Every produce, consume and match ("comm") performed while a deploy runs is
//! recorded as an event. Replay rigs the replay store with the recorded comm
//! events so that non-deterministic match choices resolve exactly as they did
//! in the original execution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 32-byte content hash of an event's subject
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventHash(pub [u8; 32]);

impl fmt::Debug for EventHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHash({}..)", &hex::encode(self.0)[..12])
    }
}

/// A datum was published
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProduceEvent {
    /// Hash of the target channel
    pub channel_hash: EventHash,
    /// Hash of (channel, datum)
    pub hash: EventHash,
    /// Whether the datum was persistent
    pub persistent: bool,
}

/// A continuation was registered
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConsumeEvent {
    /// Hashes of the channels listened on
    pub channel_hashes: Vec<EventHash>,
    /// Hash of (channels, continuation)
    pub hash: EventHash,
    /// Whether the continuation was persistent
    pub persistent: bool,
}

/// A continuation matched published data
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommEvent {
    /// The consume side of the match
    pub consume: ConsumeEvent,
    /// The produce side, one per matched channel
    pub produces: Vec<ProduceEvent>,
}

/// One entry of a checkpoint's event log
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Event {
    /// Data published
    Produce(ProduceEvent),
    /// Continuation registered
    Consume(ConsumeEvent),
    /// Match fired
    Comm(CommEvent),
}

impl Event {
    /// The comm event, if this entry is one
    pub fn as_comm(&self) -> Option<&CommEvent> {
        match self {
            Event::Comm(comm) => Some(comm),
            _ => None,
        }
    }
}

/// Ordered event log
pub type EventLog = Vec<Event>;

/// Comm events of a log, in log order
pub fn comm_events(log: &[Event]) -> Vec<CommEvent> {
    log.iter().filter_map(Event::as_comm).cloned().collect()
}
