//! Data model shared by the engine and its collaborators

pub mod deploy;
pub mod event;
pub mod state;
pub mod value;

pub use deploy::{Cost, Deploy, DeployStatus, InterpreterError, ProcessedDeploy, Term};
pub use event::{
    comm_events, CommEvent, ConsumeEvent, Event, EventHash, EventLog, ProduceEvent,
};
pub use state::{Checkpoint, StateHash};
pub use value::{Bond, Channel, Datum, Pattern, TaggedContinuation, Value, WaitingContinuation};
