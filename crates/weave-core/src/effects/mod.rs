//! Collaborator effect interfaces
//!
//! Pure trait signatures for the interpreter and the tuple spaces the engine
//! drives. Implementations live outside this crate.

pub mod interpreter;
pub mod space;

pub use interpreter::InterpreterEffects;
pub use space::{ReplayTupleSpaceEffects, SpaceError, SpaceRow, TupleSpaceEffects};
