//! Phlo metering
//!
//! The meter is part of the runtime context. The injector sets a deploy's
//! budget, the interpreter charges it, and the injector reads back what was
//! consumed. Consumption is clamped to the budget: a deploy that runs out is
//! charged exactly its limit.

use crate::types::{Cost, InterpreterError};
use parking_lot::Mutex;

#[derive(Debug, Default)]
struct MeterState {
    limit: u64,
    consumed: u64,
}

/// Cost meter shared by the injector and the interpreter
#[derive(Debug, Default)]
pub struct CostMeter {
    state: Mutex<MeterState>,
}

impl CostMeter {
    /// Meter with a zero budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh evaluation with `limit` phlo available
    pub fn set_limit(&self, limit: u64) {
        let mut state = self.state.lock();
        state.limit = limit;
        state.consumed = 0;
    }

    /// Charge `amount` phlo.
    ///
    /// On exhaustion consumption is pinned to the limit and the charge fails
    /// with [`InterpreterError::OutOfPhlogistons`].
    pub fn charge(&self, amount: u64) -> Result<(), InterpreterError> {
        let mut state = self.state.lock();
        match state.consumed.checked_add(amount) {
            Some(total) if total <= state.limit => {
                state.consumed = total;
                Ok(())
            }
            _ => {
                state.consumed = state.limit;
                Err(InterpreterError::OutOfPhlogistons)
            }
        }
    }

    /// Phlo consumed since the last `set_limit`
    pub fn consumed(&self) -> Cost {
        Cost(self.state.lock().consumed)
    }

    /// Phlo still available
    pub fn remaining(&self) -> u64 {
        let state = self.state.lock();
        state.limit - state.consumed
    }
}
