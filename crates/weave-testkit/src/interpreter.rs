//! Script interpreter over an in-memory tuple space
//!
//! Runs [`script`](crate::script) programs to quiescence: top-level
//! statements first, then the bodies of fired continuations in firing order.
//! The first failure stops evaluation and is the only reported cause.
//!
//! Vault reads are one-shot takes. On a replay space an unrigged take finds
//! nothing, so a record whose log is missing comm events replays as a
//! failing deploy: the engine reports a status mismatch for it, not an
//! unused comm event.

use crate::script::{self, literal_token, render, Expr, Stmt, Token};
use crate::space::{Fired, MemoryTupleSpace};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::trace;
use weave_core::{
    Channel, CostMeter, Datum, InterpreterEffects, InterpreterError, Pattern, SeededRand,
    SpaceError, TaggedContinuation, Term, Value, WaitingContinuation,
};

/// Phlo charged for every executed statement
pub const STEP_COST: u64 = 1;

/// Public channel holding the bonds map
pub const BONDS_CHANNEL: &str = "pos:bonds";

/// Prefix of vault channels; the suffix is the owner's hex identity or name
pub const VAULT_PREFIX: &str = "vault:";

/// Native handler id used for one-shot reads
const TAKE_HANDLER: u64 = u64::MAX;

type Env = HashMap<String, Value>;

/// Vault channel for an identity value
pub fn vault_channel(owner: &Value) -> Result<Channel, InterpreterError> {
    match owner {
        Value::Bytes(bytes) => Ok(Channel::public(format!("{VAULT_PREFIX}{}", hex::encode(bytes)))),
        Value::Str(name) => Ok(Channel::public(format!("{VAULT_PREFIX}{name}"))),
        other => Err(evaluation(format!("{other} is not a vault owner"))),
    }
}

fn evaluation(message: impl Into<String>) -> InterpreterError {
    InterpreterError::Evaluation {
        message: message.into(),
    }
}

fn internal(err: SpaceError) -> InterpreterError {
    InterpreterError::Internal {
        message: err.to_string(),
    }
}

/// Interpreter bound to one tuple space
#[derive(Debug, Clone)]
pub struct ScriptInterpreter {
    space: Arc<MemoryTupleSpace>,
}

impl ScriptInterpreter {
    /// Interpreter evaluating against `space`
    pub fn new(space: Arc<MemoryTupleSpace>) -> Self {
        Self { space }
    }

    fn run(
        &self,
        term: &Term,
        rand: &mut SeededRand,
        meter: &CostMeter,
    ) -> Result<(), InterpreterError> {
        let program = script::parse(term.source()).map_err(|e| InterpreterError::Syntax {
            message: e.to_string(),
        })?;

        let mut queue = VecDeque::from([(program, Env::new())]);
        while let Some((stmts, mut env)) = queue.pop_front() {
            for stmt in stmts {
                meter.charge(STEP_COST)?;
                self.exec(stmt, &mut env, rand, meter, &mut queue)?;
            }
        }
        Ok(())
    }

    fn exec(
        &self,
        stmt: Stmt,
        env: &mut Env,
        rand: &mut SeededRand,
        meter: &CostMeter,
        queue: &mut VecDeque<(Vec<Stmt>, Env)>,
    ) -> Result<(), InterpreterError> {
        match stmt {
            Stmt::Send { channel, value } => {
                let channel = Channel(eval(&channel, env)?);
                let value = eval(&value, env)?;
                self.produce(channel, value, queue)?;
            }
            Stmt::Listen {
                channel,
                pattern,
                body,
            } => {
                let channel = Channel(eval(&channel, env)?);
                let bound = match &pattern {
                    Pattern::Bind(name) => Some(name.as_str()),
                    _ => None,
                };
                let body = capture(&body, env, bound)?;
                let wk = WaitingContinuation {
                    patterns: vec![pattern],
                    continuation: TaggedContinuation::Program(Term::new(body)),
                    persist: false,
                };
                let fired = self.space.consume(vec![channel], wk).map_err(internal)?;
                self.schedule(fired, queue)?;
            }
            Stmt::Native { channel, id } => {
                let channel = Channel(eval(&channel, env)?);
                let wk = WaitingContinuation {
                    patterns: vec![Pattern::Wildcard],
                    continuation: TaggedContinuation::Native(id),
                    persist: false,
                };
                let fired = self.space.consume(vec![channel], wk).map_err(internal)?;
                self.schedule(fired, queue)?;
            }
            Stmt::New(name) => {
                env.insert(name, Value::Unforgeable(rand.next_name()));
            }
            Stmt::Copy { from, to } => {
                let from = Channel(eval(&from, env)?);
                let to = Channel(eval(&to, env)?);
                if let Some(value) = self.take(&from)? {
                    self.produce(from, value.clone(), queue)?;
                    self.produce(to, value, queue)?;
                }
            }
            Stmt::Mint { to, amount } => {
                let vault = vault_channel(&eval(&to, env)?)?;
                let amount = amount_of(&eval(&amount, env)?)?;
                let balance = self.balance(&vault)?;
                let credited = balance
                    .checked_add(amount)
                    .ok_or_else(|| evaluation("balance overflow"))?;
                self.produce(vault, Value::Int(credited), queue)?;
            }
            Stmt::Transfer { from, to, amount } => {
                let source = vault_channel(&eval(&from, env)?)?;
                let target = vault_channel(&eval(&to, env)?)?;
                let amount = amount_of(&eval(&amount, env)?)?;
                let available = self.balance(&source)?;
                if available < amount {
                    self.produce(source, Value::Int(available), queue)?;
                    return Err(InterpreterError::UserAbort {
                        message: format!("insufficient funds: {available} < {amount}"),
                    });
                }
                self.produce(source, Value::Int(available - amount), queue)?;
                let held = self.balance(&target)?;
                let credited = held
                    .checked_add(amount)
                    .ok_or_else(|| evaluation("balance overflow"))?;
                self.produce(target, Value::Int(credited), queue)?;
            }
            Stmt::Bond { validator, stake } => {
                let validator = eval(&validator, env)?;
                if validator.as_bytes().is_none() {
                    return Err(evaluation(format!("{validator} is not a validator identity")));
                }
                let stake = amount_of(&eval(&stake, env)?)?;
                let bonds_channel = Channel::public(BONDS_CHANNEL);
                let mut entries = match self.take(&bonds_channel)? {
                    Some(Value::Map(entries)) => entries,
                    Some(other) => return Err(evaluation(format!("bonds map corrupted: {other}"))),
                    None => Vec::new(),
                };
                match entries.binary_search_by(|(key, _)| key.cmp(&validator)) {
                    Ok(index) => entries[index].1 = Value::Int(stake),
                    Err(index) => entries.insert(index, (validator, Value::Int(stake))),
                }
                self.produce(bonds_channel, Value::Map(entries), queue)?;
            }
            Stmt::Burn(amount) => {
                let amount = amount_of(&eval(&amount, env)?)?;
                meter.charge(amount as u64)?;
            }
            Stmt::Fail(message) => return Err(InterpreterError::UserAbort { message }),
            Stmt::Abort(message) => return Err(InterpreterError::Internal { message }),
        }
        Ok(())
    }

    fn produce(
        &self,
        channel: Channel,
        value: Value,
        queue: &mut VecDeque<(Vec<Stmt>, Env)>,
    ) -> Result<(), InterpreterError> {
        let fired = self
            .space
            .produce(channel, Datum::once(value))
            .map_err(internal)?;
        self.schedule(fired, queue)
    }

    /// Remove and return the first datum on `channel`
    fn take(&self, channel: &Channel) -> Result<Option<Value>, InterpreterError> {
        let wk = WaitingContinuation {
            patterns: vec![Pattern::Wildcard],
            continuation: TaggedContinuation::Native(TAKE_HANDLER),
            persist: false,
        };
        let fired = self
            .space
            .try_consume(vec![channel.clone()], wk)
            .map_err(internal)?;
        Ok(fired.and_then(|fired| fired.values.into_iter().next()))
    }

    fn balance(&self, vault: &Channel) -> Result<i64, InterpreterError> {
        match self.take(vault)? {
            None => Ok(0),
            Some(Value::Int(balance)) => Ok(balance),
            Some(other) => Err(evaluation(format!("vault {vault} holds {other}"))),
        }
    }

    fn schedule(
        &self,
        fired: Option<Fired>,
        queue: &mut VecDeque<(Vec<Stmt>, Env)>,
    ) -> Result<(), InterpreterError> {
        let Some(Fired {
            continuation,
            values,
        }) = fired
        else {
            return Ok(());
        };
        match continuation.continuation {
            TaggedContinuation::Program(term) => {
                let body = script::parse(term.source()).map_err(|e| InterpreterError::Internal {
                    message: format!("stored continuation does not parse: {e}"),
                })?;
                let env = continuation
                    .patterns
                    .iter()
                    .zip(values)
                    .filter_map(|(pattern, value)| match pattern {
                        Pattern::Bind(name) => Some((name.clone(), value)),
                        _ => None,
                    })
                    .collect();
                queue.push_back((body, env));
            }
            TaggedContinuation::Native(id) => {
                trace!(handler = id, "native continuation fired");
            }
        }
        Ok(())
    }
}

fn eval(expr: &Expr, env: &Env) -> Result<Value, InterpreterError> {
    match expr {
        Expr::Lit(value) => Ok(value.clone()),
        Expr::Var(name) => env
            .get(name)
            .cloned()
            .ok_or_else(|| evaluation(format!("unbound variable ${name}"))),
    }
}

fn amount_of(value: &Value) -> Result<i64, InterpreterError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n),
        other => Err(evaluation(format!("{other} is not a non-negative amount"))),
    }
}

/// Close a continuation body over the variables it references.
///
/// `$bound` and names unknown here are left in place for the pattern (or a
/// nested pattern) to bind at firing time.
fn capture(body: &[Token], env: &Env, bound: Option<&str>) -> Result<String, InterpreterError> {
    let tokens = body
        .iter()
        .map(|token| match token {
            Token::Var(name) if Some(name.as_str()) != bound => match env.get(name) {
                Some(value) => literal_token(value)
                    .ok_or_else(|| evaluation(format!("${name} cannot be captured"))),
                None => Ok(token.clone()),
            },
            other => Ok(other.clone()),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(render(&tokens))
}

#[async_trait]
impl InterpreterEffects for ScriptInterpreter {
    async fn evaluate(
        &self,
        term: &Term,
        mut rand: SeededRand,
        meter: &CostMeter,
    ) -> Vec<InterpreterError> {
        match self.run(term, &mut rand, meter) {
            Ok(()) => Vec::new(),
            Err(error) => {
                trace!(%error, replay = self.space.is_replay(), "evaluation stopped");
                vec![error]
            }
        }
    }
}
