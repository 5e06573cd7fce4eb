//! In-memory tuple space
//!
//! A content-addressed store with a history of committed states. The primary
//! space and its replay twin share one history, so any root either of them
//! commits can be reset to by the other.
//!
//! Matching is first-fit in channel order. In replay mode a match only fires
//! when the corresponding comm event was rigged from the recorded log; an
//! unrigged match leaves both sides waiting, exactly like a store that was
//! never told about it.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;
use weave_core::serialization::hash_canonical_tagged;
use weave_core::{
    comm_events, Channel, Checkpoint, CommEvent, ConsumeEvent, Datum, Event, EventHash, EventLog,
    ProduceEvent, ReplayTupleSpaceEffects, SpaceError, SpaceRow, StateHash, TupleSpaceEffects,
    Value, WaitingContinuation,
};

const ROOT_TAG: &[u8] = b"WEAVE_SPACE_ROOT";
const CHANNEL_TAG: &[u8] = b"WEAVE_CHANNEL";
const PRODUCE_TAG: &[u8] = b"WEAVE_PRODUCE";
const CONSUME_TAG: &[u8] = b"WEAVE_CONSUME";

/// Committed contents of a space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SpaceState {
    data: BTreeMap<Channel, Vec<Datum>>,
    waiting: BTreeMap<Vec<Channel>, Vec<WaitingContinuation>>,
}

impl SpaceState {
    fn root(&self) -> Result<StateHash, SpaceError> {
        let data: Vec<_> = self.data.iter().collect();
        let waiting: Vec<_> = self.waiting.iter().collect();
        hash_canonical_tagged(ROOT_TAG, &(data, waiting))
            .map(StateHash::new)
            .map_err(|e| SpaceError::storage(format!("cannot hash state: {e}")))
    }

    fn push_datum(&mut self, channel: Channel, datum: Datum) {
        self.data.entry(channel).or_default().push(datum);
    }

    fn push_waiting(&mut self, channels: Vec<Channel>, wk: WaitingContinuation) {
        self.waiting.entry(channels).or_default().push(wk);
    }

    /// Index of the first datum on each channel satisfying its pattern.
    ///
    /// A channel listed more than once in a join never hands the same datum
    /// to two patterns.
    fn find_match(&self, channels: &[Channel], wk: &WaitingContinuation) -> Option<Vec<usize>> {
        let mut indices: Vec<usize> = Vec::with_capacity(channels.len());
        for (position, (channel, pattern)) in channels.iter().zip(&wk.patterns).enumerate() {
            let taken = |index: usize| {
                channels[..position]
                    .iter()
                    .zip(&indices)
                    .any(|(earlier, &chosen)| earlier == channel && chosen == index)
            };
            let index = self
                .data
                .get(channel)?
                .iter()
                .enumerate()
                .find(|(index, datum)| !taken(*index) && pattern.matches(&datum.value))
                .map(|(index, _)| index)?;
            indices.push(index);
        }
        Some(indices)
    }

    /// Remove matched non-persistent data and return the matched values in
    /// pattern order
    fn take_matched(&mut self, channels: &[Channel], indices: &[usize]) -> Vec<Value> {
        let mut values = Vec::with_capacity(channels.len());
        let mut removals: BTreeMap<&Channel, Vec<usize>> = BTreeMap::new();
        for (channel, &index) in channels.iter().zip(indices) {
            let Some(datum) = self.data.get(channel).and_then(|data| data.get(index)) else {
                continue;
            };
            values.push(datum.value.clone());
            if !datum.persist {
                removals.entry(channel).or_default().push(index);
            }
        }
        for (channel, mut doomed) in removals {
            let Some(data) = self.data.get_mut(channel) else {
                continue;
            };
            doomed.sort_unstable_by(|a, b| b.cmp(a));
            for index in doomed {
                data.remove(index);
            }
            if data.is_empty() {
                self.data.remove(channel);
            }
        }
        values
    }

    fn remove_waiting(&mut self, channels: &[Channel], index: usize) {
        if let Some(wks) = self.waiting.get_mut(channels) {
            wks.remove(index);
            if wks.is_empty() {
                self.waiting.remove(channels);
            }
        }
    }
}

/// A continuation that fired, with the values it matched in channel order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
    /// The continuation to run
    pub continuation: WaitingContinuation,
    /// Matched values, one per channel
    pub values: Vec<Value>,
}

#[derive(Debug, Default)]
struct Live {
    state: SpaceState,
    log: EventLog,
    rigged: Vec<CommEvent>,
}

impl Live {
    /// Whether a comm event may fire; consumes the rigged entry in replay mode
    fn admit(&mut self, replay: bool, comm: &CommEvent) -> bool {
        if !replay {
            return true;
        }
        match self.rigged.iter().position(|rigged| rigged == comm) {
            Some(index) => {
                self.rigged.remove(index);
                true
            }
            None => false,
        }
    }

    fn reset_to(&mut self, state: SpaceState) {
        self.state = state;
        self.log.clear();
        self.rigged.clear();
    }
}

/// In-memory tuple space with shared history
#[derive(Debug)]
pub struct MemoryTupleSpace {
    history: Arc<RwLock<HashMap<StateHash, SpaceState>>>,
    live: Mutex<Live>,
    replay: bool,
    fault: Mutex<Option<SpaceError>>,
}

impl Default for MemoryTupleSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTupleSpace {
    /// Primary space with an empty history
    pub fn new() -> Self {
        Self::with_history(Arc::default(), false)
    }

    /// Primary space and its replay twin over one shared history
    pub fn pair() -> (Self, Self) {
        let primary = Self::new();
        let replay = primary.replay_twin();
        (primary, replay)
    }

    /// Replay space sharing this space's history
    pub fn replay_twin(&self) -> Self {
        Self::with_history(Arc::clone(&self.history), true)
    }

    fn with_history(history: Arc<RwLock<HashMap<StateHash, SpaceState>>>, replay: bool) -> Self {
        Self {
            history,
            live: Mutex::new(Live::default()),
            replay,
            fault: Mutex::new(None),
        }
    }

    /// Whether this space only fires rigged comm events
    pub fn is_replay(&self) -> bool {
        self.replay
    }

    /// Make every subsequent trait operation fail with `error` until
    /// [`clear_fault`](Self::clear_fault) is called
    pub fn inject_fault(&self, error: SpaceError) {
        *self.fault.lock() = Some(error);
    }

    /// Stop failing trait operations
    pub fn clear_fault(&self) {
        *self.fault.lock() = None;
    }

    /// Number of committed states
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Number of rigged comm events not yet reproduced
    pub fn pending_rigged(&self) -> usize {
        self.live.lock().rigged.len()
    }

    fn check_fault(&self) -> Result<(), SpaceError> {
        match self.fault.lock().as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    /// Publish `datum` on `channel`, firing the first waiting continuation
    /// it completes
    pub fn produce(&self, channel: Channel, datum: Datum) -> Result<Option<Fired>, SpaceError> {
        let mut live = self.live.lock();
        let produce = produce_event(&channel, &datum)?;
        live.log.push(Event::Produce(produce));
        live.state.push_datum(channel.clone(), datum);

        let candidates: Vec<(Vec<Channel>, usize, WaitingContinuation)> = live
            .state
            .waiting
            .iter()
            .filter(|(group, _)| group.contains(&channel))
            .flat_map(|(group, wks)| {
                wks.iter()
                    .enumerate()
                    .map(move |(index, wk)| (group.clone(), index, wk.clone()))
            })
            .collect();

        for (group, index, wk) in candidates {
            let Some(indices) = live.state.find_match(&group, &wk) else {
                continue;
            };
            let comm = comm_event(&live.state, &group, &wk, &indices)?;
            if !live.admit(self.replay, &comm) {
                continue;
            }
            let values = live.state.take_matched(&group, &indices);
            if !wk.persist {
                live.state.remove_waiting(&group, index);
            }
            live.log.push(Event::Comm(comm));
            trace!(channel = %channel, "produce fired continuation");
            return Ok(Some(Fired {
                continuation: wk,
                values,
            }));
        }
        Ok(None)
    }

    /// Register `wk` on `channels`, firing immediately when matching data is
    /// already present
    pub fn consume(
        &self,
        channels: Vec<Channel>,
        wk: WaitingContinuation,
    ) -> Result<Option<Fired>, SpaceError> {
        self.consume_inner(channels, wk, true)
    }

    /// Match `wk` against present data without leaving it waiting on a miss
    pub fn try_consume(
        &self,
        channels: Vec<Channel>,
        wk: WaitingContinuation,
    ) -> Result<Option<Fired>, SpaceError> {
        self.consume_inner(channels, wk, false)
    }

    fn consume_inner(
        &self,
        channels: Vec<Channel>,
        wk: WaitingContinuation,
        wait_on_miss: bool,
    ) -> Result<Option<Fired>, SpaceError> {
        if channels.len() != wk.patterns.len() {
            return Err(SpaceError::storage(format!(
                "{} patterns for {} channels",
                wk.patterns.len(),
                channels.len()
            )));
        }

        let mut live = self.live.lock();
        let consume = consume_event(&channels, &wk)?;
        live.log.push(Event::Consume(consume));

        if let Some(indices) = live.state.find_match(&channels, &wk) {
            let comm = comm_event(&live.state, &channels, &wk, &indices)?;
            if live.admit(self.replay, &comm) {
                let values = live.state.take_matched(&channels, &indices);
                if wk.persist && wait_on_miss {
                    live.state.push_waiting(channels, wk.clone());
                }
                live.log.push(Event::Comm(comm));
                return Ok(Some(Fired {
                    continuation: wk,
                    values,
                }));
            }
        }

        if wait_on_miss {
            live.state.push_waiting(channels, wk);
        }
        Ok(None)
    }
}

fn hash_of<T: serde::Serialize>(tag: &[u8], value: &T) -> Result<EventHash, SpaceError> {
    hash_canonical_tagged(tag, value)
        .map(EventHash)
        .map_err(|e| SpaceError::storage(format!("cannot hash event: {e}")))
}

fn produce_event(channel: &Channel, datum: &Datum) -> Result<ProduceEvent, SpaceError> {
    Ok(ProduceEvent {
        channel_hash: hash_of(CHANNEL_TAG, channel)?,
        hash: hash_of(PRODUCE_TAG, &(channel, datum))?,
        persistent: datum.persist,
    })
}

fn consume_event(channels: &[Channel], wk: &WaitingContinuation) -> Result<ConsumeEvent, SpaceError> {
    Ok(ConsumeEvent {
        channel_hashes: channels
            .iter()
            .map(|channel| hash_of(CHANNEL_TAG, channel))
            .collect::<Result<_, _>>()?,
        hash: hash_of(CONSUME_TAG, &(channels, wk))?,
        persistent: wk.persist,
    })
}

fn comm_event(
    state: &SpaceState,
    channels: &[Channel],
    wk: &WaitingContinuation,
    indices: &[usize],
) -> Result<CommEvent, SpaceError> {
    let produces = channels
        .iter()
        .zip(indices)
        .map(|(channel, &index)| {
            let datum = state
                .data
                .get(channel)
                .and_then(|data| data.get(index))
                .ok_or_else(|| SpaceError::storage(format!("matched datum vanished from {channel}")))?;
            produce_event(channel, datum)
        })
        .collect::<Result<_, _>>()?;
    Ok(CommEvent {
        consume: consume_event(channels, wk)?,
        produces,
    })
}

#[async_trait]
impl TupleSpaceEffects for MemoryTupleSpace {
    async fn reset(&self, root: &StateHash) -> Result<(), SpaceError> {
        self.check_fault()?;
        let state = self
            .history
            .read()
            .get(root)
            .cloned()
            .ok_or(SpaceError::UnknownRoot { root: *root })?;
        self.live.lock().reset_to(state);
        Ok(())
    }

    async fn clear(&self) -> Result<(), SpaceError> {
        self.check_fault()?;
        self.live.lock().reset_to(SpaceState::default());
        Ok(())
    }

    async fn get_data(&self, channel: &Channel) -> Result<Vec<Datum>, SpaceError> {
        self.check_fault()?;
        Ok(self
            .live
            .lock()
            .state
            .data
            .get(channel)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_waiting_continuations(
        &self,
        channels: &[Channel],
    ) -> Result<Vec<WaitingContinuation>, SpaceError> {
        self.check_fault()?;
        Ok(self
            .live
            .lock()
            .state
            .waiting
            .get(channels)
            .cloned()
            .unwrap_or_default())
    }

    async fn install(&self, channel: Channel, datum: Datum) -> Result<(), SpaceError> {
        self.check_fault()?;
        self.live.lock().state.push_datum(channel, datum);
        Ok(())
    }

    async fn create_checkpoint(&self) -> Result<Checkpoint, SpaceError> {
        self.check_fault()?;
        let mut live = self.live.lock();
        let root = live.state.root()?;
        self.history.write().insert(root, live.state.clone());
        let log = std::mem::take(&mut live.log);
        live.rigged.clear();
        trace!(root = %root, events = log.len(), replay = self.replay, "checkpoint created");
        Ok(Checkpoint { root, log })
    }

    async fn rows(&self) -> Result<Vec<SpaceRow>, SpaceError> {
        self.check_fault()?;
        let live = self.live.lock();
        let state = &live.state;
        let keys: BTreeSet<Vec<Channel>> = state
            .data
            .keys()
            .map(|channel| vec![channel.clone()])
            .chain(state.waiting.keys().cloned())
            .collect();
        Ok(keys
            .into_iter()
            .map(|channels| {
                let data = match channels.as_slice() {
                    [channel] => state.data.get(channel).cloned().unwrap_or_default(),
                    _ => Vec::new(),
                };
                let continuations = state.waiting.get(&channels).cloned().unwrap_or_default();
                SpaceRow {
                    channels,
                    data,
                    continuations,
                }
            })
            .collect())
    }
}

#[async_trait]
impl ReplayTupleSpaceEffects for MemoryTupleSpace {
    async fn rig(&self, root: &StateHash, log: &[Event]) -> Result<(), SpaceError> {
        self.reset(root).await?;
        let comms = comm_events(log);
        if let Some(bad) = comms.iter().find(|comm| comm.produces.is_empty()) {
            return Err(SpaceError::unused_comm_event(format!(
                "comm event without produces: {:?}",
                bad.consume.hash
            )));
        }
        self.live.lock().rigged = comms;
        Ok(())
    }

    async fn check_replay_data(&self) -> Result<(), SpaceError> {
        self.check_fault()?;
        let live = self.live.lock();
        if live.rigged.is_empty() {
            Ok(())
        } else {
            Err(SpaceError::unused_comm_event(format!(
                "{} rigged comm events were not reproduced",
                live.rigged.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weave_core::{Pattern, TaggedContinuation, Term};

    fn listener(body: &str) -> WaitingContinuation {
        WaitingContinuation {
            patterns: vec![Pattern::Bind("x".into())],
            continuation: TaggedContinuation::Program(Term::new(body)),
            persist: false,
        }
    }

    #[tokio::test]
    async fn test_roots_are_content_addressed() {
        let (a, b) = (MemoryTupleSpace::new(), MemoryTupleSpace::new());
        for space in [&a, &b] {
            space
                .install(Channel::public("x"), Datum::once(Value::Int(1)))
                .await
                .unwrap();
        }
        let ra = a.create_checkpoint().await.unwrap().root;
        let rb = b.create_checkpoint().await.unwrap().root;
        assert_eq!(ra, rb);

        a.clear().await.unwrap();
        let empty = a.create_checkpoint().await.unwrap().root;
        assert_ne!(ra, empty);
    }

    #[tokio::test]
    async fn test_reset_unknown_root() {
        let space = MemoryTupleSpace::new();
        let err = space.reset(&StateHash::new([9; 32])).await.unwrap_err();
        assert!(matches!(err, SpaceError::UnknownRoot { .. }));
    }

    #[tokio::test]
    async fn test_produce_fires_waiting_continuation() {
        let space = MemoryTupleSpace::new();
        let ch = Channel::public("c");
        assert!(space.consume(vec![ch.clone()], listener("noop")).unwrap().is_none());
        let fired = space
            .produce(ch.clone(), Datum::once(Value::Int(5)))
            .unwrap()
            .unwrap();
        assert_eq!(fired.values, vec![Value::Int(5)]);
        assert!(space.get_data(&ch).await.unwrap().is_empty());
        assert!(space.get_waiting_continuations(&[ch]).await.unwrap().is_empty());

        let log = space.create_checkpoint().await.unwrap().log;
        assert_eq!(comm_events(&log).len(), 1);
    }

    #[tokio::test]
    async fn test_replay_only_fires_rigged_comms() {
        let (primary, replay) = MemoryTupleSpace::pair();
        primary.clear().await.unwrap();
        let ch = Channel::public("c");
        primary.produce(ch.clone(), Datum::once(Value::Int(1))).unwrap();
        let start = primary.create_checkpoint().await.unwrap().root;

        primary.reset(&start).await.unwrap();
        assert!(primary.consume(vec![ch.clone()], listener("noop")).unwrap().is_some());
        let recorded = primary.create_checkpoint().await.unwrap();

        // Unrigged: the match does not happen
        replay.rig(&start, &[]).await.unwrap();
        assert!(replay.consume(vec![ch.clone()], listener("noop")).unwrap().is_none());

        replay.rig(&start, &recorded.log).await.unwrap();
        assert_eq!(replay.pending_rigged(), 1);
        assert!(replay.consume(vec![ch], listener("noop")).unwrap().is_some());
        replay.check_replay_data().await.unwrap();
        let replayed = replay.create_checkpoint().await.unwrap();
        assert_eq!(replayed.root, recorded.root);
    }

    #[tokio::test]
    async fn test_leftover_rigged_comm_is_reported() {
        let (primary, replay) = MemoryTupleSpace::pair();
        primary.clear().await.unwrap();
        let ch = Channel::public("c");
        primary.produce(ch.clone(), Datum::once(Value::Int(1))).unwrap();
        primary.consume(vec![ch], listener("noop")).unwrap();
        let cp = primary.create_checkpoint().await.unwrap();

        replay.rig(&cp.root, &cp.log).await.unwrap();
        let err = replay.check_replay_data().await.unwrap_err();
        assert!(matches!(err, SpaceError::UnusedCommEvent { .. }));
    }

    #[tokio::test]
    async fn test_injected_fault() {
        let space = MemoryTupleSpace::new();
        space.inject_fault(SpaceError::storage("disk gone"));
        assert!(space.clear().await.is_err());
        space.clear_fault();
        space.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_rows_group_data_and_waiters() {
        let space = MemoryTupleSpace::new();
        let (a, b) = (Channel::public("a"), Channel::public("b"));
        space.produce(a.clone(), Datum::once(Value::Int(1))).unwrap();
        let join = WaitingContinuation {
            patterns: vec![Pattern::Wildcard, Pattern::Wildcard],
            continuation: TaggedContinuation::Native(1),
            persist: false,
        };
        space.consume(vec![a.clone(), b.clone()], join).unwrap();

        let rows = space.rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channels, vec![a.clone()]);
        assert_eq!(rows[0].data.len(), 1);
        assert_eq!(rows[1].channels, vec![a, b]);
        assert_eq!(rows[1].continuations.len(), 1);
    }

    #[tokio::test]
    async fn test_join_on_repeated_channel_takes_distinct_data() {
        let space = MemoryTupleSpace::new();
        let ch = Channel::public("c");
        let pair = WaitingContinuation {
            patterns: vec![Pattern::Wildcard, Pattern::Wildcard],
            continuation: TaggedContinuation::Native(2),
            persist: false,
        };
        space.produce(ch.clone(), Datum::once(Value::Int(1))).unwrap();
        assert!(space
            .try_consume(vec![ch.clone(), ch.clone()], pair.clone())
            .unwrap()
            .is_none());

        space.produce(ch.clone(), Datum::once(Value::Int(2))).unwrap();
        space.produce(ch.clone(), Datum::once(Value::Int(3))).unwrap();
        let fired = space
            .try_consume(vec![ch.clone(), ch.clone()], pair)
            .unwrap()
            .unwrap();
        assert_eq!(fired.values, vec![Value::Int(1), Value::Int(2)]);
        let left = space.get_data(&ch).await.unwrap();
        assert_eq!(left, vec![Datum::once(Value::Int(3))]);
    }
}
