use std::collections::{HashMap, HashSet, VecDeque};

use farfield_common::ChunkKey;

use crate::budget::FrameBudget;

/// Fraction of the build budget that may be spent admitting queued keys
/// into construction. Chunk creation must stay cheap; the bulk of the
/// budget goes to incremental stepping.
const ADMIT_FRACTION: f32 = 0.25;

/// Result of one incremental build step.
pub enum JobProgress<C> {
    Pending,
    Complete(C),
}

/// An in-flight chunk construction: an explicit record holding its own
/// cursor and partial buffers. One `advance` call does one unit of work
/// (one heightfield row, one scatter item). `Ctx` is whatever external
/// service the bake needs (the scatter pipeline reads terrain heights);
/// it is passed down from the tick instead of reached through globals.
pub trait BuildJob {
    type Chunk;
    type Ctx<'a>: ?Sized;
    fn advance(&mut self, ctx: &Self::Ctx<'_>) -> JobProgress<Self::Chunk>;
}

/// Pipeline-specific half of the scheduler: starts job records and
/// releases finished chunks' resources incrementally.
pub trait ChunkBuilder {
    type Chunk;
    type Ctx<'a>: ?Sized;
    type Job: for<'a> BuildJob<Chunk = Self::Chunk, Ctx<'a> = Self::Ctx<'a>>;

    /// Create the job record for a chunk. Must be cheap; heavy work
    /// belongs in [`BuildJob::advance`].
    fn begin(&mut self, key: ChunkKey) -> Self::Job;

    /// Free one unit of a despawning chunk's resources. Returns true
    /// once the chunk is fully released.
    fn release(&mut self, key: ChunkKey, chunk: &mut Self::Chunk) -> bool;
}

/// Lifecycle of a key as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
    Unqueued,
    Queued,
    Building,
    Ready,
    Despawning,
}

/// Counters from the most recent ticks, for instrumentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    pub chunks_built_this_tick: usize,
    pub build_steps_this_tick: usize,
    pub release_steps_this_tick: usize,
}

/// Budgeted streaming engine, instantiated once per pipeline.
///
/// Owns every chunk lifecycle transition. Consumers only ever see chunks
/// through [`Scheduler::get`] / [`Scheduler::iter_ready`], which expose
/// completed chunks exclusively — a cancelled or in-flight build is
/// invisible.
pub struct Scheduler<B: ChunkBuilder> {
    builder: B,
    ready: HashMap<ChunkKey, B::Chunk>,
    jobs: VecDeque<(ChunkKey, B::Job)>,
    building: HashSet<ChunkKey>,
    build_queue: VecDeque<ChunkKey>,
    queued: HashSet<ChunkKey>,
    despawning: VecDeque<(ChunkKey, B::Chunk)>,
    want: HashSet<ChunkKey>,
    stats: SchedulerStats,
    revision: u64,
}

impl<B: ChunkBuilder> Scheduler<B> {
    pub fn new(builder: B) -> Self {
        Self {
            builder,
            ready: HashMap::new(),
            jobs: VecDeque::new(),
            building: HashSet::new(),
            build_queue: VecDeque::new(),
            queued: HashSet::new(),
            despawning: VecDeque::new(),
            want: HashSet::new(),
            stats: SchedulerStats::default(),
            revision: 0,
        }
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut B {
        &mut self.builder
    }

    /// Reconcile the scheduler against a new demand set: enqueue newly
    /// wanted keys (FIFO, deduplicated, nearest to `center` first), drop
    /// unwanted queued/building work, and queue unwanted ready chunks for
    /// despawn.
    pub fn apply_demand(&mut self, center: ChunkKey, want: HashSet<ChunkKey>) {
        let mut new_keys: Vec<ChunkKey> = want
            .iter()
            .filter(|key| {
                !self.ready.contains_key(key)
                    && !self.building.contains(key)
                    && !self.queued.contains(key)
            })
            .copied()
            .collect();
        new_keys.sort_by_key(|key| (key.ring_distance(center), key.x, key.z));
        for key in new_keys {
            self.queued.insert(key);
            self.build_queue.push_back(key);
        }

        // Unwanted queued keys vanish before construction starts.
        self.queued.retain(|k| want.contains(k));
        self.build_queue.retain(|k| want.contains(k));

        // Unwanted in-flight builds are dropped whole; nothing external
        // ever observed them.
        self.jobs.retain(|(k, _)| want.contains(k));
        self.building.retain(|k| want.contains(k));

        let to_despawn: Vec<ChunkKey> = self
            .ready
            .keys()
            .filter(|k| !want.contains(k))
            .copied()
            .collect();
        for key in to_despawn {
            if let Some(chunk) = self.ready.remove(&key) {
                tracing::debug!(?key, "queueing despawn");
                self.despawning.push_back((key, chunk));
                self.revision += 1;
            }
        }

        self.want = want;
    }

    /// Advance construction within the budget: admit queued keys during
    /// the leading fraction, then step jobs in FIFO order. Completing one
    /// chunk moves straight on to the next, so several chunks can finish
    /// in one tick.
    pub fn build_tick(&mut self, ctx: &B::Ctx<'_>, mut budget: FrameBudget) {
        let _span = tracing::trace_span!("build_tick").entered();
        self.stats.chunks_built_this_tick = 0;
        self.stats.build_steps_this_tick = 0;

        while !budget.fraction_expired(ADMIT_FRACTION) {
            let Some(key) = self.build_queue.pop_front() else {
                break;
            };
            if !self.queued.remove(&key) {
                continue;
            }
            let job = self.builder.begin(key);
            self.jobs.push_back((key, job));
            self.building.insert(key);
            budget.charge();
        }

        while !budget.expired() {
            let Some((key, job)) = self.jobs.front_mut() else {
                break;
            };
            let key = *key;
            match job.advance(ctx) {
                JobProgress::Pending => {}
                JobProgress::Complete(chunk) => {
                    self.jobs.pop_front();
                    self.building.remove(&key);
                    self.ready.insert(key, chunk);
                    self.revision += 1;
                    self.stats.chunks_built_this_tick += 1;
                    tracing::debug!(?key, "chunk ready");
                }
            }
            self.stats.build_steps_this_tick += 1;
            budget.charge();
        }
    }

    /// Incrementally free despawning chunks, a bounded amount per frame.
    pub fn despawn_tick(&mut self, mut budget: FrameBudget) {
        let _span = tracing::trace_span!("despawn_tick").entered();
        self.stats.release_steps_this_tick = 0;

        while !budget.expired() {
            let Some((key, chunk)) = self.despawning.front_mut() else {
                break;
            };
            let key = *key;
            if self.builder.release(key, chunk) {
                self.despawning.pop_front();
                tracing::debug!(?key, "chunk despawned");
            }
            self.stats.release_steps_this_tick += 1;
            budget.charge();
        }
    }

    pub fn state(&self, key: ChunkKey) -> ChunkState {
        if self.ready.contains_key(&key) {
            ChunkState::Ready
        } else if self.building.contains(&key) {
            ChunkState::Building
        } else if self.queued.contains(&key) {
            ChunkState::Queued
        } else if self.despawning.iter().any(|(k, _)| *k == key) {
            ChunkState::Despawning
        } else {
            ChunkState::Unqueued
        }
    }

    /// The chunk for a key, if fully built.
    pub fn get(&self, key: ChunkKey) -> Option<&B::Chunk> {
        self.ready.get(&key)
    }

    pub fn iter_ready(&self) -> impl Iterator<Item = (&ChunkKey, &B::Chunk)> {
        self.ready.iter()
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    pub fn want(&self) -> &HashSet<ChunkKey> {
        &self.want
    }

    /// Fraction of the current demand set that is ready. Non-decreasing
    /// while demand is unchanged: ready chunks in demand stay ready.
    pub fn progress(&self) -> f32 {
        if self.want.is_empty() {
            return 1.0;
        }
        let ready_in_want = self
            .want
            .iter()
            .filter(|k| self.ready.contains_key(k))
            .count();
        ready_in_want as f32 / self.want.len() as f32
    }

    pub fn is_ready(&self) -> bool {
        self.want.iter().all(|k| self.ready.contains_key(k))
    }

    /// True when no queued, in-flight, or despawning work remains.
    pub fn is_idle(&self) -> bool {
        self.build_queue.is_empty() && self.jobs.is_empty() && self.despawning.is_empty()
    }

    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }

    /// Bumped every time the set of ready chunks changes; consumers use
    /// it to dirty-flag aggregates (the world's combined collider list).
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::keys_in_radius;

    struct TestChunk {
        remaining_release: u32,
    }

    struct TestJob {
        remaining: u32,
        release_units: u32,
    }

    impl BuildJob for TestJob {
        type Chunk = TestChunk;
        type Ctx<'a> = ();

        fn advance(&mut self, _ctx: &()) -> JobProgress<TestChunk> {
            self.remaining -= 1;
            if self.remaining == 0 {
                JobProgress::Complete(TestChunk {
                    remaining_release: self.release_units,
                })
            } else {
                JobProgress::Pending
            }
        }
    }

    struct TestBuilder {
        steps_per_chunk: u32,
        release_units: u32,
        begun: Vec<ChunkKey>,
        released: Vec<ChunkKey>,
    }

    impl TestBuilder {
        fn new(steps_per_chunk: u32, release_units: u32) -> Self {
            Self {
                steps_per_chunk,
                release_units,
                begun: Vec::new(),
                released: Vec::new(),
            }
        }
    }

    impl ChunkBuilder for TestBuilder {
        type Chunk = TestChunk;
        type Ctx<'a> = ();
        type Job = TestJob;

        fn begin(&mut self, key: ChunkKey) -> TestJob {
            self.begun.push(key);
            TestJob {
                remaining: self.steps_per_chunk,
                release_units: self.release_units,
            }
        }

        fn release(&mut self, key: ChunkKey, chunk: &mut TestChunk) -> bool {
            chunk.remaining_release -= 1;
            if chunk.remaining_release == 0 {
                self.released.push(key);
                true
            } else {
                false
            }
        }
    }

    const ORIGIN: ChunkKey = ChunkKey { x: 0, z: 0 };

    fn demand(radius: i32) -> HashSet<ChunkKey> {
        keys_in_radius(ORIGIN, radius)
    }

    #[test]
    fn builds_full_demand_with_unlimited_budget() {
        let mut s = Scheduler::new(TestBuilder::new(3, 1));
        s.apply_demand(ORIGIN, demand(1));
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.ready_count(), 9);
        assert!(s.is_ready());
        assert_eq!(s.progress(), 1.0);
    }

    #[test]
    fn reapplying_demand_does_not_duplicate_builds() {
        let mut s = Scheduler::new(TestBuilder::new(2, 1));
        s.apply_demand(ORIGIN, demand(1));
        s.apply_demand(ORIGIN, demand(1));
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.builder().begun.len(), 9);
    }

    #[test]
    fn budget_bounds_work_per_tick() {
        let mut s = Scheduler::new(TestBuilder::new(4, 1));
        s.apply_demand(ORIGIN, demand(1));
        s.build_tick(&(), FrameBudget::units(6));
        assert!(s.ready_count() < 9);

        let mut ticks = 0;
        while !s.is_ready() {
            s.build_tick(&(), FrameBudget::units(6));
            ticks += 1;
            assert!(ticks < 100, "scheduler failed to converge");
        }
        assert_eq!(s.ready_count(), 9);
    }

    #[test]
    fn progress_is_monotonic_while_demand_unchanged() {
        let mut s = Scheduler::new(TestBuilder::new(5, 1));
        s.apply_demand(ORIGIN, demand(2));
        let mut last = s.progress();
        for _ in 0..200 {
            s.build_tick(&(), FrameBudget::units(4));
            let p = s.progress();
            assert!(p >= last, "progress went backwards: {last} -> {p}");
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn queued_key_dropped_when_demand_changes_before_build() {
        let mut s = Scheduler::new(TestBuilder::new(2, 1));
        s.apply_demand(ORIGIN, HashSet::from([ChunkKey::new(0, 0)]));
        assert_eq!(s.state(ChunkKey::new(0, 0)), ChunkState::Queued);
        s.apply_demand(ORIGIN, HashSet::new());
        s.build_tick(&(), FrameBudget::unlimited());
        assert!(s.builder().begun.is_empty());
        assert_eq!(s.state(ChunkKey::new(0, 0)), ChunkState::Unqueued);
    }

    #[test]
    fn building_chunk_is_dropped_without_finishing() {
        let key = ChunkKey::new(0, 0);
        let mut s = Scheduler::new(TestBuilder::new(5, 1));
        s.apply_demand(ORIGIN, HashSet::from([key]));
        // One admission + two steps: job is mid-flight.
        s.build_tick(&(), FrameBudget::units(3));
        assert_eq!(s.state(key), ChunkState::Building);

        s.apply_demand(ORIGIN, HashSet::new());
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.ready_count(), 0);
        assert_eq!(s.state(key), ChunkState::Unqueued);
        assert_eq!(s.builder().begun.len(), 1);
    }

    #[test]
    fn completing_one_chunk_does_not_block_others() {
        let mut s = Scheduler::new(TestBuilder::new(2, 1));
        s.apply_demand(ORIGIN, HashSet::from([ChunkKey::new(0, 0), ChunkKey::new(1, 0)]));
        // 2 admissions + 4 steps fit in one tick.
        s.build_tick(&(), FrameBudget::units(10));
        assert_eq!(s.ready_count(), 2);
    }

    #[test]
    fn despawn_is_incremental_and_complete() {
        let key = ChunkKey::new(0, 0);
        let mut s = Scheduler::new(TestBuilder::new(1, 3));
        s.apply_demand(ORIGIN, HashSet::from([key]));
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.state(key), ChunkState::Ready);

        s.apply_demand(ORIGIN, HashSet::new());
        // Dropped from the queryable map as soon as it is unwanted.
        assert!(s.get(key).is_none());
        assert_eq!(s.state(key), ChunkState::Despawning);

        s.despawn_tick(FrameBudget::units(1));
        assert_eq!(s.state(key), ChunkState::Despawning);
        s.despawn_tick(FrameBudget::units(2));
        assert_eq!(s.state(key), ChunkState::Unqueued);
        assert_eq!(s.builder().released, vec![key]);
        assert!(s.is_idle());
    }

    #[test]
    fn despawn_tick_with_empty_queue_is_noop() {
        let mut s = Scheduler::new(TestBuilder::new(1, 1));
        s.despawn_tick(FrameBudget::units(10));
        assert_eq!(s.stats().release_steps_this_tick, 0);
    }

    #[test]
    fn redemanded_key_rebuilds_while_old_copy_despawns() {
        let key = ChunkKey::new(2, 2);
        let mut s = Scheduler::new(TestBuilder::new(1, 5));
        s.apply_demand(ORIGIN, HashSet::from([key]));
        s.build_tick(&(), FrameBudget::unlimited());
        s.apply_demand(ORIGIN, HashSet::new());
        // Re-demand before the despawn queue drains.
        s.apply_demand(ORIGIN, HashSet::from([key]));
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.state(key), ChunkState::Ready);
        s.despawn_tick(FrameBudget::unlimited());
        // The old instance finished releasing; the new one is untouched.
        assert_eq!(s.builder().released, vec![key]);
        assert_eq!(s.state(key), ChunkState::Ready);
    }

    #[test]
    fn moving_demand_one_chunk_despawns_trailing_ring_only() {
        let mut s = Scheduler::new(TestBuilder::new(1, 1));
        s.apply_demand(ORIGIN, keys_in_radius(ChunkKey::new(0, 0), 3));
        s.build_tick(&(), FrameBudget::unlimited());
        assert_eq!(s.ready_count(), 49);

        s.apply_demand(ORIGIN, keys_in_radius(ChunkKey::new(1, 0), 3));
        // Interior chunks stay ready; only the trailing ring despawns.
        assert_eq!(s.ready_count(), 42);
        for key in keys_in_radius(ChunkKey::new(0, 0), 2) {
            assert_eq!(s.state(key), ChunkState::Ready, "interior key {key:?}");
        }
        let despawning: Vec<ChunkKey> = (-3..=3).map(|z| ChunkKey::new(-3, z)).collect();
        for key in despawning {
            assert_eq!(s.state(key), ChunkState::Despawning);
        }
        s.build_tick(&(), FrameBudget::unlimited());
        assert!(s.is_ready());
    }
}
