//! # Load Balancer — Adaptive Work Distribution for Special Leaves
//!
//! Workers pull (low, segment_size, segments) work units from a single
//! shared frontier that only moves forward; there is no stealing, so units
//! are emitted in strictly increasing `low` order. One mutex guards the
//! state and is only held for O(1) bookkeeping, never across sieving.
//!
//! ## Ordered Merge
//!
//! A unit is processed without knowing how many unsieved positions precede
//! it, so each worker returns, per prime level b, the signed count of
//! leaves it resolved (`leaf_counts[b]`) and the unsieved positions its
//! range contributes (`phi_deltas[b]`), plus a sum computed against a zero
//! baseline. Results are buffered and merged in ascending `low` order:
//!
//!   sum += unit.sum + Σ_b phi[b] * unit.leaf_counts[b]
//!   phi[b] += unit.phi_deltas[b]
//!
//! which reconstructs exactly the single-threaded result regardless of
//! completion order.
//!
//! ## Adaptation
//!
//! After each merged unit the balancer re-tunes the unit shape from the
//! worker's measured times: segment_size doubles toward sqrt(sieve_limit)
//! (capped at an L2-resident power of two) while work remains, and the
//! segment count per unit doubles or halves so one unit costs roughly
//! remaining_secs / threads, with a floor keeping per-unit sieve
//! initialization below 10% of runtime.
//!
//! ## Backup
//!
//! With a checkpoint path configured the balancer snapshots its merged
//! frontier, partial sum, per-level counts and in-flight units every few
//! seconds; on startup a matching snapshot re-issues the in-flight units
//! first and resumes the frontier.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use crate::checkpoint::{self, Backup, UnitBackup};
use crate::status::{percent, Status};

/// Seconds between checkpoint writes.
const BACKUP_SECS: f64 = 10.0;
/// Ceiling for the per-unit wall time target.
const MAX_UNIT_SECS: f64 = 5.0;
/// Power-of-two cap on segment_size (bits), sized for L2-resident sieving.
const MAX_SEGMENT_BITS: u64 = 1 << 22;

/// One worker's assignment and measurements.
pub struct ThreadData {
    pub thread_id: usize,
    pub low: u64,
    pub segments: u64,
    pub segment_size: u64,
    pub init_secs: f64,
    pub secs: f64,
    started: Option<Instant>,
}

impl ThreadData {
    pub fn new(thread_id: usize) -> Self {
        ThreadData {
            thread_id,
            low: 0,
            segments: 0,
            segment_size: 0,
            init_secs: 0.0,
            secs: 0.0,
            started: None,
        }
    }

    pub fn start_time(&mut self) {
        self.started = Some(Instant::now());
    }

    pub fn init_finished(&mut self) {
        if let Some(t) = self.started {
            self.init_secs = t.elapsed().as_secs_f64();
        }
    }

    pub fn stop_time(&mut self) {
        if let Some(t) = self.started {
            self.secs = t.elapsed().as_secs_f64();
        }
    }
}

/// What a worker hands back for one processed unit.
pub struct UnitResult {
    pub low: u64,
    /// exclusive end of the unit's range
    pub high: u64,
    /// leaf sum computed against a zero phi baseline
    pub sum: i128,
    /// per prime level: signed number of leaves resolved
    pub leaf_counts: Vec<i64>,
    /// per prime level: unsieved positions contributed by this range
    pub phi_deltas: Vec<u64>,
}

/// Identifies a run for checkpoint validation.
pub struct BackupConfig {
    pub path: PathBuf,
    pub formula: &'static str,
    pub x: u128,
    pub y: u64,
    pub z: u64,
    pub k: u64,
}

struct State {
    low: u64,
    segment_size: u64,
    segments: u64,
    sum: i128,
    phi: Vec<u64>,
    next_merge_low: u64,
    pending: BTreeMap<u64, UnitResult>,
    in_flight: HashMap<usize, UnitBackup>,
    resume_queue: Vec<UnitBackup>,
    status: Status,
    last_backup: Instant,
}

pub struct LoadBalancer {
    state: Mutex<State>,
    sieve_limit: u64,
    max_size: u64,
    sum_approx: i128,
    threads: usize,
    start: Instant,
    backup: Option<BackupConfig>,
}

impl LoadBalancer {
    /// `sieve_limit` is exclusive; `levels` sizes the per-level vectors
    /// (one slot per sieving prime index).
    pub fn new(
        sieve_limit: u64,
        levels: usize,
        sum_approx: i128,
        threads: usize,
        backup: Option<BackupConfig>,
    ) -> Self {
        let max_size = crate::imath::isqrt(sieve_limit)
            .next_power_of_two()
            .clamp(16, MAX_SEGMENT_BITS);
        let mut state = State {
            low: 1,
            segment_size: 16.min(max_size),
            segments: 1,
            sum: 0,
            phi: vec![0; levels],
            next_merge_low: 1,
            pending: BTreeMap::new(),
            in_flight: HashMap::new(),
            resume_queue: Vec::new(),
            status: Status::new(crate::config::status_precision()),
            last_backup: Instant::now(),
        };

        if let Some(cfg) = &backup {
            if let Some(saved) =
                checkpoint::load_matching(&cfg.path, cfg.formula, cfg.x, cfg.y, cfg.z, cfg.k)
            {
                if saved.phi.len() == levels && saved.threads > 0 {
                    tracing::info!(
                        low = saved.low,
                        sum = %saved.sum,
                        "resuming from checkpoint"
                    );
                    state.low = saved.low;
                    state.segment_size = saved.segment_size.next_power_of_two().clamp(16, max_size);
                    state.segments = saved.segments.max(1);
                    state.sum = saved.sum.parse().unwrap_or(0);
                    state.phi = saved.phi;
                    let mut queue = saved.in_flight;
                    queue.sort_by_key(|u| u.low);
                    state.next_merge_low = queue.first().map_or(saved.low, |u| u.low);
                    // serve the oldest hole first
                    queue.reverse();
                    state.resume_queue = queue;
                }
            }
        }

        LoadBalancer {
            state: Mutex::new(state),
            sieve_limit,
            max_size,
            sum_approx,
            threads: threads.max(1),
            start: Instant::now(),
            backup,
        }
    }

    /// Hand the next work unit to a thread. Returns false when the sieve
    /// interval is exhausted.
    pub fn get_work(&self, thread: &mut ThreadData) -> bool {
        let mut s = self.state.lock().unwrap();
        if let Some(unit) = s.resume_queue.pop() {
            thread.low = unit.low;
            thread.segments = unit.segments;
            thread.segment_size = unit.segment_size;
        } else {
            if s.low >= self.sieve_limit {
                return false;
            }
            thread.low = s.low;
            thread.segment_size = s.segment_size;
            let span = self.sieve_limit - s.low;
            let max_segments = span.div_ceil(s.segment_size);
            thread.segments = s.segments.min(max_segments).max(1);
            s.low += thread.segment_size * thread.segments;
        }
        s.in_flight.insert(
            thread.thread_id,
            UnitBackup {
                thread_id: thread.thread_id,
                low: thread.low,
                segments: thread.segments,
                segment_size: thread.segment_size,
            },
        );
        true
    }

    /// Merge a finished unit and adapt the unit shape from its timings.
    pub fn update_result(&self, thread: &mut ThreadData, result: UnitResult) {
        let mut s = self.state.lock().unwrap();
        s.in_flight.remove(&thread.thread_id);
        s.pending.insert(result.low, result);

        while let Some(first) = s.pending.first_key_value().map(|(&k, _)| k) {
            if first != s.next_merge_low {
                break;
            }
            let unit = s.pending.remove(&first).unwrap();
            let mut leaf_total = 0i128;
            for (b, &count) in unit.leaf_counts.iter().enumerate() {
                if count != 0 {
                    leaf_total += s.phi[b] as i128 * count as i128;
                }
            }
            for (b, &delta) in unit.phi_deltas.iter().enumerate() {
                s.phi[b] += delta;
            }
            s.sum += unit.sum + leaf_total;
            s.next_merge_low = unit.high;
        }

        self.update_load(&mut s, thread);
        let merged_low = s.next_merge_low;
        let (sum, approx) = (s.sum, self.sum_approx);
        s.status.print(merged_low, self.sieve_limit, sum, approx);
        self.maybe_backup(&mut s);
    }

    /// Re-tune segment_size and segments from the measured unit time.
    fn update_load(&self, s: &mut State, thread: &mut ThreadData) {
        let remaining = self.remaining_secs(s);
        let target = (remaining / self.threads as f64).clamp(0.01, MAX_UNIT_SECS);

        if thread.secs < 0.5 * target {
            s.segments = (s.segments * 2).min(1 << 24);
        } else if thread.secs > 2.0 * target && s.segments > 1 {
            s.segments /= 2;
        }
        // sieve initialization must stay a small fraction of the work
        if thread.secs > 0.0 && thread.init_secs / thread.secs > 0.1 {
            s.segments = (s.segments * 2).min(1 << 24);
        }

        let span_left = self.sieve_limit.saturating_sub(s.low);
        if thread.secs < target
            && s.segment_size < self.max_size
            && span_left > s.segment_size * s.segments * self.threads as u64
        {
            s.segment_size *= 2;
        }
    }

    fn remaining_secs(&self, s: &State) -> f64 {
        let pct = percent(s.next_merge_low, self.sieve_limit, s.sum, self.sum_approx).max(0.1);
        let elapsed = self.start.elapsed().as_secs_f64();
        elapsed * (100.0 - pct) / pct
    }

    fn maybe_backup(&self, s: &mut State) {
        let Some(cfg) = &self.backup else {
            return;
        };
        if s.last_backup.elapsed().as_secs_f64() < BACKUP_SECS {
            return;
        }
        s.last_backup = Instant::now();
        let mut in_flight: Vec<UnitBackup> = s.in_flight.values().cloned().collect();
        // pending-but-unmerged results are memory only: record their units
        // as in-flight so a resume recomputes them
        for unit in s.pending.values() {
            in_flight.push(UnitBackup {
                thread_id: usize::MAX,
                low: unit.low,
                segments: 1,
                segment_size: unit.high - unit.low,
            });
        }
        in_flight.sort_by_key(|u| u.low);
        let backup = Backup {
            formula: cfg.formula.to_string(),
            x: cfg.x.to_string(),
            y: cfg.y,
            z: cfg.z,
            k: cfg.k,
            threads: self.threads,
            low: s.low,
            segments: s.segments,
            segment_size: s.segment_size,
            sum: s.sum.to_string(),
            phi: s.phi.clone(),
            in_flight,
        };
        if let Err(err) = checkpoint::save(&cfg.path, &backup) {
            tracing::warn!(%err, "failed to write checkpoint");
        }
    }

    /// The merged sum; call after all workers have drained.
    pub fn sum(&self) -> i128 {
        let mut s = self.state.lock().unwrap();
        debug_assert!(s.pending.is_empty(), "unmerged units left behind");
        s.status.finish();
        s.sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(low: u64, high: u64, sum: i128, leaves: Vec<i64>, deltas: Vec<u64>) -> UnitResult {
        UnitResult {
            low,
            high,
            sum,
            leaf_counts: leaves,
            phi_deltas: deltas,
        }
    }

    #[test]
    fn low_is_monotone_and_tiles_the_interval() {
        let lb = LoadBalancer::new(10_000, 4, 1_000, 2, None);
        let mut td = ThreadData::new(0);
        let mut expected_low = 1;
        let mut guard = 0;
        while lb.get_work(&mut td) {
            assert_eq!(td.low, expected_low, "units must tile without gaps");
            assert!(td.segments >= 1 && td.segment_size >= 16);
            expected_low = td.low + td.segment_size * td.segments;
            // pretend the unit was instant so the balancer grows the shape
            td.secs = 0.001;
            td.init_secs = 0.0;
            let low = td.low;
            lb.update_result(
                &mut td,
                unit(low, expected_low.min(10_000), 1, vec![0; 4], vec![0; 4]),
            );
            guard += 1;
            assert!(guard < 10_000, "balancer failed to terminate");
        }
        assert!(expected_low >= 10_000);
    }

    #[test]
    fn out_of_order_merge_reconstructs_ordered_sum() {
        // two levels; units completed in reverse order
        let lb = LoadBalancer::new(100, 2, 10, 2, None);
        let mut t0 = ThreadData::new(0);
        let mut t1 = ThreadData::new(1);
        assert!(lb.get_work(&mut t0));
        let unit0 = (t0.low, t0.low + t0.segment_size * t0.segments);
        assert!(lb.get_work(&mut t1));
        let unit1 = (t1.low, t1.low + t1.segment_size * t1.segments);

        // the later unit finishes first: 3 leaves at level 0, local sum 5
        lb.update_result(&mut t1, unit(unit1.0, unit1.1.min(100), 5, vec![3, 0], vec![7, 0]));
        // earlier unit: local sum 11, contributes 10 unsieved at level 0
        lb.update_result(&mut t0, unit(unit0.0, unit0.1.min(100), 11, vec![0, 0], vec![10, 2]));

        // drain remaining work without contributions
        let mut td = ThreadData::new(2);
        while lb.get_work(&mut td) {
            let high = (td.low + td.segment_size * td.segments).min(100);
            let low = td.low;
            lb.update_result(&mut td, unit(low, high, 0, vec![0, 0], vec![0, 0]));
        }
        // ordered semantics: unit1's 3 leaves each see unit0's 10 positions
        assert_eq!(lb.sum(), 11 + 5 + 3 * 10);
    }

    #[test]
    fn segments_shrink_when_units_run_long() {
        let lb = LoadBalancer::new(1 << 20, 2, 1_000, 4, None);
        let mut td = ThreadData::new(0);
        assert!(lb.get_work(&mut td));
        // force growth first
        td.secs = 0.0001;
        let h1 = td.low + td.segment_size * td.segments;
        let low1 = td.low;
        lb.update_result(&mut td, unit(low1, h1, 0, vec![0, 0], vec![0, 0]));
        let grown = {
            let s = lb.state.lock().unwrap();
            (s.segment_size, s.segments)
        };
        assert!(grown.0 > 16 || grown.1 > 1);

        assert!(lb.get_work(&mut td));
        td.secs = 1_000.0; // pathologically slow unit
        td.init_secs = 0.0;
        let h2 = td.low + td.segment_size * td.segments;
        let low2 = td.low;
        lb.update_result(&mut td, unit(low2, h2, 0, vec![0, 0], vec![0, 0]));
        let after = {
            let s = lb.state.lock().unwrap();
            s.segments
        };
        assert!(after <= grown.1.max(1));
    }

    #[test]
    fn resume_reissues_in_flight_units() {
        use tempfile::tempdir;
        let dir = tempdir().unwrap();
        let path = dir.path().join("pi.backup");
        let backup = Backup {
            formula: "dr_s2_hard".into(),
            x: "1000000".into(),
            y: 100,
            z: 10_000,
            k: 8,
            threads: 2,
            low: 513,
            segments: 2,
            segment_size: 128,
            sum: "42".into(),
            phi: vec![5, 6],
            in_flight: vec![UnitBackup {
                thread_id: 0,
                low: 257,
                segments: 2,
                segment_size: 128,
            }],
        };
        checkpoint::save(&path, &backup).unwrap();

        let cfg = BackupConfig {
            path,
            formula: "dr_s2_hard",
            x: 1_000_000,
            y: 100,
            z: 10_000,
            k: 8,
        };
        let lb = LoadBalancer::new(10_000, 2, 100, 2, Some(cfg));
        let mut td = ThreadData::new(0);
        assert!(lb.get_work(&mut td));
        // the recorded hole comes back first, then the frontier continues
        assert_eq!((td.low, td.segments, td.segment_size), (257, 2, 128));
        assert!(lb.get_work(&mut td));
        assert_eq!(td.low, 513);
    }
}
