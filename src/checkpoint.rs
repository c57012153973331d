//! # Checkpoint — Resumable Sieve State Persistence
//!
//! Multi-day pi(x) runs must survive restarts. The load balancer
//! periodically snapshots its scheduling state as JSON with a SHA-256
//! integrity envelope and rotating generational backups.
//!
//! ## Atomic Writes
//!
//! Checkpoint files are written atomically: write to a temp file, then
//! rename. This prevents corruption from mid-write crashes or power loss.
//!
//! ## Integrity and Validation
//!
//! A SHA-256 hash is stored alongside the JSON data. On load, the hash is
//! verified and the recorded parameters (formula, x, y, z, k) are compared
//! with the current run; any mismatch or corruption silently discards the
//! checkpoint and the computation starts from scratch — a stale backup
//! must never poison a fresh result.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Number of backup generations to keep.
const GENERATIONS: usize = 3;

/// A work unit that was handed to a thread but not merged back yet.
/// On resume these are re-issued before fresh work.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UnitBackup {
    pub thread_id: usize,
    pub low: u64,
    pub segments: u64,
    pub segment_size: u64,
}

/// Snapshot of the balancer's scheduling state.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Backup {
    pub formula: String,
    /// decimal, since x may exceed 64 bits
    pub x: String,
    pub y: u64,
    pub z: u64,
    pub k: u64,
    pub threads: usize,
    /// next low the balancer will hand out
    pub low: u64,
    pub segments: u64,
    pub segment_size: u64,
    /// merged partial sum, decimal i128
    pub sum: String,
    /// per-level unsieved counts accumulated by the ordered merge
    pub phi: Vec<u64>,
    pub in_flight: Vec<UnitBackup>,
}

/// Wrapper that includes a SHA-256 checksum for integrity verification.
#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    data: serde_json::Value,
}

fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn generation_path(base: &Path, generation: usize) -> PathBuf {
    if generation == 0 {
        base.to_path_buf()
    } else {
        let mut p = base.as_os_str().to_os_string();
        p.push(format!(".{}", generation));
        PathBuf::from(p)
    }
}

/// Save a checkpoint with integrity checksum and rotating generations.
///
/// Rotation: current -> .1 -> .2 (the oldest .2 is discarded). The new
/// checkpoint is written atomically via a .tmp file.
pub fn save(path: &Path, backup: &Backup) -> Result<()> {
    for generation in (1..GENERATIONS).rev() {
        let src = generation_path(path, generation - 1);
        let dst = generation_path(path, generation);
        if src.exists() {
            let _ = fs::rename(&src, &dst);
        }
    }

    let data = serde_json::to_value(backup)?;
    let data_str = serde_json::to_string_pretty(&data)?;
    let envelope = Envelope {
        checksum: sha256_hex(&data_str),
        data,
    };
    let json = serde_json::to_string_pretty(&envelope)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn load_single(path: &Path) -> Option<Backup> {
    let json = fs::read_to_string(path).ok()?;
    let envelope: Envelope = serde_json::from_str(&json).ok()?;
    let data_str = serde_json::to_string_pretty(&envelope.data).ok()?;
    if sha256_hex(&data_str) != envelope.checksum {
        return None;
    }
    serde_json::from_value(envelope.data).ok()
}

/// Load the newest valid checkpoint, falling back to older generations on
/// corruption. Returns None when nothing valid exists.
pub fn load(path: &Path) -> Option<Backup> {
    for generation in 0..GENERATIONS {
        let p = generation_path(path, generation);
        if let Some(backup) = load_single(&p) {
            if generation > 0 {
                tracing::warn!(
                    generation,
                    path = %p.display(),
                    "recovered checkpoint from older generation"
                );
            }
            return Some(backup);
        }
    }
    None
}

/// Load a checkpoint only if it matches the current run's parameters.
pub fn load_matching(
    path: &Path,
    formula: &str,
    x: u128,
    y: u64,
    z: u64,
    k: u64,
) -> Option<Backup> {
    let backup = load(path)?;
    let matches = backup.formula == formula
        && backup.x == x.to_string()
        && backup.y == y
        && backup.z == z
        && backup.k == k;
    if !matches {
        tracing::warn!(path = %path.display(), "checkpoint parameters differ, starting fresh");
        return None;
    }
    Some(backup)
}
