//! Ballot tally
//!
//! Running per-candidate vote counts. A ballot is checked in full against a
//! scratch delta before any count moves, so a rejected ballot never leaves a
//! partial increment behind.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Candidate index on a ballot
pub type Candidate = i32;

/// Most candidate entries a single ballot may carry
pub const MAX_VOTES_PER_BALLOT: usize = 5;

/// Filler entry that selects nobody
pub const SKIP_CANDIDATE: Candidate = -1;

/// Reserved key under which the tally is stored
pub const TALLY_KEY: &[u8] = b"TALLYKEY";

/// A voter's candidate selections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ballot {
    /// Selected candidate indices
    #[serde(rename = "c")]
    pub candidates: Vec<Candidate>,

    /// Free-form origin of the ballot (polling station, batch id)
    #[serde(rename = "s")]
    pub source: String,
}

impl Ballot {
    /// Create a ballot
    pub fn new(candidates: Vec<Candidate>, source: impl Into<String>) -> Self {
        Self {
            candidates,
            source: source.into(),
        }
    }
}

/// Reasons a ballot is refused
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BallotError {
    /// More entries than [`MAX_VOTES_PER_BALLOT`]
    #[error("ballot has {0} entries, at most 5 allowed")]
    TooManyCandidates(usize),

    /// Negative index other than the skip filler
    #[error("negative candidate {0}")]
    NegativeCandidate(Candidate),

    /// Index past the last candidate
    #[error("candidate {candidate} exceeds candidate count {count}")]
    CandidateOutOfRange {
        /// Offending index
        candidate: Candidate,
        /// Number of candidates in the tally
        count: usize,
    },

    /// Same candidate selected twice
    #[error("duplicate candidate {0}")]
    DuplicateCandidate(Candidate),

    /// Count would wrap
    #[error("count for candidate {0} would overflow")]
    CountOverflow(Candidate),
}

/// Per-candidate vote counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    counts: Vec<u64>,
}

impl Tally {
    /// Zeroed tally over `n_candidates` candidates
    pub fn new(n_candidates: usize) -> Self {
        Self {
            counts: vec![0; n_candidates],
        }
    }

    /// Current counts, indexed by candidate
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether the tally covers no candidates
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Add one ballot. On error the counts are untouched.
    pub fn add_ballot(&mut self, ballot: &Ballot) -> std::result::Result<(), BallotError> {
        if ballot.candidates.len() > MAX_VOTES_PER_BALLOT {
            return Err(BallotError::TooManyCandidates(ballot.candidates.len()));
        }

        let mut delta = BTreeSet::new();
        for &candidate in &ballot.candidates {
            if candidate == SKIP_CANDIDATE {
                continue;
            }
            if candidate < 0 {
                return Err(BallotError::NegativeCandidate(candidate));
            }

            let index = candidate as usize;
            if index >= self.counts.len() {
                return Err(BallotError::CandidateOutOfRange {
                    candidate,
                    count: self.counts.len(),
                });
            }
            if !delta.insert(index) {
                return Err(BallotError::DuplicateCandidate(candidate));
            }
            if self.counts[index] == u64::MAX {
                return Err(BallotError::CountOverflow(candidate));
            }
        }

        for index in delta {
            self.counts[index] += 1;
        }

        Ok(())
    }

    /// Stored encoding: u64 length, then one u64 per count
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.counts)?)
    }

    /// Decode stored bytes, refusing truncated or padded buffers
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let counts: Vec<u64> = bincode::deserialize(bytes)
            .map_err(|e| Error::Encoding(format!("Malformed tally: {}", e)))?;

        let consumed = bincode::serialized_size(&counts)?;
        if consumed != bytes.len() as u64 {
            return Err(Error::Encoding(format!(
                "Tally has {} trailing bytes",
                bytes.len() as u64 - consumed
            )));
        }

        Ok(Self { counts })
    }
}
