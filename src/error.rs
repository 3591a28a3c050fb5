// Copyright 2026 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Errors raised while parsing, authenticating, traversing and building paths.
//!
//! None of these conditions are retried inside this crate. A packet hitting any [`PathError`] is
//! dropped by the forwarding logic; [`BuildError`]s are reported to the caller at build time.

/// Structural violation in an encoded path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum MalformedPathError {
    /// The buffer is shorter than the length implied by the meta header
    #[error("buffer too small at {at}: required {required}, actual {actual}")]
    BufferTooSmall {
        /// Record that did not fit
        at: &'static str,
        /// Number of bytes required
        required: usize,
        /// Number of bytes available
        actual: usize,
    },
    /// All segment lengths are zero
    #[error("path contains no hop fields")]
    Empty,
    /// A zero-length segment is followed by a non-empty one
    #[error("segment {segment} is non-empty but follows an empty segment")]
    SegmentGap {
        /// Index of the offending segment
        segment: usize,
    },
    /// An owned path holds more segments than the meta header can describe
    #[error("path contains {count} segments, at most 3 are allowed")]
    TooManySegments {
        /// Number of segments
        count: usize,
    },
    /// The segment lengths add up to more hops than the pointer can address
    #[error("path contains {total} hop fields, at most {max} are allowed")]
    TooManyHops {
        /// Sum of the segment lengths
        total: usize,
        /// Maximum number of hop fields
        max: usize,
    },
    /// The current hop pointer is past the last hop field
    #[error("current hop field {curr_hf} out of range for {hop_count} hop fields")]
    CurrentHopOutOfRange {
        /// Value of the current hop field pointer
        curr_hf: u8,
        /// Number of hop fields in the path
        hop_count: usize,
    },
    /// The current info field pointer does not own the current hop field
    #[error("current info field {curr_inf} does not own the current hop, expected {expected}")]
    CurrentInfoMismatch {
        /// Value of the current info field pointer
        curr_inf: u8,
        /// Index of the segment owning the current hop field
        expected: u8,
    },
}

/// Errors raised while processing a path on the forwarding plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum PathError {
    /// The path is structurally invalid
    #[error("malformed path: {0}")]
    Malformed(#[from] MalformedPathError),
    /// The MAC of the active hop field does not match
    #[error("authentication failed for hop field {hop_index}")]
    AuthenticationFailed {
        /// Index of the hop field that failed verification
        hop_index: usize,
    },
    /// Advancing past the last hop field was attempted
    #[error("path exhausted after {hop_count} hop fields")]
    PathExhausted {
        /// Number of hop fields in the path
        hop_count: usize,
    },
    /// The active hop field has expired
    #[error("hop field {hop_index} expired at {expired_at}")]
    Expired {
        /// Index of the expired hop field
        hop_index: usize,
        /// Expiration as seconds since the Unix epoch
        expired_at: u64,
    },
}

/// Caller input errors reported when constructing a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum BuildError {
    /// No segment was given
    #[error("path must contain at least one segment")]
    NoSegments,
    /// More than three segments were given
    #[error("path can not contain more than 3 segments, got {count}")]
    TooManySegments {
        /// Number of segments given
        count: usize,
    },
    /// A hop was added before any segment was started
    #[error("hop added before the first segment")]
    HopOutsideSegment,
    /// A segment has no hop fields
    #[error("segment {segment} contains no hop fields")]
    EmptySegment {
        /// Index of the empty segment
        segment: usize,
    },
    /// The path contains more hop fields than the meta header can address
    #[error("path contains {total} hop fields, at most {max} are allowed")]
    TooManyHops {
        /// Total number of hop fields
        total: usize,
        /// Maximum number of hop fields
        max: usize,
    },
    /// The number of keys does not match the number of hops in a segment
    #[error("segment {segment} has {expected} hop fields but {actual} keys")]
    KeyCountMismatch {
        /// Index of the segment
        segment: usize,
        /// Number of hop fields in the segment
        expected: usize,
        /// Number of keys supplied
        actual: usize,
    },
    /// The number of key lists does not match the number of segments
    #[error("path has {expected} segments but {actual} key lists")]
    SegmentKeysMismatch {
        /// Number of segments
        expected: usize,
        /// Number of key lists supplied
        actual: usize,
    },
    /// The path has a peering junction, but no peering seeds were supplied
    #[error("peering junction after segment {segment} requires peering seeds")]
    MissingPeeringSeeds {
        /// Index of the segment before the junction
        segment: usize,
    },
    /// Peering seeds were supplied, but the path has no peering junction
    #[error("peering seeds supplied for a path without peering junction")]
    UnexpectedPeeringSeeds,
    /// The initial pointers do not describe a valid position
    #[error("invalid initial pointers: {0}")]
    InvalidPointer(MalformedPathError),
    /// Up and down segment share no AS, so no shortcut exists
    #[error("up and down segment have no AS in common")]
    NoCommonHop,
    /// A hop used for shortcut detection has no AS identifier
    #[error("hop {hop} of segment {segment} has no AS identifier")]
    MissingIsdAsn {
        /// Index of the segment
        segment: usize,
        /// Index of the hop within the segment
        hop: usize,
    },
}
impl BuildError {
    /// Attributes a per-segment error to the segment at `index`
    pub fn in_segment(self, index: usize) -> Self {
        match self {
            Self::KeyCountMismatch {
                expected, actual, ..
            } => Self::KeyCountMismatch {
                segment: index,
                expected,
                actual,
            },
            Self::EmptySegment { .. } => Self::EmptySegment { segment: index },
            other => other,
        }
    }
}
