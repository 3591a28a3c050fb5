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

//! Per-hop path processing on a forwarding node.
//!
//! [`Forwarder::process`] runs the complete data-plane step on the path bytes of a packet:
//!
//! 1. Validate the path structure in place.
//! 2. Check that the active hop field has not expired (configurable).
//! 3. Authenticate the active hop field with the local forwarding key.
//! 4. Either report local delivery or advance the pointers in the buffer.
//!
//! Every failure drops the packet and is logged. Nothing is retried.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    core::view::View,
    error::PathError,
    mac::{ActiveHop, ForwardingKey, HopAuthenticator, PeeringSeed},
    path::view::StandardPathView,
};

/// Configuration of a [`Forwarder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwarderConfig {
    /// Drop packets whose active hop field has expired
    pub check_expiry: bool,
}
impl Default for ForwarderConfig {
    fn default() -> Self {
        Self { check_expiry: true }
    }
}

/// Result of processing a path on a forwarding node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HopOutcome {
    /// The active hop is the last one, the packet is delivered locally
    Delivered,
    /// The pointers were advanced to the next hop
    Forwarded {
        /// Whether the next hop belongs to another segment
        segment_change: bool,
    },
}

/// Data-plane processing of standard paths for a single AS.
///
/// Holds the prepared forwarding key. The forwarder is immutable and can be shared between
/// threads processing different packets.
#[derive(Debug, Clone)]
pub struct Forwarder {
    authenticator: HopAuthenticator,
    config: ForwarderConfig,
}

impl Forwarder {
    /// Creates a forwarder with the default configuration
    pub fn new(key: &ForwardingKey) -> Self {
        Self::with_config(key, ForwarderConfig::default())
    }

    /// Creates a forwarder with the given configuration
    pub fn with_config(key: &ForwardingKey, config: ForwarderConfig) -> Self {
        Self {
            authenticator: HopAuthenticator::new(key),
            config,
        }
    }

    /// Processes the path at the front of `buf`.
    ///
    /// `peering_seed` is used if the active hop is adjacent to a peering junction. `now` is
    /// compared against the expiration of the active hop.
    ///
    /// On success the pointers in `buf` have been advanced unless the packet was delivered. On
    /// error `buf` is unchanged.
    pub fn process(
        &self,
        buf: &mut [u8],
        peering_seed: Option<&PeeringSeed>,
        now: SystemTime,
    ) -> Result<HopOutcome, PathError> {
        let (view, _) = StandardPathView::from_mut_slice(buf)
            .map_err(|err| dropped(PathError::Malformed(err)))?;
        let active = ActiveHop::of_view(view).map_err(dropped)?;

        if self.config.check_expiry {
            let expiration = active.hop.expiration(active.info.timestamp);
            if now > expiration {
                let expired_at = expiration
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |since| since.as_secs());
                return Err(dropped(PathError::Expired {
                    hop_index: active.hop_index,
                    expired_at,
                }));
            }
        }

        self.authenticator
            .authenticate(&active, peering_seed)
            .map_err(dropped)?;

        let meta = view.meta();
        if meta.is_last_hop() {
            tracing::trace!(hop_index = active.hop_index, "Delivering packet locally");
            return Ok(HopOutcome::Delivered);
        }

        let next = view.advance_in_place().map_err(dropped)?;
        let segment_change = usize::from(next.curr_inf) != active.segment;
        tracing::trace!(
            hop_index = active.hop_index,
            next_hop_index = next.curr_hf,
            segment_change,
            "Forwarding packet"
        );

        Ok(HopOutcome::Forwarded { segment_change })
    }
}

fn dropped(err: PathError) -> PathError {
    match err {
        PathError::AuthenticationFailed { hop_index } => {
            tracing::warn!(hop_index, "Dropping packet, hop field authentication failed");
        }
        PathError::PathExhausted { hop_count } => {
            tracing::warn!(hop_count, "Dropping packet, path exhausted");
        }
        PathError::Expired {
            hop_index,
            expired_at,
        } => {
            tracing::debug!(hop_index, expired_at, "Dropping packet, hop field expired");
        }
        PathError::Malformed(ref err) => {
            tracing::debug!(?err, "Dropping packet, malformed path");
        }
    }
    err
}
