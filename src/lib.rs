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

//! SciPath: the data-plane representation of SCION standard paths.
//!
//! A standard path is a source-routed list of up to three segments, each made of one info field
//! and a run of hop fields. Every hop field carries a truncated MAC chained to the hop before it
//! in construction order, so routers can authenticate their own hop in constant time.
//!
//! The crate covers:
//!
//! * Encoding and decoding of the path, either into owned models ([`path::model`]) or as
//!   zero-copy views over the packet buffer ([`path::view`]).
//! * Computing and verifying hop field MACs ([`mac`]).
//! * Locating and advancing the active hop ([`path::meta`]).
//! * Building paths, including shortcut and peering paths, and reversing them
//!   ([`path::builder`], [`path::reverse`]).
//! * Listing the inter-AS links of a path and fingerprinting them ([`path::hops`],
//!   [`path::digest`]).
//! * A forwarding step which ties the above together on a mutable buffer ([`forwarding`]).

pub mod core {
    //! Generic building blocks for bit-level wire formats.

    pub mod encode;
    pub mod layout;
    pub(crate) mod read;
    pub mod view;
    pub(crate) mod write;
}

pub mod path {
    //! The SCION standard path.

    pub mod builder;
    pub mod digest;
    pub mod hops;
    pub mod layout;
    pub mod meta;
    pub mod model;
    pub mod reverse;
    pub mod types;
    pub mod view;
}

pub mod address;
pub mod error;
pub mod forwarding;
pub mod mac;

pub use error::{BuildError, MalformedPathError, PathError};
pub use path::{
    meta::PathMetaHeader,
    model::{HopField, InfoField, Segment, StandardPath},
};
