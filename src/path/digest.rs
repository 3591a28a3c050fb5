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

use std::fmt;

use sha2::{Digest, Sha256};

use crate::{
    address::IsdAsn,
    path::{hops::PathLink, model::StandardPath, view::StandardPathView},
};

/// A fingerprint of the ASes and interfaces a path traverses.
///
/// Interface identifiers are unique within an AS, so the link sequence anchored at the source AS
/// determines the traversed ASes. Two encodings of the same route hash to the same digest even
/// if their segment IDs, timestamps, expiration times or MACs differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathDigest([u8; PathDigest::LENGTH]);

impl PathDigest {
    const LENGTH: usize = 32;
    const DISPLAYED_BYTES: usize = 8;

    /// Computes the digest of the links of a path starting at `source`
    pub fn new(source: IsdAsn, links: impl IntoIterator<Item = PathLink>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.0.to_be_bytes());
        for link in links {
            hasher.update(link.egress.to_be_bytes());
            hasher.update(link.ingress.to_be_bytes());
        }
        PathDigest(hasher.finalize().into())
    }

    fn format(&self, f: &mut fmt::Formatter<'_>, n_displayed: usize, lower: bool) -> fmt::Result {
        for byte in &self.0[..n_displayed] {
            if lower {
                write!(f, "{byte:02x}")?;
            } else {
                write!(f, "{byte:02X}")?;
            }
        }
        Ok(())
    }
}

impl StandardPath {
    /// Returns the digest of the path's links, see [`StandardPath::hops`]
    pub fn digest(&self, source: IsdAsn) -> PathDigest {
        PathDigest::new(source, self.hops())
    }
}

impl StandardPathView {
    /// Returns the digest of the path's links, see [`StandardPath::hops`]
    pub fn digest(&self, source: IsdAsn) -> PathDigest {
        PathDigest::new(source, self.hops())
    }
}

impl AsRef<[u8]> for PathDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for PathDigest {
    fn from(value: [u8; 32]) -> Self {
        Self(value)
    }
}

impl fmt::Display for PathDigest {
    /// Formats the first 8 bytes as lower-case hex, the alternate flag formats all 32 bytes.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.format(f, Self::LENGTH, true)
        } else {
            self.format(f, Self::DISPLAYED_BYTES, true)
        }
    }
}

impl fmt::LowerHex for PathDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        self.format(f, Self::DISPLAYED_BYTES, true)
    }
}

impl fmt::UpperHex for PathDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        self.format(f, Self::DISPLAYED_BYTES, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(egress: u16, ingress: u16) -> PathLink {
        PathLink { egress, ingress }
    }

    #[test]
    fn should_depend_on_source_and_link_order() {
        let source = IsdAsn::new(1, 0xff00_0000_0110);
        let links = [link(1, 2), link(3, 4)];
        let digest = PathDigest::new(source, links);

        assert_eq!(digest, PathDigest::new(source, links));
        assert_ne!(digest, PathDigest::new(source, [link(3, 4), link(1, 2)]));
        assert_ne!(digest, PathDigest::new(source, [link(2, 1), link(4, 3)]));
        assert_ne!(digest, PathDigest::new(IsdAsn::new(1, 0xff00_0000_0111), links));
    }

    #[test]
    fn should_format_as_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xab;
        bytes[7] = 0x01;
        bytes[31] = 0xff;
        let digest = PathDigest::from(bytes);

        assert_eq!(digest.to_string(), "ab00000000000001");
        assert_eq!(format!("{digest:#x}"), "0xab00000000000001");
        assert_eq!(format!("{digest:X}"), "AB00000000000001");
        assert_eq!(format!("{digest:#}").len(), 64);
        assert!(format!("{digest:#}").ends_with("ff"));
        assert_eq!(digest.as_ref().len(), 32);
    }
}
