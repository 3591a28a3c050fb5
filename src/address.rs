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

//! AS identifiers.

use std::{fmt::Display, str::FromStr};

/// Largest AS number written in decimal notation
const MAX_BGP_ASN: u64 = u32::MAX as u64;

/// Mask of the 48 ASN bits
const ASN_MASK: u64 = 0x0000_FFFF_FFFF_FFFF;

/// ISD-AS identifier.
///
/// The upper 16 bits hold the ISD, the lower 48 bits the AS number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct IsdAsn(pub u64);
impl IsdAsn {
    /// Creates a new ISD-AS identifier from the given ISD and ASN.
    ///
    /// Will truncate ASN to 48 bits.
    pub const fn new(isd: u16, asn: u64) -> Self {
        IsdAsn(((isd as u64) << 48) | (asn & ASN_MASK))
    }

    /// Returns the ISD part of the ISD-AS identifier.
    pub const fn isd(&self) -> u16 {
        (self.0 >> 48) as u16
    }

    /// Returns the ASN part of the ISD-AS identifier.
    pub const fn asn(&self) -> u64 {
        self.0 & ASN_MASK
    }
}
impl Display for IsdAsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let asn = self.asn();
        if asn <= MAX_BGP_ASN {
            return write!(f, "{}-{}", self.isd(), asn);
        }
        write!(
            f,
            "{}-{:x}:{:x}:{:x}",
            self.isd(),
            (asn >> 32) & 0xffff,
            (asn >> 16) & 0xffff,
            asn & 0xffff
        )
    }
}
impl FromStr for IsdAsn {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, asn) = s
            .split_once('-')
            .ok_or_else(|| AddressParseError::MissingSeparator(s.to_string()))?;

        let isd = u16::from_str(isd).map_err(|_| AddressParseError::InvalidIsd(isd.to_string()))?;
        let asn = parse_asn(asn).ok_or_else(|| AddressParseError::InvalidAsn(asn.to_string()))?;

        Ok(IsdAsn::new(isd, asn))
    }
}

/// Parses either a decimal BGP AS number or three colon separated hex groups
fn parse_asn(s: &str) -> Option<u64> {
    if !s.contains(':') {
        return u64::from_str(s).ok().filter(|asn| *asn <= MAX_BGP_ASN);
    }

    let mut asn = 0u64;
    let mut groups = 0;
    for group in s.split(':') {
        if group.is_empty() || group.len() > 4 {
            return None;
        }
        asn = (asn << 16) | u64::from_str_radix(group, 16).ok()?;
        groups += 1;
    }

    (groups == 3).then_some(asn)
}

/// Error parsing an [`IsdAsn`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// No `-` between ISD and AS number
    #[error("missing '-' separator in {0:?}")]
    MissingSeparator(String),
    /// The ISD is not a 16 bit decimal number
    #[error("invalid ISD {0:?}")]
    InvalidIsd(String),
    /// The AS number is neither decimal nor in colon notation
    #[error("invalid AS number {0:?}")]
    InvalidAsn(String),
}
