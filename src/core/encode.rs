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

//! Encoding of models into byte buffers
//!
//! Every model that goes on the wire implements [`WireEncode`], which is responsible for:
//!
//! 1. Calculating the size of the wire encoding
//! 2. Checking that the model can be encoded at all
//! 3. Writing the wire format into a provided buffer
//!
//! ### Validation
//!
//! [`WireEncode::wire_valid`] is not a semantic check. It only rejects models that would produce
//! bytes the decoder refuses, e.g. a segment without hop fields or a hop pointer past the last
//! hop. MAC correctness is never checked here.

/// Allows encoding to wire format.
pub trait WireEncode {
    /// Returns the size required for the wire encoding.
    fn required_size(&self) -> usize;

    /// Validates that the model can be encoded into a decodable wire format.
    fn wire_valid(&self) -> Result<(), InvalidStructureError>;

    /// Writes the wire encoding into the provided buffer.
    ///
    /// Returns the number of bytes written.
    ///
    /// The caller must make sure that the buffer holds at least `self.required_size()` bytes
    /// and that `self.wire_valid()` succeeded, otherwise the written bytes are truncated or
    /// undecodable.
    fn encode_unchecked(&self, buf: &mut [u8]) -> usize;

    /// Writes the wire encoding into the provided buffer.
    ///
    /// Returns the number of bytes written.
    fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        self.wire_valid()?;

        let required_size = self.required_size();
        if buf.len() < required_size {
            return Err(EncodeError::BufferTooSmall(required_size));
        }

        Ok(self.encode_unchecked(buf))
    }

    /// Encodes into a freshly allocated buffer of exactly the required size.
    fn encode_to_vec(&self) -> Result<Vec<u8>, EncodeError> {
        let mut buf = vec![0u8; self.required_size()];
        self.encode(&mut buf)?;
        Ok(buf)
    }
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The structure which was attempted to be encoded is invalid.
    #[error(transparent)]
    InvalidStructure(#[from] InvalidStructureError),
    /// The provided buffer is too small.
    #[error("buffer too small: required {0}")]
    BufferTooSmall(usize),
}

/// Given structure has fields that cannot be encoded correctly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot encode structure: {0}")]
pub struct InvalidStructureError(&'static str);
impl From<&'static str> for InvalidStructureError {
    fn from(s: &'static str) -> Self {
        InvalidStructureError(s)
    }
}
