// Copyright (C) 2019, Cloudflare, Inc.
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are
// met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//
//     * Redistributions in binary form must reproduce the above copyright
//       notice, this list of conditions and the following disclaimer in the
//       documentation and/or other materials provided with the distribution.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS
// IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO,
// THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR
// PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! HTTP/2 header compression (HPACK).
//!
//! This crate implements the [HPACK] header compression format used by
//! HTTP/2. It provides an [`Encoder`] and a [`Decoder`], each owning one
//! direction's dynamic table, that must be driven in lock-step with the
//! peer's counterpart.
//!
//! The codec does not perform any I/O. The encoder appends to a caller owned
//! `Vec<u8>` and the decoder consumes bytes from a caller owned
//! [`octets::Octets`] cursor, delivering decoded fields to a
//! [`HeaderListener`].
//!
//! [HPACK]: https://www.rfc-editor.org/rfc/rfc7541
//!
//! ## Encoding
//!
//! ```
//! let mut encoder = hpack::Encoder::new(4096);
//!
//! let mut block = Vec::new();
//! encoder.encode_header(&mut block, b":method", b"GET", false, true);
//! encoder.encode_header(&mut block, b":path", b"/index.html", false, true);
//!
//! assert_eq!(block[0], 0x82);
//! ```
//!
//! ## Decoding
//!
//! Header blocks can be fed to the decoder in arbitrarily sized chunks. When
//! a chunk ends in the middle of a representation the decoder keeps the
//! partial state and the unconsumed bytes are left in the cursor, so the
//! caller can retry once more data is available:
//!
//! ```
//! use hpack::NameValue;
//!
//! let mut decoder = hpack::Decoder::new(8192, 4096);
//! let mut headers: Vec<(hpack::HeaderField, bool)> = Vec::new();
//!
//! let mut b = octets::Octets::with_slice(&[0x82, 0x86, 0x84]);
//! decoder.decode(&mut b, &mut headers)?;
//!
//! assert!(!decoder.end_header_block());
//! assert_eq!(headers.len(), 3);
//! assert_eq!(headers[0].0.name(), b":method");
//! # Ok::<(), hpack::Error>(())
//! ```

#![warn(missing_docs)]

#[macro_use]
extern crate log;

use std::fmt;
use std::fmt::Write;

const INDEXED: u8 = 0b1000_0000;
const LITERAL_WITH_INCREMENTAL_INDEXING: u8 = 0b0100_0000;
const SIZE_UPDATE: u8 = 0b0010_0000;
const LITERAL_NEVER_INDEXED: u8 = 0b0001_0000;
const LITERAL_WITHOUT_INDEXING: u8 = 0b0000_0000;

/// Bytes accounted for every dynamic table entry on top of its name and
/// value (RFC 7541 Section 4.1).
pub const HEADER_ENTRY_OVERHEAD: usize = 32;

const DEFAULT_MAX_HEADER_LIST_SIZE: usize = 8192;

const DEFAULT_MAX_TABLE_CAPACITY: usize = 4096;

/// A specialized [`Result`] type for HPACK operations.
///
/// This type is used throughout the public API for any operation that can
/// produce an error.
///
/// [`Result`]: https://doc.rust-lang.org/std/result/enum.Result.html
pub type Result<T> = std::result::Result<T, Error>;

/// An HPACK error.
///
/// Every error is fatal to the header compression context that produced it:
/// once returned, the dynamic table can no longer be assumed to match the
/// peer's and the connection should be torn down with a
/// `COMPRESSION_ERROR`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The provided buffer is too short.
    BufferTooShort,

    /// An index referenced neither a static nor a dynamic table entry, or was
    /// zero.
    IllegalIndex,

    /// The peer requested a dynamic table size larger than the local limit.
    InvalidMaxDynamicTableSize,

    /// A dynamic table size update was required but a different
    /// representation was received.
    MaxDynamicTableSizeChangeRequired,

    /// A variable-length integer didn't fit in 31 bits.
    IntegerOverflow,

    /// A literal header name had zero length.
    EmptyHeaderName,

    /// The EOS symbol was found inside a Huffman-encoded string.
    HuffmanEosDecoded,

    /// A Huffman-encoded string wasn't padded with the EOS prefix.
    InvalidHuffmanPadding,
}

impl Error {
    /// Returns `true` for the errors RFC 7541 groups as decompression
    /// failures, i.e. malformed input rather than table or sequencing
    /// violations.
    pub fn is_decompression(&self) -> bool {
        matches!(
            self,
            Error::BufferTooShort |
                Error::IntegerOverflow |
                Error::EmptyHeaderName |
                Error::HuffmanEosDecoded |
                Error::InvalidHuffmanPadding
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl std::convert::From<octets::BufferTooShortError> for Error {
    fn from(_err: octets::BufferTooShortError) -> Self {
        Error::BufferTooShort
    }
}

/// How the encoder picks between raw and Huffman-coded string literals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HuffmanPolicy {
    /// Use Huffman coding only when it is strictly shorter than the raw
    /// bytes.
    #[default]
    Auto,

    /// Always Huffman-code string literals.
    Always,

    /// Never Huffman-code string literals.
    Never,
}

/// Stores configuration shared between an [`Encoder`] and a [`Decoder`].
#[derive(Clone, Debug)]
pub struct Config {
    max_header_list_size: usize,
    max_table_capacity: usize,
    huffman: HuffmanPolicy,
}

impl Config {
    /// Creates a new configuration object with default settings.
    pub const fn new() -> Config {
        Config {
            max_header_list_size: DEFAULT_MAX_HEADER_LIST_SIZE,
            max_table_capacity: DEFAULT_MAX_TABLE_CAPACITY,
            huffman: HuffmanPolicy::Auto,
        }
    }

    /// Sets the maximum number of name and value bytes the decoder delivers
    /// per header block.
    ///
    /// Headers past this limit are dropped and reported by
    /// [`Decoder::end_header_block()`].
    ///
    /// The default value is `8192`.
    pub fn set_max_header_list_size(&mut self, v: usize) {
        self.max_header_list_size = v;
    }

    /// Sets the dynamic table capacity, in bytes.
    ///
    /// For the encoder this is the initial table size, for the decoder it is
    /// the upper bound the peer may request with a size update.
    ///
    /// The default value is `4096`.
    pub fn set_max_table_capacity(&mut self, v: usize) {
        self.max_table_capacity = v;
    }

    /// Sets how the encoder codes string literals.
    ///
    /// The default value is [`HuffmanPolicy::Auto`].
    pub fn set_huffman_policy(&mut self, v: HuffmanPolicy) {
        self.huffman = v;
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// A trait for types with associated name and value.
pub trait NameValue {
    /// Returns the object's name.
    fn name(&self) -> &[u8];

    /// Returns the object's value.
    fn value(&self) -> &[u8];
}

impl NameValue for (&[u8], &[u8]) {
    fn name(&self) -> &[u8] {
        self.0
    }

    fn value(&self) -> &[u8] {
        self.1
    }
}

impl<const N: usize, const M: usize> NameValue for (&[u8; N], &[u8; M]) {
    fn name(&self) -> &[u8] {
        self.0
    }

    fn value(&self) -> &[u8] {
        self.1
    }
}

/// An owned header field, as stored in the dynamic tables.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderField {
    name: Vec<u8>,
    value: Vec<u8>,
}

impl HeaderField {
    /// Creates a new header field.
    ///
    /// Both `name` and `value` will be cloned.
    pub fn new(name: &[u8], value: &[u8]) -> Self {
        HeaderField {
            name: name.to_vec(),
            value: value.to_vec(),
        }
    }

    /// Returns the size this field accounts for in a dynamic table.
    pub fn size(&self) -> usize {
        entry_size(&self.name, &self.value)
    }
}

impl NameValue for HeaderField {
    fn name(&self) -> &[u8] {
        &self.name
    }

    fn value(&self) -> &[u8] {
        &self.value
    }
}

fn try_print_as_readable(hdr: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    match std::str::from_utf8(hdr) {
        Ok(s) => f.write_str(&s.escape_default().to_string()),
        Err(_) => write!(f, "{hdr:?}"),
    }
}

impl fmt::Debug for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('"')?;
        try_print_as_readable(&self.name, f)?;
        f.write_str(": ")?;
        try_print_as_readable(&self.value, f)?;
        f.write_char('"')
    }
}

/// Receives decoded header fields, one at a time and in wire order.
pub trait HeaderListener {
    /// Called once per decoded header field.
    ///
    /// `sensitive` is set for fields the peer sent as "never indexed"; these
    /// must keep that representation if they are ever re-encoded.
    fn add_header(&mut self, name: &[u8], value: &[u8], sensitive: bool);
}

impl HeaderListener for Vec<(HeaderField, bool)> {
    fn add_header(&mut self, name: &[u8], value: &[u8], sensitive: bool) {
        self.push((HeaderField::new(name, value), sensitive));
    }
}

/// How a literal field interacts with the dynamic table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndexType {
    /// Inserted into the dynamic table.
    Incremental,

    /// Not inserted.
    WithoutIndexing,

    /// Not inserted, and intermediaries must not index it either.
    NeverIndexed,
}

pub(crate) fn entry_size(name: &[u8], value: &[u8]) -> usize {
    name.len() + value.len() + HEADER_ENTRY_OVERHEAD
}

pub use crate::decoder::Decoder;
pub use crate::encoder::Encoder;

mod decoder;
mod dynamic_table;
mod encoder;
mod header_table;
pub mod huffman;
pub mod integer;
pub mod static_table;
