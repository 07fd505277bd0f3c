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
use std::mem;

use crate::huffman;
use crate::integer::decode_ule128;
use crate::static_table;

use crate::dynamic_table::DynamicTable;

use crate::Config;
use crate::Error;
use crate::HeaderField;
use crate::HeaderListener;
use crate::IndexType;
use crate::NameValue;
use crate::Result;
use crate::HEADER_ENTRY_OVERHEAD;

use crate::INDEXED;
use crate::LITERAL_NEVER_INDEXED;
use crate::LITERAL_WITH_INCREMENTAL_INDEXING;
use crate::SIZE_UPDATE;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Representation {
    Indexed,
    LiteralWithIncrementalIndexing,
    SizeUpdate,
    LiteralNeverIndexed,
    LiteralWithoutIndexing,
}

impl Representation {
    pub fn from_byte(b: u8) -> Representation {
        if b & INDEXED == INDEXED {
            return Representation::Indexed;
        }

        if b & LITERAL_WITH_INCREMENTAL_INDEXING ==
            LITERAL_WITH_INCREMENTAL_INDEXING
        {
            return Representation::LiteralWithIncrementalIndexing;
        }

        if b & SIZE_UPDATE == SIZE_UPDATE {
            return Representation::SizeUpdate;
        }

        if b & LITERAL_NEVER_INDEXED == LITERAL_NEVER_INDEXED {
            return Representation::LiteralNeverIndexed;
        }

        Representation::LiteralWithoutIndexing
    }
}

/// Where the decoder is within the current representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    ReadHeaderRepresentation,
    ReadMaxDynamicTableSize,
    ReadIndexedHeader,
    ReadIndexedHeaderName,
    ReadLiteralHeaderNameLengthPrefix,
    ReadLiteralHeaderNameLength,
    ReadLiteralHeaderName,
    SkipLiteralHeaderName,
    ReadLiteralHeaderValueLengthPrefix,
    ReadLiteralHeaderValueLength,
    ReadLiteralHeaderValue,
    SkipLiteralHeaderValue,
}

/// Tracks the decoded size of the current header block.
struct HeaderListSize {
    size: usize,
    max: usize,
}

impl HeaderListSize {
    /// Returns `true` if `len` more bytes would go over the limit, in which
    /// case the block is marked as truncated.
    fn exceeds(&mut self, len: usize) -> bool {
        if self.size.saturating_add(len) <= self.max {
            return false;
        }

        self.size = self.max.saturating_add(1);
        true
    }

    fn is_exceeded(&self) -> bool {
        self.size > self.max
    }

    /// Delivers a field to `listener` unless it goes over the limit.
    fn emit<L: HeaderListener>(
        &mut self, listener: &mut L, name: &[u8], value: &[u8], sensitive: bool,
    ) {
        let len = name.len() + value.len();

        if self.exceeds(len) {
            trace!("dropping header, list size over {}", self.max);
            return;
        }

        listener.add_header(name, value, sensitive);
        self.size += len;
    }
}

/// An HPACK decoder.
///
/// Header blocks are fed through [`decode()`] in as many calls as needed and
/// terminated with [`end_header_block()`]. Any error is fatal, the decoder
/// must not be used after one is returned.
///
/// [`decode()`]: Decoder::decode
/// [`end_header_block()`]: Decoder::end_header_block
pub struct Decoder {
    dynamic_table: DynamicTable,
    header_list_size: HeaderListSize,

    /// The capacity limit imposed by settings
    max_dynamic_table_size: usize,
    /// The current capacity requested by the peer
    encoder_max_dynamic_table_size: usize,
    max_dynamic_table_size_change_required: bool,

    state: State,
    index_type: IndexType,
    index: usize,
    huffman_encoded: bool,
    skip_length: usize,
    name_length: usize,
    value_length: usize,
    name: Vec<u8>,
}

impl Decoder {
    /// Creates a new HPACK decoder.
    ///
    /// `max_header_size` bounds the name and value bytes delivered per
    /// header block, `max_header_table_size` the dynamic table capacity.
    pub fn new(max_header_size: usize, max_header_table_size: usize) -> Decoder {
        Decoder {
            dynamic_table: DynamicTable::new(max_header_table_size),
            header_list_size: HeaderListSize {
                size: 0,
                max: max_header_size,
            },
            max_dynamic_table_size: max_header_table_size,
            encoder_max_dynamic_table_size: max_header_table_size,
            max_dynamic_table_size_change_required: false,
            state: State::ReadHeaderRepresentation,
            index_type: IndexType::WithoutIndexing,
            index: 0,
            huffman_encoded: false,
            skip_length: 0,
            name_length: 0,
            value_length: 0,
            name: Vec::new(),
        }
    }

    /// Creates a new HPACK decoder from the given configuration.
    pub fn with_config(config: &Config) -> Decoder {
        Decoder::new(config.max_header_list_size, config.max_table_capacity)
    }

    /// Decodes as much of `b` as possible, delivering every complete header
    /// field to `listener`.
    ///
    /// Returns `Ok(())` once `b` is exhausted or when it ends in the middle of
    /// a representation. In the latter case the incomplete bytes are left in
    /// `b` and the call must be repeated, starting with them, once more input
    /// is available.
    pub fn decode<L: HeaderListener>(
        &mut self, b: &mut octets::Octets, listener: &mut L,
    ) -> Result<()> {
        while b.cap() > 0 {
            match self.state {
                State::ReadHeaderRepresentation => {
                    let first = b.get_u8()?;

                    if self.max_dynamic_table_size_change_required &&
                        first & 0xe0 != SIZE_UPDATE
                    {
                        return Err(Error::MaxDynamicTableSizeChangeRequired);
                    }

                    self.read_representation(first, listener)?;
                },

                State::ReadMaxDynamicTableSize => {
                    let Some(v) = decode_ule128(b)? else {
                        return Ok(());
                    };

                    let size = self.continued(v)?;

                    self.set_dynamic_table_size(size)?;
                    self.state = State::ReadHeaderRepresentation;
                },

                State::ReadIndexedHeader => {
                    let Some(v) = decode_ule128(b)? else {
                        return Ok(());
                    };

                    let index = self.continued(v)?;

                    self.index_header(index, listener)?;
                    self.state = State::ReadHeaderRepresentation;
                },

                State::ReadIndexedHeaderName => {
                    let Some(v) = decode_ule128(b)? else {
                        return Ok(());
                    };

                    let index = self.continued(v)?;

                    self.read_name(index)?;
                    self.state = State::ReadLiteralHeaderValueLengthPrefix;
                },

                State::ReadLiteralHeaderNameLengthPrefix => {
                    let first = b.get_u8()?;

                    self.huffman_encoded = first & 0x80 == 0x80;
                    self.index = usize::from(first & 0x7f);

                    if self.index == 0x7f {
                        self.state = State::ReadLiteralHeaderNameLength;
                    } else {
                        if self.index == 0 {
                            return Err(Error::EmptyHeaderName);
                        }

                        self.name_length = self.index;
                        self.begin_name();
                    }
                },

                State::ReadLiteralHeaderNameLength => {
                    let Some(v) = decode_ule128(b)? else {
                        return Ok(());
                    };

                    self.name_length = self.continued(v)?;
                    self.begin_name();
                },

                State::ReadLiteralHeaderName => {
                    if b.cap() < self.name_length {
                        return Ok(());
                    }

                    self.name = self.read_string(b, self.name_length)?;
                    self.state = State::ReadLiteralHeaderValueLengthPrefix;
                },

                State::SkipLiteralHeaderName => {
                    let len = self.skip_length.min(b.cap());

                    b.skip(len)?;
                    self.skip_length -= len;

                    if self.skip_length == 0 {
                        self.state = State::ReadLiteralHeaderValueLengthPrefix;
                    }
                },

                State::ReadLiteralHeaderValueLengthPrefix => {
                    let first = b.get_u8()?;

                    self.huffman_encoded = first & 0x80 == 0x80;
                    self.index = usize::from(first & 0x7f);

                    if self.index == 0x7f {
                        self.state = State::ReadLiteralHeaderValueLength;
                    } else {
                        self.value_length = self.index;
                        self.begin_value(listener);
                    }
                },

                State::ReadLiteralHeaderValueLength => {
                    let Some(v) = decode_ule128(b)? else {
                        return Ok(());
                    };

                    self.value_length = self.continued(v)?;
                    self.begin_value(listener);
                },

                State::ReadLiteralHeaderValue => {
                    if b.cap() < self.value_length {
                        return Ok(());
                    }

                    let value = self.read_string(b, self.value_length)?;

                    self.insert_header(listener, value);
                    self.state = State::ReadHeaderRepresentation;
                },

                State::SkipLiteralHeaderValue => {
                    let len = self.skip_length.min(b.cap());

                    b.skip(len)?;
                    self.skip_length -= len;

                    if self.skip_length == 0 {
                        self.state = State::ReadHeaderRepresentation;
                    }
                },
            }
        }

        Ok(())
    }

    /// Ends the current header block, resetting the decoder for the next
    /// one.
    ///
    /// Returns `true` if headers were dropped because the block went over the
    /// maximum header list size.
    pub fn end_header_block(&mut self) -> bool {
        let truncated = self.header_list_size.is_exceeded();

        if self.state != State::ReadHeaderRepresentation {
            debug!("header block ended in state {:?}", self.state);
        }

        self.header_list_size.size = 0;
        self.state = State::ReadHeaderRepresentation;
        self.index_type = IndexType::WithoutIndexing;
        self.name.clear();

        truncated
    }

    /// Sets the local limit for the dynamic table capacity.
    ///
    /// If the limit is lower than the capacity currently used by the peer's
    /// encoder, the table is shrunk right away and the next header block
    /// must start with a dynamic table size update.
    pub fn set_max_header_table_size(&mut self, size: usize) {
        self.max_dynamic_table_size = size;

        if self.max_dynamic_table_size < self.encoder_max_dynamic_table_size {
            debug!(
                "local table limit {} below encoder's {}, size update required",
                size, self.encoder_max_dynamic_table_size
            );

            self.max_dynamic_table_size_change_required = true;
            self.dynamic_table.set_capacity(size);
        }
    }

    /// Returns the dynamic table capacity.
    pub fn max_header_table_size(&self) -> usize {
        self.dynamic_table.capacity()
    }

    /// Returns the number of entries in the dynamic table.
    pub fn len(&self) -> usize {
        self.dynamic_table.len()
    }

    /// Returns `true` if the dynamic table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dynamic table size, in bytes.
    pub fn size(&self) -> usize {
        self.dynamic_table.size()
    }

    /// Returns the dynamic table entry at `index`, where 1 is the newest
    /// entry.
    pub fn header_field(&self, index: usize) -> Option<&HeaderField> {
        self.dynamic_table.get_entry(index)
    }

    fn read_representation<L: HeaderListener>(
        &mut self, first: u8, listener: &mut L,
    ) -> Result<()> {
        match Representation::from_byte(first) {
            Representation::Indexed => {
                self.index = usize::from(first & 0x7f);

                match self.index {
                    0 => return Err(Error::IllegalIndex),

                    0x7f => self.state = State::ReadIndexedHeader,

                    index => self.index_header(index, listener)?,
                }
            },

            Representation::LiteralWithIncrementalIndexing => {
                self.index_type = IndexType::Incremental;
                self.index = usize::from(first & 0x3f);

                self.literal_name(0x3f)?;
            },

            Representation::SizeUpdate => {
                self.index = usize::from(first & 0x1f);

                if self.index == 0x1f {
                    self.state = State::ReadMaxDynamicTableSize;
                } else {
                    self.set_dynamic_table_size(self.index)?;
                }
            },

            Representation::LiteralNeverIndexed => {
                self.index_type = IndexType::NeverIndexed;
                self.index = usize::from(first & 0x0f);

                self.literal_name(0x0f)?;
            },

            Representation::LiteralWithoutIndexing => {
                self.index_type = IndexType::WithoutIndexing;
                self.index = usize::from(first & 0x0f);

                self.literal_name(0x0f)?;
            },
        }

        Ok(())
    }

    /// Picks up a literal after its prefix, `mask` being the prefix's
    /// maximum value.
    fn literal_name(&mut self, mask: usize) -> Result<()> {
        trace!(
            "literal {:?} name_index={} continued={}",
            self.index_type,
            self.index,
            self.index == mask
        );

        match self.index {
            0 => self.state = State::ReadLiteralHeaderNameLengthPrefix,

            index if index == mask => self.state = State::ReadIndexedHeaderName,

            index => {
                self.read_name(index)?;
                self.state = State::ReadLiteralHeaderValueLengthPrefix;
            },
        }

        Ok(())
    }

    /// Adds the continuation bytes of a saturated prefix to it.
    fn continued(&self, v: u32) -> Result<usize> {
        let v = u32::try_from(self.index)
            .ok()
            .and_then(|index| index.checked_add(v))
            .filter(|v| *v <= i32::MAX as u32)
            .ok_or(Error::IntegerOverflow)?;

        Ok(v as usize)
    }

    fn begin_name(&mut self) {
        let name_length = self.name_length;

        if self.header_list_size.exceeds(name_length) &&
            (self.index_type != IndexType::Incremental ||
                self.clear_if_oversized(name_length))
        {
            trace!("skipping name of {name_length} bytes");

            self.name.clear();
            self.skip_length = name_length;
            self.state = State::SkipLiteralHeaderName;
            return;
        }

        self.state = State::ReadLiteralHeaderName;
    }

    fn begin_value<L: HeaderListener>(&mut self, listener: &mut L) {
        let header_length = self.name_length + self.value_length;

        if self.header_list_size.exceeds(header_length) &&
            (self.index_type != IndexType::Incremental ||
                self.clear_if_oversized(header_length))
        {
            trace!("skipping value of {} bytes", self.value_length);

            self.skip_length = self.value_length;
            self.state = if self.skip_length == 0 {
                State::ReadHeaderRepresentation
            } else {
                State::SkipLiteralHeaderValue
            };
            return;
        }

        if self.value_length == 0 {
            self.insert_header(listener, Vec::new());
            self.state = State::ReadHeaderRepresentation;
        } else {
            self.state = State::ReadLiteralHeaderValue;
        }
    }

    /// Clears the dynamic table if an entry of `len` name and value bytes
    /// can't fit in it, as the peer's table clears on such an insertion.
    fn clear_if_oversized(&mut self, len: usize) -> bool {
        if len + HEADER_ENTRY_OVERHEAD <= self.dynamic_table.capacity() {
            return false;
        }

        self.dynamic_table.clear();
        true
    }

    fn read_string(&self, b: &mut octets::Octets, len: usize) -> Result<Vec<u8>> {
        let mut s = b.get_bytes(len)?;

        if self.huffman_encoded {
            return huffman::decode(&mut s);
        }

        Ok(s.to_vec())
    }

    fn read_name(&mut self, index: usize) -> Result<()> {
        let name = match index {
            0 => return Err(Error::IllegalIndex),

            _ if index <= static_table::LENGTH =>
                static_table::get_entry(index).0.to_vec(),

            _ => self
                .dynamic_table
                .get_entry(index - static_table::LENGTH)
                .ok_or(Error::IllegalIndex)?
                .name()
                .to_vec(),
        };

        self.name_length = name.len();
        self.name = name;

        Ok(())
    }

    fn index_header<L: HeaderListener>(
        &mut self, index: usize, listener: &mut L,
    ) -> Result<()> {
        trace!("indexed idx={index}");

        if index == 0 {
            return Err(Error::IllegalIndex);
        }

        if index <= static_table::LENGTH {
            let (name, value) = static_table::get_entry(index);

            self.header_list_size.emit(listener, name, value, false);
            return Ok(());
        }

        let field = self
            .dynamic_table
            .get_entry(index - static_table::LENGTH)
            .ok_or(Error::IllegalIndex)?;

        self.header_list_size
            .emit(listener, field.name(), field.value(), false);

        Ok(())
    }

    fn insert_header<L: HeaderListener>(
        &mut self, listener: &mut L, value: Vec<u8>,
    ) {
        let name = mem::take(&mut self.name);

        self.header_list_size.emit(
            listener,
            &name,
            &value,
            self.index_type == IndexType::NeverIndexed,
        );

        if self.index_type == IndexType::Incremental {
            self.dynamic_table.add(HeaderField { name, value });
        }
    }

    fn set_dynamic_table_size(&mut self, size: usize) -> Result<()> {
        trace!("dynamic table size update {size}");

        if size > self.max_dynamic_table_size {
            return Err(Error::InvalidMaxDynamicTableSize);
        }

        self.encoder_max_dynamic_table_size = size;
        self.max_dynamic_table_size_change_required = false;
        self.dynamic_table.set_capacity(size);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(
        dec: &mut Decoder, buf: &[u8],
    ) -> Result<Vec<(HeaderField, bool)>> {
        let mut headers = Vec::new();
        let mut b = octets::Octets::with_slice(buf);

        dec.decode(&mut b, &mut headers)?;

        Ok(headers)
    }

    fn literal(first: u8, name: &[u8], value: &[u8]) -> Vec<u8> {
        let mut out = vec![first, name.len() as u8];
        out.extend_from_slice(name);
        out.push(value.len() as u8);
        out.extend_from_slice(value);
        out
    }

    #[test]
    fn indexed_static() {
        let mut dec = Decoder::new(8192, 4096);

        let headers = decode_all(&mut dec, &[0x82, 0x87]).unwrap();

        assert_eq!(headers, vec![
            (HeaderField::new(b":method", b"GET"), false),
            (HeaderField::new(b":scheme", b"https"), false),
        ]);
        assert!(!dec.end_header_block());
    }

    #[test]
    fn illegal_index() {
        let mut dec = Decoder::new(8192, 4096);
        assert_eq!(decode_all(&mut dec, &[0x80]), Err(Error::IllegalIndex));

        // One past the static table with an empty dynamic table.
        let mut dec = Decoder::new(8192, 4096);
        assert_eq!(decode_all(&mut dec, &[0xbe]), Err(Error::IllegalIndex));

        // Name reference past the static table.
        let mut dec = Decoder::new(8192, 4096);
        assert_eq!(
            decode_all(&mut dec, &[0x7e, 0x01, b'a']),
            Err(Error::IllegalIndex)
        );

        // Continued index, 127 + 100.
        let mut dec = Decoder::new(8192, 4096);
        assert_eq!(decode_all(&mut dec, &[0xff, 0x64]), Err(Error::IllegalIndex));
    }

    #[test]
    fn incremental_indexing() {
        let mut dec = Decoder::new(8192, 4096);

        let buf = literal(0x40, b"custom-key", b"custom-header");
        let headers = decode_all(&mut dec, &buf).unwrap();

        assert_eq!(headers, vec![(
            HeaderField::new(b"custom-key", b"custom-header"),
            false
        )]);
        assert_eq!(dec.len(), 1);
        assert_eq!(dec.size(), 55);
        assert!(!dec.end_header_block());

        // Now referenced from the dynamic table.
        let headers = decode_all(&mut dec, &[0xbe]).unwrap();
        assert_eq!(headers[0].0.name(), b"custom-key");
        assert_eq!(headers[0].0.value(), b"custom-header");
        assert!(!dec.end_header_block());
    }

    #[test]
    fn indexed_name() {
        let mut dec = Decoder::new(8192, 4096);

        let headers = decode_all(&mut dec, &[
            0x04, 0x0c, b'/', b's', b'a', b'm', b'p', b'l', b'e', b'/', b'p',
            b'a', b't', b'h',
        ])
        .unwrap();

        assert_eq!(headers, vec![(
            HeaderField::new(b":path", b"/sample/path"),
            false
        )]);
        assert!(dec.is_empty());
    }

    #[test]
    fn never_indexed() {
        let mut dec = Decoder::new(8192, 4096);

        let buf = literal(0x10, b"password", b"secret");
        let headers = decode_all(&mut dec, &buf).unwrap();

        assert_eq!(headers, vec![(HeaderField::new(b"password", b"secret"), true)]);
        assert!(dec.is_empty());
    }

    #[test]
    fn empty_value() {
        let mut dec = Decoder::new(8192, 4096);

        let headers = decode_all(&mut dec, &[0x40, 0x01, b'a', 0x00]).unwrap();

        assert_eq!(headers, vec![(HeaderField::new(b"a", b""), false)]);
        assert_eq!(dec.size(), 33);
    }

    #[test]
    fn empty_name() {
        let mut dec = Decoder::new(8192, 4096);

        assert_eq!(
            decode_all(&mut dec, &[0x40, 0x00, 0x01, b'a']),
            Err(Error::EmptyHeaderName)
        );
    }

    #[test]
    fn huffman_literal() {
        let mut dec = Decoder::new(8192, 4096);

        let headers = decode_all(&mut dec, &[
            0x41, 0x8c, 0xf1, 0xe3, 0xc2, 0xe5, 0xf2, 0x3a, 0x6b, 0xa0, 0xab,
            0x90, 0xf4, 0xff,
        ])
        .unwrap();

        assert_eq!(headers, vec![(
            HeaderField::new(b":authority", b"www.example.com"),
            false
        )]);

        let mut dec = Decoder::new(8192, 4096);
        assert_eq!(
            decode_all(&mut dec, &[0x41, 0x81, 0x18]),
            Err(Error::InvalidHuffmanPadding)
        );
    }

    #[test]
    fn byte_at_a_time() {
        let mut buf = vec![0x82];
        buf.extend_from_slice(&literal(0x40, b"custom-key", b"custom-header"));
        buf.extend_from_slice(&[0x3f, 0xe1, 0x01]);
        buf.extend_from_slice(&[0xbe]);

        let mut dec = Decoder::new(8192, 4096);
        let mut headers = Vec::new();

        let mut pending = Vec::new();

        for &byte in &buf {
            pending.push(byte);

            let mut b = octets::Octets::with_slice(&pending);
            dec.decode(&mut b, &mut headers).unwrap();

            let off = b.off();
            pending.drain(..off);
        }

        assert!(pending.is_empty());
        assert!(!dec.end_header_block());

        assert_eq!(headers, vec![
            (HeaderField::new(b":method", b"GET"), false),
            (HeaderField::new(b"custom-key", b"custom-header"), false),
            (HeaderField::new(b"custom-key", b"custom-header"), false),
        ]);
        assert_eq!(dec.max_header_table_size(), 256);
    }

    #[test]
    fn incomplete_string_not_consumed() {
        let mut dec = Decoder::new(8192, 4096);
        let mut headers = Vec::new();

        let buf = literal(0x00, b"abc", b"defg");

        let mut b = octets::Octets::with_slice(&buf[..4]);
        dec.decode(&mut b, &mut headers).unwrap();

        // The prefix was consumed, the partial name wasn't.
        assert_eq!(b.off(), 2);
        assert!(headers.is_empty());

        let mut b = octets::Octets::with_slice(&buf[2..]);
        dec.decode(&mut b, &mut headers).unwrap();

        assert_eq!(b.cap(), 0);
        assert_eq!(headers, vec![(HeaderField::new(b"abc", b"defg"), false)]);
    }

    #[test]
    fn size_update() {
        let mut dec = Decoder::new(8192, 4096);

        decode_all(&mut dec, &literal(0x40, b"a", b"b")).unwrap();
        assert_eq!(dec.len(), 1);

        decode_all(&mut dec, &[0x20]).unwrap();
        assert_eq!(dec.max_header_table_size(), 0);
        assert!(dec.is_empty());

        decode_all(&mut dec, &[0x3f, 0x81, 0x1f]).unwrap();
        assert_eq!(dec.max_header_table_size(), 4000);
    }

    #[test]
    fn invalid_size_update() {
        let mut dec = Decoder::new(8192, 4096);

        // 4097
        assert_eq!(
            decode_all(&mut dec, &[0x3f, 0xe2, 0x1f]),
            Err(Error::InvalidMaxDynamicTableSize)
        );
    }

    #[test]
    fn size_update_required() {
        let mut dec = Decoder::new(8192, 4096);

        decode_all(&mut dec, &literal(0x40, b"a", b"b")).unwrap();

        dec.set_max_header_table_size(1024);
        assert_eq!(dec.max_header_table_size(), 1024);
        assert_eq!(dec.len(), 1);

        assert_eq!(
            decode_all(&mut dec, &[0x82]),
            Err(Error::MaxDynamicTableSizeChangeRequired)
        );

        let mut dec = Decoder::new(8192, 4096);
        dec.set_max_header_table_size(1024);

        // Above the new limit.
        assert_eq!(
            decode_all(&mut dec, &[0x3f, 0xe1, 0x1f]),
            Err(Error::InvalidMaxDynamicTableSize)
        );

        let mut dec = Decoder::new(8192, 4096);
        dec.set_max_header_table_size(1024);

        let headers = decode_all(&mut dec, &[0x3f, 0xe1, 0x07, 0x82]).unwrap();
        assert_eq!(dec.max_header_table_size(), 1024);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn raising_limit_needs_no_update() {
        let mut dec = Decoder::new(8192, 4096);

        dec.set_max_header_table_size(8192);
        assert_eq!(dec.max_header_table_size(), 4096);

        assert_eq!(decode_all(&mut dec, &[0x82]).unwrap().len(), 1);
    }

    #[test]
    fn integer_overflow() {
        let mut dec = Decoder::new(8192, 4096);

        assert_eq!(
            decode_all(&mut dec, &[0xff, 0xff, 0xff, 0xff, 0xff, 0x0f]),
            Err(Error::IntegerOverflow)
        );

        // The prefix pushes a 31-bit continuation over the limit.
        let mut dec = Decoder::new(8192, 4096);

        assert_eq!(
            decode_all(&mut dec, &[0xff, 0xff, 0xff, 0xff, 0xff, 0x07]),
            Err(Error::IntegerOverflow)
        );
    }

    #[test]
    fn header_list_size_limit() {
        let mut dec = Decoder::new(10, 4096);

        let mut buf = literal(0x00, b"aaaa", b"bbbb");
        buf.extend_from_slice(&literal(0x00, b"cccc", b"dddd"));
        buf.push(0x82);

        let headers = decode_all(&mut dec, &buf).unwrap();

        assert_eq!(headers, vec![(HeaderField::new(b"aaaa", b"bbbb"), false)]);
        assert!(dec.end_header_block());

        // The limit is per block.
        let headers = decode_all(&mut dec, &[0x82]).unwrap();
        assert_eq!(headers.len(), 1);
        assert!(!dec.end_header_block());
    }

    #[test]
    fn oversized_incremental_fits_table() {
        let mut dec = Decoder::new(4, 4096);

        let headers =
            decode_all(&mut dec, &literal(0x40, b"name", b"value")).unwrap();

        // Not delivered, but still inserted to stay in sync with the peer.
        assert!(headers.is_empty());
        assert_eq!(dec.len(), 1);
        assert_eq!(dec.header_field(1).unwrap().value(), b"value");
        assert!(dec.end_header_block());
    }

    #[test]
    fn oversized_incremental_clears_table() {
        let mut dec = Decoder::new(16, 64);

        decode_all(&mut dec, &literal(0x40, b"a", b"b")).unwrap();
        assert_eq!(dec.len(), 1);
        assert!(!dec.end_header_block());

        let value = [b'v'; 40];
        let headers = decode_all(&mut dec, &literal(0x40, b"name", &value)).unwrap();

        assert!(headers.is_empty());
        assert!(dec.is_empty());
        assert!(dec.end_header_block());
    }

    #[test]
    fn oversized_name_skipped() {
        let mut dec = Decoder::new(16, 4096);
        let mut headers = Vec::new();

        let name = [b'n'; 20];
        let buf = literal(0x00, &name, b"v");

        // Split in the middle of the skipped name.
        let mut b = octets::Octets::with_slice(&buf[..10]);
        dec.decode(&mut b, &mut headers).unwrap();
        assert_eq!(b.cap(), 0);

        let mut b = octets::Octets::with_slice(&buf[10..]);
        dec.decode(&mut b, &mut headers).unwrap();
        assert_eq!(b.cap(), 0);

        assert!(headers.is_empty());
        assert!(dec.end_header_block());
    }

    #[test]
    fn end_header_block_resets_state() {
        let mut dec = Decoder::new(8192, 4096);

        // Cut in the middle of the value.
        let buf = literal(0x00, b"abc", b"defg");
        decode_all(&mut dec, &buf[..7]).unwrap();

        assert!(!dec.end_header_block());

        let headers = decode_all(&mut dec, &[0x82]).unwrap();
        assert_eq!(headers, vec![(HeaderField::new(b":method", b"GET"), false)]);
    }
}
