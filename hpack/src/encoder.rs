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
use crate::huffman;
use crate::integer::encode_int;
use crate::static_table;

use crate::header_table::HeaderTable;

use crate::entry_size;
use crate::Config;
use crate::HuffmanPolicy;
use crate::IndexType;
use crate::NameValue;

use crate::INDEXED;
use crate::LITERAL_NEVER_INDEXED;
use crate::LITERAL_WITHOUT_INDEXING;
use crate::LITERAL_WITH_INCREMENTAL_INDEXING;
use crate::SIZE_UPDATE;

/// An HPACK encoder.
///
/// The encoder owns the table that mirrors the peer decoder's dynamic table,
/// so every block it produces must be delivered to that decoder, in order.
pub struct Encoder {
    header_table: HeaderTable,
    huffman: HuffmanPolicy,
}

impl Encoder {
    /// Creates a new HPACK encoder with the given dynamic table capacity.
    pub fn new(max_header_table_size: usize) -> Encoder {
        Encoder {
            header_table: HeaderTable::new(max_header_table_size),
            huffman: HuffmanPolicy::Auto,
        }
    }

    /// Creates a new HPACK encoder from the given configuration.
    pub fn with_config(config: &Config) -> Encoder {
        Encoder {
            header_table: HeaderTable::new(config.max_table_capacity),
            huffman: config.huffman,
        }
    }

    /// Encodes a single header field, appending its representation to `out`.
    ///
    /// Sensitive fields are always sent as literals that must never be
    /// indexed. Otherwise the field is referenced from the dynamic or the
    /// static table when possible, and when it isn't `incremental` selects
    /// whether the new entry is added to the dynamic table.
    pub fn encode_header(
        &mut self, out: &mut Vec<u8>, name: &[u8], value: &[u8], sensitive: bool,
        incremental: bool,
    ) {
        if sensitive {
            let name_index = self.name_index(name);

            trace!("encoding never indexed name_index={name_index:?}");

            self.encode_literal(
                out,
                name,
                value,
                IndexType::NeverIndexed,
                name_index,
            );
            return;
        }

        // No dynamic table, only the static table can be referenced.
        if self.header_table.capacity() == 0 {
            match static_table::get_index_with_value(name, value) {
                Some(idx) => encode_int(idx, INDEXED, 7, out),

                None => {
                    let name_index = static_table::get_index(name);

                    self.encode_literal(
                        out,
                        name,
                        value,
                        IndexType::WithoutIndexing,
                        name_index,
                    );
                },
            }

            return;
        }

        let header_size = entry_size(name, value);

        // Would not fit in the table even after evicting everything.
        if header_size > self.header_table.capacity() {
            let name_index = self.name_index(name);

            trace!(
                "encoding without indexing size={} capacity={}",
                header_size,
                self.header_table.capacity()
            );

            self.encode_literal(
                out,
                name,
                value,
                IndexType::WithoutIndexing,
                name_index,
            );
            return;
        }

        if let Some(entry) = self.header_table.get_entry(name, value) {
            let idx = self.header_table.index_of(entry) + static_table::LENGTH;

            trace!("encoding dynamic indexed idx={idx}");

            encode_int(idx, INDEXED, 7, out);
            return;
        }

        if let Some(idx) = static_table::get_index_with_value(name, value) {
            trace!("encoding static indexed idx={idx}");

            encode_int(idx, INDEXED, 7, out);
            return;
        }

        let name_index = self.name_index(name);

        if incremental {
            self.header_table.ensure_capacity(header_size);

            self.encode_literal(
                out,
                name,
                value,
                IndexType::Incremental,
                name_index,
            );

            self.header_table.add(name, value);
        } else {
            self.encode_literal(
                out,
                name,
                value,
                IndexType::WithoutIndexing,
                name_index,
            );
        }
    }

    /// Encodes a list of headers, adding every field that isn't already
    /// indexed to the dynamic table.
    pub fn encode<T: NameValue>(&mut self, out: &mut Vec<u8>, headers: &[T]) {
        for h in headers {
            self.encode_header(out, h.name(), h.value(), false, true);
        }
    }

    /// Changes the dynamic table capacity, evicting entries as needed.
    ///
    /// When the capacity actually changes a dynamic table size update is
    /// appended to `out`. It must be placed at the start of the next header
    /// block.
    pub fn set_max_header_table_size(&mut self, out: &mut Vec<u8>, size: usize) {
        if self.header_table.capacity() == size {
            return;
        }

        self.header_table.set_capacity(size);

        encode_int(size, SIZE_UPDATE, 5, out);
    }

    /// Returns the dynamic table capacity.
    pub fn max_header_table_size(&self) -> usize {
        self.header_table.capacity()
    }

    /// Returns the number of entries in the dynamic table.
    pub fn len(&self) -> usize {
        self.header_table.len()
    }

    /// Returns `true` if the dynamic table has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the dynamic table size, in bytes.
    pub fn size(&self) -> usize {
        self.header_table.size()
    }

    /// Returns the name and value of the dynamic table entry at `index`,
    /// where 1 is the newest entry.
    pub fn header_field(&self, index: usize) -> Option<(&[u8], &[u8])> {
        self.header_table
            .header_field(index)
            .map(|e| (e.name(), e.value()))
    }

    /// Static indices win over dynamic ones when both tables have the name.
    fn name_index(&self, name: &[u8]) -> Option<usize> {
        static_table::get_index(name).or_else(|| {
            self.header_table
                .get_index(name)
                .map(|idx| idx + static_table::LENGTH)
        })
    }

    fn encode_literal(
        &self, out: &mut Vec<u8>, name: &[u8], value: &[u8],
        index_type: IndexType, name_index: Option<usize>,
    ) {
        let (first, prefix) = match index_type {
            IndexType::Incremental => (LITERAL_WITH_INCREMENTAL_INDEXING, 6),

            IndexType::WithoutIndexing => (LITERAL_WITHOUT_INDEXING, 4),

            IndexType::NeverIndexed => (LITERAL_NEVER_INDEXED, 4),
        };

        // A zero index is followed by the literal name.
        encode_int(name_index.unwrap_or(0), first, prefix, out);

        if name_index.is_none() {
            self.encode_str(name, out);
        }

        self.encode_str(value, out);
    }

    fn encode_str(&self, v: &[u8], out: &mut Vec<u8>) {
        let len = huffman::encode_output_length(v);

        let use_huffman = match self.huffman {
            HuffmanPolicy::Auto => len < v.len(),

            HuffmanPolicy::Always => true,

            HuffmanPolicy::Never => false,
        };

        if use_huffman {
            encode_int(len, 0x80, 7, out);
            huffman::encode(v, out);
        } else {
            encode_int(v.len(), 0, 7, out);
            out.extend_from_slice(v);
        }
    }
}
