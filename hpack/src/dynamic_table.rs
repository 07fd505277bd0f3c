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

use crate::HeaderField;
use crate::HEADER_ENTRY_OVERHEAD;

/// The decoder's dynamic table, a ring buffer of fields.
///
/// `head` is the slot the next insertion goes to and `tail` the oldest
/// entry. Every entry takes at least `HEADER_ENTRY_OVERHEAD` bytes, so
/// `ceil(capacity / 32)` slots are enough to hold a full table.
#[derive(Default)]
pub struct DynamicTable {
    fields: Vec<Option<HeaderField>>,
    head: usize,
    tail: usize,
    /// The computed size of the table as per rfc7541
    size: usize,
    capacity: usize,
}

impl DynamicTable {
    pub fn new(capacity: usize) -> DynamicTable {
        let mut table = DynamicTable::default();
        table.set_capacity(capacity);
        table
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        if self.head == self.tail {
            // Empty, unless every slot is taken.
            return match self.fields.get(self.tail) {
                Some(Some(_)) => self.fields.len(),
                _ => 0,
            };
        }

        if self.head < self.tail {
            self.fields.len() - self.tail + self.head
        } else {
            self.head - self.tail
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the entry at the 1-based `index`, where 1 is the newest.
    pub fn get_entry(&self, index: usize) -> Option<&HeaderField> {
        if index == 0 || index > self.len() {
            return None;
        }

        let i = (self.head + self.fields.len() - index) % self.fields.len();

        self.fields[i].as_ref()
    }

    pub fn add(&mut self, field: HeaderField) {
        let field_size = field.size();

        if field_size > self.capacity {
            self.clear();
            return;
        }

        while self.size + field_size > self.capacity || self.is_full() {
            self.remove();
        }

        self.fields[self.head] = Some(field);
        self.head = (self.head + 1) % self.fields.len();
        self.size += field_size;
    }

    /// Evicts the oldest entry.
    pub fn remove(&mut self) -> Option<HeaderField> {
        let removed = self.fields.get_mut(self.tail)?.take()?;

        self.size -= removed.size();
        self.tail = (self.tail + 1) % self.fields.len();

        Some(removed)
    }

    pub fn clear(&mut self) {
        for field in &mut self.fields {
            *field = None;
        }

        self.head = 0;
        self.tail = 0;
        self.size = 0;
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        if self.capacity == capacity && !self.fields.is_empty() {
            return;
        }

        debug!(
            "dynamic table capacity {} -> {} size={}",
            self.capacity, capacity, self.size
        );

        self.capacity = capacity;

        if capacity == 0 {
            self.clear();
        } else {
            while self.size > capacity {
                self.remove();
            }
        }

        let slots = capacity.div_ceil(HEADER_ENTRY_OVERHEAD).max(1);

        if self.fields.len() == slots {
            return;
        }

        let len = self.len();
        let mut fields = Vec::with_capacity(slots);

        // Oldest first, so that the new buffer starts at slot 0.
        while let Some(field) = self.remove() {
            fields.push(Some(field));
        }

        fields.resize(slots, None);

        self.fields = fields;
        self.tail = 0;
        self.head = len % slots;
        self.size = self.fields.iter().flatten().map(HeaderField::size).sum();
    }

    fn is_full(&self) -> bool {
        self.head == self.tail && self.fields[self.tail].is_some()
    }
}
