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

use crate::entry_size;
use crate::HeaderField;

const BUCKET_SIZE: usize = 17;

/// An entry of the encoder's table.
///
/// Entries live in an arena and refer to each other by slot.
pub struct HeaderEntry {
    hash: i32,
    name: Vec<u8>,
    value: Vec<u8>,

    /// Absolute index, lower for newer entries. Never renumbered.
    index: usize,

    /// Next entry in the same hash bucket, newer first.
    bucket_next: Option<usize>,

    /// Older neighbour in insertion order.
    prev: Option<usize>,

    /// Newer neighbour in insertion order.
    next: Option<usize>,
}

impl HeaderEntry {
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// The encoder's view of the peer's dynamic table.
///
/// Keeps insertion order in a doubly linked list and indexes entries by name
/// hash, so that both eviction and lookups avoid scanning the whole table.
pub struct HeaderTable {
    entries: Vec<HeaderEntry>,

    /// Slots of evicted entries, reused by the next insertions.
    free: Vec<usize>,

    buckets: [Option<usize>; BUCKET_SIZE],

    oldest: Option<usize>,
    newest: Option<usize>,

    /// The computed size of the table as per rfc7541
    size: usize,
    capacity: usize,
}

impl HeaderTable {
    pub fn new(capacity: usize) -> HeaderTable {
        HeaderTable {
            entries: Vec::new(),
            free: Vec::new(),
            buckets: [None; BUCKET_SIZE],
            oldest: None,
            newest: None,
            size: 0,
            capacity,
        }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        match (self.oldest, self.newest) {
            (Some(oldest), Some(newest)) =>
                self.entries[oldest].index - self.entries[newest].index + 1,

            _ => 0,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        debug!(
            "header table capacity {} -> {} size={}",
            self.capacity, capacity, self.size
        );

        self.capacity = capacity;
        self.ensure_capacity(0);
    }

    /// Evicts entries until `header_size` more bytes fit in the table.
    pub fn ensure_capacity(&mut self, header_size: usize) {
        while self.size + header_size > self.capacity {
            if self.remove().is_none() {
                break;
            }
        }
    }

    /// Returns the field at the 1-based `index`, where 1 is the newest.
    pub fn header_field(&self, index: usize) -> Option<&HeaderEntry> {
        if index == 0 || index > self.len() {
            return None;
        }

        let mut slot = self.newest?;

        for _ in 1..index {
            slot = self.entries[slot].prev?;
        }

        Some(&self.entries[slot])
    }

    /// Returns the entry matching both `name` and `value`.
    pub fn get_entry(&self, name: &[u8], value: &[u8]) -> Option<&HeaderEntry> {
        let h = hash(name);

        self.bucket(h)
            .find(|e| e.hash == h && e.name == name && e.value == value)
    }

    /// Returns the relative index of the newest entry named `name`.
    pub fn get_index(&self, name: &[u8]) -> Option<usize> {
        let h = hash(name);

        self.bucket(h)
            .find(|e| e.hash == h && e.name == name)
            .map(|e| self.index_of(e))
    }

    /// Converts the entry's absolute index into its current relative index.
    pub fn index_of(&self, entry: &HeaderEntry) -> usize {
        match self.newest {
            Some(newest) => entry.index - self.entries[newest].index + 1,

            None => 0,
        }
    }

    pub fn add(&mut self, name: &[u8], value: &[u8]) {
        let header_size = entry_size(name, value);

        if header_size > self.capacity {
            self.clear();
            return;
        }

        self.ensure_capacity(header_size);

        let hash = hash(name);
        let b = bucket_of(hash);

        let index = match self.newest {
            Some(newest) => self.entries[newest].index - 1,

            None => usize::MAX,
        };

        let entry = HeaderEntry {
            hash,
            name: name.to_vec(),
            value: value.to_vec(),
            index,
            bucket_next: self.buckets[b],
            prev: self.newest,
            next: None,
        };

        let slot = match self.free.pop() {
            Some(slot) => {
                self.entries[slot] = entry;
                slot
            },

            None => {
                self.entries.push(entry);
                self.entries.len() - 1
            },
        };

        self.buckets[b] = Some(slot);

        match self.newest {
            Some(newest) => self.entries[newest].next = Some(slot),

            None => self.oldest = Some(slot),
        }

        self.newest = Some(slot);
        self.size += header_size;
    }

    /// Evicts the oldest entry.
    pub fn remove(&mut self) -> Option<HeaderField> {
        let eldest = self.oldest?;

        let b = bucket_of(self.entries[eldest].hash);

        let mut prev: Option<usize> = None;
        let mut cur = self.buckets[b];

        while let Some(slot) = cur {
            let next = self.entries[slot].bucket_next;

            if slot == eldest {
                match prev {
                    Some(prev) => self.entries[prev].bucket_next = next,

                    None => self.buckets[b] = next,
                }

                break;
            }

            prev = cur;
            cur = next;
        }

        let entry = &mut self.entries[eldest];

        let newer = entry.next.take();
        entry.bucket_next = None;

        let field = HeaderField {
            name: mem::take(&mut entry.name),
            value: mem::take(&mut entry.value),
        };

        self.oldest = newer;

        match newer {
            Some(newer) => self.entries[newer].prev = None,

            None => self.newest = None,
        }

        self.size -= field.size();
        self.free.push(eldest);

        Some(field)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
        self.buckets = [None; BUCKET_SIZE];
        self.oldest = None;
        self.newest = None;
        self.size = 0;
    }

    fn bucket(&self, h: i32) -> BucketIter<'_> {
        BucketIter {
            table: self,
            cur: self.buckets[bucket_of(h)],
        }
    }
}

struct BucketIter<'a> {
    table: &'a HeaderTable,
    cur: Option<usize>,
}

impl<'a> Iterator for BucketIter<'a> {
    type Item = &'a HeaderEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = &self.table.entries[self.cur?];
        self.cur = entry.bucket_next;

        Some(entry)
    }
}

/// Polynomial hash of a header name, folded to a non-negative value.
fn hash(name: &[u8]) -> i32 {
    let h = name.iter().fold(0i32, |h, &b| {
        h.wrapping_mul(31).wrapping_add(i32::from(b as i8))
    });

    if h >= 0 {
        h
    } else if h == i32::MIN {
        i32::MAX
    } else {
        -h
    }
}

fn bucket_of(h: i32) -> usize {
    h as usize % BUCKET_SIZE
}
