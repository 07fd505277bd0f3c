/// Fuzzer input made of several chunks separated by a `fuzz` marker.
pub struct Chunks<'a> {
    pub data: &'a [u8],
}

pub struct ChunkIterator<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> Iterator for ChunkIterator<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.index < self.data.len() {
            let start = self.index;
            if self.index + 4 <= self.data.len() {
                for i in self.index..=self.data.len() - 4 {
                    if &self.data[i..i + 4] == b"fuzz" {
                        self.index = i + 4;
                        return Some(&self.data[start..i]);
                    }
                }
            }
            self.index = self.data.len();
            Some(&self.data[start..])
        } else {
            None
        }
    }
}

impl<'a> Chunks<'a> {
    pub fn iter(&self) -> ChunkIterator<'_> {
        ChunkIterator {
            data: self.data,
            index: 0,
        }
    }
}

/// Collects decoded fields, checking them against the decoder's limit.
pub struct Collector {
    pub headers: Vec<(Vec<u8>, Vec<u8>, bool)>,
    pub max_header_list_size: usize,
}

impl hpack::HeaderListener for Collector {
    fn add_header(&mut self, name: &[u8], value: &[u8], sensitive: bool) {
        let size: usize = self
            .headers
            .iter()
            .map(|(n, v, _)| n.len() + v.len())
            .sum();

        assert!(size + name.len() + value.len() <= self.max_header_list_size);

        self.headers.push((name.to_vec(), value.to_vec(), sensitive));
    }
}
