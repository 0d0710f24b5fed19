//! Open-addressing aggregation map with linear probing. Slots live in one
//! pre-allocated array so the scan loop never allocates except on the first
//! sight of a key.

/// Default slot count. Power of two, sized well above any realistic key
/// cardinality so probe chains stay short.
pub const DEFAULT_CAPACITY: usize = 1 << 15;

/// Running statistics for one key.
#[derive(Debug, Clone)]
pub struct Entry {
    pub hash: u32,
    pub key: Box<[u8]>,
    pub min: i64,
    pub max: i64,
    pub sum: i64,
    pub count: u64,
}

impl Entry {
    fn new(hash: u32, key: &[u8]) -> Self {
        Entry {
            hash,
            key: key.into(),
            min: i64::MAX,
            max: i64::MIN,
            sum: 0,
            count: 0,
        }
    }

    /// Folds one tenths-scaled sample into the running stats.
    pub fn sample(&mut self, value: i64) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value;
        self.count += 1;
    }

    /// Folds another entry for the same key into this one.
    fn combine(&mut self, other: &Entry) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    pub fn min_value(&self) -> f64 {
        self.min as f64 / 10.0
    }

    pub fn max_value(&self) -> f64 {
        self.max as f64 / 10.0
    }

    /// Mean in whole units, rounded half-up to one decimal place.
    pub fn mean(&self) -> f64 {
        (self.sum as f64 / self.count as f64 + 0.5).floor() / 10.0
    }
}

pub struct AggregateMap {
    slots: Vec<Option<Entry>>,
    len: usize,
}

impl AggregateMap {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Capacity must be a power of two and at least 4x the expected number
    /// of distinct keys.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity.is_power_of_two());
        let mut slots = Vec::new();
        slots.resize_with(capacity, || None);
        AggregateMap { slots, len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First slot that is empty or already holds `key`. Equality is checked
    /// byte-for-byte, not just by hash, so colliding keys keep probing past
    /// each other.
    fn probe(&self, hash: u32, key: &[u8]) -> usize {
        let mask = self.slots.len() - 1;
        let mut index = hash as usize & mask;
        while let Some(entry) = &self.slots[index] {
            if entry.hash == hash && &*entry.key == key {
                break;
            }
            index = (index + 1) & mask;
        }
        index
    }

    /// Returns the entry for `key`, inserting a fresh one (copying the key
    /// bytes out of the mapped file) on first sight.
    pub fn get_or_insert(&mut self, hash: u32, key: &[u8]) -> &mut Entry {
        let index = self.probe(hash, key);
        if self.slots[index].is_none() {
            self.len += 1;
            debug_assert!(self.len < self.slots.len());
        }
        self.slots[index].get_or_insert_with(|| Entry::new(hash, key))
    }

    /// Folds `other` into `self`. Each incoming entry is re-probed with the
    /// same full linear search as insertion, so a slot collision between
    /// distinct keys can never drop or overwrite an entry, regardless of
    /// load factor or merge order.
    pub fn merge(&mut self, other: AggregateMap) {
        for entry in other.slots.into_iter().flatten() {
            let index = self.probe(entry.hash, &entry.key);
            match &mut self.slots[index] {
                Some(existing) => existing.combine(&entry),
                slot => {
                    *slot = Some(entry);
                    self.len += 1;
                }
            }
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.slots.iter().flatten()
    }

    /// Entries in lexicographic byte order of their keys, for reporting.
    pub fn sorted_entries(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self.entries().collect();
        entries.sort_unstable_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

impl Default for AggregateMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(samples: &[(&[u8], u32, i64)]) -> AggregateMap {
        let mut map = AggregateMap::with_capacity(8);
        for &(key, hash, value) in samples {
            map.get_or_insert(hash, key).sample(value);
        }
        map
    }

    fn stats(map: &AggregateMap, key: &[u8]) -> (i64, i64, i64, u64) {
        let entry = map
            .entries()
            .find(|e| &*e.key == key)
            .unwrap_or_else(|| panic!("missing key {key:?}"));
        (entry.min, entry.max, entry.sum, entry.count)
    }

    #[test]
    fn repeated_key_reuses_one_entry() {
        let map = filled(&[(b"Oslo", 7, 10), (b"Oslo", 7, -30), (b"Oslo", 7, 20)]);
        assert_eq!(map.len(), 1);
        assert_eq!(stats(&map, b"Oslo"), (-30, 20, 0, 3));
    }

    #[test]
    fn colliding_keys_get_separate_entries() {
        // Same hash, different bytes: both must survive, correctly split.
        let map = filled(&[(b"aaa", 42, 1), (b"bbb", 42, 2), (b"aaa", 42, 3)]);
        assert_eq!(map.len(), 2);
        assert_eq!(stats(&map, b"aaa"), (1, 3, 4, 2));
        assert_eq!(stats(&map, b"bbb"), (2, 2, 2, 1));
    }

    #[test]
    fn probe_wraps_around_the_table() {
        // Hash 7 lands on the last slot of a capacity-8 table; the second
        // key must wrap to slot 0 and still be found again later.
        let map = filled(&[(b"x", 7, 1), (b"y", 7, 2), (b"y", 7, 4)]);
        assert_eq!(map.len(), 2);
        assert_eq!(stats(&map, b"y"), (2, 4, 6, 2));
    }

    #[test]
    fn merge_combines_matching_keys() {
        let mut left = filled(&[(b"A", 1, 10), (b"B", 2, 20)]);
        let right = filled(&[(b"A", 1, -10), (b"C", 3, 30)]);
        left.merge(right);
        assert_eq!(left.len(), 3);
        assert_eq!(stats(&left, b"A"), (-10, 10, 0, 2));
        assert_eq!(stats(&left, b"B"), (20, 20, 20, 1));
        assert_eq!(stats(&left, b"C"), (30, 30, 30, 1));
    }

    #[test]
    fn merge_probes_past_occupied_slots() {
        // The target slot for the incoming "q" is held by "p" (same hash).
        // Merge must keep probing, not overwrite or misplace "q".
        let mut left = filled(&[(b"p", 5, 1)]);
        let right = filled(&[(b"q", 5, 2)]);
        left.merge(right);
        assert_eq!(left.len(), 2);
        assert_eq!(stats(&left, b"p"), (1, 1, 1, 1));
        assert_eq!(stats(&left, b"q"), (2, 2, 2, 1));

        // And the merged entry is reachable through normal insertion.
        left.get_or_insert(5, b"q").sample(8);
        assert_eq!(stats(&left, b"q"), (2, 8, 10, 2));
    }

    #[test]
    fn merge_is_commutative() {
        let a = || filled(&[(b"A", 1, 10), (b"B", 9, -5), (b"C", 9, 7)]);
        let b = || filled(&[(b"B", 9, 15), (b"D", 1, 0)]);

        let mut ab = a();
        ab.merge(b());
        let mut ba = b();
        ba.merge(a());

        for key in [b"A", b"B", b"C", b"D"] {
            assert_eq!(stats(&ab, key), (stats(&ba, key)));
        }
    }

    #[test]
    fn sorted_entries_order_by_key_bytes() {
        let map = filled(&[(b"b", 1, 1), (b"a", 2, 1), (b"ab", 3, 1)]);
        let keys: Vec<&[u8]> = map.sorted_entries().iter().map(|e| &*e.key).collect();
        assert_eq!(keys, vec![b"a".as_slice(), b"ab", b"b"]);
    }

    #[test]
    fn mean_rounds_half_up() {
        let mut entry = Entry::new(0, b"k");
        entry.sample(24);
        entry.sample(25);
        // mean is 24.5 tenths; half-up gives 2.5
        assert_eq!(entry.mean(), 2.5);

        let mut entry = Entry::new(0, b"k");
        entry.sample(-24);
        entry.sample(-25);
        // mean is -24.5 tenths; half-up (toward positive) gives -2.4
        assert_eq!(entry.mean(), -2.4);
    }
}
