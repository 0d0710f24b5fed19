//! Parallel per-key min/avg/max aggregation over a memory-mapped
//! `<key>;<value>` file.
//!
//! The file is split into line-aligned segments, one rayon task scans each
//! segment into a private open-addressing map, and the maps are merged once
//! every task has finished. Nothing is shared or locked during the scan.

pub mod map;
pub mod parse;
pub mod segment;

use rayon::prelude::*;

use crate::map::AggregateMap;
use crate::parse::Cursor;

/// Single forward pass over one line-aligned segment.
pub fn scan(buf: &[u8]) -> AggregateMap {
    let mut map = AggregateMap::new();
    let mut cursor = Cursor::new(buf);
    while !cursor.is_done() {
        let (hash, key) = cursor.read_key();
        let entry = map.get_or_insert(hash, key);
        let value = cursor.read_value();
        entry.sample(value);
    }
    map
}

/// Fans `workers` scans out over the rayon pool, waits for all of them,
/// then folds the private maps into one. The fold order is irrelevant to
/// the numbers: merge is commutative and associative in min/max/sum/count.
pub fn aggregate(data: &[u8], workers: usize) -> AggregateMap {
    let maps: Vec<AggregateMap> = segment::plan(data, workers)
        .into_par_iter()
        .map(|range| scan(&data[range]))
        .collect();

    let mut merged = AggregateMap::new();
    for map in maps {
        merged.merge(map);
    }
    merged
}

/// Renders the final report: keys in lexicographic byte order, each with
/// `min/avg/max` to one decimal place.
pub fn render(map: &AggregateMap) -> String {
    let rows: Vec<String> = map
        .sorted_entries()
        .iter()
        .map(|e| {
            format!(
                "{}={:.1}/{:.1}/{:.1}",
                String::from_utf8_lossy(&e.key),
                e.min_value(),
                e.mean(),
                e.max_value()
            )
        })
        .collect();
    format!("{{{}}}", rows.join(", "))
}
