use log::debug;

use crate::frequency::{FrequencyTable, Symbol};
use crate::tree::HuffNode;

/// Largest bucket array the counting sort will allocate.
const BUCKET_LIMIT: u64 = 1 << 16;

/// One leaf per present symbol, ascending by frequency, equal frequencies
/// ascending by symbol value.
///
/// Buckets are indexed by frequency. The table hands symbols out in ascending
/// order, so each bucket is already tie-broken when it is concatenated.
pub fn ordered_leaves(frequencies: &FrequencyTable) -> Vec<HuffNode> {
    let max_frequency = frequencies.max_frequency();
    if max_frequency >= BUCKET_LIMIT {
        debug!("max frequency {max_frequency} exceeds bucket limit, sorting by frequency");
        return sorted_leaves(frequencies);
    }

    let mut buckets: Vec<Vec<Symbol>> = vec![Vec::new(); max_frequency as usize + 1];
    for (symbol, count) in frequencies.iter() {
        buckets[count as usize].push(symbol);
    }

    buckets
        .into_iter()
        .enumerate()
        .flat_map(|(frequency, symbols)| {
            symbols
                .into_iter()
                .map(move |symbol| HuffNode::leaf(symbol, frequency as u64))
        })
        .collect()
}

// Stable, so equal frequencies keep ascending symbol order.
fn sorted_leaves(frequencies: &FrequencyTable) -> Vec<HuffNode> {
    let mut leaves: Vec<HuffNode> = frequencies
        .iter()
        .map(|(symbol, count)| HuffNode::leaf(symbol, count))
        .collect();
    leaves.sort_by_key(HuffNode::frequency);
    leaves
}
