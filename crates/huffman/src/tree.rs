use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt::{Display, Formatter};

use log::{debug, trace};

use crate::bits::BitReader;
use crate::frequency::{DisplaySymbol, FrequencyTable, Symbol};
use crate::ordering::ordered_leaves;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf {
        symbol: Symbol,
        frequency: u64,
    },
    Internal {
        frequency: u64,
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: Symbol, frequency: u64) -> Self {
        HuffNode::Leaf { symbol, frequency }
    }

    pub fn merge(left: HuffNode, right: HuffNode) -> Self {
        HuffNode::Internal {
            frequency: left.frequency() + right.frequency(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn frequency(&self) -> u64 {
        match self {
            HuffNode::Leaf { frequency, .. } => *frequency,
            HuffNode::Internal { frequency, .. } => *frequency,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf { .. })
    }

    fn leaf_count(&self) -> usize {
        match self {
            HuffNode::Leaf { .. } => 1,
            HuffNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }

    fn fmt_indented(&self, f: &mut Formatter<'_>, depth: usize, label: &str) -> std::fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            HuffNode::Leaf { symbol, frequency } => {
                writeln!(f, "{indent}{label}: {} ({frequency})", DisplaySymbol(*symbol))
            }
            HuffNode::Internal { frequency, left, right } => {
                writeln!(f, "{indent}{label}: ({frequency})")?;
                left.fmt_indented(f, depth + 1, "0")?;
                right.fmt_indented(f, depth + 1, "1")
            }
        }
    }
}

/// How the two lightest nodes are found on every merge.
///
/// Both strategies build the same tree for the same leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeStrategy {
    /// Linear re-insertion into a sorted sequence.
    #[default]
    SortedInsertion,
    /// Binary heap, for alphabets where the quadratic re-insertion hurts.
    Heap,
}

/// A finished Huffman tree. The root may be a bare leaf when the input held
/// a single distinct byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    /// `None` when no symbol occurred.
    pub fn from_frequencies(frequencies: &FrequencyTable, strategy: MergeStrategy) -> Option<Self> {
        Self::from_ordered(ordered_leaves(frequencies), strategy)
    }

    /// Builds from nodes already sorted ascending by frequency.
    pub fn from_ordered(nodes: Vec<HuffNode>, strategy: MergeStrategy) -> Option<Self> {
        let count = nodes.len();
        let root = match strategy {
            MergeStrategy::SortedInsertion => merge_sorted(nodes.into()),
            MergeStrategy::Heap => merge_heap(nodes),
        }?;
        debug!("built tree over {count} symbols with {:?}, {} merges", strategy, count - 1);
        Some(HuffmanTree { root })
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    /// True when the whole tree is a single leaf.
    pub fn is_degenerate(&self) -> bool {
        self.root.is_leaf()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    /// Walks the tree over `packed`, emitting a symbol each time a leaf is
    /// reached, until `symbols` symbols have been produced.
    ///
    /// A single-leaf tree spends one `0` bit per symbol. Returns `None` if the
    /// bits run out first or a degenerate tree meets a `1` bit.
    pub fn decode(&self, packed: &[u8], symbols: usize) -> Option<Vec<u8>> {
        let mut reader = BitReader::new(packed);
        // `symbols` may come from an untrusted header; each symbol costs at least a bit.
        let mut decoded = Vec::with_capacity(symbols.min(packed.len().saturating_mul(8)));
        if let HuffNode::Leaf { symbol, .. } = &self.root {
            for _ in 0..symbols {
                if reader.read_bit()? {
                    return None;
                }
                decoded.push(*symbol);
            }
            return Some(decoded);
        }
        while decoded.len() < symbols {
            let mut node = &self.root;
            loop {
                match node {
                    HuffNode::Leaf { symbol, .. } => {
                        decoded.push(*symbol);
                        break;
                    }
                    HuffNode::Internal { left, right, .. } => {
                        node = if reader.read_bit()? { right } else { left };
                    }
                }
            }
        }
        Some(decoded)
    }
}

impl Display for HuffmanTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.root.fmt_indented(f, 0, "root")
    }
}

fn merge_sorted(mut nodes: VecDeque<HuffNode>) -> Option<HuffNode> {
    while nodes.len() > 1 {
        let (left, right) = (nodes.pop_front()?, nodes.pop_front()?);
        let merged = HuffNode::merge(left, right);
        trace!("merged into weight {}", merged.frequency());
        let at = nodes
            .iter()
            .position(|node| node.frequency() >= merged.frequency())
            .unwrap_or(nodes.len());
        nodes.insert(at, merged);
    }
    nodes.pop_front()
}

/// Heap entry. Ordered so the max-heap pops the lightest node first and,
/// among equal weights, the node the sorted sequence would hold in front:
/// the newest merge, then older merges, then leaves in their original order.
struct Pending {
    frequency: u64,
    rank: usize,
    node: HuffNode,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        // Backwards on weight so the max-heap behaves as a min-heap
        other
            .frequency
            .cmp(&self.frequency)
            .then(self.rank.cmp(&other.rank))
    }
}

fn merge_heap(nodes: Vec<HuffNode>) -> Option<HuffNode> {
    let count = nodes.len();
    let mut heap: BinaryHeap<Pending> = nodes
        .into_iter()
        .enumerate()
        .map(|(position, node)| Pending {
            frequency: node.frequency(),
            rank: count - position,
            node,
        })
        .collect();

    let mut next_rank = count + 1;
    while heap.len() > 1 {
        let (left, right) = (heap.pop()?, heap.pop()?);
        let node = HuffNode::merge(left.node, right.node);
        trace!("merged into weight {}", node.frequency());
        heap.push(Pending {
            frequency: node.frequency(),
            rank: next_rank,
            node,
        });
        next_rank += 1;
    }
    heap.pop().map(|pending| pending.node)
}
