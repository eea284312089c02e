use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use bitvec::prelude::*;
use log::debug;

use crate::frequency::{DisplaySymbol, FrequencyTable, Symbol};
use crate::tree::{HuffNode, HuffmanTree};

/// The path from the root to a leaf: `0` for left, `1` for right.
pub type Code = BitVec<u8, Msb0>;

/// Symbol to code, for exactly the symbols present in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeTable {
    codes: BTreeMap<Symbol, Code>,
}

impl CodeTable {
    /// Depth-first walk of `tree`. A tree that is a single leaf gives its
    /// symbol the one-bit code `0`, so every occurrence still costs a bit.
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes = BTreeMap::new();
        match tree.root() {
            HuffNode::Leaf { symbol, .. } => {
                codes.insert(*symbol, bitvec![u8, Msb0; 0]);
            }
            root => assign(root, &mut Code::new(), &mut codes),
        }
        let table = CodeTable { codes };
        debug!(
            "assigned {} codes, longest {} bits",
            table.len(),
            table.max_code_length()
        );
        table
    }

    pub fn get(&self, symbol: Symbol) -> Option<&Code> {
        self.codes.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &Code)> + '_ {
        self.codes.iter().map(|(&symbol, code)| (symbol, code))
    }

    pub fn max_code_length(&self) -> usize {
        self.codes.values().map(|code| code.len()).max().unwrap_or(0)
    }

    /// Sum of 2^-length over every code. Exactly 1.0 for a full tree.
    pub fn kraft_sum(&self) -> f64 {
        self.codes
            .values()
            .map(|code| 0.5f64.powi(code.len() as i32))
            .sum()
    }

    /// Payload size in bits for input with these frequencies.
    pub fn encoded_bit_count(&self, frequencies: &FrequencyTable) -> u64 {
        frequencies
            .iter()
            .map(|(symbol, count)| {
                count * self.get(symbol).map(|code| code.len() as u64).unwrap_or(0)
            })
            .sum()
    }

    pub fn is_prefix_free(&self) -> bool {
        let codes: Vec<&Code> = self.codes.values().collect();
        codes.iter().enumerate().all(|(i, a)| {
            codes
                .iter()
                .skip(i + 1)
                .all(|b| !is_prefix(a, b) && !is_prefix(b, a))
        })
    }
}

fn is_prefix(prefix: &BitSlice<u8, Msb0>, of: &BitSlice<u8, Msb0>) -> bool {
    prefix.len() <= of.len() && of[..prefix.len()] == prefix[..]
}

fn assign(node: &HuffNode, path: &mut Code, codes: &mut BTreeMap<Symbol, Code>) {
    match node {
        HuffNode::Leaf { symbol, .. } => {
            codes.insert(*symbol, path.clone());
        }
        HuffNode::Internal { left, right, .. } => {
            path.push(false);
            assign(left, path, codes);
            path.pop();
            path.push(true);
            assign(right, path, codes);
            path.pop();
        }
    }
}

/// `'a' - 0110`, one line per symbol.
impl Display for CodeTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (symbol, code) in self.iter() {
            write!(f, "{} - ", DisplaySymbol(symbol))?;
            for bit in code.iter().by_vals() {
                f.write_str(if bit { "1" } else { "0" })?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::MergeStrategy;
    use bitvec::bitvec;
    use quickcheck_macros::quickcheck;

    fn table_for(bytes: &[u8]) -> CodeTable {
        HuffmanTree::from_frequencies(&FrequencyTable::from_bytes(bytes), MergeStrategy::default())
            .map(|tree| CodeTable::from_tree(&tree))
            .unwrap_or_default()
    }

    #[test]
    fn worked_example_codes() {
        let table = table_for(b"AABC");
        assert_eq!(table.get(b'A').unwrap(), &bitvec![u8, Msb0; 1]);
        assert_eq!(table.get(b'B').unwrap(), &bitvec![u8, Msb0; 0, 0]);
        assert_eq!(table.get(b'C').unwrap(), &bitvec![u8, Msb0; 0, 1]);
        assert_eq!(table.to_string(), "'A' - 1\n'B' - 00\n'C' - 01\n");
    }

    #[test]
    fn single_symbol_gets_one_bit() {
        let table = table_for(&[7; 10]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(7).unwrap(), &bitvec![u8, Msb0; 0]);
        assert_eq!(table.encoded_bit_count(&FrequencyTable::from_bytes(&[7; 10])), 10);
    }

    #[test]
    fn empty_input_has_no_codes() {
        let table = table_for(b"");
        assert!(table.is_empty());
        assert_eq!(table.max_code_length(), 0);
        assert_eq!(table.to_string(), "");
    }

    #[test]
    fn skewed_frequencies_give_a_long_chain() {
        // Fibonacci weights build the deepest possible tree.
        let mut bytes = Vec::new();
        let (mut a, mut b) = (1usize, 1usize);
        for symbol in 0..12u8 {
            bytes.extend(std::iter::repeat(symbol).take(a));
            (a, b) = (b, a + b);
        }
        let table = table_for(&bytes);
        assert_eq!(table.max_code_length(), 11);
        assert!(table.is_prefix_free());
        assert_eq!(table.kraft_sum(), 1.0);
    }

    #[quickcheck]
    fn codes_are_prefix_free(bytes: Vec<u8>) -> bool {
        table_for(&bytes).is_prefix_free()
    }

    #[quickcheck]
    fn kraft_sum_is_one(bytes: Vec<u8>) -> bool {
        let table = table_for(&bytes);
        match table.len() {
            0 => table.kraft_sum() == 0.0,
            1 => table.kraft_sum() == 0.5,
            _ => (table.kraft_sum() - 1.0).abs() < 1e-12,
        }
    }

    #[quickcheck]
    fn heavier_symbols_never_get_longer_codes(bytes: Vec<u8>) -> bool {
        let frequencies = FrequencyTable::from_bytes(&bytes);
        let table = table_for(&bytes);
        let ordered = frequencies.iter().all(|(a, freq_a)| {
            frequencies.iter().all(|(b, freq_b)| {
                freq_a <= freq_b || table.get(a).unwrap().len() <= table.get(b).unwrap().len()
            })
        });
        ordered
    }
}
