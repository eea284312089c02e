use std::fmt::{Debug, Display, Formatter};
use std::io::{ErrorKind, Read};

use log::debug;

use crate::Result;

/// One byte value of the input. Bytes are never grouped into characters.
pub type Symbol = u8;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Occurrence count per byte value.
///
/// Backed by a dense array, so [`FrequencyTable::iter`] always walks symbols in
/// ascending order. That order is what makes equal-frequency ties deterministic
/// further down the pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self { counts: [0; 256] }
    }
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut table = Self::new();
        table.add_bytes(bytes);
        table
    }

    /// Reads `reader` to exhaustion, `chunk_size` bytes at a time.
    pub fn from_reader<R: Read>(reader: &mut R, chunk_size: usize) -> Result<Self> {
        let mut table = Self::new();
        let mut chunk = vec![0u8; chunk_size.max(1)];
        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            table.add_bytes(&chunk[..read]);
        }
        debug!(
            "counted {} bytes, {} distinct symbols, max frequency {}",
            table.total(),
            table.distinct_symbols(),
            table.max_frequency()
        );
        Ok(table)
    }

    pub fn add_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.counts[byte as usize] += 1;
        }
    }

    /// Overwrites the count for `symbol`.
    pub fn set(&mut self, symbol: Symbol, count: u64) {
        self.counts[symbol as usize] = count;
    }

    pub fn get(&self, symbol: Symbol) -> u64 {
        self.counts[symbol as usize]
    }

    pub fn distinct_symbols(&self) -> usize {
        self.counts.iter().filter(|&&count| count > 0).count()
    }

    pub fn max_frequency(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Sum of all counts, i.e. the length of the counted input.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&count| count == 0)
    }

    /// Present symbols only, ascending by symbol value.
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as Symbol, count))
    }
}

impl Debug for FrequencyTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Display for FrequencyTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (symbol, count) in self.iter() {
            writeln!(f, "{} - {count}", DisplaySymbol(symbol))?;
        }
        Ok(())
    }
}

/// Quoted, escaped rendering of a byte for the diagnostic listings.
pub(crate) struct DisplaySymbol(pub Symbol);

impl Display for DisplaySymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}'", self.0.escape_ascii())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use std::io::Cursor;

    /// Hands out at most `limit` bytes per read and fails with `Interrupted` every other call.
    struct Stuttering<'a> {
        bytes: &'a [u8],
        limit: usize,
        interrupt: bool,
    }

    impl Read for Stuttering<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = self.limit.min(buf.len()).min(self.bytes.len());
            buf[..n].copy_from_slice(&self.bytes[..n]);
            self.bytes = &self.bytes[n..];
            Ok(n)
        }
    }

    #[test]
    fn counts_each_byte() {
        let table = FrequencyTable::from_bytes(b"abracadabra");
        assert_eq!(table.get(b'a'), 5);
        assert_eq!(table.get(b'b'), 2);
        assert_eq!(table.get(b'r'), 2);
        assert_eq!(table.get(b'c'), 1);
        assert_eq!(table.get(b'd'), 1);
        assert_eq!(table.get(b'z'), 0);
        assert_eq!(table.distinct_symbols(), 5);
        assert_eq!(table.max_frequency(), 5);
        assert_eq!(table.total(), 11);
    }

    #[test]
    fn empty_stream_gives_empty_table() {
        let table = FrequencyTable::from_reader(&mut Cursor::new(Vec::new()), 16).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
        assert_eq!(table.max_frequency(), 0);
    }

    #[test]
    fn iterates_in_symbol_order() {
        let table = FrequencyTable::from_bytes(&[200, 3, 200, 77, 0]);
        let symbols: Vec<Symbol> = table.iter().map(|(symbol, _)| symbol).collect();
        assert_eq!(symbols, vec![0, 3, 77, 200]);
    }

    #[test]
    fn short_reads_count_only_what_was_read() {
        let bytes = b"the final chunk is shorter than the buffer";
        let mut reader = Stuttering { bytes, limit: 5, interrupt: false };
        let table = FrequencyTable::from_reader(&mut reader, 4096).unwrap();
        assert_eq!(table, FrequencyTable::from_bytes(bytes));
    }

    #[test]
    fn read_failures_are_fatal() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(ErrorKind::Other.into())
            }
        }
        let result = FrequencyTable::from_reader(&mut Failing, 16);
        assert!(matches!(result, Err(crate::Error::Io(err)) if err.kind() == ErrorKind::Other));
    }

    #[test]
    fn lists_symbols_with_counts() {
        let listing = FrequencyTable::from_bytes(b"a\naa").to_string();
        assert_eq!(listing, "'\\n' - 1\n'a' - 3\n");
    }

    #[quickcheck]
    fn chunk_size_does_not_matter(bytes: Vec<u8>, chunk_size: u8) -> bool {
        let table = FrequencyTable::from_reader(&mut Cursor::new(&bytes), chunk_size as usize).unwrap();
        table == FrequencyTable::from_bytes(&bytes) && table.total() == bytes.len() as u64
    }
}
