use std::io::{Cursor, Read, Seek, SeekFrom, Write};

use log::{debug, info, warn};

use crate::code::CodeTable;
use crate::config::{EncoderConfig, OutputFormat};
use crate::container::ContainerHeader;
use crate::encoder::{EncodeSummary, StreamEncoder};
use crate::frequency::FrequencyTable;
use crate::tree::{HuffmanTree, MergeStrategy};
use crate::{Error, Result};

/// Output of the counting pass: frequencies, the tree built from them and
/// the resulting codes. `tree` is `None` for empty input.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub frequencies: FrequencyTable,
    pub tree: Option<HuffmanTree>,
    pub codes: CodeTable,
}

impl Analysis {
    pub fn from_frequencies(frequencies: FrequencyTable, strategy: MergeStrategy) -> Self {
        let tree = HuffmanTree::from_frequencies(&frequencies, strategy);
        let codes = tree.as_ref().map(CodeTable::from_tree).unwrap_or_default();
        match &tree {
            None => warn!("input is empty, nothing to encode"),
            Some(tree) if tree.is_degenerate() => {
                warn!("input holds a single distinct byte, using a one-bit code")
            }
            Some(_) => {}
        }
        debug!("code table:\n{codes}");
        Self {
            frequencies,
            tree,
            codes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Encoded {
    pub analysis: Analysis,
    /// Bytes of container header written ahead of the payload, zero in raw mode.
    pub header_bytes: u64,
    pub summary: EncodeSummary,
}

impl Encoded {
    pub fn codes(&self) -> &CodeTable {
        &self.analysis.codes
    }

    /// Everything written to the sink.
    pub fn output_bytes(&self) -> u64 {
        self.header_bytes + self.summary.bytes
    }
}

/// Counts frequencies and derives the code table; stages up to but not
/// including the encoding pass.
pub fn analyze<R: Read>(reader: &mut R, config: &EncoderConfig) -> Result<Analysis> {
    let frequencies = FrequencyTable::from_reader(reader, config.chunk_size)?;
    Ok(Analysis::from_frequencies(frequencies, config.strategy))
}

/// Runs the whole pipeline over `source`, which is read twice: once to count,
/// then again from the position it started at to encode.
pub fn encode<S: Read + Seek, W: Write>(
    source: &mut S,
    mut sink: W,
    config: &EncoderConfig,
) -> Result<Encoded> {
    let start = source.stream_position()?;
    let analysis = analyze(source, config)?;
    source.seek(SeekFrom::Start(start))?;

    let header_bytes = match config.format {
        OutputFormat::Raw => 0,
        OutputFormat::Container => {
            let header = ContainerHeader::new(&analysis.frequencies, &analysis.codes);
            header.write_to(&mut sink)?;
            header.encoded_len() as u64
        }
    };

    let summary = StreamEncoder::new(&analysis.codes)
        .with_chunk_size(config.chunk_size)
        .encode(source, &mut sink)?;
    sink.flush()?;

    let expected = analysis.frequencies.total();
    if summary.symbols != expected {
        return Err(Error::SourceChanged {
            expected,
            actual: summary.symbols,
        });
    }

    let encoded = Encoded {
        analysis,
        header_bytes,
        summary,
    };
    info!(
        "{} bytes in, {} bytes out ({:.1}%)",
        summary.symbols,
        encoded.output_bytes(),
        ratio(encoded.output_bytes(), summary.symbols)
    );
    Ok(encoded)
}

/// In-memory convenience over [`encode`].
pub fn encode_bytes(bytes: &[u8], config: &EncoderConfig) -> Result<(Vec<u8>, Encoded)> {
    let mut packed = Vec::new();
    let encoded = encode(&mut Cursor::new(bytes), &mut packed, config)?;
    Ok((packed, encoded))
}

fn ratio(output: u64, input: u64) -> f64 {
    if input == 0 {
        0.0
    } else {
        output as f64 * 100.0 / input as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serves different content on the second pass.
    struct Shifting {
        inner: Cursor<Vec<u8>>,
        passes: usize,
    }

    impl Read for Shifting {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for Shifting {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            if let SeekFrom::Start(_) = pos {
                self.passes += 1;
                self.inner.get_mut().pop();
            }
            self.inner.seek(pos)
        }
    }

    #[test]
    fn starts_from_the_current_position() {
        let mut source = Cursor::new(b"skipAABC".to_vec());
        source.seek(SeekFrom::Start(4)).unwrap();
        let mut packed = Vec::new();
        let encoded = encode(&mut source, &mut packed, &EncoderConfig::default()).unwrap();
        assert_eq!(packed, vec![0b1100_0100]);
        assert_eq!(encoded.summary.symbols, 4);
        assert_eq!(encoded.codes().len(), 3);
    }

    #[test]
    fn container_precedes_payload() {
        let config = EncoderConfig::default().with_format(OutputFormat::Container);
        let (packed, encoded) = encode_bytes(b"AABC", &config).unwrap();
        assert_eq!(encoded.header_bytes, 15 + 3 * 9);
        assert_eq!(packed.len() as u64, encoded.output_bytes());
        assert_eq!(packed.last(), Some(&0b1100_0100));

        let header = ContainerHeader::read_from(&mut Cursor::new(&packed)).unwrap();
        assert_eq!(header.original_length, 4);
        assert_eq!(header.padding_bits, encoded.summary.padding_bits);
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let (packed, encoded) = encode_bytes(b"", &EncoderConfig::default()).unwrap();
        assert!(packed.is_empty());
        assert!(encoded.analysis.tree.is_none());
        assert!(encoded.codes().is_empty());
        assert_eq!(encoded.output_bytes(), 0);
    }

    #[test]
    fn detects_a_source_that_changed() {
        let mut source = Shifting {
            inner: Cursor::new(b"abcabc".to_vec()),
            passes: 0,
        };
        let result = encode(&mut source, Vec::new(), &EncoderConfig::default());
        assert_eq!(source.passes, 1);
        assert!(matches!(
            result,
            Err(Error::SourceChanged {
                expected: 6,
                actual: 5
            })
        ));
    }

    /// Fails every read once `budget` bytes have been served.
    struct Failing {
        inner: Cursor<Vec<u8>>,
        budget: usize,
    }

    impl Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.budget == 0 {
                return Err(std::io::ErrorKind::Other.into());
            }
            let limit = self.budget.min(buf.len());
            let n = self.inner.read(&mut buf[..limit])?;
            self.budget -= n;
            Ok(n)
        }
    }

    impl Seek for Failing {
        fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    fn fails_after(budget: usize) -> Result<Encoded> {
        let mut source = Failing {
            inner: Cursor::new(b"abcabc".to_vec()),
            budget,
        };
        encode(&mut source, Vec::new(), &EncoderConfig::default())
    }

    #[test]
    fn read_failure_while_counting_is_fatal() {
        assert!(matches!(fails_after(3), Err(Error::Io(_))));
    }

    #[test]
    fn read_failure_while_encoding_is_fatal() {
        // Six bytes for the counting pass, three for the encoding pass.
        assert!(matches!(fails_after(9), Err(Error::Io(_))));
    }

    #[test]
    fn ratio_handles_empty_input() {
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(1, 4), 25.0);
    }
}
