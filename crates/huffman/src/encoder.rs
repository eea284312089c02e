use std::io::{ErrorKind, Read, Write};

use bitvec::prelude::*;
use log::debug;

use crate::bits::BitWriter;
use crate::code::CodeTable;
use crate::frequency::DEFAULT_CHUNK_SIZE;
use crate::{Error, Result};

/// What a finished encoding pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodeSummary {
    /// Input bytes consumed.
    pub symbols: u64,
    /// Payload bits, not counting padding.
    pub bits: u64,
    /// Payload bytes written to the sink.
    pub bytes: u64,
    /// Zero bits appended to fill the last byte.
    pub padding_bits: u8,
}

/// Streams bytes through a [`CodeTable`] into packed output.
pub struct StreamEncoder<'a> {
    codes: &'a CodeTable,
    chunk_size: usize,
}

impl<'a> StreamEncoder<'a> {
    pub fn new(codes: &'a CodeTable) -> Self {
        Self {
            codes,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Encodes all of `source` into `sink`. The final byte is zero-padded;
    /// how many bits of it are padding comes back in the summary.
    pub fn encode<R: Read, W: Write>(&self, source: &mut R, sink: W) -> Result<EncodeSummary> {
        let lookup: [Option<&BitSlice<u8, Msb0>>; 256] =
            std::array::from_fn(|symbol| self.codes.get(symbol as u8).map(|code| code.as_bitslice()));

        let mut writer = BitWriter::new(sink);
        let mut chunk = vec![0u8; self.chunk_size];
        let mut symbols = 0u64;
        loop {
            let read = match source.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            for &byte in &chunk[..read] {
                let code = lookup[byte as usize].ok_or_else(|| Error::UnknownSymbol(byte))?;
                writer.write_bits(code)?;
            }
            symbols += read as u64;
        }

        let bits = writer.bits_written();
        let bytes = writer.bytes_written() + u64::from(bits % 8 != 0);
        let (_, padding_bits) = writer.finish()?;
        debug!("encoded {symbols} symbols into {bits} bits ({padding_bits} padding bits)");
        Ok(EncodeSummary {
            symbols,
            bits,
            bytes,
            padding_bits,
        })
    }
}
