use std::io::{self, Write};

use bitvec::prelude::*;

/// Flushed bytes are handed to the sink in blocks of this size.
const BLOCK_SIZE: usize = 8 * 1024;

/// Packs bits most-significant first into bytes and streams them to `W`.
pub struct BitWriter<W: Write> {
    inner: W,
    block: Vec<u8>,
    accumulator: u8,
    pending: u8, // Should only be 0-7
    bits_written: u64,
    bytes_written: u64,
}

impl<W: Write> BitWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            block: Vec::with_capacity(BLOCK_SIZE),
            accumulator: 0,
            pending: 0,
            bits_written: 0,
            bytes_written: 0,
        }
    }

    pub fn write_bit(&mut self, bit: bool) -> io::Result<()> {
        if bit {
            self.accumulator |= 1 << (7 - self.pending);
        }
        self.pending += 1;
        self.bits_written += 1;
        if self.pending == 8 {
            self.push_byte()?;
        }
        Ok(())
    }

    pub fn write_bits(&mut self, bits: &BitSlice<u8, Msb0>) -> io::Result<()> {
        for bit in bits.iter().by_vals() {
            self.write_bit(bit)?;
        }
        Ok(())
    }

    pub fn bits_written(&self) -> u64 {
        self.bits_written
    }

    /// Pads a partial byte with zero bits, writes everything out and returns
    /// the sink along with the number of padding bits used.
    pub fn finish(mut self) -> io::Result<(W, u8)> {
        let padding = if self.pending > 0 { 8 - self.pending } else { 0 };
        if self.pending > 0 {
            self.push_byte()?;
        }
        self.drain()?;
        Ok((self.inner, padding))
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn push_byte(&mut self) -> io::Result<()> {
        self.block.push(self.accumulator);
        self.bytes_written += 1;
        self.accumulator = 0;
        self.pending = 0;
        if self.block.len() == BLOCK_SIZE {
            self.drain()?;
        }
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        self.inner.write_all(&self.block)?;
        self.block.clear();
        Ok(())
    }
}

/// Reads bits most-significant first.
pub struct BitReader<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    offset_within_byte: u8, // Should only be 0-7
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            byte_index: 0,
            offset_within_byte: 0,
        }
    }

    pub fn read_bit(&mut self) -> Option<bool> {
        let byte = self.bytes.get(self.byte_index)?;
        let bit = byte & (1 << (7 - self.offset_within_byte)) != 0;
        self.offset_within_byte += 1;
        if self.offset_within_byte == 8 {
            self.offset_within_byte = 0;
            self.byte_index += 1;
        }
        Some(bit)
    }
}
