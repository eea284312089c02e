//! Optional framing written ahead of the packed payload.
//!
//! The raw payload cannot be decoded on its own: nothing records the code
//! table or how many bits of the last byte are padding. The container header
//! stores both, so codes can be rebuilt deterministically from the stored
//! frequencies.
//!
//! ```text
//! magic            4 bytes   "HUF1"
//! original_length  u64 LE    input bytes
//! padding_bits     u8        0-7
//! symbol_count     u16 LE    0-256
//! entries          symbol u8, frequency u64 LE; ascending by symbol
//! payload          packed bits
//! ```

use std::io::{Read, Write};

use crate::code::CodeTable;
use crate::frequency::FrequencyTable;
use crate::{Error, Result};

pub const MAGIC: [u8; 4] = *b"HUF1";

const ENTRY_LEN: usize = 9;
const FIXED_LEN: usize = 4 + 8 + 1 + 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub original_length: u64,
    pub padding_bits: u8,
    pub frequencies: FrequencyTable,
}

impl ContainerHeader {
    pub fn new(frequencies: &FrequencyTable, codes: &CodeTable) -> Self {
        let bits = codes.encoded_bit_count(frequencies);
        Self {
            original_length: frequencies.total(),
            padding_bits: ((8 - bits % 8) % 8) as u8,
            frequencies: frequencies.clone(),
        }
    }

    /// Size of the serialized header in bytes.
    pub fn encoded_len(&self) -> usize {
        FIXED_LEN + ENTRY_LEN * self.frequencies.distinct_symbols()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut bytes = Vec::with_capacity(self.encoded_len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&self.original_length.to_le_bytes());
        bytes.push(self.padding_bits);
        bytes.extend_from_slice(&(self.frequencies.distinct_symbols() as u16).to_le_bytes());
        for (symbol, count) in self.frequencies.iter() {
            bytes.push(symbol);
            bytes.extend_from_slice(&count.to_le_bytes());
        }
        writer.write_all(&bytes)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(Error::InvalidHeader(format!("bad magic {magic:02x?}")));
        }

        let original_length = u64::from_le_bytes(read_array(reader)?);
        let [padding_bits] = read_array::<_, 1>(reader)?;
        if padding_bits > 7 {
            return Err(Error::InvalidHeader(format!("{padding_bits} padding bits")));
        }
        let symbol_count = u16::from_le_bytes(read_array(reader)?);
        if symbol_count > 256 {
            return Err(Error::InvalidHeader(format!("{symbol_count} symbols")));
        }

        let mut frequencies = FrequencyTable::new();
        let mut previous: Option<u8> = None;
        for _ in 0..symbol_count {
            let [symbol] = read_array::<_, 1>(reader)?;
            let count = u64::from_le_bytes(read_array(reader)?);
            if previous.is_some_and(|previous| symbol <= previous) {
                return Err(Error::InvalidHeader(format!("symbol {symbol} out of order")));
            }
            if count == 0 {
                return Err(Error::InvalidHeader(format!("symbol {symbol} has zero frequency")));
            }
            frequencies.set(symbol, count);
            previous = Some(symbol);
        }

        if frequencies.total() != original_length {
            return Err(Error::InvalidHeader(format!(
                "frequencies sum to {}, expected {original_length}",
                frequencies.total()
            )));
        }

        Ok(Self {
            original_length,
            padding_bits,
            frequencies,
        })
    }
}

fn read_array<R: Read, const N: usize>(reader: &mut R) -> Result<[u8; N]> {
    let mut bytes = [0u8; N];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}
