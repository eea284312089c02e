//! # huffman
//!
//! Builds a Huffman code for the byte values of an input stream and packs the
//! stream with it.
//!
//! The pipeline is linear: count byte frequencies, order the symbols by
//! frequency (ties broken by byte value), merge them into a tree, read codes
//! off the tree and stream the input through those codes into a bit writer.
//!
//! ```rust
//! use huffman::{encode_bytes, EncoderConfig};
//!
//! let (packed, encoded) = encode_bytes(b"AABC", &EncoderConfig::default())?;
//! assert_eq!(packed, vec![0b1100_0100]);
//! assert_eq!(encoded.summary.padding_bits, 2);
//! print!("{}", encoded.codes());
//! # Ok::<(), huffman::Error>(())
//! ```
//!
//! The packed output carries no header unless [`OutputFormat::Container`] is
//! selected; keep the [`CodeTable`] (or the tree) to make sense of it.

pub mod bits;
pub mod code;
pub mod config;
pub mod container;
pub mod encoder;
pub mod frequency;
pub mod pipeline;
pub mod tree;

mod error;
mod ordering;

pub use code::{Code, CodeTable};
pub use config::{EncoderConfig, OutputFormat};
pub use container::ContainerHeader;
pub use encoder::{EncodeSummary, StreamEncoder};
pub use error::{Error, Result};
pub use frequency::{FrequencyTable, Symbol, DEFAULT_CHUNK_SIZE};
pub use ordering::ordered_leaves;
pub use pipeline::{analyze, encode, encode_bytes, Analysis, Encoded};
pub use tree::{HuffNode, HuffmanTree, MergeStrategy};
