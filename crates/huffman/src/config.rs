use crate::frequency::DEFAULT_CHUNK_SIZE;
use crate::tree::MergeStrategy;

/// What goes into the sink besides the packed bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Packed bits only.
    #[default]
    Raw,
    /// A [`ContainerHeader`](crate::container::ContainerHeader) followed by the packed bits.
    Container,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Bytes requested per read, on both passes.
    pub chunk_size: usize,
    pub strategy: MergeStrategy,
    pub format: OutputFormat,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            strategy: MergeStrategy::default(),
            format: OutputFormat::default(),
        }
    }
}

impl EncoderConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}
