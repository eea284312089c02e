use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Seek, Write};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use huffman::{EncoderConfig, Encoded, MergeStrategy, OutputFormat, DEFAULT_CHUNK_SIZE};
use log::{error, info, warn};

/// Huffman-encode a file.
#[derive(Parser, Debug)]
#[command(name = "huff", version)]
struct Cli {
    /// File to encode, or `-` to read standard input
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// Where to write the packed output [default: <PATH>_compressed.huff, or stdout for `-`]
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Write a header with the frequency table, length and padding before the payload
    #[arg(long)]
    container: bool,

    #[arg(long, value_enum, default_value_t = Strategy::Sorted)]
    strategy: Strategy,

    /// Bytes per read
    #[arg(long, value_name = "BYTES", default_value_t = NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN))]
    chunk_size: NonZeroUsize,

    /// Print the code assigned to each byte
    #[arg(long)]
    print_codes: bool,

    /// Print how often each byte occurs
    #[arg(long)]
    print_frequencies: bool,

    /// Print the tree
    #[arg(long)]
    print_tree: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// Re-insert each merged node into a sorted list
    Sorted,
    /// Use a binary heap
    Heap,
}

impl From<Strategy> for MergeStrategy {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Sorted => MergeStrategy::SortedInsertion,
            Strategy::Heap => MergeStrategy::Heap,
        }
    }
}

impl Cli {
    fn config(&self) -> EncoderConfig {
        let format = if self.container {
            OutputFormat::Container
        } else {
            OutputFormat::Raw
        };
        EncoderConfig::default()
            .with_chunk_size(self.chunk_size.get())
            .with_strategy(self.strategy.into())
            .with_format(format)
    }

    fn reads_stdin(&self) -> bool {
        self.file.as_os_str() == "-"
    }

    /// `None` means standard output.
    fn output_path(&self) -> Option<PathBuf> {
        match (&self.output, self.reads_stdin()) {
            (Some(path), _) if path.as_os_str() == "-" => None,
            (Some(path), _) => Some(path.clone()),
            (None, true) => None,
            (None, false) => Some(default_output_path(&self.file)),
        }
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push("_compressed.huff");
    PathBuf::from(name)
}

/// Output is written here first and renamed over the target once encoding succeeds.
fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// True when both paths exist and resolve to the same file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.reads_stdin() {
        let mut buffered = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut buffered)
            .context("reading standard input")?;
        compress(cli, &mut Cursor::new(buffered))
    } else {
        if let Some(output) = cli.output_path() {
            if same_file(&cli.file, &output) {
                bail!("refusing to overwrite the input {} with its own output", cli.file.display());
            }
        }
        let mut source =
            File::open(&cli.file).with_context(|| format!("cannot open {}", cli.file.display()))?;
        compress(cli, &mut source)
    }
}

fn compress<S: Read + Seek>(cli: &Cli, source: &mut S) -> Result<()> {
    let config = cli.config();
    let encoded = match cli.output_path() {
        None => {
            let stdout = io::stdout().lock();
            huffman::encode(source, BufWriter::new(stdout), &config).context("encoding to stdout")?
        }
        Some(path) => {
            let partial = partial_path(&path);
            let file = File::create(&partial)
                .with_context(|| format!("cannot create {}", partial.display()))?;
            match huffman::encode(source, BufWriter::new(file), &config) {
                Ok(encoded) => {
                    fs::rename(&partial, &path).with_context(|| {
                        format!("cannot move {} to {}", partial.display(), path.display())
                    })?;
                    info!("wrote {}", path.display());
                    encoded
                }
                Err(err) => {
                    if let Err(cleanup) = fs::remove_file(&partial) {
                        warn!("could not remove {}: {cleanup}", partial.display());
                    }
                    return Err(err).with_context(|| format!("encoding {}", cli.file.display()));
                }
            }
        }
    };

    if cli.output_path().is_none() {
        print_diagnostics(cli, &encoded, &mut io::stderr().lock())
    } else {
        print_diagnostics(cli, &encoded, &mut io::stdout().lock())
    }
}

fn print_diagnostics<W: Write>(cli: &Cli, encoded: &Encoded, out: &mut W) -> Result<()> {
    if cli.print_frequencies {
        write!(out, "{}", encoded.analysis.frequencies)?;
    }
    if cli.print_codes {
        write!(out, "{}", encoded.codes())?;
    }
    if cli.print_tree {
        if let Some(tree) = &encoded.analysis.tree {
            write!(out, "{tree}")?;
        }
    }
    out.flush()?;
    Ok(())
}
