//! Argument parsing. Kept separate from `main` so the dispatch logic in
//! `commands` can be unit-tested against a parsed [`Cli`] directly.

use clap::{Parser, Subcommand, ValueEnum};

/// Content-addressed spatial knowledge substrate command-line front end.
#[derive(Debug, Parser)]
#[command(name = "substrate", version, about)]
pub struct Cli {
    /// Postgres connection string. Falls back to `$SUBSTRATE_DATABASE_URL`.
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest a file through one of the universal pipelines.
    Ingest {
        #[command(subcommand)]
        kind: IngestKind,
    },
    /// Bulk-seed a contiguous Unicode codepoint range.
    Seed {
        #[command(subcommand)]
        kind: SeedKind,
    },
    /// Reconstruct a node's original content to stdout.
    Reconstruct {
        /// Root node id.
        id: i64,
        /// Which decoding to apply during reconstruction.
        #[arg(long = "as", value_enum)]
        as_kind: ReconstructAs,
    },
    /// Look up a node id by its 64-character hex content hash.
    Lookup {
        /// Hex-encoded BLAKE3-256 content hash.
        hash: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum IngestKind {
    /// Hierarchical grammar-induced text ingestion.
    Text {
        /// UTF-8 text file to ingest.
        file: std::path::PathBuf,
    },
    /// Raw byte-array ingestion.
    Bytes {
        /// File to ingest verbatim.
        file: std::path::PathBuf,
    },
    /// Bulk SafeTensor-like tensor ingestion.
    Safetensor {
        /// SafeTensor file to ingest.
        file: std::path::PathBuf,
        /// Target sparsity percentile; mutually exclusive with `--sparsity-threshold`.
        #[arg(long)]
        sparsity_pct: Option<f64>,
        /// Explicit magnitude threshold below which values are skipped.
        #[arg(long)]
        sparsity_threshold: Option<f32>,
    },
}

#[derive(Debug, Subcommand)]
pub enum SeedKind {
    /// Seed the Basic Multilingual Plane minus surrogates.
    Unicode {
        /// Seed the full Unicode range instead of just the BMP.
        #[arg(long)]
        full: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReconstructAs {
    Text,
    Bytes,
    Floats,
    Image,
    Audio,
}
