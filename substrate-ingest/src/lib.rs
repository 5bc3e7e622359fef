//! Everything that turns raw input into addressed nodes: the universal
//! per-modality [`pipelines`], the grammar-inducing [`decomposer`], and
//! the high-throughput [`bulk`] ingestor. None of these know how nodes
//! are persisted — they only depend on
//! [`substrate_core::store::NodeStore`].

#![warn(missing_docs)]

pub mod bulk;
pub mod decomposer;
pub mod io;
pub mod pipelines;

pub use decomposer::decompose;
pub use io::mmap_file;
