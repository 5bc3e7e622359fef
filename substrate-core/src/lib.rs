//! Core algorithmic layer of the content-addressed spatial knowledge
//! substrate: deterministic seed projection onto `S³`, the 128-bit
//! Hilbert index, BLAKE3 content addressing, the node data model, the
//! `NodeStore` persistence contract, the deduplication cache, and the
//! reconstructor. No network or file I/O lives in this crate — that is
//! `substrate-store` and `substrate-ingest`'s job.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod error;
pub mod hash;
pub mod hilbert;
pub mod node;
pub mod point;
pub mod projector;
pub mod reconstruct;
pub mod scalar;
pub mod seed;
pub mod simd;
pub mod store;
pub mod unicode_bands;

pub use cache::DedupCache;
pub use error::{Result, SubstrateError};
pub use hash::{hash_composition, hash_constant, ChildHashRun, ContentHash};
pub use node::{
    Composition, CompositionGeometry, Constant, GeometryRule, NodeHandle, NodeId, NodeRef,
    Relation,
};
pub use point::Point4;
pub use projector::{project, project_with_hilbert};
pub use seed::{Seed, SeedType};
pub use store::{ChildRun, NodeStore, ReconstructStep};
