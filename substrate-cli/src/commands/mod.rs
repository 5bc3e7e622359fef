//! One module per top-level subcommand. Each returns
//! `substrate_core::Result` so `main` can map the error kind onto the
//! exit codes from spec §6/§7 in one place.

pub mod ingest;
pub mod lookup;
pub mod reconstruct;
pub mod seed;
