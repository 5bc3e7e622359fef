//! Coarse-grained progress reporting for the bulk ingestor (spec
//! §4.7). Callers supply a closure; it is invoked at batch boundaries,
//! never per-row — the bulk path's whole point is to avoid per-row
//! overhead.

/// Which phase of a bulk run a [`ProgressUpdate`] was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Scanning input to determine total row count (and, for
    /// SafeTensor, to sample magnitudes for a sparsity threshold).
    Scanning,
    /// Projecting and hashing rows in the CPU-bound worker pool.
    Projecting,
    /// Streaming a batch to the store via binary `COPY`.
    Storing,
}

/// A progress snapshot handed to the caller's callback.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate {
    pub phase: Phase,
    pub processed: u64,
    pub total: u64,
    pub stored: u64,
    /// Percentage of values skipped by the sparsity threshold, if one
    /// is in effect (`0.0` otherwise).
    pub sparsity_pct: f64,
}

/// A progress callback. Boxed so a bulk run can be configured with a
/// closure that captures its own state (a channel sender, a logger,
/// a UI handle) without the ingestor needing to know which.
pub type ProgressCallback<'a> = Box<dyn FnMut(ProgressUpdate) + Send + 'a>;
