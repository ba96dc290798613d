//! Error types for fallible table construction.

use thiserror::Error;

/// Errors observable from the table constructors.
///
/// Lookup misses and duplicate inserts are value-level results (`Option` and
/// `bool` returns) rather than errors; see the per-table operation docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// The target CPU cannot execute a 128-bit byte-equality vector compare.
    ///
    /// [`DenseMap`](crate::DenseMap) scans 16 metadata bytes per probe with a
    /// single vector comparison and has no scalar execution mode. On targets
    /// without SSE2 or NEON every `DenseMap` constructor returns this error;
    /// [`QuadMap`](crate::QuadMap) and [`RobinMap`](crate::RobinMap) are
    /// unaffected.
    #[error("dense table requires a 128-bit byte-equality vector compare (SSE2 or NEON)")]
    UnsupportedPlatform,
}
