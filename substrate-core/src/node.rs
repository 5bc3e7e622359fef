//! The three stored entities: [`Constant`], [`Composition`], and
//! [`Relation`] (§3). These are plain record types; there is no ORM
//! layer. Row <-> struct mapping lives in `substrate-store`.

use crate::hash::ContentHash;
use crate::point::Point4;
use crate::seed::{Seed, SeedType};

/// Durable 64-bit row identity, shared by constants and compositions
/// (the store is free to keep them in one id space or two; callers only
/// ever see an opaque `NodeId` plus a [`NodeRef`] tag).
pub type NodeId = i64;

/// Tags which table a [`NodeId`] resolves against. A bare `NodeId` is
/// ambiguous between a constant and a composition; every place the
/// substrate threads an id through a relation carries this tag
/// alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Constant(NodeId),
    Composition(NodeId),
}

impl NodeRef {
    #[must_use]
    pub fn id(&self) -> NodeId {
        match *self {
            Self::Constant(id) | Self::Composition(id) => id,
        }
    }
}

/// An irreducible leaf node, addressed by `(seed_type, seed_value)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant {
    pub id: NodeId,
    pub seed: Seed,
    pub content_hash: ContentHash,
    pub hilbert_high: u64,
    pub hilbert_low: u64,
    pub position: Point4,
}

/// Which rule built a composition's aggregate position, per the
/// resolution of Open Question 2 in `spec.md` §9 (recorded in
/// DESIGN.md): centroid for point-like sequences, a `LINESTRING`
/// through the children's positions for trajectory-like ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GeometryRule {
    Centroid = 0,
    Trajectory = 1,
}

/// The geometry a composition was built with: a single aggregate point
/// for [`GeometryRule::Centroid`], or the full ordered vertex sequence
/// for [`GeometryRule::Trajectory`] (the Hilbert index is always derived
/// from the trajectory's centroid, since locality indexing needs one
/// point regardless of the storage shape).
#[derive(Debug, Clone, PartialEq)]
pub enum CompositionGeometry {
    Point(Point4),
    Trajectory(Vec<Point4>),
}

impl CompositionGeometry {
    #[must_use]
    pub fn rule(&self) -> GeometryRule {
        match self {
            Self::Point(_) => GeometryRule::Centroid,
            Self::Trajectory(_) => GeometryRule::Trajectory,
        }
    }

    /// The single point the Hilbert index is computed from.
    #[must_use]
    pub fn indexing_point(&self) -> Point4 {
        match self {
            Self::Point(p) => *p,
            Self::Trajectory(points) => Point4::centroid(points),
        }
    }
}

/// An ordered sequence of children, addressed by the content hash of
/// that sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub id: NodeId,
    pub content_hash: ContentHash,
    pub hilbert_high: u64,
    pub hilbert_low: u64,
    pub geometry: CompositionGeometry,
    /// A composition acting as a "type atom" describing this
    /// composition's shape (e.g. image `(W, H)`). `None` for bootstrap
    /// types.
    pub type_ref: Option<NodeId>,
}

/// One edge `(composition_id, position_index, child, multiplicity)`.
/// `position_index` is zero-based and strictly reflects source order;
/// `multiplicity` encodes a run of identical adjacent children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation {
    pub composition_id: NodeId,
    pub position_index: u32,
    pub child: NodeRef,
    pub multiplicity: u32,
}

/// A handle returned by every insert/lookup operation: enough to chain
/// into a parent composition (id + content hash) and, when available,
/// enough to compute that parent's geometry (position).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeHandle {
    pub node: NodeRef,
    pub content_hash: ContentHash,
    pub position: Point4,
}

impl NodeHandle {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.node.id()
    }
}

/// Recovers a constant's `seed_type` tag from a raw row value,
/// returning an invariant error for out-of-range tags — this can only
/// happen if the store itself is corrupt.
pub fn seed_type_from_row(tag: i32) -> Option<SeedType> {
    u8::try_from(tag).ok().and_then(SeedType::from_u8)
}
