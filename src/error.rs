//! Error types for cube construction and scene-graph manipulation.
//!
//! Rotation and drag requests are not represented here: a request that
//! arrives while a rotation is in flight is dropped, not reported.

use thiserror::Error;

use crate::scene::NodeId;

/// Errors raised by the scene-graph abstraction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The node id does not refer to a live node.
    #[error("scene node {0} does not exist")]
    MissingNode(NodeId),

    /// Attaching would make a node its own ancestor.
    #[error("cannot attach node {child} beneath its descendant {parent}")]
    Cycle { parent: NodeId, child: NodeId },
}

/// Errors raised when building or restoring a cube.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CubeError {
    /// Cube sizes below 2 have no layers to turn.
    #[error("cube size must be at least 2, got {0}")]
    InvalidSize(usize),

    /// A piece index outside the current model.
    #[error("piece {index} does not exist in a cube of {count} pieces")]
    UnknownPiece { index: usize, count: usize },

    /// A snapshot whose piece list does not match its declared size.
    #[error("snapshot for size {size} lists piece {index}, but that size has {count} pieces")]
    SnapshotMismatch {
        size: usize,
        index: usize,
        count: usize,
    },

    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// Error returned when a color or theme entry cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("invalid hex color '{0}'")]
    InvalidHex(String),

    #[error("unknown theme key '{0}', expected one of P, L, R, D, U, B, F")]
    UnknownKey(String),

    #[error("theme entry '{0}' is not of the form KEY=HEX")]
    MalformedEntry(String),
}
