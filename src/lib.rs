//! Rubik's Cube Library
//!
//! Models an N×N×N cube as a scene graph of pieces and stickers, and turns
//! whole-cube orbits, face turns and pointer drags into animated transform
//! changes. Rendering is left to the host: it advances a [`Session`] once
//! per frame and reads world transforms back out of the scene graph.

pub mod animation;
pub mod config;
pub mod cube;
pub mod drag;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod groups;
pub mod picking;
pub mod pieces;
pub mod rotation;
pub mod scene;
pub mod session;

pub use config::{CubeConfig, MembershipPolicy};
pub use cube::{Cube, CubeSnapshot, PieceState};
pub use error::{ColorParseError, CubeError, SceneError};
pub use geometry::{Axis, Face, FaceSet};
pub use pieces::{Color, ColorKey, Theme};
pub use rotation::{RotationIntent, RotationKind};
pub use session::{NoopHooks, Session, SessionHooks};
