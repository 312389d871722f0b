//! Piece model: one piece per grid cell, each owning its body and stickers.
//!
//! The model is built once per size. Recoloring only touches colors: the
//! body color is a single value shared by every piece, sticker colors are
//! stored per sticker. Node ids never change after the build.

use std::fmt;
use std::str::FromStr;

use glam::Vec3;

use crate::error::{ColorParseError, SceneError};
use crate::geometry::{Face, FaceSet};
use crate::grid::{GridCoord, PiecePosition};
use crate::scene::{BodyShape, NodeId, SceneGraph, StickerShape, Transform, Visual};

/// Edge length of a piece in container units.
pub const PIECE_SIZE: f32 = 1.0 / 3.0;

/// A 24-bit RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);

    /// Components scaled to `0.0..=1.0`.
    pub fn rgb(self) -> [f32; 3] {
        let channel = |shift: u32| ((self.0 >> shift) & 0xff) as f32 / 255.0;
        [channel(16), channel(8), channel(0)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `rrggbb`, `#rrggbb` or `0xrrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);
        if digits.len() != 6 {
            return Err(ColorParseError::InvalidHex(s.to_string()));
        }
        u32::from_str_radix(digits, 16)
            .map(Color)
            .map_err(|_| ColorParseError::InvalidHex(s.to_string()))
    }
}

/// Key of a theme entry: the piece body or one face.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorKey {
    Piece,
    Face(Face),
}

impl FromStr for ColorKey {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some('P' | 'p'), None) => Ok(ColorKey::Piece),
            (Some(label), None) => Face::from_label(label)
                .map(ColorKey::Face)
                .ok_or_else(|| ColorParseError::UnknownKey(s.to_string())),
            _ => Err(ColorParseError::UnknownKey(s.to_string())),
        }
    }
}

/// Color map with one entry for the body (`P`) and one per face.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    pub piece: Color,
    /// Indexed by `Face::index`.
    pub faces: [Color; 6],
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Black body with the usual red/orange/white/yellow/blue/green faces.
    pub const fn classic() -> Self {
        Self {
            piece: Color(0x000000),
            faces: [
                Color(0xff0000), // L
                Color(0xff9900), // R
                Color(0xffffff), // D
                Color(0xffff00), // U
                Color(0x0000ff), // B
                Color(0x00ff00), // F
            ],
        }
    }

    /// Pastel faces on a white body.
    pub const fn pastel() -> Self {
        Self {
            piece: Color(0xf4f4f4),
            faces: [
                Color(0xf7a8a8),
                Color(0xf9cf9a),
                Color(0xdcdcdc),
                Color(0xfdf3a0),
                Color(0xa8c5f7),
                Color(0xb3e6b0),
            ],
        }
    }

    pub fn get(&self, key: ColorKey) -> Color {
        match key {
            ColorKey::Piece => self.piece,
            ColorKey::Face(face) => self.faces[face.index()],
        }
    }

    pub fn set(&mut self, key: ColorKey, color: Color) {
        match key {
            ColorKey::Piece => self.piece = color,
            ColorKey::Face(face) => self.faces[face.index()] = color,
        }
    }

    /// Applies a `KEY=HEX` override such as `F=#00ff00`.
    pub fn apply_entry(&mut self, entry: &str) -> Result<(), ColorParseError> {
        let (key, color) = entry
            .split_once('=')
            .ok_or_else(|| ColorParseError::MalformedEntry(entry.to_string()))?;
        self.set(key.trim().parse()?, color.trim().parse()?);
        Ok(())
    }
}

/// Shape parameters shared by every piece of a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceGeometry {
    pub piece_corner_radius: f32,
    pub edge_corner_roundness: f32,
    /// Sticker size relative to the piece, leaving a visible border.
    pub edge_scale: f32,
    pub edge_depth: f32,
}

impl Default for PieceGeometry {
    fn default() -> Self {
        Self {
            piece_corner_radius: 0.12,
            edge_corner_roundness: 0.15,
            edge_scale: 0.82,
            edge_depth: 0.01,
        }
    }
}

impl PieceGeometry {
    pub fn body(&self) -> BodyShape {
        BodyShape {
            size: PIECE_SIZE,
            corner_radius: self.piece_corner_radius,
            segments: 3,
        }
    }

    pub fn sticker(&self) -> StickerShape {
        StickerShape {
            size: PIECE_SIZE,
            corner_roundness: self.edge_corner_roundness,
            depth: self.edge_depth,
        }
    }

    /// Local transform of the sticker for `face`: pushed out along the face
    /// normal by half a piece, turned to lie flush, shrunk by `edge_scale`.
    pub fn sticker_transform(&self, face: Face) -> Transform {
        Transform {
            position: face.normal() * (PIECE_SIZE / 2.0),
            rotation: face.sticker_rotation(),
            scale: Vec3::splat(self.edge_scale),
        }
    }
}

/// A colored plate on one side of a piece.
#[derive(Clone, Debug, PartialEq)]
pub struct Sticker {
    /// Face the sticker was generated on; also its theme key.
    pub face: Face,
    pub node: NodeId,
    pub color: Color,
}

/// One small cube of the puzzle.
#[derive(Clone, Debug)]
pub struct Piece {
    /// Stable identity: the index of the generating cell.
    pub index: usize,
    /// Cell the piece was generated in.
    pub home: GridCoord,
    /// Cell the piece currently occupies.
    pub cell: GridCoord,
    /// Faces the piece's stickers were generated on. Never changes.
    pub faces: FaceSet,
    /// Faces the piece currently belongs to for face turns.
    pub membership: FaceSet,
    pub node: NodeId,
    pub body: NodeId,
    pub stickers: Vec<Sticker>,
    /// Local transform captured at generation time.
    pub start: Transform,
}

impl Piece {
    pub fn sticker(&self, face: Face) -> Option<&Sticker> {
        self.stickers.iter().find(|sticker| sticker.face == face)
    }
}

/// Every piece of one cube size plus the shared body color.
#[derive(Clone, Debug)]
pub struct PieceModel {
    pieces: Vec<Piece>,
    piece_color: Color,
    geometry: PieceGeometry,
}

impl PieceModel {
    /// Builds one piece node per position under `container`.
    ///
    /// Each piece sits at `position / 3`, owns a body node and one sticker
    /// node per face tag. Shapes come from `geometry` and are copied into
    /// each node, so no two pieces share visual state.
    pub fn build(
        scene: &mut SceneGraph,
        container: NodeId,
        positions: &[PiecePosition],
        geometry: PieceGeometry,
        theme: &Theme,
    ) -> Result<Self, SceneError> {
        let mut pieces = Vec::with_capacity(positions.len());

        for (index, position) in positions.iter().enumerate() {
            let node = scene.create_child(container, format!("piece-{index}"))?;
            let start = Transform::from_position(position.position / 3.0);
            scene.set_transform(node, start)?;

            let body = scene.create_child(node, "body")?;
            scene.set_visual(body, Visual::Body(geometry.body()))?;

            let mut stickers = Vec::with_capacity(position.faces.len());
            for face in position.faces.iter() {
                let sticker = scene.create_child(node, face.label().to_string())?;
                scene.set_transform(sticker, geometry.sticker_transform(face))?;
                scene.set_visual(
                    sticker,
                    Visual::Sticker {
                        face,
                        shape: geometry.sticker(),
                    },
                )?;
                stickers.push(Sticker {
                    face,
                    node: sticker,
                    color: theme.get(ColorKey::Face(face)),
                });
            }

            pieces.push(Piece {
                index,
                home: position.coord,
                cell: position.coord,
                faces: position.faces,
                membership: position.faces,
                node,
                body,
                stickers,
                start,
            });
        }

        Ok(Self {
            pieces,
            piece_color: theme.piece,
            geometry,
        })
    }

    /// A model with no pieces, before the first build.
    pub fn empty(geometry: PieceGeometry, theme: &Theme) -> Self {
        Self {
            pieces: Vec::new(),
            piece_color: theme.piece,
            geometry,
        }
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn piece(&self, index: usize) -> Option<&Piece> {
        self.pieces.get(index)
    }

    pub(crate) fn piece_mut(&mut self, index: usize) -> Option<&mut Piece> {
        self.pieces.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn piece_color(&self) -> Color {
        self.piece_color
    }

    pub fn geometry(&self) -> &PieceGeometry {
        &self.geometry
    }

    /// Recolors the shared body color and every sticker by its face.
    pub fn apply_theme(&mut self, theme: &Theme) {
        self.piece_color = theme.piece;
        for sticker in self.pieces.iter_mut().flat_map(|piece| &mut piece.stickers) {
            sticker.color = theme.get(ColorKey::Face(sticker.face));
        }
    }

    /// Recolors one sticker. Returns `false` if the piece has no sticker there.
    pub fn set_sticker_color(&mut self, index: usize, face: Face, color: Color) -> bool {
        let Some(sticker) = self
            .pieces
            .get_mut(index)
            .and_then(|piece| piece.stickers.iter_mut().find(|s| s.face == face))
        else {
            return false;
        };
        sticker.color = color;
        true
    }

    /// Number of sticker nodes across all pieces.
    pub fn sticker_count(&self) -> usize {
        self.pieces.iter().map(|piece| piece.stickers.len()).sum()
    }
}
