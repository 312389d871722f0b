//! Piece positions for an N×N×N cube.
//!
//! Every cell of the grid becomes a piece, interior cells included: they
//! carry no face tags and stay hidden behind their neighbours. Cells are
//! emitted in x-major order (`idx = x * N * N + y * N + z`), and the index in
//! that sequence is the piece's identity for as long as the size is kept.

use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::error::CubeError;
use crate::geometry::FaceSet;

/// Integer cell coordinate, each component in `0..size`.
pub type GridCoord = (usize, usize, usize);

/// A validated cube size (`N >= 2`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CubeSize(usize);

impl CubeSize {
    pub const MIN: usize = 2;

    pub fn new(size: usize) -> Result<Self, CubeError> {
        if size < Self::MIN {
            return Err(CubeError::InvalidSize(size));
        }
        Ok(Self(size))
    }

    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Total number of cells (and pieces).
    #[inline]
    pub const fn cell_count(self) -> usize {
        self.0 * self.0 * self.0
    }

    /// Offset that centres the grid on the origin.
    ///
    /// Odd sizes put a cell on the origin, even sizes straddle it.
    pub fn first(self) -> f32 {
        if self.0 % 2 != 0 {
            -((self.0 / 2) as f32)
        } else {
            0.5 - self.0 as f32 / 2.0
        }
    }

    /// Uniform scale of the piece container so every size fills a similar volume.
    pub fn scale(self) -> f32 {
        match self.0 {
            2 => 1.25,
            3 => 1.0,
            n => 3.0 / n as f32,
        }
    }
}

impl TryFrom<usize> for CubeSize {
    type Error = CubeError;

    fn try_from(size: usize) -> Result<Self, Self::Error> {
        CubeSize::new(size)
    }
}

/// One generated cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PiecePosition {
    pub coord: GridCoord,
    /// Centred coordinate `(first + x, first + y, first + z)`.
    pub position: Vec3,
    pub faces: FaceSet,
}

/// Converts a cell coordinate to its x-major index.
#[inline(always)]
pub const fn coord_to_idx(size: usize, (x, y, z): GridCoord) -> usize {
    x * size * size + y * size + z
}

/// Converts an x-major index back to a cell coordinate.
#[inline(always)]
pub const fn idx_to_coord(size: usize, cell_index: usize) -> GridCoord {
    (
        cell_index / (size * size),
        (cell_index / size) % size,
        cell_index % size,
    )
}

/// Generates every cell of the grid with its centred position and face tags.
pub fn generate_positions(size: CubeSize) -> Vec<PiecePosition> {
    let n = size.get();
    let first = size.first();
    let mut positions = Vec::with_capacity(size.cell_count());

    for x in 0..n {
        for y in 0..n {
            for z in 0..n {
                positions.push(PiecePosition {
                    coord: (x, y, z),
                    position: Vec3::new(first + x as f32, first + y as f32, first + z as f32),
                    faces: FaceSet::of_cell((x, y, z), n),
                });
            }
        }
    }

    positions
}

/// Finds the cell whose centred position is nearest to `position`.
///
/// `position` is in grid units (the same space as `PiecePosition::position`);
/// components outside the grid are clamped to the boundary cells.
pub fn nearest_cell(size: CubeSize, position: Vec3) -> GridCoord {
    let first = size.first();
    let last = (size.get() - 1) as f32;
    let cell = |value: f32| (value - first).round().clamp(0.0, last) as usize;
    (cell(position.x), cell(position.y), cell(position.z))
}

/// Formats the grid as text, one z-slice per column block.
///
/// Each cell shows how many faces it sits on (`.` for interior cells),
/// rows run from the top (`y = N-1`) down. Cells are looked up by their
/// coordinate, so a list for another size or with gaps prints `?` for the
/// cells it lacks and ignores the ones outside the grid.
pub fn format_positions(positions: &[PiecePosition], size: CubeSize) -> String {
    let n = size.get();
    let faces_at: FxHashMap<GridCoord, FaceSet> =
        positions.iter().map(|p| (p.coord, p.faces)).collect();
    // wide enough for the "z=N" header of a slice
    let width = n.max(3);
    let mut output = String::new();

    let headers: Vec<String> = (0..n).map(|z| format!("z={z}")).collect();
    push_row(&mut output, &headers, width);

    for y in (0..n).rev() {
        let slices: Vec<String> = (0..n)
            .map(|z| {
                (0..n)
                    .map(|x| match faces_at.get(&(x, y, z)) {
                        None => '?',
                        Some(faces) if faces.is_empty() => '.',
                        Some(faces) => char::from(b'0' + faces.len() as u8),
                    })
                    .collect()
            })
            .collect();
        push_row(&mut output, &slices, width);
    }

    output
}

/// Appends blocks separated by one space, padding all but the last to `width`.
fn push_row(output: &mut String, blocks: &[String], width: usize) {
    for (i, block) in blocks.iter().enumerate() {
        if i + 1 < blocks.len() {
            output.push_str(&format!("{block:<width$} "));
        } else {
            output.push_str(block);
        }
    }
    output.push('\n');
}
