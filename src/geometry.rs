//! Face and axis tables for an N×N×N cube.
//!
//! Faces are always enumerated in the order `[L, R, D, U, B, F]`, which is
//! also the order of the tag indices produced by the position generator
//! (`x == 0`, `x == N-1`, `y == 0`, `y == N-1`, `z == 0`, `z == N-1`).
//!
//! Ordering note: every per-face table in this module is indexed by
//! `Face::index`, so reordering `Face::ALL` breaks all of them at once.

use std::f32::consts::FRAC_PI_2;
use std::fmt;

use glam::{EulerRot, Quat, Vec3};

/// One of the three principal axes of the cube.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index of this axis in a `Vec3`.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// The six outer faces, in tag-index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    L,
    R,
    D,
    U,
    B,
    F,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::L, Face::R, Face::D, Face::U, Face::B, Face::F];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn from_index(index: usize) -> Option<Face> {
        match index {
            0 => Some(Face::L),
            1 => Some(Face::R),
            2 => Some(Face::D),
            3 => Some(Face::U),
            4 => Some(Face::B),
            5 => Some(Face::F),
            _ => None,
        }
    }

    pub const fn label(self) -> char {
        match self {
            Face::L => 'L',
            Face::R => 'R',
            Face::D => 'D',
            Face::U => 'U',
            Face::B => 'B',
            Face::F => 'F',
        }
    }

    pub fn from_label(label: char) -> Option<Face> {
        Face::ALL
            .into_iter()
            .find(|face| face.label() == label.to_ascii_uppercase())
    }

    /// Axis the face is perpendicular to.
    pub const fn axis(self) -> Axis {
        match self {
            Face::L | Face::R => Axis::X,
            Face::D | Face::U => Axis::Y,
            Face::B | Face::F => Axis::Z,
        }
    }

    /// `+1.0` for the face on the positive side of its axis, `-1.0` otherwise.
    pub const fn sign(self) -> f32 {
        match self {
            Face::R | Face::U | Face::F => 1.0,
            Face::L | Face::D | Face::B => -1.0,
        }
    }

    /// Outward unit normal.
    pub fn normal(self) -> Vec3 {
        self.axis().unit() * self.sign()
    }

    /// Face on the given side of an axis.
    pub const fn on_axis(axis: Axis, positive: bool) -> Face {
        match (axis, positive) {
            (Axis::X, false) => Face::L,
            (Axis::X, true) => Face::R,
            (Axis::Y, false) => Face::D,
            (Axis::Y, true) => Face::U,
            (Axis::Z, false) => Face::B,
            (Axis::Z, true) => Face::F,
        }
    }

    /// Rotation laying a sticker flush against this face: quarter turns
    /// about X, then about Y (XYZ order).
    pub fn sticker_rotation(self) -> Quat {
        const ABOUT_X: [f32; 6] = [0.0, 0.0, 1.0, -1.0, 0.0, 0.0];
        const ABOUT_Y: [f32; 6] = [-1.0, 1.0, 0.0, 0.0, 2.0, 0.0];
        let i = self.index();
        Quat::from_euler(EulerRot::XYZ, FRAC_PI_2 * ABOUT_X[i], FRAC_PI_2 * ABOUT_Y[i], 0.0)
    }

    /// Axis and signed angle of a clockwise quarter turn of this face.
    ///
    /// B, D and L turn with the opposite sign of F, U and R so that
    /// "clockwise" is judged looking at the face from outside.
    pub fn turn(self, direction: i32) -> (Axis, f32) {
        let direction = direction.signum() as f32;
        (self.axis(), -FRAC_PI_2 * self.sign() * direction)
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A set of faces stored as a 6-bit mask, iterated in tag-index order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceSet(u8);

impl FaceSet {
    pub const EMPTY: FaceSet = FaceSet(0);

    /// Tags of a grid cell: a coordinate of `0` or `size - 1` on an axis
    /// puts the cell on that axis's negative or positive face.
    pub fn of_cell(cell: (usize, usize, usize), size: usize) -> FaceSet {
        let last = size - 1;
        let mut set = FaceSet::EMPTY;
        for (axis, coord) in Axis::ALL.into_iter().zip([cell.0, cell.1, cell.2]) {
            if coord == 0 {
                set.insert(Face::on_axis(axis, false));
            }
            if coord == last {
                set.insert(Face::on_axis(axis, true));
            }
        }
        set
    }

    #[inline]
    pub fn insert(&mut self, face: Face) {
        self.0 |= 1 << face.index();
    }

    #[inline]
    pub fn remove(&mut self, face: Face) {
        self.0 &= !(1 << face.index());
    }

    #[inline]
    pub fn contains(self, face: Face) -> bool {
        self.0 & (1 << face.index()) != 0
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Face> {
        Face::ALL.into_iter().filter(move |face| self.contains(*face))
    }
}

impl FromIterator<Face> for FaceSet {
    fn from_iter<I: IntoIterator<Item = Face>>(iter: I) -> Self {
        let mut set = FaceSet::EMPTY;
        for face in iter {
            set.insert(face);
        }
        set
    }
}

impl fmt::Display for FaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for face in self.iter() {
            write!(f, "{}", face.label())?;
        }
        Ok(())
    }
}
