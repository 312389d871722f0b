//! Cube state: the node hierarchy, the piece model and the face groups.
//!
//! The hierarchy is `scene -> holder -> animator -> object -> pieces`.
//! Whole-cube orbits rotate only the `animator`, so they never touch piece
//! transforms or face membership. The `object` carries the size-dependent
//! scale and contains every piece, plus the transient group used while a
//! face is turning.
//!
//! A size change discards every piece and regenerates the model from
//! scratch; sticker colors are not carried over.

use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::config::{CubeConfig, MembershipPolicy};
use crate::error::CubeError;
use crate::geometry::{Axis, Face};
use crate::grid::{generate_positions, CubeSize};
use crate::groups::FaceGroupIndex;
use crate::pieces::{Color, Piece, PieceGeometry, PieceModel, Theme, PIECE_SIZE};
use crate::scene::{NodeId, SceneGraph, Transform};

pub struct Cube {
    size: CubeSize,
    pub(crate) scene: SceneGraph,
    holder: NodeId,
    pub(crate) animator: NodeId,
    /// Per-axis orbit angles of the animator, applied in XYZ order.
    orbit: Vec3,
    pub(crate) object: NodeId,
    pub(crate) model: PieceModel,
    pub(crate) groups: FaceGroupIndex,
    theme: Theme,
    geometry: PieceGeometry,
    pub(crate) membership: MembershipPolicy,
    pub(crate) turn_duration: f32,
    pub(crate) orbit_duration: f32,
    /// Gate held while a timed rotation is in flight.
    pub(crate) rotating: bool,
    /// Bumped on every regeneration so stale animations can tell.
    pub(crate) generation: u64,
}

impl Cube {
    pub fn new(config: &CubeConfig) -> Result<Self, CubeError> {
        let size = CubeSize::new(config.size)?;

        let mut scene = SceneGraph::new();
        let holder = scene.create_child(scene.root(), "holder")?;
        let animator = scene.create_child(holder, "animator")?;
        let object = scene.create_child(animator, "object")?;

        let mut cube = Self {
            size,
            scene,
            holder,
            animator,
            orbit: Vec3::ZERO,
            object,
            model: PieceModel::empty(PieceGeometry::default(), &config.theme),
            groups: FaceGroupIndex::default(),
            theme: config.theme,
            geometry: PieceGeometry::default(),
            membership: config.membership,
            turn_duration: config.turn_duration,
            orbit_duration: config.orbit_duration,
            rotating: false,
            generation: 0,
        };
        cube.init()?;
        Ok(cube)
    }

    /// Regenerates pieces, stickers and face groups for the current size.
    pub fn init(&mut self) -> Result<(), CubeError> {
        self.scene.clear_children(self.object)?;

        let scale = self.size.scale();
        if let Some(transform) = self.scene.transform_mut(self.object) {
            transform.scale = Vec3::splat(scale);
        }

        let positions = generate_positions(self.size);
        self.model = PieceModel::build(
            &mut self.scene,
            self.object,
            &positions,
            self.geometry,
            &self.theme,
        )?;
        self.groups.rebuild(&self.model);
        self.rotating = false;
        self.generation += 1;

        log::info!(
            "generated {n}x{n}x{n} cube: {} pieces, {} stickers, scale {scale}",
            self.model.len(),
            self.model.sticker_count(),
            n = self.size.get(),
        );
        Ok(())
    }

    /// Zeroes the rotation of the holder, animator and piece container and
    /// rebuilds the face groups.
    pub fn reset(&mut self) {
        self.orbit = Vec3::ZERO;
        for node in [self.holder, self.object, self.animator] {
            if let Some(transform) = self.scene.transform_mut(node) {
                transform.rotation = Quat::IDENTITY;
            }
        }
        self.groups.rebuild(&self.model);
    }

    /// Switches to `size`, regenerating if it differs from the current size
    /// or `force` is set. Returns whether the cube was regenerated.
    pub fn resize(&mut self, size: usize, force: bool) -> Result<bool, CubeError> {
        let size = CubeSize::new(size)?;
        if size == self.size && !force {
            return Ok(false);
        }
        self.size = size;
        self.reset();
        self.init()?;
        Ok(true)
    }

    pub fn size(&self) -> usize {
        self.size.get()
    }

    pub fn cube_size(&self) -> CubeSize {
        self.size
    }

    /// Uniform scale of the piece container.
    pub fn scale(&self) -> f32 {
        self.size.scale()
    }

    /// Whether a timed rotation currently holds the gate.
    pub fn is_rotating(&self) -> bool {
        self.rotating
    }

    pub fn membership_policy(&self) -> MembershipPolicy {
        self.membership
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn model(&self) -> &PieceModel {
        &self.model
    }

    pub fn groups(&self) -> &FaceGroupIndex {
        &self.groups
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn holder(&self) -> NodeId {
        self.holder
    }

    pub fn animator(&self) -> NodeId {
        self.animator
    }

    /// The piece container.
    pub fn object(&self) -> NodeId {
        self.object
    }

    pub fn piece(&self, index: usize) -> Result<&Piece, CubeError> {
        self.model.piece(index).ok_or(CubeError::UnknownPiece {
            index,
            count: self.model.len(),
        })
    }

    /// Current angle of the whole-cube orbit on one axis.
    pub fn orbit_angle(&self, axis: Axis) -> f32 {
        self.orbit[axis.index()]
    }

    /// Sets one orbit angle and recomposes the animator's rotation from all
    /// three.
    pub(crate) fn set_orbit_angle(&mut self, axis: Axis, angle: f32) {
        self.orbit[axis.index()] = angle;
        let rotation = Quat::from_euler(EulerRot::XYZ, self.orbit.x, self.orbit.y, self.orbit.z);
        if let Some(transform) = self.scene.transform_mut(self.animator) {
            transform.rotation = rotation;
        }
    }

    /// Farthest a piece centre can be from the container origin, in
    /// container units.
    pub fn bounding_radius(&self) -> f32 {
        let half_extent = (self.size.get() - 1) as f32 / 2.0 * PIECE_SIZE;
        half_extent * 3f32.sqrt()
    }

    /// World matrix of a piece's node.
    pub fn piece_world_matrix(&self, index: usize) -> Result<Mat4, CubeError> {
        let node = self.piece(index)?.node;
        Ok(self.scene.world_matrix(node)?)
    }

    /// Piece transform expressed in the piece container's space, whether or
    /// not the piece is currently inside a turning group.
    pub fn piece_local_transform(&self, index: usize) -> Result<Transform, CubeError> {
        let world = self.piece_world_matrix(index)?;
        let container = self.scene.world_matrix(self.object)?;
        Ok(Transform::from_matrix(&(container.inverse() * world)))
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
        self.model.apply_theme(&theme);
    }

    /// Recolors a single sticker. Returns `false` if the piece has no
    /// sticker on that face.
    pub fn set_sticker_color(&mut self, index: usize, face: Face, color: Color) -> bool {
        self.model.set_sticker_color(index, face, color)
    }

    /// Captures every piece's local transform.
    pub fn snapshot(&self) -> CubeSnapshot {
        let pieces = self
            .model
            .pieces()
            .iter()
            .filter_map(|piece| {
                let transform = self.scene.transform(piece.node)?;
                Some(PieceState {
                    index: piece.index,
                    position: transform.position,
                    rotation: transform.rotation,
                })
            })
            .collect();
        CubeSnapshot {
            size: self.size.get(),
            pieces,
        }
    }

    /// Regenerates for the snapshot's size and restores each listed piece's
    /// local transform. Under `MembershipPolicy::Retag` face membership is
    /// re-derived from the restored positions.
    pub fn load_snapshot(&mut self, snapshot: &CubeSnapshot) -> Result<(), CubeError> {
        let size = CubeSize::new(snapshot.size)?;
        if let Some(state) = snapshot
            .pieces
            .iter()
            .find(|state| state.index >= size.cell_count())
        {
            return Err(CubeError::SnapshotMismatch {
                size: size.get(),
                index: state.index,
                count: size.cell_count(),
            });
        }

        self.size = size;
        self.reset();
        self.init()?;

        for state in &snapshot.pieces {
            let node = self.piece(state.index)?.node;
            if let Some(transform) = self.scene.transform_mut(node) {
                transform.position = state.position;
                transform.rotation = state.rotation;
            }
            if self.membership == MembershipPolicy::Retag {
                self.settle_piece(state.index)?;
            }
        }
        Ok(())
    }
}

/// Local transform of one piece inside a snapshot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PieceState {
    pub index: usize,
    pub position: Vec3,
    pub rotation: Quat,
}

/// In-memory record of a cube's piece arrangement.
#[derive(Clone, Debug, PartialEq)]
pub struct CubeSnapshot {
    pub size: usize,
    pub pieces: Vec<PieceState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_size() {
        assert_eq!(
            Cube::new(&CubeConfig::with_size(1)).err(),
            Some(CubeError::InvalidSize(1))
        );
    }

    #[test]
    fn test_hierarchy_and_scale() {
        for (size, scale) in [(2, 1.25), (3, 1.0), (4, 0.75), (5, 0.6)] {
            let cube = Cube::new(&CubeConfig::with_size(size)).unwrap();
            let scene = cube.scene();
            assert_eq!(scene.parent(cube.holder()), Some(scene.root()));
            assert_eq!(scene.parent(cube.animator()), Some(cube.holder()));
            assert_eq!(scene.parent(cube.object()), Some(cube.animator()));
            assert_eq!(scene.children(cube.object()).len(), size * size * size);
            assert_eq!(scene.transform(cube.object()).unwrap().scale, Vec3::splat(scale));
            assert!(!cube.is_rotating());
        }
    }

    #[test]
    fn test_resize_regenerates() {
        let mut cube = Cube::new(&CubeConfig::default()).unwrap();
        let old_node = cube.piece(0).unwrap().node;
        let generation = cube.generation;

        assert!(!cube.resize(3, false).unwrap(), "same size is a no-op");
        assert_eq!(cube.generation, generation);

        assert!(cube.resize(4, false).unwrap());
        assert_eq!(cube.size(), 4);
        assert_eq!(cube.model().len(), 64);
        assert!(!cube.scene().contains(old_node), "old pieces are discarded");
        assert_eq!(cube.groups().get(Face::F).len(), 16);

        assert!(cube.resize(4, true).unwrap(), "forced regeneration");
        assert_eq!(cube.resize(1, false), Err(CubeError::InvalidSize(1)));
        assert_eq!(cube.size(), 4);
    }

    #[test]
    fn test_resize_drops_recolors() {
        let mut cube = Cube::new(&CubeConfig::default()).unwrap();
        assert!(cube.set_sticker_color(0, Face::L, Color::WHITE));
        cube.resize(3, true).unwrap();
        let sticker = cube.piece(0).unwrap().sticker(Face::L).unwrap().color;
        assert_eq!(sticker, Theme::classic().faces[Face::L.index()]);
    }

    #[test]
    fn test_reset_zeroes_rotations() {
        let mut cube = Cube::new(&CubeConfig::default()).unwrap();
        let animator = cube.animator();
        cube.set_orbit_angle(Axis::X, 0.1);
        cube.set_orbit_angle(Axis::Y, 0.2);
        let holder = cube.holder();
        cube.scene.transform_mut(holder).unwrap().rotation = Quat::from_rotation_z(0.3);
        cube.reset();
        for axis in Axis::ALL {
            assert_eq!(cube.orbit_angle(axis), 0.0);
        }
        assert_eq!(cube.scene().transform(animator).unwrap().rotation, Quat::IDENTITY);
        assert_eq!(cube.scene().transform(holder).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_set_theme_recolors() {
        let mut cube = Cube::new(&CubeConfig::with_size(2)).unwrap();
        cube.set_theme(Theme::pastel());
        assert_eq!(cube.model().piece_color(), Theme::pastel().piece);
        assert_eq!(cube.theme(), &Theme::pastel());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut cube = Cube::new(&CubeConfig::with_size(2)).unwrap();
        let node = cube.piece(3).unwrap().node;
        cube.scene.transform_mut(node).unwrap().rotation = Quat::from_rotation_z(1.0);
        let snapshot = cube.snapshot();
        assert_eq!(snapshot.size, 2);
        assert_eq!(snapshot.pieces.len(), 8);

        let mut other = Cube::new(&CubeConfig {
            membership: MembershipPolicy::Frozen,
            ..CubeConfig::with_size(3)
        })
        .unwrap();
        other.load_snapshot(&snapshot).unwrap();
        assert_eq!(other.size(), 2);
        assert_eq!(other.snapshot(), snapshot);
    }

    #[test]
    fn test_load_snapshot_snaps_to_nearest_orientation() {
        let mut cube = Cube::new(&CubeConfig::with_size(3)).unwrap();
        let home = cube.piece(4).unwrap().start.position;
        let snapshot = CubeSnapshot {
            size: 3,
            pieces: vec![
                PieceState {
                    index: 4,
                    position: home,
                    rotation: Quat::from_rotation_z(0.7),
                },
                PieceState {
                    index: 5,
                    position: cube.piece(5).unwrap().start.position,
                    rotation: Quat::from_rotation_z(1.0),
                },
            ],
        };
        cube.load_snapshot(&snapshot).unwrap();

        let rotation_of = |cube: &Cube, index: usize| {
            let node = cube.piece(index).unwrap().node;
            glam::Mat3::from_quat(cube.scene().transform(node).unwrap().rotation)
        };
        let nearest_zero = rotation_of(&cube, 4);
        assert!(
            nearest_zero.abs_diff_eq(glam::Mat3::IDENTITY, 1e-6),
            "40 degrees rounds down: {nearest_zero:?}"
        );
        let nearest_quarter = rotation_of(&cube, 5);
        assert!(
            nearest_quarter.abs_diff_eq(glam::Mat3::from_rotation_z(std::f32::consts::FRAC_PI_2), 1e-6),
            "57 degrees rounds up: {nearest_quarter:?}"
        );
    }

    #[test]
    fn test_snapshot_rejects_foreign_pieces() {
        let mut cube = Cube::new(&CubeConfig::default()).unwrap();
        let snapshot = CubeSnapshot {
            size: 2,
            pieces: vec![PieceState {
                index: 8,
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            }],
        };
        assert_eq!(
            cube.load_snapshot(&snapshot),
            Err(CubeError::SnapshotMismatch {
                size: 2,
                index: 8,
                count: 8
            })
        );
        assert_eq!(cube.size(), 3, "a rejected snapshot leaves the cube alone");
    }

    #[test]
    fn test_piece_positions_inside_bounding_radius() {
        let cube = Cube::new(&CubeConfig::with_size(5)).unwrap();
        let radius = cube.bounding_radius();
        let max = (0..cube.model().len())
            .map(|index| cube.piece_local_transform(index).unwrap().position.length())
            .fold(0.0f32, f32::max);
        assert!((max - radius).abs() < 1e-5, "max {max} vs radius {radius}");
    }
}
