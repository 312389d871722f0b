//! Rotation engine: whole-cube orbits and face turns.
//!
//! Both kinds of rotation are described by one `RotationIntent` and share a
//! single gate on the cube. While the gate is held, any further timed
//! rotation request is dropped on the floor: it is not queued and it is not
//! an error. Zero-duration orbits (live drag follow) bypass the gate.
//!
//! A face turn moves the face's pieces into a fresh group node, spins the
//! group, then moves the pieces back to their original parent. Each move is
//! a detach/attach pair that preserves world transforms, so nothing jumps on
//! screen when the group appears or disappears.

use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;

use glam::{Mat3, Quat, Vec3};

use crate::animation::{ease_out_quad, progress, Animation, Progress, Scheduler};
use crate::config::MembershipPolicy;
use crate::cube::Cube;
use crate::error::{CubeError, SceneError};
use crate::geometry::{Axis, Face, FaceSet};
use crate::grid::nearest_cell;
use crate::scene::NodeId;

/// Callback fired once a timed rotation has fully completed.
pub type OnComplete = Box<dyn FnOnce(&mut Cube)>;

/// What a rotation turns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationKind {
    /// The whole cube, through the animator node.
    Orbit,
    /// One face group, through a transient group node.
    Face(Face),
}

/// A request to rotate by `angle` radians about `axis` over `duration` ms.
pub struct RotationIntent {
    pub kind: RotationKind,
    pub axis: Axis,
    pub angle: f32,
    pub duration: f32,
    pub on_complete: Option<OnComplete>,
}

impl fmt::Debug for RotationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationIntent")
            .field("kind", &self.kind)
            .field("axis", &self.axis)
            .field("angle", &self.angle)
            .field("duration", &self.duration)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl RotationIntent {
    pub fn orbit(axis: Axis, angle: f32, duration: f32) -> Self {
        Self {
            kind: RotationKind::Orbit,
            axis,
            angle,
            duration,
            on_complete: None,
        }
    }

    /// A quarter turn of `face`; `direction` is `1` for clockwise seen from
    /// outside the face and `-1` for counter-clockwise.
    pub fn face(face: Face, direction: i32, duration: f32) -> Self {
        let (axis, angle) = face.turn(direction);
        Self {
            kind: RotationKind::Face(face),
            axis,
            angle,
            duration,
            on_complete: None,
        }
    }

    pub fn then(mut self, on_complete: impl FnOnce(&mut Cube) + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }
}

/// Rounds an angle to the nearest quarter turn, away from zero on ties.
pub fn round_to_quarter_turn(angle: f32) -> f32 {
    angle.signum() * (angle.abs() / FRAC_PI_2).round() * FRAC_PI_2
}

/// Piece moved into a turning group, with the parent it came from.
#[derive(Clone, Copy, Debug)]
struct Moved {
    piece: usize,
    node: NodeId,
    parent: NodeId,
}

#[derive(Debug)]
enum Finish {
    Orbit,
    Face {
        face: Face,
        group: NodeId,
        moved: Vec<Moved>,
    },
}

/// An in-flight timed rotation about one axis, of either the orbit or a
/// turning group.
struct Tween {
    axis: Axis,
    start: f32,
    delta: f32,
    duration: f32,
    elapsed: f32,
    generation: u64,
    finish: Finish,
    on_complete: Option<OnComplete>,
}

impl Animation<Cube> for Tween {
    fn update(&mut self, cube: &mut Cube, delta: f32) -> Progress {
        if cube.generation != self.generation {
            log::trace!("dropping rotation about {} from a discarded cube", self.axis);
            return Progress::Done;
        }

        self.elapsed += delta;
        let t = progress(self.elapsed, self.duration);
        // the last frame lands on the exact target rather than the eased value
        let angle = if t < 1.0 {
            self.start + self.delta * ease_out_quad(t)
        } else {
            self.start + self.delta
        };

        if let Err(err) = self.apply(cube, angle) {
            log::error!("rotation about {} abandoned: {err}", self.axis);
            cube.rotating = false;
            return Progress::Done;
        }
        if t < 1.0 {
            return Progress::Running;
        }

        if let Finish::Face { face, group, moved } = &self.finish {
            if let Err(err) = cube.finish_face_turn(*group, moved) {
                log::error!("failed to restore pieces after turning {face}: {err}");
            }
            log::debug!("turn of {face} complete");
        } else {
            log::debug!("orbit about {} complete", self.axis);
        }

        cube.rotating = false;
        if let Some(on_complete) = self.on_complete.take() {
            on_complete(cube);
        }
        Progress::Done
    }
}

impl Tween {
    /// Sets the rotated angle. Orbits go through the cube's per-axis orbit
    /// angles; a turning group gets the quaternion for `angle` directly.
    fn apply(&self, cube: &mut Cube, angle: f32) -> Result<(), SceneError> {
        match &self.finish {
            Finish::Orbit => {
                cube.set_orbit_angle(self.axis, angle);
                Ok(())
            }
            Finish::Face { group, .. } => {
                let transform = cube
                    .scene
                    .transform_mut(*group)
                    .ok_or(SceneError::MissingNode(*group))?;
                transform.rotation = Quat::from_axis_angle(self.axis.unit(), angle);
                Ok(())
            }
        }
    }
}

impl Cube {
    /// Starts a rotation. Returns `false` if it was dropped because another
    /// timed rotation holds the gate.
    pub fn start_rotation(&mut self, scheduler: &mut Scheduler<Cube>, intent: RotationIntent) -> bool {
        match intent.kind {
            RotationKind::Orbit => self.start_orbit(scheduler, intent),
            RotationKind::Face(face) => self.start_face_turn(scheduler, face, intent),
        }
    }

    /// Rotates the whole cube by `delta` radians about `axis`.
    ///
    /// With `duration == 0` the rotation is applied at once and the gate is
    /// neither checked nor taken.
    pub fn animate_rotation(
        &mut self,
        scheduler: &mut Scheduler<Cube>,
        axis: Axis,
        delta: f32,
        duration: f32,
    ) -> bool {
        self.start_rotation(scheduler, RotationIntent::orbit(axis, delta, duration))
    }

    /// Turns one face a quarter turn in `direction` (`1` or `-1`).
    pub fn rotate_face(&mut self, scheduler: &mut Scheduler<Cube>, face: Face, direction: i32) -> bool {
        if direction == 0 {
            log::trace!("ignoring turn of {face} with no direction");
            return false;
        }
        let intent = RotationIntent::face(face, direction, self.turn_duration);
        self.start_rotation(scheduler, intent)
    }

    /// Quarter turn of the whole cube to the left.
    pub fn rotate_left(&mut self, scheduler: &mut Scheduler<Cube>) -> bool {
        self.animate_rotation(scheduler, Axis::Y, FRAC_PI_2, self.orbit_duration)
    }

    /// Quarter turn of the whole cube to the right.
    pub fn rotate_right(&mut self, scheduler: &mut Scheduler<Cube>) -> bool {
        self.animate_rotation(scheduler, Axis::Y, -FRAC_PI_2, self.orbit_duration)
    }

    /// Half turn of the whole cube, flipping it upside down.
    pub fn rotate_up(&mut self, scheduler: &mut Scheduler<Cube>) -> bool {
        self.animate_rotation(scheduler, Axis::X, PI, self.orbit_duration)
    }

    fn start_orbit(&mut self, scheduler: &mut Scheduler<Cube>, intent: RotationIntent) -> bool {
        if intent.duration <= 0.0 {
            let angle = self.orbit_angle(intent.axis);
            self.set_orbit_angle(intent.axis, angle + intent.angle);
            if let Some(on_complete) = intent.on_complete {
                on_complete(self);
            }
            return true;
        }

        if self.rotating {
            log::trace!("orbit about {} dropped: rotation in progress", intent.axis);
            return false;
        }

        self.rotating = true;
        log::debug!(
            "orbit about {} by {:.3} rad over {} ms",
            intent.axis,
            intent.angle,
            intent.duration
        );
        scheduler.register(Tween {
            axis: intent.axis,
            start: self.orbit_angle(intent.axis),
            delta: intent.angle,
            duration: intent.duration,
            elapsed: 0.0,
            generation: self.generation,
            finish: Finish::Orbit,
            on_complete: intent.on_complete,
        });
        true
    }

    fn start_face_turn(
        &mut self,
        scheduler: &mut Scheduler<Cube>,
        face: Face,
        intent: RotationIntent,
    ) -> bool {
        if self.rotating {
            log::trace!("turn of {face} dropped: rotation in progress");
            return false;
        }

        let (group, moved) = match self.begin_face_turn(face) {
            Ok(turn) => turn,
            Err(err) => {
                log::error!("failed to start turning {face}: {err}");
                return false;
            }
        };

        self.rotating = true;
        log::debug!(
            "turning {face}: {} pieces by {:.3} rad about {}",
            moved.len(),
            intent.angle,
            intent.axis
        );
        scheduler.register(Tween {
            axis: intent.axis,
            start: 0.0,
            delta: intent.angle,
            duration: intent.duration,
            elapsed: 0.0,
            generation: self.generation,
            finish: Finish::Face { face, group, moved },
            on_complete: intent.on_complete,
        });
        true
    }

    /// Creates the turning group beside the pieces and moves the face's
    /// pieces into it without changing their world transforms.
    fn begin_face_turn(&mut self, face: Face) -> Result<(NodeId, Vec<Moved>), SceneError> {
        let members = self.groups.ensure(face, &self.model).to_vec();
        let group = self.scene.create_child(self.object, format!("turn-{face}"))?;

        let mut moved = Vec::with_capacity(members.len());
        for piece in members {
            let Some(node) = self.model.piece(piece).map(|p| p.node) else {
                continue;
            };
            let parent = self.scene.parent(node).unwrap_or(self.object);
            self.scene.detach(node)?;
            self.scene.attach(group, node)?;
            moved.push(Moved {
                piece,
                node,
                parent,
            });
        }
        Ok((group, moved))
    }

    /// Moves turned pieces back to their original parents, preserving world
    /// transforms, and discards the turning group.
    fn finish_face_turn(&mut self, group: NodeId, moved: &[Moved]) -> Result<(), CubeError> {
        for entry in moved {
            self.scene.detach(entry.node)?;
            self.scene.attach(entry.parent, entry.node)?;
        }
        self.scene.remove(group)?;

        if self.membership == MembershipPolicy::Retag {
            for entry in moved {
                self.settle_piece(entry.piece)?;
            }
        }
        Ok(())
    }

    /// Snaps a piece to the cell nearest its position and to the nearest
    /// axis-aligned orientation, then regroups it by that cell.
    pub(crate) fn settle_piece(&mut self, index: usize) -> Result<(), CubeError> {
        let size = self.cube_size();
        let node = self.piece(index)?.node;
        let Some(transform) = self.scene.transform_mut(node) else {
            return Err(SceneError::MissingNode(node).into());
        };

        let cell = nearest_cell(size, transform.position * 3.0);
        let first = size.first();
        transform.position = Vec3::new(
            first + cell.0 as f32,
            first + cell.1 as f32,
            first + cell.2 as f32,
        ) / 3.0;
        transform.rotation = snap_rotation(transform.rotation);

        let new = FaceSet::of_cell(cell, size.get());
        let Some(piece) = self.model.piece_mut(index) else {
            return Ok(());
        };
        let old = piece.membership;
        piece.cell = cell;
        piece.membership = new;
        self.groups.retag(index, old, new);
        Ok(())
    }
}

/// Snaps a rotation to the nearest of the 24 rotations that map axes onto
/// axes.
///
/// The two largest matrix entries in distinct rows and columns fix two
/// columns of the result; the third is their cross product, so the result
/// is always a proper rotation.
fn snap_rotation(rotation: Quat) -> Quat {
    let matrix = Mat3::from_quat(rotation);
    let mut columns = [Vec3::ZERO; 3];
    let mut free_columns = [true; 3];
    let mut free_rows = [true; 3];

    for _ in 0..2 {
        let mut best: Option<(f32, usize, usize)> = None;
        for col in (0..3).filter(|&c| free_columns[c]) {
            for row in (0..3).filter(|&r| free_rows[r]) {
                let magnitude = matrix.col(col)[row].abs();
                if best.map_or(true, |(largest, _, _)| magnitude > largest) {
                    best = Some((magnitude, col, row));
                }
            }
        }
        if let Some((_, col, row)) = best {
            columns[col][row] = matrix.col(col)[row].signum();
            free_columns[col] = false;
            free_rows[row] = false;
        }
    }

    let [x, y, z] = columns;
    let snapped = if free_columns[0] {
        Mat3::from_cols(y.cross(z), y, z)
    } else if free_columns[1] {
        Mat3::from_cols(x, z.cross(x), z)
    } else {
        Mat3::from_cols(x, y, x.cross(y))
    };
    Quat::from_mat3(&snapped).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CubeConfig;
    use glam::{EulerRot, Mat4};
    use std::cell::Cell;
    use std::rc::Rc;

    const EPSILON: f32 = 1e-4;

    fn cube(size: usize, membership: MembershipPolicy) -> Cube {
        Cube::new(&CubeConfig {
            membership,
            ..CubeConfig::with_size(size)
        })
        .unwrap()
    }

    /// Advances the scheduler in 16 ms frames until it has no work left.
    fn run(scheduler: &mut Scheduler<Cube>, cube: &mut Cube) -> usize {
        let mut frames = 0;
        while scheduler.is_running() {
            scheduler.update(cube, 16.0);
            frames += 1;
            assert!(frames < 1000, "animation never finished");
        }
        frames
    }

    #[test]
    fn test_quarter_turn_rounding() {
        let degrees = |d: f32| d.to_radians();
        assert!((round_to_quarter_turn(degrees(100.0)) - degrees(90.0)).abs() < 1e-6);
        assert!((round_to_quarter_turn(degrees(140.0)) - degrees(180.0)).abs() < 1e-6);
        assert!((round_to_quarter_turn(degrees(-50.0)) - degrees(-90.0)).abs() < 1e-6);
        assert_eq!(round_to_quarter_turn(0.0), 0.0);
    }

    #[test]
    fn test_zero_duration_orbit_is_immediate_and_ungated() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        assert!(cube.animate_rotation(&mut scheduler, Axis::Y, 0.25, 0.0));
        assert_eq!(cube.orbit_angle(Axis::Y), 0.25);
        assert!(!cube.is_rotating());
        assert!(!scheduler.is_running());

        // still applied while a timed rotation holds the gate
        assert!(cube.rotate_face(&mut scheduler, Face::F, 1));
        assert!(cube.animate_rotation(&mut scheduler, Axis::Y, 0.25, 0.0));
        assert_eq!(cube.orbit_angle(Axis::Y), 0.5);
    }

    #[test]
    fn test_orbit_snaps_to_exact_target() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        cube.animate_rotation(&mut scheduler, Axis::X, 0.1, 0.0);

        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let intent = RotationIntent::orbit(Axis::X, 1.234, 300.0).then(move |cube| {
            assert!(!cube.is_rotating(), "gate is released before the callback");
            flag.set(true);
        });
        assert!(cube.start_rotation(&mut scheduler, intent));
        assert!(cube.is_rotating());

        scheduler.update(&mut cube, 150.0);
        let midway = cube.orbit_angle(Axis::X);
        assert!((midway - (0.1 + 1.234 * 0.75)).abs() < 1e-6, "eased angle {midway}");
        assert!(!fired.get());

        run(&mut scheduler, &mut cube);
        assert_eq!(cube.orbit_angle(Axis::X), 0.1 + 1.234);
        assert!(!cube.is_rotating());
        assert!(fired.get());
    }

    #[test]
    fn test_rotation_while_gated_is_dropped() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        assert!(cube.rotate_left(&mut scheduler));

        // dropped silently, not queued
        assert!(!cube.rotate_right(&mut scheduler));
        assert!(!cube.rotate_face(&mut scheduler, Face::U, 1));
        assert_eq!(scheduler.len(), 1);
        assert_eq!(cube.scene().children(cube.object()).len(), 27, "no turning group created");

        run(&mut scheduler, &mut cube);
        assert_eq!(cube.orbit_angle(Axis::Y), FRAC_PI_2);
        assert!(cube.rotate_right(&mut scheduler));
        run(&mut scheduler, &mut cube);
        assert_eq!(cube.orbit_angle(Axis::Y), 0.0);
    }

    #[test]
    fn test_orbit_leaves_pieces_alone() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        let before: Vec<_> = cube.model().pieces().iter().map(|p| p.start).collect();
        let groups = cube.groups().clone();

        cube.rotate_up(&mut scheduler);
        run(&mut scheduler, &mut cube);

        for (piece, start) in cube.model().pieces().iter().zip(before) {
            assert_eq!(*cube.scene().transform(piece.node).unwrap(), start);
        }
        assert_eq!(cube.groups(), &groups);
    }

    #[test]
    fn test_face_turn_moves_only_face_pieces() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        let members = cube.groups().get(Face::R).to_vec();

        assert!(cube.rotate_face(&mut scheduler, Face::R, 1));
        let object = cube.object();
        let group = *cube.scene().children(object).last().unwrap();
        assert_eq!(cube.scene().name(group), Some("turn-R"));

        let mut in_group: Vec<usize> = cube
            .model()
            .pieces()
            .iter()
            .filter(|piece| cube.scene().parent(piece.node) == Some(group))
            .map(|piece| piece.index)
            .collect();
        in_group.sort_unstable();
        assert_eq!(in_group, members);

        run(&mut scheduler, &mut cube);
        assert!(!cube.scene().contains(group), "turning group is discarded");
        for piece in cube.model().pieces() {
            assert_eq!(cube.scene().parent(piece.node), Some(object));
        }
    }

    #[test]
    fn test_face_turn_preserves_world_transform() {
        for face in Face::ALL {
            for direction in [1, -1] {
                let mut cube = cube(3, MembershipPolicy::Frozen);
                let mut scheduler = Scheduler::new();
                // a tilted cube makes the check independent of the orbit
                cube.animate_rotation(&mut scheduler, Axis::X, 0.4, 0.0);
                cube.animate_rotation(&mut scheduler, Axis::Y, -0.7, 0.0);

                let members = cube.groups().get(face).to_vec();
                let before: Vec<Mat4> = (0..cube.model().len())
                    .map(|i| cube.piece_world_matrix(i).unwrap())
                    .collect();
                let container = cube.scene().world_matrix(cube.object()).unwrap();
                let (axis, angle) = face.turn(direction);
                let turn = container
                    * Mat4::from_axis_angle(axis.unit(), angle)
                    * container.inverse();

                assert!(cube.rotate_face(&mut scheduler, face, direction));
                run(&mut scheduler, &mut cube);

                for (index, before) in before.into_iter().enumerate() {
                    let expected = if members.contains(&index) {
                        turn * before
                    } else {
                        before
                    };
                    let actual = cube.piece_world_matrix(index).unwrap();
                    assert!(
                        actual.abs_diff_eq(expected, EPSILON),
                        "piece {index} after {face}{direction}: {actual:?} != {expected:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_front_turn_end_to_end() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        let count = cube.groups().get(Face::F).len();

        let done = Rc::new(Cell::new(false));
        let flag = done.clone();
        let intent = RotationIntent::face(Face::F, 1, 500.0).then(move |_| flag.set(true));
        assert!(cube.start_rotation(&mut scheduler, intent));
        let frames = run(&mut scheduler, &mut cube);

        assert!(done.get());
        assert!(frames >= 500 / 16);
        assert!(!cube.is_rotating());
        assert_eq!(cube.groups().get(Face::F).len(), count);
        let radius = cube.bounding_radius();
        for index in 0..cube.model().len() {
            let length = cube.piece_local_transform(index).unwrap().position.length();
            assert!(length <= radius + EPSILON, "piece {index} at {length} > {radius}");
        }
    }

    #[test]
    fn test_retag_follows_physical_faces() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        // an L turn carries piece 0 from the LDB corner to LUB
        cube.rotate_face(&mut scheduler, Face::L, 1);
        run(&mut scheduler, &mut cube);

        for piece in cube.model().pieces() {
            let local = cube.piece_local_transform(piece.index).unwrap();
            let expected = nearest_cell(cube.cube_size(), local.position * 3.0);
            assert_eq!(piece.cell, expected, "piece {} cell", piece.index);
            assert_eq!(piece.membership, FaceSet::of_cell(piece.cell, 3));
            for face in Face::ALL {
                assert_eq!(
                    cube.groups().contains(face, piece.index),
                    piece.membership.contains(face),
                    "piece {} in group {face}",
                    piece.index
                );
            }
        }

        let corner = cube.piece(0).unwrap();
        assert_eq!(corner.faces.to_string(), "LDB", "sticker labels never change");
        assert_ne!(corner.membership, corner.faces);
        for face in Face::ALL {
            assert_eq!(cube.groups().get(face).len(), 9, "face {face}");
        }
    }

    #[test]
    fn test_frozen_membership_keeps_generation_tags() {
        let mut cube = cube(3, MembershipPolicy::Frozen);
        let mut scheduler = Scheduler::new();
        let groups = cube.groups().clone();
        cube.rotate_face(&mut scheduler, Face::L, 1);
        run(&mut scheduler, &mut cube);

        assert_eq!(cube.groups(), &groups);
        let corner = cube.piece(0).unwrap();
        assert_eq!(corner.membership, corner.faces);
        assert_eq!(corner.cell, corner.home);
    }

    #[test]
    fn test_four_turns_restore_start() {
        let mut cube = cube(4, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        for _ in 0..4 {
            assert!(cube.rotate_face(&mut scheduler, Face::U, -1));
            run(&mut scheduler, &mut cube);
        }
        for piece in cube.model().pieces() {
            let transform = cube.scene().transform(piece.node).unwrap();
            assert!(
                transform.matrix().abs_diff_eq(piece.start.matrix(), EPSILON),
                "piece {} did not return home",
                piece.index
            );
            assert_eq!(piece.cell, piece.home);
        }
    }

    #[test]
    fn test_resize_drops_in_flight_turn() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let intent = RotationIntent::face(Face::U, 1, 500.0).then(move |_| flag.set(true));
        cube.start_rotation(&mut scheduler, intent);
        scheduler.update(&mut cube, 16.0);

        cube.resize(2, false).unwrap();
        assert!(!cube.is_rotating());
        run(&mut scheduler, &mut cube);
        assert!(!fired.get(), "stale rotations never complete");
        assert_eq!(cube.scene().children(cube.object()).len(), 8);
    }

    fn assert_same_rotation(actual: Quat, expected: Quat, context: &str) {
        let (actual, expected) = (Mat3::from_quat(actual), Mat3::from_quat(expected));
        assert!(
            actual.abs_diff_eq(expected, 1e-6),
            "{context}: {actual:?} != {expected:?}"
        );
    }

    /// The 24 axis-aligned orientations, as quarter turns about X, Y and Z.
    fn axis_aligned() -> Vec<Quat> {
        let mut rotations = Vec::new();
        for x in 0..4 {
            for y in 0..4 {
                for z in 0..4 {
                    let [x, y, z] = [x, y, z].map(|n| n as f32 * FRAC_PI_2);
                    rotations.push(Quat::from_euler(EulerRot::XYZ, x, y, z));
                }
            }
        }
        rotations
    }

    #[test]
    fn test_snap_rotation_near_gimbal_lock() {
        let rotation = Quat::from_euler(EulerRot::XYZ, 0.001, FRAC_PI_2 - 0.002, -0.003);
        assert_same_rotation(snap_rotation(rotation), Quat::from_rotation_y(FRAC_PI_2), "near Y");
    }

    #[test]
    fn test_snap_rotation_picks_nearest() {
        // 40 degrees is closer to no turn, 57 degrees to a quarter turn
        assert_same_rotation(snap_rotation(Quat::from_rotation_z(0.7)), Quat::IDENTITY, "0.7 rad");
        assert_same_rotation(
            snap_rotation(Quat::from_rotation_z(1.0)),
            Quat::from_rotation_z(FRAC_PI_2),
            "1.0 rad",
        );
        assert_same_rotation(
            snap_rotation(Quat::from_rotation_x(-2.9)),
            Quat::from_rotation_x(PI),
            "-2.9 rad",
        );
    }

    #[test]
    fn test_snap_rotation_is_proper_and_fixed() {
        let wobble = Quat::from_euler(EulerRot::XYZ, 0.2, -0.15, 0.1);
        for rotation in axis_aligned() {
            assert_same_rotation(snap_rotation(rotation), rotation, "already aligned");
            let snapped = snap_rotation(rotation * wobble);
            assert_same_rotation(snapped, rotation, "wobbled");
            let matrix = Mat3::from_quat(snapped);
            assert!((matrix.determinant() - 1.0).abs() < 1e-6);
        }
        // far from every aligned orientation, yet still snaps to one
        let skewed = Quat::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 1.3);
        let snapped = Mat3::from_quat(snap_rotation(skewed));
        for col in 0..3 {
            let column = snapped.col(col);
            assert!(column.abs_diff_eq(column.round(), 1e-6), "column {column}");
            assert!((column.length() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_frozen_turns_do_not_drift() {
        let mut cube = cube(3, MembershipPolicy::Frozen);
        let mut scheduler = Scheduler::new();
        // tilted so every group quaternion composes with a non-trivial orbit
        cube.animate_rotation(&mut scheduler, Axis::X, 0.4, 0.0);
        cube.animate_rotation(&mut scheduler, Axis::Y, FRAC_PI_2, 0.0);

        for i in 0..60 {
            let face = Face::ALL[(i * 5) % 6];
            let direction = if i % 3 == 0 { -1 } else { 1 };
            assert!(cube.rotate_face(&mut scheduler, face, direction));
            run(&mut scheduler, &mut cube);
        }

        let first = cube.cube_size().first();
        for index in 0..cube.model().len() {
            let local = cube.piece_local_transform(index).unwrap();
            let matrix = Mat3::from_quat(local.rotation);
            for col in 0..3 {
                let column = matrix.col(col);
                assert!(
                    column.abs_diff_eq(column.round(), 1e-3),
                    "piece {index} orientation drifted: {matrix:?}"
                );
            }
            let cell = local.position * 3.0 - Vec3::splat(first);
            assert!(
                cell.abs_diff_eq(cell.round(), 1e-3),
                "piece {index} left the lattice: {cell}"
            );
        }
    }

    #[test]
    fn test_retag_settles_exactly() {
        let mut cube = cube(3, MembershipPolicy::Retag);
        let mut scheduler = Scheduler::new();
        for i in 0..30 {
            let face = Face::ALL[(i * 5) % 6];
            assert!(cube.rotate_face(&mut scheduler, face, 1));
            run(&mut scheduler, &mut cube);
        }
        for piece in cube.model().pieces() {
            let rotation = cube.scene().transform(piece.node).unwrap().rotation;
            assert!(
                axis_aligned().into_iter().any(|aligned| {
                    Mat3::from_quat(rotation).abs_diff_eq(Mat3::from_quat(aligned), 1e-6)
                }),
                "piece {} not snapped: {rotation:?}",
                piece.index
            );
        }
    }
}
