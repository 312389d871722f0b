//! Ray casting against the cube to find the piece and face under the pointer.

use glam::{Mat4, Vec2, Vec3};

use crate::cube::Cube;
use crate::geometry::{Axis, Face, FaceSet};
use crate::grid::nearest_cell;
use crate::pieces::{Color, PIECE_SIZE};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Unprojects a point in normalized device coordinates through the
    /// inverse of a view-projection matrix.
    pub fn from_ndc(ndc: Vec2, inverse_view_projection: &Mat4) -> Self {
        let near = inverse_view_projection.project_point3(ndc.extend(-1.0));
        let far = inverse_view_projection.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// The same ray expressed in another space.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center_size(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size * 0.5);
        Self {
            min: center - half,
            max: center + half,
        }
    }
}

/// Slab test. Returns the distance along the ray to the first point inside
/// the box, or `None` if the box is missed or entirely behind the origin.
pub fn ray_aabb_intersection(ray: &Ray, aabb: &Aabb) -> Option<f32> {
    let inv_dir = ray.direction.recip();
    let t1 = (aabb.min - ray.origin) * inv_dir;
    let t2 = (aabb.max - ray.origin) * inv_dir;

    // entry is the latest near plane, exit the earliest far plane
    let tmin = t1.min(t2).max_element();
    let tmax = t1.max(t2).min_element();

    if tmax < 0.0 || tmin > tmax {
        None
    } else if tmin >= 0.0 {
        Some(tmin)
    } else {
        Some(tmax)
    }
}

/// Piece and outer face hit by a ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PickHit {
    pub piece: usize,
    pub face: Face,
}

impl Cube {
    /// Casts a world-space ray at the cube.
    pub fn pick(&self, ray: &Ray) -> Option<PickHit> {
        let container = self.scene.world_matrix(self.object).ok()?;
        let local = ray.transformed(&container.inverse());
        let size = self.cube_size();

        let mut nearest: Option<(f32, usize)> = None;
        for piece in self.model.pieces() {
            let Ok(transform) = self.piece_local_transform(piece.index) else {
                continue;
            };
            let cell = nearest_cell(size, transform.position / PIECE_SIZE);
            if FaceSet::of_cell(cell, size.get()).is_empty() {
                continue;
            }
            let aabb = Aabb::from_center_size(transform.position, PIECE_SIZE);
            if let Some(distance) = ray_aabb_intersection(&local, &aabb) {
                if nearest.map_or(true, |(best, _)| distance < best) {
                    nearest = Some((distance, piece.index));
                }
            }
        }

        let (distance, piece) = nearest?;
        let face = dominant_face(local.at(distance))?;
        log::trace!("picked piece {piece} on face {face}");
        Some(PickHit { piece, face })
    }

    /// Label of the sticker showing on the hit side of a piece. Turns carry
    /// stickers around, so this differs from `hit.face` once the piece has
    /// been turned. `None` if that side of the piece has no sticker.
    pub fn sticker_at(&self, hit: &PickHit) -> Option<Face> {
        let local = self.piece_local_transform(hit.piece).ok()?;
        let face = dominant_face(local.rotation.inverse() * hit.face.normal())?;
        self.piece(hit.piece).ok()?.sticker(face).map(|_| face)
    }

    /// Recolors the sticker under `ray`. Returns the piece and the label of
    /// the sticker that was painted.
    pub fn paint(&mut self, ray: &Ray, color: Color) -> Option<(usize, Face)> {
        let hit = self.pick(ray)?;
        let face = self.sticker_at(&hit)?;
        self.set_sticker_color(hit.piece, face, color)
            .then_some((hit.piece, face))
    }
}

/// Face whose outward normal is closest to `v`.
fn dominant_face(v: Vec3) -> Option<Face> {
    let axis = Axis::ALL
        .into_iter()
        .max_by(|a, b| v[a.index()].abs().total_cmp(&v[b.index()].abs()))?;
    Some(Face::on_axis(axis, v[axis.index()] > 0.0))
}
