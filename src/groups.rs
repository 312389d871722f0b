//! Face groups: which pieces currently belong to each of the six faces.
//!
//! Groups hold piece indices, not pieces; the piece model stays the single
//! owner. A group is rebuilt from scratch on every init, never diffed.

use crate::geometry::{Face, FaceSet};
use crate::pieces::PieceModel;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceGroupIndex {
    /// Indexed by `Face::index`; each list is kept sorted.
    groups: [Vec<usize>; 6],
}

impl FaceGroupIndex {
    /// Builds the index from every piece's membership tags.
    pub fn build(model: &PieceModel) -> Self {
        let mut index = Self::default();
        index.rebuild(model);
        index
    }

    /// Clears every group and repopulates it from the model.
    pub fn rebuild(&mut self, model: &PieceModel) {
        self.clear();
        for piece in model.pieces() {
            for face in piece.membership.iter() {
                self.groups[face.index()].push(piece.index);
            }
        }
    }

    pub fn clear(&mut self) {
        for group in &mut self.groups {
            group.clear();
        }
    }

    pub fn get(&self, face: Face) -> &[usize] {
        &self.groups[face.index()]
    }

    pub fn contains(&self, face: Face, piece: usize) -> bool {
        self.groups[face.index()].binary_search(&piece).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(Vec::is_empty)
    }

    /// Returns the group for `face`, deriving it from the model first if it
    /// is empty.
    pub fn ensure(&mut self, face: Face, model: &PieceModel) -> &[usize] {
        if self.groups[face.index()].is_empty() {
            log::trace!("face group {face} empty, deriving from piece membership");
            self.groups[face.index()] = model
                .pieces()
                .iter()
                .filter(|piece| piece.membership.contains(face))
                .map(|piece| piece.index)
                .collect();
        }
        &self.groups[face.index()]
    }

    /// Moves one piece from the groups of `old` to the groups of `new`.
    pub fn retag(&mut self, piece: usize, old: FaceSet, new: FaceSet) {
        for face in old.iter().filter(|face| !new.contains(*face)) {
            self.groups[face.index()].retain(|&member| member != piece);
        }
        for face in new.iter().filter(|face| !old.contains(*face)) {
            let group = &mut self.groups[face.index()];
            if let Err(position) = group.binary_search(&piece) {
                group.insert(position, piece);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{generate_positions, CubeSize};
    use crate::pieces::{PieceGeometry, Theme};
    use crate::scene::SceneGraph;

    fn model(size: usize) -> PieceModel {
        let mut scene = SceneGraph::new();
        let container = scene.create_child(scene.root(), "object").unwrap();
        let positions = generate_positions(CubeSize::new(size).unwrap());
        PieceModel::build(
            &mut scene,
            container,
            &positions,
            PieceGeometry::default(),
            &Theme::classic(),
        )
        .unwrap()
    }

    #[test]
    fn test_membership_matches_tags() {
        for size in 2..=5 {
            let model = model(size);
            let index = FaceGroupIndex::build(&model);
            for face in Face::ALL {
                assert_eq!(index.get(face).len(), size * size, "face {face} of size {size}");
                for piece in model.pieces() {
                    assert_eq!(
                        index.contains(face, piece.index),
                        piece.faces.contains(face),
                        "piece {} in group {face}",
                        piece.index
                    );
                }
            }
        }
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let model = model(3);
        let mut index = FaceGroupIndex::build(&model);
        let fresh = index.clone();
        index.retag(0, FaceSet::EMPTY, Face::ALL.into_iter().collect());
        assert_ne!(index, fresh);
        index.rebuild(&model);
        assert_eq!(index, fresh);
    }

    #[test]
    fn test_ensure_derives_empty_group() {
        let model = model(3);
        let mut index = FaceGroupIndex::default();
        assert!(index.is_empty());
        let derived = index.ensure(Face::U, &model).to_vec();
        assert_eq!(derived.len(), 9);
        assert_eq!(derived, FaceGroupIndex::build(&model).get(Face::U));
        assert!(index.get(Face::D).is_empty(), "only the requested face is derived");
    }

    #[test]
    fn test_retag_moves_piece_between_groups() {
        let model = model(3);
        let mut index = FaceGroupIndex::build(&model);
        // piece 0 is the LDB corner; pretend it moved to the LUB corner
        let old: FaceSet = [Face::L, Face::D, Face::B].into_iter().collect();
        let new: FaceSet = [Face::L, Face::U, Face::B].into_iter().collect();
        index.retag(0, old, new);

        assert!(index.contains(Face::L, 0));
        assert!(index.contains(Face::U, 0));
        assert!(!index.contains(Face::D, 0));
        assert_eq!(index.get(Face::U).len(), 10);
        assert_eq!(index.get(Face::D).len(), 8);
        assert!(index.get(Face::U).windows(2).all(|w| w[0] < w[1]));
    }
}
