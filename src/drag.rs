//! Pointer drag state machine.
//!
//! `Still -> Preparing -> Rotating -> Animating -> Still`. A drag starts in
//! `Preparing` and only commits to an axis once the pointer has travelled
//! past `DRAG_THRESHOLD`. Orbit drags follow the pointer live through
//! zero-duration orbits and settle to the nearest quarter turn on release;
//! face drags (started on a picked face) turn that face on release.
//!
//! Pointer coordinates are normalized device coordinates.

use std::cell::Cell;
use std::f32::consts::PI;
use std::rc::Rc;

use glam::Vec2;

use crate::animation::Scheduler;
use crate::cube::Cube;
use crate::geometry::Axis;
use crate::picking::PickHit;
use crate::rotation::{round_to_quarter_turn, RotationIntent};

/// Pointer travel, in NDC units, before a drag commits to an axis.
pub const DRAG_THRESHOLD: f32 = 0.05;

/// Orbit radians per NDC unit of pointer travel.
pub const DRAG_SENSITIVITY: f32 = PI;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Still,
    Preparing,
    Rotating,
    Animating,
}

/// Dominant direction of a drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragAxis {
    Horizontal,
    Vertical,
}

impl DragAxis {
    /// Picks the axis with the larger component; ties go horizontal.
    pub fn dominant(delta: Vec2) -> Self {
        if delta.y.abs() > delta.x.abs() {
            DragAxis::Vertical
        } else {
            DragAxis::Horizontal
        }
    }

    /// Axis the cube orbits about for this drag direction.
    pub fn rotation_axis(self) -> Axis {
        match self {
            DragAxis::Horizontal => Axis::Y,
            DragAxis::Vertical => Axis::X,
        }
    }

    /// Orbit angle produced by a pointer delta along this axis.
    pub fn angle(self, delta: Vec2) -> f32 {
        match self {
            DragAxis::Horizontal => delta.x * DRAG_SENSITIVITY,
            DragAxis::Vertical => -delta.y * DRAG_SENSITIVITY,
        }
    }

    /// Turn direction of a face drag along this axis.
    fn direction(self, delta: Vec2) -> i32 {
        let component = match self {
            DragAxis::Horizontal => delta.x,
            DragAxis::Vertical => -delta.y,
        };
        if component < 0.0 {
            -1
        } else {
            1
        }
    }
}

#[derive(Debug, Default)]
pub struct DragController {
    /// Shared with settle callbacks so they can end the gesture.
    state: Rc<Cell<DragState>>,
    attached: bool,
    previous: Vec2,
    accumulated: Vec2,
    axis: Option<DragAxis>,
    hit: Option<PickHit>,
    start_angle: f32,
}

impl DragController {
    pub fn new() -> Self {
        Self {
            attached: true,
            ..Self::default()
        }
    }

    pub fn state(&self) -> DragState {
        self.state.get()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn attach(&mut self) {
        self.attached = true;
    }

    /// Stops accepting new drags until `attach` is called again.
    pub fn detach(&mut self) {
        self.attached = false;
    }

    /// Forgets the current gesture and returns to `Still`.
    pub fn reset(&mut self) {
        self.set_state(DragState::Still);
        self.accumulated = Vec2::ZERO;
        self.axis = None;
        self.hit = None;
    }

    /// Face the current gesture started on, if any.
    pub fn hit(&self) -> Option<PickHit> {
        self.hit
    }

    /// Accumulated pointer travel of the current gesture.
    pub fn accumulated(&self) -> Vec2 {
        self.accumulated
    }

    fn set_state(&self, state: DragState) {
        let old = self.state.replace(state);
        if old != state {
            log::trace!("drag {old:?} -> {state:?}");
        }
    }

    /// Begins a gesture at `point`. With a `hit` the gesture turns that face,
    /// otherwise it orbits the whole cube. Returns `false` if ignored.
    pub fn on_drag_start(&mut self, point: Vec2, hit: Option<PickHit>) -> bool {
        if !self.attached || self.state() != DragState::Still {
            log::trace!("drag start ignored in {:?}", self.state());
            return false;
        }
        self.previous = point;
        self.accumulated = Vec2::ZERO;
        self.axis = None;
        self.hit = hit;
        self.set_state(DragState::Preparing);
        true
    }

    pub fn on_drag_move(&mut self, point: Vec2, cube: &mut Cube, scheduler: &mut Scheduler<Cube>) {
        let state = self.state();
        if !matches!(state, DragState::Preparing | DragState::Rotating) {
            return;
        }

        let delta = point - self.previous;
        self.previous = point;
        self.accumulated += delta;

        match (state, self.axis) {
            (DragState::Preparing, _) => {
                if self.accumulated.length() > DRAG_THRESHOLD {
                    let axis = DragAxis::dominant(self.accumulated);
                    self.axis = Some(axis);
                    self.start_angle = cube.orbit_angle(axis.rotation_axis());
                    self.set_state(DragState::Rotating);
                }
            }
            (DragState::Rotating, Some(axis)) if self.hit.is_none() => {
                cube.animate_rotation(scheduler, axis.rotation_axis(), axis.angle(delta), 0.0);
            }
            _ => {}
        }
    }

    /// Ends the gesture, settling an orbit to the nearest quarter turn or
    /// turning the picked face.
    pub fn on_drag_end(&mut self, cube: &mut Cube, scheduler: &mut Scheduler<Cube>) {
        match (self.state(), self.axis) {
            (DragState::Preparing, _) => self.set_state(DragState::Still),
            (DragState::Rotating, Some(axis)) => {
                let state = Rc::clone(&self.state);
                let intent = match self.hit {
                    Some(hit) => RotationIntent::face(
                        hit.face,
                        axis.direction(self.accumulated),
                        cube.turn_duration,
                    ),
                    None => {
                        let rotation_axis = axis.rotation_axis();
                        let target =
                            self.start_angle + round_to_quarter_turn(axis.angle(self.accumulated));
                        let delta = target - cube.orbit_angle(rotation_axis);
                        RotationIntent::orbit(rotation_axis, delta, cube.orbit_duration)
                    }
                }
                .then(move |_| {
                    log::trace!("drag settled");
                    state.set(DragState::Still);
                });

                self.set_state(DragState::Animating);
                if !cube.start_rotation(scheduler, intent) {
                    self.set_state(DragState::Still);
                }
            }
            _ => {}
        }
    }
}
