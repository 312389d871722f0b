//! A cube together with its animation scheduler and drag controller: the
//! surface a UI drives.

use glam::Vec2;

use crate::animation::Scheduler;
use crate::config::CubeConfig;
use crate::cube::{Cube, CubeSnapshot};
use crate::drag::{DragController, DragState};
use crate::error::CubeError;
use crate::geometry::Face;
use crate::picking::Ray;
use crate::pieces::{Color, ColorKey, Theme};

/// Callbacks into game-level state that a size change invalidates.
///
/// Both do nothing by default.
pub trait SessionHooks {
    fn reset_timer(&mut self) {}

    fn clear_saved_game(&mut self) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}

pub struct Session {
    cube: Cube,
    scheduler: Scheduler<Cube>,
    drag: DragController,
    config: CubeConfig,
    hooks: Box<dyn SessionHooks>,
}

impl Session {
    pub fn new(config: CubeConfig) -> Result<Self, CubeError> {
        Self::with_hooks(config, NoopHooks)
    }

    pub fn with_hooks(
        config: CubeConfig,
        hooks: impl SessionHooks + 'static,
    ) -> Result<Self, CubeError> {
        Ok(Self {
            cube: Cube::new(&config)?,
            scheduler: Scheduler::new(),
            drag: DragController::new(),
            config,
            hooks: Box::new(hooks),
        })
    }

    pub fn cube(&self) -> &Cube {
        &self.cube
    }

    pub fn config(&self) -> &CubeConfig {
        &self.config
    }

    pub fn drag_state(&self) -> DragState {
        self.drag.state()
    }

    /// Whether any animation still needs frames.
    pub fn is_animating(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Advances every running animation by `delta` milliseconds.
    pub fn update(&mut self, delta: f32) {
        self.scheduler.update(&mut self.cube, delta);
    }

    /// Regenerates the cube at `size`. Returns whether anything changed.
    ///
    /// Rotations in flight are abandoned and any drag is cancelled.
    pub fn set_size(&mut self, size: usize) -> Result<bool, CubeError> {
        self.drag.detach();
        self.drag.reset();
        let resized = self.cube.resize(size, false);
        self.drag.attach();

        if resized? {
            self.config.size = size;
            self.hooks.reset_timer();
            self.hooks.clear_saved_game();
            return Ok(true);
        }
        Ok(false)
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.config.theme = theme;
        self.cube.set_theme(theme);
    }

    /// Changes one theme color and recolors everything using it.
    pub fn set_color(&mut self, key: ColorKey, color: Color) {
        let mut theme = self.config.theme;
        theme.set(key, color);
        self.set_theme(theme);
    }

    pub fn set_sticker_color(&mut self, piece: usize, face: Face, color: Color) -> bool {
        self.cube.set_sticker_color(piece, face, color)
    }

    /// Recolors the sticker under `ray`, wherever turns have carried it.
    pub fn paint_sticker(&mut self, ray: &Ray, color: Color) -> Option<(usize, Face)> {
        self.cube.paint(ray, color)
    }

    pub fn rotate_left(&mut self) -> bool {
        self.cube.rotate_left(&mut self.scheduler)
    }

    pub fn rotate_right(&mut self) -> bool {
        self.cube.rotate_right(&mut self.scheduler)
    }

    pub fn rotate_up(&mut self) -> bool {
        self.cube.rotate_up(&mut self.scheduler)
    }

    pub fn rotate_face(&mut self, face: Face, direction: i32) -> bool {
        self.cube.rotate_face(&mut self.scheduler, face, direction)
    }

    /// Starts a drag at `point` (NDC). If `ray` hits a face of the cube the
    /// drag turns that face, otherwise it orbits the cube.
    pub fn on_drag_start(&mut self, point: Vec2, ray: Option<&Ray>) -> bool {
        let hit = ray.and_then(|ray| self.cube.pick(ray));
        self.drag.on_drag_start(point, hit)
    }

    pub fn on_drag_move(&mut self, point: Vec2) {
        self.drag
            .on_drag_move(point, &mut self.cube, &mut self.scheduler);
    }

    pub fn on_drag_end(&mut self) {
        self.drag.on_drag_end(&mut self.cube, &mut self.scheduler);
    }

    pub fn snapshot(&self) -> CubeSnapshot {
        self.cube.snapshot()
    }

    pub fn load_snapshot(&mut self, snapshot: &CubeSnapshot) -> Result<(), CubeError> {
        self.drag.reset();
        self.cube.load_snapshot(snapshot)?;
        self.config.size = snapshot.size;
        Ok(())
    }
}
