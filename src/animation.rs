//! Frame-driven animation scheduler.
//!
//! A `Scheduler` is a registry of animation units advanced by one shared
//! clock. The owner of the render loop calls `update` once per frame with the
//! elapsed time; every registered unit is advanced once, in registration
//! order, and units that report `Progress::Done` are unregistered. There is
//! no cancellation: a unit leaves the registry when it says it is done, or
//! when its id is unregistered explicitly.

use rustc_hash::FxHashMap;

/// Identifier of a registered unit. Ids increase monotonically and are
/// never reused by the same scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

/// Whether a unit wants to be called again next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Running,
    Done,
}

/// A unit of per-frame work operating on a shared context `C`.
pub trait Animation<C> {
    /// Advances the unit by `delta` milliseconds.
    fn update(&mut self, ctx: &mut C, delta: f32) -> Progress;
}

impl<C, F> Animation<C> for F
where
    F: FnMut(&mut C, f32) -> Progress,
{
    fn update(&mut self, ctx: &mut C, delta: f32) -> Progress {
        self(ctx, delta)
    }
}

/// Registry of animation units keyed by `AnimationId`.
pub struct Scheduler<C> {
    ids: Vec<AnimationId>,
    units: FxHashMap<AnimationId, Box<dyn Animation<C>>>,
    next_id: u64,
    /// Total time advanced, in milliseconds.
    time: f64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self {
            ids: Vec::new(),
            units: FxHashMap::default(),
            next_id: 0,
            time: 0.0,
        }
    }

    pub fn register(&mut self, unit: impl Animation<C> + 'static) -> AnimationId {
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        if self.ids.is_empty() {
            log::trace!("animation driver started");
        }
        self.ids.push(id);
        self.units.insert(id, Box::new(unit));
        id
    }

    /// Removes a unit. Returns `false` if it was not registered.
    pub fn unregister(&mut self, id: AnimationId) -> bool {
        let Some(position) = self.ids.iter().position(|&other| other == id) else {
            return false;
        };
        self.ids.remove(position);
        self.units.remove(&id);
        if self.ids.is_empty() {
            log::trace!("animation driver stopped");
        }
        true
    }

    /// Whether the frame driver has work, i.e. any unit is registered.
    pub fn is_running(&self) -> bool {
        !self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn is_registered(&self, id: AnimationId) -> bool {
        self.units.contains_key(&id)
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Advances every registered unit once, in registration order.
    pub fn update(&mut self, ctx: &mut C, delta: f32) {
        self.time += f64::from(delta);

        let mut finished = Vec::new();
        for id in &self.ids {
            if let Some(unit) = self.units.get_mut(id) {
                if unit.update(ctx, delta) == Progress::Done {
                    finished.push(*id);
                }
            }
        }

        for id in finished {
            self.unregister(id);
        }
    }
}

/// Quadratic ease-out: fast start, gentle stop.
#[inline]
pub fn ease_out_quad(t: f32) -> f32 {
    t * (2.0 - t)
}

/// Normalized progress of a timed animation, clamped to `0.0..=1.0`.
#[inline]
pub fn progress(elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        1.0
    } else {
        (elapsed / duration).min(1.0)
    }
}
