//! Runtime configuration of a cube session.

use crate::pieces::Theme;

/// Default duration of face turns and preset orbits, in milliseconds.
pub const DEFAULT_DURATION: f32 = 500.0;

/// What happens to face membership after a face turn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MembershipPolicy {
    /// Membership is fixed at generation time, so groups drift away from
    /// the faces pieces physically occupy as turns accumulate.
    Frozen,
    /// Moved pieces are snapped to their new cell and regrouped by it.
    #[default]
    Retag,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CubeConfig {
    pub size: usize,
    /// Face-turn duration in milliseconds.
    pub turn_duration: f32,
    /// Duration of the preset whole-cube rotations and drag settling.
    pub orbit_duration: f32,
    pub membership: MembershipPolicy,
    pub theme: Theme,
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            size: 3,
            turn_duration: DEFAULT_DURATION,
            orbit_duration: DEFAULT_DURATION,
            membership: MembershipPolicy::default(),
            theme: Theme::default(),
        }
    }
}

impl CubeConfig {
    pub fn with_size(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }
}
