//! Pure state advancers behind the HUD indicators.

use shared::domain::{Integrity, Mode, RealmState};

pub const GAUGE_MIN: f64 = 0.0;
pub const GAUGE_MAX: f64 = 100.0;

/// Enums that advance round-robin over a fixed order.
pub trait Cyclic: Copy + PartialEq + 'static {
    const ORDER: &'static [Self];

    fn successor(self) -> Self {
        let position = Self::ORDER
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or(0);
        Self::ORDER[(position + 1) % Self::ORDER.len()]
    }
}

impl Cyclic for RealmState {
    const ORDER: &'static [Self] = &[
        RealmState::Unsynced,
        RealmState::Synced,
        RealmState::Anchored,
    ];
}

impl Cyclic for Mode {
    const ORDER: &'static [Self] = &[Mode::Assistant, Mode::Autonomous];
}

/// Weighted health draw: 10% red, 20% yellow, 70% green.
pub fn integrity_from_draw(draw: f64) -> Integrity {
    if draw < 0.10 {
        Integrity::Red
    } else if draw < 0.30 {
        Integrity::Yellow
    } else {
        Integrity::Green
    }
}

/// Moves a gauge by up to `span / 2` in either direction, clamped to 0..=100.
pub fn jitter(current: f64, draw: f64, span: f64) -> f64 {
    (current + (draw - 0.5) * span).clamp(GAUGE_MIN, GAUGE_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowLoops(u8);

impl FlowLoops {
    pub const MODULUS: u8 = 10;

    pub fn new(value: u8) -> Self {
        Self(value % Self::MODULUS)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn successor(self) -> Self {
        Self((self.0 + 1) % Self::MODULUS)
    }
}
