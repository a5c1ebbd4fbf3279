//! Knob oscillation policy
//!
//! Each animated knob is either rising or falling, decided from its current
//! position relative to [`MIDPOINT`]. One step moves it by a saturating delta;
//! a knob that lands on a rail is reseeded from a [`ReseedSource`].
//!
//! The random sources live here too so tests and dry runs can swap in
//! deterministic ones.

use crate::address::{CONTROLLER_MAX, MIDPOINT};
use crate::error::SurfaceError;
use crate::knob::KnobState;
use crate::transport::MidiSink;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;

/// Default reseed range, centered around 127 / 2 so the rings start mid-sweep
pub const DEFAULT_RESEED_RANGE: RangeInclusive<u8> = 53..=73;

/// Default step applied per tick
pub const DEFAULT_STEP: u32 = 8;

/// Direction of travel for one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    pub fn for_position(position: u8) -> Self {
        if position > MIDPOINT {
            Self::Rising
        } else {
            Self::Falling
        }
    }
}

/// What a single oscillation step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Moved to this position
    Moved(u8),
    /// Hit a rail and was reseeded to this position
    Reseeded(u8),
}

impl StepOutcome {
    pub fn position(self) -> u8 {
        match self {
            Self::Moved(p) | Self::Reseeded(p) => p,
        }
    }
}

/// Supplies starting positions and rail reseeds
pub trait ReseedSource {
    fn reseed(&mut self) -> u8;
}

/// Supplies clip grid colors per cell
pub trait ColorSource {
    fn color(&mut self, x: u8, y: u8) -> u8;
}

/// Uniform reseed over an inclusive range
#[derive(Debug, Clone)]
pub struct RandomReseed {
    range: RangeInclusive<u8>,
    rng: StdRng,
}

impl RandomReseed {
    pub fn new(range: RangeInclusive<u8>) -> Result<Self, SurfaceError> {
        Self::with_rng(range, StdRng::from_os_rng())
    }

    /// Seeded variant for reproducible runs
    pub fn seeded(range: RangeInclusive<u8>, seed: u64) -> Result<Self, SurfaceError> {
        Self::with_rng(range, StdRng::seed_from_u64(seed))
    }

    fn with_rng(range: RangeInclusive<u8>, rng: StdRng) -> Result<Self, SurfaceError> {
        if *range.end() > CONTROLLER_MAX {
            return Err(SurfaceError::out_of_range("reseed maximum", *range.end() as usize));
        }
        if range.start() > range.end() {
            return Err(SurfaceError::out_of_range("reseed minimum", *range.start() as usize));
        }
        Ok(Self { range, rng })
    }

    pub fn range(&self) -> &RangeInclusive<u8> {
        &self.range
    }
}

impl ReseedSource for RandomReseed {
    fn reseed(&mut self) -> u8 {
        self.rng.random_range(self.range.clone())
    }
}

/// Random odd palette colors (1, 3, 5 or 7)
#[derive(Debug, Clone)]
pub struct OddPaletteColors {
    rng: StdRng,
}

impl OddPaletteColors {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for OddPaletteColors {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorSource for OddPaletteColors {
    fn color(&mut self, _x: u8, _y: u8) -> u8 {
        self.rng.random_range(1..=6u8) | 1
    }
}

/// Cycles through a fixed list of values
#[derive(Debug, Clone)]
pub struct SequenceReseed {
    values: Vec<u8>,
    next: usize,
}

impl SequenceReseed {
    /// An empty list reseeds to the midpoint
    pub fn new(values: Vec<u8>) -> Self {
        Self { values, next: 0 }
    }
}

impl ReseedSource for SequenceReseed {
    fn reseed(&mut self) -> u8 {
        if self.values.is_empty() {
            return MIDPOINT;
        }
        let value = self.values[self.next % self.values.len()];
        self.next = self.next.wrapping_add(1);
        value
    }
}

/// Same color everywhere
#[derive(Debug, Clone, Copy)]
pub struct FixedColor(pub u8);

impl ColorSource for FixedColor {
    fn color(&mut self, _x: u8, _y: u8) -> u8 {
        self.0
    }
}

/// Apply one oscillation step to `knob` on `track`
///
/// Rising knobs get `add_saturate(step)`, falling ones `sub_saturate(step)`.
/// If the committed value is 0 or 127 the knob is immediately moved to a
/// fresh position from `reseed`.
pub fn step_knob<S, R>(
    knob: &mut KnobState,
    sink: &mut S,
    track: usize,
    step: u32,
    reseed: &mut R,
) -> Result<StepOutcome, SurfaceError>
where
    S: MidiSink + ?Sized,
    R: ReseedSource + ?Sized,
{
    let committed = match Direction::for_position(knob.position(track)?) {
        Direction::Rising => knob.add_saturate(sink, track, step)?,
        Direction::Falling => knob.sub_saturate(sink, track, step)?,
    };

    if committed == 0 || committed == CONTROLLER_MAX {
        let seed = reseed.reseed();
        knob.set_position(sink, track, seed)?;
        log::trace!(
            "Knob {:#04x} track {} hit rail {}, reseeded to {}",
            knob.controller_id(),
            track,
            committed,
            seed
        );
        return Ok(StepOutcome::Reseeded(seed));
    }

    Ok(StepOutcome::Moved(committed))
}
