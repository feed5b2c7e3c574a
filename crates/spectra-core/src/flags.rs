//! Transform direction, transform kind, and planner effort flags.

use std::fmt;

use bitflags::bitflags;

/// Sign of the exponent in the transform.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `e^{-2 pi i jk/n}`.
    Forward = -1,
    /// `e^{+2 pi i jk/n}`; unnormalised.
    Backward = 1,
}

impl Direction {
    /// The exponent sign as `-1.0` or `+1.0`.
    pub fn sign(self) -> f64 {
        self as i32 as f64
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => write!(f, "forward"),
            Self::Backward => write!(f, "backward"),
        }
    }
}

/// Which element-type combination a plan transforms between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransformKind {
    /// Complex input, complex output, same extents.
    ComplexToComplex,
    /// Real input, half-spectrum complex output. Always forward.
    RealToComplex,
    /// Half-spectrum complex input, real output. Always backward.
    ComplexToReal,
}

impl TransformKind {
    /// Short token used in logs and wisdom text.
    pub fn token(self) -> &'static str {
        match self {
            Self::ComplexToComplex => "c2c",
            Self::RealToComplex => "r2c",
            Self::ComplexToReal => "c2r",
        }
    }

    /// Inverse of [`token`](Self::token).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "c2c" => Some(Self::ComplexToComplex),
            "r2c" => Some(Self::RealToComplex),
            "c2r" => Some(Self::ComplexToReal),
            _ => None,
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

bitflags! {
    /// Planning-effort options passed to plan construction.
    ///
    /// The empty set means "measure". Flags are not mutually exclusive
    /// bit-for-bit, but [`ESTIMATE`](Self::ESTIMATE) takes precedence over
    /// the search flags, and [`EXHAUSTIVE`](Self::EXHAUSTIVE) over
    /// [`PATIENT`](Self::PATIENT).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct PlannerFlags: u32 {
        /// Like patient, but searches an even wider range of strategies.
        const EXHAUSTIVE = 1 << 3;
        /// Measures more candidates, more often, than the default.
        const PATIENT = 1 << 5;
        /// Pick a strategy heuristically; never touches the buffers.
        const ESTIMATE = 1 << 6;
        /// Only produce a plan if wisdom already covers the problem.
        const WISDOM_ONLY = 1 << 21;
    }
}

impl PlannerFlags {
    /// Default planning mode: measure candidate strategies.
    pub const MEASURE: Self = Self::empty();

    /// The planning effort these flags request.
    pub fn effort(self) -> Effort {
        if self.contains(Self::ESTIMATE) {
            Effort::Estimate
        } else if self.contains(Self::EXHAUSTIVE) {
            Effort::Exhaustive
        } else if self.contains(Self::PATIENT) {
            Effort::Patient
        } else {
            Effort::Measure
        }
    }

    /// Whether only existing wisdom may be used.
    pub fn wisdom_only(self) -> bool {
        self.contains(Self::WISDOM_ONLY)
    }
}

impl Default for PlannerFlags {
    fn default() -> Self {
        Self::MEASURE
    }
}

/// Ordered planning effort. Wisdom gathered at one effort satisfies
/// wisdom-only requests at the same or a lower effort.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Effort {
    /// Heuristic choice, no measurement.
    Estimate,
    /// Time each applicable candidate once.
    Measure,
    /// Time a wider candidate set several times.
    Patient,
    /// Time every candidate, including unlikely ones.
    Exhaustive,
}

impl Effort {
    /// Short token used in wisdom text.
    pub fn token(self) -> &'static str {
        match self {
            Self::Estimate => "estimate",
            Self::Measure => "measure",
            Self::Patient => "patient",
            Self::Exhaustive => "exhaustive",
        }
    }

    /// Inverse of [`token`](Self::token).
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "estimate" => Some(Self::Estimate),
            "measure" => Some(Self::Measure),
            "patient" => Some(Self::Patient),
            "exhaustive" => Some(Self::Exhaustive),
            _ => None,
        }
    }
}
