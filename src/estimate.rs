//! Estimate algebra: probabilistic interval estimates (PIEs) and their
//! time/cardinality specializations.
//!
//! A PIE is a subjective claim, not a hard bound: `p` is the confidence
//! that the true value lies in `[lower, upper]`.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Probabilistic interval estimate `(lower, upper, p)`.
///
/// Consolidates what the source modeled as three constructors with
/// overlapping `coeff`/`key_string` defaults into one builder.
#[derive(Debug, Clone)]
pub struct Pie {
    pub lower: f64,
    pub upper: f64,
    pub p: f64,
    pub is_override: bool,
    pub key_string: String,
    pub coeff: f64,
}

/// Builder for [`Pie`] with defaults `coeff = 0.0`, `key_string = ""`,
/// `is_override = false`.
pub struct PieBuilder {
    lower: f64,
    upper: f64,
    p: f64,
    is_override: bool,
    key_string: String,
    coeff: f64,
}

impl PieBuilder {
    pub fn new(lower: f64, upper: f64, p: f64) -> Self {
        Self {
            lower,
            upper,
            p,
            is_override: false,
            key_string: String::new(),
            coeff: 0.0,
        }
    }

    pub fn coeff(mut self, coeff: f64) -> Self {
        self.coeff = coeff;
        self
    }

    pub fn key_string(mut self, key_string: impl Into<String>) -> Self {
        self.key_string = key_string.into();
        self
    }

    pub fn is_override(mut self, is_override: bool) -> Self {
        self.is_override = is_override;
        self
    }

    pub fn build(self) -> Pie {
        Pie {
            lower: self.lower,
            upper: self.upper,
            p: self.p,
            is_override: self.is_override,
            key_string: self.key_string,
            coeff: self.coeff,
        }
    }
}

impl Pie {
    pub fn new(lower: f64, upper: f64, p: f64) -> Self {
        PieBuilder::new(lower, upper, p).build()
    }

    pub fn builder(lower: f64, upper: f64, p: f64) -> PieBuilder {
        PieBuilder::new(lower, upper, p)
    }

    /// A single exact value: `p = 1`, `lower = upper = v`.
    pub fn exact(v: f64) -> Self {
        Self::new(v, v, 1.0)
    }

    pub fn average(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// `round(sqrt(lower * upper))`.
    pub fn geometric_mean(&self) -> f64 {
        (self.lower * self.upper).sqrt().round()
    }

    pub fn is_exactly(&self, v: f64) -> bool {
        self.p == 1.0 && self.lower == v && self.upper == v
    }

    /// Sum of two independent estimates; confidence drops to the weaker input.
    pub fn plus(&self, other: &Pie) -> Pie {
        Pie {
            lower: self.lower + other.lower,
            upper: self.upper + other.upper,
            p: self.p.min(other.p),
            is_override: false,
            key_string: String::new(),
            coeff: 0.0,
        }
    }

    /// Pure shift of both endpoints by a scalar; confidence and metadata
    /// are preserved.
    pub fn plus_scalar(&self, k: f64) -> Pie {
        Pie {
            lower: self.lower + k,
            upper: self.upper + k,
            ..self.clone()
        }
    }

    /// `scalar == 1` returns an unchanged copy; otherwise each endpoint is
    /// rounded half-up after scaling.
    pub fn times(&self, scalar: f64) -> Pie {
        if scalar == 1.0 {
            return self.clone();
        }
        Pie {
            lower: round_half_up(self.lower * scalar),
            upper: round_half_up(self.upper * scalar),
            ..self.clone()
        }
    }

    /// Structural equality over `(lower, upper, p)`, with per-field tolerance.
    pub fn equals_within_delta(&self, other: &Pie, delta: f64) -> bool {
        (self.lower - other.lower).abs() <= delta
            && (self.upper - other.upper).abs() <= delta
            && (self.p - other.p).abs() <= delta
    }
}

fn round_half_up(x: f64) -> f64 {
    if x >= 0.0 {
        (x + 0.5).floor()
    } else {
        (x - 0.5).ceil()
    }
}

/// Equality is structural over `(lower, upper, p)` only — `coeff`,
/// `key_string` and `is_override` are bookkeeping, not value identity.
impl PartialEq for Pie {
    fn eq(&self, other: &Self) -> bool {
        self.lower == other.lower && self.upper == other.upper && self.p == other.p
    }
}

/// Agrees with `PartialEq`: hashes only `(lower, upper, p)`.
impl Hash for Pie {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lower.to_bits().hash(state);
        self.upper.to_bits().hash(state);
        self.p.to_bits().hash(state);
    }
}

impl fmt::Display for Pie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}..{} ~ {:.1}%)", self.lower, self.upper, self.p * 100.0)
    }
}

/// Total preorder over estimates used by the optimizer to rank
/// alternatives. An estimate with `p == 0` is uninformative and therefore
/// compares as the greatest (worst) element; among informative estimates,
/// ranking follows the geometric mean.
pub fn expectation_value_comparator(a: &Pie, b: &Pie) -> Ordering {
    match (a.p == 0.0, b.p == 0.0) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a
            .geometric_mean()
            .partial_cmp(&b.geometric_mean())
            .unwrap_or(Ordering::Equal),
    }
}

/// A [`Pie`] specialized to a millisecond-integer domain.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEstimate(pub Pie);

impl TimeEstimate {
    pub fn new(lower_ms: i64, upper_ms: i64, p: f64) -> Self {
        Self(Pie::new(lower_ms as f64, upper_ms as f64, p))
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 1.0)
    }

    pub fn minimum() -> Self {
        Self::new(1, 1, 1.0)
    }

    pub fn lower_ms(&self) -> i64 {
        self.0.lower.round() as i64
    }

    pub fn upper_ms(&self) -> i64 {
        self.0.upper.round() as i64
    }

    pub fn p(&self) -> f64 {
        self.0.p
    }

    pub fn plus(&self, other: &Self) -> Self {
        Self(self.0.plus(&other.0))
    }

    pub fn is_exactly(&self, v: i64) -> bool {
        self.0.is_exactly(v as f64)
    }
}

impl fmt::Display for TimeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}ms .. {}ms, p={:.1}%)",
            self.lower_ms(),
            self.upper_ms(),
            self.p() * 100.0
        )
    }
}

/// A [`Pie`] specialized to a non-negative-integer cardinality domain
/// (row/element counts of a channel).
#[derive(Debug, Clone, PartialEq)]
pub struct CardinalityEstimate(pub Pie);

impl CardinalityEstimate {
    pub fn new(lower: u64, upper: u64, p: f64) -> Self {
        Self(Pie::new(lower as f64, upper as f64, p))
    }

    pub fn from_pie(pie: Pie) -> Self {
        Self(pie)
    }

    pub fn lower(&self) -> u64 {
        self.0.lower.max(0.0).round() as u64
    }

    pub fn upper(&self) -> u64 {
        self.0.upper.max(0.0).round() as u64
    }

    pub fn p(&self) -> f64 {
        self.0.p
    }

    pub fn plus(&self, other: &Self) -> Self {
        Self(self.0.plus(&other.0))
    }

    pub fn times(&self, scalar: f64) -> Self {
        Self(self.0.times(scalar))
    }

    pub fn is_exactly(&self, v: u64) -> bool {
        self.0.is_exactly(v as f64)
    }
}

impl fmt::Display for CardinalityEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}..{} ~ {:.1}%)",
            self.lower(),
            self.upper(),
            self.p() * 100.0
        )
    }
}
