// fraction_coder/src/interval.rs

//! Partition of `[0, 1)` into one half-open interval per symbol.

use contracts::*;

use crate::error::{ArithmeticCodingError, Result};
use crate::probability::{ProbabilityModel, ALPHABET_SIZE};
use crate::rational::Fraction;

/// The interval `[start, start + delta)` assigned to `symbol`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    pub symbol: u8,
    pub start: Fraction,
    pub delta: Fraction,
}

impl Interval {
    pub fn end(&self) -> Fraction {
        &self.start + &self.delta
    }

    pub fn contains(&self, value: &Fraction) -> bool {
        &self.start <= value && value < &self.end()
    }
}

/// Static interval table shared by the encoder, decoder and container.
///
/// Intervals are stored in table order with strictly increasing starts; a
/// per-byte index gives constant-time lookup by symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTable {
    intervals: Vec<Interval>,
    index: [Option<usize>; ALPHABET_SIZE],
}

impl IntervalTable {
    /// Lays the model's probabilities out back to back, in model order.
    #[debug_ensures(ret.is_partition())]
    pub fn from_model(model: &ProbabilityModel) -> Self {
        let mut range_start = Fraction::zero();
        let mut intervals = Vec::with_capacity(model.len());
        for entry in model.entries() {
            let next_start = &range_start + &entry.probability;
            intervals.push(Interval {
                symbol: entry.symbol,
                start: range_start,
                delta: entry.probability.clone(),
            });
            range_start = next_start;
        }
        Self::with_index(intervals)
    }

    /// Rebuilds a table from its symbols and range starts, deriving each
    /// delta from the next start (and from `1` for the last interval).
    ///
    /// # Errors
    ///
    /// Returns `MalformedContainer` unless the starts begin at zero, increase
    /// strictly, stay below one, and every symbol appears once.
    pub fn from_starts(symbols: &[u8], starts: Vec<Fraction>) -> Result<Self> {
        if symbols.is_empty() || symbols.len() != starts.len() {
            return Err(ArithmeticCodingError::malformed(format!(
                "{} symbols but {} range starts",
                symbols.len(),
                starts.len()
            )));
        }
        if !starts[0].is_zero() {
            return Err(ArithmeticCodingError::malformed(format!(
                "first range starts at {} instead of 0",
                starts[0]
            )));
        }

        let one = Fraction::one();
        let mut seen = [false; ALPHABET_SIZE];
        let mut intervals = Vec::with_capacity(symbols.len());
        for (i, (&symbol, start)) in symbols.iter().zip(starts.iter()).enumerate() {
            if std::mem::replace(&mut seen[symbol as usize], true) {
                return Err(ArithmeticCodingError::malformed(format!(
                    "symbol {:#04x} listed twice",
                    symbol
                )));
            }
            let end = starts.get(i + 1).unwrap_or(&one);
            if end <= start {
                return Err(ArithmeticCodingError::malformed(format!(
                    "range start {} of symbol {:#04x} is not below {}",
                    start, symbol, end
                )));
            }
            intervals.push(Interval {
                symbol,
                start: start.clone(),
                delta: end - start,
            });
        }
        Ok(Self::with_index(intervals))
    }

    fn with_index(intervals: Vec<Interval>) -> Self {
        let mut index = [None; ALPHABET_SIZE];
        for (position, interval) in intervals.iter().enumerate() {
            index[interval.symbol as usize] = Some(position);
        }
        IntervalTable { intervals, index }
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn symbols(&self) -> impl Iterator<Item = u8> + '_ {
        self.intervals.iter().map(|interval| interval.symbol)
    }

    pub fn starts(&self) -> impl Iterator<Item = &Fraction> + '_ {
        self.intervals.iter().map(|interval| &interval.start)
    }

    pub fn last_start(&self) -> Option<&Fraction> {
        self.intervals.last().map(|interval| &interval.start)
    }

    /// The interval assigned to `symbol`, if it is part of the alphabet.
    pub fn lookup(&self, symbol: u8) -> Option<&Interval> {
        self.index[symbol as usize].map(|position| &self.intervals[position])
    }

    /// The interval with the greatest start not above `value`.
    ///
    /// Returns `None` when `value` lies outside `[0, 1)`.
    pub fn locate(&self, value: &Fraction) -> Option<&Interval> {
        if value.is_negative() || *value >= Fraction::one() {
            return None;
        }
        let position = self
            .intervals
            .partition_point(|interval| &interval.start <= value);
        position
            .checked_sub(1)
            .and_then(|position| self.intervals.get(position))
    }

    /// True when the intervals tile `[0, 1)` with no gap or overlap.
    pub fn is_partition(&self) -> bool {
        if self.intervals.is_empty() {
            return false;
        }
        let mut expected_start = Fraction::zero();
        for interval in &self.intervals {
            if interval.start != expected_start || !interval.delta.is_positive() {
                return false;
            }
            expected_start = interval.end();
        }
        expected_start == Fraction::one()
    }
}
