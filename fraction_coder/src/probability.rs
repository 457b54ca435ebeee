// fraction_coder/src/probability.rs

//! Static probability model with power-of-two quantization.
//!
//! The model is built once from the whole input: empirical frequencies are
//! floored to negative powers of two, then the leftover mass ("stock") is
//! handed back by doubling entries until the probabilities sum to exactly one.

use contracts::*;
use log::{debug, trace};
use ndarray::Array1;

use crate::error::{ArithmeticCodingError, Result};
use crate::rational::Fraction;

/// Number of distinct byte values.
pub const ALPHABET_SIZE: usize = 256;

/// A symbol paired with its coding probability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolProbability {
    pub symbol: u8,
    pub probability: Fraction,
}

/// Quantized probabilities for every symbol of a message, ordered by
/// descending empirical probability (ties by ascending symbol value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbabilityModel {
    entries: Vec<SymbolProbability>,
}

impl ProbabilityModel {
    /// Builds the quantized model for `input`.
    ///
    /// # Errors
    ///
    /// * `EmptyInput` if `input` has no bytes.
    /// * `QuantizationExhausted` if stock redistribution stalls.
    #[debug_ensures(ret.as_ref().map_or(true, |model| model.total() == Fraction::one()))]
    pub fn build(input: &[u8]) -> Result<Self> {
        let mut entries = empirical_probabilities(input)?;
        for entry in entries.iter_mut() {
            entry.probability = floor_quantize(&entry.probability).ok_or_else(|| {
                ArithmeticCodingError::QuantizationExhausted {
                    stock: entry.probability.to_string(),
                }
            })?;
        }
        let steps = redistribute_stock(&mut entries)?;
        debug!(
            "built model: {} symbols over {} bytes, {} redistribution steps",
            entries.len(),
            input.len(),
            steps
        );
        Ok(ProbabilityModel { entries })
    }

    pub fn entries(&self) -> &[SymbolProbability] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all coding probabilities.
    pub fn total(&self) -> Fraction {
        self.entries.iter().map(|entry| &entry.probability).sum()
    }
}

/// Counts occurrences of every byte value.
pub fn symbol_counts(input: &[u8]) -> Array1<u64> {
    let mut counts = Array1::<u64>::zeros(ALPHABET_SIZE);
    for &byte in input {
        counts[byte as usize] += 1;
    }
    counts
}

/// Exact empirical probabilities `count / len`, sorted by descending
/// probability with ties broken by ascending symbol value.
pub fn empirical_probabilities(input: &[u8]) -> Result<Vec<SymbolProbability>> {
    if input.is_empty() {
        return Err(ArithmeticCodingError::EmptyInput);
    }
    let counts = symbol_counts(input);
    let mut present: Vec<(u8, u64)> = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(symbol, &count)| (symbol as u8, count))
        .collect();
    present.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let total = input.len() as u64;
    present
        .into_iter()
        .map(|(symbol, count)| {
            Fraction::ratio(count, total)
                .map(|probability| SymbolProbability {
                    symbol,
                    probability,
                })
                .ok_or(ArithmeticCodingError::EmptyInput)
        })
        .collect()
}

/// The largest power of two not greater than `probability`, i.e.
/// `2^floor(log2(p))`. Returns `None` for non-positive values.
#[debug_ensures(ret.as_ref().map_or(true, |quantized| quantized <= probability))]
pub fn floor_quantize(probability: &Fraction) -> Option<Fraction> {
    probability.floor_log2().map(Fraction::pow2)
}

/// Doubles entries until the probabilities sum to one, returning the
/// number of doubling steps taken.
///
/// Each step takes `stock = 1 - sum`, floors it to a power of two and doubles
/// the first entry (in table order) whose probability does not exceed it.
///
/// # Errors
///
/// Returns `QuantizationExhausted` if no entry qualifies while stock remains.
pub fn redistribute_stock(entries: &mut [SymbolProbability]) -> Result<usize> {
    let one = Fraction::one();
    let mut sum: Fraction = entries.iter().map(|entry| &entry.probability).sum();
    let mut steps = 0;

    while sum < one {
        let stock = &one - &sum;
        let exhausted = || ArithmeticCodingError::QuantizationExhausted {
            stock: stock.to_string(),
        };
        let stock_floor = floor_quantize(&stock).ok_or_else(exhausted)?;
        let entry = entries
            .iter_mut()
            .find(|entry| entry.probability <= stock_floor)
            .ok_or_else(exhausted)?;

        trace!(
            "stock {}: doubling symbol {:#04x} from {}",
            stock,
            entry.symbol,
            entry.probability
        );
        sum = &sum + &entry.probability;
        entry.probability = &entry.probability + &entry.probability;
        steps += 1;
    }

    if sum > one {
        return Err(ArithmeticCodingError::QuantizationExhausted {
            stock: (&one - &sum).to_string(),
        });
    }
    Ok(steps)
}
