// fraction_coder/src/arithmetic_coding.rs

//! Whole-message arithmetic coding over exact fractions.
//!
//! The encoder narrows `[0, 1)` once per symbol using a fixed interval table
//! and keeps the lower bound of the final interval. The decoder inverts each
//! narrowing step in order. Nothing is renormalized, so the fraction grows
//! with the message.

use std::ops::ControlFlow;

use log::debug;

use crate::config::{CodingConfig, Progress, ProgressObserver, Stage};
use crate::error::{ArithmeticCodingError, Result};
use crate::interval::{Interval, IntervalTable};
use crate::rational::Fraction;

/// A complete encoding: the final fraction, the message length and the
/// table needed to invert it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage {
    pub fraction: Fraction,
    pub length: usize,
    pub table: IntervalTable,
}

/// Represents the state of the encoder: the current interval
/// `[start, start + delta)`.
#[derive(Debug, Clone)]
struct ArithmeticCoder {
    start: Fraction,
    delta: Fraction,
}

impl ArithmeticCoder {
    fn new() -> Self {
        ArithmeticCoder {
            start: Fraction::zero(),
            delta: Fraction::one(),
        }
    }

    /// Narrows the current interval to the sub-interval of `symbol`.
    fn narrow(&mut self, symbol: &Interval) {
        self.start = &self.start + &(&self.delta * &symbol.start);
        self.delta = &self.delta * &symbol.delta;
    }
}

/// Encodes `sequence` against a fixed `table`.
///
/// # Errors
///
/// * `EmptyInput` if `sequence` is empty.
/// * `MessageTooLong` if it exceeds `config.max_message_len`.
/// * `UnknownSymbol` if a byte has no interval in `table`.
/// * `Aborted` if the observer breaks.
pub fn arithmetic_encode(
    sequence: &[u8],
    table: IntervalTable,
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<EncodedMessage> {
    if sequence.is_empty() {
        return Err(ArithmeticCodingError::EmptyInput);
    }
    check_length(sequence.len(), config)?;

    let total = sequence.len();
    let interval = config.progress_interval.max(1);
    let mut coder = ArithmeticCoder::new();

    for (i, &byte) in sequence.iter().enumerate() {
        let symbol = table
            .lookup(byte)
            .ok_or(ArithmeticCodingError::UnknownSymbol(byte))?;
        coder.narrow(symbol);

        let processed = i + 1;
        if processed % interval == 0 && processed < total {
            report(observer, Stage::Encoding, processed, total)?;
        }
    }
    report(observer, Stage::Encoding, total, total)?;

    debug!(
        "encoded {} symbols into a fraction with a {}-bit denominator",
        total,
        coder.start.denom().bits()
    );
    Ok(EncodedMessage {
        fraction: coder.start,
        length: total,
        table,
    })
}

/// Regenerates the original bytes from an encoded message.
///
/// # Errors
///
/// * `MessageTooLong` if the declared length exceeds `config.max_message_len`.
/// * `Decode` if the residual fraction leaves `[0, 1)` or hits a zero-width interval.
/// * `Aborted` if the observer breaks.
pub fn arithmetic_decode(
    message: &EncodedMessage,
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<Vec<u8>> {
    let total = message.length;
    check_length(total, config)?;

    let interval = config.progress_interval.max(1);
    let mut fraction = message.fraction.clone();
    let mut decoded = Vec::with_capacity(total);

    for position in 0..total {
        let symbol = message
            .table
            .locate(&fraction)
            .ok_or_else(|| ArithmeticCodingError::Decode {
                position,
                reason: format!("fraction {} matches no interval", fraction),
            })?;
        decoded.push(symbol.symbol);

        fraction = (&fraction - &symbol.start)
            .checked_div(&symbol.delta)
            .ok_or_else(|| ArithmeticCodingError::Decode {
                position,
                reason: format!("symbol {:#04x} has an empty interval", symbol.symbol),
            })?;

        let processed = position + 1;
        if processed % interval == 0 && processed < total {
            report(observer, Stage::Decoding, processed, total)?;
        }
    }
    report(observer, Stage::Decoding, total, total)?;

    debug!("decoded {} symbols", total);
    Ok(decoded)
}

fn check_length(length: usize, config: &CodingConfig) -> Result<()> {
    if length > config.max_message_len {
        return Err(ArithmeticCodingError::MessageTooLong {
            length,
            limit: config.max_message_len,
        });
    }
    Ok(())
}

fn report(
    observer: &mut dyn FnMut(Progress) -> ControlFlow<()>,
    stage: Stage,
    processed: usize,
    total: usize,
) -> Result<()> {
    match observer(Progress {
        stage,
        processed,
        total,
    }) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(ArithmeticCodingError::Aborted { processed, total }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::Rng;

    use crate::config::no_progress;
    use crate::probability::ProbabilityModel;

    /// Helper function to generate random bytes over a small alphabet.
    fn generate_random_bytes(length: usize, alphabet: u8) -> Vec<u8> {
        let mut rng = rand::thread_rng();
        (0..length).map(|_| rng.gen_range(0..alphabet)).collect()
    }

    fn table_for(input: &[u8]) -> IntervalTable {
        IntervalTable::from_model(&ProbabilityModel::build(input).unwrap())
    }

    fn encode(input: &[u8]) -> EncodedMessage {
        arithmetic_encode(
            input,
            table_for(input),
            &CodingConfig::default(),
            &mut no_progress,
        )
        .unwrap()
    }

    fn decode(message: &EncodedMessage) -> Vec<u8> {
        arithmetic_decode(message, &CodingConfig::default(), &mut no_progress).unwrap()
    }

    fn frac(numer: u64, denom: u64) -> Fraction {
        Fraction::ratio(numer, denom).unwrap()
    }

    #[test]
    fn test_arithmetic_encode_decode() {
        let input = b"abracadabra";
        let message = encode(input);
        assert_eq!(message.length, input.len());
        assert_eq!(decode(&message), input.to_vec());
    }

    #[test]
    fn test_single_symbol_encodes_to_zero() {
        let input = [0x41u8; 10];
        let message = encode(&input);
        assert_eq!(message.fraction, Fraction::zero());
        assert_eq!(message.length, 10);
        assert_eq!(decode(&message), input.to_vec());
    }

    #[test]
    fn test_two_symbol_fraction() {
        // Table: A -> [0, 1/2), B -> [1/2, 1).
        let message = encode(b"AAAB");
        assert_eq!(message.fraction, frac(1, 16));
        assert_eq!(decode(&message), b"AAAB".to_vec());
    }

    #[test]
    fn test_empty_encode_rejected() {
        let result = arithmetic_encode(
            &[],
            table_for(b"A"),
            &CodingConfig::default(),
            &mut no_progress,
        );
        assert!(matches!(result, Err(ArithmeticCodingError::EmptyInput)));
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let result = arithmetic_encode(
            b"AB",
            table_for(b"A"),
            &CodingConfig::default(),
            &mut no_progress,
        );
        assert!(matches!(
            result,
            Err(ArithmeticCodingError::UnknownSymbol(b'B'))
        ));
    }

    #[test]
    fn test_decode_rejects_fraction_outside_unit_interval() {
        let mut message = encode(b"AABC");
        message.fraction = Fraction::one();
        let result = arithmetic_decode(&message, &CodingConfig::default(), &mut no_progress);
        assert!(matches!(
            result,
            Err(ArithmeticCodingError::Decode { position: 0, .. })
        ));
    }

    #[test]
    fn test_decode_length_limit() {
        let mut message = encode(b"AABC");
        message.length = 1_000;
        let config = CodingConfig {
            max_message_len: 100,
            ..CodingConfig::default()
        };
        let result = arithmetic_decode(&message, &config, &mut no_progress);
        assert!(matches!(
            result,
            Err(ArithmeticCodingError::MessageTooLong {
                length: 1_000,
                limit: 100
            })
        ));
    }

    #[test]
    fn test_progress_reports_and_abort() {
        let input = generate_random_bytes(100, 4);
        let config = CodingConfig {
            progress_interval: 10,
            ..CodingConfig::default()
        };

        let mut reports = Vec::new();
        let mut record = |progress: Progress| {
            reports.push(progress.processed);
            ControlFlow::Continue(())
        };
        arithmetic_encode(&input, table_for(&input), &config, &mut record).unwrap();
        assert_eq!(reports, (1..=10).map(|i| i * 10).collect::<Vec<_>>());

        let mut stop_early = |progress: Progress| {
            if progress.processed >= 30 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };
        let result = arithmetic_encode(&input, table_for(&input), &config, &mut stop_early);
        assert!(matches!(
            result,
            Err(ArithmeticCodingError::Aborted {
                processed: 30,
                total: 100
            })
        ));
    }

    #[test]
    fn test_interval_narrows_monotonically() {
        let input = generate_random_bytes(512, 7);
        let table = table_for(&input);
        let mut coder = ArithmeticCoder::new();
        for &byte in &input {
            let previous = coder.clone();
            coder.narrow(table.lookup(byte).unwrap());
            assert!(coder.start >= previous.start);
            assert!(coder.delta <= previous.delta);
            assert!(&coder.start + &coder.delta <= &previous.start + &previous.delta);
        }
        assert!(!coder.start.is_negative());
        assert!(coder.start < Fraction::one());
    }

    #[test]
    fn test_distinct_messages_map_to_distinct_fractions() {
        let table = table_for(b"AABC");
        let messages: [&[u8]; 4] = [b"ABCA", b"ABAC", b"CABA", b"AAAA"];
        let fractions: Vec<Fraction> = messages
            .iter()
            .map(|message| {
                arithmetic_encode(
                    message,
                    table.clone(),
                    &CodingConfig::default(),
                    &mut no_progress,
                )
                .unwrap()
                .fraction
            })
            .collect();
        for i in 0..fractions.len() {
            for j in (i + 1)..fractions.len() {
                assert_ne!(fractions[i], fractions[j]);
            }
        }
    }

    #[test]
    fn test_arithmetic_encode_decode_random() {
        let input = generate_random_bytes(2048, 26);
        let message = encode(&input);
        assert_eq!(decode(&message), input);
    }

    proptest! {
        #[test]
        fn test_arithmetic_encode_decode_prop(
            input in proptest::collection::vec(any::<u8>(), 1usize..=256)
        ) {
            let message = encode(&input);
            prop_assert!(!message.fraction.is_negative());
            prop_assert!(message.fraction < Fraction::one());
            prop_assert_eq!(decode(&message), input);
        }
    }
}
