// fraction_coder/src/lib.rs

//! Static Arithmetic Coding Library
//!
//! This library compresses a whole buffer into a single exact fraction. A
//! probability model is computed once over the input, every probability is
//! quantized to a power of two, and the message is encoded as the lower bound
//! of its nested sub-interval of `[0, 1)`. The fraction, the message length and
//! the interval table are stored in a compact self-describing container.
//!
//! The fraction grows with the message, so inputs are expected to fit in
//! memory comfortably.

pub mod arithmetic_coding;
pub mod config;
pub mod container;
pub mod error;
pub mod file;
pub mod interval;
pub mod probability;
pub mod rational;

use crate::config::no_progress;

pub use arithmetic_coding::{arithmetic_decode, arithmetic_encode, EncodedMessage};
pub use config::{CodingConfig, Progress, ProgressObserver, Stage};
pub use container::{read_container, write_container};
pub use error::{ArithmeticCodingError, Result};
pub use file::{compress_file, decompress_file, FileReport};
pub use interval::{Interval, IntervalTable};
pub use probability::{ProbabilityModel, SymbolProbability};
pub use rational::Fraction;

/// Compresses `input` into container bytes with the default configuration.
///
/// # Examples
///
/// ```
/// let packed = fraction_coder::compress(b"abracadabra").unwrap();
/// let unpacked = fraction_coder::decompress(&packed).unwrap();
/// assert_eq!(unpacked, b"abracadabra");
/// ```
pub fn compress(input: &[u8]) -> Result<Vec<u8>> {
    compress_with(input, &CodingConfig::default(), &mut no_progress)
}

/// Restores the bytes stored in a container produced by [`compress`].
pub fn decompress(container: &[u8]) -> Result<Vec<u8>> {
    decompress_with(container, &CodingConfig::default(), &mut no_progress)
}

/// Compresses `input`, reporting progress to `observer`.
///
/// # Errors
///
/// * `EmptyInput` if `input` is empty.
/// * `MessageTooLong` if `input` exceeds `config.max_message_len`.
/// * `Aborted` if the observer breaks.
pub fn compress_with(
    input: &[u8],
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<Vec<u8>> {
    let model = ProbabilityModel::build(input)?;
    let table = IntervalTable::from_model(&model);
    let message = arithmetic_encode(input, table, config, observer)?;
    write_container(&message)
}

/// Decompresses `container`, reporting progress to `observer`.
///
/// # Errors
///
/// * `MalformedContainer` if the bytes do not follow the container layout.
/// * `MessageTooLong` if the declared length exceeds `config.max_message_len`.
/// * `Decode` if the fraction matches no interval.
/// * `Aborted` if the observer breaks.
pub fn decompress_with(
    container: &[u8],
    config: &CodingConfig,
    observer: ProgressObserver<'_>,
) -> Result<Vec<u8>> {
    let message = read_container(container)?;
    arithmetic_decode(&message, config, observer)
}
