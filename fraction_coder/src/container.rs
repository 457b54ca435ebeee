// fraction_coder/src/container.rs

//! Self-describing binary container for an [`EncodedMessage`].
//!
//! All integers are big-endian and use the fewest bytes that hold them; each
//! width ("precision") is itself written before the field it describes.
//!
//! ```text
//! u8                         symbol count - 1
//! [u8; count]                symbols, in table order
//! u8                         range-start precision P
//! [[u8; P]; count]           range starts scaled by 2^(8P)
//! u8, [u8; L]                length precision L, message length
//! u8, [u8; Q], [u8; N]       numerator precision width Q, numerator
//!                            precision N, fraction scaled by 2^(8N)
//! ```

use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::arithmetic_coding::EncodedMessage;
use crate::error::{ArithmeticCodingError, Result};
use crate::interval::IntervalTable;
use crate::probability::ALPHABET_SIZE;
use crate::rational::Fraction;

/// Largest width a one-byte precision field can declare.
const MAX_FIELD_WIDTH: usize = u8::MAX as usize;

/// Minimum number of bytes needed to hold `value`; zero needs none.
pub fn precision(value: &BigUint) -> usize {
    ((value.bits() + 7) / 8) as usize
}

/// Serializes `message` into container bytes.
///
/// # Errors
///
/// Returns `MalformedContainer` if the message cannot be expressed in the
/// layout: an empty or oversized table, non-dyadic boundaries or fraction,
/// or a field wider than its precision byte allows.
pub fn write_container(message: &EncodedMessage) -> Result<Vec<u8>> {
    let table = &message.table;
    if table.is_empty() || table.len() > ALPHABET_SIZE {
        return Err(ArithmeticCodingError::malformed(format!(
            "cannot store a table of {} symbols",
            table.len()
        )));
    }

    let mut out = Vec::new();
    out.push((table.len() - 1) as u8);
    out.extend(table.symbols());

    let start_width = range_start_precision(table)?;
    out.push(start_width as u8);
    for start in table.starts() {
        let normalized = normalize_exact(start, start_width)?;
        write_int(&mut out, &normalized, start_width)?;
    }

    let length = BigUint::from(message.length);
    let length_width = precision(&length);
    out.push(length_width as u8);
    write_int(&mut out, &length, length_width)?;

    let (numerator_width, normalized) = normalize_fraction(&message.fraction)?;
    let width_value = BigUint::from(numerator_width);
    let width_width = precision(&width_value);
    check_width(width_width, "numerator precision")?;
    out.push(width_width as u8);
    write_int(&mut out, &width_value, width_width)?;
    write_int(&mut out, &normalized, numerator_width)?;

    debug!(
        "wrote container: {} symbols, start precision {}, length precision {}, numerator precision {} ({} bytes)",
        table.len(),
        start_width,
        length_width,
        numerator_width,
        out.len()
    );
    Ok(out)
}

/// Parses container bytes back into an [`EncodedMessage`].
///
/// # Errors
///
/// Returns `MalformedContainer` if a field runs past the end of `bytes`,
/// a declared width or length is inconsistent, the interval table is not a
/// valid partition, or bytes remain after the fraction.
pub fn read_container(bytes: &[u8]) -> Result<EncodedMessage> {
    let mut reader = ByteReader::new(bytes);

    let count = reader.read_u8("symbol count")? as usize + 1;
    let symbols = reader.read_bytes(count, "symbols")?.to_vec();

    let start_width = reader.read_u8("range-start precision")? as usize;
    let mut starts = Vec::with_capacity(count);
    for _ in 0..count {
        let normalized = reader.read_uint(start_width, "range start")?;
        starts.push(Fraction::dyadic(normalized, 8 * start_width as u64));
    }
    let table = IntervalTable::from_starts(&symbols, starts)?;

    let length_width = reader.read_u8("length precision")? as usize;
    let length = reader
        .read_uint(length_width, "message length")?
        .to_usize()
        .ok_or_else(|| ArithmeticCodingError::malformed("message length does not fit in memory"))?;

    let width_width = reader.read_u8("numerator precision width")? as usize;
    let numerator_width = reader.read_uint(width_width, "numerator precision")?;
    let numerator_width = numerator_width
        .to_usize()
        .filter(|&width| width <= reader.remaining())
        .ok_or_else(|| {
            ArithmeticCodingError::malformed(format!(
                "numerator precision {} exceeds the {} remaining bytes",
                numerator_width,
                reader.remaining()
            ))
        })?;
    let normalized = reader.read_uint(numerator_width, "numerator")?;
    let fraction = Fraction::dyadic(normalized, 8 * numerator_width as u64);

    reader.finish()?;
    debug!(
        "read container: {} symbols, length {}, numerator precision {}",
        count, length, numerator_width
    );
    Ok(EncodedMessage {
        fraction,
        length,
        table,
    })
}

/// Width that represents every range start exactly. Derived from the
/// denominator of the last interval's width, which is the finest one because
/// quantized probabilities never increase along the table.
fn range_start_precision(table: &IntervalTable) -> Result<usize> {
    let last_start = table
        .last_start()
        .ok_or_else(|| ArithmeticCodingError::malformed("empty interval table"))?;
    let last_delta = &Fraction::one() - last_start;
    let finest = table
        .starts()
        .map(|start| start.denom())
        .chain(std::iter::once(last_delta.denom()))
        .max()
        .and_then(|denom| denom.to_biguint())
        .ok_or_else(|| ArithmeticCodingError::malformed("empty interval table"))?;
    let width = precision(&finest);
    check_width(width, "range-start precision")?;
    trace!("range starts use {} bytes (finest denominator {})", width, finest);
    Ok(width)
}

/// `value * 2^(8 * width)`, which must be a non-negative integer.
fn normalize_exact(value: &Fraction, width: usize) -> Result<BigUint> {
    let bits = 8 * width as u64;
    let scaled = value.scaled_floor(bits);
    let normalized = scaled
        .to_biguint()
        .ok_or_else(|| ArithmeticCodingError::malformed(format!("negative value {}", value)))?;
    if Fraction::dyadic(normalized.clone(), bits) != *value {
        return Err(ArithmeticCodingError::malformed(format!(
            "{} is not representable in {} bytes",
            value, width
        )));
    }
    Ok(normalized)
}

/// Chooses the numerator precision for the final fraction and returns it
/// with the scaled numerator.
///
/// The width is one byte more than the reduced numerator needs, widened
/// when the denominator `2^k` needs more than that to stay exact.
fn normalize_fraction(fraction: &Fraction) -> Result<(usize, BigUint)> {
    if fraction.is_negative() || *fraction >= Fraction::one() {
        return Err(ArithmeticCodingError::malformed(format!(
            "fraction {} lies outside [0, 1)",
            fraction
        )));
    }
    let exponent = fraction.denom_log2().ok_or_else(|| {
        ArithmeticCodingError::malformed(format!("fraction {} is not dyadic", fraction))
    })?;
    let numerator = fraction
        .numer()
        .to_biguint()
        .unwrap_or_else(BigUint::zero);
    let exact_width = ((exponent + 7) / 8) as usize;
    let width = (precision(&numerator) + 1).max(exact_width);
    let normalized = normalize_exact(fraction, width)?;
    trace!(
        "fraction denominator 2^{} stored with numerator precision {}",
        exponent,
        width
    );
    Ok((width, normalized))
}

fn check_width(width: usize, field: &str) -> Result<()> {
    if width > MAX_FIELD_WIDTH {
        return Err(ArithmeticCodingError::malformed(format!(
            "{} of {} bytes does not fit in one byte",
            field, width
        )));
    }
    Ok(())
}

/// Appends `value` big-endian, left-padded to exactly `width` bytes.
fn write_int(out: &mut Vec<u8>, value: &BigUint, width: usize) -> Result<()> {
    let needed = precision(value);
    if needed > width {
        return Err(ArithmeticCodingError::malformed(format!(
            "value needs {} bytes but its field holds {}",
            needed, width
        )));
    }
    out.extend(std::iter::repeat(0u8).take(width - needed));
    if needed > 0 {
        out.extend(value.to_bytes_be());
    }
    Ok(())
}

/// Cursor over container bytes that reports short reads as malformed input.
struct ByteReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        ByteReader { bytes, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn read_bytes(&mut self, count: usize, field: &str) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(ArithmeticCodingError::malformed(format!(
                "{} at offset {} needs {} bytes but only {} remain",
                field,
                self.position,
                count,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.position..self.position + count];
        self.position += count;
        Ok(slice)
    }

    fn read_u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.read_bytes(1, field)?[0])
    }

    fn read_uint(&mut self, width: usize, field: &str) -> Result<BigUint> {
        let slice = self.read_bytes(width, field)?;
        Ok(BigUint::from_bytes_be(slice))
    }

    fn finish(&self) -> Result<()> {
        if self.remaining() > 0 {
            return Err(ArithmeticCodingError::malformed(format!(
                "{} trailing bytes after the fraction",
                self.remaining()
            )));
        }
        Ok(())
    }
}
