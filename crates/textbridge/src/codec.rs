//! Numeric codec for arbitrary-precision integers.
//!
//! Host bigints cross the boundary in the narrowest form the engine can hold:
//! a signed 64-bit integer, else an unsigned 64-bit integer, else a sign plus
//! a list of 64-bit magnitude words, least-significant word first.
//!
//! Words are assembled through explicit little-endian byte conversion, so
//! the layout does not depend on the platform's byte order.
//!
//! ```rust
//! use num_bigint::BigInt;
//! use textbridge::codec::{self, EncodedInt};
//!
//! let n: BigInt = (BigInt::from(1) << 128usize) + BigInt::from(2);
//! let EncodedInt::Wide(words) = codec::encode(&n) else { unreachable!() };
//! assert_eq!(words.words, vec![2, 0, 1]);
//! assert_eq!(codec::decode(&words), n);
//! ```

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::ToPrimitive;

/// Sign and magnitude words of an integer wider than 64 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideWords {
    pub negative: bool,
    /// Magnitude, least-significant word first.
    pub words: Vec<u64>,
}

/// An integer in the narrowest engine form that holds it exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodedInt {
    Signed(i64),
    Unsigned(u64),
    Wide(WideWords),
}

impl EncodedInt {
    pub fn to_bigint(&self) -> BigInt {
        match self {
            EncodedInt::Signed(n) => BigInt::from(*n),
            EncodedInt::Unsigned(n) => BigInt::from(*n),
            EncodedInt::Wide(words) => decode(words),
        }
    }
}

/// Encodes a host bigint.
pub fn encode(n: &BigInt) -> EncodedInt {
    if let Some(signed) = n.to_i64() {
        return EncodedInt::Signed(signed);
    }
    if let Some(unsigned) = n.to_u64() {
        return EncodedInt::Unsigned(unsigned);
    }
    EncodedInt::Wide(WideWords {
        negative: n.sign() == Sign::Minus,
        words: n.magnitude().to_u64_digits(),
    })
}

/// Decodes sign and words back into a host bigint.
///
/// A zero magnitude decodes to zero whatever the sign flag says.
pub fn decode(words: &WideWords) -> BigInt {
    let bytes: Vec<u8> = words
        .words
        .iter()
        .flat_map(|word| word.to_le_bytes())
        .collect();
    let magnitude = BigUint::from_bytes_le(&bytes);
    let sign = if words.negative {
        Sign::Minus
    } else {
        Sign::Plus
    };
    BigInt::from_biguint(sign, magnitude)
}
