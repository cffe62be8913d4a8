//! Shared primitives: error type, generator, hash-to-prime, exponentiation.

use std::fmt;

use num_bigint_dig::{prime::probably_prime, BigInt, BigUint, ModInverse};
use num_traits::Signed;
use sha2::{Digest, Sha256};

/// Fixed generator of the accumulator group.
///
/// Part of the wire-visible construction: changing it invalidates every
/// witness issued by earlier versions.
const GENERATOR: u32 = 3;

/// Length of the truncated digest a prime candidate is drawn from.
const CANDIDATE_BYTES: usize = 16;

/// Miller-Rabin rounds applied to each prime candidate.
const PRIMALITY_ROUNDS: usize = 20;

/// Possible error cases from accumulator usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorError {
    /// The requested factor width cannot produce a usable modulus.
    InvalidFactorBits,
    /// The element is already a member of the accumulator.
    DuplicateMember,
    /// The element is not a member of the accumulator.
    MissingMember,
    /// The change removes this witness' member and cannot be applied.
    MemberRemoved,
}

impl fmt::Display for AccumulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self, f)
    }
}

impl std::error::Error for AccumulatorError {}

pub(crate) fn generator() -> BigInt {
    BigInt::from(GENERATOR)
}

/// Map an element's byte encoding to its prime representative.
///
/// The mapping is deterministic and independent of any accumulator
/// instance: the first 16 bytes of `SHA-256([nonce || v])` are read as a
/// big-endian integer for `nonce = 0, 1, 2, …` (4 bytes, little-endian)
/// until a candidate passes the primality test. The final digest byte is
/// forced odd, so even candidates are never trialed.
pub fn hash_to_prime(v: &[u8]) -> BigInt {
    let mut buf = vec![0u8; 4 + v.len()];
    buf[4..].copy_from_slice(v);
    for nonce in 0..u32::MAX {
        buf[..4].copy_from_slice(&nonce.to_le_bytes());
        let candidate = BigUint::from_bytes_be(&candidate_digest(&buf));
        if probably_prime(&candidate, PRIMALITY_ROUNDS) {
            tracing::trace!(nonce, "mapped element to prime representative");
            return candidate.into();
        }
    }
    unreachable!("no prime representative in the 32-bit nonce space");
}

/// First 16 bytes of SHA-256 with the low bit of the final byte set.
fn candidate_digest(buf: &[u8]) -> [u8; CANDIDATE_BYTES] {
    let digest = Sha256::digest(buf);
    let mut out = [0u8; CANDIDATE_BYTES];
    out.copy_from_slice(&digest[..CANDIDATE_BYTES]);
    out[CANDIDATE_BYTES - 1] |= 1;
    out
}

/// Modular exponentiation accepting signed exponents.
///
/// A negative exponent inverts the base first, so the base must be a unit
/// of the group. This does not fail for accumulator values, which are
/// powers of the generator.
pub(crate) fn powm(base: &BigInt, exp: &BigInt, modulus: &BigInt) -> BigInt {
    if exp.is_negative() {
        let inv = base.mod_inverse(modulus).expect("inversion failure");
        inv.modpow(&-exp, modulus)
    } else {
        base.modpow(exp, modulus)
    }
}

#[cfg(test)]
mod tests {
    use num_bigint_dig::{prime::probably_prime, BigInt};
    use num_integer::Integer;
    use num_traits::One;

    use super::{hash_to_prime, powm};

    #[test]
    fn prime_mapping_is_deterministic() {
        for i in 0u64..16 {
            let first = hash_to_prime(&i.to_le_bytes());
            let second = hash_to_prime(&i.to_le_bytes());
            assert_eq!(first, second, "#{i}: expected a stable mapping");
        }
    }

    #[test]
    fn prime_mapping_yields_odd_primes() {
        for i in 0u64..32 {
            let p = hash_to_prime(&i.to_le_bytes());
            assert!(p.is_odd(), "#{i}: expected an odd representative");
            assert!(p.bits() <= 128, "#{i}: expected at most 128 bits");
            let probe = p.to_biguint().expect("representative is positive");
            assert!(probably_prime(&probe, 64), "#{i}: expected a prime");
        }
    }

    #[test]
    fn distinct_elements_map_to_distinct_primes() {
        let primes: Vec<_> = (0u64..64).map(|i| hash_to_prime(&i.to_le_bytes())).collect();
        for (i, p) in primes.iter().enumerate() {
            for q in &primes[i + 1..] {
                assert_ne!(p, q);
            }
        }
    }

    #[test]
    fn negative_exponents_invert() {
        let modulus = BigInt::from(101);
        let base = BigInt::from(5);
        let pos = powm(&base, &BigInt::from(3), &modulus);
        let neg = powm(&base, &BigInt::from(-3), &modulus);
        assert!((pos * neg % &modulus).is_one());
    }
}
