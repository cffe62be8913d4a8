//! Accumulator state, key generation, mutation and verification.

use std::fmt;

use num_bigint_dig::{BigInt, ModInverse, RandPrime};
use num_integer::Integer;
use num_traits::One;
use rand::RngCore;

use crate::common::{generator, hash_to_prime, powm, AccumulatorError};

/// Define the configuration parameters for the accumulator.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// The bit width of each secret prime factor. The public modulus is
    /// roughly twice as wide.
    pub factor_bits: usize,
}

/// A dynamic accumulator over an RSA group.
///
/// The accumulator is a single-writer object: [`add`](Self::add) and
/// [`remove`](Self::remove) mutate the commitment and the member product,
/// and must not be interleaved with each other or with queries against the
/// same instance. Witness refresh ([`crate::Change`]) does not touch the
/// accumulator and may run concurrently elsewhere.
#[derive(Clone)]
pub struct Accumulator {
    /// Public RSA modulus `N = p*q`.
    modulus: BigInt,
    /// Euler totient `(p-1)*(q-1)`, the deletion trapdoor.
    totient: BigInt,
    /// Current commitment `g^u mod N`.
    commit: BigInt,
    /// Exact product of the prime representatives of the present members.
    /// Never reduced mod the totient; the non-membership fallback depends
    /// on the unreduced value.
    product: BigInt,
}

/// A witness of one element's membership in an accumulator.
///
/// The witness issued by [`Accumulator::add`] is also the insertion
/// [`Change`](crate::Change) broadcast to the other witness holders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipWitness {
    /// The prime representative of the member element.
    pub prime: BigInt,
    /// The witness value, satisfying `witness^prime = commit (mod modulus)`.
    pub witness: BigInt,
    /// The modulus of the issuing accumulator.
    pub modulus: BigInt,
    /// The commitment the witness was issued against, or last refreshed to.
    pub commit: BigInt,
}

/// A record of one element's deletion, sufficient for witness holders to
/// refresh their witnesses against the new commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    /// The prime representative of the deleted element.
    pub prime: BigInt,
    /// The commitment after the deletion.
    pub accum: BigInt,
    /// The modulus of the issuing accumulator.
    pub modulus: BigInt,
}

impl Accumulator {
    /// Generate a fresh accumulator from two random primes of the
    /// configured width.
    ///
    /// The factors are redrawn until the totient is coprime with the
    /// generator. The supplied randomness must be cryptographically strong.
    pub fn generate(config: &Config, mut rng: impl RngCore) -> Result<Self, AccumulatorError> {
        // Factors of fewer than 4 bits could collide with the generator.
        if config.factor_bits < 4 {
            return Err(AccumulatorError::InvalidFactorBits);
        }
        let g = generator();
        loop {
            let p = BigInt::from(rng.gen_prime(config.factor_bits));
            let q = BigInt::from(rng.gen_prime(config.factor_bits));
            let totient = (&p - 1u32) * (&q - 1u32);
            if !totient.gcd(&g).is_one() {
                tracing::debug!("totient shares a factor with the generator, redrawing");
                continue;
            }
            tracing::debug!(
                modulus_bits = config.factor_bits * 2,
                "generated accumulator keys"
            );
            return Ok(Accumulator {
                modulus: p * q,
                totient,
                commit: g.clone(),
                product: BigInt::one(),
            });
        }
    }

    /// The public modulus the accumulator operates under.
    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    /// The current commitment to the accumulated set.
    pub fn commit(&self) -> &BigInt {
        &self.commit
    }

    /// Insert an element and return the witness proving its membership.
    ///
    /// The results are undefined if the element is already a member; use
    /// [`checked_add`](Self::checked_add) to reject duplicates.
    pub fn add(&mut self, v: &[u8]) -> MembershipWitness {
        let x = hash_to_prime(v);
        let w = self.commit.clone();
        self.product *= &x;
        self.commit = self.commit.modpow(&x, &self.modulus);
        MembershipWitness {
            prime: x,
            witness: w,
            modulus: self.modulus.clone(),
            commit: self.commit.clone(),
        }
    }

    /// Insert an element, rejecting duplicates.
    pub fn checked_add(&mut self, v: &[u8]) -> Result<MembershipWitness, AccumulatorError> {
        if self.includes(v) {
            return Err(AccumulatorError::DuplicateMember);
        }
        Ok(self.add(v))
    }

    /// Delete an element and return the removal record for witness holders.
    ///
    /// Deletion uses the totient trapdoor; holders of the public state
    /// alone cannot delete. The results are undefined if the element is
    /// not a member; use [`checked_remove`](Self::checked_remove) to
    /// reject missing members.
    pub fn remove(&mut self, v: &[u8]) -> Removal {
        let x = hash_to_prime(v);
        let inv = (&x)
            .mod_inverse(&self.totient)
            .expect("inversion failure");
        self.commit = self.commit.modpow(&inv, &self.modulus);
        // Exact by the membership precondition.
        self.product /= &x;
        Removal {
            prime: x,
            accum: self.commit.clone(),
            modulus: self.modulus.clone(),
        }
    }

    /// Delete an element, rejecting missing members.
    pub fn checked_remove(&mut self, v: &[u8]) -> Result<Removal, AccumulatorError> {
        if self.excludes(v) {
            return Err(AccumulatorError::MissingMember);
        }
        Ok(self.remove(v))
    }

    /// Report whether the witness is valid against the current commitment.
    pub fn verify(&self, witness: &MembershipWitness) -> bool {
        witness.modulus == self.modulus
            && witness.witness.modpow(&witness.prime, &self.modulus) == self.commit
    }

    /// Report whether the accumulator contains the element.
    pub fn includes(&self, v: &[u8]) -> bool {
        !self.excludes(v)
    }

    /// Report whether the accumulator does not contain the element.
    ///
    /// An element is absent exactly when its prime representative does not
    /// divide the member product. The check derives Bezout coefficients
    /// `a*u + b*x = 1` and tests the group identity
    /// `C^a = (g^-b)^x * g (mod N)`, which can only hold for coprime pairs.
    pub fn excludes(&self, v: &[u8]) -> bool {
        let x = hash_to_prime(v);
        let g = generator();

        let reduced = self.product.mod_floor(&self.totient);
        let bezout = reduced.extended_gcd(&x);
        let (a, b) = if bezout.gcd.is_one() && !self.product.is_multiple_of(&x) {
            (bezout.x, bezout.y)
        } else {
            // Reducing the product mod the totient can share a factor with
            // x, or hide one the full product contains. Recompute against
            // the unreduced product; for a member the identity then sums
            // to x rather than 1 and the check below fails.
            let bezout = self.product.extended_gcd(&x);
            (bezout.x, bezout.y.mod_floor(&self.totient))
        };

        let lhs = powm(&self.commit, &a, &self.modulus);
        // d = g^-b mod N
        let d = powm(&g, &-b, &self.modulus);
        let rhs = powm(&d, &x, &self.modulus) * &g % &self.modulus;
        lhs == rhs
    }
}

impl fmt::Debug for Accumulator {
    // The totient must never leave the accumulator, logs included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("modulus", &self.modulus)
            .field("commit", &self.commit)
            .finish_non_exhaustive()
    }
}
