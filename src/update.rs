//! Witness refresh against accumulator changes.

use num_integer::Integer;
use num_traits::One;

use crate::accum::{MembershipWitness, Removal};
use crate::common::{powm, AccumulatorError};

/// A state transition of an accumulator, broadcast to witness holders.
///
/// An insertion reuses the new member's witness as its payload; a deletion
/// carries the deleted prime and the new commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// An element was inserted. The payload is the witness issued for it.
    Insertion(MembershipWitness),
    /// An element was deleted.
    Removal(Removal),
}

impl From<MembershipWitness> for Change {
    fn from(witness: MembershipWitness) -> Self {
        Change::Insertion(witness)
    }
}

impl From<Removal> for Change {
    fn from(removal: Removal) -> Self {
        Change::Removal(removal)
    }
}

impl MembershipWitness {
    /// Apply a change to this witness so it verifies against the
    /// commitment that followed the change.
    ///
    /// The witness' snapshot commitment is refreshed to the change's
    /// commitment. Refreshing is pure with respect to the accumulator;
    /// distinct witnesses may be updated in parallel. Applying the removal
    /// of this witness' own member fails with
    /// [`AccumulatorError::MemberRemoved`], as no valid witness exists
    /// after that point.
    pub fn apply(&mut self, change: &Change) -> Result<(), AccumulatorError> {
        match change {
            Change::Insertion(inserted) => {
                self.apply_insertion(inserted);
                Ok(())
            }
            Change::Removal(removal) => self.apply_removal(removal),
        }
    }

    /// The new commitment is `C^x`; raising the witness by the same prime
    /// keeps it consistent.
    pub(crate) fn apply_insertion(&mut self, inserted: &MembershipWitness) {
        self.witness = self.witness.modpow(&inserted.prime, &self.modulus);
        self.commit = inserted.commit.clone();
    }

    fn apply_removal(&mut self, removal: &Removal) -> Result<(), AccumulatorError> {
        // Distinct representatives are distinct primes, so the Bezout
        // identity a*x_w + b*x_r = 1 exists whenever the removal concerns
        // another member.
        let bezout = self.prime.extended_gcd(&removal.prime);
        if !bezout.gcd.is_one() {
            return Err(AccumulatorError::MemberRemoved);
        }
        // w' = A^a * w^b mod N, so that w'^x_w = A.
        let lhs = powm(&removal.accum, &bezout.x, &self.modulus);
        let rhs = powm(&self.witness, &bezout.y, &self.modulus);
        self.witness = lhs * rhs % &self.modulus;
        self.commit = removal.accum.clone();
        Ok(())
    }
}

/// Bring a sequence of witnesses up to date with one another, in place.
///
/// The witnesses must have been issued in insertion order against the same
/// accumulator, with no intervening deletions. Each witness absorbs every
/// later insertion; the final witness is already current and is left
/// untouched. Upon return every witness verifies against the commitment
/// following the last insertion. Cost is quadratic in the number of
/// witnesses.
pub fn update_all(witnesses: &mut [MembershipWitness]) {
    for split in 1..witnesses.len() {
        let (head, tail) = witnesses.split_at_mut(split);
        let witness = &mut head[split - 1];
        for inserted in tail.iter() {
            witness.apply_insertion(inserted);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::{update_all, Change};
    use crate::accum::{Accumulator, Config, MembershipWitness};
    use crate::common::AccumulatorError;

    const TEST_CONFIG: Config = Config { factor_bits: 64 };

    #[test]
    fn insertion_change_refreshes_witness() {
        let mut acc = Accumulator::generate(&TEST_CONFIG, thread_rng()).unwrap();

        let mut first = acc.add(b"first member");
        assert!(acc.verify(&first));

        let second = acc.add(b"second member");
        assert!(!acc.verify(&first), "expected the witness to go stale");

        first.apply(&Change::Insertion(second)).unwrap();
        assert!(acc.verify(&first));
        assert_eq!(&first.commit, acc.commit());
    }

    #[test]
    fn removal_change_refreshes_witness() {
        let mut acc = Accumulator::generate(&TEST_CONFIG, thread_rng()).unwrap();

        let mut wits = vec![acc.add(b"first member"), acc.add(b"second member")];
        update_all(&mut wits);

        let removal = acc.remove(b"second member");
        let mut first = wits.swap_remove(0);
        first.apply(&Change::Removal(removal)).unwrap();
        assert!(acc.verify(&first));
        assert_eq!(&first.commit, acc.commit());
    }

    #[test]
    fn removal_of_own_member_is_rejected() {
        let mut acc = Accumulator::generate(&TEST_CONFIG, thread_rng()).unwrap();

        let mut wits = vec![acc.add(b"first member"), acc.add(b"second member")];
        update_all(&mut wits);

        let removal = acc.remove(b"second member");
        let err = wits[1].apply(&Change::Removal(removal)).unwrap_err();
        assert_eq!(err, AccumulatorError::MemberRemoved);
    }

    #[test]
    fn update_all_handles_trivial_sequences() {
        let mut none: Vec<MembershipWitness> = Vec::new();
        update_all(&mut none);

        let mut acc = Accumulator::generate(&TEST_CONFIG, thread_rng()).unwrap();
        let mut single = vec![acc.add(b"only member")];
        update_all(&mut single);
        assert!(acc.verify(&single[0]));
    }

    #[test]
    fn changes_convert_from_payloads() {
        let mut acc = Accumulator::generate(&TEST_CONFIG, thread_rng()).unwrap();

        let witness = acc.add(b"member");
        assert!(matches!(Change::from(witness), Change::Insertion(_)));
        let removal = acc.remove(b"member");
        assert!(matches!(Change::from(removal), Change::Removal(_)));
    }
}
