//! Dynamic accumulator over an RSA group.
//!
//! The accumulator is a constant-size commitment to a mutable set of byte
//! strings. Each member is represented by a deterministically derived prime
//! and holds a succinct witness of its membership; non-membership is
//! checkable through a Bezout identity over the running member product.
//! Insertions and deletions emit [`Change`] records that let witness
//! holders refresh their witnesses without rescanning the set.

#![warn(missing_docs)]

mod accum;
mod common;
mod update;

pub use self::{
    accum::{Accumulator, Config, MembershipWitness, Removal},
    common::{hash_to_prime, AccumulatorError},
    update::{update_all, Change},
};
