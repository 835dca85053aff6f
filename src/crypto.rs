//! Utilities for cryptographic operations.

use ring::digest::{digest, Digest, SHA256};

/// Hashes the input using SHA-256.
fn hash_without_salt<T: AsRef<[u8]> + ?Sized>(bytes: &T) -> Digest {
    digest(&SHA256, bytes.as_ref())
}

/// Returns whether two secrets are byte-for-byte equal.
///
/// Only the secrets' SHA-256 digests are compared, so the comparison's timing can't reveal how much
/// of a guess matches the real secret, or how long the real secret is.
pub(crate) fn secrets_match<A, B>(a: &A, b: &B) -> bool
where
    A: AsRef<[u8]> + ?Sized,
    B: AsRef<[u8]> + ?Sized,
{
    hash_without_salt(a).as_ref() == hash_without_salt(b).as_ref()
}
