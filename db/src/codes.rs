//! Short human-enterable codes: session check-in codes and classroom join codes.
//!
//! These are convenience secrets scoped to a session's open window, not
//! credentials against a global adversary. What matters is that they are easy
//! to read aloud, unique where required, and compared without leaking where a
//! guess first diverges.

use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Uppercase letters and digits only, so codes survive being read aloud or
/// scribbled on a whiteboard.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a session check-in code.
pub const SESSION_CODE_LEN: usize = 4;

/// Length of a classroom join code.
pub const JOIN_CODE_LEN: usize = 6;

/// How many fresh draws to attempt before reporting the space exhausted.
pub const MAX_CODE_ATTEMPTS: usize = 32;

/// Draws a random code of `len` characters from [`CODE_ALPHABET`].
pub fn generate(len: usize) -> String {
    let mut rng = OsRng;
    (0..len)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Canonical form of a submitted code: surrounding whitespace dropped,
/// uppercased. Stored codes are already canonical.
pub fn normalize(submitted: &str) -> String {
    submitted.trim().to_ascii_uppercase()
}

/// Compares a submitted code against the stored one in constant time with
/// respect to content. Code length is public, so mismatched lengths may
/// reject immediately.
pub fn matches(submitted: &str, actual: &str) -> bool {
    let submitted = normalize(submitted);
    submitted.as_bytes().ct_eq(actual.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn generated_codes_use_the_alphabet() {
        for _ in 0..50 {
            let code = generate(SESSION_CODE_LEN);
            assert_eq!(code.len(), SESSION_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }

    #[test]
    fn join_codes_are_longer_than_session_codes() {
        assert_eq!(generate(JOIN_CODE_LEN).len(), JOIN_CODE_LEN);
        assert!(JOIN_CODE_LEN > SESSION_CODE_LEN);
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  x7k2\n"), "X7K2");
        assert_eq!(normalize("X7K2"), "X7K2");
    }

    #[test]
    fn matches_is_case_and_whitespace_insensitive() {
        assert!(matches("x7k2", "X7K2"));
        assert!(matches(" X7K2 ", "X7K2"));
        assert!(!matches("X7K3", "X7K2"));
        assert!(!matches("X7K", "X7K2"));
        assert!(!matches("", "X7K2"));
    }
}
