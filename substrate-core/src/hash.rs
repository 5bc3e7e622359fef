//! BLAKE3-256 content addressing over the canonical serialization of a
//! constant's seed or a composition's ordered, run-length-encoded child
//! sequence (§4.2).

use crate::seed::Seed;
use core::fmt;

/// A 256-bit BLAKE3 digest, the unique identity of a node's contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses a 64-character lowercase hex string, as accepted by the
    /// `lookup <hex-content-hash>` CLI command.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != 64 {
            return None;
        }
        let mut bytes = [0u8; 32];
        for i in 0..32 {
            bytes[i] = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
        }
        Some(Self(bytes))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            s.push_str(&format!("{b:02x}"));
        }
        s
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// One RLE-compressed child reference fed to [`hash_composition`]: the
/// child's own content hash plus how many consecutive times it repeats
/// at this position.
#[derive(Debug, Clone, Copy)]
pub struct ChildHashRun {
    pub content_hash: ContentHash,
    pub multiplicity: u32,
}

/// Hashes a constant's canonical serialization: `u8(seed_type) ||
/// u64_LE(seed_value)`.
#[must_use]
pub fn hash_constant(seed: &Seed) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[seed.seed_type() as u8]);
    hasher.update(&seed.seed_value().to_le_bytes());
    ContentHash(*hasher.finalize().as_bytes())
}

/// Hashes a composition's canonical serialization: for each `(child,
/// multiplicity)` run in order, `child.content_hash (32 B) ||
/// i32_LE(multiplicity)`.
#[must_use]
pub fn hash_composition(children: &[ChildHashRun]) -> ContentHash {
    let mut hasher = blake3::Hasher::new();
    for run in children {
        hasher.update(run.content_hash.as_bytes());
        hasher.update(&(run.multiplicity as i32).to_le_bytes());
    }
    ContentHash(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::Seed;

    #[test]
    fn constant_hash_is_deterministic() {
        let seed = Seed::codepoint(u32::from('x')).unwrap();
        assert_eq!(hash_constant(&seed), hash_constant(&seed));
    }

    #[test]
    fn order_matters() {
        let a = ContentHash::from_bytes([1; 32]);
        let b = ContentHash::from_bytes([2; 32]);
        let ab = hash_composition(&[
            ChildHashRun { content_hash: a, multiplicity: 1 },
            ChildHashRun { content_hash: b, multiplicity: 1 },
        ]);
        let ba = hash_composition(&[
            ChildHashRun { content_hash: b, multiplicity: 1 },
            ChildHashRun { content_hash: a, multiplicity: 1 },
        ]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn multiplicity_matters() {
        let a = ContentHash::from_bytes([7; 32]);
        let once = hash_composition(&[ChildHashRun { content_hash: a, multiplicity: 1 }]);
        let twice = hash_composition(&[ChildHashRun { content_hash: a, multiplicity: 2 }]);
        assert_ne!(once, twice);
    }

    #[test]
    fn hex_round_trips() {
        let hash = hash_constant(&Seed::Byte(42));
        let hex = hash.to_hex();
        assert_eq!(ContentHash::from_hex(&hex), Some(hash));
    }

    #[test]
    fn no_constant_composition_collision_in_small_corpus() {
        use std::collections::HashSet;
        let mut seen = HashSet::new();
        for cp in 0u32..200 {
            if let Ok(seed) = Seed::codepoint(cp) {
                assert!(seen.insert(hash_constant(&seed)));
            }
        }
    }
}
