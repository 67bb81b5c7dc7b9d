//! # Path Tokenizer
//!
//! Sparse values are prefixed with their path. Paths known to the layout are
//! written as a small integer token instead of the UTF-8 string:
//!
//! ```text
//! token < tokenizer.count()    tokenized path, the token is the whole path
//! token >= tokenizer.count()   literal path, (token - count) UTF-8 bytes follow
//! ```
//!
//! Tokens are assigned in first-seen order. Token 0 is always the empty path.
//! Each [`StringToken`] carries its varint encoding so the sparse writer copies
//! bytes instead of re-encoding.
//!
//! ## Lookup Hashing
//!
//! Lookups hash at most [`SAMPLING_HASH_SAMPLES`] bytes of the path, taken
//! [`SAMPLING_HASH_STRIDE`] bytes apart, plus its length. Paths sharing those
//! samples collide and are separated by the full equality check of the map.

use std::hash::{BuildHasherDefault, Hasher};
use std::sync::Arc;

use hashbrown::HashMap;
use log::trace;
use smallvec::SmallVec;

use crate::config::{MAX_VARINT_LEN, SAMPLING_HASH_SAMPLES, SAMPLING_HASH_STRIDE};
use crate::encoding::varint::encode_varuint;

/// djb-style hash over a sparse sample of the input bytes.
#[derive(Debug, Clone, Copy)]
pub struct SamplingHasher {
    state: u64,
}

impl Default for SamplingHasher {
    fn default() -> Self {
        Self { state: 5381 }
    }
}

impl Hasher for SamplingHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut hash = self.state ^ bytes.len() as u64;
        for &byte in bytes
            .iter()
            .step_by(SAMPLING_HASH_STRIDE)
            .take(SAMPLING_HASH_SAMPLES)
        {
            hash = hash.wrapping_mul(33) ^ byte as u64;
        }
        self.state = hash;
    }
}

pub type SamplingBuildHasher = BuildHasherDefault<SamplingHasher>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToken {
    id: u64,
    varint: SmallVec<[u8; MAX_VARINT_LEN]>,
    path: Arc<str>,
}

impl StringToken {
    fn new(id: u64, path: Arc<str>) -> Self {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let len = encode_varuint(id, &mut buf);
        Self {
            id,
            varint: SmallVec::from_slice(&buf[..len]),
            path,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn varint(&self) -> &[u8] {
        &self.varint
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone)]
pub struct StringTokenizer {
    tokens: HashMap<Arc<str>, StringToken, SamplingBuildHasher>,
    strings: Vec<Arc<str>>,
}

impl Default for StringTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTokenizer {
    pub fn new() -> Self {
        let empty: Arc<str> = Arc::from("");
        let mut tokens = HashMap::with_hasher(SamplingBuildHasher::default());
        tokens.insert(empty.clone(), StringToken::new(0, empty.clone()));
        Self {
            tokens,
            strings: vec![empty],
        }
    }

    /// Returns the token of `path`, allocating the next id on first sight.
    pub fn add(&mut self, path: &str) -> StringToken {
        if let Some(token) = self.tokens.get(path) {
            return token.clone();
        }

        let path: Arc<str> = Arc::from(path);
        let token = StringToken::new(self.strings.len() as u64, path.clone());
        trace!("tokenized path '{}' as {}", path, token.id);
        self.strings.push(path.clone());
        self.tokens.insert(path, token.clone());
        token
    }

    pub fn try_find_token(&self, path: &str) -> Option<&StringToken> {
        self.tokens.get(path)
    }

    pub fn try_find_string(&self, id: u64) -> Option<&str> {
        self.strings.get(id as usize).map(|s| &**s)
    }

    /// Number of allocated tokens; also the first literal-path token value.
    pub fn count(&self) -> usize {
        self.strings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_token_zero() {
        let tokenizer = StringTokenizer::new();
        assert_eq!(tokenizer.count(), 1);
        assert_eq!(tokenizer.try_find_token("").map(|t| t.id()), Some(0));
        assert_eq!(tokenizer.try_find_string(0), Some(""));
    }

    #[test]
    fn add_is_idempotent() {
        let mut tokenizer = StringTokenizer::new();
        let a = tokenizer.add("address.street");
        let b = tokenizer.add("address.street");
        assert_eq!(a, b);
        assert_eq!(tokenizer.count(), 2);

        let c = tokenizer.add("address.city");
        assert_eq!(c.id(), 2);
        assert_eq!(tokenizer.count(), 3);
        assert_eq!(tokenizer.try_find_string(2), Some("address.city"));
    }

    #[test]
    fn colliding_samples_still_resolve_exactly() {
        let mut tokenizer = StringTokenizer::new();
        // Same length and same bytes at the sampled positions 0 and 13.
        let a = tokenizer.add("aaaaaaaaaaaaaaX");
        let b = tokenizer.add("aaaaaaaaaaaaaaY");
        assert_ne!(a.id(), b.id());
        assert_eq!(tokenizer.try_find_token("aaaaaaaaaaaaaaY").map(|t| t.id()), Some(b.id()));
    }

    #[test]
    fn token_varint_is_precomputed() {
        let mut tokenizer = StringTokenizer::new();
        let mut last = None;
        for i in 0..200 {
            last = Some(tokenizer.add(&format!("p{}", i)));
        }
        let token = last.unwrap();
        assert_eq!(token.id(), 200);
        assert_eq!(token.varint(), &[0xC8, 0x01]);
    }
}
