#![forbid(unsafe_code)]

use core::fmt;

/// Width of a participant public key on the wire.
pub const KEY_SIZE: usize = 32;
/// Width of a 256-bit identifier (drive ids, modification ids, triggers).
pub const HASH_SIZE: usize = 32;
/// Width of an opaque opinion signature.
pub const SIGNATURE_SIZE: usize = 64;

/// Public key of a replicator, drive owner or download consumer.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ParticipantKey([u8; KEY_SIZE]);

impl ParticipantKey {
    pub const fn new(bytes: [u8; KEY_SIZE]) -> Self {
        ParticipantKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for ParticipantKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        ParticipantKey(bytes)
    }
}

impl AsRef<[u8]> for ParticipantKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for ParticipantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantKey({self})")
    }
}

/// 256-bit identifier carried in transaction headers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash256([u8; HASH_SIZE]);

impl Hash256 {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash256(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

impl From<[u8; HASH_SIZE]> for Hash256 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Hash256(bytes)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash256({self})")
    }
}

/// Opaque signature over a replicator's opinion. The scheme that produced it
/// is not interpreted here.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_SIZE]);

impl Signature {
    pub const fn new(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Signature(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.0
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature([0u8; SIGNATURE_SIZE])
    }
}

impl From<[u8; SIGNATURE_SIZE]> for Signature {
    fn from(bytes: [u8; SIGNATURE_SIZE]) -> Self {
        Signature(bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode_upper(self.0))
    }
}
