//! Hash primitives and the 64-byte node type.
//!
//! Keccak comes from the `sha3` crate; the FNV mixer and the node's word
//! views are defined here so every consumer agrees on lane order. Nodes store
//! plain bytes and read/write their 16 32-bit lanes little-endian, which
//! makes the byte stream canonical on every host.

use sha3::{Digest, Keccak256, Keccak512};

use crate::params::{FNV_PRIME, NODE_BYTES, NODE_WORDS};

/// 32-byte hash value. All-zero is the reset state.
pub type H256 = [u8; 32];

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

pub(crate) fn keccak512(data: &[u8]) -> [u8; NODE_BYTES] {
    let mut out = [0u8; NODE_BYTES];
    out.copy_from_slice(&Keccak512::digest(data));
    out
}

/// `(a * FNV_PRIME) ^ b` with 32-bit wraparound.
#[inline(always)]
pub(crate) fn fnv(a: u32, b: u32) -> u32 {
    a.wrapping_mul(FNV_PRIME) ^ b
}

/// A 64-byte cache/DAG node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C, align(16))]
pub struct Node {
    bytes: [u8; NODE_BYTES],
}

impl Node {
    pub(crate) const ZERO: Node = Node {
        bytes: [0u8; NODE_BYTES],
    };

    /// Copy a node out of a byte stream (first 64 bytes of `bytes`).
    #[inline]
    pub(crate) fn read(bytes: &[u8]) -> Node {
        let mut node = Node::ZERO;
        node.bytes.copy_from_slice(&bytes[..NODE_BYTES]);
        node
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; NODE_BYTES] {
        &self.bytes
    }

    /// The `i`-th 32-bit lane, little-endian.
    #[inline]
    pub fn word(&self, i: usize) -> u32 {
        u32::from_le_bytes(self.bytes[i * 4..i * 4 + 4].try_into().unwrap())
    }

    #[inline]
    pub(crate) fn set_word(&mut self, i: usize, word: u32) {
        self.bytes[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }

    /// Word-wise XOR, used by the cache rounds.
    pub(crate) fn xor(&self, other: &Node) -> Node {
        let mut out = Node::ZERO;
        for i in 0..NODE_BYTES {
            out.bytes[i] = self.bytes[i] ^ other.bytes[i];
        }
        out
    }

    /// `words[w] = fnv(words[w], parent.words[w])` across all 16 lanes.
    ///
    /// Dispatches to a vectorized path where one is compiled in; the scalar
    /// path is always available and the two are bit-identical.
    #[inline]
    pub(crate) fn fnv_merge(&mut self, parent: &Node) {
        #[cfg(all(
            target_arch = "x86_64",
            target_feature = "sse4.1",
            target_endian = "little"
        ))]
        {
            self.fnv_merge_sse(parent)
        }

        #[cfg(all(
            target_arch = "aarch64",
            target_feature = "neon",
            target_endian = "little"
        ))]
        {
            self.fnv_merge_neon(parent)
        }

        #[cfg(not(any(
            all(
                target_arch = "x86_64",
                target_feature = "sse4.1",
                target_endian = "little"
            ),
            all(
                target_arch = "aarch64",
                target_feature = "neon",
                target_endian = "little"
            )
        )))]
        {
            self.fnv_merge_scalar(parent)
        }
    }

    /// Scalar reference for the FNV row merge. Unused at runtime on targets
    /// that compile a vector path, but always kept for parity testing.
    #[allow(dead_code)]
    #[inline]
    pub(crate) fn fnv_merge_scalar(&mut self, parent: &Node) {
        for w in 0..NODE_WORDS {
            self.set_word(w, fnv(self.word(w), parent.word(w)));
        }
    }

    #[cfg(all(
        target_arch = "x86_64",
        target_feature = "sse4.1",
        target_endian = "little"
    ))]
    #[inline]
    fn fnv_merge_sse(&mut self, parent: &Node) {
        use core::arch::x86_64::{
            __m128i, _mm_loadu_si128, _mm_mullo_epi32, _mm_set1_epi32, _mm_storeu_si128,
            _mm_xor_si128,
        };

        // SAFETY: both arrays are 64 bytes, read and written 16 bytes at a
        // time through the unaligned load/store intrinsics, so no alignment
        // requirement applies; on this little-endian target the 32-bit lanes
        // match the scalar accessors.
        unsafe {
            let prime = _mm_set1_epi32(FNV_PRIME as i32);
            for lane in 0..4 {
                let offset = lane * 16;
                let m = _mm_loadu_si128(self.bytes.as_ptr().add(offset) as *const __m128i);
                let p = _mm_loadu_si128(parent.bytes.as_ptr().add(offset) as *const __m128i);
                let mixed = _mm_xor_si128(_mm_mullo_epi32(m, prime), p);
                _mm_storeu_si128(self.bytes.as_mut_ptr().add(offset) as *mut __m128i, mixed);
            }
        }
    }

    #[cfg(all(
        target_arch = "aarch64",
        target_feature = "neon",
        target_endian = "little"
    ))]
    #[inline]
    fn fnv_merge_neon(&mut self, parent: &Node) {
        use core::arch::aarch64::{
            vdupq_n_u32, veorq_u32, vld1q_u8, vmulq_u32, vreinterpretq_u32_u8,
            vreinterpretq_u8_u32, vst1q_u8,
        };

        // SAFETY: byte loads/stores over the two 64-byte arrays, 16 bytes at
        // a time; reinterpreting as four u32 lanes matches the scalar
        // little-endian accessors on this target.
        unsafe {
            let prime = vdupq_n_u32(FNV_PRIME);
            for lane in 0..4 {
                let offset = lane * 16;
                let m = vreinterpretq_u32_u8(vld1q_u8(self.bytes.as_ptr().add(offset)));
                let p = vreinterpretq_u32_u8(vld1q_u8(parent.bytes.as_ptr().add(offset)));
                let mixed = veorq_u32(vmulq_u32(m, prime), p);
                vst1q_u8(self.bytes.as_mut_ptr().add(offset), vreinterpretq_u8_u32(mixed));
            }
        }
    }
}

impl From<[u8; NODE_BYTES]> for Node {
    fn from(bytes: [u8; NODE_BYTES]) -> Self {
        Node { bytes }
    }
}
