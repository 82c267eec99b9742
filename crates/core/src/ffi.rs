//! C ABI for embedding the engine in non-Rust miners and verifiers.

use core::slice;

use crate::epoch;
use crate::etchash;
use crate::light::Light;
use crate::primitives::H256;

/// Opaque light-context handle.
/// Returned by `etchash_light_new`, freed with `etchash_light_delete`.
pub struct EtchashLight {
    inner: Light,
}

/// Result of one compute call. `success` is false when the context or the
/// header pointer was invalid, or the epoch left the size tables.
#[repr(C)]
pub struct EtchashResult {
    pub result: [u8; 32],
    pub mix_hash: [u8; 32],
    pub success: bool,
}

impl EtchashResult {
    const FAILED: EtchashResult = EtchashResult {
        result: [0; 32],
        mix_hash: [0; 32],
        success: false,
    };
}

fn read_h256(ptr: *const u8) -> H256 {
    let mut out = [0u8; 32];
    // Caller contract: 32 readable bytes.
    unsafe { out.copy_from_slice(slice::from_raw_parts(ptr, 32)) };
    out
}

#[unsafe(no_mangle)]
pub extern "C" fn etchash_get_epoch_number(block_number: u64) -> u64 {
    epoch::epoch(block_number)
}

/// Cache size for a block height, or 0 when the epoch leaves the tables.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_get_cachesize(block_number: u64) -> u64 {
    epoch::cache_size(block_number).unwrap_or(0)
}

/// DAG size for a block height, or 0 when the epoch leaves the tables.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_get_datasize(block_number: u64) -> u64 {
    epoch::dag_size(block_number).unwrap_or(0)
}

/// Write the 32-byte seed hash for `block_number` into `out`.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_get_seedhash(block_number: u64, out: *mut u8) {
    if out.is_null() {
        return;
    }
    let seed = epoch::seed_hash(block_number);
    unsafe { slice::from_raw_parts_mut(out, 32).copy_from_slice(&seed) };
}

/// Build the light context for `block_number`. Null on failure.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_light_new(block_number: u64) -> *mut EtchashLight {
    match Light::new(block_number) {
        Ok(inner) => Box::into_raw(Box::new(EtchashLight { inner })),
        Err(_) => core::ptr::null_mut(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn etchash_light_delete(light: *mut EtchashLight) {
    if !light.is_null() {
        unsafe { drop(Box::from_raw(light)) };
    }
}

/// Light-mode compute over a 32-byte header hash and a nonce.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_light_compute(
    light: *const EtchashLight,
    header_hash: *const u8,
    nonce: u64,
) -> EtchashResult {
    if light.is_null() || header_hash.is_null() {
        return EtchashResult::FAILED;
    }
    let light = unsafe { &*light };
    match light.inner.compute(&read_h256(header_hash), nonce) {
        Ok(pow) => EtchashResult {
            result: pow.result,
            mix_hash: pow.mix_hash,
            success: true,
        },
        Err(_) => EtchashResult::FAILED,
    }
}

/// Verifier quick path over 32-byte header, mix, and boundary buffers.
#[unsafe(no_mangle)]
pub extern "C" fn etchash_quick_check_difficulty(
    header_hash: *const u8,
    nonce: u64,
    mix_hash: *const u8,
    boundary: *const u8,
) -> bool {
    if header_hash.is_null() || mix_hash.is_null() || boundary.is_null() {
        return false;
    }
    etchash::quick_check_difficulty(
        &read_h256(header_hash),
        nonce,
        &read_h256(mix_hash),
        &read_h256(boundary),
    )
}
