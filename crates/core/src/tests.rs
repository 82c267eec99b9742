//! Canonical vectors, algorithm laws on reduced parameters, and the DAG
//! file lifecycle.

use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};

use sha3::{Digest, Keccak256, Keccak512};

use crate::io;
use crate::*;

/// Reduced parameters used across the suite: a 1 KiB cache (16 nodes) and a
/// 32 KiB dataset (512 nodes, 256 pages).
const REDUCED_CACHE: u64 = 1024;
const REDUCED_DAG: u64 = 32 * 1024;

fn h256(hex_str: &str) -> H256 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hex::decode(hex_str).unwrap());
    out
}

fn keccak(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Keccak256::digest(data));
    out
}

fn keccak512_ref(data: &[u8]) -> [u8; 64] {
    let mut out = [0u8; 64];
    out.copy_from_slice(&Keccak512::digest(data));
    out
}

fn dag_path(dir: &Path, seed: &H256) -> PathBuf {
    dir.join(io::file_name(seed))
}

#[test]
fn genesis_sizes_match_published_tables() {
    assert_eq!(cache_size(0).unwrap(), 16_776_896);
    assert_eq!(dag_size(0).unwrap(), 1_073_739_904);
}

#[test]
fn size_tables_are_aligned() {
    for e in 0..MAX_EPOCH {
        // Epochs below the activation boundary are probed with pre-fork
        // blocks, the rest with post-fork blocks.
        let block = if e < ACTIVATION_BLOCK / EPOCH_LENGTH {
            e * EPOCH_LENGTH
        } else {
            e * NEW_EPOCH_LENGTH
        };
        assert_eq!(epoch(block), e);

        let cache = cache_size(block).unwrap();
        let dag = dag_size(block).unwrap();
        assert_eq!(cache % NODE_BYTES as u64, 0, "cache size at epoch {e}");
        assert_eq!(dag % MIX_BYTES as u64, 0, "dag size at epoch {e}");
        assert!(dag > cache);
    }
}

#[test]
fn epoch_rule_switches_at_activation() {
    assert_eq!(epoch(0), 0);
    assert_eq!(epoch(29_999), 0);
    assert_eq!(epoch(30_000), 1);
    assert_eq!(epoch(ACTIVATION_BLOCK - 1), 389);
    assert_eq!(epoch(ACTIVATION_BLOCK), 195);
    assert_eq!(epoch(ACTIVATION_BLOCK + NEW_EPOCH_LENGTH), 196);
}

#[test]
fn epoch_beyond_tables_is_an_error() {
    let block = MAX_EPOCH * NEW_EPOCH_LENGTH;
    assert_eq!(epoch(block), MAX_EPOCH);
    assert!(matches!(
        cache_size(block),
        Err(Error::EpochOutOfRange(e)) if e == MAX_EPOCH
    ));
    assert!(matches!(dag_size(block), Err(Error::EpochOutOfRange(_))));
}

#[test]
fn seed_chain_before_activation() {
    assert_eq!(seed_hash(0), [0u8; 32]);
    assert_eq!(seed_hash(29_999), [0u8; 32]);
    assert_eq!(seed_hash(30_000), keccak(&[0u8; 32]));

    for e in 1..4u64 {
        let this = seed_hash(e * EPOCH_LENGTH);
        assert_eq!(seed_hash((e + 1) * EPOCH_LENGTH), keccak(&this));
    }
}

#[test]
fn seed_chain_continues_across_activation() {
    // Post-fork epoch 195 anchors at block 195 * 60_000 + 1, which is 390
    // keccak rounds from zero -- the seed classic epoch 390 would have used.
    let mut expected = [0u8; 32];
    for _ in 0..390 {
        expected = keccak(&expected);
    }
    assert_eq!(seed_hash(ACTIVATION_BLOCK), expected);

    // Post-fork epoch 253 (block 15_212_191) anchors at 506 rounds.
    let mut expected = [0u8; 32];
    for _ in 0..506 {
        expected = keccak(&expected);
    }
    assert_eq!(seed_hash(15_212_191), expected);
}

/// Independent byte-level rebuild of the cache construction, every word read
/// decoded little-endian explicitly.
fn reference_cache(size: usize, seed: &[u8; 32]) -> Vec<u8> {
    let n = size / NODE_BYTES;
    let mut nodes: Vec<[u8; 64]> = Vec::with_capacity(n);
    nodes.push(keccak512_ref(seed));
    for i in 1..n {
        let prev = nodes[i - 1];
        nodes.push(keccak512_ref(&prev));
    }
    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let idx = u32::from_le_bytes(nodes[i][..4].try_into().unwrap()) as usize % n;
            let mut data = [0u8; 64];
            for (j, byte) in data.iter_mut().enumerate() {
                *byte = nodes[(n - 1 + i) % n][j] ^ nodes[idx][j];
            }
            nodes[i] = keccak512_ref(&data);
        }
    }
    nodes.concat()
}

#[test]
fn cache_matches_byte_level_reference() {
    let seed = [0xAAu8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let built: Vec<u8> = light
        .cache()
        .iter()
        .flat_map(|node| node.as_bytes().to_vec())
        .collect();
    assert_eq!(built, reference_cache(REDUCED_CACHE as usize, &seed));
}

/// The reduced epoch-0 vector shared by the reference implementations:
/// 1 KiB cache from the zero seed, 32 KiB dataset, nonce 0.
#[test]
fn hashimoto_reduced_epoch0_vector() {
    let light = Light::with_seed(REDUCED_CACHE, &[0u8; 32]).unwrap();
    let header = h256("c9149cc0386e689d789a1c2f3d5d169a61a6218ed30e74414dc736e442ef3d1f");
    let pow = light.compute_with_size(REDUCED_DAG, &header, 0).unwrap();
    assert_eq!(
        pow.mix_hash,
        h256("e4073cffaef931d37117cefd9afd27ea0f1cad6a981dd2605c4a1ac97c519800")
    );
    assert_eq!(
        pow.result,
        h256("d3539235ee2e6f8db665c0a72169f55b7f6c605712330b778ec3944f0eb5a557")
    );
}

#[test]
fn independent_contexts_agree() {
    let a = Light::with_seed(REDUCED_CACHE, &[3u8; 32]).unwrap();
    let b = Light::with_seed(REDUCED_CACHE, &[3u8; 32]).unwrap();
    let header = [7u8; 32];
    for nonce in [0u64, 1, u64::MAX] {
        assert_eq!(
            a.compute_with_size(REDUCED_DAG, &header, nonce).unwrap(),
            b.compute_with_size(REDUCED_DAG, &header, nonce).unwrap(),
        );
    }
}

#[test]
fn light_and_full_agree() {
    let seed = [0x2au8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, None).unwrap();
    assert_eq!(full.dag_size(), REDUCED_DAG);

    let header = [9u8; 32];
    for nonce in [0u64, 1, 0x4242_4242, u64::MAX] {
        assert_eq!(
            light
                .compute_with_size(REDUCED_DAG, &header, nonce)
                .unwrap(),
            full.compute(&header, nonce).unwrap(),
        );
    }
}

#[test]
fn quick_path_reproduces_compute() {
    let light = Light::with_seed(REDUCED_CACHE, &[0u8; 32]).unwrap();
    let header = [0x11u8; 32];
    let nonce = 0x646576_u64;
    let pow = light
        .compute_with_size(REDUCED_DAG, &header, nonce)
        .unwrap();

    assert_eq!(quick_hash(&header, nonce, &pow.mix_hash), pow.result);
    assert!(quick_check_difficulty(
        &header,
        nonce,
        &pow.mix_hash,
        &[0xff; 32]
    ));
    assert!(!quick_check_difficulty(
        &header,
        nonce,
        &pow.mix_hash,
        &[0x00; 32]
    ));
}

#[test]
fn boundary_compare_is_big_endian() {
    let mut hash = [0u8; 32];
    let mut boundary = [0u8; 32];
    assert!(check_difficulty(&hash, &boundary));

    hash[31] = 1;
    assert!(!check_difficulty(&hash, &boundary));

    boundary[0] = 1;
    assert!(check_difficulty(&hash, &boundary));

    hash = [0xff; 32];
    assert!(!check_difficulty(&hash, &boundary));
    assert!(check_difficulty(&hash, &[0xff; 32]));
}

#[test]
fn misaligned_sizes_are_rejected() {
    assert!(matches!(
        Light::with_seed(1000, &[0u8; 32]),
        Err(Error::Misaligned { .. })
    ));
    assert!(matches!(
        Light::with_seed(0, &[0u8; 32]),
        Err(Error::Misaligned { .. })
    ));

    let light = Light::with_seed(REDUCED_CACHE, &[0u8; 32]).unwrap();
    // 96 is node-aligned but not page-aligned.
    assert!(matches!(
        light.compute_with_size(96, &[0u8; 32], 0),
        Err(Error::Misaligned { .. })
    ));

    let mut unpaged = vec![0u8; 96];
    assert!(matches!(
        compute_full_data(&mut unpaged, light.cache(), None),
        Err(Error::Misaligned { .. })
    ));
}

#[test]
fn materializer_matches_dag_item() {
    let light = Light::with_seed(REDUCED_CACHE, &[5u8; 32]).unwrap();
    let mut data = vec![0u8; 128 * NODE_BYTES];
    let mut reports = Vec::new();
    let mut cb = |p: u32| {
        reports.push(p);
        true
    };
    compute_full_data(&mut data, light.cache(), Some(&mut cb)).unwrap();

    for (i, slot) in data.chunks_exact(NODE_BYTES).enumerate() {
        assert_eq!(slot, dag_item(light.cache(), i as u32).as_bytes());
    }
    assert!(!reports.is_empty());
    assert_eq!(reports[0], 0);
    assert!(reports.iter().all(|p| *p <= 100));
}

#[test]
fn tiny_dags_skip_progress() {
    let light = Light::with_seed(REDUCED_CACHE, &[5u8; 32]).unwrap();
    // 64 nodes, below the 100-node reporting threshold.
    let mut data = vec![0u8; 64 * NODE_BYTES];
    let mut calls = 0u32;
    let mut cb = |_p: u32| {
        calls += 1;
        true
    };
    compute_full_data(&mut data, light.cache(), Some(&mut cb)).unwrap();
    assert_eq!(calls, 0);
}

#[test]
fn cancel_aborts_materialization() {
    let light = Light::with_seed(REDUCED_CACHE, &[5u8; 32]).unwrap();
    let mut data = vec![0u8; 256 * NODE_BYTES];
    let mut cb = |_p: u32| false;
    assert!(matches!(
        compute_full_data(&mut data, light.cache(), Some(&mut cb)),
        Err(Error::Cancelled)
    ));
}

#[test]
fn dag_file_round_trip_and_match() {
    let seed = [7u8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut expected = vec![0u8; REDUCED_DAG as usize];
    compute_full_data(&mut expected, light.cache(), None).unwrap();

    let mut build_reports = 0u32;
    {
        let mut cb = |_p: u32| {
            build_reports += 1;
            true
        };
        let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, Some(&mut cb)).unwrap();
        assert_eq!(full.dag(), expected.as_slice());
    }
    assert!(build_reports > 0);

    // On-disk layout: little-endian magic marker, then the body.
    let raw = fs::read(dag_path(dir.path(), &seed)).unwrap();
    assert_eq!(raw.len() as u64, REDUCED_DAG + DAG_MAGIC_SIZE as u64);
    assert_eq!(
        u64::from_le_bytes(raw[..DAG_MAGIC_SIZE].try_into().unwrap()),
        DAG_MAGIC_NUM
    );
    assert_eq!(&raw[DAG_MAGIC_SIZE..], expected.as_slice());

    // A second open must take the match path: no rebuild, same bytes.
    let mut reopen_reports = 0u32;
    let mut cb = |_p: u32| {
        reopen_reports += 1;
        true
    };
    let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, Some(&mut cb)).unwrap();
    assert_eq!(reopen_reports, 0);
    assert_eq!(full.dag(), expected.as_slice());
}

#[test]
fn missing_magic_forces_rebuild() {
    let seed = [9u8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let dir = tempfile::tempdir().unwrap();
    Full::create(dir.path(), &seed, REDUCED_DAG, &light, None).unwrap();

    // Simulate a crash before finalization: clear the marker.
    let path = dag_path(dir.path(), &seed);
    let mut file = OpenOptions::new().write(true).open(&path).unwrap();
    file.write_all(&[0u8; DAG_MAGIC_SIZE]).unwrap();
    drop(file);

    let mut rebuilt = 0u32;
    let mut cb = |_p: u32| {
        rebuilt += 1;
        true
    };
    let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, Some(&mut cb)).unwrap();
    assert!(rebuilt > 0);

    let mut expected = vec![0u8; REDUCED_DAG as usize];
    compute_full_data(&mut expected, light.cache(), None).unwrap();
    assert_eq!(full.dag(), expected.as_slice());

    let raw = fs::read(&path).unwrap();
    assert_eq!(
        u64::from_le_bytes(raw[..DAG_MAGIC_SIZE].try_into().unwrap()),
        DAG_MAGIC_NUM
    );
}

#[test]
fn stale_file_of_wrong_size_is_recreated() {
    let seed = [4u8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dag_path(dir.path(), &seed);
    fs::write(&path, b"stale dag from an older layout").unwrap();

    let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, None).unwrap();
    assert_eq!(full.dag_size(), REDUCED_DAG);

    let raw = fs::read(&path).unwrap();
    assert_eq!(raw.len() as u64, REDUCED_DAG + DAG_MAGIC_SIZE as u64);
    assert_eq!(
        u64::from_le_bytes(raw[..DAG_MAGIC_SIZE].try_into().unwrap()),
        DAG_MAGIC_NUM
    );
}

#[test]
fn cancelled_build_writes_no_magic() {
    let seed = [6u8; 32];
    let light = Light::with_seed(REDUCED_CACHE, &seed).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let mut cb = |_p: u32| false;
    let err = Full::create(dir.path(), &seed, REDUCED_DAG, &light, Some(&mut cb)).unwrap_err();
    assert!(matches!(err, Error::Cancelled));

    let raw = fs::read(dag_path(dir.path(), &seed)).unwrap();
    assert_ne!(
        u64::from_le_bytes(raw[..DAG_MAGIC_SIZE].try_into().unwrap()),
        DAG_MAGIC_NUM
    );

    // The next attempt rebuilds the abandoned file and completes it.
    let full = Full::create(dir.path(), &seed, REDUCED_DAG, &light, None).unwrap();
    assert_eq!(full.dag_size(), REDUCED_DAG);
}

/// Ethereum mainnet block 8_996_777; pre-fork rules are plain Ethash.
/// Builds a ~48 MiB cache, so this takes minutes in debug builds.
#[test]
#[ignore]
fn mainnet_vector_pre_fork() {
    let light = Light::new(8_996_777).unwrap();
    let header = h256("3c2e6623b1de8862a927eeeef2b6b25dea6e1d9dad88dca3c239be3959dc384a");
    let pow = light.compute(&header, 0xa5d3_d0cc_c8bb_8a29).unwrap();
    assert_eq!(
        pow.mix_hash,
        h256("543bc0769f7d5df30e7633f4a01552c2cee7baace8a6da37fddaa19e49e81209")
    );
}

/// Ethereum Classic mainnet block 15_212_191, after the ECIP-1099 epoch
/// doubling (etchash epoch 253). Slow for the same reason as above.
#[test]
#[ignore]
fn classic_vector_post_fork() {
    let light = Light::new(15_212_191).unwrap();
    let header = h256("516a3f12a1295f5dc38204824bac290e494fbb7a9c6ec6885804ecbe6637fcd2");
    let pow = light.compute(&header, 0x438b_7842_b6c5_6f63).unwrap();
    assert_eq!(
        pow.mix_hash,
        h256("50d8aac797b9437cdeedc4776634e57a889e1ed28a3b05f9f3e69ac194350e16")
    );
}
