//! XMSS key tree, signing and verification (QRL parameter set).
//!
//! Key material is derived from a 51-byte extended seed: a 3-byte descriptor
//! followed by 48 bytes of entropy, expanded with SHAKE256 into
//! `sk_seed || sk_prf || pub_seed`. The whole Merkle tree is computed at load
//! time and kept in memory, so signing at any leaf is an O(h) lookup plus one
//! WOTS+ signature.
//!
//! # Security
//! A leaf index must never sign twice. Nothing in this module tracks which
//! indices have been consumed; see [`crate::ots_ledger`].

use zeroize::Zeroizing;

use crate::crypto::descriptor::{Descriptor, DESCRIPTOR_LEN};
use crate::crypto::hash::{shake256_fill, to_byte, Hash32};
use crate::crypto::wots::{self, HashAddress, HashCtx, ADDR_TYPE_HASHTREE, ADDR_TYPE_LTREE, ADDR_TYPE_OTS, LEN, N};
use crate::error::{Result, SignerError};

pub const SEED_LEN: usize = 48;
pub const EXTENDED_SEED_LEN: usize = DESCRIPTOR_LEN + SEED_LEN;
pub const EXTENDED_PK_LEN: usize = DESCRIPTOR_LEN + 2 * N;

/// Signature size for a tree of height `h`.
pub fn signature_len(height: u8) -> usize {
    4 + N + LEN * N + height as usize * N
}

/* ============================================================================
 * Tree construction
 * ========================================================================== */

fn l_tree(ctx: &HashCtx, mut pk: Vec<Hash32>, adrs: &mut HashAddress) -> Hash32 {
    let mut l = pk.len();
    let mut height = 0u32;
    adrs.set_tree_height(height);
    while l > 1 {
        let bound = l >> 1;
        for i in 0..bound {
            adrs.set_tree_index(i as u32);
            pk[i] = ctx.h(&pk[2 * i], &pk[2 * i + 1], adrs);
        }
        if l & 1 == 1 {
            pk[bound] = pk[l - 1];
            l = bound + 1;
        } else {
            l = bound;
        }
        height += 1;
        adrs.set_tree_height(height);
    }
    pk[0]
}

fn leaf(ctx: &HashCtx, sk_seed: &[u8; 32], index: u32) -> Hash32 {
    let mut ots = HashAddress::with_type(ADDR_TYPE_OTS);
    ots.set_ots(index);
    let mut ltree = HashAddress::with_type(ADDR_TYPE_LTREE);
    ltree.set_ltree(index);

    let seed = Zeroizing::new(wots::leaf_seed(ctx, sk_seed, &ots));
    let pk = wots::pk_gen(ctx, &seed, &mut ots);
    l_tree(ctx, pk, &mut ltree)
}

fn parent(ctx: &HashCtx, left: &Hash32, right: &Hash32, child_height: u32, parent_index: u32) -> Hash32 {
    let mut adrs = HashAddress::with_type(ADDR_TYPE_HASHTREE);
    adrs.set_tree_height(child_height);
    adrs.set_tree_index(parent_index);
    ctx.h(left, right, &mut adrs)
}

/* ============================================================================
 * Key pair
 * ========================================================================== */

pub struct XmssKeyPair {
    descriptor: Descriptor,
    ctx: HashCtx,
    sk_seed: Zeroizing<[u8; 32]>,
    sk_prf: Zeroizing<[u8; 32]>,
    /// `levels[0]` are the leaves, `levels[h]` is `[root]`.
    levels: Vec<Vec<Hash32>>,
}

impl XmssKeyPair {
    pub fn from_extended_seed(extended: &[u8]) -> Result<Self> {
        if extended.len() != EXTENDED_SEED_LEN {
            return Err(SignerError::InvalidSeed(format!(
                "extended seed must be {EXTENDED_SEED_LEN} bytes, got {}",
                extended.len()
            )));
        }
        let descriptor = Descriptor::from_bytes(&extended[..DESCRIPTOR_LEN])?;
        let mut seed = Zeroizing::new([0u8; SEED_LEN]);
        seed.copy_from_slice(&extended[DESCRIPTOR_LEN..]);
        Ok(Self::from_seed(descriptor, &seed))
    }

    pub fn from_seed(descriptor: Descriptor, seed: &[u8; SEED_LEN]) -> Self {
        let mut expanded = Zeroizing::new([0u8; 3 * N]);
        shake256_fill(seed, &mut expanded[..]);

        let mut sk_seed = Zeroizing::new([0u8; 32]);
        let mut sk_prf = Zeroizing::new([0u8; 32]);
        let mut pub_seed = [0u8; 32];
        sk_seed.copy_from_slice(&expanded[..N]);
        sk_prf.copy_from_slice(&expanded[N..2 * N]);
        pub_seed.copy_from_slice(&expanded[2 * N..]);

        let ctx = HashCtx { hash: descriptor.hash_function, pub_seed };
        let height = descriptor.height as u32;

        let leaves: Vec<Hash32> = (0..1u32 << height).map(|i| leaf(&ctx, &sk_seed, i)).collect();
        let mut levels = Vec::with_capacity(height as usize + 1);
        levels.push(leaves);
        for lvl in 0..height {
            let below = &levels[lvl as usize];
            let next: Vec<Hash32> = below
                .chunks_exact(2)
                .enumerate()
                .map(|(k, pair)| parent(&ctx, &pair[0], &pair[1], lvl, k as u32))
                .collect();
            levels.push(next);
        }

        tracing::debug!(height, hash = descriptor.hash_function.name(), "xmss tree built");
        Self { descriptor, ctx, sk_seed, sk_prf, levels }
    }

    pub fn descriptor(&self) -> Descriptor {
        self.descriptor
    }

    pub fn height(&self) -> u8 {
        self.descriptor.height
    }

    /// Number of one-time leaves in the tree.
    pub fn capacity(&self) -> u64 {
        1u64 << self.descriptor.height
    }

    pub fn root(&self) -> Hash32 {
        self.levels[self.descriptor.height as usize][0]
    }

    /// Extended public key: descriptor || root || pub_seed.
    pub fn public_key(&self) -> Vec<u8> {
        let mut pk = Vec::with_capacity(EXTENDED_PK_LEN);
        pk.extend_from_slice(&self.descriptor.to_bytes());
        pk.extend_from_slice(&self.root());
        pk.extend_from_slice(&self.ctx.pub_seed);
        pk
    }

    /// One-time signature over `msg` at leaf `index`.
    pub fn sign(&self, index: u32, msg: &[u8]) -> Result<Vec<u8>> {
        if index as u64 >= self.capacity() {
            return Err(SignerError::InvalidOtsIndex(format!(
                "{index} is outside a tree of {} keys",
                self.capacity()
            )));
        }
        let mut idx32 = [0u8; 32];
        idx32.copy_from_slice(&to_byte(index as u64, 32));
        let r = self.ctx.prf(&self.sk_prf, &idx32);
        let digest = self.ctx.h_msg(&r, &self.root(), index, msg);

        let mut ots = HashAddress::with_type(ADDR_TYPE_OTS);
        ots.set_ots(index);
        let seed = Zeroizing::new(wots::leaf_seed(&self.ctx, &self.sk_seed, &ots));
        let wots_sig = wots::sign(&self.ctx, &digest, &seed, &mut ots);

        let mut sig = Vec::with_capacity(signature_len(self.height()));
        sig.extend_from_slice(&index.to_be_bytes());
        sig.extend_from_slice(&r);
        for s in &wots_sig {
            sig.extend_from_slice(s);
        }
        for (lvl, nodes) in self.levels[..self.height() as usize].iter().enumerate() {
            sig.extend_from_slice(&nodes[((index >> lvl) ^ 1) as usize]);
        }
        Ok(sig)
    }
}

/* ============================================================================
 * Verification
 * ========================================================================== */

fn hash32(b: &[u8]) -> Hash32 {
    let mut out = [0u8; 32];
    out.copy_from_slice(&b[..N]);
    out
}

/// Check `sig` over `msg` against an extended public key.
pub fn verify(msg: &[u8], sig: &[u8], extended_pk: &[u8]) -> bool {
    if extended_pk.len() != EXTENDED_PK_LEN {
        return false;
    }
    let descriptor = match Descriptor::from_bytes(&extended_pk[..DESCRIPTOR_LEN]) {
        Ok(d) => d,
        Err(_) => return false,
    };
    let height = descriptor.height as usize;
    if sig.len() != signature_len(descriptor.height) {
        return false;
    }
    let root = hash32(&extended_pk[DESCRIPTOR_LEN..]);
    let ctx = HashCtx { hash: descriptor.hash_function, pub_seed: hash32(&extended_pk[DESCRIPTOR_LEN + N..]) };

    let index = u32::from_be_bytes([sig[0], sig[1], sig[2], sig[3]]);
    if index as u64 >= 1u64 << height {
        return false;
    }
    let r = hash32(&sig[4..]);
    let wots_start = 4 + N;
    let auth_start = wots_start + LEN * N;
    let wots_sig: Vec<Hash32> = sig[wots_start..auth_start].chunks_exact(N).map(hash32).collect();

    let digest = ctx.h_msg(&r, &root, index, msg);
    let mut ots = HashAddress::with_type(ADDR_TYPE_OTS);
    ots.set_ots(index);
    let pk = wots::pk_from_sig(&ctx, &wots_sig, &digest, &mut ots);

    let mut ltree = HashAddress::with_type(ADDR_TYPE_LTREE);
    ltree.set_ltree(index);
    let mut node = l_tree(&ctx, pk, &mut ltree);

    let mut i = index;
    for (lvl, auth) in sig[auth_start..].chunks_exact(N).enumerate() {
        let auth = hash32(auth);
        node = if i & 1 == 0 {
            parent(&ctx, &node, &auth, lvl as u32, i >> 1)
        } else {
            parent(&ctx, &auth, &node, lvl as u32, i >> 1)
        };
        i >>= 1;
    }
    node == root
}
