//! WOTS+ (n = 32, w = 16) and the tweakable hash functions XMSS builds on.

use crate::crypto::hash::{to_byte, Hash32, HashFunction};

pub const N: usize = 32;
pub const W: u32 = 16;
pub const LOG_W: u32 = 4;
pub const LEN1: usize = 64;
pub const LEN2: usize = 3;
pub const LEN: usize = LEN1 + LEN2;

const PAD_F: u64 = 0;
const PAD_H: u64 = 1;
const PAD_HASH_MSG: u64 = 2;
const PAD_PRF: u64 = 3;

pub const ADDR_TYPE_OTS: u32 = 0;
pub const ADDR_TYPE_LTREE: u32 = 1;
pub const ADDR_TYPE_HASHTREE: u32 = 2;

/// 32-byte hash address: eight big-endian words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashAddress([u32; 8]);

impl HashAddress {
    pub fn with_type(addr_type: u32) -> Self {
        let mut a = Self::default();
        a.set_type(addr_type);
        a
    }

    /// Switching type clears every type-specific word.
    pub fn set_type(&mut self, addr_type: u32) {
        self.0[3] = addr_type;
        self.0[4..].fill(0);
    }

    pub fn set_ots(&mut self, v: u32) {
        self.0[4] = v;
    }
    pub fn set_ltree(&mut self, v: u32) {
        self.0[4] = v;
    }
    pub fn set_chain(&mut self, v: u32) {
        self.0[5] = v;
    }
    pub fn set_tree_height(&mut self, v: u32) {
        self.0[5] = v;
    }
    pub fn set_hash(&mut self, v: u32) {
        self.0[6] = v;
    }
    pub fn set_tree_index(&mut self, v: u32) {
        self.0[6] = v;
    }
    pub fn set_key_and_mask(&mut self, v: u32) {
        self.0[7] = v;
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.0.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

/// Hash function plus public seed: everything the keyed hashes need.
#[derive(Clone, Copy)]
pub struct HashCtx {
    pub hash: HashFunction,
    pub pub_seed: Hash32,
}

fn xor(a: &Hash32, b: &Hash32) -> Hash32 {
    let mut out = [0u8; 32];
    for i in 0..N {
        out[i] = a[i] ^ b[i];
    }
    out
}

impl HashCtx {
    pub fn prf(&self, key: &[u8; 32], input: &[u8; 32]) -> Hash32 {
        self.hash.digest(&[&to_byte(PAD_PRF, N), key, input])
    }

    fn prf_addr(&self, adrs: &HashAddress) -> Hash32 {
        self.prf(&self.pub_seed, &adrs.to_bytes())
    }

    pub fn f(&self, input: &Hash32, adrs: &mut HashAddress) -> Hash32 {
        adrs.set_key_and_mask(0);
        let key = self.prf_addr(adrs);
        adrs.set_key_and_mask(1);
        let mask = self.prf_addr(adrs);
        self.hash.digest(&[&to_byte(PAD_F, N), &key, &xor(input, &mask)])
    }

    pub fn h(&self, left: &Hash32, right: &Hash32, adrs: &mut HashAddress) -> Hash32 {
        adrs.set_key_and_mask(0);
        let key = self.prf_addr(adrs);
        adrs.set_key_and_mask(1);
        let mask_l = self.prf_addr(adrs);
        adrs.set_key_and_mask(2);
        let mask_r = self.prf_addr(adrs);
        self.hash.digest(&[
            &to_byte(PAD_H, N),
            &key,
            &xor(left, &mask_l),
            &xor(right, &mask_r),
        ])
    }

    pub fn h_msg(&self, r: &Hash32, root: &Hash32, index: u32, msg: &[u8]) -> Hash32 {
        self.hash.digest(&[
            &to_byte(PAD_HASH_MSG, N),
            r,
            root,
            &to_byte(index as u64, N),
            msg,
        ])
    }
}

/// Per-leaf WOTS seed: PRF(sk_seed, ADRS) with chain/hash/mask words zeroed.
pub fn leaf_seed(ctx: &HashCtx, sk_seed: &[u8; 32], ots_adrs: &HashAddress) -> Hash32 {
    let mut a = *ots_adrs;
    a.set_chain(0);
    a.set_hash(0);
    a.set_key_and_mask(0);
    ctx.prf(sk_seed, &a.to_bytes())
}

fn expand_seed(ctx: &HashCtx, seed: &Hash32) -> Vec<Hash32> {
    (0..LEN)
        .map(|i| {
            let mut ctr = [0u8; 32];
            ctr.copy_from_slice(&to_byte(i as u64, 32));
            ctx.prf(seed, &ctr)
        })
        .collect()
}

fn chain(ctx: &HashCtx, input: &Hash32, start: u32, steps: u32, adrs: &mut HashAddress) -> Hash32 {
    let mut out = *input;
    let mut i = start;
    while i < start + steps && i < W {
        adrs.set_hash(i);
        out = ctx.f(&out, adrs);
        i += 1;
    }
    out
}

fn base_w(input: &[u8], out_len: usize) -> Vec<u32> {
    let mut out = Vec::with_capacity(out_len);
    let mut bits = 0u32;
    let mut total = 0u32;
    let mut bytes = input.iter();
    while out.len() < out_len {
        if bits == 0 {
            total = *bytes.next().unwrap_or(&0) as u32;
            bits = 8;
        }
        bits -= LOG_W;
        out.push((total >> bits) & (W - 1));
    }
    out
}

/// Message digits followed by the checksum digits.
fn chain_lengths(msg: &Hash32) -> Vec<u32> {
    let mut lengths = base_w(msg, LEN1);
    let mut csum: u32 = lengths.iter().map(|&d| W - 1 - d).sum();
    csum <<= 8 - ((LEN2 as u32 * LOG_W) % 8);
    let csum_bytes = to_byte(csum as u64, ((LEN2 as u32 * LOG_W + 7) / 8) as usize);
    lengths.extend(base_w(&csum_bytes, LEN2));
    lengths
}

pub fn pk_gen(ctx: &HashCtx, seed: &Hash32, adrs: &mut HashAddress) -> Vec<Hash32> {
    expand_seed(ctx, seed)
        .iter()
        .enumerate()
        .map(|(i, sk)| {
            adrs.set_chain(i as u32);
            chain(ctx, sk, 0, W - 1, adrs)
        })
        .collect()
}

pub fn sign(ctx: &HashCtx, msg: &Hash32, seed: &Hash32, adrs: &mut HashAddress) -> Vec<Hash32> {
    let lengths = chain_lengths(msg);
    expand_seed(ctx, seed)
        .iter()
        .zip(lengths)
        .enumerate()
        .map(|(i, (sk, steps))| {
            adrs.set_chain(i as u32);
            chain(ctx, sk, 0, steps, adrs)
        })
        .collect()
}

pub fn pk_from_sig(ctx: &HashCtx, sig: &[Hash32], msg: &Hash32, adrs: &mut HashAddress) -> Vec<Hash32> {
    chain_lengths(msg)
        .into_iter()
        .zip(sig)
        .enumerate()
        .map(|(i, (start, s))| {
            adrs.set_chain(i as u32);
            chain(ctx, s, start, W - 1 - start, adrs)
        })
        .collect()
}
