use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};

type HmacMd5 = Hmac<Md5>;

/// Keyed hash producing a lowercase hex digest.
///
/// Implementations must return at least 12 hex characters; nonces are cut
/// from the tail of the digest.
pub trait KeyedDigest: Send + Sync {
    fn digest_hex(&self, message: &[u8], key: &[u8]) -> String;
}

/// RFC 2104 HMAC over MD5, 32 hex characters.
///
/// Kept for compatibility with tokens issued by existing deployments; the
/// tail extraction in [`derive_nonce`](crate::derive_nonce) depends on this
/// exact byte layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacMd5Digest;

impl KeyedDigest for HmacMd5Digest {
    fn digest_hex(&self, message: &[u8], key: &[u8]) -> String {
        hmac_md5_hex(message, key)
    }
}

/// HMAC-MD5 of `message` under `key` as 32 lowercase hex characters.
///
/// Keys longer than the 64-byte block are hashed down first; shorter ones
/// are zero-padded.
pub fn hmac_md5_hex(message: &[u8], key: &[u8]) -> String {
    let mut block = Key::<HmacMd5>::default();
    if key.len() > block.len() {
        let hashed = Md5::digest(key);
        block[..hashed.len()].copy_from_slice(&hashed);
    } else {
        block[..key.len()].copy_from_slice(key);
    }
    let mut mac = <HmacMd5 as KeyInit>::new(&block);
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}
