//! HMAC-SHA1 Authenticator
//!
//! Keyed message authentication over an ordered list of byte spans. SRTP
//! feeds the authenticated portion of the packet followed by the 4-byte
//! rollover counter; SRTCP feeds the packet followed by the E-flag/index word.

use crate::policy::HMAC_SHA1_TAG_MAX;
use ring::hmac;
use subtle::ConstantTimeEq;

/// Full-length HMAC-SHA1 tag
pub type Tag = [u8; HMAC_SHA1_TAG_MAX];

/// HMAC-SHA1 keyed with a session authentication key
#[derive(Debug, Clone)]
pub struct HmacSha1 {
    key: hmac::Key,
}

impl HmacSha1 {
    pub fn new(auth_key: &[u8]) -> Self {
        HmacSha1 {
            key: hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, auth_key),
        }
    }

    /// Compute the full 20-byte tag over the concatenation of `chunks`
    pub fn authenticate(&self, chunks: &[&[u8]]) -> Tag {
        let mut ctx = hmac::Context::with_key(&self.key);
        for chunk in chunks {
            ctx.update(chunk);
        }

        let mut tag = [0u8; HMAC_SHA1_TAG_MAX];
        tag.copy_from_slice(ctx.sign().as_ref());
        tag
    }

    /// Check a (possibly truncated) received tag in constant time
    pub fn verify(&self, chunks: &[&[u8]], received: &[u8]) -> bool {
        if received.is_empty() || received.len() > HMAC_SHA1_TAG_MAX {
            return false;
        }
        let expected = self.authenticate(chunks);
        constant_time_eq(&expected[..received.len()], received)
    }
}

/// Constant-time slice comparison; slices of different length never match
#[inline]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc2202_vector() {
        // RFC 2202 test case 2
        let mac = HmacSha1::new(b"Jefe");
        let data: &[u8] = b"what do ya want for nothing?";
        let tag = mac.authenticate(&[data]);
        assert_eq!(
            tag,
            [
                0xef, 0xfc, 0xdf, 0x6a, 0xe5, 0xeb, 0x2f, 0xa2, 0xd2, 0x74, 0x16, 0xd5, 0xf1, 0x84,
                0xdf, 0x9c, 0x25, 0x9a, 0x7c, 0x79
            ]
        );
    }

    #[test]
    fn test_chunks_equal_concatenation() {
        let mac = HmacSha1::new(&[0x0bu8; 20]);
        let whole: &[u8] = b"header+payload\x00\x00\x00\x01";
        let head: &[u8] = b"header+";
        let body: &[u8] = b"payload";
        let roc: &[u8] = &[0, 0, 0, 1];
        assert_eq!(mac.authenticate(&[whole]), mac.authenticate(&[head, body, roc]));
    }

    #[test]
    fn test_verify_truncated() {
        let mac = HmacSha1::new(&[1u8; 20]);
        let packet: &[u8] = b"packet";
        let roc0: &[u8] = &[0, 0, 0, 0];
        let roc1: &[u8] = &[0, 0, 0, 1];
        let tag = mac.authenticate(&[packet, roc0]);

        assert!(mac.verify(&[packet, roc0], &tag[..10]));
        assert!(mac.verify(&[packet, roc0], &tag[..4]));
        // same bytes under a different rollover counter
        assert!(!mac.verify(&[packet, roc1], &tag[..10]));

        let mut bad = tag;
        bad[9] ^= 0x01;
        assert!(!mac.verify(&[packet, roc0], &bad[..10]));
    }

    #[test]
    fn test_verify_rejects_empty_tag() {
        let mac = HmacSha1::new(&[1u8; 20]);
        let packet: &[u8] = b"packet";
        assert!(!mac.verify(&[packet], &[]));
    }

    #[test]
    fn test_constant_time_eq_lengths() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"ab"));
    }
}
