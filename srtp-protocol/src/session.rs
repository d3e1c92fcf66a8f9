//! Keyed session state shared by the SRTP and SRTCP contexts
//!
//! `ActiveKeys` binds one set of derived session keys to the cipher and
//! authenticator built from them, tagged with the key derivation epoch
//! (`index DIV kdr`) they were derived for.

use srtp_crypto::{
    Block, CryptoPolicy, HmacSha1, PolicyError, SessionCipher, SessionKeys, BLOCK_SIZE, SALT_LEN,
};

pub(crate) struct ActiveKeys {
    pub epoch: u64,
    pub keys: SessionKeys,
    pub cipher: SessionCipher,
    pub auth: Option<HmacSha1>,
}

impl ActiveKeys {
    pub fn new(policy: &CryptoPolicy, keys: SessionKeys, epoch: u64) -> Result<Self, PolicyError> {
        let cipher = SessionCipher::new(policy.enc_type(), &keys)?;
        let auth = if policy.authenticates() {
            Some(HmacSha1::new(&keys.auth_key))
        } else {
            None
        };

        Ok(ActiveKeys {
            epoch,
            keys,
            cipher,
            auth,
        })
    }

    /// Counter mode IV: `salt << 16 ^ ssrc << 64 ^ index << 16`
    ///
    /// The same layout serves SRTP (48-bit index) and SRTCP (31-bit index).
    pub fn counter_iv(&self, ssrc: u32, index: u64) -> Block {
        let mut iv = [0u8; BLOCK_SIZE];
        iv[..SALT_LEN].copy_from_slice(&self.keys.salt_key[..SALT_LEN]);

        for (byte, s) in iv[4..8].iter_mut().zip(ssrc.to_be_bytes()) {
            *byte ^= s;
        }
        // low six bytes of the index land in bytes 8..14
        for (byte, i) in iv[8..14].iter_mut().zip(&index.to_be_bytes()[2..]) {
            *byte ^= i;
        }
        iv
    }
}
