//! AES-256-CBC + HMAC-SHA256 message envelope
//!
//! Seal encrypts a payload under a per-message IV and authenticates the
//! plaintext; open decrypts and verifies before handing anything back.
//!
//! The per-message IV is `base_iv XOR modifier`, where the 16-byte modifier
//! is drawn from the OS random source and travels base64 encoded in the
//! security trailer as the nonce. The MAC is computed over the plaintext,
//! not the ciphertext. Padding is PKCS#7 on both ends.

use aes::Aes256;
use base64::{engine::general_purpose::STANDARD, Engine};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, ConstantTimeGreater};
use zeroize::Zeroizing;

use crate::error::{EnvelopeError, EnvelopeResult};

use super::bundle::KeyBundle;
use super::key_material::{KeyMaterial, IV_LEN, MAC_KEY_LEN};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;
type HmacSha256 = Hmac<Sha256>;

/// Wire format version carried in every trailer
pub const CRYPTO_VERSION: u32 = 1;
/// Size of the IV modifier in bytes
pub const NONCE_SIZE: usize = IV_LEN;
/// Size of the HMAC-SHA256 tag in bytes
pub const MAC_SIZE: usize = 32;
/// AES block size in bytes
const BLOCK_SIZE: usize = 16;

/// Side-channel metadata sent alongside a sealed payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityTrailer {
    /// Generation of the key block used
    #[serde(rename = "KeyVersion")]
    pub key_version: u32,
    /// Key family or platform
    #[serde(rename = "KeyIdentifier")]
    pub key_identifier: String,
    /// HMAC-SHA256 of the plaintext (base64 encoded)
    #[serde(rename = "Hmac", default)]
    pub mac: String,
    /// IV modifier (base64 encoded)
    #[serde(rename = "Nonce", default)]
    pub nonce: String,
    /// Envelope format version
    #[serde(rename = "AdyenCryptoVersion", default = "default_crypto_version")]
    pub crypto_version: u32,
}

fn default_crypto_version() -> u32 {
    CRYPTO_VERSION
}

/// Ciphertext and its trailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPayload {
    /// AES-256-CBC output (base64 encoded)
    #[serde(rename = "NexoBlob", default)]
    pub ciphertext: String,
    #[serde(rename = "SecurityTrailer")]
    pub trailer: SecurityTrailer,
}

impl SecurityTrailer {
    fn decode_nonce(&self) -> EnvelopeResult<[u8; NONCE_SIZE]> {
        if self.nonce.is_empty() {
            return Err(EnvelopeError::missing_field("Nonce"));
        }
        let bytes = STANDARD
            .decode(&self.nonce)
            .map_err(|e| EnvelopeError::Decode(format!("Invalid nonce encoding: {}", e)))?;

        <[u8; NONCE_SIZE]>::try_from(bytes.as_slice()).map_err(|_| {
            EnvelopeError::Decode(format!(
                "Invalid nonce size: expected {}, got {}",
                NONCE_SIZE,
                bytes.len()
            ))
        })
    }

    fn decode_mac(&self) -> EnvelopeResult<Vec<u8>> {
        if self.mac.is_empty() {
            return Err(EnvelopeError::missing_field("Hmac"));
        }
        STANDARD
            .decode(&self.mac)
            .map_err(|e| EnvelopeError::Decode(format!("Invalid MAC encoding: {}", e)))
    }
}

impl SealedPayload {
    fn decode_ciphertext(&self) -> EnvelopeResult<Vec<u8>> {
        if self.ciphertext.is_empty() {
            return Err(EnvelopeError::missing_field("NexoBlob"));
        }
        STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| EnvelopeError::Decode(format!("Invalid ciphertext encoding: {}", e)))
    }
}

/// Seals and opens payloads with one key bundle
///
/// Holds only a shared reference, so it is `Copy` and can be handed to any
/// number of threads.
#[derive(Debug, Clone, Copy)]
pub struct Envelope<'k> {
    keys: &'k KeyBundle,
}

impl<'k> Envelope<'k> {
    /// Create an envelope over the given key bundle
    pub fn new(keys: &'k KeyBundle) -> Self {
        Self { keys }
    }

    /// Encrypt and authenticate `plaintext`
    ///
    /// # Errors
    ///
    /// Returns `RandomSourceUnavailable` if the OS random source fails.
    /// There is no fallback source.
    pub fn seal(&self, plaintext: &[u8]) -> EnvelopeResult<SealedPayload> {
        let iv_modifier = random_iv_modifier()?;
        self.seal_with_modifier(plaintext, &iv_modifier)
    }

    pub(crate) fn seal_with_modifier(
        &self,
        plaintext: &[u8],
        iv_modifier: &[u8; NONCE_SIZE],
    ) -> EnvelopeResult<SealedPayload> {
        let material = self.keys.material();
        let iv = effective_iv(material.base_iv(), iv_modifier);

        let ciphertext = Aes256CbcEnc::new(material.cipher_key().into(), (&*iv).into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        let mac = compute_mac(material.mac_key(), plaintext)?;

        tracing::debug!(
            plaintext_len = plaintext.len(),
            ciphertext_len = ciphertext.len(),
            key_version = self.keys.version(),
            "sealed payload"
        );

        Ok(SealedPayload {
            ciphertext: STANDARD.encode(&ciphertext),
            trailer: SecurityTrailer {
                key_version: self.keys.version(),
                key_identifier: self.keys.identifier().to_string(),
                mac: STANDARD.encode(mac),
                nonce: STANDARD.encode(iv_modifier),
                crypto_version: CRYPTO_VERSION,
            },
        })
    }

    /// Verify and decrypt a sealed payload
    ///
    /// Never returns plaintext that failed verification.
    ///
    /// # Errors
    ///
    /// - `Decode` if the ciphertext, nonce or MAC is absent or not valid
    ///   base64, the nonce is not 16 bytes, or the crypto version is unknown.
    /// - `AuthenticationFailed` for everything that is detected after
    ///   decoding: MAC mismatch, wrong MAC length, bad padding, or a
    ///   ciphertext that is not block aligned.
    pub fn open(&self, sealed: &SealedPayload) -> EnvelopeResult<Zeroizing<Vec<u8>>> {
        let trailer = &sealed.trailer;
        if trailer.crypto_version != CRYPTO_VERSION {
            return Err(EnvelopeError::Decode(format!(
                "Unsupported crypto version: {}",
                trailer.crypto_version
            )));
        }
        if trailer.key_identifier != self.keys.identifier()
            || trailer.key_version != self.keys.version()
        {
            tracing::warn!(
                trailer_key_identifier = %trailer.key_identifier,
                trailer_key_version = trailer.key_version,
                key_identifier = %self.keys.identifier(),
                key_version = self.keys.version(),
                "trailer names a different key"
            );
        }

        let ciphertext = sealed.decode_ciphertext()?;
        let iv_modifier = trailer.decode_nonce()?;
        let received_mac = trailer.decode_mac()?;

        let result = open_verified(self.keys.material(), ciphertext, &iv_modifier, &received_mac);
        match &result {
            Ok(plaintext) => tracing::debug!(
                plaintext_len = plaintext.len(),
                key_version = self.keys.version(),
                "opened payload"
            ),
            Err(_) => tracing::warn!(
                key_version = trailer.key_version,
                "payload failed authentication"
            ),
        }
        result
    }
}

/// Decrypt, then verify the MAC over the candidate plaintext.
///
/// Padding validity and MAC equality are combined without branching so
/// that a padding failure costs the same as a MAC mismatch.
fn open_verified(
    material: &KeyMaterial,
    ciphertext: Vec<u8>,
    iv_modifier: &[u8; NONCE_SIZE],
    received_mac: &[u8],
) -> EnvelopeResult<Zeroizing<Vec<u8>>> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(EnvelopeError::AuthenticationFailed);
    }

    let iv = effective_iv(material.base_iv(), iv_modifier);
    let mut buffer = Zeroizing::new(ciphertext);
    Aes256CbcDec::new(material.cipher_key().into(), (&*iv).into())
        .decrypt_padded_mut::<NoPadding>(buffer.as_mut_slice())
        .map_err(|_| EnvelopeError::AuthenticationFailed)?;

    let (candidate_len, padding_ok) = pkcs7_unpadded_len(&buffer);
    let expected_mac = compute_mac(material.mac_key(), &buffer[..candidate_len])?;
    let mac_ok = macs_match(&expected_mac, received_mac);

    if bool::from(padding_ok & mac_ok) {
        buffer.truncate(candidate_len);
        Ok(buffer)
    } else {
        Err(EnvelopeError::AuthenticationFailed)
    }
}

/// `base_iv[i] ^ modifier[i]` for every byte
fn effective_iv(base_iv: &[u8; IV_LEN], modifier: &[u8; NONCE_SIZE]) -> Zeroizing<[u8; IV_LEN]> {
    let mut iv = Zeroizing::new([0u8; IV_LEN]);
    for (out, (b, m)) in iv.iter_mut().zip(base_iv.iter().zip(modifier.iter())) {
        *out = b ^ m;
    }
    iv
}

fn compute_mac(mac_key: &[u8; MAC_KEY_LEN], data: &[u8]) -> EnvelopeResult<[u8; MAC_SIZE]> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(mac_key).map_err(|_| {
        EnvelopeError::InvalidKeyLength {
            expected: MAC_KEY_LEN,
            actual: mac_key.len(),
        }
    })?;
    mac.update(data);

    let mut tag = [0u8; MAC_SIZE];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Fixed-time comparison. A length mismatch compares unequal.
fn macs_match(expected: &[u8], received: &[u8]) -> Choice {
    expected.ct_eq(received)
}

/// Length of the plaintext once PKCS#7 padding is stripped, and whether the
/// padding was well formed. Inspects the whole last block every time.
fn pkcs7_unpadded_len(buffer: &[u8]) -> (usize, Choice) {
    let len = buffer.len();
    let last_block = &buffer[len - BLOCK_SIZE..];
    let pad = last_block[BLOCK_SIZE - 1];

    let mut valid = !pad.ct_eq(&0u8) & !pad.ct_gt(&(BLOCK_SIZE as u8));
    for (i, byte) in last_block.iter().rev().enumerate() {
        let in_padding = pad.ct_gt(&(i as u8));
        valid &= !in_padding | byte.ct_eq(&pad);
    }

    let stripped = len.saturating_sub(pad as usize) as u64;
    let candidate = u64::conditional_select(&(len as u64), &stripped, valid);
    (candidate as usize, valid)
}

fn random_iv_modifier() -> EnvelopeResult<[u8; NONCE_SIZE]> {
    let mut modifier = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut modifier)
        .map_err(|e| EnvelopeError::RandomSourceUnavailable(e.to_string()))?;
    Ok(modifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PAYLOAD: &[u8] = br#"{"SaleToPOIRequest":{"MessageHeader":{"MessageType":"Request"}}}"#;

    fn test_bundle() -> KeyBundle {
        let block: Vec<u8> = (0u8..80).collect();
        KeyBundle::new("test", 7, KeyMaterial::from_bytes(&block).unwrap())
    }

    fn other_bundle() -> KeyBundle {
        let block: Vec<u8> = (0u8..80).map(|b| b.wrapping_mul(3).wrapping_add(1)).collect();
        KeyBundle::new("test", 7, KeyMaterial::from_bytes(&block).unwrap())
    }

    fn flip_bit(encoded: &str, index: usize, bit: u8) -> String {
        let mut bytes = STANDARD.decode(encoded).unwrap();
        bytes[index] ^= 1 << bit;
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);

        let sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        let opened = envelope.open(&sealed).unwrap();

        assert_eq!(opened.as_slice(), TEST_PAYLOAD);
    }

    #[test]
    fn test_roundtrip_all_lengths_around_block_boundaries() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);

        for len in 0..=49 {
            let plaintext: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let sealed = envelope.seal(&plaintext).unwrap();
            let ciphertext = STANDARD.decode(&sealed.ciphertext).unwrap();
            assert_eq!(ciphertext.len(), (len / BLOCK_SIZE + 1) * BLOCK_SIZE);

            let opened = envelope.open(&sealed).unwrap();
            assert_eq!(opened.as_slice(), plaintext.as_slice(), "length {}", len);
        }
    }

    #[test]
    fn test_large_plaintext() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let plaintext: Vec<u8> = (0..10000).map(|i| (i % 256) as u8).collect();

        let sealed = envelope.seal(&plaintext).unwrap();
        assert_eq!(envelope.open(&sealed).unwrap().as_slice(), plaintext.as_slice());
    }

    #[test]
    fn test_golden_vector_zero_modifier() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        assert_eq!(TEST_PAYLOAD.len(), 64);

        let sealed = envelope.seal_with_modifier(TEST_PAYLOAD, &[0u8; NONCE_SIZE]).unwrap();

        assert_eq!(
            sealed.ciphertext,
            "Xwr4DLykCUCzW5iPFXGcxb/OdT6HV9ceo9dokPcspmzluAMnc/DeZJUXuOlicjXIBZyiZdLOPe6Kd4uDVhLsd442m/lCCSsMWwfXVmrJY04="
        );
        assert_eq!(sealed.trailer.mac, "ukUThjcV0cc6Qb0sw4JBRNZaU5tkjnOz8BJ4pojTBbg=");
        assert_eq!(sealed.trailer.nonce, "AAAAAAAAAAAAAAAAAAAAAA==");
        assert_eq!(sealed.trailer.key_identifier, "test");
        assert_eq!(sealed.trailer.key_version, 7);
        assert_eq!(sealed.trailer.crypto_version, CRYPTO_VERSION);

        assert_eq!(envelope.open(&sealed).unwrap().as_slice(), TEST_PAYLOAD);
    }

    #[test]
    fn test_golden_vector_provisioned_key() {
        let bundle = KeyBundle::provisioned();
        let envelope = Envelope::new(&bundle);
        let modifier: [u8; NONCE_SIZE] = core::array::from_fn(|i| i as u8);

        let sealed = envelope.seal_with_modifier(TEST_PAYLOAD, &modifier).unwrap();

        assert_eq!(
            sealed.ciphertext,
            "2TjU2dU0M1Ci7dhwSu5lfDbJYujC2T9DETv/dcwRaXJJdvqsUU7ipJu78XUUHNC1K6bONBn87YBqMZ67QjcRYQCkKPJClCSH0KmUDp/1YT4="
        );
        assert_eq!(sealed.trailer.mac, "qL4lYeQvPvs6M9cx0jMrE21EJ60Kfd7G8ZS5PLXUKIw=");
        assert_eq!(sealed.trailer.key_identifier, "ios");
        assert_eq!(sealed.trailer.key_version, 1);
    }

    #[test]
    fn test_effective_iv_is_xor() {
        let base = [0b1010_1010u8; IV_LEN];
        let modifier = [0b0110_0110u8; NONCE_SIZE];
        let iv = effective_iv(&base, &modifier);
        assert!(iv.iter().all(|b| *b == 0b1100_1100));

        let zero = effective_iv(&base, &[0u8; NONCE_SIZE]);
        assert_eq!(*zero, base);
    }

    #[test]
    fn test_mac_is_deterministic_across_seals() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);

        let first = envelope.seal(TEST_PAYLOAD).unwrap();
        let second = envelope.seal(TEST_PAYLOAD).unwrap();

        assert_eq!(first.trailer.mac, second.trailer.mac);
    }

    #[test]
    fn test_ciphertext_and_nonce_differ_across_seals() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);

        let first = envelope.seal(TEST_PAYLOAD).unwrap();
        let second = envelope.seal(TEST_PAYLOAD).unwrap();

        assert_ne!(first.trailer.nonce, second.trailer.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_any_ciphertext_bit_flip_fails_authentication() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        let len = STANDARD.decode(&sealed.ciphertext).unwrap().len();

        for index in 0..len {
            for bit in [0u8, 3, 7] {
                let mut tampered = sealed.clone();
                tampered.ciphertext = flip_bit(&sealed.ciphertext, index, bit);
                let err = envelope.open(&tampered).unwrap_err();
                assert!(err.is_authentication_failure(), "byte {} bit {}", index, bit);
            }
        }
    }

    #[test]
    fn test_any_mac_bit_flip_fails_authentication() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let sealed = envelope.seal(TEST_PAYLOAD).unwrap();

        for index in 0..MAC_SIZE {
            let mut tampered = sealed.clone();
            tampered.trailer.mac = flip_bit(&sealed.trailer.mac, index, (index % 8) as u8);
            let err = envelope.open(&tampered).unwrap_err();
            assert!(err.is_authentication_failure(), "byte {}", index);
        }
    }

    #[test]
    fn test_any_nonce_bit_flip_fails_authentication() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let sealed = envelope.seal(TEST_PAYLOAD).unwrap();

        for index in 0..NONCE_SIZE {
            for bit in 0..8 {
                let mut tampered = sealed.clone();
                tampered.trailer.nonce = flip_bit(&sealed.trailer.nonce, index, bit);
                let err = envelope.open(&tampered).unwrap_err();
                assert!(err.is_authentication_failure(), "byte {} bit {}", index, bit);
            }
        }
    }

    #[test]
    fn test_truncated_mac_fails_authentication() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();

        let mac = STANDARD.decode(&sealed.trailer.mac).unwrap();
        sealed.trailer.mac = STANDARD.encode(&mac[..MAC_SIZE - 1]);

        assert!(envelope.open(&sealed).unwrap_err().is_authentication_failure());
    }

    #[test]
    fn test_unaligned_ciphertext_fails_authentication() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();

        let mut ciphertext = STANDARD.decode(&sealed.ciphertext).unwrap();
        ciphertext.pop();
        sealed.ciphertext = STANDARD.encode(&ciphertext);

        assert!(envelope.open(&sealed).unwrap_err().is_authentication_failure());
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let sealing = test_bundle();
        let opening = other_bundle();

        let sealed = Envelope::new(&sealing).seal(TEST_PAYLOAD).unwrap();
        let err = Envelope::new(&opening).open(&sealed).unwrap_err();

        assert!(err.is_authentication_failure());
    }

    #[test]
    fn test_non_base64_mac_is_decode_error() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        sealed.trailer.mac = "not*base64!".to_string();

        assert!(envelope.open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_non_base64_nonce_is_decode_error() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        sealed.trailer.nonce = "%%%%".to_string();

        assert!(envelope.open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_non_base64_ciphertext_is_decode_error() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        sealed.ciphertext = "@@@".to_string();

        assert!(envelope.open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_short_nonce_is_decode_error() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        sealed.trailer.nonce = STANDARD.encode([0u8; 8]);

        assert!(envelope.open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_absent_fields_are_decode_errors() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let sealed = envelope.seal(TEST_PAYLOAD).unwrap();

        let mut no_mac = sealed.clone();
        no_mac.trailer.mac.clear();
        assert!(envelope.open(&no_mac).unwrap_err().is_decode());

        let mut no_nonce = sealed.clone();
        no_nonce.trailer.nonce.clear();
        assert!(envelope.open(&no_nonce).unwrap_err().is_decode());

        let mut no_blob = sealed;
        no_blob.ciphertext.clear();
        assert!(envelope.open(&no_blob).unwrap_err().is_decode());
    }

    #[test]
    fn test_missing_trailer_fields_deserialize_as_absent() {
        let json = r#"{"NexoBlob":"AAAA","SecurityTrailer":{"KeyVersion":1,"KeyIdentifier":"ios"}}"#;
        let sealed: SealedPayload = serde_json::from_str(json).unwrap();
        assert!(sealed.trailer.mac.is_empty());
        assert_eq!(sealed.trailer.crypto_version, CRYPTO_VERSION);

        let bundle = test_bundle();
        assert!(Envelope::new(&bundle).open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_unknown_crypto_version_is_decode_error() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);
        let mut sealed = envelope.seal(TEST_PAYLOAD).unwrap();
        sealed.trailer.crypto_version = 2;

        assert!(envelope.open(&sealed).unwrap_err().is_decode());
    }

    #[test]
    fn test_trailer_serializes_with_wire_names() {
        let bundle = test_bundle();
        let sealed = Envelope::new(&bundle).seal(b"x").unwrap();
        let json = serde_json::to_value(&sealed).unwrap();

        assert!(json.get("NexoBlob").is_some());
        let trailer = &json["SecurityTrailer"];
        assert_eq!(trailer["KeyVersion"], 7);
        assert_eq!(trailer["KeyIdentifier"], "test");
        assert!(trailer["Hmac"].is_string());
        assert!(trailer["Nonce"].is_string());
        assert_eq!(trailer["AdyenCryptoVersion"], 1);
    }

    #[test]
    fn test_pkcs7_unpadded_len() {
        let mut block = [0u8; BLOCK_SIZE];
        block[12..].copy_from_slice(&[4, 4, 4, 4]);
        let (len, ok) = pkcs7_unpadded_len(&block);
        assert!(bool::from(ok));
        assert_eq!(len, 12);

        let full = [16u8; BLOCK_SIZE];
        let (len, ok) = pkcs7_unpadded_len(&full);
        assert!(bool::from(ok));
        assert_eq!(len, 0);

        let mut bad = [0u8; BLOCK_SIZE];
        bad[13..].copy_from_slice(&[4, 4, 4]);
        assert!(!bool::from(pkcs7_unpadded_len(&bad).1));

        let zero = [0u8; BLOCK_SIZE];
        assert!(!bool::from(pkcs7_unpadded_len(&zero).1));

        let too_big = [17u8; BLOCK_SIZE];
        let (len, ok) = pkcs7_unpadded_len(&too_big);
        assert!(!bool::from(ok));
        assert_eq!(len, BLOCK_SIZE);
    }

    #[test]
    fn test_envelope_shared_across_threads() {
        let bundle = test_bundle();
        let envelope = Envelope::new(&bundle);

        std::thread::scope(|scope| {
            for i in 0..4u8 {
                scope.spawn(move || {
                    let payload = vec![i; 100];
                    let sealed = envelope.seal(&payload).unwrap();
                    assert_eq!(envelope.open(&sealed).unwrap().as_slice(), payload.as_slice());
                });
            }
        });
    }
}
