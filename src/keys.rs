//! Private key normalization and public key derivation.

use bech32::Hrp;
use secp256k1::{Keypair, Secp256k1, SecretKey};

use crate::error::Error;

/// Derive the secret scalar and hex-encoded x-only public key from a
/// caller-supplied private key.
///
/// Accepts either a raw 64-character hex scalar or the bech32 `nsec1...`
/// form. Surrounding whitespace is ignored. The pair is computed fresh on
/// every call and never cached.
pub fn derive_keys(raw: &str) -> Result<(SecretKey, String), Error> {
    let trimmed = raw.trim();
    let bytes = if trimmed.starts_with("nsec") {
        decode_nsec(trimmed)?
    } else {
        hex::decode(trimmed).map_err(|e| Error::InvalidKeyEncoding(e.to_string()))?
    };
    let secret =
        SecretKey::from_slice(&bytes).map_err(|e| Error::InvalidKeyEncoding(e.to_string()))?;
    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, &secret);
    let pubkey = hex::encode(keypair.x_only_public_key().0.serialize());
    Ok((secret, pubkey))
}

/// Decode an `nsec1...` string into the raw 32-byte secret scalar.
fn decode_nsec(encoded: &str) -> Result<Vec<u8>, Error> {
    let expected = Hrp::parse("nsec").map_err(|e| Error::InvalidKeyEncoding(e.to_string()))?;
    let (hrp, data) = bech32::decode(encoded).map_err(|e| Error::InvalidKeyEncoding(e.to_string()))?;
    if hrp != expected {
        return Err(Error::InvalidKeyEncoding(format!(
            "expected nsec prefix, got {hrp}"
        )));
    }
    if data.len() != 32 {
        return Err(Error::InvalidKeyEncoding(format!(
            "expected 32 bytes, got {}",
            data.len()
        )));
    }
    Ok(data)
}
