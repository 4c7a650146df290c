//! Nostr event model and codec.

use secp256k1::{schnorr::Signature, Keypair, Message, Secp256k1, SecretKey, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Error;

/// Kind number for a short text note.
pub const KIND_TEXT_NOTE: u32 = 1;

/// Wrapper for a Nostr tag expressed as an array of strings.
///
/// Tags appear as small arrays where the first element denotes the type and
/// the following elements hold data (`["e", "<event id>"]`,
/// `["p", "<pubkey>"]`, ...). Notes published by this client carry no tags,
/// but tags on received events are preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag(pub Vec<String>);

/// A Nostr event as exchanged with relays.
///
/// ```json
/// {
///   "id": "aa11",
///   "pubkey": "deadbeef",
///   "kind": 1,
///   "created_at": 1700000000,
///   "tags": [],
///   "content": "hello",
///   "sig": "deadbeef"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Event identifier (hex of SHA-256 over the canonical serialization).
    pub id: String,
    /// Author public key (hex, x-only).
    pub pubkey: String,
    /// Kind number, e.g. `1`.
    pub kind: u32,
    /// Unix timestamp of creation, seconds.
    pub created_at: u64,
    /// Ordered tag list.
    pub tags: Vec<Tag>,
    /// Event content body.
    pub content: String,
    /// Schnorr signature over the event id; empty until signed.
    pub sig: String,
}

impl Event {
    /// Build an unsigned kind-1 text note with its id computed.
    pub fn text_note(pubkey: &str, created_at: u64, content: &str) -> Result<Self, Error> {
        let mut ev = Event {
            id: String::new(),
            pubkey: pubkey.into(),
            kind: KIND_TEXT_NOTE,
            created_at,
            tags: vec![],
            content: content.into(),
            sig: String::new(),
        };
        ev.id = hex::encode(event_hash(&ev)?);
        Ok(ev)
    }
}

/// Compute the Nostr event hash from its fields.
///
/// The canonical form is the array `[0, pubkey, created_at, kind, tags,
/// content]`; field order and types are fixed. The id of an event received
/// over the wire is recomputed from this, never trusted.
pub fn event_hash(ev: &Event) -> Result<[u8; 32], Error> {
    let arr = serde_json::json!([0, ev.pubkey, ev.created_at, ev.kind, ev.tags, ev.content]);
    let data = serde_json::to_vec(&arr)?;
    let hash = Sha256::digest(&data);
    Ok(hash.into())
}

/// Sign the event id with the given secret, filling in `sig`.
pub fn sign_event(ev: &mut Event, secret: &SecretKey) -> Result<(), Error> {
    let digest = hex::decode(&ev.id).map_err(|e| Error::Signing(e.to_string()))?;
    let msg = Message::from_digest_slice(&digest).map_err(|e| Error::Signing(e.to_string()))?;
    let secp = Secp256k1::new();
    let keypair = Keypair::from_secret_key(&secp, secret);
    let sig = secp.sign_schnorr_no_aux_rand(&msg, &keypair);
    ev.sig = hex::encode(sig.as_ref());
    Ok(())
}

/// Verify an event's id and Schnorr signature.
///
/// Returns `Ok(false)` when the recomputed id does not match the stored one
/// or the signature does not check out; errors only when a field that should
/// be hex cannot be decoded at all.
pub fn verify_event(ev: &Event) -> Result<bool, Error> {
    let hash = event_hash(ev)?;
    if hex::encode(hash) != ev.id {
        return Ok(false);
    }
    let sig_bytes = hex::decode(&ev.sig).map_err(|e| Error::MalformedEvent(e.to_string()))?;
    let sig =
        Signature::from_slice(&sig_bytes).map_err(|e| Error::MalformedEvent(e.to_string()))?;
    let pk_bytes = hex::decode(&ev.pubkey).map_err(|e| Error::MalformedEvent(e.to_string()))?;
    let pk =
        XOnlyPublicKey::from_slice(&pk_bytes).map_err(|e| Error::MalformedEvent(e.to_string()))?;
    let msg = Message::from_digest_slice(&hash).map_err(|e| Error::MalformedEvent(e.to_string()))?;
    let secp = Secp256k1::verification_only();
    Ok(secp.verify_schnorr(&sig, &msg, &pk).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::derive_keys;

    fn signed_note(content: &str) -> Event {
        let (secret, pubkey) = derive_keys(&"01".repeat(32)).unwrap();
        let mut ev = Event::text_note(&pubkey, 1700000000, content).unwrap();
        sign_event(&mut ev, &secret).unwrap();
        ev
    }

    #[test]
    fn event_hash_matches_reference() {
        let ev = Event {
            id: String::new(),
            pubkey: "00".repeat(32),
            kind: 1,
            created_at: 1,
            tags: vec![],
            content: String::new(),
            sig: String::new(),
        };
        let expected = {
            let obj =
                serde_json::json!([0, ev.pubkey, ev.created_at, ev.kind, ev.tags, ev.content]);
            let mut hasher = Sha256::new();
            hasher.update(serde_json::to_vec(&obj).unwrap());
            let bytes = hasher.finalize();
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&bytes);
            arr
        };
        assert_eq!(event_hash(&ev).unwrap(), expected);
    }

    #[test]
    fn hash_is_deterministic() {
        let ev = signed_note("hello");
        assert_eq!(event_hash(&ev).unwrap(), event_hash(&ev).unwrap());
    }

    #[test]
    fn changing_any_field_changes_the_id() {
        let base = signed_note("hello");
        let base_hash = event_hash(&base).unwrap();

        let mut ev = base.clone();
        ev.pubkey = "ff".repeat(32);
        assert_ne!(event_hash(&ev).unwrap(), base_hash);

        let mut ev = base.clone();
        ev.created_at += 1;
        assert_ne!(event_hash(&ev).unwrap(), base_hash);

        let mut ev = base.clone();
        ev.kind = 2;
        assert_ne!(event_hash(&ev).unwrap(), base_hash);

        let mut ev = base.clone();
        ev.tags = vec![Tag(vec!["t".into(), "x".into()])];
        assert_ne!(event_hash(&ev).unwrap(), base_hash);

        let mut ev = base;
        ev.content = "hello!".into();
        assert_ne!(event_hash(&ev).unwrap(), base_hash);
    }

    #[test]
    fn text_note_has_computed_id_and_no_sig() {
        let ev = Event::text_note(&"ab".repeat(32), 42, "note").unwrap();
        assert_eq!(ev.kind, KIND_TEXT_NOTE);
        assert!(ev.tags.is_empty());
        assert_eq!(ev.id, hex::encode(event_hash(&ev).unwrap()));
        assert!(ev.sig.is_empty());
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let ev = signed_note("hello");
        assert!(verify_event(&ev).unwrap());
    }

    #[test]
    fn tampered_content_fails_verification() {
        let mut ev = signed_note("hello");
        ev.content = "tampered".into();
        assert!(!verify_event(&ev).unwrap());
    }

    #[test]
    fn tampered_timestamp_fails_verification() {
        let mut ev = signed_note("hello");
        ev.created_at += 1;
        assert!(!verify_event(&ev).unwrap());
    }

    #[test]
    fn tampered_id_fails_verification() {
        let mut ev = signed_note("hello");
        ev.id = "ff".repeat(32);
        assert!(!verify_event(&ev).unwrap());
    }

    #[test]
    fn tampered_sig_fails_verification() {
        let mut ev = signed_note("hello");
        ev.sig = "00".repeat(64);
        assert!(!verify_event(&ev).unwrap());
    }

    #[test]
    fn sign_requires_a_computed_id() {
        let (secret, pubkey) = derive_keys(&"01".repeat(32)).unwrap();
        let mut ev = Event::text_note(&pubkey, 1, "x").unwrap();
        ev.id = String::new();
        assert!(matches!(sign_event(&mut ev, &secret), Err(Error::Signing(_))));
    }

    #[test]
    fn serde_round_trips_wire_shape() {
        let ev = signed_note("hello");
        let json = serde_json::to_string(&ev).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(ev, back);
    }
}
