//! Ed25519 signing and verification over agreement signature payloads
//!
//! addresses are base58-encoded ed25519 public keys, the same convention
//! the rest of the protocol's on-chain addresses use.

use acp_types::agreement::{PartySignature, SignaturePayload};
use acp_types::ids::AgreementId;
use acp_types::{AcpError, AcpResult};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::RngCore;

fn random_nonce_hex() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn decode_address(address: &str) -> AcpResult<VerifyingKey> {
    let raw = bs58::decode(address)
        .into_vec()
        .map_err(|e| AcpError::ValidationError(format!("address is not base58: {e}")))?;
    let bytes: [u8; 32] = raw
        .try_into()
        .map_err(|_| AcpError::ValidationError("address is not a 32-byte ed25519 key".into()))?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| AcpError::ValidationError(format!("invalid ed25519 key: {e}")))
}

/// signs `payload` with `signing_key`, returning the envelope stored on the
/// party record.
pub fn sign(
    agreement_id: &AgreementId,
    agreement_hash: &str,
    signer_address: &str,
    timestamp: i64,
    signing_key: &SigningKey,
) -> AcpResult<PartySignature> {
    let payload = SignaturePayload {
        agreement_id: agreement_id.clone(),
        agreement_hash: agreement_hash.to_string(),
        signer_address: signer_address.to_string(),
        timestamp,
        nonce: random_nonce_hex(),
    };
    let serialized = serde_json::to_vec(&payload)?;
    let signature: Signature = signing_key.sign(&serialized);

    Ok(PartySignature {
        payload,
        signature: bs58::encode(signature.to_bytes()).into_string(),
    })
}

/// re-serializes the payload and checks agreement binding plus the ed25519
/// signature; any mismatch is a verification failure, not an error to
/// propagate.
pub fn verify(agreement_id: &AgreementId, agreement_hash: &str, sig: &PartySignature) -> bool {
    if &sig.payload.agreement_id != agreement_id {
        return false;
    }
    if sig.payload.agreement_hash != agreement_hash {
        return false;
    }

    let Ok(public_key) = decode_address(&sig.payload.signer_address) else {
        return false;
    };
    let Ok(serialized) = serde_json::to_vec(&sig.payload) else {
        return false;
    };
    let Ok(sig_bytes) = bs58::decode(&sig.signature).into_vec() else {
        return false;
    };
    let Ok(sig_bytes): Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    let signature = Signature::from_bytes(&sig_bytes);

    public_key.verify(&serialized, &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    fn keypair() -> (SigningKey, String) {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();
        (signing_key, address)
    }

    #[test]
    fn sign_then_verify_roundtrips() {
        let (key, address) = keypair();
        let agreement_id = AgreementId::from("agr-1");
        let sig = sign(&agreement_id, "hash-abc", &address, 1000, &key).unwrap();
        assert!(verify(&agreement_id, "hash-abc", &sig));
    }

    #[test]
    fn verify_rejects_tampered_hash() {
        let (key, address) = keypair();
        let agreement_id = AgreementId::from("agr-1");
        let sig = sign(&agreement_id, "hash-abc", &address, 1000, &key).unwrap();
        assert!(!verify(&agreement_id, "different-hash", &sig));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let (key, _address) = keypair();
        let (_other_key, other_address) = keypair();
        let agreement_id = AgreementId::from("agr-1");
        let mut sig = sign(&agreement_id, "hash-abc", &other_address, 1000, &key).unwrap();
        sig.payload.signer_address = other_address;
        assert!(!verify(&agreement_id, "hash-abc", &sig));
    }
}
