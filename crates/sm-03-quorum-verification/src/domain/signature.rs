//! # Ed25519 Signature Checks
//!
//! A node signs the raw 48-byte content hash of the file it exported.
//! Verification uses `verify_strict` to reject malleable and small-order
//! encodings.

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use shared_types::FileHash;
use sm_01_node_registry::ConsensusNode;

use super::entities::{SignatureAssertion, SIGNATURE_LENGTH};

/// True when `assertion.signature` is a valid signature of
/// `assertion.claimed_hash` under `node`'s public key.
pub fn verify_assertion(node: &ConsensusNode, assertion: &SignatureAssertion) -> bool {
    if node.node_id != assertion.node_id {
        return false;
    }
    let Ok(key) = VerifyingKey::from_bytes(&node.public_key) else {
        return false;
    };
    let signature = Signature::from_bytes(&assertion.signature);
    key.verify_strict(assertion.claimed_hash.as_bytes(), &signature)
        .is_ok()
}

/// Sign a file hash the way an exporting node does.
pub fn sign_file_hash(key: &SigningKey, hash: &FileHash) -> [u8; SIGNATURE_LENGTH] {
    key.sign(hash.as_bytes()).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::StreamKind;

    fn keyed_node(id: u64) -> (SigningKey, ConsensusNode) {
        let key = SigningKey::from_bytes(&[id as u8; 32]);
        let node = ConsensusNode::new(id, key.verifying_key().to_bytes(), 10);
        (key, node)
    }

    fn assertion(id: u64, hash: FileHash, signature: [u8; 64]) -> SignatureAssertion {
        SignatureAssertion {
            node_id: id,
            kind: StreamKind::Transaction,
            period: 1,
            claimed_hash: hash,
            signature,
        }
    }

    #[test]
    fn test_valid_signature_verifies() {
        let (key, node) = keyed_node(3);
        let hash = FileHash::digest(b"file");
        let a = assertion(3, hash, sign_file_hash(&key, &hash));
        assert!(verify_assertion(&node, &a));
    }

    #[test]
    fn test_signature_over_other_hash_fails() {
        let (key, node) = keyed_node(3);
        let signed = FileHash::digest(b"file");
        let claimed = FileHash::digest(b"forged");
        let a = assertion(3, claimed, sign_file_hash(&key, &signed));
        assert!(!verify_assertion(&node, &a));
    }

    #[test]
    fn test_signature_from_other_key_fails() {
        let (_, node) = keyed_node(3);
        let (other_key, _) = keyed_node(4);
        let hash = FileHash::digest(b"file");
        let a = assertion(3, hash, sign_file_hash(&other_key, &hash));
        assert!(!verify_assertion(&node, &a));
    }

    #[test]
    fn test_node_id_mismatch_fails() {
        let (key, node) = keyed_node(3);
        let hash = FileHash::digest(b"file");
        let a = assertion(4, hash, sign_file_hash(&key, &hash));
        assert!(!verify_assertion(&node, &a));
    }

    #[test]
    fn test_garbage_signature_fails() {
        let (_, node) = keyed_node(3);
        let a = assertion(3, FileHash::digest(b"file"), [0xAB; 64]);
        assert!(!verify_assertion(&node, &a));
    }
}
