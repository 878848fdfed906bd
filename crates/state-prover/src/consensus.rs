//! Consensus-finality checking for a single anchor (§4.C steps L1C/L2C).

use crate::error::StateProverError;
use certen_rpc::{CommitRecord, ValidatorRecord};
use certen_types::Hash;

/// Result of checking that an anchor was finalised by a BFT commit at
/// `height = local_block + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusFinalityProof {
    /// Consensus height the commit was fetched at.
    pub height: u64,
    /// Total voting power across the fetched validator set.
    pub total_power: u64,
    /// Voting power verified as having signed a commit vote.
    pub signed_power: u64,
    /// Minimum signed power required: `⌊total·2/3⌋ + 1`.
    pub required_power: u64,
}

/// `⌊total·2/3⌋ + 1`.
fn required_power(total: u64) -> u64 {
    (total * 2) / 3 + 1
}

/// Recompute a deterministic hash over the validator set, in the order the
/// node returned it, for comparison against `commit.validators_hash`.
///
/// Grounded in the receipt-folding style used throughout this codebase:
/// every validator's `(address, public_key, voting_power)` is concatenated
/// in order and hashed once, rather than built into a tree (the header only
/// ever needs to check the set as a whole, never prove membership of one
/// validator against it).
pub fn validator_set_hash(validators: &[ValidatorRecord]) -> Hash {
    let mut parts: Vec<&[u8]> = Vec::with_capacity(validators.len() * 3);
    let mut power_bytes = Vec::with_capacity(validators.len());
    for v in validators {
        power_bytes.push(v.voting_power.to_be_bytes());
    }
    for (i, v) in validators.iter().enumerate() {
        parts.push(v.address.as_bytes());
        parts.push(&v.public_key);
        parts.push(&power_bytes[i]);
    }
    Hash::from_parts(&parts)
}

/// The canonical PRECOMMIT vote payload a validator signs (§4.C step 3):
/// `type=PRECOMMIT, height, round, block_id, timestamp`.
pub fn canonical_vote_payload(height: u64, round: u64, block_id_hash: &Hash, timestamp: u64) -> Hash {
    Hash::from_parts(&[
        b"PRECOMMIT",
        &height.to_be_bytes(),
        &round.to_be_bytes(),
        block_id_hash.as_bytes(),
        &timestamp.to_be_bytes(),
    ])
}

/// Run the full L1C/L2C consensus-finality check for one commit against one
/// expected anchor.
pub fn verify_finality(
    local_block: u64,
    commit: &CommitRecord,
    validators: &[ValidatorRecord],
    expected_anchor: &Hash,
) -> Result<ConsensusFinalityProof, StateProverError> {
    let expected_height = local_block + 1;
    if commit.height != expected_height {
        return Err(StateProverError::HeightMismatch {
            expected: expected_height,
            found: commit.height,
        });
    }

    if commit.block_id_hash != commit.header_hash {
        return Err(StateProverError::RootBindingFailure {
            expected: commit.header_hash,
            found: commit.block_id_hash,
        });
    }

    let computed_validators_hash = validator_set_hash(validators);
    if computed_validators_hash != commit.validators_hash {
        return Err(StateProverError::ValidatorSetMismatch {
            expected: commit.validators_hash,
            computed: computed_validators_hash,
        });
    }

    let total_power: u64 = validators.iter().map(|v| v.voting_power).sum();
    let required = required_power(total_power);

    let mut signed_power = 0u64;
    for vote in &commit.votes {
        if !vote.is_commit {
            continue;
        }
        let Some(validator) = validators.iter().find(|v| v.address == vote.validator_address) else {
            continue;
        };
        let payload = canonical_vote_payload(commit.height, commit.round, &commit.block_id_hash, vote.timestamp);
        let Ok(pubkey) = certen_types::Ed25519PublicKey::from_bytes(&validator.public_key) else {
            continue;
        };
        let Ok(sig) = certen_types::Ed25519Signature::from_bytes(&vote.signature) else {
            continue;
        };
        if pubkey.verify(payload.as_bytes(), &sig) {
            signed_power += validator.voting_power;
        }
        if signed_power >= required {
            break;
        }
    }

    if signed_power < required {
        return Err(StateProverError::InsufficientVotingPower {
            signed: signed_power,
            total: total_power,
            required,
        });
    }

    if commit.app_hash != *expected_anchor {
        return Err(StateProverError::RootBindingFailure {
            expected: *expected_anchor,
            found: commit.app_hash,
        });
    }

    Ok(ConsensusFinalityProof {
        height: commit.height,
        total_power,
        signed_power,
        required_power: required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use certen_types::{Ed25519KeyPair, Ed25519PublicKey};
    use certen_rpc::VoteRecord;

    fn validator(seed: u8, power: u64) -> (Ed25519KeyPair, ValidatorRecord) {
        let kp = Ed25519KeyPair::from_seed(&[seed; 32]);
        let record = ValidatorRecord {
            address: format!("validator-{seed}"),
            public_key: kp.public_key().as_bytes().to_vec(),
            voting_power: power,
        };
        (kp, record)
    }

    fn make_commit(
        height: u64,
        block_id_hash: Hash,
        validators_hash: Hash,
        app_hash: Hash,
        votes: Vec<VoteRecord>,
    ) -> CommitRecord {
        CommitRecord {
            height,
            round: 0,
            block_id_hash,
            header_hash: block_id_hash,
            validators_hash,
            app_hash,
            votes,
        }
    }

    #[test]
    fn threshold_met_accepts() {
        let (kp1, v1) = validator(1, 34);
        let (kp2, v2) = validator(2, 33);
        let (_kp3, v3) = validator(3, 33);
        let validators = vec![v1.clone(), v2.clone(), v3.clone()];
        let vhash = validator_set_hash(&validators);
        let block_id = Hash::from_bytes(b"block");
        let app_hash = Hash::from_bytes(b"anchor");

        let payload = canonical_vote_payload(11, 0, &block_id, 100);
        let votes = vec![
            VoteRecord {
                validator_address: v1.address.clone(),
                is_commit: true,
                signature: kp1.sign(payload.as_bytes()).as_bytes().to_vec(),
                timestamp: 100,
            },
            VoteRecord {
                validator_address: v2.address.clone(),
                is_commit: true,
                signature: kp2.sign(payload.as_bytes()).as_bytes().to_vec(),
                timestamp: 100,
            },
        ];

        let commit = make_commit(11, block_id, vhash, app_hash, votes);
        let result = verify_finality(10, &commit, &validators, &app_hash).unwrap();
        assert_eq!(result.signed_power, 67);
        assert_eq!(result.required_power, 67);
    }

    #[test]
    fn below_threshold_rejects() {
        let (kp1, v1) = validator(1, 34);
        let (_kp2, v2) = validator(2, 33);
        let (_kp3, v3) = validator(3, 33);
        let validators = vec![v1.clone(), v2, v3];
        let vhash = validator_set_hash(&validators);
        let block_id = Hash::from_bytes(b"block");
        let app_hash = Hash::from_bytes(b"anchor");
        let payload = canonical_vote_payload(11, 0, &block_id, 100);
        let votes = vec![VoteRecord {
            validator_address: v1.address.clone(),
            is_commit: true,
            signature: kp1.sign(payload.as_bytes()).as_bytes().to_vec(),
            timestamp: 100,
        }];
        let commit = make_commit(11, block_id, vhash, app_hash, votes);
        let err = verify_finality(10, &commit, &validators, &app_hash).unwrap_err();
        assert!(matches!(err, StateProverError::InsufficientVotingPower { .. }));
    }

    #[test]
    fn height_mismatch_rejects_s5() {
        let (_kp, v1) = validator(1, 100);
        let validators = vec![v1.clone()];
        let vhash = validator_set_hash(&validators);
        let block_id = Hash::from_bytes(b"block");
        let app_hash = Hash::from_bytes(b"anchor");
        // local_block = 1_027_822 implies expected height 1_027_823; the
        // remote commit reports 1_027_824 instead.
        let commit = make_commit(1_027_824, block_id, vhash, app_hash, vec![]);
        let err = verify_finality(1_027_822, &commit, &validators, &app_hash).unwrap_err();
        assert!(matches!(
            err,
            StateProverError::HeightMismatch { expected: 1_027_823, found: 1_027_824 }
        ));
    }

    #[test]
    fn wrong_signer_key_is_not_counted() {
        let (_kp1, v1) = validator(1, 100);
        let other_kp = Ed25519KeyPair::from_seed(&[9u8; 32]);
        let validators = vec![v1.clone()];
        let vhash = validator_set_hash(&validators);
        let block_id = Hash::from_bytes(b"block");
        let app_hash = Hash::from_bytes(b"anchor");
        let payload = canonical_vote_payload(11, 0, &block_id, 100);
        let bad_sig = other_kp.sign(payload.as_bytes());
        let votes = vec![VoteRecord {
            validator_address: v1.address.clone(),
            is_commit: true,
            signature: bad_sig.as_bytes().to_vec(),
            timestamp: 100,
        }];
        let commit = make_commit(11, block_id, vhash, app_hash, votes);
        let err = verify_finality(10, &commit, &validators, &app_hash).unwrap_err();
        assert!(matches!(err, StateProverError::InsufficientVotingPower { .. }));
        let _ = Ed25519PublicKey::from_bytes(&v1.public_key).unwrap();
    }
}
