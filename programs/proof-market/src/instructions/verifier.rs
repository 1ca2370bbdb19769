//! Proof verification through the configured verifier program

use anchor_lang::prelude::*;
use anchor_lang::solana_program::instruction::Instruction;
use anchor_lang::solana_program::program::invoke;

use crate::errors::MarketError;

/// Instruction data sent to the verifier: `vk || public_values_digest || proof`
pub fn verifier_instruction_data(
    verification_key: &[u8; 32],
    public_values_digest: &[u8; 32],
    proof: &[u8],
) -> Vec<u8> {
    let mut data = Vec::with_capacity(64 + proof.len());
    data.extend_from_slice(verification_key);
    data.extend_from_slice(public_values_digest);
    data.extend_from_slice(proof);
    data
}

/// Verify a proof via CPI. The verifier signals a valid proof by returning
/// success; any error maps to `ProofRejected`.
pub fn verify_proof<'info>(
    verifier: &AccountInfo<'info>,
    verification_key: &[u8; 32],
    public_values_digest: &[u8; 32],
    proof: &[u8],
) -> Result<()> {
    require!(!proof.is_empty(), MarketError::InvalidInput);

    let ix = Instruction {
        program_id: verifier.key(),
        accounts: vec![],
        data: verifier_instruction_data(verification_key, public_values_digest, proof),
    };

    invoke(&ix, &[verifier.clone()]).map_err(|e| {
        msg!("Proof verification failed: {:?}", e);
        MarketError::ProofRejected
    })?;

    msg!("Proof verified");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_layout() {
        let data = verifier_instruction_data(&[1u8; 32], &[2u8; 32], &[3, 4, 5]);
        assert_eq!(data.len(), 67);
        assert_eq!(&data[..32], &[1u8; 32]);
        assert_eq!(&data[32..64], &[2u8; 32]);
        assert_eq!(&data[64..], &[3, 4, 5]);
    }
}
