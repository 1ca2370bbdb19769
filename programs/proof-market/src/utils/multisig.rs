//! Multisig approval helpers

use anchor_lang::prelude::*;

use crate::errors::MarketError;
use crate::state::ProtocolConfig;

/// Validate multisig owner pubkeys before config is written
pub fn validate_multisig_owners(owners: &[Pubkey]) -> Result<()> {
    require!(
        !owners.is_empty() && owners.len() <= ProtocolConfig::MAX_MULTISIG_OWNERS,
        MarketError::MultisigInvalidSigners
    );
    for (index, owner) in owners.iter().enumerate() {
        require!(
            *owner != Pubkey::default(),
            MarketError::MultisigDefaultSigner
        );
        for other in owners.iter().skip(index + 1) {
            require!(*owner != *other, MarketError::MultisigDuplicateSigner);
        }
    }
    Ok(())
}

/// Count distinct configured owners among the signing accounts.
pub fn count_owner_approvals(owners: &[Pubkey], signers: &[Pubkey]) -> Result<usize> {
    let mut seen_owner = [false; ProtocolConfig::MAX_MULTISIG_OWNERS];
    let mut approvals = 0usize;

    for signer in signers {
        for (index, owner) in owners.iter().enumerate() {
            if owner == &Pubkey::default() {
                return Err(error!(MarketError::MultisigDefaultSigner));
            }
            if signer == owner {
                if seen_owner[index] {
                    return Err(error!(MarketError::MultisigDuplicateSigner));
                }
                seen_owner[index] = true;
                approvals += 1;
            }
        }
    }
    Ok(approvals)
}

/// Require `multisig_threshold` owner signatures among `remaining_accounts`.
pub fn require_multisig(config: &ProtocolConfig, remaining_accounts: &[AccountInfo]) -> Result<()> {
    let owners_len = config.multisig_owners_len as usize;
    let threshold = config.multisig_threshold as usize;

    if owners_len == 0 || owners_len > ProtocolConfig::MAX_MULTISIG_OWNERS {
        return Err(error!(MarketError::MultisigInvalidSigners));
    }

    if threshold == 0 || threshold > owners_len {
        return Err(error!(MarketError::MultisigInvalidThreshold));
    }

    let signers: Vec<Pubkey> = remaining_accounts
        .iter()
        .filter(|account| account.is_signer)
        .map(|account| *account.key)
        .collect();
    let approvals = count_owner_approvals(&config.multisig_owners[..owners_len], &signers)?;

    if approvals < threshold {
        msg!("Multisig approvals {} below threshold {}", approvals, threshold);
        return Err(error!(MarketError::MultisigNotEnoughSigners));
    }

    Ok(())
}

/// First signer among the remaining accounts, reported as the updater in events.
pub fn first_signer(remaining_accounts: &[AccountInfo]) -> Pubkey {
    remaining_accounts
        .iter()
        .find(|a| a.is_signer)
        .map(|a| a.key())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_owners() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        assert!(validate_multisig_owners(&[a, b]).is_ok());
        assert!(validate_multisig_owners(&[]).is_err());
        assert!(validate_multisig_owners(&[a, a]).is_err());
        assert!(validate_multisig_owners(&[a, Pubkey::default()]).is_err());
        let too_many: Vec<Pubkey> = (0..6).map(|_| Pubkey::new_unique()).collect();
        assert!(validate_multisig_owners(&too_many).is_err());
    }

    #[test]
    fn test_count_approvals() {
        let a = Pubkey::new_unique();
        let b = Pubkey::new_unique();
        let outsider = Pubkey::new_unique();
        assert_eq!(count_owner_approvals(&[a, b], &[a, outsider]).unwrap(), 1);
        assert_eq!(count_owner_approvals(&[a, b], &[b, a]).unwrap(), 2);
        assert!(count_owner_approvals(&[a, b], &[a, a]).is_err());
    }
}
