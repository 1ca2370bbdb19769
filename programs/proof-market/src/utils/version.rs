//! Version checking utilities for protocol upgrades

use crate::errors::MarketError;
use crate::state::{ProtocolConfig, CURRENT_PROTOCOL_VERSION, MIN_SUPPORTED_VERSION};
use anchor_lang::prelude::*;

/// Check that the protocol version is compatible with the current program
///
/// # Returns
/// * `Ok(())` if version is compatible
/// * `Err(MarketError::AccountVersionTooOld)` if account needs migration
/// * `Err(MarketError::AccountVersionTooNew)` if program needs upgrade
/// * `Err(MarketError::VersionMismatchProtocol)` if config is inconsistent
pub fn check_version_compatible(config: &ProtocolConfig) -> Result<()> {
    if config.protocol_version < config.min_supported_version {
        msg!(
            "Account version {} is below its minimum supported {}",
            config.protocol_version,
            config.min_supported_version
        );
        return Err(MarketError::AccountVersionTooOld.into());
    }

    if config.protocol_version > CURRENT_PROTOCOL_VERSION {
        msg!(
            "Account version {} is newer than program version {}",
            config.protocol_version,
            CURRENT_PROTOCOL_VERSION
        );
        return Err(MarketError::AccountVersionTooNew.into());
    }

    if config.min_supported_version < MIN_SUPPORTED_VERSION
        || config.min_supported_version > CURRENT_PROTOCOL_VERSION
    {
        msg!(
            "Account min_supported_version {} is outside supported range {}-{}",
            config.min_supported_version,
            MIN_SUPPORTED_VERSION,
            CURRENT_PROTOCOL_VERSION
        );
        return Err(MarketError::VersionMismatchProtocol.into());
    }

    Ok(())
}

/// Version compatibility plus the pause switch, checked by every
/// non-admin instruction.
pub fn require_market_open(config: &ProtocolConfig) -> Result<()> {
    check_version_compatible(config)?;
    require!(!config.paused, MarketError::ProtocolPaused);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_compatible() {
        assert!(check_version_compatible(&ProtocolConfig::default()).is_ok());
    }

    #[test]
    fn test_version_too_new() {
        let config = ProtocolConfig {
            protocol_version: CURRENT_PROTOCOL_VERSION + 1,
            ..ProtocolConfig::default()
        };
        assert!(check_version_compatible(&config).is_err());
    }

    #[test]
    fn test_version_below_minimum() {
        let config = ProtocolConfig {
            protocol_version: 0,
            ..ProtocolConfig::default()
        };
        assert!(check_version_compatible(&config).is_err());
    }

    #[test]
    fn test_paused_blocks_market() {
        let mut config = ProtocolConfig::default();
        assert!(require_market_open(&config).is_ok());
        config.paused = true;
        assert!(require_market_open(&config).is_err());
    }
}
