//! Shared validation helpers for instruction handlers

use crate::errors::MarketError;
use crate::instructions::constants::{
    BASIS_POINTS_DIVISOR, MAX_COMMISSION_BPS, MAX_PROTOCOL_FEE_BPS,
};
use anchor_lang::prelude::*;

/// Protocol parameters supplied at initialization
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolParams {
    pub min_fee: u64,
    pub bidding_window: i64,
    pub reveal_window: i64,
    pub protocol_fee_bps: u16,
    pub slash_bps: u16,
    pub slash_window: i64,
    pub max_slash_bps: u16,
    pub min_self_stake_floor: u64,
    pub unstake_delay: i64,
}

/// Both auction phases must have a positive length.
pub fn validate_market_params(bidding_window: i64, reveal_window: i64) -> Result<()> {
    require!(
        bidding_window > 0 && reveal_window > 0,
        MarketError::InvalidWindow
    );
    Ok(())
}

pub fn validate_protocol_fee(protocol_fee_bps: u16) -> Result<()> {
    require!(
        protocol_fee_bps <= MAX_PROTOCOL_FEE_BPS,
        MarketError::InvalidProtocolFee
    );
    Ok(())
}

/// Slash basis points are bounded by 100%; the per-call cap must allow
/// some slashing.
pub fn validate_slash_params(slash_bps: u16, slash_window: i64, max_slash_bps: u16) -> Result<()> {
    require!(
        (slash_bps as u64) <= BASIS_POINTS_DIVISOR,
        MarketError::InvalidSlashParams
    );
    require!(
        max_slash_bps > 0 && (max_slash_bps as u64) <= BASIS_POINTS_DIVISOR,
        MarketError::InvalidSlashParams
    );
    require!(slash_window >= 0, MarketError::InvalidWindow);
    Ok(())
}

pub fn validate_staking_params(unstake_delay: i64) -> Result<()> {
    require!(unstake_delay >= 0, MarketError::InvalidWindow);
    Ok(())
}

pub fn validate_commission(commission_bps: u16) -> Result<()> {
    require!(
        commission_bps <= MAX_COMMISSION_BPS,
        MarketError::InvalidCommission
    );
    Ok(())
}

/// Validate every initialization parameter before any config is written.
pub fn validate_protocol_params(params: &ProtocolParams) -> Result<()> {
    validate_market_params(params.bidding_window, params.reveal_window)?;
    validate_protocol_fee(params.protocol_fee_bps)?;
    validate_slash_params(params.slash_bps, params.slash_window, params.max_slash_bps)?;
    validate_staking_params(params.unstake_delay)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ProtocolConfig;

    fn default_params() -> ProtocolParams {
        ProtocolParams {
            min_fee: 1_000,
            bidding_window: ProtocolConfig::DEFAULT_BIDDING_WINDOW,
            reveal_window: ProtocolConfig::DEFAULT_REVEAL_WINDOW,
            protocol_fee_bps: 100,
            slash_bps: ProtocolConfig::DEFAULT_SLASH_BPS,
            slash_window: ProtocolConfig::DEFAULT_SLASH_WINDOW,
            max_slash_bps: ProtocolConfig::DEFAULT_MAX_SLASH_BPS,
            min_self_stake_floor: 0,
            unstake_delay: ProtocolConfig::DEFAULT_UNSTAKE_DELAY,
        }
    }

    #[test]
    fn test_defaults_valid() {
        assert!(validate_protocol_params(&default_params()).is_ok());
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut params = default_params();
        params.reveal_window = 0;
        assert!(validate_protocol_params(&params).is_err());
    }

    #[test]
    fn test_protocol_fee_cap() {
        assert!(validate_protocol_fee(MAX_PROTOCOL_FEE_BPS).is_ok());
        assert!(validate_protocol_fee(MAX_PROTOCOL_FEE_BPS + 1).is_err());
    }

    #[test]
    fn test_slash_params() {
        assert!(validate_slash_params(10000, 0, 10000).is_ok());
        assert!(validate_slash_params(10001, 0, 5000).is_err());
        assert!(validate_slash_params(1000, 0, 0).is_err());
        assert!(validate_slash_params(1000, -1, 5000).is_err());
    }

    #[test]
    fn test_commission_bounds() {
        assert!(validate_commission(0).is_ok());
        assert!(validate_commission(10000).is_ok());
        assert!(validate_commission(10001).is_err());
    }

    #[test]
    fn test_negative_unstake_delay() {
        assert!(validate_staking_params(-1).is_err());
        assert!(validate_staking_params(0).is_ok());
    }
}
