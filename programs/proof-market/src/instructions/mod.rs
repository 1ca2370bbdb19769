//! Instruction handlers for the proof market

pub mod auction_helpers;
pub mod constants;
pub mod ledger_helpers;
pub mod reward_helpers;
pub mod stats_helpers;
pub mod token_helpers;
pub mod validation;
pub mod verifier;

pub mod claim_rewards;
pub mod complete_unstake;
pub mod configure_emission;
pub mod create_request;
pub mod deposit_rewards;
pub mod fund_emission;
pub mod initialize_protocol;
pub mod place_bid;
pub mod pop_epoch;
pub mod reactivate_provider;
pub mod refund_request;
pub mod register_provider;
pub mod request_unstake;
pub mod retire_provider;
pub mod reveal_bid;
pub mod schedule_epoch;
pub mod set_paused;
pub mod set_provider_jailed;
pub mod slash_request;
pub mod stake;
pub mod submit_proof;
pub mod update_market_params;
pub mod update_protocol_fee;
pub mod update_provider;
pub mod update_slash_params;
pub mod update_staking_params;
pub mod withdraw_commission;
pub mod withdraw_dust;

#[allow(ambiguous_glob_reexports)]
pub use claim_rewards::*;
#[allow(ambiguous_glob_reexports)]
pub use complete_unstake::*;
#[allow(ambiguous_glob_reexports)]
pub use configure_emission::*;
#[allow(ambiguous_glob_reexports)]
pub use create_request::*;
#[allow(ambiguous_glob_reexports)]
pub use deposit_rewards::*;
#[allow(ambiguous_glob_reexports)]
pub use fund_emission::*;
#[allow(ambiguous_glob_reexports)]
pub use initialize_protocol::*;
#[allow(ambiguous_glob_reexports)]
pub use place_bid::*;
#[allow(ambiguous_glob_reexports)]
pub use pop_epoch::*;
#[allow(ambiguous_glob_reexports)]
pub use reactivate_provider::*;
#[allow(ambiguous_glob_reexports)]
pub use refund_request::*;
#[allow(ambiguous_glob_reexports)]
pub use register_provider::*;
#[allow(ambiguous_glob_reexports)]
pub use request_unstake::*;
#[allow(ambiguous_glob_reexports)]
pub use retire_provider::*;
#[allow(ambiguous_glob_reexports)]
pub use reveal_bid::*;
#[allow(ambiguous_glob_reexports)]
pub use schedule_epoch::*;
#[allow(ambiguous_glob_reexports)]
pub use set_paused::*;
#[allow(ambiguous_glob_reexports)]
pub use set_provider_jailed::*;
#[allow(ambiguous_glob_reexports)]
pub use slash_request::*;
#[allow(ambiguous_glob_reexports)]
pub use stake::*;
#[allow(ambiguous_glob_reexports)]
pub use submit_proof::*;
#[allow(ambiguous_glob_reexports)]
pub use update_market_params::*;
#[allow(ambiguous_glob_reexports)]
pub use update_protocol_fee::*;
#[allow(ambiguous_glob_reexports)]
pub use update_provider::*;
#[allow(ambiguous_glob_reexports)]
pub use update_slash_params::*;
#[allow(ambiguous_glob_reexports)]
pub use update_staking_params::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw_commission::*;
#[allow(ambiguous_glob_reexports)]
pub use withdraw_dust::*;
