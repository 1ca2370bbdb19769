//! Sealed-bid reverse auction rules shared by the request instructions

use anchor_lang::prelude::*;
use solana_sha256_hasher::hashv;

use crate::errors::MarketError;
use crate::instructions::constants::{
    BASIS_POINTS_DIVISOR, BID_COMMITMENT_DOMAIN, MAX_DEADLINE_SECONDS, REQUEST_ID_DOMAIN,
};
use crate::state::{
    ProofRequest, ProtocolConfig, RankedBid, RequestStatus, MAX_PROGRAM_URI_LEN,
};
use crate::utils::validation::validate_string_input;

/// Content-derived request identifier.
pub fn derive_request_id(
    nonce: u64,
    verification_key: &[u8; 32],
    public_values_digest: &[u8; 32],
) -> [u8; 32] {
    hashv(&[
        REQUEST_ID_DOMAIN,
        &nonce.to_le_bytes(),
        verification_key,
        public_values_digest,
    ])
    .to_bytes()
}

/// Sealed-bid commitment bound to one request and one provider.
pub fn bid_commitment(request_id: &[u8; 32], provider: &Pubkey, fee: u64, salt: &[u8; 32]) -> [u8; 32] {
    hashv(&[
        BID_COMMITMENT_DOMAIN,
        request_id,
        provider.as_ref(),
        &fee.to_le_bytes(),
        salt,
    ])
    .to_bytes()
}

/// Inputs of a new request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestTerms {
    pub nonce: u64,
    pub verification_key: [u8; 32],
    pub public_values_digest: [u8; 32],
    pub program_uri: String,
    pub fee_ceiling: u64,
    pub min_stake: u64,
    pub deadline: i64,
}

/// Validate request terms against the protocol parameters at `now`.
pub fn validate_request_terms(config: &ProtocolConfig, terms: &RequestTerms, now: i64) -> Result<()> {
    require!(
        terms.verification_key != [0u8; 32],
        MarketError::InvalidInput
    );
    require!(
        terms.program_uri.len() <= MAX_PROGRAM_URI_LEN && validate_string_input(&terms.program_uri),
        MarketError::InvalidString
    );
    require!(
        terms.fee_ceiling >= config.min_fee && terms.fee_ceiling > 0,
        MarketError::FeeBelowMinimum
    );
    require!(terms.deadline > now, MarketError::DeadlineInPast);

    let earliest = now
        .checked_add(config.bidding_window)
        .and_then(|t| t.checked_add(config.reveal_window))
        .ok_or(MarketError::ArithmeticOverflow)?;
    require!(terms.deadline >= earliest, MarketError::DeadlineTooShort);

    let latest = now
        .checked_add(MAX_DEADLINE_SECONDS)
        .ok_or(MarketError::ArithmeticOverflow)?;
    require!(terms.deadline <= latest, MarketError::DeadlineTooFar);
    Ok(())
}

/// Fill a freshly created request from validated terms, snapshotting the
/// fee and slash parameters.
pub fn open_request(
    request: &mut ProofRequest,
    config: &ProtocolConfig,
    request_id: [u8; 32],
    requester: Pubkey,
    terms: RequestTerms,
    now: i64,
) -> Result<()> {
    let bidding_end = now
        .checked_add(config.bidding_window)
        .ok_or(MarketError::ArithmeticOverflow)?;
    let reveal_end = bidding_end
        .checked_add(config.reveal_window)
        .ok_or(MarketError::ArithmeticOverflow)?;

    request.request_id = request_id;
    request.nonce = terms.nonce;
    request.requester = requester;
    request.verification_key = terms.verification_key;
    request.public_values_digest = terms.public_values_digest;
    request.program_uri = terms.program_uri;
    request.fee_ceiling = terms.fee_ceiling;
    request.min_stake = terms.min_stake;
    request.deadline = terms.deadline;
    request.accepted_at = now;
    request.bidding_end = bidding_end;
    request.reveal_end = reveal_end;
    request.protocol_fee_bps = config.protocol_fee_bps;
    request.slash_bps = config.slash_bps;
    request.slash_window = config.slash_window;
    request.status = RequestStatus::Pending;
    request.bidder_count = 0;
    request.winner = None;
    request.runner_up = None;
    request.proof_digest = [0u8; 32];
    request.settled_price = 0;
    request.slashed_amount = 0;
    request.resolved_at = 0;
    Ok(())
}

/// Auction phase implied by the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionPhase {
    Bidding,
    Reveal,
    Submission,
    Expired,
}

pub fn auction_phase(request: &ProofRequest, now: i64) -> AuctionPhase {
    if now <= request.bidding_end {
        AuctionPhase::Bidding
    } else if now <= request.reveal_end {
        AuctionPhase::Reveal
    } else if now <= request.deadline {
        AuctionPhase::Submission
    } else {
        AuctionPhase::Expired
    }
}

fn require_phase(request: &ProofRequest, now: i64, phase: AuctionPhase, err: MarketError) -> Result<()> {
    require!(
        request.status == RequestStatus::Pending,
        MarketError::RequestNotPending
    );
    let current = auction_phase(request, now);
    if current != phase {
        msg!("Request in {:?} phase at {}, needs {:?}", current, now, phase);
        return Err(err.into());
    }
    Ok(())
}

pub fn require_bidding_open(request: &ProofRequest, now: i64) -> Result<()> {
    require_phase(request, now, AuctionPhase::Bidding, MarketError::BiddingClosed)
}

pub fn require_reveal_open(request: &ProofRequest, now: i64) -> Result<()> {
    require_phase(request, now, AuctionPhase::Reveal, MarketError::RevealNotOpen)
}

pub fn require_submission_open(request: &ProofRequest, now: i64) -> Result<()> {
    require_phase(request, now, AuctionPhase::Submission, MarketError::SubmissionNotOpen)
}

/// Where a revealed bid landed in the ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOutcome {
    Winner,
    RunnerUp,
    Unranked,
}

/// Insert a revealed bid. Only a strictly lower fee displaces; ties keep
/// the earlier reveal.
pub fn rank_revealed_bid(request: &mut ProofRequest, provider: Pubkey, fee: u64) -> RankOutcome {
    let bid = RankedBid { provider, fee };
    match request.winner {
        None => {
            request.winner = Some(bid);
            RankOutcome::Winner
        }
        Some(winner) if fee < winner.fee => {
            request.runner_up = Some(winner);
            request.winner = Some(bid);
            RankOutcome::Winner
        }
        Some(_) => match request.runner_up {
            Some(runner_up) if fee >= runner_up.fee => RankOutcome::Unranked,
            _ => {
                request.runner_up = Some(bid);
                RankOutcome::RunnerUp
            }
        },
    }
}

/// How a fulfilled request's escrow is paid out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    /// Second-price: the runner-up fee, or the winner's own fee when alone
    pub price: u64,
    pub protocol_fee: u64,
    pub provider_reward: u64,
    /// Escrow returned to the requester
    pub rebate: u64,
}

pub fn calculate_settlement(request: &ProofRequest) -> Result<Settlement> {
    let winner = request.winner.ok_or(MarketError::NoWinner)?;
    let price = request.runner_up.map(|r| r.fee).unwrap_or(winner.fee);
    require!(
        price <= request.fee_ceiling,
        MarketError::FeeAboveCeiling
    );

    let protocol_fee = (price as u128)
        .checked_mul(request.protocol_fee_bps as u128)
        .ok_or(MarketError::ArithmeticOverflow)?
        .checked_div(BASIS_POINTS_DIVISOR as u128)
        .ok_or(MarketError::ArithmeticOverflow)? as u64;

    Ok(Settlement {
        price,
        protocol_fee,
        provider_reward: price - protocol_fee,
        rebate: request.fee_ceiling - price,
    })
}

/// Why a request can be refunded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RefundReason {
    /// Deadline passed without a proof
    DeadlineMissed = 0,
    /// Bidding closed with no bids
    NoBids = 1,
    /// Reveal closed with no revealed bid
    NoReveals = 2,
}

pub fn refund_reason(request: &ProofRequest, now: i64) -> Result<RefundReason> {
    require!(
        request.status == RequestStatus::Pending,
        MarketError::RequestNotPending
    );

    if now > request.deadline {
        Ok(RefundReason::DeadlineMissed)
    } else if now > request.bidding_end && request.bidder_count == 0 {
        Ok(RefundReason::NoBids)
    } else if now > request.reveal_end && request.winner.is_none() {
        Ok(RefundReason::NoReveals)
    } else {
        msg!(
            "Refund unavailable at {}: bidding_end {} reveal_end {} deadline {}",
            now,
            request.bidding_end,
            request.reveal_end,
            request.deadline
        );
        Err(MarketError::RefundNotAvailable.into())
    }
}

/// Penalty owed by a winner that missed the deadline, checked against the
/// slash window. Returns the winner and the penalty amount.
pub fn slash_terms(request: &ProofRequest, now: i64) -> Result<(RankedBid, u64)> {
    require!(
        request.status == RequestStatus::Refunded,
        MarketError::RequestNotRefunded
    );
    let winner = request.winner.ok_or(MarketError::NoWinner)?;

    let window_end = request
        .deadline
        .checked_add(request.slash_window)
        .ok_or(MarketError::ArithmeticOverflow)?;
    require!(now <= window_end, MarketError::SlashWindowExpired);

    let penalty = (request.min_stake as u128)
        .checked_mul(request.slash_bps as u128)
        .ok_or(MarketError::ArithmeticOverflow)?
        / BASIS_POINTS_DIVISOR as u128;
    Ok((winner, penalty as u64))
}

/// Move a request to `new_status` if the lifecycle allows it.
pub fn transition_request(request: &mut ProofRequest, new_status: RequestStatus) -> Result<()> {
    require!(
        request.status.can_transition_to(new_status),
        MarketError::InvalidStatusTransition
    );
    request.status = new_status;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const E17: u64 = 100_000_000_000_000_000;

    fn create_test_config() -> ProtocolConfig {
        ProtocolConfig {
            min_fee: 1_000,
            bidding_window: 100,
            reveal_window: 100,
            protocol_fee_bps: 0,
            ..ProtocolConfig::default()
        }
    }

    fn create_test_terms(fee_ceiling: u64, deadline: i64) -> RequestTerms {
        RequestTerms {
            nonce: 1,
            verification_key: [7u8; 32],
            public_values_digest: [9u8; 32],
            program_uri: "ipfs://program".to_string(),
            fee_ceiling,
            min_stake: 1_000,
            deadline,
        }
    }

    fn create_test_request(fee_ceiling: u64) -> ProofRequest {
        let config = create_test_config();
        let terms = create_test_terms(fee_ceiling, 1_000);
        let id = derive_request_id(terms.nonce, &terms.verification_key, &terms.public_values_digest);
        let mut request = ProofRequest::default();
        open_request(&mut request, &config, id, Pubkey::new_unique(), terms, 0).unwrap();
        request
    }

    mod hashing {
        use super::*;

        #[test]
        fn test_request_id_depends_on_every_input() {
            let base = derive_request_id(1, &[1u8; 32], &[2u8; 32]);
            assert_eq!(base, derive_request_id(1, &[1u8; 32], &[2u8; 32]));
            assert_ne!(base, derive_request_id(2, &[1u8; 32], &[2u8; 32]));
            assert_ne!(base, derive_request_id(1, &[3u8; 32], &[2u8; 32]));
            assert_ne!(base, derive_request_id(1, &[1u8; 32], &[3u8; 32]));
        }

        #[test]
        fn test_request_id_is_sha256_of_fields() {
            // sha256("abc")
            assert_eq!(
                solana_sha256_hasher::hash(b"abc").to_bytes()[..4],
                [0xba, 0x78, 0x16, 0xbf]
            );

            let mut preimage = REQUEST_ID_DOMAIN.to_vec();
            preimage.extend_from_slice(&7u64.to_le_bytes());
            preimage.extend_from_slice(&[1u8; 32]);
            preimage.extend_from_slice(&[2u8; 32]);
            assert_eq!(
                derive_request_id(7, &[1u8; 32], &[2u8; 32]),
                solana_sha256_hasher::hash(&preimage).to_bytes()
            );
        }

        #[test]
        fn test_commitment_bound_to_request_and_provider() {
            let provider = Pubkey::new_unique();
            let salt = [5u8; 32];
            let base = bid_commitment(&[1u8; 32], &provider, 100, &salt);
            assert_ne!(base, bid_commitment(&[2u8; 32], &provider, 100, &salt));
            assert_ne!(base, bid_commitment(&[1u8; 32], &Pubkey::new_unique(), 100, &salt));
            assert_ne!(base, bid_commitment(&[1u8; 32], &provider, 101, &salt));
            assert_ne!(base, bid_commitment(&[1u8; 32], &provider, 100, &[6u8; 32]));
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_valid_terms() {
            let config = create_test_config();
            assert!(validate_request_terms(&config, &create_test_terms(1_000, 200), 0).is_ok());
        }

        #[test]
        fn test_fee_below_minimum() {
            let config = create_test_config();
            assert!(validate_request_terms(&config, &create_test_terms(999, 500), 0).is_err());
        }

        #[test]
        fn test_deadline_must_fit_phases() {
            let config = create_test_config();
            assert!(validate_request_terms(&config, &create_test_terms(1_000, 0), 0).is_err());
            assert!(validate_request_terms(&config, &create_test_terms(1_000, 199), 0).is_err());
            assert!(validate_request_terms(
                &config,
                &create_test_terms(1_000, MAX_DEADLINE_SECONDS + 1),
                0
            )
            .is_err());
        }

        #[test]
        fn test_program_uri_checked() {
            let config = create_test_config();
            let mut terms = create_test_terms(1_000, 500);
            terms.program_uri = "bad\nuri".to_string();
            assert!(validate_request_terms(&config, &terms, 0).is_err());
            terms.program_uri = "a".repeat(MAX_PROGRAM_URI_LEN + 1);
            assert!(validate_request_terms(&config, &terms, 0).is_err());
        }

        #[test]
        fn test_open_snapshots_parameters() {
            let request = create_test_request(5_000);
            assert_eq!(request.bidding_end, 100);
            assert_eq!(request.reveal_end, 200);
            assert_eq!(request.status, RequestStatus::Pending);
            assert_eq!(request.slash_window, ProtocolConfig::DEFAULT_SLASH_WINDOW);
        }
    }

    mod phases {
        use super::*;

        #[test]
        fn test_phase_boundaries_inclusive() {
            let request = create_test_request(5_000);
            assert_eq!(auction_phase(&request, 100), AuctionPhase::Bidding);
            assert_eq!(auction_phase(&request, 101), AuctionPhase::Reveal);
            assert_eq!(auction_phase(&request, 200), AuctionPhase::Reveal);
            assert_eq!(auction_phase(&request, 201), AuctionPhase::Submission);
            assert_eq!(auction_phase(&request, 1_000), AuctionPhase::Submission);
            assert_eq!(auction_phase(&request, 1_001), AuctionPhase::Expired);
        }

        #[test]
        fn test_phase_guards() {
            let mut request = create_test_request(5_000);
            assert!(require_bidding_open(&request, 50).is_ok());
            assert!(require_bidding_open(&request, 150).is_err());
            assert!(require_reveal_open(&request, 150).is_ok());
            assert!(require_submission_open(&request, 150).is_err());
            assert!(require_submission_open(&request, 500).is_ok());

            request.status = RequestStatus::Fulfilled;
            assert!(require_submission_open(&request, 500).is_err());
        }
    }

    mod ranking {
        use super::*;

        #[test]
        fn test_lower_fee_displaces_winner() {
            let mut request = create_test_request(10 * E17);
            let a = Pubkey::new_unique();
            let b = Pubkey::new_unique();
            assert_eq!(rank_revealed_bid(&mut request, a, 6 * E17), RankOutcome::Winner);
            assert_eq!(rank_revealed_bid(&mut request, b, 4 * E17), RankOutcome::Winner);
            assert_eq!(request.winner.unwrap().provider, b);
            assert_eq!(request.runner_up.unwrap().provider, a);
        }

        #[test]
        fn test_ties_never_displace() {
            let mut request = create_test_request(1_000);
            let first = Pubkey::new_unique();
            let second = Pubkey::new_unique();
            let third = Pubkey::new_unique();
            rank_revealed_bid(&mut request, first, 500);
            assert_eq!(rank_revealed_bid(&mut request, second, 500), RankOutcome::RunnerUp);
            assert_eq!(rank_revealed_bid(&mut request, third, 500), RankOutcome::Unranked);
            assert_eq!(request.winner.unwrap().provider, first);
            assert_eq!(request.runner_up.unwrap().provider, second);
        }

        #[test]
        fn test_runner_up_replaced_by_lower() {
            let mut request = create_test_request(1_000);
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 100);
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 900);
            let c = Pubkey::new_unique();
            assert_eq!(rank_revealed_bid(&mut request, c, 300), RankOutcome::RunnerUp);
            assert_eq!(request.runner_up.unwrap(), RankedBid { provider: c, fee: 300 });
        }

        #[test]
        fn test_order_invariant() {
            let mut request = create_test_request(1_000);
            for fee in [700u64, 300, 300, 900, 100, 200, 150] {
                rank_revealed_bid(&mut request, Pubkey::new_unique(), fee);
                if let (Some(w), Some(r)) = (request.winner, request.runner_up) {
                    assert!(w.fee <= r.fee);
                }
            }
            assert_eq!(request.winner.unwrap().fee, 100);
            assert_eq!(request.runner_up.unwrap().fee, 150);
        }
    }

    mod settlement {
        use super::*;

        #[test]
        fn test_second_price() {
            let mut request = create_test_request(10 * E17);
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 6 * E17);
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 4 * E17);
            let settlement = calculate_settlement(&request).unwrap();
            assert_eq!(settlement.price, 6 * E17);
            assert_eq!(settlement.rebate, 4 * E17);
            assert_eq!(settlement.provider_reward, 6 * E17);
        }

        #[test]
        fn test_single_bid_pays_own_fee() {
            let mut request = create_test_request(10 * E17);
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 5 * E17);
            let settlement = calculate_settlement(&request).unwrap();
            assert_eq!(settlement.price, 5 * E17);
            assert_eq!(settlement.rebate, 5 * E17);
        }

        #[test]
        fn test_protocol_fee_from_snapshot() {
            let mut request = create_test_request(1_000);
            request.protocol_fee_bps = 250;
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 800);
            let settlement = calculate_settlement(&request).unwrap();
            assert_eq!(settlement.protocol_fee, 20);
            assert_eq!(settlement.provider_reward, 780);
            assert_eq!(
                settlement.protocol_fee + settlement.provider_reward + settlement.rebate,
                request.fee_ceiling
            );
        }

        #[test]
        fn test_no_winner() {
            let request = create_test_request(1_000);
            assert!(calculate_settlement(&request).is_err());
        }
    }

    mod refunds {
        use super::*;

        #[test]
        fn test_no_bidders_refundable_after_bidding() {
            let request = create_test_request(1_000);
            assert!(refund_reason(&request, 100).is_err());
            assert_eq!(refund_reason(&request, 101).unwrap(), RefundReason::NoBids);
        }

        #[test]
        fn test_no_reveals_refundable_after_reveal() {
            let mut request = create_test_request(1_000);
            request.bidder_count = 2;
            assert!(refund_reason(&request, 150).is_err());
            assert!(refund_reason(&request, 200).is_err());
            assert_eq!(refund_reason(&request, 201).unwrap(), RefundReason::NoReveals);
        }

        #[test]
        fn test_winner_blocks_refund_until_deadline() {
            let mut request = create_test_request(1_000);
            request.bidder_count = 1;
            rank_revealed_bid(&mut request, Pubkey::new_unique(), 10);
            assert!(refund_reason(&request, 1_000).is_err());
            assert_eq!(refund_reason(&request, 1_001).unwrap(), RefundReason::DeadlineMissed);
        }

        #[test]
        fn test_settled_request_not_refundable() {
            let mut request = create_test_request(1_000);
            request.status = RequestStatus::Fulfilled;
            assert!(refund_reason(&request, 5_000).is_err());
        }
    }

    mod slashing {
        use super::*;

        #[test]
        fn test_slash_terms() {
            let mut request = create_test_request(1_000);
            let winner = Pubkey::new_unique();
            rank_revealed_bid(&mut request, winner, 10);
            request.slash_bps = 1000;
            assert!(slash_terms(&request, 1_001).is_err());

            transition_request(&mut request, RequestStatus::Refunded).unwrap();
            let (bid, penalty) = slash_terms(&request, 1_001).unwrap();
            assert_eq!(bid.provider, winner);
            assert_eq!(penalty, 100);

            let late = request.deadline + request.slash_window + 1;
            assert!(slash_terms(&request, late).is_err());
        }

        #[test]
        fn test_refund_without_winner_not_slashable() {
            let mut request = create_test_request(1_000);
            transition_request(&mut request, RequestStatus::Refunded).unwrap();
            assert!(slash_terms(&request, 1_001).is_err());
        }

        #[test]
        fn test_double_slash_rejected() {
            let mut request = create_test_request(1_000);
            transition_request(&mut request, RequestStatus::Refunded).unwrap();
            transition_request(&mut request, RequestStatus::Slashed).unwrap();
            assert!(transition_request(&mut request, RequestStatus::Slashed).is_err());
            assert!(transition_request(&mut request, RequestStatus::Refunded).is_err());
        }
    }
}
