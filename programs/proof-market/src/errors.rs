//! Error codes for the proof market

use anchor_lang::prelude::*;

#[error_code]
pub enum MarketError {
    // Validation errors (6000-6099)
    #[msg("Invalid input parameter")]
    InvalidInput,

    #[msg("Fee ceiling is below the protocol minimum fee")]
    FeeBelowMinimum,

    #[msg("Deadline is not in the future")]
    DeadlineInPast,

    #[msg("Deadline does not leave room for the bidding and reveal windows")]
    DeadlineTooShort,

    #[msg("Deadline is too far in the future")]
    DeadlineTooFar,

    #[msg("Request id does not match the request inputs")]
    InvalidRequestId,

    #[msg("Invalid protocol fee (must be <= 1000 bps)")]
    InvalidProtocolFee,

    #[msg("Invalid commission rate (must be <= 10000 bps)")]
    InvalidCommission,

    #[msg("Invalid slash parameters")]
    InvalidSlashParams,

    #[msg("Invalid phase or delay window")]
    InvalidWindow,

    #[msg("Revealed fee exceeds the request fee ceiling")]
    FeeAboveCeiling,

    #[msg("String input is too long or contains invalid characters")]
    InvalidString,

    #[msg("Amount must be greater than zero")]
    ZeroAmount,

    #[msg("Minimum self stake is below the protocol floor")]
    MinSelfStakeBelowFloor,

    // Not-found errors (6100-6199)
    #[msg("Provider not found")]
    ProviderNotFound,

    #[msg("Sealed bid not found")]
    BidNotFound,

    #[msg("Epoch record not found")]
    EpochNotFound,

    // State-conflict errors (6200-6299)
    #[msg("Request is not pending")]
    RequestNotPending,

    #[msg("Bidding window is closed")]
    BiddingClosed,

    #[msg("Reveal window is not open")]
    RevealNotOpen,

    #[msg("Proof submission window is not open")]
    SubmissionNotOpen,

    #[msg("Request is not refundable yet")]
    RefundNotAvailable,

    #[msg("Request has not been refunded")]
    RequestNotRefunded,

    #[msg("Slash window has expired")]
    SlashWindowExpired,

    #[msg("Request has no winning bid")]
    NoWinner,

    #[msg("Bid has already been revealed")]
    BidAlreadyRevealed,

    #[msg("Revealed fee and salt do not match the commitment")]
    CommitmentMismatch,

    #[msg("Provider is not active")]
    ProviderNotActive,

    #[msg("Invalid provider state transition")]
    InvalidProviderTransition,

    #[msg("Provider still holds stake and cannot reactivate")]
    ProviderNotFullyExited,

    #[msg("Epoch has already started")]
    EpochAlreadyStarted,

    #[msg("Epoch start must be later than the last scheduled start")]
    EpochNotIncreasing,

    #[msg("Epoch schedule is full")]
    EpochScheduleFull,

    #[msg("Protocol is paused")]
    ProtocolPaused,

    #[msg("Invalid request status transition")]
    InvalidStatusTransition,

    // Economic-invariant errors (6300-6399)
    #[msg("Provider stake is below the required minimum")]
    InsufficientStake,

    #[msg("Position does not hold enough shares")]
    InsufficientShares,

    #[msg("Provider is not accepting delegated stake")]
    DelegationNotAccepted,

    #[msg("Slash would push the scale factor to or below the hard floor")]
    ScaleBelowFloor,

    #[msg("Unstake queue is full")]
    UnstakeQueueFull,

    #[msg("Nothing to withdraw")]
    NothingToWithdraw,

    #[msg("Dust pool balance is insufficient")]
    InsufficientDust,

    #[msg("Arithmetic overflow")]
    ArithmeticOverflow,

    #[msg("Token transfer failed")]
    TokenTransferFailed,

    #[msg("Token account has the wrong mint or owner")]
    InvalidTokenAccount,

    // Authorization errors (6400-6499)
    #[msg("Signer is neither the provider authority nor its submitter")]
    UnauthorizedProvider,

    #[msg("Only the winning provider can submit a proof")]
    NotWinner,

    #[msg("Only the position owner can perform this action")]
    UnauthorizedStaker,

    #[msg("Multisig threshold must be non-zero and not exceed owners")]
    MultisigInvalidThreshold,

    #[msg("Multisig owners must be non-empty and within limits")]
    MultisigInvalidSigners,

    #[msg("Not enough multisig signers")]
    MultisigNotEnoughSigners,

    #[msg("Multisig owners must be unique")]
    MultisigDuplicateSigner,

    #[msg("Multisig owner cannot be default pubkey")]
    MultisigDefaultSigner,

    // Verification errors (6500-6599)
    #[msg("Proof was rejected by the verifier")]
    ProofRejected,

    #[msg("Verifier program does not match the protocol configuration")]
    InvalidVerifier,

    // Version errors (6600-6699)
    #[msg("Account version is too old, migration required")]
    AccountVersionTooOld,

    #[msg("Account version is too new, program upgrade required")]
    AccountVersionTooNew,

    #[msg("Protocol version mismatch")]
    VersionMismatchProtocol,
}
