//! Shared constants for instruction handlers

/// Divisor for basis points calculations (100% = 10000 bps)
pub const BASIS_POINTS_DIVISOR: u64 = 10000;

/// Maximum protocol fee in basis points (10% = 1000 bps)
pub const MAX_PROTOCOL_FEE_BPS: u16 = 1000;

/// Maximum commission a provider can charge (100%)
pub const MAX_COMMISSION_BPS: u16 = 10000;

/// Maximum deadline relative to current time (1 year in seconds)
pub const MAX_DEADLINE_SECONDS: i64 = 365 * 24 * 3600;

// ============================================================================
// Fixed-point Constants
// ============================================================================

/// 1.0 in fixed point, used by the scale factor and reward accumulators
pub const PRECISION: u128 = 1_000_000_000_000_000_000;

/// At or below this scale an Active provider is deactivated (0.2)
pub const SCALE_SOFT_THRESHOLD: u128 = PRECISION / 5;

/// A slash may never bring the scale to or below this value (0.1)
pub const SCALE_HARD_FLOOR: u128 = PRECISION / 10;

// ============================================================================
// Hash Domains
// ============================================================================

/// Domain tag for request identifiers
pub const REQUEST_ID_DOMAIN: &[u8] = b"proof-market:request:v1";

/// Domain tag for sealed-bid commitments
pub const BID_COMMITMENT_DOMAIN: &[u8] = b"proof-market:bid:v1";
