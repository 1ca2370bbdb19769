//! Mock proof verifier for integration tests.
//!
//! Minimal BPF program standing in for the verifier the market invokes on
//! `submit_proof`. It reads the instruction data
//! `verification_key (32) || public_values_digest (32) || proof` and
//! accepts any proof whose first byte is non-zero, so tests can drive both
//! the accepted and the rejected path.
//!
//! Uses a raw BPF entrypoint to avoid `solana-program` dependency issues with
//! the SBF toolchain.

/// Returned for an accepted proof
pub const SUCCESS: u64 = 0;

/// `ProgramError::InvalidInstructionData` in its BPF return encoding
pub const INVALID_INSTRUCTION_DATA: u64 = 3 << 32;

/// Header bytes preceding the proof
pub const HEADER_LEN: usize = 64;

/// Accept the instruction data of a verification request.
pub fn verdict(data: &[u8]) -> u64 {
    match data.get(HEADER_LEN) {
        Some(first) if *first != 0 => SUCCESS,
        _ => INVALID_INSTRUCTION_DATA,
    }
}

/// BPF entrypoint.
///
/// The market passes no accounts, so the serialized input is
/// `num_accounts: u64 (0) || data_len: u64 || data || program_id`.
///
/// # Safety
///
/// `input` must point at a runtime-serialized instruction input.
#[no_mangle]
pub unsafe extern "C" fn entrypoint(input: *mut u8) -> u64 {
    let num_accounts = core::ptr::read_unaligned(input as *const u64);
    if num_accounts != 0 {
        return INVALID_INSTRUCTION_DATA;
    }
    let data_len = core::ptr::read_unaligned(input.add(8) as *const u64) as usize;
    let data = core::slice::from_raw_parts(input.add(16), data_len);
    verdict(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(proof: &[u8]) -> Vec<u8> {
        let mut data = vec![7u8; HEADER_LEN];
        data.extend_from_slice(proof);
        data
    }

    #[test]
    fn test_accepts_non_zero_proof() {
        assert_eq!(verdict(&request(&[1, 0, 0])), SUCCESS);
    }

    #[test]
    fn test_rejects_zero_leading_proof() {
        assert_eq!(verdict(&request(&[0, 1])), INVALID_INSTRUCTION_DATA);
    }

    #[test]
    fn test_rejects_missing_proof() {
        assert_eq!(verdict(&request(&[])), INVALID_INSTRUCTION_DATA);
        assert_eq!(verdict(&[]), INVALID_INSTRUCTION_DATA);
    }

    #[test]
    fn test_entrypoint_reads_serialized_input() {
        let data = request(&[9]);
        let mut input = Vec::new();
        input.extend_from_slice(&0u64.to_le_bytes());
        input.extend_from_slice(&(data.len() as u64).to_le_bytes());
        input.extend_from_slice(&data);
        input.extend_from_slice(&[0u8; 32]);
        assert_eq!(unsafe { entrypoint(input.as_mut_ptr()) }, SUCCESS);
    }
}
