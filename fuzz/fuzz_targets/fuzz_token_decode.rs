#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Authorization headers are attacker-controlled; decoding must never panic.
    if let Ok(raw) = std::str::from_utf8(data) {
        if let Ok(claim) = intake_verification::TokenClaim::decode(raw) {
            let _ = intake_types::IdentityId::parse(&claim.identity);
        }
    }
});
