use proptest::prelude::*;

use intake_types::{IdentityId, Step, SubmissionId};

proptest! {
    /// Any UUID's canonical key parses back to the same identity.
    #[test]
    fn identity_key_roundtrip(bytes in prop::array::uniform16(0u8..)) {
        let id = IdentityId::new(uuid::Uuid::from_bytes(bytes));
        prop_assert_eq!(IdentityId::parse(&id.to_key()).unwrap(), id);
    }

    /// Canonical keys are always lowercase and hyphenated (36 chars).
    #[test]
    fn submission_key_is_canonical(bytes in prop::array::uniform16(0u8..)) {
        let key = SubmissionId::new(uuid::Uuid::from_bytes(bytes)).to_key();
        prop_assert_eq!(key.len(), 36);
        prop_assert_eq!(key.to_lowercase(), key);
    }

    /// Only 1..=3 are steps.
    #[test]
    fn step_range(n in any::<u8>()) {
        prop_assert_eq!(Step::from_number(n).is_ok(), (1..=3).contains(&n));
    }
}
