#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // A Draft entry goes through decode, normalize and the shape check on
    // every read and commit.
    let Ok(raw) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(payload) = intake_forms::DraftPayload::decode(raw) else {
        return;
    };
    if let Ok(draft) = payload.normalize() {
        let _ = draft.to_document(Default::default());
    }
});
