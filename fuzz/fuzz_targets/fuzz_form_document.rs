#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Committed forms are read back from LMDB as bincode.
    let _ = bincode::deserialize::<intake_types::FormDocument>(data);
});
