#![no_main]
use libfuzzer_sys::fuzz_target;
use xfth::snapshot;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must either decode to a set or fail cleanly.
    if let Ok(set) = snapshot::decode_set(data) {
        // Anything that decodes must re-encode and decode to the same
        // set; decoded names always fit the u16 length field.
        let bytes = snapshot::encode_set(&set).unwrap();
        let again = snapshot::decode_set(&bytes).unwrap();
        assert_eq!(again, set);
    }
});
