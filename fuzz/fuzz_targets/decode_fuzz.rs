#![no_main]
use libfuzzer_sys::fuzz_target;
use xfth::engine;
use xfth::hash::NameTable;

fuzz_target!(|data: &[u8]| {
    // Fuzz a full stateless pass with arbitrary bytes.
    // The decoder must only return errors, never panic.
    let names = NameTable::new();
    let _ = engine::run_pass(data, &names, None);
});
