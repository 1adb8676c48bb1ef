#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any body must decode or fail as a fetch error, never panic
    if let Err(e) = pwdash::gateway::decode_soc(data) {
        assert!(e.is_fetch_failure());
    }
    if let Err(e) = pwdash::gateway::decode_aggregates(data) {
        assert!(e.is_fetch_failure());
    }
});
