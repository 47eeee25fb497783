//! Read-once initialization semantics.
//!
//! `init()` memoizes settings for the whole process, so this lives in
//! its own integration binary where nothing else has touched it.

use serial_test::serial;

#[test]
#[serial]
fn test_init_reads_once_and_never_refreshes() {
    // Set before the first call; injection never overrides a variable
    // that is already present, so this value is the one captured.
    std::env::set_var("OPENAI_API_KEY", "sk-first");

    let settings = envseed::init();
    assert_eq!(settings.openai_api_key(), Some("sk-first"));

    // The environment moves on; the captured settings do not.
    std::env::set_var("OPENAI_API_KEY", "sk-second");
    let again = envseed::init();
    assert_eq!(again.openai_api_key(), Some("sk-first"));
    assert!(std::ptr::eq(settings, again));

    std::env::remove_var("OPENAI_API_KEY");
}
