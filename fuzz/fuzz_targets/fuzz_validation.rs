//! Fuzz testing for validation functions.
//!
//! Validators run on untrusted request bodies, so they must never panic,
//! whatever the input (empty strings, multi-byte characters, huge inputs).
//!
//! # Running the Fuzz Tests
//!
//! ```bash
//! cargo +nightly install cargo-fuzz
//! cargo +nightly fuzz run fuzz_validation -- -max_total_time=60
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;
use todo_article_api::validation::{
    validate_content,
    validate_email,
    validate_password,
    validate_title,
    validate_username,
};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = validate_username(s);
        let _ = validate_password(s);
        let _ = validate_email(s);
        let _ = validate_title(s);
        let _ = validate_content(s);
    }
});
