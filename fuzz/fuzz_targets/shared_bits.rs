#![no_main]

mod common;

use common::SharedPrefix;
use libfuzzer_sys::fuzz_target;
use smt_core::key_path::{shared_bits, shares_prefix};

fuzz_target!(|run: SharedPrefix| {
    let SharedPrefix {
        prefix_bit_len,
        a,
        b,
    } = run;

    assert_eq!(prefix_bit_len, shared_bits(&a, &b));
    assert!(shares_prefix(&a, &b, prefix_bit_len));
    if prefix_bit_len < 256 {
        assert!(!shares_prefix(&a, &b, prefix_bit_len + 1));
    }
});
