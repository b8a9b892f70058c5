#![no_main]

use libfuzzer_sys::fuzz_target;

use domain::alias::fingerprint::fingerprint;
use domain::alias::normalizer::{normalize, summarize_range, WildcardExpansion};
use domain::alias::parser::{list_entry, parse_protocols, parse_ttl};

// Layout:
//   [0] = selector (0=normalize, 1=range, 2=wildcard, 3=list line/ttl/proto)
//   rest = UTF-8 input
fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };
    if input.len() > 4096 {
        return;
    }

    match selector % 4 {
        0 => {
            let _ = normalize(input).into_entries();
        }
        1 => {
            if let Some(nets) = summarize_range(input) {
                assert!(!nets.is_empty());
            }
        }
        2 => {
            if let Some(expansion) = WildcardExpansion::parse(input) {
                let count = expansion.candidate_count();
                let taken = expansion.take(512).count() as u64;
                assert!(taken <= count);
            }
        }
        _ => {
            for line in input.lines() {
                let _ = list_entry(line);
            }
            let _ = parse_ttl(input);
            if let Ok(protocols) = parse_protocols(input) {
                let _ = fingerprint(input.split_whitespace(), &protocols);
            }
        }
    }
});
