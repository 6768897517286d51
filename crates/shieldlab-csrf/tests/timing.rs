//! Timing side-channel check for `validate_token`.
//!
//! Measures how long validation takes when a guess diverges from the real
//! token at the first byte versus the last byte (and when the guess has the
//! wrong length). A short-circuiting compare would make the first-byte case
//! clearly faster. We compare medians of many batches so scheduler noise
//! doesn't decide the outcome, and allow a generous band around 1.0.

use std::hint::black_box;
use std::time::{Duration, Instant};

use shieldlab_csrf::{generate_token, validate_token, TOKEN_LEN};

const BATCHES: usize = 41;
const CALLS_PER_BATCH: usize = 500;

fn flip(token: &str, pos: usize) -> String {
    let mut bytes = token.as_bytes().to_vec();
    bytes[pos] = if bytes[pos] == b'0' { b'1' } else { b'0' };
    String::from_utf8(bytes).expect("hex stays utf-8")
}

fn time_batch(provided: &str, expected: &str) -> Duration {
    let start = Instant::now();
    for _ in 0..CALLS_PER_BATCH {
        black_box(validate_token(black_box(provided), black_box(expected)));
    }
    start.elapsed()
}

fn median(mut samples: Vec<Duration>) -> f64 {
    samples.sort();
    samples[samples.len() / 2].as_nanos() as f64
}

#[test]
fn test_validate_token_time_independent_of_mismatch_position() {
    let expected = generate_token();
    let early = flip(&expected, 0);
    let late = flip(&expected, TOKEN_LEN - 1);
    let short = expected[..TOKEN_LEN / 2].to_owned();

    // Warm up caches and branch predictors.
    for _ in 0..5 {
        time_batch(&early, &expected);
        time_batch(&late, &expected);
    }

    let mut early_samples = Vec::with_capacity(BATCHES);
    let mut late_samples = Vec::with_capacity(BATCHES);
    let mut short_samples = Vec::with_capacity(BATCHES);

    // Interleave so any drift in machine load hits all three equally.
    for _ in 0..BATCHES {
        early_samples.push(time_batch(&early, &expected));
        late_samples.push(time_batch(&late, &expected));
        short_samples.push(time_batch(&short, &expected));
    }

    let early = median(early_samples);
    let late = median(late_samples);
    let short = median(short_samples);

    let ratio = early / late;
    assert!(
        (0.5..2.0).contains(&ratio),
        "first-byte vs last-byte mismatch timing ratio {ratio:.3} \
         (early {early} ns, late {late} ns)"
    );

    // A length mismatch must not be dramatically cheaper than a full
    // compare. Hashing a shorter input is a little faster, so the band
    // is one-sided.
    let short_ratio = short / late;
    assert!(
        short_ratio > 0.33,
        "length mismatch returned suspiciously fast: ratio {short_ratio:.3}"
    );
}
