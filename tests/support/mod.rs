//! Shared test support: a small pseudo-random JSON generator used by the
//! oracle test to fuzz the tokenizer/value-mapper round trip against
//! `serde_json`.
//!
//! A depth-bounded recursive writer driven by `rand::thread_rng()`, with
//! this crate's own sample strings and a flat top-level object so the
//! oracle test doesn't need a schema per shape.

use rand::Rng;
use std::fmt::Write as _;

const MAX_DEPTH: u32 = 4;

const SAMPLE_STRINGS: [&str; 6] = [
    "the quick brown fox jumps over a lazy dog",
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
    r#"\""#,          // an escaped double quote
    "\\u00e9",        // a raw \u escape sequence, decodes to 'e with acute'
    "\u{58c1}",       // literal CJK, written by codepoint to dodge encoding mishaps
    "\u{1f604}",      // literal emoji, likewise
];

fn rng_below(bound: usize) -> usize {
    rand::thread_rng().gen_range(0..bound)
}

fn rng_bool() -> bool {
    rand::random()
}

/// Builds one pseudo-random JSON document: a top-level object of
/// `field_count` members, each holding an independently randomized value
/// (object, array, string, number, bool, or null).
pub fn random_document(field_count: usize) -> String {
    let mut out = String::from("{");
    for i in 0..field_count {
        if i > 0 {
            out.push(',');
        }
        write!(out, "\"field_{i}\":").unwrap();
        write_any(&mut out, 0);
    }
    out.push('}');
    out
}

fn write_any(out: &mut String, depth: u32) {
    // Past MAX_DEPTH, drop the container-producing arms so recursion always
    // bottoms out.
    let choice = if depth >= MAX_DEPTH { rng_below(4) } else { rng_below(6) };
    match choice {
        0 => write_object(out, depth),
        1 => write_array(out, depth),
        2 => write_string(out),
        3 => write_number(out),
        4 => out.push_str(if rng_bool() { "true" } else { "false" }),
        _ => out.push_str("null"),
    }
}

fn write_object(out: &mut String, depth: u32) {
    let count = rng_below(4);
    out.push('{');
    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        write!(out, "\"k{i}\":").unwrap();
        write_any(out, depth + 1);
    }
    out.push('}');
}

fn write_array(out: &mut String, depth: u32) {
    let count = rng_below(5);
    out.push('[');
    for i in 0..count {
        if i > 0 {
            out.push(',');
        }
        write_any(out, depth + 1);
    }
    out.push(']');
}

fn write_string(out: &mut String) {
    let sample = SAMPLE_STRINGS[rng_below(SAMPLE_STRINGS.len())];
    write!(out, "\"{sample}\"").unwrap();
}

fn write_number(out: &mut String) {
    match rng_below(3) {
        0 => write!(out, "{}", rand::thread_rng().gen_range(-1_000_000..1_000_000)).unwrap(),
        1 => write!(out, "{:.3}", rand::thread_rng().gen_range(-1000.0..1000.0f64)).unwrap(),
        _ => write!(
            out,
            "{}e{}",
            rand::thread_rng().gen_range(1..9),
            rand::thread_rng().gen_range(1..5)
        )
        .unwrap(),
    }
}
