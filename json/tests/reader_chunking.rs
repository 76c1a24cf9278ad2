//! A correct push parser must not care how its input is chunked: feeding a
//! document in one call or split across two arbitrary-offset calls must
//! produce the same assembled document. This is the chunk-insensitivity
//! property the ambient test stack commits to exercising with `quickcheck`.

#[cfg(test)]
extern crate quickcheck;
#[cfg(test)]
#[macro_use(quickcheck)]
extern crate quickcheck_macros;

use solid_json::reader::{Assembler, Parser, ReaderConfig, Tokenizer};
use solid_json::value::Value;
use solid_json::{compare, writer};
use solid_temporal::BigDecimal;
use std::cmp::Ordering;
use std::str::FromStr;

fn parse_chunks(chunks: &[&[u8]]) -> Value {
    let mut tok = Tokenizer::new();
    let mut parser = Parser::new(ReaderConfig::default());
    let mut assembler = Assembler::new();
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.iter().enumerate() {
        let tokens = tok.feed(chunk, i == last).expect("valid token stream");
        for token in tokens {
            let mut events = Vec::new();
            parser.push(token, &mut events).expect("valid grammar");
            for event in events {
                assembler.push(event).expect("valid event sequence");
            }
        }
    }
    parser.finish().expect("complete document");
    assembler.finish().expect("complete document")
}

fn sample_document(strings: &[String], numbers: &[i64]) -> Value {
    Value::Object(vec![
        ("strings".to_string(), Value::Array(strings.iter().cloned().map(Value::String).collect())),
        (
            "numbers".to_string(),
            Value::Array(numbers.iter().map(|n| Value::Number(BigDecimal::from_str(&n.to_string()).unwrap())).collect()),
        ),
    ])
}

#[quickcheck]
fn test_chunked_feed_matches_whole_feed(strings: Vec<String>, numbers: Vec<i64>, split_ratio: u8) -> bool {
    let value = sample_document(&strings, &numbers);
    let encoded = writer::to_string(&value).expect("value encodes");
    let bytes = encoded.as_bytes();

    let split = if bytes.is_empty() { 0 } else { (split_ratio as usize) % bytes.len() };

    let whole = parse_chunks(&[bytes]);
    let chunked = parse_chunks(&[&bytes[..split], &bytes[split..]]);

    compare::compare(&whole, &chunked) == Ordering::Equal
}

#[quickcheck]
fn test_byte_at_a_time_feed_matches_whole_feed(strings: Vec<String>, numbers: Vec<i64>) -> bool {
    let value = sample_document(&strings, &numbers);
    let encoded = writer::to_string(&value).expect("value encodes");
    let bytes = encoded.as_bytes();

    let single_byte_chunks: Vec<&[u8]> = bytes.iter().map(std::slice::from_ref).collect();
    let whole = parse_chunks(&[bytes]);
    let trickled = parse_chunks(&single_byte_chunks);

    compare::compare(&whole, &trickled) == Ordering::Equal
}
