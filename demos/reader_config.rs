//! `ReaderConfig::max_depth` guards against unbounded nesting independent of
//! any schema: a document that nests past the configured depth is rejected
//! by the tokenizer/parser pair before it ever reaches a validator.

use solid_json::reader::{Parser, ReaderConfig, Tokenizer};

fn main() {
    let deeply_nested = "[".repeat(8) + &"]".repeat(8);

    let permissive = ReaderConfig { max_depth: 16 };
    println!("depth 16, 8 levels of nesting: {:?}", feed(&deeply_nested, permissive));

    let strict = ReaderConfig { max_depth: 4 };
    println!("depth 4, 8 levels of nesting: {:?}", feed(&deeply_nested, strict));
}

fn feed(text: &str, config: ReaderConfig) -> Result<usize, String> {
    let mut tokenizer = Tokenizer::new();
    let mut parser = Parser::new(config);
    let tokens = tokenizer.feed(text.as_bytes(), true).map_err(|e| e.to_string())?;
    let mut events = Vec::new();
    for token in tokens {
        parser.push(token, &mut events).map_err(|e| e.to_string())?;
    }
    parser.finish().map_err(|e| e.to_string())?;
    Ok(events.len())
}
