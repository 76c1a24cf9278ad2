//! `BuildConfig` governs how the schema compiler treats keywords it doesn't
//! recognise, and which of the three dialect URIs (§6.3) a schema compiles
//! under.

use serde_json::json;
use solid_json::schema::build::{build_schema_with, BuildConfig, Dialect, UnknownKeywordPolicy};
use solid_json::schema::CoreAnnotation;

fn main() {
    let base = url::Url::parse("https://example.com/demo-schema").unwrap();
    let doc = json!({ "type": "string", "vendorSpecific": 42 });

    let ignored = build_schema_with::<CoreAnnotation>(
        &base,
        &doc,
        &BuildConfig { unknown_keyword: UnknownKeywordPolicy::Ignore, ..Default::default() },
    );
    println!("Ignore policy on an unknown keyword: {:?}", ignored.map(|s| s.keywords.len()));

    let failed = build_schema_with::<CoreAnnotation>(
        &base,
        &doc,
        &BuildConfig { unknown_keyword: UnknownKeywordPolicy::Fail, ..Default::default() },
    );
    println!("Fail policy on an unknown keyword: {:?}", failed.err());

    let extension_doc = json!({ "type": "string", "minSize": 4 });
    let standard = build_schema_with::<CoreAnnotation>(&base, &extension_doc, &BuildConfig::default());
    println!("minSize under the standard dialect: {:?}", standard.err());

    let extension = build_schema_with::<CoreAnnotation>(
        &base,
        &extension_doc,
        &BuildConfig { dialect: Dialect::SolidExtension, ..Default::default() },
    );
    println!("minSize under the Solid extension dialect: {:?}", extension.map(|s| s.keywords.len()));
}
