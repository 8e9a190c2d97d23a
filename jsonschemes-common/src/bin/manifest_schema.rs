// ABOUTME: emits a json schema for the type manifest format to stdout.
// ABOUTME: intended for validating manifests produced by external static-analysis passes.

fn main() {
    let schema = schemars::schema_for!(jsonschemes_common::TypeManifest);
    let json = serde_json::to_string_pretty(&schema).expect("serialize schema");
    println!("{json}");
}
