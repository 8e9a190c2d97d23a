// ABOUTME: holds the immutable run configuration built once from cli arguments.
// ABOUTME: passed by reference into the assembler and sink so no ambient state exists.

use std::path::PathBuf;

use clap::ValueEnum;

pub const DEFAULT_OUTPUT_DIR: &str = "json-schemes/output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PathLayout {
    /// `<out>/a/b/Widget.json`
    #[default]
    Flat,
    /// `<out>/a/b/Widget/Widget.json`
    TypeDirectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SchemaDialect {
    #[value(name = "draft7")]
    Draft7,
    #[value(name = "draft2019-09")]
    Draft2019_09,
    #[default]
    #[value(name = "draft2020-12")]
    Draft2020_12,
}

impl SchemaDialect {
    pub fn meta_schema(self) -> &'static str {
        match self {
            SchemaDialect::Draft7 => "http://json-schema.org/draft-07/schema#",
            SchemaDialect::Draft2019_09 => "https://json-schema.org/draft/2019-09/schema",
            SchemaDialect::Draft2020_12 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    pub fn definitions_keyword(self) -> &'static str {
        match self {
            SchemaDialect::Draft7 => "definitions",
            SchemaDialect::Draft2019_09 | SchemaDialect::Draft2020_12 => "$defs",
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub output_dir: PathBuf,
    pub layout: PathLayout,
    pub dialect: SchemaDialect,
    pub fail_fast: bool,
}

impl GeneratorConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            layout: PathLayout::default(),
            dialect: SchemaDialect::default(),
            fail_fast: false,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_DIR)
    }
}
