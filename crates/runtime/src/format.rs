//! Document format recognition and default-schema selection (spec §6 CLI
//! surface).
//!
//! The real MIME-detection subsystem (`original_source/lambda/input/
//! mime-detect.c`'s glob/magic-byte table) is an external collaborator this
//! workspace leaves out of scope, per spec §1. This module is the minimal
//! stand-in spec.md's CLI table actually needs: an extension table plus a
//! first-bytes sniff for the one ambiguous case (`{`/`<` leading bytes),
//! mirroring `mime-detect.c`'s own `detect_subtype` dispatch without
//! importing its MIME type catalogue.

use std::path::Path;

/// One of the formats named in spec §6's CLI table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Html,
    Eml,
    Vcf,
    Json,
    Xml,
    Csv,
    Markdown,
    Yaml,
    Toml,
    Ini,
    Rtf,
    Latex,
    Rst,
    Unknown,
}

impl Format {
    /// Parses the `-f <format>` CLI flag value, `auto` resolved by the
    /// caller via [`resolve`] instead.
    pub fn from_flag(s: &str) -> Option<Self> {
        Some(match s.to_ascii_lowercase().as_str() {
            "html" => Format::Html,
            "eml" => Format::Eml,
            "vcf" => Format::Vcf,
            "json" => Format::Json,
            "xml" => Format::Xml,
            "csv" => Format::Csv,
            "markdown" | "md" => Format::Markdown,
            "yaml" | "yml" => Format::Yaml,
            "toml" => Format::Toml,
            "ini" => Format::Ini,
            "rtf" => Format::Rtf,
            "latex" | "tex" => Format::Latex,
            "rst" => Format::Rst,
            _ => return None,
        })
    }

    fn from_extension(ext: &str) -> Option<Self> {
        Format::from_flag(ext)
    }

    /// Default schema file for this format (spec §6 table): `<fmt>_schema.ls`,
    /// `html5_schema.ls` for HTML, `doc_schema.ls` for `Unknown`.
    pub fn default_schema(self) -> &'static str {
        match self {
            Format::Html => "html5_schema.ls",
            Format::Eml => "eml_schema.ls",
            Format::Vcf => "vcf_schema.ls",
            Format::Json => "json_schema.ls",
            Format::Xml => "xml_schema.ls",
            Format::Csv => "csv_schema.ls",
            Format::Markdown => "markdown_schema.ls",
            Format::Yaml => "yaml_schema.ls",
            Format::Toml => "toml_schema.ls",
            Format::Ini => "ini_schema.ls",
            Format::Rtf => "rtf_schema.ls",
            Format::Latex => "latex_schema.ls",
            Format::Rst => "rst_schema.ls",
            Format::Unknown => "doc_schema.ls",
        }
    }
}

/// Resolves `auto`: extension first, content-sniffing fallback for the
/// JSON-vs-XML/HTML ambiguity (`mime-detect.c`'s own first-bytes dispatch),
/// `Unknown` otherwise.
pub fn resolve(path: &Path, contents: &[u8]) -> Format {
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        if let Some(fmt) = Format::from_extension(ext) {
            return fmt;
        }
    }
    sniff(contents)
}

fn sniff(contents: &[u8]) -> Format {
    let trimmed = contents
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|i| &contents[i..])
        .unwrap_or(contents);
    match trimmed.first() {
        Some(b'{') | Some(b'[') => Format::Json,
        Some(b'<') => Format::Html,
        _ => Format::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_resolves_before_sniffing() {
        let fmt = resolve(Path::new("doc.json"), b"not even valid json");
        assert_eq!(fmt, Format::Json);
    }

    #[test]
    fn unknown_extension_falls_back_to_sniffing() {
        let fmt = resolve(Path::new("doc.weird"), b"  {\"a\":1}");
        assert_eq!(fmt, Format::Json);
        let fmt = resolve(Path::new("doc.weird"), b"<html></html>");
        assert_eq!(fmt, Format::Html);
        let fmt = resolve(Path::new("doc.weird"), b"random bytes");
        assert_eq!(fmt, Format::Unknown);
    }

    #[test]
    fn default_schema_table_matches_spec() {
        assert_eq!(Format::Html.default_schema(), "html5_schema.ls");
        assert_eq!(Format::Json.default_schema(), "json_schema.ls");
        assert_eq!(Format::Unknown.default_schema(), "doc_schema.ls");
    }
}
