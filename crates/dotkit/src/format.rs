//! Output formats understood by the rendering engines.
//!
//! Each format maps to a Graphviz `-T` flag and to the file extension the
//! command-line engine expects the tool to produce. `Svg` and `SvgStandalone`
//! share the `-Tsvg` flag and differ only in post-processing: standalone
//! output keeps the XML declaration and DOCTYPE prologue Graphviz emits,
//! while `Svg` is trimmed down to the `<svg>` element for inline embedding.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Svg,
    SvgStandalone,
    Png,
    Ps,
    Xdot,
    Plain,
    PlainExt,
    Json,
    Dot,
}

impl Format {
    /// Value for the Graphviz `-T` command-line flag.
    pub fn flag(self) -> &'static str {
        match self {
            Format::Svg | Format::SvgStandalone => "svg",
            Format::Png => "png",
            Format::Ps => "ps",
            Format::Xdot => "xdot",
            Format::Plain => "plain",
            Format::PlainExt => "plain-ext",
            Format::Json => "json",
            Format::Dot => "dot",
        }
    }

    /// Extension of the output file the tool writes for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Svg | Format::SvgStandalone => "svg",
            Format::Png => "png",
            Format::Ps => "ps",
            Format::Xdot => "xdot",
            Format::Plain | Format::PlainExt => "txt",
            Format::Json => "json",
            Format::Dot => "dot",
        }
    }

    /// Whether artifact bytes for this format are valid UTF-8 text.
    pub fn is_text(self) -> bool {
        !matches!(self, Format::Png)
    }

    /// Format-specific rewrite of raw engine output.
    ///
    /// Only `Svg` does any work: it drops everything before the `<svg`
    /// element (XML declaration, DOCTYPE, generator comments).
    pub(crate) fn postprocess(self, bytes: Vec<u8>) -> Vec<u8> {
        match self {
            Format::Svg => strip_svg_prologue(bytes),
            _ => bytes,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Svg => "svg",
            Format::SvgStandalone => "svg-standalone",
            Format::Png => "png",
            Format::Ps => "ps",
            Format::Xdot => "xdot",
            Format::Plain => "plain",
            Format::PlainExt => "plain-ext",
            Format::Json => "json",
            Format::Dot => "dot",
        };
        f.write_str(name)
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Format::Svg),
            "svg-standalone" | "svg_standalone" => Ok(Format::SvgStandalone),
            "png" => Ok(Format::Png),
            "ps" => Ok(Format::Ps),
            "xdot" => Ok(Format::Xdot),
            "plain" => Ok(Format::Plain),
            "plain-ext" | "plain_ext" => Ok(Format::PlainExt),
            "json" => Ok(Format::Json),
            "dot" => Ok(Format::Dot),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

fn strip_svg_prologue(bytes: Vec<u8>) -> Vec<u8> {
    match find_subsequence(&bytes, b"<svg") {
        Some(pos) => bytes[pos..].to_vec(),
        None => bytes,
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
