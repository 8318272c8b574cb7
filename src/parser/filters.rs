//! PDF Stream Filter dispatch
//!
//! Reads a stream's `/Filter` entry and runs the named filters in order,
//! ISO 32000-1 Section 7.4. Actual decompression belongs to a downstream
//! collaborator: every filter here is the identity transform, so callers get
//! the stored bytes back unchanged together with the knowledge of which
//! filters still apply.

use super::objects::{PdfDictionary, PdfValue};
use super::ParseResult;
use log::debug;

/// Filters the dispatch surface recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    FlateDecode,
    LZWDecode,
    ASCII85Decode,
    ASCIIHexDecode,
    RunLengthDecode,
}

impl Filter {
    /// Look a filter up by its bare name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "FlateDecode" => Some(Filter::FlateDecode),
            "LZWDecode" => Some(Filter::LZWDecode),
            "ASCII85Decode" => Some(Filter::ASCII85Decode),
            "ASCIIHexDecode" => Some(Filter::ASCIIHexDecode),
            "RunLengthDecode" => Some(Filter::RunLengthDecode),
            _ => None,
        }
    }

    /// The filter's PDF name
    pub fn name(&self) -> &'static str {
        match self {
            Filter::FlateDecode => "FlateDecode",
            Filter::LZWDecode => "LZWDecode",
            Filter::ASCII85Decode => "ASCII85Decode",
            Filter::ASCIIHexDecode => "ASCIIHexDecode",
            Filter::RunLengthDecode => "RunLengthDecode",
        }
    }
}

/// The filter names a stream dictionary declares, in application order
pub fn filter_chain(dict: &PdfDictionary) -> Vec<String> {
    match dict.get("/Filter") {
        Some(PdfValue::Array(array)) => array.iter().filter_map(|v| v.as_name()).collect(),
        Some(value) => value.as_name().into_iter().collect(),
        None => Vec::new(),
    }
}

/// Run a stream's filter chain over its data.
///
/// Decoding is delegated; each recognized filter passes the bytes through
/// unchanged. Unrecognized names also pass through and come back to the
/// caller, which decides how to record them.
pub fn decode_stream(dict: &PdfDictionary, data: &[u8]) -> ParseResult<(Vec<u8>, Vec<String>)> {
    let mut result = data.to_vec();
    let mut unknown = Vec::new();
    for name in filter_chain(dict) {
        match Filter::from_name(&name) {
            Some(filter) => result = apply_filter(filter, result),
            None => unknown.push(name),
        }
    }
    Ok((result, unknown))
}

fn apply_filter(filter: Filter, data: Vec<u8>) -> Vec<u8> {
    debug!("{} left to collaborator, identity transform", filter.name());
    data
}
