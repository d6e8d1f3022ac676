use once_cell::sync::Lazy;
use regex::Regex;

static PARAM_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z_]+)=(.+)$").expect("parameter line pattern is valid"));

/// A `KEY=value` line from a stage env file destined for the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamEntry {
    pub key: String,
    pub value: String,
}

/// Returns the entry for a line shaped `KEY=value` with an uppercase key.
/// Everything else (comments, blanks, lowercase keys) is skipped.
pub fn parse_param_line(line: &str) -> Option<ParamEntry> {
    let captures = PARAM_LINE.captures(line)?;
    Some(ParamEntry {
        key: captures[1].to_string(),
        value: captures[2].to_string(),
    })
}

pub fn parse_param_file(contents: &str) -> Vec<ParamEntry> {
    contents.lines().filter_map(parse_param_line).collect()
}
