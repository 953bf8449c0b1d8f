//! Remote file naming.
//!
//! Every upload lands as `<stem>_<disambiguator>[.<ext>]` so repeated uploads
//! of the same local file do not overwrite each other. With the timestamp
//! scheme two attempts inside the same second produce the same name; that
//! collision is left visible rather than papered over.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const SEQUENCE_WIDTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingScheme {
    /// `20240131235959`, one-second resolution.
    #[default]
    Timestamp,
    /// Zero-padded ordinal test id, `000042`.
    Sequence,
    /// `20240131235959-000042`.
    TimestampSequence,
}

/// Inputs the disambiguator is derived from.
#[derive(Debug, Clone, Copy)]
pub struct SequenceContext {
    pub at: DateTime<Local>,
    pub sequence: u64,
}

impl SequenceContext {
    pub fn new(at: DateTime<Local>, sequence: u64) -> Self {
        Self { at, sequence }
    }
}

impl NamingScheme {
    pub fn disambiguator(&self, ctx: &SequenceContext) -> String {
        match self {
            NamingScheme::Timestamp => ctx.at.format(TIMESTAMP_FORMAT).to_string(),
            NamingScheme::Sequence => format!("{:0width$}", ctx.sequence, width = SEQUENCE_WIDTH),
            NamingScheme::TimestampSequence => format!(
                "{}-{:0width$}",
                ctx.at.format(TIMESTAMP_FORMAT),
                ctx.sequence,
                width = SEQUENCE_WIDTH
            ),
        }
    }

    /// Remote file name for `original` under this scheme.
    pub fn remote_name(&self, original: &str, ctx: &SequenceContext) -> String {
        let disambiguator = self.disambiguator(ctx);
        let (stem, extension) = split_name(original);
        match extension {
            Some(ext) => format!("{stem}_{disambiguator}.{ext}"),
            None => format!("{stem}_{disambiguator}"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NamingScheme::Timestamp => "timestamp",
            NamingScheme::Sequence => "sequence",
            NamingScheme::TimestampSequence => "timestamp-sequence",
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(NamingScheme::Timestamp),
            "sequence" => Ok(NamingScheme::Sequence),
            "timestamp-sequence" => Ok(NamingScheme::TimestampSequence),
            other => Err(format!(
                "unknown naming scheme '{other}' (expected timestamp, sequence or timestamp-sequence)"
            )),
        }
    }
}

/// Recover the local file name from a generated remote name.
///
/// Returns `None` when `remote` does not carry a disambiguator.
pub fn original_name(remote: &str) -> Option<String> {
    let (stem, extension) = split_name(remote);
    let idx = stem.rfind('_')?;
    let disambiguator = &stem[idx + 1..];
    if disambiguator.is_empty()
        || !disambiguator
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-')
    {
        return None;
    }
    let base = &stem[..idx];
    Some(match extension {
        Some(ext) => format!("{base}.{ext}"),
        None => base.to_string(),
    })
}

/// Join a remote directory and file name. Remote paths are always `/`-separated.
pub fn remote_path(remote_dir: &str, name: &str) -> String {
    format!("{}/{}", remote_dir.trim_end_matches('/'), name)
}

/// Split on the last `.`, treating a leading dot as part of the stem
/// (`.env` has no extension).
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}
