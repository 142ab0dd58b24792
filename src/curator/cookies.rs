// Browser cookie export -> Netscape cookie jar conversion
//
// Input lines are the 7+ tab-separated columns copied out of the browser's
// storage inspector: name, value, domain, path, expires, size, httpOnly.
// yt-dlp only understands the Netscape layout, so the file is rewritten in
// place once a usable export is found.

use std::fs;
use std::path::Path;

use time::format_description::well_known::Iso8601;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use super::errors::{CuratorError, Result};

/// First line of every Netscape cookie jar
pub const NETSCAPE_HEADER: &str = "# Netscape HTTP Cookie File";

const SESSION_EXPIRY: &str = "Session";
const HTTP_ONLY_MARK: &str = "✓";
const MIN_FIELDS: usize = 7;

/// Converted jar text plus line accounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedCookies {
    pub text: String,
    pub converted: usize,
    pub skipped: usize,
}

/// What `CookieConverter::convert_file` did with the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConvertOutcome {
    /// File did not exist; an empty one was created for the user to fill
    Created,
    /// File had no lines
    Empty,
    /// File already starts with the Netscape header
    AlreadyConverted,
    /// No line could be converted; file left untouched
    NothingUsable { skipped: usize },
    /// File rewritten
    Converted { converted: usize, skipped: usize },
}

impl ConvertOutcome {
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CookieConverter;

impl CookieConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert the export at `path` in place. `false` means nothing was written.
    pub fn convert(&self, path: &Path) -> bool {
        match self.convert_file(path) {
            Ok(outcome) => {
                tracing::info!("[Cookies] {}: {:?}", path.display(), outcome);
                outcome.is_converted()
            }
            Err(e) => {
                tracing::warn!("[Cookies] Conversion of {} failed: {}", path.display(), e);
                false
            }
        }
    }

    pub fn convert_file(&self, path: &Path) -> Result<ConvertOutcome> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "")?;
            return Ok(ConvertOutcome::Created);
        }

        let content = fs::read_to_string(path)?;
        if content.is_empty() {
            return Ok(ConvertOutcome::Empty);
        }
        if content.lines().next().map(str::trim_end) == Some(NETSCAPE_HEADER) {
            return Ok(ConvertOutcome::AlreadyConverted);
        }

        let converted = convert_text(&content);
        if converted.converted == 0 {
            return Ok(ConvertOutcome::NothingUsable {
                skipped: converted.skipped,
            });
        }

        fs::write(path, &converted.text)?;
        Ok(ConvertOutcome::Converted {
            converted: converted.converted,
            skipped: converted.skipped,
        })
    }
}

/// Convert a whole export. Lines that cannot be converted are counted and dropped.
pub fn convert_text(content: &str) -> ConvertedCookies {
    let mut text = format!("{NETSCAPE_HEADER}\n");
    let mut converted = 0usize;
    let mut skipped = 0usize;

    for line in content.lines() {
        match convert_line(line) {
            Ok(netscape) => {
                text.push_str(&netscape);
                text.push('\n');
                converted += 1;
            }
            Err(e) => {
                if !line.trim().is_empty() {
                    tracing::debug!("[Cookies] Skipping line: {}", e);
                }
                skipped += 1;
            }
        }
    }

    ConvertedCookies {
        text,
        converted,
        skipped,
    }
}

/// Reorder one export line into the Netscape column layout
pub fn convert_line(line: &str) -> Result<String> {
    let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split('\t').collect();
    if fields.len() < MIN_FIELDS {
        return Err(CuratorError::Parse(format!(
            "expected {MIN_FIELDS} tab-separated fields, found {}",
            fields.len()
        )));
    }

    let name = fields[0];
    let value = fields[1];
    let domain = if fields[2].starts_with('.') {
        fields[2].to_string()
    } else {
        format!(".{}", fields[2])
    };
    let path = fields[3];
    let expires = expiry_epoch(fields[4])?;
    let http_only = if fields[6].trim() == HTTP_ONLY_MARK {
        "TRUE"
    } else {
        "FALSE"
    };

    Ok(format!(
        "{domain}\tTRUE\t{path}\t{http_only}\t{expires}\t{name}\t{value}"
    ))
}

/// `0` for session cookies, otherwise Unix seconds of the timestamp read as UTC.
///
/// Any offset written in the timestamp is replaced by UTC, not applied.
pub fn expiry_epoch(expires: &str) -> Result<i64> {
    let expires = expires.trim();
    if expires == SESSION_EXPIRY {
        return Ok(0);
    }

    // Python-style exports use a space between date and time
    let normalized = match expires.find(' ') {
        Some(idx) if idx == 10 => format!("{}T{}", &expires[..idx], &expires[idx + 1..]),
        _ => expires.to_string(),
    };

    if let Ok(dt) = OffsetDateTime::parse(&normalized, &Iso8601::DEFAULT) {
        return Ok(dt.replace_offset(UtcOffset::UTC).unix_timestamp());
    }
    if let Ok(dt) = PrimitiveDateTime::parse(&normalized, &Iso8601::DEFAULT) {
        return Ok(dt.assume_utc().unix_timestamp());
    }
    if let Ok(date) = Date::parse(&normalized, &Iso8601::DEFAULT) {
        return Ok(date.midnight().assume_utc().unix_timestamp());
    }

    Err(CuratorError::Parse(format!("unrecognized expiry timestamp {expires:?}")))
}
