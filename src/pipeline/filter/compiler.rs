//! Compiler for `eventfilter` lines, the same syntax manager.conf accepts.
//!
//! Legacy form, a regex over the whole event body:
//!
//! ```text
//! eventfilter = Event: Newchannel
//! eventfilter = !Channel: Local/
//! ```
//!
//! Advanced form, with options in parentheses after the rule name:
//!
//! ```text
//! eventfilter(action(include),name(Newchannel)) =
//! eventfilter(action(exclude),header(Channel),method(starts_with)) = Local/
//! ```

use regex::{Regex, RegexBuilder};

use super::entry::{FilterAction, FilterEntry, MatchMethod, Matcher};

/// A rule that failed to compile, with the line it came from.
#[derive(Debug, thiserror::Error)]
#[error("'{rule}': {reason}")]
pub struct CompileError {
    pub rule: String,
    pub reason: CompileFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum CompileFailure {
    #[error("missing filter criteria")]
    MissingCriteria,

    #[error("legacy filter with no filter pattern")]
    LegacyWithoutPattern,

    #[error("filter options not formatted correctly")]
    MalformedOptions,

    #[error("'{0}' parameter not formatted correctly")]
    MalformedOption(String),

    #[error("filter option '{0}' is unknown")]
    UnknownOption(String),

    #[error("'action' option '{0}' is unknown")]
    UnknownAction(String),

    #[error("'name' parameter is empty")]
    EmptyName,

    #[error("'header' parameter is empty")]
    EmptyHeader,

    #[error("'method' option '{0}' is unknown")]
    UnknownMethod(String),

    #[error("no action, name, header, or method option found")]
    NoOptions,

    #[error("method can't be '{0}' with no filter pattern")]
    PatternRequired(MatchMethod),

    #[error("method can't be 'none' with a filter pattern")]
    PatternWithNone,

    #[error("no name or header and no filter pattern")]
    NothingToMatch,

    #[error("unable to compile regex: {0}")]
    InvalidRegex(#[from] regex::Error),
}

/// `.` also matches line breaks, so a body rule may span several lines.
fn body_regex(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).dot_matches_new_line(true).build()
}

/// Compiles one configuration entry into a filter and the set it belongs to.
///
/// A leading `!` on the pattern marks an exclude rule; an explicit
/// `action(...)` option overrides it. Nothing is produced on error.
pub fn compile(criteria: &str, pattern: &str) -> Result<(FilterEntry, FilterAction), CompileError> {
    let fail = |reason| CompileError {
        rule: format!("{} = {}", criteria, pattern),
        reason,
    };

    if criteria.trim().is_empty() {
        return Err(fail(CompileFailure::MissingCriteria));
    }

    let (mut action, pattern) = match pattern.strip_prefix('!') {
        Some(rest) => (FilterAction::Exclude, rest),
        None => (FilterAction::Include, pattern),
    };

    let Some(open) = criteria.find('(') else {
        if pattern.is_empty() {
            return Err(fail(CompileFailure::LegacyWithoutPattern));
        }
        let regex = body_regex(pattern).map_err(|e| fail(e.into()))?;
        return Ok((FilterEntry::new(Matcher::Regex(regex), None, None), action));
    };

    let options = criteria[open + 1..].trim();
    if options.is_empty() || !options.ends_with(')') {
        return Err(fail(CompileFailure::MalformedOptions));
    }

    let mut method = MatchMethod::None;
    let mut event_name = None;
    let mut header = None;
    let mut found = 0usize;

    for token in options
        .split([' ', ',', ')'])
        .filter(|token| !token.is_empty())
    {
        let Some((key, value)) = token.split_once('(') else {
            return Err(fail(CompileFailure::MalformedOption(token.to_string())));
        };
        let value = value.trim();

        match key {
            "action" => {
                action = match value {
                    "include" => FilterAction::Include,
                    "exclude" => FilterAction::Exclude,
                    other => return Err(fail(CompileFailure::UnknownAction(other.to_string()))),
                };
            }
            "name" => {
                if value.is_empty() {
                    return Err(fail(CompileFailure::EmptyName));
                }
                event_name = Some(value.to_string());
            }
            "header" => {
                if value.is_empty() {
                    return Err(fail(CompileFailure::EmptyHeader));
                }
                header = Some(if value.ends_with(':') {
                    value.to_string()
                } else {
                    format!("{}:", value)
                });
            }
            "method" => {
                method = MatchMethod::from_option(value)
                    .ok_or_else(|| fail(CompileFailure::UnknownMethod(value.to_string())))?;
            }
            other => return Err(fail(CompileFailure::UnknownOption(other.to_string()))),
        }
        found += 1;
    }

    if found == 0 {
        return Err(fail(CompileFailure::NoOptions));
    }
    if pattern.is_empty() && method != MatchMethod::None {
        return Err(fail(CompileFailure::PatternRequired(method)));
    }
    if !pattern.is_empty() && method == MatchMethod::None {
        return Err(fail(CompileFailure::PatternWithNone));
    }
    if method == MatchMethod::None && event_name.is_none() && header.is_none() {
        return Err(fail(CompileFailure::NothingToMatch));
    }

    let matcher = match method {
        MatchMethod::Regex => Matcher::Regex(body_regex(pattern).map_err(|e| fail(e.into()))?),
        MatchMethod::Exact => Matcher::Exact(pattern.to_string()),
        MatchMethod::StartsWith => Matcher::StartsWith(pattern.to_string()),
        MatchMethod::EndsWith => Matcher::EndsWith(pattern.to_string()),
        MatchMethod::Contains => Matcher::Contains(pattern.to_string()),
        MatchMethod::None => Matcher::None,
    };

    Ok((FilterEntry::new(matcher, event_name, header), action))
}
