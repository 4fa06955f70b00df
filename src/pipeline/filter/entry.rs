use regex::Regex;
use std::fmt;

/// Match method named by `method(...)` in an advanced filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    Regex,
    Exact,
    StartsWith,
    EndsWith,
    Contains,
    None,
}

impl MatchMethod {
    pub fn from_option(value: &str) -> Option<Self> {
        match value {
            "regex" => Some(Self::Regex),
            "exact" => Some(Self::Exact),
            "starts_with" => Some(Self::StartsWith),
            "ends_with" => Some(Self::EndsWith),
            "contains" => Some(Self::Contains),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Exact => "exact",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Contains => "contains",
            Self::None => "none",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled pattern, carrying exactly the data its method needs.
#[derive(Debug, Clone)]
pub enum Matcher {
    Regex(Regex),
    Exact(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    None,
}

impl Matcher {
    pub fn method(&self) -> MatchMethod {
        match self {
            Self::Regex(_) => MatchMethod::Regex,
            Self::Exact(_) => MatchMethod::Exact,
            Self::StartsWith(_) => MatchMethod::StartsWith,
            Self::EndsWith(_) => MatchMethod::EndsWith,
            Self::Contains(_) => MatchMethod::Contains,
            Self::None => MatchMethod::None,
        }
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(candidate),
            Self::Exact(pattern) => candidate == pattern,
            Self::StartsWith(pattern) => candidate.starts_with(pattern.as_str()),
            Self::EndsWith(pattern) => candidate.ends_with(pattern.as_str()),
            Self::Contains(pattern) => candidate.contains(pattern.as_str()),
            Self::None => true,
        }
    }
}

/// Whether a compiled rule lands in the include or the exclude set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    Include,
    Exclude,
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Include => f.write_str("include"),
            Self::Exclude => f.write_str("exclude"),
        }
    }
}

/// One compiled `eventfilter` line.
///
/// `event_name` of `None` matches any event. `header` of `None` matches
/// against the whole body; otherwise it holds the header prefix with its
/// trailing colon (`"Channel:"`).
#[derive(Debug, Clone)]
pub struct FilterEntry {
    matcher: Matcher,
    event_name: Option<String>,
    header: Option<String>,
}

impl FilterEntry {
    pub(crate) fn new(matcher: Matcher, event_name: Option<String>, header: Option<String>) -> Self {
        Self {
            matcher,
            event_name,
            header,
        }
    }

    pub fn method(&self) -> MatchMethod {
        self.matcher.method()
    }

    pub fn event_name(&self) -> Option<&str> {
        self.event_name.as_deref()
    }

    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.matcher.is_match(candidate)
    }

    /// Tests this rule against one event.
    pub fn matches_event(&self, name: &str, body: &str) -> bool {
        if let Some(event_name) = &self.event_name {
            if event_name != name {
                return false;
            }
        }

        let Some(header) = &self.header else {
            if body.is_empty() {
                return self.method() == MatchMethod::None;
            }
            return self.matches(body);
        };

        body.split(['\r', '\n'])
            .filter(|line| !line.is_empty())
            .filter_map(|line| line.strip_prefix(header.as_str()))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .any(|value| self.matches(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_matchers() {
        assert!(Matcher::Exact("from-internal".into()).is_match("from-internal"));
        assert!(!Matcher::Exact("from-internal".into()).is_match("from-internal-extra"));
        assert!(Matcher::StartsWith("PJSIP/".into()).is_match("PJSIP/100-00000001"));
        assert!(!Matcher::StartsWith("PJSIP/".into()).is_match("SIP/200"));
        assert!(Matcher::EndsWith("00000001".into()).is_match("PJSIP/100-00000001"));
        assert!(Matcher::Contains("100".into()).is_match("PJSIP/100-00000001"));
        assert!(!Matcher::Contains("200".into()).is_match("PJSIP/100-00000001"));
    }

    #[test]
    fn test_regex_matches_anywhere_and_is_case_sensitive() {
        let matcher = Matcher::Regex(Regex::new("Channel: PJSIP/").unwrap());
        assert!(matcher.is_match("Privilege: call\r\nChannel: PJSIP/100\r\n"));
        assert!(!matcher.is_match("channel: pjsip/100"));
    }

    #[test]
    fn test_none_always_matches() {
        assert!(Matcher::None.is_match(""));
        assert!(Matcher::None.is_match("anything"));
    }

    #[test]
    fn test_header_scoped_entry() {
        let entry = FilterEntry::new(
            Matcher::Exact("6".into()),
            None,
            Some("ChannelState:".into()),
        );

        assert!(entry.matches_event("Newchannel", "Channel: X\r\nChannelState: 6\r\n"));
        assert!(entry.matches_event("Newchannel", "ChannelState:   6  \r\n"));
        assert!(!entry.matches_event("Newchannel", "ChannelStateDesc: 6\r\n"));
        assert!(!entry.matches_event("Newchannel", "Channel: 6\r\n"));
    }

    #[test]
    fn test_header_with_empty_value_is_skipped() {
        let entry = FilterEntry::new(Matcher::None, None, Some("Channel:".into()));

        assert!(!entry.matches_event("Newchannel", "Channel:\r\n"));
        assert!(entry.matches_event("Newchannel", "Channel: SIP/1\r\n"));
    }

    #[test]
    fn test_event_name_constraint() {
        let entry = FilterEntry::new(Matcher::None, Some("Hangup".into()), None);

        assert!(entry.matches_event("Hangup", "Channel: X\r\n"));
        assert!(entry.matches_event("Hangup", ""));
        assert!(!entry.matches_event("Newchannel", "Channel: X\r\n"));
    }

    #[test]
    fn test_empty_body_only_matches_none() {
        let entry = FilterEntry::new(Matcher::Contains("x".into()), None, None);
        assert!(!entry.matches_event("Test", ""));
    }
}
