//! Sorting and filtering of article lists.
//!
//! The derived list shown to the user is always `derive_view(raw, sort, filter)`:
//! keep articles whose title matches the filter, then stable-sort them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::article::Article;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderingError {
    #[error("unknown sort field '{0}' (expected Time or Votes)")]
    UnknownSortField(String),
    #[error("invalid sort direction {0} (expected 1 or -1)")]
    InvalidDirection(i64),
    #[error("invalid filter pattern '{pattern}': {source}")]
    InvalidFilter {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Time,
    Votes,
}

impl FromStr for SortField {
    type Err = OrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("time") {
            Ok(SortField::Time)
        } else if s.eq_ignore_ascii_case("votes") {
            Ok(SortField::Votes)
        } else {
            Err(OrderingError::UnknownSortField(s.to_string()))
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortField::Time => f.write_str("Time"),
            SortField::Votes => f.write_str("Votes"),
        }
    }
}

/// Multiplier applied to the natural (newest / most voted first) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// `+1`: newest or most voted first
    #[default]
    Descending,
    /// `-1`: oldest or least voted first
    Ascending,
}

impl SortDirection {
    pub fn multiplier(self) -> i64 {
        match self {
            SortDirection::Descending => 1,
            SortDirection::Ascending => -1,
        }
    }
}

impl TryFrom<i64> for SortDirection {
    type Error = OrderingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SortDirection::Descending),
            -1 => Ok(SortDirection::Ascending),
            other => Err(OrderingError::InvalidDirection(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Build a spec from the loosely-typed pair a caller hands to `set_sort`.
    pub fn parse(field: &str, direction: i64) -> Result<Self, OrderingError> {
        Ok(Self::new(field.parse()?, SortDirection::try_from(direction)?))
    }

    pub fn compare(&self, a: &Article, b: &Article) -> Ordering {
        let natural = match self.field {
            SortField::Time => b.published_at.cmp(&a.published_at),
            SortField::Votes => b.votes.cmp(&a.votes),
        };
        match self.direction {
            SortDirection::Descending => natural,
            SortDirection::Ascending => natural.reverse(),
        }
    }
}

/// Case-insensitive title filter.
#[derive(Debug, Clone)]
pub struct TitleFilter {
    pattern: String,
    matcher: Matcher,
}

#[derive(Debug, Clone)]
enum Matcher {
    Everything,
    Nothing,
    Pattern(Regex),
}

impl TitleFilter {
    pub fn parse(pattern: &str) -> Result<Self, OrderingError> {
        let matcher = if pattern.is_empty() {
            Matcher::Everything
        } else {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| OrderingError::InvalidFilter {
                    pattern: pattern.to_string(),
                    source,
                })?;
            Matcher::Pattern(regex)
        };

        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Filter used in place of a pattern that failed to compile.
    pub fn match_nothing(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            matcher: Matcher::Nothing,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, article: &Article) -> bool {
        match &self.matcher {
            Matcher::Everything => true,
            Matcher::Nothing => false,
            Matcher::Pattern(regex) => regex.is_match(&article.title),
        }
    }
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self {
            pattern: String::new(),
            matcher: Matcher::Everything,
        }
    }
}

/// Filter `raw` by title, then stable-sort the survivors.
pub fn derive_view(raw: &[Article], sort: &SortSpec, filter: &TitleFilter) -> Vec<Article> {
    let mut view: Vec<Article> = raw.iter().filter(|a| filter.matches(a)).cloned().collect();
    view.sort_by(|a, b| sort.compare(a, b));
    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(offset_hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2017, 3, 1, 0, 0, 0).unwrap() + Duration::hours(offset_hours)
    }

    fn cats_and_dogs() -> Vec<Article> {
        vec![
            Article::new("Cats", "meow", 5, t(1)),
            Article::new("Dogs", "woof", 9, t(2)),
        ]
    }

    fn titles(articles: &[Article]) -> Vec<&str> {
        articles.iter().map(|a| a.title.as_str()).collect()
    }

    fn mixed() -> Vec<Article> {
        vec![
            Article::new("alpha", "", 3, t(5)),
            Article::new("beta", "", 7, t(1)),
            Article::new("gamma", "", 3, t(9)),
            Article::new("delta", "", 0, t(5)),
            Article::new("epsilon", "", 7, t(3)),
            Article::new("zeta", "", 12, t(5)),
        ]
    }

    mod sort_field_tests {
        use super::*;

        #[test]
        fn test_parse_known_fields() {
            assert_eq!("Time".parse::<SortField>(), Ok(SortField::Time));
            assert_eq!("Votes".parse::<SortField>(), Ok(SortField::Votes));
            assert_eq!("votes".parse::<SortField>(), Ok(SortField::Votes));
        }

        #[test]
        fn test_parse_unknown_field() {
            assert_eq!(
                "Comments".parse::<SortField>(),
                Err(OrderingError::UnknownSortField("Comments".to_string()))
            );
        }

        #[test]
        fn test_direction_from_multiplier() {
            assert_eq!(SortDirection::try_from(1), Ok(SortDirection::Descending));
            assert_eq!(SortDirection::try_from(-1), Ok(SortDirection::Ascending));
            assert_eq!(
                SortDirection::try_from(2),
                Err(OrderingError::InvalidDirection(2))
            );
            assert_eq!(SortDirection::Ascending.multiplier(), -1);
        }

        #[test]
        fn test_default_spec_is_newest_first() {
            let spec = SortSpec::default();
            assert_eq!(spec.field, SortField::Time);
            assert_eq!(spec.direction, SortDirection::Descending);
        }
    }

    mod sort_tests {
        use super::*;

        #[test]
        fn test_votes_descending_scenario() {
            let spec = SortSpec::parse("Votes", 1).unwrap();
            let view = derive_view(&cats_and_dogs(), &spec, &TitleFilter::default());
            assert_eq!(titles(&view), vec!["Dogs", "Cats"]);
        }

        #[test]
        fn test_time_descending_scenario() {
            let spec = SortSpec::parse("Time", 1).unwrap();
            let view = derive_view(&cats_and_dogs(), &spec, &TitleFilter::default());
            assert_eq!(titles(&view), vec!["Dogs", "Cats"]);
        }

        #[test]
        fn test_time_ascending_is_oldest_first() {
            let spec = SortSpec::parse("Time", -1).unwrap();
            let view = derive_view(&cats_and_dogs(), &spec, &TitleFilter::default());
            assert_eq!(titles(&view), vec!["Cats", "Dogs"]);
        }

        #[test]
        fn test_time_monotonic_in_both_directions() {
            let desc = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Time, SortDirection::Descending),
                &TitleFilter::default(),
            );
            assert!(desc
                .windows(2)
                .all(|w| w[0].published_at >= w[1].published_at));

            let asc = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Time, SortDirection::Ascending),
                &TitleFilter::default(),
            );
            assert!(asc
                .windows(2)
                .all(|w| w[0].published_at <= w[1].published_at));
        }

        #[test]
        fn test_votes_monotonic_in_both_directions() {
            let desc = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Votes, SortDirection::Descending),
                &TitleFilter::default(),
            );
            assert!(desc.windows(2).all(|w| w[0].votes >= w[1].votes));

            let asc = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Votes, SortDirection::Ascending),
                &TitleFilter::default(),
            );
            assert!(asc.windows(2).all(|w| w[0].votes <= w[1].votes));
        }

        #[test]
        fn test_equal_keys_keep_input_order() {
            // alpha/delta/zeta share a timestamp, alpha/gamma and beta/epsilon share votes
            let by_time = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Time, SortDirection::Descending),
                &TitleFilter::default(),
            );
            assert_eq!(
                titles(&by_time),
                vec!["gamma", "alpha", "delta", "zeta", "epsilon", "beta"]
            );

            let by_votes_asc = derive_view(
                &mixed(),
                &SortSpec::new(SortField::Votes, SortDirection::Ascending),
                &TitleFilter::default(),
            );
            assert_eq!(
                titles(&by_votes_asc),
                vec!["delta", "alpha", "gamma", "beta", "epsilon", "zeta"]
            );
        }

        #[test]
        fn test_empty_list() {
            let view = derive_view(&[], &SortSpec::default(), &TitleFilter::default());
            assert!(view.is_empty());
        }
    }

    mod filter_tests {
        use super::*;

        #[test]
        fn test_case_insensitive_scenario() {
            let filter = TitleFilter::parse("cat").unwrap();
            let view = derive_view(&cats_and_dogs(), &SortSpec::default(), &filter);
            assert_eq!(titles(&view), vec!["Cats"]);
        }

        #[test]
        fn test_empty_filter_matches_everything() {
            let mut articles = mixed();
            articles.push(Article::new("", "", 0, t(0)));
            articles.push(Article::new("[weird] (title)*", "", 0, t(0)));

            let filter = TitleFilter::parse("").unwrap();
            assert!(articles.iter().all(|a| filter.matches(a)));
        }

        #[test]
        fn test_regex_syntax() {
            let filter = TitleFilter::parse("^(alpha|zeta)$").unwrap();
            let view = derive_view(&mixed(), &SortSpec::default(), &filter);
            assert_eq!(titles(&view), vec!["alpha", "zeta"]);
        }

        #[test]
        fn test_filtering_is_idempotent() {
            let filter = TitleFilter::parse("a$").unwrap();
            let once = derive_view(&mixed(), &SortSpec::default(), &filter);
            let twice = derive_view(&once, &SortSpec::default(), &filter);
            assert_eq!(once, twice);
            assert!(!once.is_empty());
        }

        #[test]
        fn test_malformed_pattern_is_an_error() {
            let err = TitleFilter::parse("(unclosed").unwrap_err();
            assert!(matches!(err, OrderingError::InvalidFilter { ref pattern, .. } if pattern == "(unclosed"));
        }

        #[test]
        fn test_match_nothing_fallback() {
            let filter = TitleFilter::match_nothing("(unclosed");
            assert_eq!(filter.pattern(), "(unclosed");
            let view = derive_view(&mixed(), &SortSpec::default(), &filter);
            assert!(view.is_empty());
        }
    }
}
