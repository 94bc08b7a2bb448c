//! Episode name recognition.
//!
//! A file or folder name is treated as a series episode when a title segment
//! is followed by one of a small, closed set of season/episode indicators.
//! The title before the first indicator becomes the canonical show name that
//! names the series destination folder.

use once_cell::sync::Lazy;
use regex::Regex;

// S01E02, s1.e2, S01 - E02
static SEASON_EPISODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s._\-]*S\d{1,2}[\s._\-]*E\d{1,2}").unwrap());

// 1x02, 01x02
static CROSS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s._\-]*\d{1,2}x\d{1,2}").unwrap());

// S02.09, S02 09
static SEASON_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s._\-]*S\d{1,2}[\s._\-]*\d{1,2}").unwrap());

// .E16, - E3 ; the digit run is checked separately so E123 is rejected
static BARE_EPISODE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s._\-]+E(\d+)").unwrap());

/// Outcome of classifying a single file or folder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The name encodes a series episode of `show_title`.
    SeriesMatch {
        /// Canonical, title-cased show name.
        show_title: String,
    },
    /// No episode indicator; the item is movie content.
    NoMatch,
}

impl Classification {
    /// The canonical show name, if this is a series match.
    pub fn show_title(&self) -> Option<&str> {
        match self {
            Classification::SeriesMatch { show_title } => Some(show_title),
            Classification::NoMatch => None,
        }
    }
}

/// The recognized episode indicator shapes, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorShape {
    /// `S<1-2 digits>E<1-2 digits>`, separators allowed around and between.
    SeasonEpisode,
    /// `<1-2 digits>x<1-2 digits>`.
    Cross,
    /// `S<1-2 digits>` followed by a bare `<1-2 digits>`, e.g. `S02.09`.
    SeasonNumber,
    /// Separator, then `E<1-2 digits>` not followed by another digit.
    BareEpisode,
}

impl IndicatorShape {
    pub const ALL: [IndicatorShape; 4] = [
        IndicatorShape::SeasonEpisode,
        IndicatorShape::Cross,
        IndicatorShape::SeasonNumber,
        IndicatorShape::BareEpisode,
    ];

    /// True if this indicator starts exactly at the beginning of `rest`.
    ///
    /// # Examples
    ///
    /// ```
    /// use mediabot::pattern::IndicatorShape;
    ///
    /// assert!(IndicatorShape::SeasonEpisode.matches_at(".S01E02.mkv"));
    /// assert!(IndicatorShape::BareEpisode.matches_at(" - E16"));
    /// assert!(!IndicatorShape::BareEpisode.matches_at(".E123"));
    /// ```
    pub fn matches_at(self, rest: &str) -> bool {
        match self {
            IndicatorShape::SeasonEpisode => SEASON_EPISODE_REGEX.is_match(rest),
            IndicatorShape::Cross => CROSS_REGEX.is_match(rest),
            IndicatorShape::SeasonNumber => SEASON_NUMBER_REGEX.is_match(rest),
            IndicatorShape::BareEpisode => BARE_EPISODE_REGEX
                .captures(rest)
                .and_then(|caps| caps.get(1))
                .is_some_and(|digits| digits.as_str().chars().count() <= 2),
        }
    }
}

/// Raw location of the first indicator in a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorMatch<'a> {
    /// The title segment exactly as it appears in the name.
    pub raw_title: &'a str,
    /// The indicator that terminated the title.
    pub shape: IndicatorShape,
}

fn is_title_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '.' | '-' | '_')
}

/// Finds the first title segment followed by an episode indicator.
///
/// Candidates are tried leftmost start first; for each start the shortest
/// title that is directly followed by an indicator wins. The title is a
/// non-empty run of ASCII letters, digits, whitespace, dots, hyphens and
/// underscores.
pub fn find_indicator(name: &str) -> Option<IndicatorMatch<'_>> {
    for (start, _) in name.char_indices() {
        for (offset, c) in name[start..].char_indices() {
            if !is_title_char(c) {
                break;
            }
            let end = start + offset + c.len_utf8();
            let rest = &name[end..];
            if let Some(shape) = IndicatorShape::ALL
                .into_iter()
                .find(|shape| shape.matches_at(rest))
            {
                return Some(IndicatorMatch {
                    raw_title: &name[start..end],
                    shape,
                });
            }
        }
    }
    None
}

/// Classifies a file or folder name as series or movie content.
///
/// # Examples
///
/// ```
/// use mediabot::pattern::{classify, Classification};
///
/// assert_eq!(
///     classify("Show.Name.S01E02.mkv").show_title(),
///     Some("Show Name")
/// );
/// assert_eq!(classify("Inception.2010.mkv"), Classification::NoMatch);
/// ```
pub fn classify(name: &str) -> Classification {
    find_indicator(name)
        .and_then(|found| canonical_show_name(found.raw_title))
        .map(|show_title| Classification::SeriesMatch { show_title })
        .unwrap_or(Classification::NoMatch)
}

/// Normalizes a raw title into the show folder name.
///
/// Dots and underscores become spaces, whitespace runs collapse to one space,
/// the ends are trimmed and every word is title-cased. Returns `None` when
/// nothing is left.
///
/// Title-casing is deliberately simple: `"lord of the rings"` becomes
/// `"Lord Of The Rings"` and `"NCIS"` becomes `"Ncis"`.
pub fn canonical_show_name(raw_title: &str) -> Option<String> {
    let spaced = raw_title.replace(['.', '_'], " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    Some(title_case(&collapsed))
}

/// Uppercases the first letter of every run of letters and lowercases the
/// rest. Non-letters (digits, spaces, hyphens) start a new word.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_is_letter = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            out.push(c);
            previous_is_letter = false;
        }
    }
    out
}
