//! Anchor vocabulary for field segmentation
//!
//! The vocabulary is data, not code: the built-in [`AnchorTable::resume`]
//! matches the current résumé card markup, and a changed layout only needs a
//! new table.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{ScrapeError, ScrapeResult};
use crate::record::fields;

/// Separators that may follow a label anchor.
const LABEL_SEPARATORS: [char; 2] = [':', '：'];

static EXPERIENCE_ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\d+\s*[~～\-]\s*\d+\s*年|\d+\s*年以上|[<＜]\s*\d+\s*年|\d+\s*年)?\s*工作經驗|無工作經驗")
        .expect("EXPERIENCE_ANCHOR: hardcoded regex is valid")
});

static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>\d{1,2})\s*歲").expect("AGE: hardcoded regex is valid")
});

static GENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s|｜/、,，])(?P<v>男|女)(?:$|[\s|｜/、,，]|\d)")
        .expect("GENDER: hardcoded regex is valid")
});

static CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"代碼\s*[:：]?\s*(?P<v>[A-Za-z0-9]+)").expect("CODE: hardcoded regex is valid")
});

static UPDATE_DATE_LABELLED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"更新(?:日期)?\s*[:：]?\s*(?P<v>\d{4}[/\-.]\d{1,2}[/\-.]\d{1,2})")
        .expect("UPDATE_DATE_LABELLED: hardcoded regex is valid")
});

static UPDATE_DATE_BARE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>\d{4}/\d{1,2}/\d{1,2})").expect("UPDATE_DATE_BARE: hardcoded regex is valid")
});

static DURATION_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>\d+\s*[~～\-]\s*\d+\s*年)").expect("DURATION_RANGE: hardcoded regex is valid")
});

static DURATION_AT_LEAST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>\d+\s*年以上)").expect("DURATION_AT_LEAST: hardcoded regex is valid")
});

static DURATION_UNDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>[<＜]\s*\d+\s*年)").expect("DURATION_UNDER: hardcoded regex is valid")
});

static DURATION_PLAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>\d+\s*年)\s*工作經驗").expect("DURATION_PLAIN: hardcoded regex is valid")
});

static DURATION_NONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<v>無工作經驗)").expect("DURATION_NONE: hardcoded regex is valid")
});

/// Where an anchor was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorHit {
    /// Byte offset where the anchor itself begins. The previous field ends here.
    pub start: usize,
    /// Byte offset where this anchor's field value begins.
    pub value_start: usize,
}

/// How a field boundary is recognised in flattened text.
#[derive(Debug, Clone)]
pub enum Anchor {
    /// Fixed label; the value starts after the label and an optional colon
    /// (ASCII or full-width).
    Label(String),
    /// Any keyword from a vocabulary; the value starts AT the keyword, so the
    /// keyword is part of the value (education level, for instance).
    Vocabulary(Vec<String>),
    /// Regular expression; the value starts after the match.
    Pattern(Regex),
}

impl Anchor {
    /// Locate the first occurrence of this anchor.
    #[must_use]
    pub fn locate(&self, text: &str) -> Option<AnchorHit> {
        match self {
            Anchor::Label(label) => {
                let start = text.find(label.as_str())?;
                let mut value_start = start + label.len();
                let rest = &text[value_start..];
                let trimmed = rest.trim_start();
                if let Some(sep) = trimmed.chars().next().filter(|c| LABEL_SEPARATORS.contains(c)) {
                    value_start += (rest.len() - trimmed.len()) + sep.len_utf8();
                }
                Some(AnchorHit { start, value_start })
            }
            Anchor::Vocabulary(words) => {
                let start = words
                    .iter()
                    .filter(|w| !w.is_empty())
                    .filter_map(|w| text.find(w.as_str()))
                    .min()?;
                Some(AnchorHit {
                    start,
                    value_start: start,
                })
            }
            Anchor::Pattern(re) => {
                let m = re.find(text)?;
                Some(AnchorHit {
                    start: m.start(),
                    value_start: m.end(),
                })
            }
        }
    }
}

/// One anchor-framed field. Its value runs from this anchor to the next
/// rule's anchor; the last rule runs to the first action keyword.
#[derive(Debug, Clone)]
pub struct SegmentRule {
    pub field: String,
    pub anchor: Anchor,
}

impl SegmentRule {
    pub fn label(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            anchor: Anchor::Label(label.to_string()),
        }
    }

    pub fn vocabulary(field: &str, words: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            anchor: Anchor::Vocabulary(words.iter().map(|w| (*w).to_string()).collect()),
        }
    }

    pub fn pattern(field: &str, pattern: &str) -> ScrapeResult<Self> {
        let re = Regex::new(pattern)
            .map_err(|e| ScrapeError::Config(format!("invalid anchor pattern for {field}: {e}")))?;
        Ok(Self {
            field: field.to_string(),
            anchor: Anchor::Pattern(re),
        })
    }
}

/// Standalone token found anywhere in the text. Patterns are tried in order
/// and the first match wins; the value is the `v` capture group, or the
/// whole match when the pattern has none.
#[derive(Debug, Clone)]
pub struct PatternField {
    pub field: String,
    pub patterns: Vec<Regex>,
}

impl PatternField {
    pub fn new(field: &str, patterns: &[&str]) -> ScrapeResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ScrapeError::Config(format!("invalid pattern for {field}: {e}"))
                })
            })
            .collect::<ScrapeResult<Vec<_>>>()?;
        Ok(Self {
            field: field.to_string(),
            patterns,
        })
    }

    fn from_compiled(field: &str, patterns: &[&LazyLock<Regex>]) -> Self {
        Self {
            field: field.to_string(),
            patterns: patterns.iter().map(|p| Regex::clone(p)).collect(),
        }
    }

    /// First matching value, if any pattern matches.
    #[must_use]
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns.iter().find_map(|re| {
            let caps = re.captures(text)?;
            caps.name("v").or_else(|| caps.get(0)).map(|m| m.as_str())
        })
    }
}

/// Complete segmentation vocabulary for one card layout.
#[derive(Debug, Clone)]
pub struct AnchorTable {
    segments: Vec<SegmentRule>,
    action_keywords: Vec<String>,
    patterns: Vec<PatternField>,
}

impl AnchorTable {
    /// Build a table. Segments must be given in the order they appear on the
    /// card.
    pub fn new(
        segments: Vec<SegmentRule>,
        action_keywords: Vec<String>,
        patterns: Vec<PatternField>,
    ) -> ScrapeResult<Self> {
        if segments.is_empty() && patterns.is_empty() {
            return Err(ScrapeError::Config(
                "anchor table needs at least one segment or pattern".to_string(),
            ));
        }
        Ok(Self {
            segments,
            action_keywords,
            patterns,
        })
    }

    /// Layout of a résumé search-result card on the recruiter portal.
    ///
    /// `希望工作地: … 居住地: … <education> … 希望職稱: … <N年工作經驗> <history> 邀請 儲存 …`
    #[must_use]
    pub fn resume() -> Self {
        Self {
            segments: vec![
                SegmentRule::label(fields::WORK_LOCATION, "希望工作地"),
                SegmentRule::label(fields::LIVING_LOCATION, "居住地"),
                SegmentRule::vocabulary(
                    fields::EDUCATION,
                    &["博士", "碩士", "大學", "專科", "高中", "高職", "國中"],
                ),
                SegmentRule::label(fields::DESIRED_JOB, "希望職稱"),
                SegmentRule {
                    field: fields::WORK_HISTORY.to_string(),
                    anchor: Anchor::Pattern(Regex::clone(&EXPERIENCE_ANCHOR)),
                },
            ],
            action_keywords: ["邀請", "儲存", "轉寄", "備註"]
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            patterns: vec![
                PatternField::from_compiled(fields::AGE, &[&AGE]),
                PatternField::from_compiled(fields::GENDER, &[&GENDER]),
                PatternField::from_compiled(fields::CODE, &[&CODE]),
                PatternField::from_compiled(
                    fields::UPDATE_DATE,
                    &[&UPDATE_DATE_LABELLED, &UPDATE_DATE_BARE],
                ),
                PatternField::from_compiled(
                    fields::EXPERIENCE_DURATION,
                    &[
                        &DURATION_RANGE,
                        &DURATION_AT_LEAST,
                        &DURATION_UNDER,
                        &DURATION_PLAIN,
                        &DURATION_NONE,
                    ],
                ),
            ],
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[SegmentRule] {
        &self.segments
    }

    #[must_use]
    pub fn action_keywords(&self) -> &[String] {
        &self.action_keywords
    }

    #[must_use]
    pub fn patterns(&self) -> &[PatternField] {
        &self.patterns
    }

    /// Every field this table can produce, segments first.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.segments
            .iter()
            .map(|s| s.field.as_str())
            .chain(self.patterns.iter().map(|p| p.field.as_str()))
    }
}
