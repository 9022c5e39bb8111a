//! Per-target listing configuration
//!
//! Résumé, job and company result pages share one extraction loop; what
//! differs between them (card locators, field rules, search entry, schema)
//! lives in a [`ListingProfile`].

use regex::Regex;
use std::time::Duration;

use crate::error::{ScrapeError, ScrapeResult};
use crate::locator::{Locator, LocatorList};
use crate::pagination::PaginationProfile;
use crate::record::{ExtractedRecord, fields};
use crate::segmentation::{AnchorTable, PatternField};

/// Which built-in profile to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Resumes,
    Jobs,
    Companies,
}

impl ListingKind {
    pub fn profile(self) -> ScrapeResult<ListingProfile> {
        match self {
            ListingKind::Resumes => ListingProfile::resumes(),
            ListingKind::Jobs => ListingProfile::jobs(),
            ListingKind::Companies => ListingProfile::companies(),
        }
    }
}

/// One tag category: tags matching `matches` (and not `excludes`) fill `field`.
#[derive(Debug, Clone)]
pub struct TagClass {
    pub field: String,
    pub matches: Regex,
    pub excludes: Option<Regex>,
    /// Narrow the stored value to the `v` group of this pattern
    pub extract: Option<Regex>,
}

impl TagClass {
    pub fn new(field: &str, matches: &str) -> ScrapeResult<Self> {
        Ok(Self {
            field: field.to_string(),
            matches: compile(field, matches)?,
            excludes: None,
            extract: None,
        })
    }

    pub fn excluding(mut self, pattern: &str) -> ScrapeResult<Self> {
        self.excludes = Some(compile(&self.field, pattern)?);
        Ok(self)
    }

    pub fn extracting(mut self, pattern: &str) -> ScrapeResult<Self> {
        self.extract = Some(compile(&self.field, pattern)?);
        Ok(self)
    }

    /// Value this class takes from `tag`, if the tag belongs to it.
    #[must_use]
    pub fn classify(&self, tag: &str) -> Option<String> {
        if !self.matches.is_match(tag) || self.excludes.as_ref().is_some_and(|re| re.is_match(tag)) {
            return None;
        }
        match &self.extract {
            Some(re) => re
                .captures(tag)
                .and_then(|c| c.name("v").or_else(|| c.get(0)))
                .map(|m| m.as_str().to_string()),
            None => Some(tag.to_string()),
        }
    }
}

fn compile(field: &str, pattern: &str) -> ScrapeResult<Regex> {
    Regex::new(pattern).map_err(|e| ScrapeError::Config(format!("invalid pattern for {field}: {e}")))
}

/// How one field is read from a listing card
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Trimmed text of the first match
    Text { field: String, locators: LocatorList },
    /// Attribute of the first match, resolved against the profile's base URL
    /// when `absolutize` is set
    Attribute {
        field: String,
        locators: LocatorList,
        attribute: String,
        absolutize: bool,
    },
    /// Texts of every match joined with `separator`, skipping texts that
    /// contain any of `exclude`
    Joined {
        field: String,
        locators: LocatorList,
        separator: String,
        exclude: Vec<String>,
    },
    /// Every match is offered to `classes` in order; the first class that
    /// accepts a tag and is still empty takes it
    Tagged { locators: LocatorList, classes: Vec<TagClass> },
}

impl FieldRule {
    pub fn text(field: &str, locators: LocatorList) -> Self {
        FieldRule::Text {
            field: field.to_string(),
            locators,
        }
    }

    pub fn link(field: &str, locators: LocatorList) -> Self {
        FieldRule::Attribute {
            field: field.to_string(),
            locators,
            attribute: "href".to_string(),
            absolutize: true,
        }
    }

    pub fn joined(field: &str, locators: LocatorList, exclude: &[&str]) -> Self {
        FieldRule::Joined {
            field: field.to_string(),
            locators,
            separator: ", ".to_string(),
            exclude: exclude.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Photo element on a card
#[derive(Debug, Clone)]
pub struct PhotoRule {
    pub locators: LocatorList,
    /// A `src` must contain one of these to count as a profile photo
    pub src_markers: Vec<String>,
}

impl PhotoRule {
    #[must_use]
    pub fn accepts(&self, src: &str) -> bool {
        self.src_markers.iter().any(|m| src.contains(m.as_str()))
    }
}

/// How the result set for a keyword is reached
#[derive(Debug, Clone)]
pub enum SearchEntry {
    /// Type into a search box and press Enter. When no box is found on the
    /// current page, navigate to `fallback_url` and try once more.
    Form { inputs: LocatorList, fallback_url: String },
    /// Navigate to a URL with `{keyword}` substituted, URL-encoded
    UrlTemplate(String),
}

/// Signs that a search returned nothing
#[derive(Debug, Clone, Default)]
pub struct NoResultMarkers {
    pub texts: Vec<String>,
    pub locators: Option<LocatorList>,
}

/// Everything that differs between listing targets
#[derive(Debug, Clone)]
pub struct ListingProfile {
    pub kind: ListingKind,
    /// Origin that relative links and photo URLs resolve against
    pub base_url: String,
    /// Output columns in order
    pub schema: Vec<String>,
    pub cards: LocatorList,
    pub fields: Vec<FieldRule>,
    /// Segments the card's full text into fields no tag boundary separates
    pub segmentation: Option<AnchorTable>,
    /// Patterns over the card text that fill fields still empty afterwards
    pub text_patterns: Vec<PatternField>,
    pub photo: Option<PhotoRule>,
    /// Records missing any of these are dropped
    pub required: Vec<String>,
    /// Records repeating the combined values of these fields are dropped.
    /// A record missing any of them is never treated as a duplicate.
    pub dedupe_on: Vec<String>,
    pub requires_session: bool,
    pub search: SearchEntry,
    pub no_results: NoResultMarkers,
    pub pagination: PaginationProfile,
    /// Per-candidate wait for card sub-fields; zero is a single query
    pub field_timeout: Duration,
    /// Per-candidate wait for the card list after each page load
    pub card_timeout: Duration,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl ListingProfile {
    /// Résumé search results on the recruiter portal. Requires a session.
    pub fn resumes() -> ScrapeResult<Self> {
        Ok(Self {
            kind: ListingKind::Resumes,
            base_url: "https://vip.104.com.tw/".to_string(),
            schema: strings(&[
                fields::NAME,
                fields::AGE,
                fields::GENDER,
                fields::CODE,
                fields::UPDATE_DATE,
                fields::WORK_LOCATION,
                fields::LIVING_LOCATION,
                fields::EDUCATION,
                fields::DESIRED_JOB,
                fields::EXPERIENCE_DURATION,
                fields::WORK_HISTORY,
                fields::PHOTO_URL,
                fields::PHOTO_PATH,
                fields::PROFILE_URL,
                fields::PAGE_NUMBER,
            ]),
            cards: LocatorList::from_css(
                "resume cards",
                &[
                    ".resume-card",
                    ".candidate-card",
                    ".search-result-item",
                    ".list-item",
                    "[role=\"listitem\"]",
                    ".card",
                    "article",
                    ".resumeList",
                    ".BaseCard",
                ],
            )?,
            fields: vec![
                FieldRule::text(
                    fields::NAME,
                    LocatorList::from_css(
                        "candidate name",
                        &[".name", "h2", ".title", "[data-qa-id=\"name\"]"],
                    )?,
                ),
                FieldRule::link(
                    fields::PROFILE_URL,
                    LocatorList::from_css(
                        "profile link",
                        &["a[href*=\"profile\"]", "a[href*=\"resume\"]", "a[href*=\"detail\"]"],
                    )?,
                ),
            ],
            segmentation: Some(AnchorTable::resume()),
            text_patterns: Vec::new(),
            photo: Some(PhotoRule {
                locators: LocatorList::from_css(
                    "profile photo",
                    &[
                        "img[src*=\"webHeadShot\"]",
                        "img[src*=\"headShot\"]",
                        "img[src*=\"photo\"]",
                        "img[src*=\"avatar\"]",
                        ".BaseAvatar img",
                    ],
                )?,
                src_markers: strings(&["webHeadShot", "headShot", "photo", "avatar"]),
            }),
            required: Vec::new(),
            dedupe_on: strings(&[fields::CODE, fields::NAME]),
            requires_session: true,
            search: SearchEntry::Form {
                inputs: LocatorList::from_css(
                    "search input",
                    &[
                        "input[data-qa-id=\"inputKeywordSearch\"]",
                        "input[placeholder=\"請輸入關鍵字\"]",
                        "input.form-input--dark",
                        "input.form-control.form-input",
                        "input[placeholder*=\"搜尋\"]",
                        "input[type=\"search\"]",
                        "input[name=\"keyword\"]",
                        "input[data-testid=\"search-input\"]",
                    ],
                )?,
                fallback_url: "https://vip.104.com.tw/search".to_string(),
            },
            no_results: NoResultMarkers::default(),
            pagination: PaginationProfile::portal_default()?,
            field_timeout: Duration::ZERO,
            card_timeout: Duration::from_secs(5),
        })
    }

    /// Public job search results.
    pub fn jobs() -> ScrapeResult<Self> {
        Ok(Self {
            kind: ListingKind::Jobs,
            base_url: "https://www.104.com.tw/".to_string(),
            schema: strings(&[
                fields::TITLE,
                fields::COMPANY,
                fields::LOCATION,
                fields::EXPERIENCE,
                fields::EDUCATION,
                fields::SALARY,
                fields::DESCRIPTION,
                fields::TAGS,
                fields::JOB_URL,
                fields::PAGE_NUMBER,
            ]),
            cards: LocatorList::from_css(
                "job cards",
                &[
                    ".job-list-item",
                    "article.job-list-item",
                    "[data-v-98e2e189] .job-summary",
                    ".vue-recycle-scroller__item-view",
                    "div.position-relative.bg-white",
                ],
            )?,
            fields: vec![
                FieldRule::text(
                    fields::TITLE,
                    LocatorList::from_css(
                        "job title",
                        &[".info-job__text", "h2 a", ".job-name", ".job-title"],
                    )?,
                ),
                FieldRule::text(
                    fields::COMPANY,
                    LocatorList::from_css(
                        "company name",
                        &[".info-company__text", ".job-company", ".company-name"],
                    )?,
                ),
                FieldRule::Tagged {
                    locators: LocatorList::from_css(
                        "job requirement tags",
                        &[
                            ".info-tags__text",
                            ".job-requirement__location, .job-requirement__edu, .job-requirement__exp, .job-requirement__salary",
                        ],
                    )?,
                    classes: vec![
                        TagClass::new(fields::LOCATION, "市|縣|區|鄉|鎮")?,
                        TagClass::new(fields::EXPERIENCE, "年|經歷")?,
                        TagClass::new(fields::EDUCATION, "大學|專科|學歷|高中")?,
                        TagClass::new(fields::SALARY, "月薪|年薪|待遇")?,
                    ],
                },
                FieldRule::text(
                    fields::DESCRIPTION,
                    LocatorList::from_css(
                        "job description",
                        &[".info-description", ".job-description", ".job-detail__content"],
                    )?,
                ),
                FieldRule::joined(
                    fields::TAGS,
                    LocatorList::from_css(
                        "job tags",
                        &[".info-othertags__text", ".tag", ".job-tag"],
                    )?,
                    &[],
                ),
                FieldRule::link(
                    fields::JOB_URL,
                    LocatorList::from_css(
                        "job link",
                        &[
                            "a.info-job__text",
                            ".info-job__text a",
                            "h2 a",
                            ".job-name a",
                            "a[href*=\"/job/\"]",
                        ],
                    )?,
                ),
            ],
            segmentation: None,
            text_patterns: Vec::new(),
            photo: None,
            required: vec![fields::TITLE.to_string()],
            dedupe_on: strings(&[fields::JOB_URL]),
            requires_session: false,
            search: SearchEntry::UrlTemplate(
                "https://www.104.com.tw/jobs/search/?keyword={keyword}".to_string(),
            ),
            no_results: NoResultMarkers {
                texts: strings(&["查無符合條件的職缺"]),
                locators: Some(LocatorList::from_css(
                    "no-result notice",
                    &[".no-result", ".empty-result", ".search-no-result"],
                )?),
            },
            pagination: PaginationProfile::portal_default()?,
            field_timeout: Duration::ZERO,
            card_timeout: Duration::from_secs(5),
        })
    }

    /// Public company search results.
    pub fn companies() -> ScrapeResult<Self> {
        Ok(Self {
            kind: ListingKind::Companies,
            base_url: "https://www.104.com.tw/".to_string(),
            schema: strings(&[
                fields::NAME,
                fields::TAGS,
                fields::LOCATION,
                fields::INDUSTRY,
                fields::CAPITAL,
                fields::EMPLOYEE_COUNT,
                fields::REVIEW,
                fields::DESCRIPTION,
                fields::COMPANY_URL,
                fields::PAGE_NUMBER,
            ]),
            cards: LocatorList::from_css(
                "company cards",
                &[".company-list__info", ".company-item", "div[class*=\"company-list\"]"],
            )?,
            fields: vec![
                FieldRule::text(fields::NAME, company_name_locators()?),
                FieldRule::link(fields::COMPANY_URL, company_name_locators()?),
                FieldRule::joined(
                    fields::TAGS,
                    LocatorList::from_css(
                        "company badges",
                        &["span.badge", "span.rounded-pill", ".company-list__tags span"],
                    )?,
                    &["查看", "關注", "評論"],
                ),
                FieldRule::Tagged {
                    locators: LocatorList::from_css(
                        "company info tags",
                        &[".company-list__infoTags span", "p.mb-0.text-truncate, p.text-truncate"],
                    )?,
                    classes: vec![
                        TagClass::new(fields::LOCATION, "市|縣|區")?,
                        TagClass::new(fields::INDUSTRY, "業")?.excluding("公司")?,
                        TagClass::new(fields::CAPITAL, "資本額")?,
                        TagClass::new(fields::EMPLOYEE_COUNT, "員工數")?,
                        TagClass::new(fields::REVIEW, "公司評論")?.extracting(r"(?P<v>\S+)\s*$")?,
                    ],
                },
                FieldRule::text(
                    fields::DESCRIPTION,
                    LocatorList::from_css(
                        "company description",
                        &[".company-list__description", "p.mb-6.body-3.text-truncate-2, p.text-truncate-2"],
                    )?,
                ),
            ],
            segmentation: None,
            text_patterns: vec![
                PatternField::new(
                    fields::LOCATION,
                    &["(?:台|臺|新|桃|苗|彰|雲|嘉|高|屏|宜|花|南|澎|金|連)[^,，、\\n]{1,10}?(?:市|縣|區)"],
                )?,
                PatternField::new(
                    fields::INDUSTRY,
                    &["[^\\s,，、]{2,10}?(?:製造|服務|銷售|科技|資訊|電子|金融|保險|營造|貿易|百貨|餐飲|物流|運輸|航空|教育|顧問|設計|傳播|媒體|娛樂|零售|批發|醫療|生技|農業|木業)"],
                )?,
            ],
            photo: None,
            required: vec![fields::NAME.to_string()],
            dedupe_on: strings(&[fields::NAME]),
            requires_session: false,
            search: SearchEntry::UrlTemplate(
                "https://www.104.com.tw/company/search/?keyword={keyword}".to_string(),
            ),
            no_results: NoResultMarkers {
                texts: strings(&["查無符合條件的公司", "沒有找到相關公司", "查無資料"]),
                locators: Some(LocatorList::from_css(
                    "no-result notice",
                    &[".no-result", ".empty-result", ".search-no-result"],
                )?),
            },
            pagination: PaginationProfile::portal_default()?,
            field_timeout: Duration::ZERO,
            card_timeout: Duration::from_secs(5),
        })
    }

    /// Identity of a record for de-duplication, or `None` when the profile
    /// has no key or the record lacks part of it.
    #[must_use]
    pub fn dedupe_key(&self, record: &ExtractedRecord) -> Option<String> {
        if self.dedupe_on.is_empty() {
            return None;
        }
        let parts = self
            .dedupe_on
            .iter()
            .map(|field| record.get(field))
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("\u{1f}"))
    }

    /// Same profile with every wait set to zero, for driving fakes.
    #[must_use]
    pub fn without_waits(mut self) -> Self {
        self.field_timeout = Duration::ZERO;
        self.card_timeout = Duration::ZERO;
        self.pagination = self.pagination.without_waits();
        self
    }
}

fn company_name_locators() -> ScrapeResult<LocatorList> {
    LocatorList::new(
        "company name link",
        vec![
            Locator::css(".company-name-link a"),
            Locator::css("a.company-name-link--pc"),
            Locator::css("a.company-name-link--mobile"),
            Locator::css("h2 a, h3 a, a.n-link"),
            Locator::css("a[data-gtm-cmps=\"瀏覽公司\"]"),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_profiles_build() {
        for kind in [ListingKind::Resumes, ListingKind::Jobs, ListingKind::Companies] {
            let profile = kind.profile().unwrap();
            assert_eq!(profile.kind, kind);
            assert_eq!(profile.schema.last().map(String::as_str), Some(fields::PAGE_NUMBER));
        }
    }

    #[test]
    fn company_info_tags_classify() {
        let profile = ListingProfile::companies().unwrap();
        let classes = profile
            .fields
            .iter()
            .find_map(|r| match r {
                FieldRule::Tagged { classes, .. } => Some(classes),
                _ => None,
            })
            .unwrap();
        let classify = |tag: &str| {
            classes
                .iter()
                .find_map(|c| c.classify(tag).map(|v| (c.field.clone(), v)))
        };

        assert_eq!(classify("台北市內湖區"), Some((fields::LOCATION.into(), "台北市內湖區".into())));
        assert_eq!(classify("電腦系統整合服務業"), Some((fields::INDUSTRY.into(), "電腦系統整合服務業".into())));
        assert_eq!(classify("資本額 5億元"), Some((fields::CAPITAL.into(), "資本額 5億元".into())));
        assert_eq!(classify("公司評論 4.2"), Some((fields::REVIEW.into(), "4.2".into())));
        assert_eq!(classify("新鮮人請進"), None);
    }

    #[test]
    fn resume_identity_is_code_and_name() {
        let profile = ListingProfile::resumes().unwrap();
        let mut record = ExtractedRecord::with_schema(profile.schema.iter().map(String::as_str));
        record.set(fields::NAME, Some("王小明".into()));
        assert_eq!(profile.dedupe_key(&record), None);

        record.set(fields::CODE, Some("A12345".into()));
        let same_name = {
            let mut other = record.clone();
            other.set(fields::CODE, Some("B67890".into()));
            other
        };
        assert!(profile.dedupe_key(&record).is_some());
        assert_ne!(profile.dedupe_key(&record), profile.dedupe_key(&same_name));
    }

    #[test]
    fn photo_rule_requires_a_marker() {
        let profile = ListingProfile::resumes().unwrap();
        let photo = profile.photo.unwrap();
        assert!(photo.accepts("https://static.104.com.tw/webHeadShot/abc.jpg"));
        assert!(!photo.accepts("https://static.104.com.tw/logo.png"));
    }
}
