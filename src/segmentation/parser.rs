//! Anchor-framed segmentation of flattened card text

use tracing::debug;

use super::anchors::{AnchorHit, AnchorTable};
use super::sanitize::sanitize;
use crate::record::ExtractedRecord;
use crate::utils::collapse_whitespace;

/// Recover the table's fields from one flattened text blob.
///
/// Pure function: no I/O, never fails. Every field the table knows about is
/// present in the result, `None` when it could not be framed.
///
/// Framing rules:
/// - each anchor is located by its first occurrence;
/// - a segment runs from its anchor's value start to the start of the NEXT
///   rule's anchor, and is `None` if either anchor is missing or the next
///   anchor occurs before this one's value start;
/// - the last segment runs to the first action keyword after its start, or to
///   the end of the text;
/// - pattern fields are searched over the whole text independently.
///
/// Values are trimmed and then sanitized.
#[must_use]
pub fn segment(text: &str, table: &AnchorTable) -> ExtractedRecord {
    let text = collapse_whitespace(text);
    let mut record = ExtractedRecord::with_schema(table.field_names());

    let segments = table.segments();
    let hits: Vec<Option<AnchorHit>> = segments.iter().map(|s| s.anchor.locate(&text)).collect();

    for (i, rule) in segments.iter().enumerate() {
        let Some(hit) = hits[i] else {
            debug!("anchor for {} not found", rule.field);
            continue;
        };

        let end = if i + 1 < segments.len() {
            match hits[i + 1] {
                Some(next) if next.start >= hit.value_start => Some(next.start),
                Some(_) => {
                    debug!(
                        "anchor after {} precedes it, leaving field empty of value",
                        rule.field
                    );
                    None
                }
                None => None,
            }
        } else {
            Some(first_action_keyword(&text, hit.value_start, table.action_keywords()))
        };

        if let Some(end) = end {
            record.set(&rule.field, Some(sanitize(text[hit.value_start..end].trim())));
        }
    }

    for pattern in table.patterns() {
        record.set(&pattern.field, pattern.find(&text).map(|v| sanitize(v.trim())));
    }

    record
}

/// Byte offset of the earliest action keyword at or after `from`, or the end
/// of the text.
fn first_action_keyword(text: &str, from: usize, keywords: &[String]) -> usize {
    let tail = &text[from..];
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .filter_map(|k| tail.find(k.as_str()))
        .min()
        .map_or(text.len(), |offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fields;

    const CARD: &str = "王小明 男 28歲 代碼：A12345 更新日期 2024/05/01 \
        希望工作地:台北市 居住地:新北市 大學 資訊工程學系 希望職稱:工程師3年工作經驗 \
        台積電 軟體工程師 2021~2024 邀請 儲存 轉寄";

    #[test]
    fn canonical_order_recovers_every_field() {
        let record = segment(CARD, &AnchorTable::resume());

        assert_eq!(record.get(fields::WORK_LOCATION), Some("台北市"));
        assert_eq!(record.get(fields::LIVING_LOCATION), Some("新北市"));
        assert_eq!(record.get(fields::EDUCATION), Some("大學 資訊工程學系"));
        assert_eq!(record.get(fields::DESIRED_JOB), Some("工程師"));
        assert_eq!(
            record.get(fields::WORK_HISTORY),
            Some("台積電 軟體工程師 2021~2024")
        );
        assert_eq!(record.get(fields::AGE), Some("28"));
        assert_eq!(record.get(fields::GENDER), Some("男"));
        assert_eq!(record.get(fields::CODE), Some("A12345"));
        assert_eq!(record.get(fields::UPDATE_DATE), Some("2024/05/01"));
        assert_eq!(record.get(fields::EXPERIENCE_DURATION), Some("3年"));
    }

    #[test]
    fn history_without_action_keywords_runs_to_end() {
        let text = "希望工作地:台北市 居住地:新北市 碩士 希望職稱:設計師5年以上工作經驗 自由接案";
        let record = segment(text, &AnchorTable::resume());
        assert_eq!(record.get(fields::WORK_HISTORY), Some("自由接案"));
        assert_eq!(record.get(fields::EXPERIENCE_DURATION), Some("5年以上"));
    }

    #[test]
    fn missing_anchor_nulls_the_fields_it_bounds() {
        let text = "希望工作地:台北市 新北市 大學 希望職稱:工程師3年工作經驗";
        let record = segment(text, &AnchorTable::resume());

        assert!(record.has_field(fields::LIVING_LOCATION));
        assert_eq!(record.get(fields::LIVING_LOCATION), None);
        assert_eq!(record.get(fields::WORK_LOCATION), None);
        assert_eq!(record.get(fields::EDUCATION), Some("大學"));
    }

    #[test]
    fn reversed_anchors_yield_none_not_wrapped_text() {
        let text = "居住地:新北市 希望工作地:台北市 大學 希望職稱:工程師3年工作經驗";
        let record = segment(text, &AnchorTable::resume());

        assert_eq!(record.get(fields::WORK_LOCATION), None);
        // 居住地 is found first, so its own frame up to the education keyword
        // still spans the (misplaced) 希望工作地 label.
        assert_eq!(record.get(fields::LIVING_LOCATION), Some("新北市 希望工作地:台北市"));
    }

    #[test]
    fn adjacent_anchors_give_found_but_empty() {
        let text = "希望工作地:居住地:新北市 大學 希望職稱:工程師3年工作經驗";
        let record = segment(text, &AnchorTable::resume());
        assert_eq!(record.get(fields::WORK_LOCATION), Some(""));
    }

    #[test]
    fn first_occurrence_is_authoritative() {
        let text = "希望工作地:台北市 居住地:新北市 居住地:桃園市 大學 希望職稱:工程師3年工作經驗";
        let record = segment(text, &AnchorTable::resume());
        assert_eq!(record.get(fields::WORK_LOCATION), Some("台北市"));
        assert_eq!(record.get(fields::LIVING_LOCATION), Some("新北市 居住地:桃園市"));
    }

    #[test]
    fn empty_text_yields_all_none() {
        let table = AnchorTable::resume();
        let record = segment("", &table);
        assert_eq!(record.len(), table.field_names().count());
        assert!(record.iter().all(|(_, v)| v.is_none()));
    }
}
