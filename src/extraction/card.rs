//! Field extraction from one listing card

use tracing::debug;

use super::listing_profile::{FieldRule, ListingProfile};
use crate::driver::PageDriver;
use crate::error::{ScrapeError, ScrapeResult};
use crate::locator::{resolve_all, resolve_first, resolve_text};
use crate::record::{ExtractedRecord, fields};
use crate::segmentation::{sanitize, sanitize_opt, segment};
use crate::utils::absolutize;

/// Read every configured field from `card`.
///
/// A field that cannot be read is `None`; only a missing required field
/// fails the record.
pub async fn extract_card<D: PageDriver>(
    driver: &D,
    card: &D::Element,
    profile: &ListingProfile,
    page: u32,
) -> ScrapeResult<ExtractedRecord> {
    let mut record = ExtractedRecord::with_schema(profile.schema.iter().map(String::as_str));
    let timeout = profile.field_timeout;

    for rule in &profile.fields {
        match rule {
            FieldRule::Text { field, locators } => {
                let text = resolve_text(driver, Some(card), locators, timeout).await;
                record.set_if_missing(field, sanitize_opt(text.as_deref()));
            }
            FieldRule::Attribute {
                field,
                locators,
                attribute,
                absolutize: resolve_against_base,
            } => {
                let Some(element) = resolve_first(driver, Some(card), locators, timeout).await.into_first() else {
                    continue;
                };
                let value = driver.attribute_of(&element, attribute).await.ok().flatten();
                let value = if *resolve_against_base {
                    value.and_then(|v| absolutize(&profile.base_url, &v))
                } else {
                    value
                };
                record.set_if_missing(field, sanitize_opt(value.as_deref()));
            }
            FieldRule::Joined {
                field,
                locators,
                separator,
                exclude,
            } => {
                let mut parts = Vec::new();
                for element in resolve_all(driver, Some(card), locators, timeout).await.into_all() {
                    let Some(text) = driver.text_of(&element).await.ok().flatten() else {
                        continue;
                    };
                    let text = text.trim();
                    if text.is_empty() || exclude.iter().any(|x| text.contains(x.as_str())) {
                        continue;
                    }
                    parts.push(text.to_string());
                }
                if !parts.is_empty() {
                    record.set_if_missing(field, Some(sanitize(&parts.join(separator))));
                }
            }
            FieldRule::Tagged { locators, classes } => {
                for element in resolve_all(driver, Some(card), locators, timeout).await.into_all() {
                    let Some(text) = driver.text_of(&element).await.ok().flatten() else {
                        continue;
                    };
                    let tag = text.trim();
                    for class in classes {
                        if record.get(&class.field).is_some() {
                            continue;
                        }
                        if let Some(value) = class.classify(tag) {
                            record.set(&class.field, Some(sanitize(&value)));
                            break;
                        }
                    }
                }
            }
        }
    }

    if profile.segmentation.is_some() || !profile.text_patterns.is_empty() {
        let text = driver.text_of(card).await.ok().flatten().unwrap_or_default();
        if let Some(table) = &profile.segmentation {
            record.merge_missing(segment(&text, table));
        }
        for pattern in &profile.text_patterns {
            if record.get(&pattern.field).is_none() {
                record.set(&pattern.field, sanitize_opt(pattern.find(&text)));
            }
        }
    }

    if let Some(photo) = &profile.photo {
        for element in resolve_all(driver, Some(card), &photo.locators, timeout).await.into_all() {
            let Some(src) = driver.attribute_of(&element, "src").await.ok().flatten() else {
                continue;
            };
            if photo.accepts(&src)
                && let Some(url) = absolutize(&profile.base_url, &src)
            {
                record.set(fields::PHOTO_URL, Some(url));
                break;
            }
        }
    }

    record.set(fields::PAGE_NUMBER, Some(page.to_string()));

    if let Some(missing) = profile.required.iter().find(|f| record.get(f).is_none()) {
        debug!("Card on page {page} lacks required field {missing}");
        return Err(ScrapeError::structural(format!("required field {missing}")));
    }
    Ok(record)
}
