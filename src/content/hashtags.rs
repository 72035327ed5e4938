//! Hashtag derivation.

use std::collections::BTreeSet;

use chrono::{DateTime, Local, Timelike};

use crate::persona::ContentIdea;

/// Title-case every word and drop anything that is not alphanumeric.
///
/// A letter is upper-cased when it does not follow another letter, and
/// lower-cased otherwise ("k-pop fans" becomes "KPopFans").
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            if c.is_alphanumeric() {
                out.push(c);
            }
            prev_alpha = false;
        }
    }
    out
}

/// Hashtags for a post about `idea` made in `location` at `at`.
///
/// The result is deduplicated and carries no meaningful order.
pub fn derive_hashtags(
    idea: &ContentIdea,
    location: &str,
    at: DateTime<Local>,
) -> BTreeSet<String> {
    let city = clean_text(location.split(',').next().unwrap_or_default().trim());
    let region = clean_text(location.rsplit(',').next().unwrap_or_default().trim());
    let half = if at.hour() < 12 { "am" } else { "pm" };

    let mut tags = BTreeSet::new();
    let mut add = |body: String| {
        if !body.is_empty() {
            tags.insert(format!("#{}", body));
        }
    };

    if !city.is_empty() {
        add(format!("{}Life", city));
        add(format!("{}{}", half, city));
    }
    if !region.is_empty() {
        add(format!("{}Life", region));
    }
    for field in [&idea.topic, &idea.format, &idea.mood, &idea.context] {
        add(clean_text(field));
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn idea() -> ContentIdea {
        ContentIdea {
            topic: "street food tips".into(),
            format: "Photo stories".into(),
            mood: "excited".into(),
            context: "Lunch break".into(),
        }
    }

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, hour, 15, 0).single().unwrap()
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("street food tips"), "StreetFoodTips");
        assert_eq!(clean_text("K-pop fans!"), "KPopFans");
        assert_eq!(clean_text("3d art"), "3DArt");
        assert_eq!(clean_text("  !!  "), "");
    }

    #[test]
    fn test_derive_hashtags() {
        let tags = derive_hashtags(&idea(), "Mumbai, India", at(9));
        let expected: BTreeSet<String> = [
            "#MumbaiLife",
            "#IndiaLife",
            "#StreetFoodTips",
            "#PhotoStories",
            "#Excited",
            "#LunchBreak",
            "#amMumbai",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(tags, expected);
    }

    #[test]
    fn test_pm_token() {
        let tags = derive_hashtags(&idea(), "Seoul, South Korea", at(18));
        assert!(tags.contains("#pmSeoul"));
        assert!(tags.contains("#SouthKoreaLife"));
    }

    #[test]
    fn test_idempotent_and_deduplicated() {
        let mut dup = idea();
        dup.mood = "lunch break".into();
        let first = derive_hashtags(&dup, "Pune, India", at(13));
        let second = derive_hashtags(&dup, "Pune, India", at(13));
        assert_eq!(first, second);
        assert_eq!(first.iter().filter(|t| *t == "#LunchBreak").count(), 1);
        assert_eq!(first.len(), 6);
    }

    #[test]
    fn test_empty_parts_dropped() {
        let mut blank = idea();
        blank.format = "---".into();
        let tags = derive_hashtags(&blank, "", at(1));
        assert!(!tags.contains("#"));
        assert!(!tags.iter().any(|t| t.ends_with("Life")));
    }
}
