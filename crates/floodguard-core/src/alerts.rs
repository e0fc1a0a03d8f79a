//! Disaster alert pipeline: near-duplicate headline merging, CAP record
//! collection and proximity ordering.

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::models::{AlertRecord, Coordinate, Headline};
use crate::providers::AlertFeed;
use crate::report::{IngestReport, SkipReason};
use crate::similarity::token_set_ratio;
use crate::spatial::distance_or_inf;

/// Similarity at or above which two headlines count as the same alert.
pub const DUPLICATE_THRESHOLD: f64 = 80.0;

/// True when every character of `text` is 7-bit ASCII.
pub fn is_plain_ascii(text: &str) -> bool {
    text.is_ascii()
}

/// Drop non-ASCII and near-duplicate headlines, keeping first-seen order.
pub fn dedupe(headlines: Vec<Headline>) -> Vec<Headline> {
    dedupe_with_report(headlines, DUPLICATE_THRESHOLD).0
}

/// Like [`dedupe`], with an explicit threshold and a report of dropped titles.
pub fn dedupe_with_report(
    headlines: Vec<Headline>,
    threshold: f64,
) -> (Vec<Headline>, IngestReport) {
    let mut kept: Vec<Headline> = Vec::new();
    let mut report = IngestReport::new();

    for (index, headline) in headlines.into_iter().enumerate() {
        if !is_plain_ascii(&headline.title) {
            report.skip(index, Some(&headline.title), SkipReason::NonAscii);
            continue;
        }

        let duplicate = kept.iter().find_map(|existing| {
            let score = token_set_ratio(&headline.title, &existing.title);
            (score >= threshold).then(|| (existing.title.clone(), score))
        });

        match duplicate {
            Some((of, score)) => report.skip(
                index,
                Some(&headline.title),
                SkipReason::Duplicate {
                    of,
                    score: score.round().clamp(0.0, 100.0) as u8,
                },
            ),
            None => {
                report.accept();
                kept.push(headline);
            }
        }
    }

    (kept, report)
}

/// Stable sort by great-circle distance from `target`. Alerts without a
/// usable coordinate go last in their original order.
pub fn sort_by_proximity(mut alerts: Vec<AlertRecord>, target: Coordinate) -> Vec<AlertRecord> {
    let key = |alert: &AlertRecord| {
        alert
            .first_coord
            .map_or(f64::INFINITY, |coord| distance_or_inf(coord, target))
    };
    alerts.sort_by(|a, b| key(a).total_cmp(&key(b)));
    alerts
}

/// First `lat,lon` pair of a CAP polygon (space-separated pairs).
pub fn extract_first_coordinate(polygon: &str) -> Option<Coordinate> {
    let first = polygon.split_whitespace().next()?;
    let mut parts = first.split(',');
    let lat = parts.next()?.trim().parse::<f64>().ok()?;
    let lon = parts.next()?.trim().parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Coordinate::checked(lat, lon).ok()
}

/// Alert as presented to callers: no location scratch data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicAlert {
    pub title: String,
    pub link: String,
    pub event: String,
    pub timestamp: String,
    pub areas: String,
}

impl From<AlertRecord> for PublicAlert {
    fn from(record: AlertRecord) -> Self {
        Self {
            title: record.title,
            link: record.link,
            event: record.event,
            timestamp: record.timestamp,
            areas: record.areas,
        }
    }
}

/// Alerts ordered for `target`, stripped for presentation.
pub fn nearby_alerts(alerts: Vec<AlertRecord>, target: Coordinate) -> Vec<PublicAlert> {
    sort_by_proximity(alerts, target)
        .into_iter()
        .map(PublicAlert::from)
        .collect()
}

/// Records produced by one collection cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertBatch {
    pub alerts: Vec<AlertRecord>,
    pub report: IngestReport,
}

/// Pulls headlines from a feed, merges near-duplicates and resolves each
/// survivor to a CAP record.
pub struct AlertCollector<'a> {
    feed: &'a dyn AlertFeed,
    threshold: f64,
}

impl<'a> AlertCollector<'a> {
    pub fn new(feed: &'a dyn AlertFeed) -> Self {
        Self {
            feed,
            threshold: DUPLICATE_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Run one cycle. Only a failure to read the headline list is an error;
    /// individual CAP failures are skipped and reported.
    pub fn collect(&self) -> Result<AlertBatch, ProviderError> {
        let headlines = self.feed.headlines()?;
        let total = headlines.len();

        let (kept, dedupe_report) = dedupe_with_report(headlines, self.threshold);

        // Feed positions of the kept headlines, for reporting.
        let survivors: Vec<usize> = (0..total)
            .filter(|index| !dedupe_report.skipped.iter().any(|s| s.index == *index))
            .collect();

        let mut report = IngestReport::new();
        report.skipped = dedupe_report.skipped;

        let mut alerts = Vec::with_capacity(kept.len());
        for (headline, index) in kept.into_iter().zip(survivors) {
            match self.feed.cap_alert(&headline.link) {
                Ok(Some(cap)) => {
                    report.accept();
                    alerts.push(AlertRecord::from_cap(headline.link, cap));
                }
                Ok(None) => report.skip(index, Some(&headline.title), SkipReason::NoInfoBlock),
                Err(err) => {
                    tracing::warn!(
                        link = %headline.link,
                        error = %err,
                        "failed to fetch CAP alert"
                    );
                    report.skip(
                        index,
                        Some(&headline.title),
                        SkipReason::FetchFailed(err.to_string()),
                    );
                }
            }
        }
        report.skipped.sort_by_key(|s| s.index);

        tracing::info!(
            headlines = total,
            collected = alerts.len(),
            skipped = report.skipped.len(),
            "collected disaster alerts"
        );
        Ok(AlertBatch { alerts, report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CapAlert;
    use std::collections::HashMap;

    fn record(title: &str, coord: Option<(f64, f64)>) -> AlertRecord {
        AlertRecord {
            title: title.to_string(),
            link: format!("https://example.org/{title}"),
            event: "Flood".to_string(),
            timestamp: String::new(),
            areas: String::new(),
            first_coord: coord.map(|(lat, lon)| Coordinate::new(lat, lon)),
        }
    }

    #[test]
    fn dedupe_merges_case_and_punctuation_variants() {
        let headlines = vec![
            Headline::new("Flood warning for Assam", "a"),
            Headline::new("flood warning for assam!!", "b"),
            Headline::new("Cyclone alert for Odisha coast", "c"),
        ];
        let kept = dedupe(headlines);
        let titles: Vec<_> = kept.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, ["Flood warning for Assam", "Cyclone alert for Odisha coast"]);
        assert_eq!(kept[0].link, "a");
    }

    #[test]
    fn duplicate_threshold_is_inclusive() {
        let pair = || {
            vec![
                Headline::new("Flood warning for Assam", "a"),
                Headline::new("flood warning for assam!!", "b"),
            ]
        };
        assert_eq!(
            token_set_ratio("Flood warning for Assam", "flood warning for assam!!"),
            87.5
        );

        let (kept, report) = dedupe_with_report(pair(), 87.5);
        assert_eq!(kept.len(), 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::Duplicate { score: 88, .. }
        ));

        let (kept, report) = dedupe_with_report(pair(), 87.6);
        assert_eq!(kept.len(), 2);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn dedupe_drops_non_ascii_titles() {
        let headlines = vec![
            Headline::new("बाढ़ की चेतावनी", "hi"),
            Headline::new("Heavy rain in Kerala", "en"),
        ];
        let (kept, report) = dedupe_with_report(headlines, DUPLICATE_THRESHOLD);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].link, "en");
        assert_eq!(report.skipped[0].index, 0);
        assert_eq!(report.skipped[0].reason, SkipReason::NonAscii);
    }

    #[test]
    fn dedupe_reports_duplicate_source() {
        let headlines = vec![
            Headline::new("Flood warning for Assam", "a"),
            Headline::new("Flood warning for Assam", "b"),
        ];
        let (kept, report) = dedupe_with_report(headlines, DUPLICATE_THRESHOLD);
        assert_eq!(kept.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::Duplicate {
                of: "Flood warning for Assam".into(),
                score: 100
            }
        );
    }

    #[test]
    fn proximity_sort_puts_unknown_last() {
        let alerts = vec![
            record("unknown", None),
            record("far", Some((10.0, 10.0))),
            record("near", Some((0.0, 0.0))),
            record("broken", Some((f64::NAN, 0.0))),
        ];
        let sorted = sort_by_proximity(alerts, Coordinate::new(0.0, 0.0));
        let titles: Vec<_> = sorted.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["near", "far", "unknown", "broken"]);
    }

    #[test]
    fn proximity_sort_is_stable_for_ties() {
        let alerts = vec![
            record("first", Some((1.0, 1.0))),
            record("second", Some((1.0, 1.0))),
        ];
        let sorted = sort_by_proximity(alerts, Coordinate::new(0.0, 0.0));
        assert_eq!(sorted[0].title, "first");
        assert_eq!(sorted[1].title, "second");
    }

    #[test]
    fn public_alert_omits_coordinates() {
        let view = nearby_alerts(vec![record("x", Some((1.0, 2.0)))], Coordinate::new(0.0, 0.0));
        let value = serde_json::to_value(&view[0]).unwrap();
        assert!(value.get("first_coord").is_none());
        assert_eq!(value["title"], "x");
    }

    #[test]
    fn first_coordinate_parsing() {
        assert_eq!(
            extract_first_coordinate(" 26.1,89.9 26.2,90.0"),
            Some(Coordinate::new(26.1, 89.9))
        );
        assert_eq!(extract_first_coordinate(""), None);
        assert_eq!(extract_first_coordinate("26.1;89.9"), None);
        assert_eq!(extract_first_coordinate("26.1,89.9,3"), None);
        assert_eq!(extract_first_coordinate("abc,def"), None);
    }

    struct FakeFeed {
        headlines: Vec<Headline>,
        docs: HashMap<String, Option<CapAlert>>,
    }

    impl AlertFeed for FakeFeed {
        fn headlines(&self) -> Result<Vec<Headline>, ProviderError> {
            Ok(self.headlines.clone())
        }

        fn cap_alert(&self, link: &str) -> Result<Option<CapAlert>, ProviderError> {
            self.docs
                .get(link)
                .cloned()
                .ok_or_else(|| ProviderError::unavailable("feed", "connection reset"))
        }
    }

    #[test]
    fn collector_keeps_each_headline_link_and_skips_failures() {
        let cap = |headline: &str| CapAlert {
            event: "Flood".into(),
            headline: headline.into(),
            area_desc: "Dhubri".into(),
            polygon: Some("26.1,89.9 26.2,90.0".into()),
            sent: Some("2024-06-01T10:00:00+05:30".into()),
        };
        let feed = FakeFeed {
            headlines: vec![
                Headline::new("Flood warning for Assam", "l1"),
                Headline::new("flood warning for assam!!", "l2"),
                Headline::new("Landslide risk in Sikkim", "l3"),
                Headline::new("Thunderstorm over Bihar", "l4"),
                Headline::new("Cold wave in Punjab", "l5"),
            ],
            docs: HashMap::from([
                ("l1".to_string(), Some(cap("Flood warning for Assam"))),
                ("l3".to_string(), None),
                ("l5".to_string(), Some(cap("Cold wave in Punjab"))),
            ]),
        };

        let batch = AlertCollector::new(&feed).collect().unwrap();
        let links: Vec<_> = batch.alerts.iter().map(|a| a.link.as_str()).collect();
        assert_eq!(links, ["l1", "l5"]);
        assert_eq!(batch.report.accepted, 2);

        let skipped: Vec<_> = batch
            .report
            .skipped
            .iter()
            .map(|s| (s.index, s.reason.clone()))
            .collect();
        assert_eq!(skipped.len(), 3);
        assert_eq!(skipped[0].0, 1);
        assert!(matches!(skipped[0].1, SkipReason::Duplicate { .. }));
        assert_eq!(skipped[1], (2, SkipReason::NoInfoBlock));
        assert_eq!(skipped[2].0, 3);
        assert!(matches!(skipped[2].1, SkipReason::FetchFailed(_)));
    }
}
