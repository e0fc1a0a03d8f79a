//! Feed documents through dedup, CAP resolution, storage and proximity ordering.

use std::collections::HashMap;

use floodguard_core::{
    nearby_alerts, AlertCollector, AlertFeed, CapAlert, Coordinate, Headline, ProviderError,
    SkipReason,
};
use floodguard_services::cap_feed::{parse_cap, parse_rss};
use floodguard_services::AlertStore;

/// Serves canned XML instead of fetching it.
struct CannedFeed {
    rss: String,
    documents: HashMap<String, String>,
}

impl AlertFeed for CannedFeed {
    fn headlines(&self) -> Result<Vec<Headline>, ProviderError> {
        parse_rss(&self.rss)
    }

    fn cap_alert(&self, link: &str) -> Result<Option<CapAlert>, ProviderError> {
        match self.documents.get(link) {
            Some(xml) => parse_cap(xml),
            None => Err(ProviderError::Status {
                service: "alert-feed",
                status: 404,
            }),
        }
    }
}

fn item(title: &str, link: &str) -> String {
    format!("<item><title>{title}</title><link>{link}</link></item>")
}

fn cap(event: &str, headline: &str, polygon: &str) -> String {
    format!(
        r#"<alert xmlns="urn:oasis:names:tc:emergency:cap:1.2">
  <sent>2024-06-01T10:00:00+05:30</sent>
  <info>
    <event>{event}</event>
    <headline>{headline}</headline>
    <area><areaDesc>District</areaDesc><polygon>{polygon}</polygon></area>
  </info>
</alert>"#
    )
}

fn feed() -> CannedFeed {
    let items = [
        item("Flood warning for Assam", "https://feed.test/a.xml"),
        item("flood warning for assam!!", "https://feed.test/a-dup.xml"),
        item("बाढ़ की चेतावनी", "https://feed.test/hindi.xml"),
        item("Cyclone alert for Odisha coast", "https://feed.test/b.xml"),
        item("Landslide risk in Sikkim hills", "https://feed.test/missing.xml"),
        item("Heat wave over Rajasthan desert", "https://feed.test/c.xml"),
    ]
    .concat();
    let rss = format!("<rss version=\"2.0\"><channel><title>t</title>{items}</channel></rss>");

    let documents = HashMap::from([
        (
            "https://feed.test/a.xml".to_string(),
            cap("Flood", "Flood warning for Assam", "26.1,91.7 26.2,91.8 26.1,91.9"),
        ),
        (
            "https://feed.test/b.xml".to_string(),
            cap("Cyclone", "Cyclone alert for Odisha coast", "20.0,86.0 20.5,86.5 20.0,87.0"),
        ),
        (
            "https://feed.test/c.xml".to_string(),
            cap("Heat Wave", "Heat wave over Rajasthan desert", "not a polygon"),
        ),
    ]);
    CannedFeed { rss, documents }
}

#[test]
fn refresh_stores_deduplicated_alerts_nearest_first() {
    let batch = AlertCollector::new(&feed()).collect().unwrap();

    let titles: Vec<&str> = batch.alerts.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Flood warning for Assam",
            "Cyclone alert for Odisha coast",
            "Heat wave over Rajasthan desert",
        ]
    );
    assert_eq!(batch.report.accepted, 3);

    let reasons: Vec<(usize, &SkipReason)> = batch
        .report
        .skipped
        .iter()
        .map(|s| (s.index, &s.reason))
        .collect();
    assert_eq!(reasons.len(), 3);
    assert!(matches!(
        reasons[0],
        (1, SkipReason::Duplicate { of, .. }) if of == "Flood warning for Assam"
    ));
    assert!(matches!(reasons[1], (2, SkipReason::NonAscii)));
    assert!(matches!(reasons[2], (4, SkipReason::FetchFailed(_))));

    let dir = tempfile::tempdir().unwrap();
    let store = AlertStore::new(dir.path().join("disaster_alerts.json"));
    store.save(&batch.alerts).unwrap();
    let stored = store.load().unwrap();

    let near_odisha = nearby_alerts(stored, Coordinate::new(20.3, 85.8));
    let ordered: Vec<&str> = near_odisha.iter().map(|a| a.event.as_str()).collect();
    assert_eq!(ordered, vec!["Cyclone", "Flood", "Heat Wave"]);
}
