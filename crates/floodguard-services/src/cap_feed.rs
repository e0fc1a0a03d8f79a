//! Disaster alert feed: an RSS headline list whose items link to CAP 1.2
//! alert documents.

use floodguard_core::{AlertFeed, CapAlert, Headline, ProviderError};
use quick_xml::de::from_str;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::ServiceConfig;
use crate::http::{build_client, read_body, request_error};

const SERVICE: &str = "alert-feed";

#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CapDocument {
    #[serde(alias = "cap:sent")]
    sent: Option<String>,
    #[serde(rename = "info", alias = "cap:info", default)]
    info: Vec<CapInfo>,
}

#[derive(Debug, Deserialize)]
struct CapInfo {
    #[serde(alias = "cap:event")]
    event: Option<String>,
    #[serde(alias = "cap:headline")]
    headline: Option<String>,
    #[serde(rename = "area", alias = "cap:area", default)]
    areas: Vec<CapArea>,
}

#[derive(Debug, Deserialize)]
struct CapArea {
    #[serde(rename = "areaDesc", alias = "cap:areaDesc")]
    area_desc: Option<String>,
    #[serde(rename = "polygon", alias = "cap:polygon", default)]
    polygons: Vec<String>,
}

fn clean(text: Option<String>) -> Option<String> {
    text.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Feed items with both a title and a link, in feed order.
pub fn parse_rss(xml: &str) -> Result<Vec<Headline>, ProviderError> {
    let doc: RssDocument = from_str(xml).map_err(|err| ProviderError::malformed(SERVICE, err))?;
    Ok(doc
        .channel
        .items
        .into_iter()
        .filter_map(|item| Some(Headline::new(clean(item.title)?, clean(item.link)?)))
        .collect())
}

/// Fields of the first `info` block of a CAP document, or `None` when the
/// document has no `info` block.
pub fn parse_cap(xml: &str) -> Result<Option<CapAlert>, ProviderError> {
    let doc: CapDocument = from_str(xml).map_err(|err| ProviderError::malformed(SERVICE, err))?;
    let sent = clean(doc.sent);
    let Some(info) = doc.info.into_iter().next() else {
        return Ok(None);
    };
    let area = info.areas.into_iter().next();
    let (area_desc, polygon) = match area {
        Some(area) => (
            clean(area.area_desc).unwrap_or_default(),
            area.polygons.into_iter().find_map(|p| clean(Some(p))),
        ),
        None => (String::new(), None),
    };
    Ok(Some(CapAlert {
        event: clean(info.event).unwrap_or_default(),
        headline: clean(info.headline).unwrap_or_default(),
        area_desc,
        polygon,
        sent,
    }))
}

pub struct CapFeed {
    client: Client,
    feed_url: String,
}

impl CapFeed {
    pub fn new(config: &ServiceConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(config.timeouts.feed)?,
            feed_url: config.feed_url.trim().to_string(),
        })
    }

    fn get_text(&self, url: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| request_error(SERVICE, err))?;
        read_body(SERVICE, response)
    }
}

impl AlertFeed for CapFeed {
    fn headlines(&self) -> Result<Vec<Headline>, ProviderError> {
        let headlines = parse_rss(&self.get_text(&self.feed_url)?)?;
        tracing::debug!(count = headlines.len(), "fetched feed headlines");
        Ok(headlines)
    }

    fn cap_alert(&self, link: &str) -> Result<Option<CapAlert>, ProviderError> {
        parse_cap(&self.get_text(link)?)
    }
}
