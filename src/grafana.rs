//! Deep-link construction for the Grafana UI and the alerting system's
//! silence page.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use thiserror::Error;
use url::Url;

const IMAGE_WIDTH: &str = "999";
const IMAGE_HEIGHT: &str = "333";

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("grafana base URL is empty")]
    EmptyBaseUrl,
    #[error("malformed URL: {0}")]
    MalformedUrl(#[from] url::ParseError),
}

/// Wall-clock source for the render window. Production code uses
/// [`SystemClock`]; tests pin the window with a fixed instant.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

fn parse_base(base: &str) -> Result<Url, LinkError> {
    if base.is_empty() {
        return Err(LinkError::EmptyBaseUrl);
    }
    Ok(Url::parse(base)?)
}

fn append_path(url: &mut Url, segment: &str) {
    let mut path = url.path().trim_end_matches('/').to_string();
    path.push_str(segment);
    url.set_path(&path);
}

/// Dashboard view: `/d/{uid}?orgId={org}`.
pub fn dashboard_url(base: &str, org_id: &str, dashboard_uid: &str) -> Result<String, LinkError> {
    let mut url = parse_base(base)?;
    append_path(&mut url, &format!("/d/{dashboard_uid}"));
    url.query_pairs_mut().append_pair("orgId", org_id);
    Ok(url.to_string())
}

/// Dashboard view focused on one panel. `viewPanel` is omitted entirely
/// when `panel_id` is empty.
pub fn dashboard_panel_url(
    base: &str,
    org_id: &str,
    dashboard_uid: &str,
    panel_id: &str,
) -> Result<String, LinkError> {
    let mut url = parse_base(base)?;
    append_path(&mut url, &format!("/d/{dashboard_uid}"));
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("orgId", org_id);
        if !panel_id.is_empty() {
            query.append_pair("viewPanel", panel_id);
        }
    }
    Ok(url.to_string())
}

/// Render-image URL for a solo panel, 999x333, over a trailing window of
/// `now - 1h .. now - 1s` in millisecond epoch.
///
/// The window is recomputed from the clock on every call. Repeated calls
/// for the same alert render slightly different windows; the goal is a
/// recent trailing view, not a point-in-time snapshot.
pub fn render_url(
    base: &str,
    timezone: &str,
    org_id: &str,
    dashboard_uid: &str,
    panel_id: &str,
    clock: &dyn Clock,
) -> Result<String, LinkError> {
    let mut url = parse_base(base)?;
    append_path(&mut url, &format!("/render/d-solo/{dashboard_uid}"));

    let now = clock.now_utc();
    let from = (now - Duration::hours(1)).timestamp_millis();
    let to = (now - Duration::seconds(1)).timestamp_millis();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("orgId", org_id);
        query.append_pair("from", &from.to_string());
        query.append_pair("to", &to.to_string());
        query.append_pair("panelId", panel_id);
        query.append_pair("width", IMAGE_WIDTH);
        query.append_pair("height", IMAGE_HEIGHT);
        query.append_pair("tz", timezone);
    }
    Ok(url.to_string())
}

/// Silence-creation link on the alerting system's UI, filtered to the
/// batch's common labels as `key="value"` pairs sorted by key.
///
/// The silence page is a single-page app routed on the URL fragment, so the
/// percent-encoded `#` in the path is put back verbatim.
pub fn silence_url(
    external_url: &str,
    common_labels: &BTreeMap<String, String>,
) -> Result<String, LinkError> {
    let mut url = parse_base(external_url)?;
    url.set_path("/#/silences/new");

    let filters: Vec<String> = common_labels
        .iter()
        .map(|(name, value)| format!("{name}=\"{value}\""))
        .collect();
    url.query_pairs_mut()
        .append_pair("filter", &format!("{{{}}}", filters.join(",")));

    Ok(url.to_string().replacen("%23", "#", 1))
}

/// Edit link to the originating rule page: the generator URL with `orgId`
/// appended by plain concatenation, as the rule page expects.
pub fn edit_url(generator_url: &str, org_id: &str) -> String {
    format!("{generator_url}?orgId={org_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now_utc(&self) -> DateTime<Utc> {
            self.0
        }
    }

    #[test]
    fn dashboard_url_is_exact() {
        assert_eq!(
            dashboard_url("https://g.example.com", "1", "abc123").unwrap(),
            "https://g.example.com/d/abc123?orgId=1"
        );
    }

    #[test]
    fn dashboard_url_respects_base_path() {
        assert_eq!(
            dashboard_url("https://g.example.com/grafana/", "1", "abc123").unwrap(),
            "https://g.example.com/grafana/d/abc123?orgId=1"
        );
    }

    #[test]
    fn panel_url_includes_view_panel() {
        assert_eq!(
            dashboard_panel_url("https://g.example.com", "1", "abc123", "2").unwrap(),
            "https://g.example.com/d/abc123?orgId=1&viewPanel=2"
        );
    }

    #[test]
    fn panel_url_omits_empty_panel() {
        let url = dashboard_panel_url("https://g.example.com", "1", "abc123", "").unwrap();
        assert_eq!(url, "https://g.example.com/d/abc123?orgId=1");
        assert!(!url.contains("viewPanel"));
    }

    #[test]
    fn empty_base_is_rejected() {
        assert!(matches!(
            dashboard_url("", "1", "abc123"),
            Err(LinkError::EmptyBaseUrl)
        ));
        assert!(matches!(
            render_url("", "UTC", "1", "abc", "2", &SystemClock),
            Err(LinkError::EmptyBaseUrl)
        ));
    }

    #[test]
    fn malformed_base_is_propagated() {
        assert!(matches!(
            dashboard_url("not a url", "1", "abc123"),
            Err(LinkError::MalformedUrl(_))
        ));
    }

    #[test]
    fn render_url_window_is_one_hour_minus_one_second() {
        let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();
        let clock = FixedClock(now);

        let url =
            render_url("https://g.example.com", "UTC", "1", "abc123", "2", &clock).unwrap();

        let from = now.timestamp_millis() - 3_600_000;
        let to = now.timestamp_millis() - 1_000;
        assert_eq!(to - from, 3_599_000);
        assert!(url.starts_with("https://g.example.com/render/d-solo/abc123?"));
        assert!(url.contains(&format!("from={from}")));
        assert!(url.contains(&format!("to={to}")));
        assert!(url.contains("orgId=1"));
        assert!(url.contains("panelId=2"));
        assert!(url.contains("width=999"));
        assert!(url.contains("height=333"));
        assert!(url.contains("tz=UTC"));
    }

    #[test]
    fn silence_url_keeps_literal_hash_and_sorted_filter() {
        let mut labels = BTreeMap::new();
        labels.insert("env".to_string(), "prod".to_string());
        labels.insert("alertname".to_string(), "DiskFull".to_string());

        let url = silence_url("https://am.example.com", &labels).unwrap();

        assert_eq!(
            url,
            "https://am.example.com/#/silences/new?filter=%7Balertname%3D%22DiskFull%22%2Cenv%3D%22prod%22%7D"
        );
    }

    #[test]
    fn silence_url_replaces_existing_path() {
        let labels = BTreeMap::new();
        let url = silence_url("https://am.example.com/alertmanager", &labels).unwrap();
        assert!(url.starts_with("https://am.example.com/#/silences/new?filter="));
    }

    #[test]
    fn silence_url_rejects_bad_external_url() {
        let labels = BTreeMap::new();
        assert!(matches!(
            silence_url("", &labels),
            Err(LinkError::EmptyBaseUrl)
        ));
        assert!(matches!(
            silence_url("://nope", &labels),
            Err(LinkError::MalformedUrl(_))
        ));
    }

    #[test]
    fn edit_url_appends_org() {
        assert_eq!(
            edit_url("https://g.example.com/alerting/1/edit", "5"),
            "https://g.example.com/alerting/1/edit?orgId=5"
        );
    }
}
