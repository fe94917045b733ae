use std::fmt::Write;

use crate::geo::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://apis.data.go.kr/B551011/GoCamping";
pub const DEFAULT_NUM_OF_ROWS: u32 = 1000;

/// Request parameters shared by every GoCamping call. The service key is
/// optional so keyless (open) deployments build the same request shape
/// minus the key parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    pub service_key: String,
    pub num_of_rows: u32,
    pub mobile_os: String,
    pub mobile_app: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_key: String::new(),
            num_of_rows: DEFAULT_NUM_OF_ROWS,
            mobile_os: "ETC".to_string(),
            mobile_app: "campmap".to_string(),
        }
    }
}

/// The two query shapes the API supports. One builder covers both; the
/// viewport variant adds longitude/latitude/radius, the unfiltered
/// variant omits them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryVariant {
    /// `locationBasedList`: records within `radius_m` of `center`.
    Viewport { center: Coordinate, radius_m: f64 },
    /// `basedList`: every record, first page.
    All,
}

impl QueryVariant {
    fn operation(&self) -> &'static str {
        match self {
            QueryVariant::Viewport { .. } => "locationBasedList",
            QueryVariant::All => "basedList",
        }
    }
}

/// Build the full request URL for a variant.
pub fn request_url(cfg: &ApiConfig, variant: QueryVariant) -> String {
    let mut url = format!(
        "{}/{}?numOfRows={}&pageNo=1&MobileOS={}&MobileApp={}",
        cfg.base_url,
        variant.operation(),
        cfg.num_of_rows,
        cfg.mobile_os,
        cfg.mobile_app,
    );
    if !cfg.service_key.is_empty() {
        let _ = write!(url, "&serviceKey={}", cfg.service_key);
    }
    if let QueryVariant::Viewport { center, radius_m } = variant {
        let _ = write!(
            url,
            "&mapX={}&mapY={}&radius={}",
            center.lng,
            center.lat,
            radius_m.round() as i64
        );
    }
    url.push_str("&_type=json");
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_url_carries_geo_parameters() {
        let cfg = ApiConfig::default();
        let url = request_url(
            &cfg,
            QueryVariant::Viewport {
                center: Coordinate::new(37.5, 127.0),
                radius_m: 10_000.4,
            },
        );
        assert_eq!(
            url,
            "https://apis.data.go.kr/B551011/GoCamping/locationBasedList\
             ?numOfRows=1000&pageNo=1&MobileOS=ETC&MobileApp=campmap\
             &mapX=127&mapY=37.5&radius=10000&_type=json"
        );
    }

    #[test]
    fn all_url_omits_geo_parameters() {
        let cfg = ApiConfig::default();
        let url = request_url(&cfg, QueryVariant::All);
        assert!(url.contains("/basedList?"));
        assert!(!url.contains("mapX="));
        assert!(!url.contains("radius="));
        assert!(url.ends_with("&_type=json"));
    }

    #[test]
    fn service_key_appears_only_when_configured() {
        let keyless = request_url(&ApiConfig::default(), QueryVariant::All);
        assert!(!keyless.contains("serviceKey"));

        let keyed = ApiConfig {
            service_key: "abc123".into(),
            ..Default::default()
        };
        let url = request_url(&keyed, QueryVariant::All);
        assert!(url.contains("&serviceKey=abc123&"));
    }

    #[test]
    fn page_is_pinned_to_first() {
        let url = request_url(&ApiConfig::default(), QueryVariant::All);
        assert!(url.contains("&pageNo=1&"));
    }
}
