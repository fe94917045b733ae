use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Placeholder strings rendered when a record field is absent or empty.
pub mod placeholder {
    pub const IMAGE: &str = "/img/noimage.png";
    pub const NAME: &str = "캠핑장 이름 없음";
    pub const ADDRESS: &str = "주소 정보 없음";
    pub const INTRO: &str = "소개 정보 없음";
    pub const HOMEPAGE: &str = "홈페이지 정보 없음";
    pub const OPERATING_STATUS: &str = "운영 상태 정보 없음";
    pub const DIRECTIONS: &str = "오시는 길 정보 없음";
    pub const RESERVATION: &str = "예약 방법 정보 없음";
    pub const INDOOR_FACILITIES: &str = "내부 시설 정보 없음";
    pub const OTHER_FACILITIES: &str = "기타 시설 정보 없음";
    pub const PET_POLICY: &str = "반려동물 동반 정보 없음";
    pub const EMPTY_LIST: &str = "주변 캠핑장을 찾을 수 없습니다.";
}

/// One campground as the GoCamping API serves it. Every field is an
/// optional string on the wire; display accessors substitute the
/// documented placeholder when a field is absent or empty.
///
/// Records are immutable once fetched and live for one fetch cycle: the
/// next synchronization replaces the whole set, never merges into it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CampgroundRecord {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(rename = "facltNm")]
    pub name: String,
    #[serde(rename = "addr1")]
    pub address: String,
    #[serde(rename = "intro")]
    pub intro: String,
    #[serde(rename = "firstImageUrl")]
    pub image_url: String,
    #[serde(rename = "homepage")]
    pub homepage: String,
    #[serde(rename = "manageSttus")]
    pub operating_status: String,
    #[serde(rename = "direction")]
    pub directions: String,
    #[serde(rename = "resveCl")]
    pub reservation: String,
    #[serde(rename = "caravInnerFclty")]
    pub indoor_facilities: String,
    #[serde(rename = "sbrsEtc")]
    pub other_facilities: String,
    #[serde(rename = "animalCmgCl")]
    pub pet_policy: String,
    /// Longitude, as a decimal string.
    #[serde(rename = "mapX")]
    pub map_x: String,
    /// Latitude, as a decimal string.
    #[serde(rename = "mapY")]
    pub map_y: String,
}

fn or_placeholder<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

impl CampgroundRecord {
    /// Parsed position, `None` when either axis is absent or unparsable.
    /// Records without a position are skipped during synchronization.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat: f64 = self.map_y.trim().parse().ok()?;
        let lng: f64 = self.map_x.trim().parse().ok()?;
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }
        Some(Coordinate::new(lat, lng))
    }

    pub fn display_name(&self) -> &str {
        or_placeholder(&self.name, placeholder::NAME)
    }

    pub fn display_address(&self) -> &str {
        or_placeholder(&self.address, placeholder::ADDRESS)
    }

    pub fn display_intro(&self) -> &str {
        or_placeholder(&self.intro, placeholder::INTRO)
    }

    pub fn display_image_url(&self) -> &str {
        or_placeholder(&self.image_url, placeholder::IMAGE)
    }

    /// Homepage URL, `None` when absent (the detail view renders the
    /// placeholder text instead of a dead link).
    pub fn homepage_url(&self) -> Option<&str> {
        let trimmed = self.homepage.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Homepage as display text: the URL itself, or the placeholder.
    pub fn display_homepage_text(&self) -> &str {
        self.homepage_url().unwrap_or(placeholder::HOMEPAGE)
    }

    pub fn display_operating_status(&self) -> &str {
        or_placeholder(&self.operating_status, placeholder::OPERATING_STATUS)
    }

    pub fn display_directions(&self) -> &str {
        or_placeholder(&self.directions, placeholder::DIRECTIONS)
    }

    pub fn display_reservation(&self) -> &str {
        or_placeholder(&self.reservation, placeholder::RESERVATION)
    }

    pub fn display_indoor_facilities(&self) -> &str {
        or_placeholder(&self.indoor_facilities, placeholder::INDOOR_FACILITIES)
    }

    pub fn display_other_facilities(&self) -> &str {
        or_placeholder(&self.other_facilities, placeholder::OTHER_FACILITIES)
    }

    pub fn display_pet_policy(&self) -> &str {
        or_placeholder(&self.pet_policy, placeholder::PET_POLICY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_cover_every_missing_field() {
        let record = CampgroundRecord::default();
        assert_eq!(record.display_name(), placeholder::NAME);
        assert_eq!(record.display_address(), placeholder::ADDRESS);
        assert_eq!(record.display_intro(), placeholder::INTRO);
        assert_eq!(record.display_image_url(), placeholder::IMAGE);
        assert_eq!(record.homepage_url(), None);
        assert_eq!(
            record.display_operating_status(),
            placeholder::OPERATING_STATUS
        );
        assert_eq!(record.display_directions(), placeholder::DIRECTIONS);
        assert_eq!(record.display_reservation(), placeholder::RESERVATION);
        assert_eq!(
            record.display_indoor_facilities(),
            placeholder::INDOOR_FACILITIES
        );
        assert_eq!(
            record.display_other_facilities(),
            placeholder::OTHER_FACILITIES
        );
        assert_eq!(record.display_pet_policy(), placeholder::PET_POLICY);
    }

    #[test]
    fn whitespace_only_fields_fall_back() {
        let record = CampgroundRecord {
            name: "   ".into(),
            homepage: " \t".into(),
            ..Default::default()
        };
        assert_eq!(record.display_name(), placeholder::NAME);
        assert_eq!(record.homepage_url(), None);
    }

    #[test]
    fn present_fields_render_verbatim() {
        let record = CampgroundRecord {
            name: "솔밭 캠핑장".into(),
            homepage: "https://example.kr".into(),
            ..Default::default()
        };
        assert_eq!(record.display_name(), "솔밭 캠핑장");
        assert_eq!(record.homepage_url(), Some("https://example.kr"));
    }

    #[test]
    fn coordinate_parses_wire_strings() {
        let record = CampgroundRecord {
            map_x: "127.0".into(),
            map_y: "37.5".into(),
            ..Default::default()
        };
        assert_eq!(record.coordinate(), Some(Coordinate::new(37.5, 127.0)));
    }

    #[test]
    fn coordinate_rejects_missing_or_garbage_axes() {
        let missing = CampgroundRecord::default();
        assert_eq!(missing.coordinate(), None);

        let garbage = CampgroundRecord {
            map_x: "동경127도".into(),
            map_y: "37.5".into(),
            ..Default::default()
        };
        assert_eq!(garbage.coordinate(), None);
    }

    #[test]
    fn deserializes_from_wire_names() {
        let record: CampgroundRecord = serde_json::from_value(serde_json::json!({
            "facltNm": "Camp A",
            "addr1": "Seoul",
            "mapX": "127.0",
            "mapY": "37.5"
        }))
        .unwrap();
        assert_eq!(record.name, "Camp A");
        assert_eq!(record.address, "Seoul");
        assert_eq!(record.coordinate(), Some(Coordinate::new(37.5, 127.0)));
        // Absent on the wire, placeholder on display.
        assert_eq!(record.display_homepage_text(), placeholder::HOMEPAGE);
    }
}
