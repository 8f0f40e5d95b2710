use geo::{Centroid, Contains};
use geo_types::Polygon;
use jiff::civil::{Date, Weekday};
use serde::{Deserialize, Serialize};

use crate::{GeoPoint, id::ZoneId};

/// Bitset of weekdays on which a zone is active, Monday as bit 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveDays(u8);

impl ActiveDays {
    pub const EVERY_DAY: ActiveDays = ActiveDays(0b0111_1111);
    pub const WEEKDAYS: ActiveDays = ActiveDays(0b0001_1111);
    pub const WEEKENDS: ActiveDays = ActiveDays(0b0110_0000);

    pub fn from_weekdays(days: &[Weekday]) -> Self {
        let mut mask = 0;
        for day in days {
            mask |= Self::bit(*day);
        }
        ActiveDays(mask)
    }

    pub fn includes(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.to_monday_zero_offset()
    }
}

/// A dispatch catchment area: a polygon with a target driver headcount and
/// an activation template. Zones are provisioned externally and read-only
/// to the dispatch core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    /// Closed ring of lon/lat vertices.
    pub polygon: Polygon,
    pub target_driver_count: u32,
    pub active_days: ActiveDays,
    pub valid_from: Option<Date>,
    pub valid_until: Option<Date>,
}

impl Zone {
    pub fn new(name: impl Into<String>, polygon: Polygon, target_driver_count: u32) -> Self {
        Zone {
            id: ZoneId::new(),
            name: name.into(),
            polygon,
            target_driver_count,
            active_days: ActiveDays::EVERY_DAY,
            valid_from: None,
            valid_until: None,
        }
    }

    pub fn is_active_on(&self, date: Date) -> bool {
        if !self.active_days.includes(date.weekday()) {
            return false;
        }
        if self.valid_from.is_some_and(|from| date < from) {
            return false;
        }
        !self.valid_until.is_some_and(|until| date > until)
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.polygon.contains(&geo_types::Point::from(point))
    }

    /// Representative point for nearest-zone math: the polygon centroid,
    /// falling back to the first exterior vertex for degenerate rings.
    pub fn representative_point(&self) -> Option<GeoPoint> {
        self.polygon
            .centroid()
            .map(GeoPoint::from)
            .or_else(|| self.polygon.exterior().points().next().map(GeoPoint::from))
    }

    pub fn distance_to(&self, point: &GeoPoint) -> Option<f64> {
        self.representative_point()
            .map(|center| center.haversine_distance(point))
    }

    /// Zone component of a run number: first three alphanumerics of the
    /// name, uppercased.
    pub fn prefix(&self) -> String {
        let prefix: String = self
            .name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .take(3)
            .collect::<String>()
            .to_ascii_uppercase();

        if prefix.is_empty() {
            String::from("ZON")
        } else {
            prefix
        }
    }
}

#[cfg(test)]
mod tests {
    use geo_types::polygon;
    use jiff::civil::date;

    use super::*;

    fn square_zone() -> Zone {
        let polygon = polygon![
            (x: 0.0, y: 0.0),
            (x: 0.1, y: 0.0),
            (x: 0.1, y: 0.1),
            (x: 0.0, y: 0.1),
            (x: 0.0, y: 0.0),
        ];
        Zone::new("Downtown", polygon, 2)
    }

    #[test]
    fn contains_point_inside_polygon() {
        let zone = square_zone();
        assert!(zone.contains(&GeoPoint::new(0.05, 0.05)));
        assert!(!zone.contains(&GeoPoint::new(0.5, 0.5)));
    }

    #[test]
    fn weekday_template_excludes_weekends() {
        let mut zone = square_zone();
        zone.active_days = ActiveDays::WEEKDAYS;

        // 2026-03-02 is a Monday, 2026-03-07 a Saturday
        assert!(zone.is_active_on(date(2026, 3, 2)));
        assert!(!zone.is_active_on(date(2026, 3, 7)));
    }

    #[test]
    fn validity_window_bounds_activation() {
        let mut zone = square_zone();
        zone.valid_from = Some(date(2026, 3, 1));
        zone.valid_until = Some(date(2026, 3, 31));

        assert!(!zone.is_active_on(date(2026, 2, 28)));
        assert!(zone.is_active_on(date(2026, 3, 15)));
        assert!(!zone.is_active_on(date(2026, 4, 1)));
    }

    #[test]
    fn prefix_takes_three_alphanumerics() {
        let mut zone = square_zone();
        assert_eq!(zone.prefix(), "DOW");

        zone.name = String::from("Z-9 North");
        assert_eq!(zone.prefix(), "Z9N");

        zone.name = String::new();
        assert_eq!(zone.prefix(), "ZON");
    }
}
