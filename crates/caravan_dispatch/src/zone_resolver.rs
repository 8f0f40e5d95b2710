use jiff::civil::Date;
use tracing::debug;

use caravan_core::{
    DispatchError, DispatchResult, GeoPoint,
    id::ZoneId,
    model::Zone,
};
use caravan_store::DispatchStore;

/// Active zones for a date, in the store's provisioning order. An empty set
/// is a structural failure: nothing downstream can work without zones.
pub fn active_zones<S: DispatchStore>(store: &S, date: Date) -> DispatchResult<Vec<Zone>> {
    let zones = store.active_zones_on(date);
    if zones.is_empty() {
        return Err(DispatchError::NoActiveZones(date));
    }
    debug!(%date, zones = zones.len(), "resolved active zones");
    Ok(zones)
}

/// Nearest zone to a point by haversine distance to each zone's
/// representative geometry, optionally excluding one zone.
pub fn nearest_zone<'a>(
    zones: &'a [Zone],
    point: &GeoPoint,
    exclude: Option<ZoneId>,
) -> Option<&'a Zone> {
    zones
        .iter()
        .filter(|zone| Some(zone.id) != exclude)
        .filter_map(|zone| zone.distance_to(point).map(|distance| (zone, distance)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(zone, _)| zone)
}
