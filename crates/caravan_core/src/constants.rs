use jiff::SignedDuration;

/// Orders-per-driver ratio above which a zone is considered overloaded.
pub const OVERLOAD_ORDERS_PER_DRIVER: f64 = 20.0;

/// Orders-per-driver ratio below which a non-empty zone is underutilized.
pub const UNDERUTILIZED_ORDERS_PER_DRIVER: f64 = 5.0;

/// Target orders per driver when recommending a driver reduction.
pub const MERGE_ORDERS_PER_DRIVER: u32 = 10;

/// Target orders per driver when moving orders out of an overloaded zone.
pub const REBALANCE_ORDERS_PER_DRIVER: u32 = 15;

/// Volume proxy per package, in cubic meters.
pub const VOLUME_PER_PACKAGE_M3: f64 = 0.05;

/// Service duration at each delivery stop.
pub const STOP_SERVICE_DURATION: SignedDuration = SignedDuration::from_mins(5);

/// Civil hour (UTC) at which finalized routes are assumed to depart.
pub const ROUTE_DEPARTURE_HOUR: i8 = 8;

/// Straight-line speed assumed by the crow-flies optimizer.
pub const CROW_FLIES_SPEED_KMH: f64 = 30.0;
