use std::time::Duration;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::debug;

use caravan_core::id::OrderId;

use crate::{
    optimization::{
        OptimizationRequest, OptimizationSolution, OptimizedRoute, RouteStep, StepKind,
    },
    route_optimizer::{OptimizerError, RouteOptimizer},
};

pub const OPTIMIZER_URL_ENV: &str = "CARAVAN_OPTIMIZER_URL";

/// `[lng, lat]`, the solver's coordinate order.
type VroomLocation = [f64; 2];

#[derive(Debug, Serialize)]
struct VroomVehicle {
    id: u64,
    start: VroomLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<VroomLocation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    capacity: Vec<i64>,
    time_window: [i64; 2],
}

#[derive(Debug, Serialize)]
struct VroomJob {
    id: u64,
    location: VroomLocation,
    /// Service time in seconds.
    service: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    delivery: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_windows: Option<Vec<[i64; 2]>>,
}

#[derive(Debug, Serialize)]
struct VroomOptions {
    /// Request route geometry in the response.
    g: bool,
}

#[derive(Debug, Serialize)]
struct VroomRequestBody {
    vehicles: Vec<VroomVehicle>,
    jobs: Vec<VroomJob>,
    options: VroomOptions,
}

#[derive(Debug, Deserialize)]
struct VroomStep {
    #[serde(rename = "type")]
    step_type: String,
    id: Option<u64>,
    arrival: i64,
}

#[derive(Debug, Deserialize)]
struct VroomRoute {
    steps: Vec<VroomStep>,
    geometry: Option<String>,
    distance: Option<f64>,
    duration: i64,
}

#[derive(Debug, Deserialize)]
struct VroomUnassigned {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct VroomResponse {
    code: i32,
    error: Option<String>,
    #[serde(default)]
    routes: Vec<VroomRoute>,
    #[serde(default)]
    unassigned: Vec<VroomUnassigned>,
}

pub struct VroomClientParams {
    pub base_url: String,
    pub timeout: Duration,
}

/// HTTP client for a VROOM-compatible optimization endpoint.
pub struct VroomClient {
    params: VroomClientParams,
    client: reqwest::Client,
}

impl VroomClient {
    pub fn new(params: VroomClientParams) -> Self {
        Self {
            params,
            client: reqwest::Client::new(),
        }
    }

    /// Reads the endpoint from `CARAVAN_OPTIMIZER_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var(OPTIMIZER_URL_ENV)
            .map_err(|_| anyhow::anyhow!("{OPTIMIZER_URL_ENV} is not set"))?;
        Ok(Self::new(VroomClientParams {
            base_url,
            timeout: Duration::from_secs(30),
        }))
    }

    fn build_body(request: &OptimizationRequest) -> VroomRequestBody {
        let departure = request.departure.as_second();

        // The solver wants small integer ids; job id n maps back to
        // request.stops[n - 1].
        let jobs = request
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| VroomJob {
                id: index as u64 + 1,
                location: [stop.location.lng, stop.location.lat],
                service: stop.service_duration.as_secs(),
                delivery: stop.demand.iter().map(|d| (d * 1000.0).round() as i64).collect(),
                time_windows: stop.time_window.and_then(|window| {
                    let start = window.start().map(|t| t.as_second()).unwrap_or(departure);
                    let end = window.end().map(|t| t.as_second())?;
                    Some(vec![[start, end]])
                }),
            })
            .collect();

        let vehicle = VroomVehicle {
            id: 1,
            start: [request.vehicle.start.lng, request.vehicle.start.lat],
            end: request.vehicle.end.map(|end| [end.lng, end.lat]),
            capacity: request
                .vehicle
                .capacity
                .iter()
                .map(|c| (c * 1000.0).round() as i64)
                .collect(),
            // A generous shift; departure-anchored so arrivals come back as
            // absolute epoch seconds.
            time_window: [departure, departure + 24 * 3600],
        };

        VroomRequestBody {
            vehicles: vec![vehicle],
            jobs,
            options: VroomOptions { g: true },
        }
    }

    fn job_order_id(request: &OptimizationRequest, job_id: u64) -> Option<OrderId> {
        request
            .stops
            .get(job_id.checked_sub(1)? as usize)
            .map(|stop| stop.order_id)
    }
}

impl RouteOptimizer for VroomClient {
    async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationSolution, OptimizerError> {
        let body = Self::build_body(request);

        debug!(
            stops = request.stops.len(),
            url = %self.params.base_url,
            "sending optimization request"
        );

        let response = self
            .client
            .post(&self.params.base_url)
            .timeout(self.params.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(OptimizerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: VroomResponse = response.json().await?;
        if parsed.code != 0 {
            return Err(OptimizerError::Api {
                status: status.as_u16(),
                message: parsed.error.unwrap_or_else(|| format!("code {}", parsed.code)),
            });
        }

        let routes = parsed
            .routes
            .into_iter()
            .map(|route| OptimizedRoute {
                geometry: route.geometry.unwrap_or_default(),
                distance_meters: route.distance.unwrap_or(0.0),
                duration: SignedDuration::from_secs(route.duration),
                steps: route
                    .steps
                    .into_iter()
                    .filter_map(|step| {
                        let kind = match step.step_type.as_str() {
                            "start" => StepKind::Start,
                            "end" => StepKind::End,
                            "job" => StepKind::Service,
                            _ => return None,
                        };
                        let order_id = match kind {
                            StepKind::Service => {
                                Some(Self::job_order_id(request, step.id?)?)
                            }
                            _ => None,
                        };
                        Some(RouteStep {
                            kind,
                            order_id,
                            arrival: Timestamp::from_second(step.arrival).ok()?,
                        })
                    })
                    .collect(),
            })
            .collect();

        let unassigned = parsed
            .unassigned
            .into_iter()
            .filter_map(|u| Self::job_order_id(request, u.id))
            .collect();

        Ok(OptimizationSolution { routes, unassigned })
    }
}

#[cfg(test)]
mod tests {
    use caravan_core::GeoPoint;
    use jiff::civil::date;

    use crate::optimization::{OptimizationStop, OptimizationVehicle};

    use super::*;

    fn request() -> OptimizationRequest {
        let departure = date(2026, 3, 2)
            .at(8, 0, 0, 0)
            .to_zoned(jiff::tz::TimeZone::UTC)
            .unwrap()
            .timestamp();

        OptimizationRequest {
            departure,
            vehicle: OptimizationVehicle {
                external_id: String::from("VAN-1"),
                start: GeoPoint::new(48.85, 2.35),
                end: None,
                capacity: vec![500.0, 6.0],
            },
            stops: vec![
                OptimizationStop {
                    order_id: OrderId::new(),
                    location: GeoPoint::new(48.86, 2.36),
                    service_duration: SignedDuration::from_mins(5),
                    time_window: None,
                    demand: vec![12.5, 0.1],
                },
                OptimizationStop {
                    order_id: OrderId::new(),
                    location: GeoPoint::new(48.87, 2.33),
                    service_duration: SignedDuration::from_mins(5),
                    time_window: None,
                    demand: vec![3.0, 0.05],
                },
            ],
        }
    }

    #[test]
    fn body_uses_lng_lat_and_scaled_integer_demand() {
        let request = request();
        let body = VroomClient::build_body(&request);

        assert_eq!(body.vehicles.len(), 1);
        assert_eq!(body.vehicles[0].start, [2.35, 48.85]);
        assert_eq!(body.vehicles[0].capacity, vec![500_000, 6_000]);

        assert_eq!(body.jobs.len(), 2);
        assert_eq!(body.jobs[0].id, 1);
        assert_eq!(body.jobs[0].location, [2.36, 48.86]);
        assert_eq!(body.jobs[0].delivery, vec![12_500, 100]);
        assert_eq!(body.jobs[0].service, 300);
    }

    #[test]
    fn job_ids_map_back_to_order_ids() {
        let request = request();
        assert_eq!(
            VroomClient::job_order_id(&request, 2),
            Some(request.stops[1].order_id)
        );
        assert_eq!(VroomClient::job_order_id(&request, 0), None);
        assert_eq!(VroomClient::job_order_id(&request, 9), None);
    }
}
