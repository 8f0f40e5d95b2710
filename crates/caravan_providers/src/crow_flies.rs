use jiff::SignedDuration;

use caravan_core::{GeoPoint, constants::CROW_FLIES_SPEED_KMH};

use crate::{
    optimization::{
        OptimizationRequest, OptimizationSolution, OptimizedRoute, RouteStep, StepKind,
    },
    route_optimizer::{OptimizerError, RouteOptimizer},
};

/// Offline provider: sequences stops nearest-neighbor over straight-line
/// distances at a fixed speed. Good enough for demos and tests; a real
/// deployment points `VroomClient` at a solver instead.
pub struct CrowFliesOptimizer {
    speed_kmh: f64,
}

impl CrowFliesOptimizer {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }
}

impl Default for CrowFliesOptimizer {
    fn default() -> Self {
        Self::new(CROW_FLIES_SPEED_KMH)
    }
}

impl RouteOptimizer for CrowFliesOptimizer {
    async fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationSolution, OptimizerError> {
        if request.stops.is_empty() {
            return Ok(OptimizationSolution {
                routes: Vec::new(),
                unassigned: Vec::new(),
            });
        }
        if self.speed_kmh <= 0.0 {
            return Err(OptimizerError::Other(String::from("speed must be positive")));
        }

        let meters_per_second = self.speed_kmh / 3.6;
        let mut remaining: Vec<usize> = (0..request.stops.len()).collect();
        let mut current = request.vehicle.start;
        let mut arrival = request.departure;
        let mut total_distance = 0.0;

        let mut coords = vec![current];
        let mut steps = vec![RouteStep {
            kind: StepKind::Start,
            order_id: None,
            arrival,
        }];

        while !remaining.is_empty() {
            let (position, _) = remaining
                .iter()
                .enumerate()
                .map(|(position, &index)| {
                    let leg = current.haversine_distance(&request.stops[index].location);
                    (position, leg)
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .expect("remaining is non-empty");

            let index = remaining.swap_remove(position);
            let stop = &request.stops[index];
            let leg = current.haversine_distance(&stop.location);

            total_distance += leg;
            arrival += SignedDuration::from_secs((leg / meters_per_second) as i64);

            steps.push(RouteStep {
                kind: StepKind::Service,
                order_id: Some(stop.order_id),
                arrival,
            });

            arrival += stop.service_duration;
            current = stop.location;
            coords.push(current);
        }

        if let Some(end) = request.vehicle.end {
            let leg = current.haversine_distance(&end);
            total_distance += leg;
            arrival += SignedDuration::from_secs((leg / meters_per_second) as i64);
            steps.push(RouteStep {
                kind: StepKind::End,
                order_id: None,
                arrival,
            });
            coords.push(end);
        }

        let route = OptimizedRoute {
            geometry: lnglat_chain(&coords),
            distance_meters: total_distance,
            duration: arrival.duration_since(request.departure),
            steps,
        };

        Ok(OptimizationSolution {
            routes: vec![route],
            unassigned: Vec::new(),
        })
    }
}

fn lnglat_chain(coords: &[GeoPoint]) -> String {
    coords
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}
