use caravan_core::{
    DispatchError, DispatchResult,
    model::{Order, Vehicle},
};

/// Checks whether a vehicle can carry a run's current orders plus a set of
/// candidates. Weight is summed directly; volume is the per-package proxy.
/// A missing declared limit means unbounded in that dimension.
pub fn check_vehicle_capacity(
    vehicle: &Vehicle,
    current: &[Order],
    candidates: &[Order],
) -> DispatchResult<()> {
    let weight: f64 = current
        .iter()
        .chain(candidates)
        .map(|order| order.weight_kg)
        .sum();
    let volume: f64 = current
        .iter()
        .chain(candidates)
        .map(|order| order.volume_m3())
        .sum();

    if let Some(limit) = vehicle.weight_capacity_kg {
        if weight > limit {
            return Err(DispatchError::CapacityExceeded(format!(
                "exceeds weight capacity: {weight:.1} kg / {limit:.1} kg"
            )));
        }
    }

    if let Some(limit) = vehicle.volume_capacity_m3 {
        if volume > limit {
            return Err(DispatchError::CapacityExceeded(format!(
                "exceeds volume capacity: {volume:.2} m3 / {limit:.2} m3"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    fn order(weight_kg: f64, packages: u32) -> Order {
        let mut order = Order::new(date(2026, 3, 2), weight_kg, packages);
        order.status = caravan_core::model::OrderStatus::Confirmed;
        order
    }

    #[test]
    fn unbounded_vehicle_accepts_anything() {
        let vehicle = Vehicle::new("VAN-1");
        let heavy: Vec<Order> = (0..100).map(|_| order(1000.0, 50)).collect();
        assert!(check_vehicle_capacity(&vehicle, &heavy, &[]).is_ok());
    }

    #[test]
    fn weight_limit_is_enforced_with_reason() {
        let mut vehicle = Vehicle::new("VAN-1");
        vehicle.weight_capacity_kg = Some(100.0);

        let current = vec![order(60.0, 1)];
        let candidate = vec![order(50.0, 1)];

        let error = check_vehicle_capacity(&vehicle, &current, &candidate).unwrap_err();
        let message = error.to_string();
        assert!(message.contains("exceeds weight capacity"), "{message}");
        assert!(message.contains("110.0 kg / 100.0 kg"), "{message}");

        assert!(check_vehicle_capacity(&vehicle, &current, &[]).is_ok());
    }

    #[test]
    fn volume_limit_uses_package_proxy() {
        let mut vehicle = Vehicle::new("VAN-1");
        // 0.05 m3 per package: 40 packages fit in 2.0 m3, 41 do not.
        vehicle.volume_capacity_m3 = Some(2.0);

        let fits = vec![order(1.0, 40)];
        assert!(check_vehicle_capacity(&vehicle, &fits, &[]).is_ok());

        let overflow = vec![order(1.0, 41)];
        let error = check_vehicle_capacity(&vehicle, &overflow, &[]).unwrap_err();
        assert!(error.to_string().contains("exceeds volume capacity"));
    }
}
