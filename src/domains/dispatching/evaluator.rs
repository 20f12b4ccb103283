use crate::domains::dispatching::filters::CompositeFilter;
use crate::domains::dispatching::{AssignmentCandidate, DispatchContext, PlantSnapshot};
use crate::domains::fleet::Vehicle;
use crate::domains::plant_model::{PlantModel, Router};
use crate::domains::transport_order::{DriveOrder, Route, TransportOrder};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

/// A candidate refused by the candidate filter chain.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRejection {
    pub vehicle: String,
    pub order: String,
    pub reasons: Vec<String>,
}

impl CandidateRejection {
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

#[derive(Debug, Clone)]
pub enum CandidateOutcome {
    Accepted(AssignmentCandidate),
    Rejected(CandidateRejection),
    /// No route to some destination; not an error.
    Unroutable,
}

/// Routes orders for vehicles and turns the pairs into assignment candidates.
pub struct CandidateEvaluator {
    router: Arc<dyn Router>,
    max_routes: usize,
    avoid_allocated_by_others: bool,
}

impl CandidateEvaluator {
    pub fn new(router: Arc<dyn Router>, max_routes: usize, avoid_allocated_by_others: bool) -> Self {
        Self {
            router,
            max_routes: max_routes.max(1),
            avoid_allocated_by_others,
        }
    }

    /// Resources the route of `order` for `vehicle` must not use.
    pub fn resources_to_avoid(&self, vehicle: &Vehicle, order: &TransportOrder, snapshot: &PlantSnapshot) -> BTreeSet<String> {
        let mut avoid = order.resources_to_avoid.clone();
        if self.avoid_allocated_by_others {
            avoid.extend(snapshot.resources_allocated_by_others(&vehicle.name));
        }
        avoid
    }

    /// Points a drive order may end at: the access points of its location allowing
    /// the operation, or the point itself if the destination names a point.
    fn destination_points(model: &PlantModel, drive_order: &DriveOrder) -> Vec<String> {
        let destination = &drive_order.destination;
        if model.locations.contains_key(&destination.location) {
            model.access_points_for(&destination.location, &destination.operation)
        } else if model.is_point(&destination.location) {
            vec![destination.location.clone()]
        } else {
            Vec::new()
        }
    }

    fn cheapest_route(&self, vehicle: &Vehicle, source: &str, destination: &str, avoid: &BTreeSet<String>) -> Option<Route> {
        if source == destination {
            return Some(Route::stationary(destination));
        }
        self.router
            .routes(vehicle, source, destination, avoid, self.max_routes)
            .into_iter()
            .take(self.max_routes)
            .min_by_key(|route| route.costs)
    }

    /// Routes the drive orders one after another starting at `start`.
    /// `None` if any destination is unreachable.
    pub fn route_drive_orders(
        &self,
        vehicle: &Vehicle,
        start: &str,
        drive_orders: &[DriveOrder],
        avoid: &BTreeSet<String>,
        model: &PlantModel,
    ) -> Option<Vec<DriveOrder>> {
        let mut position = start.to_string();
        let mut routed = Vec::with_capacity(drive_orders.len());

        for drive_order in drive_orders {
            let mut best: Option<Route> = None;
            for point in Self::destination_points(model, drive_order) {
                let Some(route) = self.cheapest_route(vehicle, &position, &point, avoid) else {
                    continue;
                };
                if best.as_ref().map_or(true, |b| route.costs < b.costs) {
                    best = Some(route);
                }
            }
            let route = best?;
            position = route.final_point().unwrap_or(&position).to_string();
            routed.push(DriveOrder {
                route: Some(route),
                ..drive_order.clone()
            });
        }
        Some(routed)
    }

    /// Routes the whole order for the vehicle and runs the candidate filter chain.
    pub fn evaluate(
        &self,
        vehicle: &Vehicle,
        order: &TransportOrder,
        filter: &CompositeFilter<AssignmentCandidate>,
        ctx: &DispatchContext<'_>,
    ) -> CandidateOutcome {
        let Some(start) = vehicle.current_position.as_deref() else {
            return CandidateOutcome::Unroutable;
        };
        let avoid = self.resources_to_avoid(vehicle, order, ctx.snapshot);
        let Some(drive_orders) =
            self.route_drive_orders(vehicle, start, &order.drive_orders, &avoid, &ctx.snapshot.model)
        else {
            debug!(vehicle = %vehicle.name, order = %order.name, "No route for order");
            return CandidateOutcome::Unroutable;
        };

        let candidate = AssignmentCandidate::new(vehicle.clone(), order.clone(), drive_orders);
        let reasons = filter.apply(&candidate, ctx);
        if reasons.is_empty() {
            CandidateOutcome::Accepted(candidate)
        } else {
            CandidateOutcome::Rejected(CandidateRejection {
                vehicle: vehicle.name.clone(),
                order: order.name.clone(),
                reasons,
            })
        }
    }
}
