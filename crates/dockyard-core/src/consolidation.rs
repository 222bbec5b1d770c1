//! Order consolidation: splitting one dispatch order into capacity-sized
//! children, and clubbing several orders into one mother order. Both ends
//! maintain the strict two-level mother/child tree and the derived totals.

use crate::error::{Result, YardError};
use crate::order::{DispatchOrder, LineItem};
use crate::types::{LineItemStatus, OrderStatus};
use crate::planner::VehiclePlan;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SplitOutcome {
    /// The original order, now flagged as mother. It keeps no line items;
    /// ownership moves wholly into the children.
    pub mother: DispatchOrder,
    pub children: Vec<DispatchOrder>,
}

/// Split `order` along the confirmed plans into child orders.
///
/// Every plan must be complete (items, vehicle type, dispatch date) and
/// every line item of the order must land in exactly one plan; a partial
/// split would silently strand material, so it is refused outright.
/// Children are numbered `{do_number}-C1`, `-C2`, ... and inherit the
/// mother's routing and priority; dispatch date and vehicle-age cap come
/// from each plan.
pub fn split_order(order: DispatchOrder, plans: Vec<VehiclePlan>) -> Result<SplitOutcome> {
    if plans.is_empty() {
        return Err(YardError::EmptySplit);
    }
    for plan in &plans {
        plan.validate()?;
    }

    let owned: BTreeSet<&str> = order.line_items.iter().map(|i| i.id.as_str()).collect();
    let placed: BTreeSet<&str> = plans
        .iter()
        .flat_map(|p| p.bin.items.iter().map(|i| i.id.as_str()))
        .collect();
    let stranded = owned.difference(&placed).count();
    if stranded > 0 {
        return Err(YardError::UnassignedItems(stranded));
    }

    let mut mother = order;
    let mut children = Vec::with_capacity(plans.len());
    for (n, plan) in plans.into_iter().enumerate() {
        let items: Vec<LineItem> = plan
            .bin
            .items
            .into_iter()
            .map(|mut i| {
                i.status = LineItemStatus::Assigned;
                i
            })
            .collect();
        let mut child = DispatchOrder::new(
            format!("{}-C{}", mother.do_number, n + 1),
            mother.priority,
            mother.loading_point.clone(),
            mother.destination.clone(),
            plan.planned_dispatch_date.unwrap_or(mother.planned_dispatch_date),
            items,
        );
        child.max_vehicle_age = plan.max_vehicle_age.or(mother.max_vehicle_age);
        child.parent_do = Some(mother.id.clone());
        children.push(child);
    }

    mother.is_mother_do = true;
    mother.child_dos = children.iter().map(|c| c.id.clone()).collect();
    mother.line_items.clear();
    mother.recompute_totals();
    mother.status = OrderStatus::Assigned;

    tracing::info!(
        do_number = %mother.do_number,
        children = children.len(),
        "split dispatch order"
    );

    Ok(SplitOutcome { mother, children })
}

// ---------------------------------------------------------------------------
// Club
// ---------------------------------------------------------------------------

/// Merge two or more orders into one mother order carrying all their line
/// items. The mother takes the most urgent (lowest) input priority, the
/// routing of the first order, and lists the inputs as its children.
pub fn club_orders(do_number: impl Into<String>, orders: Vec<DispatchOrder>) -> Result<DispatchOrder> {
    if orders.len() < 2 {
        return Err(YardError::NotEnoughOrders);
    }

    let priority = orders.iter().map(|o| o.priority).min().unwrap_or(1);
    let dispatch_date = orders
        .iter()
        .map(|o| o.planned_dispatch_date)
        .min()
        .unwrap_or_else(chrono::Utc::now);
    let child_dos: Vec<String> = orders.iter().map(|o| o.id.clone()).collect();

    let first = &orders[0];
    let loading_point = first.loading_point.clone();
    let destination = first.destination.clone();

    let items: Vec<LineItem> = orders.into_iter().flat_map(|o| o.line_items).collect();

    let mut mother = DispatchOrder::new(
        do_number,
        priority,
        loading_point,
        destination,
        dispatch_date,
        items,
    );
    mother.is_mother_do = true;
    mother.child_dos = child_dos;

    tracing::info!(
        do_number = %mother.do_number,
        children = mother.child_dos.len(),
        total_weight = mother.total_weight,
        "clubbed dispatch orders"
    );

    Ok(mother)
}

// ---------------------------------------------------------------------------
// Compatibility checks
// ---------------------------------------------------------------------------

const HAZMAT_MARKERS: [&str; 3] = ["CHEM", "ACID", "FLAM"];

/// Advisory findings about a proposed club. None of these block the merge;
/// the operator sees them and decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "detail")]
pub enum CompatibilityIssue {
    MultipleLoadingPoints(Vec<String>),
    MultipleDestinations(Vec<String>),
    MultipleZones(Vec<String>),
    HazardousMaterials(Vec<String>),
    DispatchDatesSpread { days: i64 },
}

impl std::fmt::Display for CompatibilityIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MultipleLoadingPoints(names) => {
                write!(f, "orders load from different points: {}", names.join(", "))
            }
            Self::MultipleDestinations(cities) => {
                write!(f, "orders ship to different cities: {}", cities.join(", "))
            }
            Self::MultipleZones(zones) => {
                write!(f, "orders ship to different zones: {}", zones.join(", "))
            }
            Self::HazardousMaterials(codes) => {
                write!(f, "hazardous materials present: {}", codes.join(", "))
            }
            Self::DispatchDatesSpread { days } => {
                write!(f, "planned dispatch dates spread across {days} days")
            }
        }
    }
}

/// Inspect a set of orders for clubbing hazards, in a fixed report order:
/// loading points, destination cities, zones, hazardous materials, then
/// dispatch-date spread beyond two days.
pub fn check_compatibility(orders: &[DispatchOrder]) -> Vec<CompatibilityIssue> {
    let mut issues = Vec::new();

    // Keyed on the point id, not the display name: two points can share
    // a name.
    let points: BTreeMap<&str, &str> = orders
        .iter()
        .map(|o| (o.loading_point.id.as_str(), o.loading_point.name.as_str()))
        .collect();
    if points.len() > 1 {
        issues.push(CompatibilityIssue::MultipleLoadingPoints(
            points.into_values().map(String::from).collect(),
        ));
    }

    let cities: BTreeSet<&str> = orders.iter().map(|o| o.destination.city.as_str()).collect();
    if cities.len() > 1 {
        issues.push(CompatibilityIssue::MultipleDestinations(
            cities.into_iter().map(String::from).collect(),
        ));
    }

    let zones: BTreeSet<&str> = orders.iter().map(|o| o.destination.zone.as_str()).collect();
    if zones.len() > 1 {
        issues.push(CompatibilityIssue::MultipleZones(
            zones.into_iter().map(String::from).collect(),
        ));
    }

    let hazmat: BTreeSet<&str> = orders
        .iter()
        .flat_map(|o| o.line_items.iter())
        .filter(|i| HAZMAT_MARKERS.iter().any(|m| i.material_code.contains(m)))
        .map(|i| i.material_code.as_str())
        .collect();
    if !hazmat.is_empty() {
        issues.push(CompatibilityIssue::HazardousMaterials(
            hazmat.into_iter().map(String::from).collect(),
        ));
    }

    let dates: Vec<_> = orders.iter().map(|o| o.planned_dispatch_date).collect();
    if let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) {
        let span = *max - *min;
        if span > Duration::days(2) {
            issues.push(CompatibilityIssue::DispatchDatesSpread {
                days: span.num_days(),
            });
        }
    }

    issues
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
