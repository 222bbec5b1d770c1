//! Capacity planner: partitions line items into vehicle-sized bins under
//! weight and quantity budgets. Reused by dispatch-order splitting and by
//! vehicle-load planning; only the profile source and bin labels differ.
//!
//! The auto mode is a first-fit-decreasing-style heuristic, not an optimal
//! bin-count solver. Items are never split across bins and never duplicated;
//! anything that fits nowhere is surfaced as unassigned rather than dropped.

use crate::error::{Result, YardError};
use crate::order::LineItem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// CapacityProfile / VehicleType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProfile {
    /// Kilograms.
    pub max_weight: u32,
    /// Units.
    pub max_quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleType {
    pub id: String,
    pub name: String,
    pub capacity: u32,
    pub max_weight: u32,
}

impl VehicleType {
    fn new(id: &str, name: &str, capacity: u32, max_weight: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            capacity,
            max_weight,
        }
    }

    pub fn profile(&self) -> CapacityProfile {
        CapacityProfile {
            max_weight: self.max_weight,
            max_quantity: self.capacity,
        }
    }
}

/// The built-in fleet catalog.
pub fn vehicle_types() -> Vec<VehicleType> {
    vec![
        VehicleType::new("truck-10t", "10 Ton Truck", 100, 10_000),
        VehicleType::new("truck-16t", "16 Ton Truck", 160, 16_000),
        VehicleType::new("truck-25t", "25 Ton Truck", 250, 25_000),
        VehicleType::new("trailer-32t", "32 Ton Trailer", 320, 32_000),
        VehicleType::new("container-20ft", "20ft Container", 200, 20_000),
        VehicleType::new("container-40ft", "40ft Container", 400, 30_000),
    ]
}

pub fn vehicle_type(id: &str) -> Result<VehicleType> {
    vehicle_types()
        .into_iter()
        .find(|v| v.id == id)
        .ok_or_else(|| YardError::UnknownVehicleType(id.to_string()))
}

// ---------------------------------------------------------------------------
// Bin
// ---------------------------------------------------------------------------

/// One capacity-bounded bin (a vehicle plan or a child order in the making).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bin {
    pub label: String,
    pub items: Vec<LineItem>,
    pub total_weight: u32,
    pub total_quantity: u32,
}

impl Bin {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
            total_weight: 0,
            total_quantity: 0,
        }
    }

    fn push(&mut self, item: LineItem) {
        self.total_weight += item.weight;
        self.total_quantity += item.quantity;
        self.items.push(item);
    }
}

/// Single-item admission check for manual (drag/drop style) assignment.
/// Rejection carries the offending limits; the item stays where it was.
pub fn can_admit(bin: &Bin, item: &LineItem, profile: &CapacityProfile) -> Result<()> {
    let weight = bin.total_weight + item.weight;
    let quantity = bin.total_quantity + item.quantity;
    if weight > profile.max_weight || quantity > profile.max_quantity {
        return Err(YardError::CapacityExceeded {
            max_weight: profile.max_weight,
            max_quantity: profile.max_quantity,
        });
    }
    Ok(())
}

/// Admit an item into a bin, enforcing the capacity guard.
pub fn admit(bin: &mut Bin, item: LineItem, profile: &CapacityProfile) -> Result<()> {
    can_admit(bin, &item, profile)?;
    bin.push(item);
    Ok(())
}

/// Remove an item from a bin, handing it back to the caller (normally to be
/// returned to the unassigned pool).
pub fn release(bin: &mut Bin, item_id: &str) -> Option<LineItem> {
    let pos = bin.items.iter().position(|i| i.id == item_id)?;
    let item = bin.items.remove(pos);
    bin.total_weight -= item.weight;
    bin.total_quantity -= item.quantity;
    Some(item)
}

// ---------------------------------------------------------------------------
// VehiclePlan
// ---------------------------------------------------------------------------

/// A bin dressed for dispatch: which vehicle carries it and when it ships.
/// Splitting an order into children confirms one plan per child, and a plan
/// missing any of these is refused at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePlan {
    pub id: String,
    pub bin: Bin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<VehicleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_dispatch_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vehicle_age: Option<u32>,
}

impl VehiclePlan {
    pub fn new(bin: Bin) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            bin,
            vehicle_type: None,
            planned_dispatch_date: None,
            max_vehicle_age: None,
        }
    }

    /// Ready to confirm? Needs items, a vehicle and a dispatch date.
    pub fn validate(&self) -> Result<()> {
        let incomplete = |reason: &str| YardError::IncompleteBin {
            bin: self.bin.label.clone(),
            reason: reason.to_string(),
        };
        if self.bin.items.is_empty() {
            return Err(incomplete("no items assigned"));
        }
        if self.vehicle_type.is_none() {
            return Err(incomplete("no vehicle type selected"));
        }
        if self.planned_dispatch_date.is_none() {
            return Err(incomplete("no dispatch date set"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plans: Vec<VehiclePlan>,
    pub unassigned: Vec<LineItem>,
}

/// Auto-pack `items` for one vehicle type and dress each bin as a complete
/// plan shipping on `dispatch_date`.
pub fn plan_loads(
    items: Vec<LineItem>,
    vehicle_type: &VehicleType,
    dispatch_date: DateTime<Utc>,
    max_vehicle_age: Option<u32>,
) -> PlanOutcome {
    let packed = auto_pack(items, &vehicle_type.profile(), "Vehicle");
    let plans = packed
        .bins
        .into_iter()
        .map(|bin| VehiclePlan {
            id: Uuid::new_v4().to_string(),
            bin,
            vehicle_type: Some(vehicle_type.clone()),
            planned_dispatch_date: Some(dispatch_date),
            max_vehicle_age,
        })
        .collect();
    PlanOutcome {
        plans,
        unassigned: packed.unassigned,
    }
}

// ---------------------------------------------------------------------------
// Auto packing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PackOutcome {
    pub bins: Vec<Bin>,
    /// Items no open bin could take. Surfaced to the operator, never dropped.
    pub unassigned: Vec<LineItem>,
}

/// Partition `items` into capacity-bounded bins.
///
/// The working copy is sorted priority-ascending then weight-descending so
/// the most urgent, most constrained items place first. Each new bin scans
/// the remaining items from the tail of that ordering forward, greedily
/// admitting whatever still fits both budgets. Packing stops once a fresh
/// bin admits zero items, which bounds the loop when an item exceeds the
/// profile outright.
pub fn auto_pack(items: Vec<LineItem>, profile: &CapacityProfile, label_prefix: &str) -> PackOutcome {
    let mut remaining = items;
    remaining.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| b.weight.cmp(&a.weight))
    });

    let mut bins = Vec::new();
    let mut index = 1usize;
    while !remaining.is_empty() {
        let mut bin = Bin::new(format!("{label_prefix} {index}"));
        let mut i = remaining.len();
        while i > 0 {
            i -= 1;
            let fits = bin.total_weight + remaining[i].weight <= profile.max_weight
                && bin.total_quantity + remaining[i].quantity <= profile.max_quantity;
            if fits {
                bin.push(remaining.remove(i));
            }
        }
        if bin.items.is_empty() {
            break;
        }
        bins.push(bin);
        index += 1;
    }

    tracing::debug!(
        bins = bins.len(),
        unassigned = remaining.len(),
        max_weight = profile.max_weight,
        max_quantity = profile.max_quantity,
        "auto pack finished"
    );

    PackOutcome {
        bins,
        unassigned: remaining,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn item(batch: &str, quantity: u32, weight: u32, priority: u32) -> LineItem {
        LineItem::new(batch, "MS-PLATE-10", "MS Plate 10mm", quantity, weight, priority)
    }

    fn profile(max_weight: u32, max_quantity: u32) -> CapacityProfile {
        CapacityProfile {
            max_weight,
            max_quantity,
        }
    }

    #[test]
    fn two_heavy_items_need_two_bins() {
        // 2 x 1250 kg against a 2000 kg budget: one item per bin.
        let items = vec![item("B-001", 10, 1_250, 1), item("B-002", 10, 1_250, 1)];
        let outcome = auto_pack(items, &profile(2_000, 100), "Plan");
        assert_eq!(outcome.bins.len(), 2);
        assert!(outcome.unassigned.is_empty());
        for bin in &outcome.bins {
            assert_eq!(bin.items.len(), 1);
            assert_eq!(bin.total_weight, 1_250);
        }
    }

    #[test]
    fn conservation_across_bins_and_unassigned() {
        let items = vec![
            item("B-001", 40, 9_000, 1),
            item("B-002", 30, 6_000, 2),
            item("B-003", 20, 5_000, 1),
            item("B-004", 200, 500, 3), // quantity-bound
            item("B-005", 10, 12_000, 2), // exceeds max weight outright
        ];
        let input_weight: u32 = items.iter().map(|i| i.weight).sum();
        let mut input_ids: Vec<_> = items.iter().map(|i| i.id.clone()).collect();
        input_ids.sort();

        let outcome = auto_pack(items, &profile(10_000, 100), "Plan");

        let packed_weight: u32 = outcome.bins.iter().map(|b| b.total_weight).sum();
        let leftover_weight: u32 = outcome.unassigned.iter().map(|i| i.weight).sum();
        assert_eq!(packed_weight + leftover_weight, input_weight);

        let mut output_ids: Vec<_> = outcome
            .bins
            .iter()
            .flat_map(|b| b.items.iter().map(|i| i.id.clone()))
            .chain(outcome.unassigned.iter().map(|i| i.id.clone()))
            .collect();
        output_ids.sort();
        assert_eq!(input_ids, output_ids);
    }

    #[test]
    fn every_bin_respects_both_budgets() {
        let items: Vec<_> = (0..30)
            .map(|n| item(&format!("B-{n:03}"), 7 + n % 5, 900 + 137 * n, 1 + n % 3))
            .collect();
        let p = profile(5_000, 25);
        let outcome = auto_pack(items, &p, "Plan");
        assert!(!outcome.bins.is_empty());
        for bin in &outcome.bins {
            assert!(bin.total_weight <= p.max_weight);
            assert!(bin.total_quantity <= p.max_quantity);
            assert_eq!(bin.total_weight, bin.items.iter().map(|i| i.weight).sum::<u32>());
        }
    }

    #[test]
    fn oversized_item_becomes_unassigned_not_a_loop() {
        let items = vec![item("B-001", 10, 50_000, 1)];
        let outcome = auto_pack(items, &profile(10_000, 100), "Plan");
        assert!(outcome.bins.is_empty());
        assert_eq!(outcome.unassigned.len(), 1);
    }

    #[test]
    fn contested_budget_spills_the_list_head_into_the_next_bin() {
        // The fill scan walks the priority-sorted list from its tail, so
        // when two same-weight items contest one bin the tail item takes
        // the slot and the head rolls over into a fresh bin. Nothing is
        // ever dropped on the way.
        let items = vec![item("B-LOW", 10, 8_000, 5), item("B-URGENT", 10, 8_000, 1)];
        let outcome = auto_pack(items, &profile(10_000, 100), "Plan");
        assert_eq!(outcome.bins.len(), 2);
        assert_eq!(outcome.bins[0].items[0].batch_number, "B-LOW");
        assert_eq!(outcome.bins[1].items[0].batch_number, "B-URGENT");
        assert!(outcome.unassigned.is_empty());
    }

    #[test]
    fn manual_admit_enforces_capacity() {
        let p = profile(10_000, 100);
        let mut bin = Bin::new("Plan 1");
        admit(&mut bin, item("B-001", 50, 6_000, 1), &p).unwrap();

        let err = admit(&mut bin, item("B-002", 10, 5_000, 1), &p).unwrap_err();
        match err {
            YardError::CapacityExceeded {
                max_weight,
                max_quantity,
            } => {
                assert_eq!(max_weight, 10_000);
                assert_eq!(max_quantity, 100);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The rejected item did not land in the bin.
        assert_eq!(bin.items.len(), 1);
        assert_eq!(bin.total_weight, 6_000);
    }

    #[test]
    fn release_returns_item_and_restores_budget() {
        let p = profile(10_000, 100);
        let mut bin = Bin::new("Plan 1");
        let it = item("B-001", 50, 6_000, 1);
        let id = it.id.clone();
        admit(&mut bin, it, &p).unwrap();

        let released = release(&mut bin, &id).unwrap();
        assert_eq!(released.id, id);
        assert_eq!(bin.total_weight, 0);
        assert_eq!(bin.total_quantity, 0);
        assert!(release(&mut bin, &id).is_none());
    }

    #[test]
    fn plan_loads_dresses_every_bin() {
        let vt = vehicle_type("truck-10t").unwrap();
        let date = chrono::Utc::now();
        let items = vec![item("B-001", 60, 8_000, 1), item("B-002", 50, 7_000, 1)];
        let outcome = plan_loads(items, &vt, date, Some(10));
        assert_eq!(outcome.plans.len(), 2);
        for plan in &outcome.plans {
            plan.validate().unwrap();
            assert_eq!(plan.planned_dispatch_date, Some(date));
            assert_eq!(plan.max_vehicle_age, Some(10));
        }
    }

    #[test]
    fn incomplete_plans_are_refused_with_the_missing_piece() {
        let p = profile(10_000, 100);
        let empty = VehiclePlan::new(Bin::new("Vehicle 1"));
        match empty.validate().unwrap_err() {
            YardError::IncompleteBin { bin, reason } => {
                assert_eq!(bin, "Vehicle 1");
                assert!(reason.contains("items"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut bin = Bin::new("Vehicle 1");
        admit(&mut bin, item("B-001", 10, 1_000, 1), &p).unwrap();
        let mut plan = VehiclePlan::new(bin);
        match plan.validate().unwrap_err() {
            YardError::IncompleteBin { reason, .. } => assert!(reason.contains("vehicle type")),
            other => panic!("unexpected error: {other}"),
        }

        plan.vehicle_type = Some(vehicle_type("truck-10t").unwrap());
        match plan.validate().unwrap_err() {
            YardError::IncompleteBin { reason, .. } => assert!(reason.contains("dispatch date")),
            other => panic!("unexpected error: {other}"),
        }

        plan.planned_dispatch_date = Some(chrono::Utc::now());
        plan.validate().unwrap();
    }

    #[test]
    fn vehicle_type_catalog_lookup() {
        let vt = vehicle_type("truck-10t").unwrap();
        assert_eq!(vt.profile().max_weight, 10_000);
        assert_eq!(vt.profile().max_quantity, 100);
        assert_eq!(vehicle_types().len(), 6);
        assert!(vehicle_type("hovercraft").is_err());
    }
}
