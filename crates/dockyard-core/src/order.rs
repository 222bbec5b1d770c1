use crate::types::{LineItemStatus, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// LineItem
// ---------------------------------------------------------------------------

/// One batch of material. A line item is owned by exactly one dispatch order
/// (or one bin after partitioning) at a time and is never fragmented.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub batch_number: String,
    pub material_code: String,
    pub material_description: String,
    pub quantity: u32,
    /// Kilograms.
    pub weight: u32,
    pub unit: String,
    /// Lower value = more urgent.
    pub priority: u32,
    pub status: LineItemStatus,
}

impl LineItem {
    pub fn new(
        batch_number: impl Into<String>,
        material_code: impl Into<String>,
        material_description: impl Into<String>,
        quantity: u32,
        weight: u32,
        priority: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            batch_number: batch_number.into(),
            material_code: material_code.into(),
            material_description: material_description.into(),
            quantity,
            weight,
            unit: "MT".to_string(),
            priority,
            status: LineItemStatus::Ready,
        }
    }
}

// ---------------------------------------------------------------------------
// LoadingPoint / Destination
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingPoint {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub city: String,
    pub zone: String,
}

// ---------------------------------------------------------------------------
// DispatchOrder
// ---------------------------------------------------------------------------

/// An outbound freight order. `total_weight`/`total_quantity` are derived
/// sums over the current line items and are recomputed on every mutation.
/// Orders form a strict two-level tree: a mother order lists its children,
/// a child never has children of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrder {
    pub id: String,
    pub do_number: String,
    pub status: OrderStatus,
    pub priority: u32,
    pub loading_point: LoadingPoint,
    pub destination: Destination,
    pub total_weight: u32,
    pub total_quantity: u32,
    pub line_items: Vec<LineItem>,
    pub planned_dispatch_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_vehicle_age: Option<u32>,
    pub is_mother_do: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_dos: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_do: Option<String>,
}

impl DispatchOrder {
    pub fn new(
        do_number: impl Into<String>,
        priority: u32,
        loading_point: LoadingPoint,
        destination: Destination,
        planned_dispatch_date: DateTime<Utc>,
        line_items: Vec<LineItem>,
    ) -> Self {
        let mut order = Self {
            id: Uuid::new_v4().to_string(),
            do_number: do_number.into(),
            status: OrderStatus::Ready,
            priority,
            loading_point,
            destination,
            total_weight: 0,
            total_quantity: 0,
            line_items,
            planned_dispatch_date,
            max_vehicle_age: None,
            is_mother_do: false,
            child_dos: Vec::new(),
            parent_do: None,
        };
        order.recompute_totals();
        order
    }

    /// Re-derive the aggregate totals from the current line items.
    pub fn recompute_totals(&mut self) {
        self.total_weight = self.line_items.iter().map(|i| i.weight).sum();
        self.total_quantity = self.line_items.iter().map(|i| i.quantity).sum();
    }

    pub fn has_children(&self) -> bool {
        !self.child_dos.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
