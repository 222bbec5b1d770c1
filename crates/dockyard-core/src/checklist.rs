//! Loading checklist consumed at the dock before a vehicle may leave
//! `loading-in-dock`. The journey only gates on the required items; optional
//! items are recorded for audit but never block the transition.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const CHECKLIST_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ChecklistCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecklistCategory {
    Safety,
    Vehicle,
    Material,
    Equipment,
    Documentation,
    Final,
}

impl ChecklistCategory {
    pub fn all() -> &'static [ChecklistCategory] {
        &[
            ChecklistCategory::Safety,
            ChecklistCategory::Vehicle,
            ChecklistCategory::Material,
            ChecklistCategory::Equipment,
            ChecklistCategory::Documentation,
            ChecklistCategory::Final,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChecklistCategory::Safety => "safety",
            ChecklistCategory::Vehicle => "vehicle",
            ChecklistCategory::Material => "material",
            ChecklistCategory::Equipment => "equipment",
            ChecklistCategory::Documentation => "documentation",
            ChecklistCategory::Final => "final",
        }
    }
}

impl fmt::Display for ChecklistCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ChecklistItem / LoadingChecklist
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub category: ChecklistCategory,
    pub item: String,
    pub completed: bool,
    pub required: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistStats {
    pub required_total: usize,
    pub required_completed: usize,
    pub optional_total: usize,
    pub optional_completed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingChecklist {
    pub version: u32,
    pub items: Vec<ChecklistItem>,
}

impl LoadingChecklist {
    /// The standard steel-loading template: 24 items across six categories,
    /// 16 of them required.
    pub fn standard() -> Self {
        use ChecklistCategory::*;
        let template: &[(&str, ChecklistCategory, &str, bool)] = &[
            ("safety-1", Safety, "PPE verification - hard hat, safety shoes, reflective vest", true),
            ("safety-2", Safety, "Emergency stop systems check", true),
            ("safety-3", Safety, "Fire safety equipment inspection", true),
            ("safety-4", Safety, "Crane operator certification verification", false),
            ("vehicle-1", Vehicle, "Truck bed / trailer condition inspection", true),
            ("vehicle-2", Vehicle, "Vehicle structural integrity check", true),
            ("vehicle-3", Vehicle, "Tie-down points and securing equipment check", true),
            ("vehicle-4", Vehicle, "Weight distribution capability verification", false),
            ("material-1", Material, "Steel product quality verification", true),
            ("material-2", Material, "Material grade and specification confirmation", true),
            ("material-3", Material, "Quantity count verification", true),
            ("material-4", Material, "Surface treatment / coating inspection", false),
            ("equipment-1", Equipment, "Crane / lifting equipment safety check", true),
            ("equipment-2", Equipment, "Lifting capacity vs load weight verification", true),
            ("equipment-3", Equipment, "Sling / rigging equipment inspection", false),
            ("equipment-4", Equipment, "Forklift operational check", false),
            ("doc-1", Documentation, "Bill of lading verification", true),
            ("doc-2", Documentation, "Material test certificates check", true),
            ("doc-3", Documentation, "Loading instructions review", false),
            ("doc-4", Documentation, "Transport permit verification", false),
            ("final-1", Final, "Load securing and tie-down completion", true),
            ("final-2", Final, "Load distribution and balance check", true),
            ("final-3", Final, "Vehicle weight limit compliance", true),
            ("final-4", Final, "Final visual inspection of loaded vehicle", false),
        ];

        let items = template
            .iter()
            .map(|&(id, category, item, required)| ChecklistItem {
                id: id.to_string(),
                category,
                item: item.to_string(),
                completed: false,
                required,
            })
            .collect();

        Self {
            version: CHECKLIST_VERSION,
            items,
        }
    }

    /// Mark an item complete/incomplete. Returns false if the id is unknown.
    pub fn set_completed(&mut self, id: &str, completed: bool) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.completed = completed;
                true
            }
            None => false,
        }
    }

    /// Mark every required item complete. Operator shortcut used by tests and
    /// the CLI simulation.
    pub fn complete_required(&mut self) {
        for item in self.items.iter_mut().filter(|i| i.required) {
            item.completed = true;
        }
    }

    /// The gating signal: every required item is checked.
    pub fn required_complete(&self) -> bool {
        self.items.iter().filter(|i| i.required).all(|i| i.completed)
    }

    pub fn stats(&self) -> ChecklistStats {
        let (required, optional): (Vec<_>, Vec<_>) = self.items.iter().partition(|i| i.required);
        ChecklistStats {
            required_total: required.len(),
            required_completed: required.iter().filter(|i| i.completed).count(),
            optional_total: optional.len(),
            optional_completed: optional.iter().filter(|i| i.completed).count(),
        }
    }

    pub fn items_in(&self, category: ChecklistCategory) -> impl Iterator<Item = &ChecklistItem> {
        self.items.iter().filter(move |i| i.category == category)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
