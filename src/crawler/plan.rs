//! Download plan - every (type, kind, month) still missing on disk

use crate::crawler::config::OutputLayout;
use crate::crawler::types::{file_name, MonthWindow, PlanEntry, PropertyType, TransactionKind};
use std::collections::HashSet;

/// What the caller asked to crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub property_types: Vec<PropertyType>,
    pub include_rentals: bool,
}

impl Default for PlanRequest {
    fn default() -> Self {
        PlanRequest {
            property_types: PropertyType::ALL.to_vec(),
            include_rentals: true,
        }
    }
}

impl PlanRequest {
    /// Selected types in portal order, duplicates removed. Empty means all.
    pub fn selected_types(&self) -> Vec<PropertyType> {
        if self.property_types.is_empty() {
            return PropertyType::ALL.to_vec();
        }
        let mut types = self.property_types.clone();
        types.sort();
        types.dedup();
        types
    }
}

#[derive(Debug, Clone, Default)]
pub struct DownloadPlan {
    pub entries: Vec<PlanEntry>,
    /// Entries whose file is already on disk
    pub already_done: usize,
    /// Month windows the range was split into
    pub months: usize,
}

impl DownloadPlan {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in the plan including the already satisfied ones
    pub fn total(&self) -> usize {
        self.entries.len() + self.already_done
    }
}

/// Build the ordered plan: by property type, sale before rental, months ascending
pub fn build_plan(
    request: &PlanRequest,
    windows: &[MonthWindow],
    layout: &OutputLayout,
    existing: &HashSet<String>,
) -> DownloadPlan {
    let mut plan = DownloadPlan {
        months: windows.len(),
        ..DownloadPlan::default()
    };

    for property_type in request.selected_types() {
        let mut kinds = vec![TransactionKind::Sale];
        if request.include_rentals && property_type.supports_rentals() {
            kinds.push(TransactionKind::Rental);
        }

        for kind in kinds {
            let dir = layout.dir_for(kind);
            for window in windows {
                let name = file_name(property_type, kind, window);

                if existing.contains(&name) {
                    plan.already_done += 1;
                    continue;
                }

                plan.entries.push(PlanEntry {
                    property_type,
                    kind,
                    window: *window,
                    destination: dir.join(name),
                });
            }
        }
    }

    plan
}
