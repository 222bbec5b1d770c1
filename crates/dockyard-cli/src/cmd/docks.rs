use crate::output;
use dockyard_core::dock::DockPool;
use dockyard_core::planner::vehicle_types;
use dockyard_core::store::EntryStore;
use std::path::Path;

pub fn run(store_path: &Path, json: bool) -> anyhow::Result<()> {
    let store = EntryStore::open(store_path)?;
    let entries = store.list();
    let pool = DockPool::standard();
    let occupied = pool.occupied(&entries);

    if json {
        let rows: Vec<serde_json::Value> = pool
            .docks()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "dock": d.as_str(),
                    "occupied": occupied.contains(d),
                })
            })
            .collect();
        output::print_json(&rows)?;
        return Ok(());
    }

    let rows = pool
        .docks()
        .iter()
        .map(|d| {
            let holder = entries
                .iter()
                .find(|e| e.status.occupies_dock() && e.assigned_dock.as_ref() == Some(d));
            vec![
                d.to_string(),
                if occupied.contains(d) { "occupied" } else { "free" }.to_string(),
                holder.map(|e| e.vehicle_number.clone()).unwrap_or_default(),
            ]
        })
        .collect();
    output::print_table(&["DOCK", "STATE", "VEHICLE"], rows);
    Ok(())
}

pub fn run_types(json: bool) -> anyhow::Result<()> {
    let types = vehicle_types();
    if json {
        output::print_json(&types)?;
        return Ok(());
    }
    let rows = types
        .iter()
        .map(|t| {
            vec![
                t.id.clone(),
                t.name.clone(),
                format!("{} units", t.capacity),
                format!("{} kg", t.max_weight),
            ]
        })
        .collect();
    output::print_table(&["ID", "NAME", "CAPACITY", "MAX WEIGHT"], rows);
    Ok(())
}
