use crate::output;
use anyhow::{bail, Context};
use clap::Subcommand;
use dockyard_core::consolidation::{check_compatibility, club_orders, split_order};
use dockyard_core::order::DispatchOrder;
use dockyard_core::planner::{auto_pack, plan_loads, vehicle_type};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum OrdersSubcommand {
    /// Show the orders in a file
    List {
        #[arg(long)]
        file: PathBuf,
    },

    /// Pack an order's items into bins for a vehicle type (dry run)
    Pack {
        #[arg(long)]
        file: PathBuf,
        /// DO number of the order to pack
        #[arg(long)]
        order: String,
        #[arg(long = "vehicle")]
        vehicle_type: String,
    },

    /// Split an order into vehicle-sized children and write the file back
    Split {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        order: String,
        #[arg(long = "vehicle")]
        vehicle_type: String,
    },

    /// Club two or more orders into a mother order and write the file back
    Club {
        #[arg(long)]
        file: PathBuf,
        /// DO number for the new mother order
        #[arg(long)]
        do_number: String,
        /// DO numbers of the orders to merge
        orders: Vec<String>,
    },

    /// Report clubbing compatibility issues without merging
    Check {
        #[arg(long)]
        file: PathBuf,
        orders: Vec<String>,
    },
}

fn load_orders(path: &Path) -> anyhow::Result<Vec<DispatchOrder>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading orders file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn save_orders(path: &Path, orders: &[DispatchOrder]) -> anyhow::Result<()> {
    fs::write(path, serde_json::to_string_pretty(orders)?)
        .with_context(|| format!("writing orders file {}", path.display()))?;
    Ok(())
}

fn take_order(orders: &mut Vec<DispatchOrder>, do_number: &str) -> anyhow::Result<DispatchOrder> {
    let pos = orders
        .iter()
        .position(|o| o.do_number == do_number)
        .with_context(|| format!("no order with DO number {do_number}"))?;
    Ok(orders.remove(pos))
}

pub fn run(subcommand: OrdersSubcommand, json: bool) -> anyhow::Result<()> {
    match subcommand {
        OrdersSubcommand::List { file } => {
            let orders = load_orders(&file)?;
            if json {
                output::print_json(&orders)?;
            } else {
                let rows = orders
                    .iter()
                    .map(|o| {
                        vec![
                            o.do_number.clone(),
                            o.status.to_string(),
                            o.priority.to_string(),
                            o.destination.city.clone(),
                            format!("{} kg", o.total_weight),
                            o.line_items.len().to_string(),
                            if o.is_mother_do { "mother" } else { "" }.to_string(),
                        ]
                    })
                    .collect();
                output::print_table(
                    &["DO", "STATUS", "PRI", "CITY", "WEIGHT", "ITEMS", ""],
                    rows,
                );
            }
        }

        OrdersSubcommand::Pack {
            file,
            order,
            vehicle_type: vt,
        } => {
            let orders = load_orders(&file)?;
            let src = orders
                .iter()
                .find(|o| o.do_number == order)
                .with_context(|| format!("no order with DO number {order}"))?;
            let vt = vehicle_type(&vt)?;
            let outcome = auto_pack(src.line_items.clone(), &vt.profile(), "Vehicle");
            if json {
                output::print_json(&outcome.bins)?;
            } else {
                for bin in &outcome.bins {
                    println!(
                        "{}: {} items, {} kg, {} units",
                        bin.label,
                        bin.items.len(),
                        bin.total_weight,
                        bin.total_quantity
                    );
                }
            }
            if !outcome.unassigned.is_empty() {
                println!("{} items fit no vehicle", outcome.unassigned.len());
            }
        }

        OrdersSubcommand::Split {
            file,
            order,
            vehicle_type: vt,
        } => {
            let mut orders = load_orders(&file)?;
            let src = take_order(&mut orders, &order)?;
            let vt = vehicle_type(&vt)?;
            let planned = plan_loads(
                src.line_items.clone(),
                &vt,
                src.planned_dispatch_date,
                src.max_vehicle_age,
            );
            if !planned.unassigned.is_empty() {
                bail!(
                    "{} items exceed the {} capacity; pick a larger vehicle",
                    planned.unassigned.len(),
                    vt.name
                );
            }
            let outcome = split_order(src, planned.plans)?;
            println!(
                "split {} into {} child orders",
                outcome.mother.do_number,
                outcome.children.len()
            );
            orders.push(outcome.mother);
            orders.extend(outcome.children);
            save_orders(&file, &orders)?;
        }

        OrdersSubcommand::Club {
            file,
            do_number,
            orders: picked,
        } => {
            let mut orders = load_orders(&file)?;
            let mut inputs = Vec::with_capacity(picked.len());
            for number in &picked {
                inputs.push(take_order(&mut orders, number)?);
            }
            let issues = check_compatibility(&inputs);
            for issue in &issues {
                tracing::warn!(%issue, "clubbing compatibility issue");
                eprintln!("warning: {issue}");
            }
            let mother = club_orders(do_number, inputs)?;
            println!(
                "clubbed {} orders into {} ({} kg)",
                mother.child_dos.len(),
                mother.do_number,
                mother.total_weight
            );
            orders.push(mother);
            save_orders(&file, &orders)?;
        }

        OrdersSubcommand::Check {
            file,
            orders: picked,
        } => {
            let orders = load_orders(&file)?;
            let selected: Vec<DispatchOrder> = orders
                .into_iter()
                .filter(|o| picked.contains(&o.do_number))
                .collect();
            if selected.len() < picked.len() {
                bail!("one or more DO numbers not found in {}", file.display());
            }
            let issues = check_compatibility(&selected);
            if json {
                output::print_json(&issues)?;
            } else if issues.is_empty() {
                println!("compatible");
            } else {
                for issue in &issues {
                    println!("{issue}");
                }
            }
        }
    }

    Ok(())
}
