use crate::output;
use clap::Subcommand;
use dockyard_core::dock::DockPool;
use dockyard_core::entry::{DriverInfo, Route, VehicleEntry};
use dockyard_core::journey::GateProcess;
use dockyard_core::sensor::{SimulatedPlateScanner, SimulatedWeighbridge};
use dockyard_core::store::EntryStore;
use std::path::Path;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum EntrySubcommand {
    /// Register a planned trip (status: not-started)
    Register {
        #[arg(long)]
        load_number: String,
        #[arg(long)]
        trip_uid: String,
        #[arg(long)]
        driver: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        transporter: String,
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
    },

    /// List all entries
    List,

    /// Show one entry in full
    Show { id: String },

    /// Follow store mutations as they happen (Ctrl-C to stop)
    Watch,

    /// Admit the vehicle at the gate, reading its plate
    GateIn {
        id: String,
        /// Plate fed to the gate scanner
        #[arg(long)]
        plate: String,
    },

    /// Print a gate pass for an admitted vehicle
    Pass { id: String },

    /// Capture the empty weight from the weighbridge
    Tare {
        id: String,
        /// Reading fed to the weighbridge, in kg
        #[arg(long)]
        weight: u32,
    },

    /// Assign a dock and open the loading checklist
    Dock {
        id: String,
        #[arg(long)]
        incharge: String,
    },

    /// Tick (or with --clear, untick) a checklist item
    Check {
        id: String,
        item: String,
        #[arg(long)]
        clear: bool,
    },

    /// Declare loading complete (requires the checklist)
    LoadDone { id: String },

    /// Capture the loaded weight from the weighbridge
    Gross {
        id: String,
        #[arg(long)]
        weight: u32,
    },

    /// Send the vehicle out of the gate
    GateOut { id: String },

    /// Close the entry
    Complete { id: String },

    /// Turn the vehicle away
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },

    /// Cancel the entry
    Cancel { id: String },
}

/// Build a gate process whose sensors will report exactly the values the
/// operator typed. Real deployments swap these for the device drivers.
fn process(store: Arc<EntryStore>, plate: Option<&str>, weight: Option<u32>) -> GateProcess {
    GateProcess::new(
        store,
        DockPool::standard(),
        Arc::new(SimulatedPlateScanner::new(plate.into_iter())),
        Arc::new(SimulatedWeighbridge::new(weight)),
    )
}

fn current_version(store: &EntryStore, id: &str) -> anyhow::Result<u64> {
    Ok(store.get(id)?.version)
}

pub async fn run(store_path: &Path, subcommand: EntrySubcommand, json: bool) -> anyhow::Result<()> {
    let store = Arc::new(EntryStore::open(store_path)?);

    match subcommand {
        EntrySubcommand::Register {
            load_number,
            trip_uid,
            driver,
            phone,
            transporter,
            origin,
            destination,
        } => {
            let p = process(store, None, None);
            let entry = p.register(
                load_number,
                trip_uid,
                DriverInfo {
                    name: driver,
                    phone,
                    license_number: None,
                    verified: false,
                },
                transporter,
                Route {
                    origin,
                    destination,
                    origin_code: String::new(),
                    destination_code: String::new(),
                },
            )?;
            print_entry(&entry, json)?;
        }

        EntrySubcommand::List => {
            let entries = store.list();
            if json {
                output::print_json(&entries)?;
            } else {
                let rows = entries
                    .iter()
                    .map(|e| {
                        vec![
                            e.id.clone(),
                            e.vehicle_number.clone(),
                            e.load_number.clone(),
                            e.status.to_string(),
                            e.assigned_dock
                                .as_ref()
                                .map(|d| d.to_string())
                                .unwrap_or_default(),
                        ]
                    })
                    .collect();
                output::print_table(&["ID", "VEHICLE", "LOAD", "STATUS", "DOCK"], rows);
            }
        }

        EntrySubcommand::Show { id } => {
            let entry = store.get(&id)?;
            output::print_json(&entry)?;
        }

        EntrySubcommand::Watch => {
            let mut rx = store.subscribe();
            loop {
                let event = rx.recv().await?;
                let entry = store.get(event.entry_id())?;
                println!(
                    "{}  {}  {}  v{}",
                    entry.updated_at.format("%H:%M:%S"),
                    entry.id,
                    entry.status,
                    entry.version
                );
            }
        }

        EntrySubcommand::GateIn { id, plate } => {
            let version = current_version(&store, &id)?;
            let p = process(store, Some(&plate), None);
            print_entry(&p.gate_in(&id, version).await?, json)?;
        }

        EntrySubcommand::Pass { id } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            let entry = p.generate_pass(&id, version)?;
            if let Some(pass) = &entry.gate_pass_number {
                println!("gate pass: {pass}");
            }
            print_entry(&entry, json)?;
        }

        EntrySubcommand::Tare { id, weight } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, Some(weight));
            print_entry(&p.capture_tare(&id, version).await?, json)?;
        }

        EntrySubcommand::Dock { id, incharge } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            let entry = p.start_loading(&id, version, &incharge)?;
            if let Some(dock) = &entry.assigned_dock {
                println!("assigned {dock}");
            }
            print_entry(&entry, json)?;
        }

        EntrySubcommand::Check { id, item, clear } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            let entry = p.set_checklist_item(&id, version, &item, !clear)?;
            if let Some(checklist) = &entry.checklist {
                let stats = checklist.stats();
                println!(
                    "required {}/{}  optional {}/{}",
                    stats.required_completed,
                    stats.required_total,
                    stats.optional_completed,
                    stats.optional_total
                );
            }
        }

        EntrySubcommand::LoadDone { id } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            print_entry(&p.complete_loading(&id, version)?, json)?;
        }

        EntrySubcommand::Gross { id, weight } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, Some(weight));
            let entry = p.capture_gross(&id, version).await?;
            if let Some(net) = entry.net_weight() {
                println!("net weight: {net} kg");
            }
            print_entry(&entry, json)?;
        }

        EntrySubcommand::GateOut { id } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            print_entry(&p.gate_out(&id, version)?, json)?;
        }

        EntrySubcommand::Complete { id } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            print_entry(&p.complete(&id, version)?, json)?;
        }

        EntrySubcommand::Reject { id, reason } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            print_entry(&p.reject(&id, version, &reason)?, json)?;
        }

        EntrySubcommand::Cancel { id } => {
            let version = current_version(&store, &id)?;
            let p = process(store, None, None);
            print_entry(&p.cancel(&id, version)?, json)?;
        }
    }

    Ok(())
}

fn print_entry(entry: &VehicleEntry, json: bool) -> anyhow::Result<()> {
    if json {
        output::print_json(entry)
    } else {
        println!("{}  {}  {}", entry.id, entry.status, entry.load_number);
        Ok(())
    }
}
