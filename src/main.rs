// Entry point and high-level CLI flow.
//
// The pipeline runs in two stages:
// - Option [1] extracts the four source snapshots, normalizes the country
//   keys, merges and reconciles them, imputes the gaps and materializes the
//   integrated table.
// - Option [2] reshapes the integrated table into the star-schema warehouse,
//   persists the four relations and prints the analytical reports.
// - After building the warehouse, the user can choose to go back to the
//   stage menu or exit.
mod config;
mod error;
mod impute;
mod merge;
mod normalize;
mod output;
mod reconcile;
mod reports;
mod sources;
mod types;
mod util;
mod warehouse;

use chrono::Local;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;

use config::PipelineConfig;
use types::CleanTable;

// Simple in-memory app state so we only integrate the sources once but can
// rebuild the warehouse multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<CleanTable>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the stage menu after a warehouse
/// build. Returns `true` for `Y`, `false` for `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Stage Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: integrate the source snapshots.
///
/// On success, the cleaned table is stored in `APP_STATE` and materialized
/// as `datos_integrados.csv`, and a short summary is printed.
fn handle_integrate() {
    let config = PipelineConfig::default();

    let (aging, population, big_mac, tourist, extract_report) =
        match sources::extract_sources(&config) {
            Ok(loaded) => loaded,
            Err(e) => {
                // A missing source aborts the run before anything is written.
                eprintln!("Failed to read sources: {}\n", e);
                return;
            }
        };

    println!(
        "Extracted {} aging rows, {} population rows, {} big mac docs, {} tourist cost docs.",
        util::format_int(extract_report.aging_rows as i64),
        util::format_int(extract_report.population_rows as i64),
        util::format_int(extract_report.big_mac_docs as i64),
        util::format_int(extract_report.tourist_docs as i64)
    );
    if extract_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            util::format_int(extract_report.parse_errors as i64)
        );
    }
    for warning in &extract_report.warnings {
        println!("Warning: {}", warning);
    }

    let (merged, merge_report) = merge::merge_sources(aging, population, big_mac, tourist);
    println!(
        "Distinct keys per source: {} aging, {} population, {} big mac, {} tourist.",
        util::format_int(merge_report.aging_keys as i64),
        util::format_int(merge_report.population_keys as i64),
        util::format_int(merge_report.big_mac_keys as i64),
        util::format_int(merge_report.tourist_keys as i64)
    );
    println!(
        "Merged into {} distinct countries ({} duplicate source keys collapsed).",
        util::format_int(merge_report.merged_total as i64),
        util::format_int(merge_report.duplicate_keys as i64)
    );

    let integrated = reconcile::reconcile(merged);
    println!(
        "Reconciled table has {} fixed columns and {} itemized cost columns.",
        types::FIXED_COLUMNS.len(),
        integrated.cost_columns.len()
    );

    let clean = impute::impute(integrated);

    if let Err(e) = output::write_integrated_csv(&config.integrated_csv, &clean) {
        // The integrated table is the hand-off artifact; without it the run
        // stops here.
        let err = error::PipelineError::LoadFailure {
            path: config.integrated_csv.display().to_string(),
            detail: e.to_string(),
        };
        eprintln!("{}\n", err);
        return;
    }
    println!(
        "Integrated table exported to {} ({} rows).\n",
        config.integrated_csv.display(),
        util::format_int(clean.records.len() as i64)
    );

    reports::print_integration_stats(&clean);
    println!("");

    let mut state = APP_STATE.lock().unwrap();
    state.data = Some(clean);
}

/// Handle option [2]: build the warehouse, persist the four relations and
/// print the analytical reports.
fn handle_build_warehouse() {
    let data = {
        let state = APP_STATE.lock().unwrap();
        state.data.clone()
    };
    let Some(table) = data else {
        println!("Error: No integrated data. Please run the integration first (option 1).\n");
        return;
    };

    let config = PipelineConfig::default();
    let load_date = Local::now().date_naive();

    println!("Building data warehouse (load date {})...", load_date);
    let wh = match warehouse::build(&table.records, load_date) {
        Ok(wh) => wh,
        Err(e) => {
            eprintln!("Warehouse build failed: {}\n", e);
            return;
        }
    };

    if let Err(e) = wh.persist(&config.warehouse_dir) {
        eprintln!("{}\n", e);
        return;
    }
    println!("- dim_pais: {} rows", util::format_int(wh.dim_pais.len() as i64));
    println!("- dim_costos: {} rows", util::format_int(wh.dim_costos.len() as i64));
    println!("- dim_tiempo: {} rows", util::format_int(wh.dim_tiempo.len() as i64));
    println!(
        "- fact_economicos: {} rows\n",
        util::format_int(wh.fact_economicos.len() as i64)
    );

    let r1 = reports::generate_big_mac_ranking(&wh);
    let file1 = "analisis_big_mac.csv";
    if let Err(e) = output::write_csv(std::path::Path::new(file1), &r1) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 1: Big Mac Price Ranking\n");
    output::preview_table_rows(&r1, 5);
    println!("(Full table exported to {})\n", file1);

    let r2 = reports::generate_continent_lodging(&wh);
    let file2 = "analisis_hospedaje_continente.csv";
    if let Err(e) = output::write_csv(std::path::Path::new(file2), &r2) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 2: Average Lodging Cost by Continent\n");
    output::preview_table_rows(&r2, 5);
    println!("(Full table exported to {})\n", file2);

    let r3 = reports::generate_cheapest_destinations(&wh);
    let file3 = "analisis_destinos_economicos.csv";
    if let Err(e) = output::write_csv(std::path::Path::new(file3), &r3) {
        eprintln!("Write error: {}", e);
    }
    println!("Report 3: Cheapest Tourist Destinations\n");
    output::preview_table_rows(&r3, 5);
    println!("(Full table exported to {})\n", file3);

    let resumen = reports::generate_summary(&table, &wh);
    if let Err(e) = output::write_json(std::path::Path::new("resumen.json"), &resumen) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "Summary (resumen.json): {} countries, {} facts, mean Big Mac ${}\n",
        util::format_int(resumen.total_paises as i64),
        util::format_int(resumen.total_hechos as i64),
        util::format_number(resumen.precio_big_mac_medio, 2)
    );
}

fn main() {
    loop {
        println!("Select Pipeline Stage:");
        println!("[1] Integrate source snapshots");
        println!("[2] Build data warehouse\n");
        match read_choice().as_str() {
            "1" => {
                handle_integrate();
            }
            "2" => {
                println!("");
                handle_build_warehouse();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
