use std::error::Error;
use std::path::Path;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::types::{CleanTable, FIXED_COLUMNS};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write the integrated artifact. Its cost columns are discovered at run
/// time, so the header is assembled by hand instead of serde-derived.
pub fn write_integrated_csv(path: &Path, table: &CleanTable) -> Result<(), Box<dyn Error>> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(table.cost_columns.iter().cloned());
    wtr.write_record(&header)?;

    for r in &table.records {
        let mut row = vec![
            r.id_pais.to_string(),
            r.pais.clone(),
            r.capital.clone(),
            r.continente.clone(),
            r.region.clone(),
            r.poblacion.to_string(),
            r.tasa_de_envejecimiento.value.to_string(),
            r.precio_big_mac_usd.value.to_string(),
        ];
        for col in &table.cost_columns {
            row.push(r.costos.get(col).map_or(0.0, |m| m.value).to_string());
        }
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
