// Descriptive statistics over the cleaned table and the analytical queries
// run against the finished warehouse.
use std::collections::HashMap;

use crate::types::{
    BigMacRankingRow, CheapestDestinationRow, CleanTable, ContinentLodgingRow, DimPais,
    ResumenCarga,
};
use crate::util::{average, format_int, format_number};
use crate::warehouse::Warehouse;

/// Console summary of the integrated table, printed after stage one.
pub fn print_integration_stats(table: &CleanTable) {
    println!("Continent distribution:");
    let mut by_continent: HashMap<&str, usize> = HashMap::new();
    for r in &table.records {
        *by_continent.entry(r.continente.as_str()).or_insert(0) += 1;
    }
    let mut continents: Vec<(&str, usize)> = by_continent.into_iter().collect();
    continents.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    for (continente, count) in continents {
        println!("- {}: {} countries", continente, format_int(count as i64));
    }

    let poblaciones: Vec<f64> = table.records.iter().map(|r| r.poblacion).collect();
    let total: f64 = poblaciones.iter().sum();
    println!("\nPopulation:");
    println!("- Total: {}", format_number(total, 0));
    println!("- Mean: {}", format_number(average(&poblaciones), 0));
    if let Some(top) = table
        .records
        .iter()
        .max_by(|a, b| a.poblacion.total_cmp(&b.poblacion))
    {
        println!(
            "- Most populated: {} ({})",
            top.pais,
            format_number(top.poblacion, 0)
        );
    }

    // Only observed prices; imputed fills would drag the mean toward itself.
    let precios: Vec<f64> = table
        .records
        .iter()
        .filter(|r| r.precio_big_mac_usd.observed)
        .map(|r| r.precio_big_mac_usd.value)
        .collect();
    println!("\nBig Mac index ({} countries with a price):", precios.len());
    println!("- Mean price: ${}", format_number(average(&precios), 2));

    let tasas: Vec<f64> = table
        .records
        .iter()
        .filter(|r| r.tasa_de_envejecimiento.observed)
        .map(|r| r.tasa_de_envejecimiento.value)
        .collect();
    println!("- Mean aging rate: {}%", format_number(average(&tasas), 2));
}

fn country_index(warehouse: &Warehouse) -> HashMap<i64, &DimPais> {
    warehouse.dim_pais.iter().map(|d| (d.id_pais, d)).collect()
}

fn cost_type_id(warehouse: &Warehouse, tipo: &str) -> Option<i64> {
    warehouse
        .dim_costos
        .iter()
        .find(|c| c.tipo_costo == tipo)
        .map(|c| c.id_costo)
}

/// Countries ranked by Big Mac price, joined back to the country dimension.
pub fn generate_big_mac_ranking(warehouse: &Warehouse) -> Vec<BigMacRankingRow> {
    let paises = country_index(warehouse);
    let Some(id_big_mac) = cost_type_id(warehouse, "big_mac") else {
        return Vec::new();
    };
    let mut priced: Vec<(f64, &DimPais)> = warehouse
        .fact_economicos
        .iter()
        .filter(|f| f.id_costo == id_big_mac)
        .filter_map(|f| paises.get(&f.id_pais).map(|p| (f.valor, *p)))
        .collect();
    priced.sort_by(|a, b| b.0.total_cmp(&a.0));
    priced
        .into_iter()
        .take(10)
        .map(|(valor, pais)| BigMacRankingRow {
            pais: pais.pais.clone(),
            continente: pais.continente.clone(),
            precio_big_mac_usd: format_number(valor, 2),
            tasa_de_envejecimiento: format_number(pais.tasa_de_envejecimiento, 2),
        })
        .collect()
}

/// Average lodging cost per continent, highest first.
pub fn generate_continent_lodging(warehouse: &Warehouse) -> Vec<ContinentLodgingRow> {
    let paises = country_index(warehouse);
    let Some(id_hospedaje) = cost_type_id(warehouse, "hospedaje") else {
        return Vec::new();
    };
    let mut by_continent: HashMap<&str, Vec<f64>> = HashMap::new();
    for fact in &warehouse.fact_economicos {
        if fact.id_costo != id_hospedaje {
            continue;
        }
        if let Some(pais) = paises.get(&fact.id_pais) {
            by_continent
                .entry(pais.continente.as_str())
                .or_default()
                .push(fact.valor);
        }
    }
    let mut rows: Vec<(f64, ContinentLodgingRow)> = by_continent
        .into_iter()
        .map(|(continente, valores)| {
            let promedio = average(&valores);
            (
                promedio,
                ContinentLodgingRow {
                    continente: continente.to_string(),
                    paises: valores.len(),
                    promedio_hospedaje: format_number(promedio, 2),
                },
            )
        })
        .collect();
    rows.sort_by(|a, b| b.0.total_cmp(&a.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Cheapest destinations: sum of the four tourist cost types per country,
/// ascending. Countries with no tourist-cost fact at all are left out.
pub fn generate_cheapest_destinations(warehouse: &Warehouse) -> Vec<CheapestDestinationRow> {
    let paises = country_index(warehouse);
    let tourist_ids: Vec<i64> = ["hospedaje", "comida", "transporte", "entretenimiento"]
        .iter()
        .filter_map(|tipo| cost_type_id(warehouse, tipo))
        .collect();
    let mut totals: HashMap<i64, f64> = HashMap::new();
    for fact in &warehouse.fact_economicos {
        if tourist_ids.contains(&fact.id_costo) {
            *totals.entry(fact.id_pais).or_insert(0.0) += fact.valor;
        }
    }
    let mut ranked: Vec<(f64, i64)> = totals.into_iter().map(|(id, t)| (t, id)).collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    ranked
        .into_iter()
        .take(10)
        .enumerate()
        .filter_map(|(idx, (total, id_pais))| {
            paises.get(&id_pais).map(|pais| CheapestDestinationRow {
                rank: idx + 1,
                pais: pais.pais.clone(),
                continente: pais.continente.clone(),
                costo_total: format_number(total, 2),
            })
        })
        .collect()
}

pub fn generate_summary(table: &CleanTable, warehouse: &Warehouse) -> ResumenCarga {
    let precios: Vec<f64> = table
        .records
        .iter()
        .filter(|r| r.precio_big_mac_usd.observed)
        .map(|r| r.precio_big_mac_usd.value)
        .collect();
    ResumenCarga {
        total_paises: warehouse.dim_pais.len(),
        total_hechos: warehouse.fact_economicos.len(),
        poblacion_total: table.records.iter().map(|r| r.poblacion).sum(),
        precio_big_mac_medio: average(&precios),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CleanRecord, Measure};
    use crate::warehouse;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn record(id: i64, pais: &str, continente: &str, big_mac: Option<f64>) -> CleanRecord {
        CleanRecord {
            id_pais: id,
            pais: pais.to_string(),
            capital: "c".to_string(),
            continente: continente.to_string(),
            region: "r".to_string(),
            poblacion: 10.0,
            tasa_de_envejecimiento: Measure::observed(5.0),
            precio_big_mac_usd: match big_mac {
                Some(v) => Measure::observed(v),
                None => Measure::imputed(3.0),
            },
            costos: BTreeMap::new(),
        }
    }

    fn build(records: &[CleanRecord]) -> Warehouse {
        warehouse::build(records, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()).unwrap()
    }

    #[test]
    fn big_mac_ranking_sorts_descending_and_joins_the_dimension() {
        let records = vec![
            record(1, "Chile", "América", Some(4.0)),
            record(2, "Suiza", "Europa", Some(7.5)),
            record(3, "Egipto", "África", None),
        ];
        let rows = generate_big_mac_ranking(&build(&records));
        // The imputed price never reaches the fact table, so only two rows.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].pais, "Suiza");
        assert_eq!(rows[1].pais, "Chile");
    }

    #[test]
    fn lodging_report_averages_per_continent() {
        let mut a = record(1, "A", "Asia", None);
        a.costos
            .insert("costo_bajo_hospedaje".to_string(), Measure::observed(10.0));
        let mut b = record(2, "B", "Asia", None);
        b.costos
            .insert("costo_bajo_hospedaje".to_string(), Measure::observed(30.0));
        let rows = generate_continent_lodging(&build(&[a, b]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].paises, 2);
        assert_eq!(rows[0].promedio_hospedaje, "20.00");
    }

    #[test]
    fn cheapest_ranking_sums_only_tourist_cost_types() {
        let mut a = record(1, "A", "Asia", Some(9.0)); // big mac must not count
        a.costos
            .insert("costo_bajo_hospedaje".to_string(), Measure::observed(10.0));
        a.costos
            .insert("costo_promedio_comida".to_string(), Measure::observed(5.0));
        let mut b = record(2, "B", "Asia", None);
        b.costos
            .insert("costo_bajo_hospedaje".to_string(), Measure::observed(4.0));
        let rows = generate_cheapest_destinations(&build(&[a, b]));
        assert_eq!(rows[0].pais, "B");
        assert_eq!(rows[0].costo_total, "4.00");
        assert_eq!(rows[1].pais, "A");
        assert_eq!(rows[1].costo_total, "15.00");
    }
}
