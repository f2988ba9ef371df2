// Imputation Engine: one fill policy per column role.
//
// - id: new integers strictly above the current maximum, in row order.
// - text: the "Desconocido" placeholder.
// - price/cost/rate numerics: column mean over observed values, 0 when the
//   whole column is empty.
// - other numerics: 0.
//
// After this stage no emitted column is missing, but every measure remembers
// whether it was observed or filled; fact sparsity depends on that flag.
use std::collections::BTreeMap;

use crate::types::{CleanRecord, CleanTable, IntegratedRecord, IntegratedTable, Measure};
use crate::util::average;

pub const TEXT_PLACEHOLDER: &str = "Desconocido";

pub fn impute(table: IntegratedTable) -> CleanTable {
    let IntegratedTable {
        records,
        cost_columns,
    } = table;

    let tasa_mean = column_mean(records.iter().map(|r| r.tasa_de_envejecimiento));
    let precio_mean = column_mean(records.iter().map(|r| r.precio_big_mac_usd));
    let cost_means: BTreeMap<String, f64> = cost_columns
        .iter()
        .map(|col| {
            let mean = column_mean(records.iter().map(|r| r.costos.get(col).copied()));
            (col.clone(), mean)
        })
        .collect();

    let mut next_id = records.iter().filter_map(|r| r.id_pais).max().unwrap_or(0);

    let clean_records = records
        .into_iter()
        .map(|record| {
            let IntegratedRecord {
                id_pais,
                pais,
                capital,
                continente,
                region,
                poblacion,
                tasa_de_envejecimiento,
                precio_big_mac_usd,
                costos,
            } = record;

            let id_pais = match id_pais {
                Some(id) => id,
                None => {
                    next_id += 1;
                    next_id
                }
            };

            let costos = cost_columns
                .iter()
                .map(|col| {
                    let measure = match costos.get(col) {
                        Some(v) => Measure::observed(*v),
                        None => Measure::imputed(cost_means[col]),
                    };
                    (col.clone(), measure)
                })
                .collect();

            CleanRecord {
                id_pais,
                pais: fill_text(pais),
                capital: fill_text(capital),
                continente: fill_text(continente),
                region: fill_text(region),
                poblacion: poblacion.unwrap_or(0.0),
                tasa_de_envejecimiento: fill_numeric(tasa_de_envejecimiento, tasa_mean),
                precio_big_mac_usd: fill_numeric(precio_big_mac_usd, precio_mean),
                costos,
            }
        })
        .collect();

    CleanTable {
        records: clean_records,
        cost_columns,
    }
}

fn fill_text(value: Option<String>) -> String {
    value.unwrap_or_else(|| TEXT_PLACEHOLDER.to_string())
}

fn fill_numeric(value: Option<f64>, mean: f64) -> Measure {
    match value {
        Some(v) => Measure::observed(v),
        None => Measure::imputed(mean),
    }
}

/// Mean over the observed values of one column; `average` already falls back
/// to 0 for an all-missing column.
fn column_mean(values: impl Iterator<Item = Option<f64>>) -> f64 {
    let observed: Vec<f64> = values.flatten().collect();
    average(&observed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntegratedRecord;

    fn record(id: Option<i64>) -> IntegratedRecord {
        IntegratedRecord {
            id_pais: id,
            ..Default::default()
        }
    }

    fn table(records: Vec<IntegratedRecord>, cost_columns: &[&str]) -> IntegratedTable {
        IntegratedTable {
            records,
            cost_columns: cost_columns.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn surrogate_ids_stay_above_the_existing_maximum() {
        let clean = impute(table(
            vec![
                record(Some(1)),
                record(Some(2)),
                record(None),
                record(Some(5)),
                record(None),
            ],
            &[],
        ));
        let ids: Vec<i64> = clean.records.iter().map(|r| r.id_pais).collect();
        assert_eq!(ids, vec![1, 2, 6, 5, 7]);
    }

    #[test]
    fn ids_start_at_one_when_no_source_supplies_any() {
        let clean = impute(table(vec![record(None), record(None)], &[]));
        let ids: Vec<i64> = clean.records.iter().map(|r| r.id_pais).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn missing_text_gets_the_placeholder() {
        let clean = impute(table(vec![record(Some(1))], &[]));
        let rec = &clean.records[0];
        assert_eq!(rec.pais, TEXT_PLACEHOLDER);
        assert_eq!(rec.capital, TEXT_PLACEHOLDER);
        assert_eq!(rec.continente, TEXT_PLACEHOLDER);
        assert_eq!(rec.region, TEXT_PLACEHOLDER);
    }

    #[test]
    fn cost_columns_fill_with_the_column_mean() {
        let mut with_value = record(Some(1));
        with_value
            .costos
            .insert("costo_bajo_hospedaje".to_string(), 10.0);
        let mut with_other = record(Some(2));
        with_other
            .costos
            .insert("costo_bajo_hospedaje".to_string(), 30.0);
        let without = record(Some(3));

        let clean = impute(table(
            vec![with_value, with_other, without],
            &["costo_bajo_hospedaje"],
        ));
        let filled = clean.records[2].costos["costo_bajo_hospedaje"];
        assert_eq!(filled.value, 20.0);
        assert!(!filled.observed);
        assert!(clean.records[0].costos["costo_bajo_hospedaje"].observed);
    }

    #[test]
    fn all_missing_numeric_column_falls_back_to_zero() {
        let clean = impute(table(
            vec![record(Some(1)), record(Some(2))],
            &["costo_bajo_transporte"],
        ));
        for rec in &clean.records {
            let m = rec.costos["costo_bajo_transporte"];
            assert_eq!(m.value, 0.0);
            assert!(!m.observed);
        }
    }

    #[test]
    fn other_numerics_fill_with_zero_not_the_mean() {
        let mut populated = record(Some(1));
        populated.poblacion = Some(1000.0);
        let clean = impute(table(vec![populated, record(Some(2))], &[]));
        assert_eq!(clean.records[1].poblacion, 0.0);
    }

    #[test]
    fn every_record_carries_every_cost_column_after_imputation() {
        let mut partial = record(Some(1));
        partial.costos.insert("costo_bajo_hospedaje".to_string(), 5.0);
        let clean = impute(table(
            vec![partial, record(Some(2))],
            &["costo_bajo_hospedaje", "costo_promedio_comida"],
        ));
        for rec in &clean.records {
            for col in &clean.cost_columns {
                assert!(rec.costos.contains_key(col));
            }
        }
    }
}
