// Dimensional Modeler: reshape the cleaned table into the star schema.
//
// Two phases, in order: dimension population (dim_pais, dim_costos,
// dim_tiempo), then fact population. A fact may only reference dimension rows
// already committed; anything else is an IntegrityViolation and aborts the
// build. Rebuilds are clear-then-insert, so re-running on unchanged input
// reproduces the same dimension rows and fact triples.
use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::error::PipelineError;
use crate::output;
use crate::types::{CleanRecord, DimCosto, DimPais, DimTiempo, FactEconomico, Measure};

pub struct CostType {
    pub id: i64,
    pub tipo: &'static str,
    pub descripcion: &'static str,
}

/// The fixed cost-type enumeration, seeded once per warehouse.
pub const COST_TYPES: [CostType; 5] = [
    CostType { id: 1, tipo: "big_mac", descripcion: "Precio del Big Mac en USD" },
    CostType { id: 2, tipo: "hospedaje", descripcion: "Costo bajo de hospedaje" },
    CostType { id: 3, tipo: "comida", descripcion: "Costo promedio de comida" },
    CostType { id: 4, tipo: "transporte", descripcion: "Costo bajo de transporte" },
    CostType { id: 5, tipo: "entretenimiento", descripcion: "Costo promedio de entretenimiento" },
];

/// The cleaned-table measure backing each cost type.
fn measure_of<'a>(record: &'a CleanRecord, tipo: &str) -> Option<&'a Measure> {
    match tipo {
        "big_mac" => Some(&record.precio_big_mac_usd),
        "hospedaje" => record.costos.get("costo_bajo_hospedaje"),
        "comida" => record.costos.get("costo_promedio_comida"),
        "transporte" => record.costos.get("costo_bajo_transporte"),
        "entretenimiento" => record.costos.get("costo_promedio_entretenimiento"),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct Warehouse {
    pub dim_pais: Vec<DimPais>,
    pub dim_costos: Vec<DimCosto>,
    pub dim_tiempo: Vec<DimTiempo>,
    pub fact_economicos: Vec<FactEconomico>,
}

pub fn build(records: &[CleanRecord], load_date: NaiveDate) -> Result<Warehouse, PipelineError> {
    let mut warehouse = Warehouse::default();
    warehouse.populate_dimensions(records, load_date);
    warehouse.populate_facts(records)?;
    Ok(warehouse)
}

impl Warehouse {
    /// Phase one: rebuild the dimensions. The country dimension keeps one row
    /// per natural id (insert-or-ignore); the cost-type seed is a no-op when
    /// already present; the time dimension gets exactly one row for this run.
    pub fn populate_dimensions(&mut self, records: &[CleanRecord], load_date: NaiveDate) {
        self.dim_pais.clear();
        let mut seen: HashSet<i64> = HashSet::new();
        for record in records {
            if !seen.insert(record.id_pais) {
                continue;
            }
            self.dim_pais.push(DimPais {
                id_pais: record.id_pais,
                pais: record.pais.clone(),
                capital: record.capital.clone(),
                continente: record.continente.clone(),
                region: record.region.clone(),
                poblacion: record.poblacion,
                tasa_de_envejecimiento: record.tasa_de_envejecimiento.value,
            });
        }

        if self.dim_costos.is_empty() {
            self.dim_costos = COST_TYPES
                .iter()
                .map(|ct| DimCosto {
                    id_costo: ct.id,
                    tipo_costo: ct.tipo.to_string(),
                    descripcion: ct.descripcion.to_string(),
                })
                .collect();
        }

        self.dim_tiempo.clear();
        self.dim_tiempo.push(DimTiempo {
            id_tiempo: 1,
            fecha_carga: load_date.format("%Y-%m-%d").to_string(),
            anio: load_date.year(),
            mes: load_date.month(),
            dia: load_date.day(),
        });
    }

    /// Phase two: sparse fact population. Only observed measures produce a
    /// row; an imputed fill never becomes a fact. Every foreign key is
    /// checked against the committed dimensions.
    pub fn populate_facts(&mut self, records: &[CleanRecord]) -> Result<(), PipelineError> {
        let id_tiempo = self
            .dim_tiempo
            .last()
            .map(|t| t.id_tiempo)
            .ok_or(PipelineError::IntegrityViolation { dimension: "dim_tiempo", id: 1 })?;
        let paises: HashSet<i64> = self.dim_pais.iter().map(|d| d.id_pais).collect();
        let costos: HashSet<i64> = self.dim_costos.iter().map(|d| d.id_costo).collect();

        self.fact_economicos.clear();
        let mut id_hecho = 0i64;
        for record in records {
            for cost_type in &COST_TYPES {
                let Some(measure) = measure_of(record, cost_type.tipo) else {
                    continue;
                };
                if !measure.observed {
                    continue;
                }
                if !paises.contains(&record.id_pais) {
                    return Err(PipelineError::IntegrityViolation {
                        dimension: "dim_pais",
                        id: record.id_pais,
                    });
                }
                if !costos.contains(&cost_type.id) {
                    return Err(PipelineError::IntegrityViolation {
                        dimension: "dim_costos",
                        id: cost_type.id,
                    });
                }
                id_hecho += 1;
                self.fact_economicos.push(FactEconomico {
                    id_hecho,
                    id_pais: record.id_pais,
                    id_costo: cost_type.id,
                    id_tiempo,
                    valor: measure.value,
                });
            }
        }
        Ok(())
    }

    /// Persist the four relations as CSV snapshots (overwrite = the run's
    /// clear-then-insert rebuild).
    pub fn persist(&self, dir: &Path) -> Result<(), PipelineError> {
        write_relation(dir, "dim_pais.csv", &self.dim_pais)?;
        write_relation(dir, "dim_costos.csv", &self.dim_costos)?;
        write_relation(dir, "dim_tiempo.csv", &self.dim_tiempo)?;
        write_relation(dir, "fact_economicos.csv", &self.fact_economicos)?;
        Ok(())
    }
}

fn write_relation<T: serde::Serialize>(
    dir: &Path,
    name: &str,
    rows: &[T],
) -> Result<(), PipelineError> {
    let path = dir.join(name);
    output::write_csv(&path, rows).map_err(|e| PipelineError::LoadFailure {
        path: path.display().to_string(),
        detail: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn clean_record(id: i64) -> CleanRecord {
        CleanRecord {
            id_pais: id,
            pais: format!("pais {}", id),
            capital: "capital".to_string(),
            continente: "continente".to_string(),
            region: "region".to_string(),
            poblacion: 1000.0,
            tasa_de_envejecimiento: Measure::observed(10.0),
            precio_big_mac_usd: Measure::imputed(3.0),
            costos: BTreeMap::new(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn seeds_the_five_cost_types_once() {
        let warehouse = build(&[clean_record(1)], date()).unwrap();
        assert_eq!(warehouse.dim_costos.len(), 5);
        let tipos: Vec<&str> = warehouse
            .dim_costos
            .iter()
            .map(|c| c.tipo_costo.as_str())
            .collect();
        assert_eq!(
            tipos,
            vec!["big_mac", "hospedaje", "comida", "transporte", "entretenimiento"]
        );
    }

    #[test]
    fn one_time_row_per_run() {
        let warehouse = build(&[clean_record(1)], date()).unwrap();
        assert_eq!(warehouse.dim_tiempo.len(), 1);
        let tiempo = &warehouse.dim_tiempo[0];
        assert_eq!(tiempo.fecha_carga, "2025-06-01");
        assert_eq!((tiempo.anio, tiempo.mes, tiempo.dia), (2025, 6, 1));
    }

    #[test]
    fn observed_big_mac_price_produces_exactly_one_fact() {
        let mut record = clean_record(7);
        record.precio_big_mac_usd = Measure::observed(3.5);
        let warehouse = build(&[record], date()).unwrap();
        assert_eq!(warehouse.fact_economicos.len(), 1);
        let fact = &warehouse.fact_economicos[0];
        assert_eq!(fact.id_pais, 7);
        assert_eq!(fact.id_costo, 1);
        assert_eq!(fact.id_tiempo, 1);
        assert_eq!(fact.valor, 3.5);
    }

    #[test]
    fn imputed_measures_never_become_facts() {
        let mut record = clean_record(1);
        // Imputed transport cost: present in the artifact, absent from facts.
        record
            .costos
            .insert("costo_bajo_transporte".to_string(), Measure::imputed(9.9));
        record
            .costos
            .insert("costo_promedio_comida".to_string(), Measure::observed(12.0));
        let warehouse = build(&[record], date()).unwrap();
        let costo_ids: Vec<i64> = warehouse
            .fact_economicos
            .iter()
            .map(|f| f.id_costo)
            .collect();
        assert_eq!(costo_ids, vec![3]); // comida only
    }

    #[test]
    fn country_dimension_ignores_duplicate_ids() {
        let warehouse = build(&[clean_record(1), clean_record(1)], date()).unwrap();
        assert_eq!(warehouse.dim_pais.len(), 1);
    }

    #[test]
    fn facts_before_dimensions_violate_integrity() {
        let mut warehouse = Warehouse::default();
        let err = warehouse.populate_facts(&[clean_record(1)]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::IntegrityViolation { dimension: "dim_tiempo", .. }
        ));
    }

    // Full pipeline: merge → reconcile → impute → build, twice, against the
    // same source snapshot.
    #[test]
    fn full_rebuild_reproduces_ids_and_fact_triples() {
        use crate::types::{AgingRow, BigMacDoc, PopulationRow, TouristCostDoc};
        use crate::{impute, merge, reconcile};

        let run = || {
            let aging = vec![AgingRow {
                id_pais: Some(4),
                nombre_pais: Some("Chile".to_string()),
                poblacion: Some(19_000_000.0),
                tasa_de_envejecimiento: Some(12.0),
                ..Default::default()
            }];
            let population = vec![PopulationRow {
                pais: Some("Bolivia".to_string()),
                costo_bajo_transporte: Some(1.5),
                ..Default::default()
            }];
            let big_mac = vec![BigMacDoc {
                pais: Some("chile".to_string()),
                precio_big_mac_usd: Some(4.1),
                ..Default::default()
            }];
            let tourist = vec![TouristCostDoc {
                pais: Some("Bolivia".to_string()),
                costos: BTreeMap::from([("costo_promedio_comida".to_string(), 6.0)]),
                ..Default::default()
            }];
            let (merged, _) = merge::merge_sources(aging, population, big_mac, tourist);
            let clean = impute::impute(reconcile::reconcile(merged));
            build(&clean.records, date()).unwrap()
        };

        let first = run();
        let second = run();

        // Bolivia has no natural id and gets the surrogate 5 both times.
        let mut ids: Vec<i64> = first.dim_pais.iter().map(|d| d.id_pais).collect();
        ids.sort();
        assert_eq!(ids, vec![4, 5]);
        let ids2: Vec<i64> = second.dim_pais.iter().map(|d| d.id_pais).collect();
        assert_eq!(
            first.dim_pais.iter().map(|d| d.id_pais).collect::<Vec<_>>(),
            ids2
        );

        // Chile: big mac only. Bolivia: transporte + comida. Imputed fills
        // for the opposite countries never become facts.
        assert_eq!(first.fact_economicos.len(), 3);
        let triples = |w: &Warehouse| {
            w.fact_economicos
                .iter()
                .map(|f| (f.id_pais, f.id_costo, f.valor.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(triples(&first), triples(&second));
    }

    #[test]
    fn rebuild_on_unchanged_input_is_idempotent() {
        let mut record = clean_record(3);
        record.precio_big_mac_usd = Measure::observed(4.25);
        record
            .costos
            .insert("costo_bajo_hospedaje".to_string(), Measure::observed(20.0));
        let records = vec![record, clean_record(8)];

        let first = build(&records, date()).unwrap();
        let second = build(&records, date()).unwrap();

        let ids = |w: &Warehouse| w.dim_pais.iter().map(|d| d.id_pais).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));

        let triples = |w: &Warehouse| {
            w.fact_economicos
                .iter()
                .map(|f| (f.id_pais, f.id_costo, f.valor.to_bits()))
                .collect::<Vec<_>>()
        };
        assert_eq!(triples(&first), triples(&second));
    }
}
