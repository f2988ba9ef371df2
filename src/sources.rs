// Source adapters: read the relational-table snapshots (CSV) and the
// document-collection snapshots (JSON) into typed rows.
//
// This is the only place where source-specific spellings and the nested
// daily-cost structure exist; the core downstream operates on fixed, typed
// shapes.
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::types::{
    AgingRow, BigMacDoc, PopulationRow, RawAgingRow, RawPopulationRow, RawTouristDoc,
    TouristCostDoc,
};
use crate::util::{parse_f64_safe, parse_i64_safe};

/// Per-source counts plus non-fatal schema warnings. The caller decides
/// whether a degraded merge is acceptable.
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub aging_rows: usize,
    pub population_rows: usize,
    pub big_mac_docs: usize,
    pub tourist_docs: usize,
    pub parse_errors: usize,
    pub warnings: Vec<PipelineError>,
}

pub fn extract_sources(
    config: &PipelineConfig,
) -> Result<
    (
        Vec<AgingRow>,
        Vec<PopulationRow>,
        Vec<BigMacDoc>,
        Vec<TouristCostDoc>,
        ExtractReport,
    ),
    PipelineError,
> {
    let mut report = ExtractReport::default();

    let aging = load_aging_table(&config.aging_csv, &mut report)?;
    let population = load_population_table(&config.population_csv, &mut report)?;
    let big_mac = load_big_mac_collection(&config.big_mac_json, &mut report)?;
    let tourist = load_tourist_collection(&config.tourist_cost_jsons, &mut report)?;

    report.aging_rows = aging.len();
    report.population_rows = population.len();
    report.big_mac_docs = big_mac.len();
    report.tourist_docs = tourist.len();

    Ok((aging, population, big_mac, tourist, report))
}

fn source_unavailable(path: &Path, detail: impl ToString) -> PipelineError {
    PipelineError::SourceUnavailable {
        source: path.display().to_string(),
        detail: detail.to_string(),
    }
}

fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?.trim().to_string();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Record a schema-mismatch warning when a source has rows but the configured
/// country-name column never carried a value.
fn check_name_column(
    report: &mut ExtractReport,
    source: &Path,
    column: &str,
    total: usize,
    named: usize,
) {
    if total > 0 && named == 0 {
        report.warnings.push(PipelineError::SchemaMismatch {
            source: source.display().to_string(),
            column: column.to_string(),
        });
    }
}

fn load_aging_table(
    path: &Path,
    report: &mut ExtractReport,
) -> Result<Vec<AgingRow>, PipelineError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| source_unavailable(path, e))?;

    let mut rows = Vec::new();
    let mut named = 0usize;
    let mut total = 0usize;
    for result in rdr.deserialize::<RawAgingRow>() {
        total += 1;
        let raw = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let nombre_pais = clean_text(raw.nombre_pais);
        if nombre_pais.is_some() {
            named += 1;
        }
        rows.push(AgingRow {
            id_pais: parse_i64_safe(raw.id_pais.as_deref()),
            nombre_pais,
            capital: clean_text(raw.capital),
            continente: clean_text(raw.continente),
            region: clean_text(raw.region),
            poblacion: parse_f64_safe(raw.poblacion.as_deref()),
            tasa_de_envejecimiento: parse_f64_safe(raw.tasa_de_envejecimiento.as_deref()),
        });
    }
    check_name_column(report, path, "nombre_pais", total, named);
    Ok(rows)
}

fn load_population_table(
    path: &Path,
    report: &mut ExtractReport,
) -> Result<Vec<PopulationRow>, PipelineError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| source_unavailable(path, e))?;

    let mut rows = Vec::new();
    let mut named = 0usize;
    let mut total = 0usize;
    for result in rdr.deserialize::<RawPopulationRow>() {
        total += 1;
        let raw = match result {
            Ok(r) => r,
            Err(_) => {
                report.parse_errors += 1;
                continue;
            }
        };
        let pais = clean_text(raw.pais);
        if pais.is_some() {
            named += 1;
        }
        rows.push(PopulationRow {
            continente: clean_text(raw.continente),
            pais,
            poblacion: parse_f64_safe(raw.poblacion.as_deref()),
            costo_bajo_hospedaje: parse_f64_safe(raw.costo_bajo_hospedaje.as_deref()),
            costo_promedio_comida: parse_f64_safe(raw.costo_promedio_comida.as_deref()),
            costo_bajo_transporte: parse_f64_safe(raw.costo_bajo_transporte.as_deref()),
            costo_promedio_entretenimiento: parse_f64_safe(
                raw.costo_promedio_entretenimiento.as_deref(),
            ),
        });
    }
    check_name_column(report, path, "pais", total, named);
    Ok(rows)
}

fn load_big_mac_collection(
    path: &Path,
    report: &mut ExtractReport,
) -> Result<Vec<BigMacDoc>, PipelineError> {
    let text = fs::read_to_string(path).map_err(|e| source_unavailable(path, e))?;
    let docs: Vec<BigMacDoc> =
        serde_json::from_str(&text).map_err(|e| source_unavailable(path, e))?;
    let named = docs.iter().filter(|d| d.pais.is_some()).count();
    check_name_column(report, path, "país", docs.len(), named);
    Ok(docs)
}

/// The tourist-cost collection arrives as one JSON file per continent; they
/// are concatenated into a single collection.
fn load_tourist_collection(
    paths: &[std::path::PathBuf],
    report: &mut ExtractReport,
) -> Result<Vec<TouristCostDoc>, PipelineError> {
    let mut docs = Vec::new();
    for path in paths {
        let text = fs::read_to_string(path).map_err(|e| source_unavailable(path, e))?;
        let raw_docs: Vec<RawTouristDoc> =
            serde_json::from_str(&text).map_err(|e| source_unavailable(path, e))?;
        let named = raw_docs.iter().filter(|d| d.pais.is_some()).count();
        check_name_column(report, path, "país", raw_docs.len(), named);
        for raw in raw_docs {
            docs.push(TouristCostDoc {
                pais: raw.pais,
                continente: raw.continente,
                poblacion: raw.poblacion,
                capital: raw.capital,
                region: raw.region,
                costos: flatten_daily_costs(raw.costos.as_ref()),
            });
        }
    }
    Ok(docs)
}

/// Flatten the nested daily-cost mapping into top-level columns.
///
/// One level of nesting is supported: `{categoria: {subtipo: n}}` becomes
/// `categoria_subtipo`, a plain `{categoria: n}` keeps its name. Non-numeric
/// leaves are skipped.
pub fn flatten_daily_costs(value: Option<&Value>) -> BTreeMap<String, f64> {
    let mut flat = BTreeMap::new();
    let Some(Value::Object(categorias)) = value else {
        return flat;
    };
    for (categoria, valor) in categorias {
        match valor {
            Value::Object(subtipos) => {
                for (subtipo, v) in subtipos {
                    if let Some(n) = v.as_f64() {
                        flat.insert(format!("{}_{}", categoria, subtipo), n);
                    }
                }
            }
            _ => {
                if let Some(n) = valor.as_f64() {
                    flat.insert(categoria.clone(), n);
                }
            }
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_one_level_of_nesting() {
        let costos = json!({
            "costo_bajo": { "hospedaje": 18.0, "transporte": 2.5 },
            "costo_promedio": { "comida": 11.0, "entretenimiento": 7 }
        });
        let flat = flatten_daily_costs(Some(&costos));
        assert_eq!(flat.get("costo_bajo_hospedaje"), Some(&18.0));
        assert_eq!(flat.get("costo_bajo_transporte"), Some(&2.5));
        assert_eq!(flat.get("costo_promedio_comida"), Some(&11.0));
        assert_eq!(flat.get("costo_promedio_entretenimiento"), Some(&7.0));
    }

    #[test]
    fn keeps_unsubdivided_categories_and_skips_non_numeric() {
        let costos = json!({
            "costo_visado": 35.5,
            "moneda": "USD"
        });
        let flat = flatten_daily_costs(Some(&costos));
        assert_eq!(flat.get("costo_visado"), Some(&35.5));
        assert!(!flat.contains_key("moneda"));
    }

    #[test]
    fn missing_cost_block_flattens_to_empty() {
        assert!(flatten_daily_costs(None).is_empty());
        assert!(flatten_daily_costs(Some(&json!(null))).is_empty());
    }

    #[test]
    fn tourist_docs_accept_both_spellings() {
        let doc: RawTouristDoc = serde_json::from_value(json!({
            "país": "Chile",
            "población": 19000000.0,
            "región": "Sudamérica"
        }))
        .unwrap();
        assert_eq!(doc.pais.as_deref(), Some("Chile"));

        let doc: RawTouristDoc = serde_json::from_value(json!({
            "pais": "Chile",
            "poblacion": 19000000.0
        }))
        .unwrap();
        assert_eq!(doc.pais.as_deref(), Some("Chile"));
        assert_eq!(doc.poblacion, Some(19000000.0));
    }
}
