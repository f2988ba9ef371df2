use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Column order of the integrated artifact, ahead of the dynamically
/// discovered `costo_*` columns.
pub const FIXED_COLUMNS: [&str; 8] = [
    "id_pais",
    "pais",
    "capital",
    "continente",
    "region",
    "poblacion",
    "tasa_de_envejecimiento",
    "precio_big_mac_usd",
];

// ---------------------------------------------------------------------------
// Raw source rows, exactly as the snapshots spell them.
// ---------------------------------------------------------------------------

// A column missing from a snapshot deserializes as `None` instead of failing
// the whole row; the adapter reports the mismatch and the merge degrades.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawAgingRow {
    pub id_pais: Option<String>,
    pub nombre_pais: Option<String>,
    pub capital: Option<String>,
    pub continente: Option<String>,
    pub region: Option<String>,
    pub poblacion: Option<String>,
    pub tasa_de_envejecimiento: Option<String>,
}

// The snapshot's document-style `_id` column is dropped here: it is not a
// natural key and never participates in the merge.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawPopulationRow {
    pub continente: Option<String>,
    pub pais: Option<String>,
    pub poblacion: Option<String>,
    pub costo_bajo_hospedaje: Option<String>,
    pub costo_promedio_comida: Option<String>,
    pub costo_bajo_transporte: Option<String>,
    pub costo_promedio_entretenimiento: Option<String>,
}

/// Document from the `big_mac_index` collection. The collection uses the
/// accented `país` spelling; older exports use `pais`, so both are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BigMacDoc {
    #[serde(rename = "país", alias = "pais", default)]
    pub pais: Option<String>,
    #[serde(default)]
    pub continente: Option<String>,
    #[serde(default)]
    pub precio_big_mac_usd: Option<f64>,
}

/// Raw document from the `costos_turisticos` collection. The nested daily
/// cost breakdown stays a `serde_json::Value` until the adapter flattens it.
#[derive(Debug, Deserialize)]
pub struct RawTouristDoc {
    #[serde(rename = "país", alias = "pais", default)]
    pub pais: Option<String>,
    #[serde(default)]
    pub continente: Option<String>,
    #[serde(rename = "población", alias = "poblacion", default)]
    pub poblacion: Option<f64>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(rename = "región", alias = "region", default)]
    pub region: Option<String>,
    #[serde(
        rename = "costos_diarios_estimados_en_dólares",
        alias = "costos_diarios_estimados_en_dolares",
        default
    )]
    pub costos: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Typed source rows handed to the core.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct AgingRow {
    pub id_pais: Option<i64>,
    pub nombre_pais: Option<String>,
    pub capital: Option<String>,
    pub continente: Option<String>,
    pub region: Option<String>,
    pub poblacion: Option<f64>,
    pub tasa_de_envejecimiento: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct PopulationRow {
    pub continente: Option<String>,
    pub pais: Option<String>,
    pub poblacion: Option<f64>,
    pub costo_bajo_hospedaje: Option<f64>,
    pub costo_promedio_comida: Option<f64>,
    pub costo_bajo_transporte: Option<f64>,
    pub costo_promedio_entretenimiento: Option<f64>,
}

/// Tourist-cost document after the adapter flattened the nested daily cost
/// breakdown into `categoria_subtipo` columns.
#[derive(Debug, Clone, Default)]
pub struct TouristCostDoc {
    pub pais: Option<String>,
    pub continente: Option<String>,
    pub poblacion: Option<f64>,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub costos: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Pipeline intermediates.
// ---------------------------------------------------------------------------

/// One entity after the chained outer joins: every source's payload is kept
/// whole so the reconciler can apply its own priority logic instead of losing
/// information to a column overwrite.
#[derive(Debug, Clone, Default)]
pub struct MergedCountry {
    pub clave: String,
    pub aging: Option<AgingRow>,
    pub population: Option<PopulationRow>,
    pub big_mac: Option<BigMacDoc>,
    pub tourist: Option<TouristCostDoc>,
}

/// One row of the reconciled wide table, before imputation. The normalized
/// key's job ended at the merge; rows stay in key order. A cost column
/// absent from `costos` is a missing measurement.
#[derive(Debug, Clone, Default)]
pub struct IntegratedRecord {
    pub id_pais: Option<i64>,
    pub pais: Option<String>,
    pub capital: Option<String>,
    pub continente: Option<String>,
    pub region: Option<String>,
    pub poblacion: Option<f64>,
    pub tasa_de_envejecimiento: Option<f64>,
    pub precio_big_mac_usd: Option<f64>,
    pub costos: BTreeMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct IntegratedTable {
    pub records: Vec<IntegratedRecord>,
    /// Union of discovered cost columns, in deterministic order.
    pub cost_columns: Vec<String>,
}

/// A numeric cell after imputation. `observed` distinguishes a source value
/// from an imputed fill: the emitted artifact uses `value`, the fact builder
/// only accepts observed measures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measure {
    pub value: f64,
    pub observed: bool,
}

impl Measure {
    pub fn observed(value: f64) -> Self {
        Measure { value, observed: true }
    }

    pub fn imputed(value: f64) -> Self {
        Measure { value, observed: false }
    }
}

/// Fully cleaned record: no missing values remain.
#[derive(Debug, Clone)]
pub struct CleanRecord {
    pub id_pais: i64,
    pub pais: String,
    pub capital: String,
    pub continente: String,
    pub region: String,
    pub poblacion: f64,
    pub tasa_de_envejecimiento: Measure,
    pub precio_big_mac_usd: Measure,
    pub costos: BTreeMap<String, Measure>,
}

#[derive(Debug, Clone)]
pub struct CleanTable {
    pub records: Vec<CleanRecord>,
    pub cost_columns: Vec<String>,
}

// ---------------------------------------------------------------------------
// Warehouse relations.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DimPais {
    pub id_pais: i64,
    pub pais: String,
    pub capital: String,
    pub continente: String,
    pub region: String,
    pub poblacion: f64,
    pub tasa_de_envejecimiento: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimCosto {
    pub id_costo: i64,
    pub tipo_costo: String,
    pub descripcion: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DimTiempo {
    pub id_tiempo: i64,
    pub fecha_carga: String,
    pub anio: i32,
    pub mes: u32,
    pub dia: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FactEconomico {
    pub id_hecho: i64,
    pub id_pais: i64,
    pub id_costo: i64,
    pub id_tiempo: i64,
    pub valor: f64,
}

// ---------------------------------------------------------------------------
// Analysis rows and the run summary.
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct BigMacRankingRow {
    pub pais: String,
    pub continente: String,
    pub precio_big_mac_usd: String,
    pub tasa_de_envejecimiento: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ContinentLodgingRow {
    pub continente: String,
    pub paises: usize,
    pub promedio_hospedaje: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CheapestDestinationRow {
    pub rank: usize,
    pub pais: String,
    pub continente: String,
    pub costo_total: String,
}

#[derive(Debug, Serialize)]
pub struct ResumenCarga {
    pub total_paises: usize,
    pub total_hechos: usize,
    pub poblacion_total: f64,
    pub precio_big_mac_medio: f64,
}
