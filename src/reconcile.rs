// Column Reconciler: collapse each family of duplicate semantic fields into
// one canonical column.
//
// Every coalesced field walks the same priority order: aging table, then
// population table, then big-mac collection, then tourist-cost collection.
// Population has its own rule (mean of the two relational sources), and cost
// columns prefer the tourist-cost document over the relational table.
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{IntegratedRecord, IntegratedTable, MergedCountry};

/// Which source supplied a candidate value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Aging,
    Population,
    BigMac,
    TouristCosts,
}

/// One candidate value for a semantic field, tagged with its source.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    pub origin: SourceOrigin,
    pub value: Option<T>,
}

impl<T> Candidate<T> {
    pub fn new(origin: SourceOrigin, value: Option<T>) -> Self {
        Candidate { origin, value }
    }
}

/// The value selected for a field, with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub origin: SourceOrigin,
}

/// First non-missing candidate wins; candidate order is the priority order.
pub fn first_present<T>(candidates: Vec<Candidate<T>>) -> Option<Resolved<T>> {
    candidates
        .into_iter()
        .find_map(|c| c.value.map(|value| Resolved { value, origin: c.origin }))
}

/// The four itemized cost columns the relational population table carries.
const RELATIONAL_COST_COLUMNS: [&str; 4] = [
    "costo_bajo_hospedaje",
    "costo_promedio_comida",
    "costo_bajo_transporte",
    "costo_promedio_entretenimiento",
];

pub fn reconcile(merged: Vec<MergedCountry>) -> IntegratedTable {
    let mut records = Vec::with_capacity(merged.len());
    let mut cost_columns: BTreeSet<String> = BTreeSet::new();
    for country in merged {
        let record = reconcile_one(country);
        cost_columns.extend(record.costos.keys().cloned());
        records.push(record);
    }
    IntegratedTable {
        records,
        cost_columns: cost_columns.into_iter().collect(),
    }
}

fn reconcile_one(country: MergedCountry) -> IntegratedRecord {
    let MergedCountry {
        clave: _,
        aging,
        population,
        big_mac,
        tourist,
    } = country;

    let pais = first_present(vec![
        Candidate::new(
            SourceOrigin::Aging,
            aging.as_ref().and_then(|r| r.nombre_pais.clone()),
        ),
        Candidate::new(
            SourceOrigin::Population,
            population.as_ref().and_then(|r| r.pais.clone()),
        ),
        Candidate::new(
            SourceOrigin::BigMac,
            big_mac.as_ref().and_then(|r| r.pais.clone()),
        ),
        Candidate::new(
            SourceOrigin::TouristCosts,
            tourist.as_ref().and_then(|r| r.pais.clone()),
        ),
    ])
    .map(|r| r.value);

    let continente = first_present(vec![
        Candidate::new(
            SourceOrigin::Aging,
            aging.as_ref().and_then(|r| r.continente.clone()),
        ),
        Candidate::new(
            SourceOrigin::Population,
            population.as_ref().and_then(|r| r.continente.clone()),
        ),
        Candidate::new(
            SourceOrigin::BigMac,
            big_mac.as_ref().and_then(|r| r.continente.clone()),
        ),
        Candidate::new(
            SourceOrigin::TouristCosts,
            tourist.as_ref().and_then(|r| r.continente.clone()),
        ),
    ])
    .map(|r| r.value);

    // Capital and region only exist in the aging table and the tourist-cost
    // collection; the same relative order applies.
    let capital = first_present(vec![
        Candidate::new(
            SourceOrigin::Aging,
            aging.as_ref().and_then(|r| r.capital.clone()),
        ),
        Candidate::new(
            SourceOrigin::TouristCosts,
            tourist.as_ref().and_then(|r| r.capital.clone()),
        ),
    ])
    .map(|r| r.value);

    let region = first_present(vec![
        Candidate::new(
            SourceOrigin::Aging,
            aging.as_ref().and_then(|r| r.region.clone()),
        ),
        Candidate::new(
            SourceOrigin::TouristCosts,
            tourist.as_ref().and_then(|r| r.region.clone()),
        ),
    ])
    .map(|r| r.value);

    // Population: when both relational sources report, the canonical value is
    // their mean; one source is used unmodified; the tourist-cost population
    // is the remaining fallback.
    let poblacion = match (
        aging.as_ref().and_then(|r| r.poblacion),
        population.as_ref().and_then(|r| r.poblacion),
    ) {
        (Some(env), Some(pob)) => Some((env + pob) / 2.0),
        (Some(env), None) => Some(env),
        (None, Some(pob)) => Some(pob),
        (None, None) => tourist.as_ref().and_then(|t| t.poblacion),
    };

    // Costs: the tourist-cost document is the dedicated cost source; the
    // relational table fills any column it left empty.
    let mut costos: BTreeMap<String, f64> = tourist
        .as_ref()
        .map(|t| t.costos.clone())
        .unwrap_or_default();
    if let Some(pob) = population.as_ref() {
        let relational = [
            (RELATIONAL_COST_COLUMNS[0], pob.costo_bajo_hospedaje),
            (RELATIONAL_COST_COLUMNS[1], pob.costo_promedio_comida),
            (RELATIONAL_COST_COLUMNS[2], pob.costo_bajo_transporte),
            (RELATIONAL_COST_COLUMNS[3], pob.costo_promedio_entretenimiento),
        ];
        for (columna, valor) in relational {
            if let Some(v) = valor {
                costos.entry(columna.to_string()).or_insert(v);
            }
        }
    }
    // Only flattened columns carrying the cost marker make the projection.
    costos.retain(|columna, _| columna.contains("costo") && columna.contains('_'));

    IntegratedRecord {
        id_pais: aging.as_ref().and_then(|r| r.id_pais),
        pais,
        capital,
        continente,
        region,
        poblacion,
        tasa_de_envejecimiento: aging.as_ref().and_then(|r| r.tasa_de_envejecimiento),
        precio_big_mac_usd: big_mac.as_ref().and_then(|r| r.precio_big_mac_usd),
        costos,
    }
}
