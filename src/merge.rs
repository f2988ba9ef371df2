// Source Merger: chained full outer joins on the normalized key.
//
// Join order is fixed: aging table, population table, big-mac collection,
// tourist-cost collection. Each source's payload is kept whole, so colliding
// fields (continent, population, the itemized costs) survive side by side
// for the reconciler.
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::normalize::normalized_key;
use crate::types::{AgingRow, BigMacDoc, MergedCountry, PopulationRow, TouristCostDoc};

#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub aging_keys: usize,
    pub population_keys: usize,
    pub big_mac_keys: usize,
    pub tourist_keys: usize,
    /// Rows collapsed because their key already appeared in the same source.
    pub duplicate_keys: usize,
    pub merged_total: usize,
}

/// Pairwise full outer join: every key from either side appears exactly once,
/// with the missing side left as `None`.
pub fn outer_join<K: Ord, L, R>(
    left: BTreeMap<K, L>,
    right: BTreeMap<K, R>,
) -> BTreeMap<K, (Option<L>, Option<R>)> {
    let mut joined: BTreeMap<K, (Option<L>, Option<R>)> = BTreeMap::new();
    for (key, l) in left {
        joined.insert(key, (Some(l), None));
    }
    for (key, r) in right {
        match joined.entry(key) {
            Entry::Occupied(mut e) => {
                e.get_mut().1 = Some(r);
            }
            Entry::Vacant(v) => {
                v.insert((None, Some(r)));
            }
        }
    }
    joined
}

/// Index rows by normalized key. The merged table must hold exactly one row
/// per key, so duplicate keys within one source collapse to the first
/// occurrence; the collapse count is reported.
fn key_by<T, F>(rows: Vec<T>, key_fn: F) -> (BTreeMap<String, T>, usize)
where
    F: Fn(&T) -> String,
{
    let mut map = BTreeMap::new();
    let mut duplicates = 0usize;
    for row in rows {
        let key = key_fn(&row);
        if map.contains_key(&key) {
            duplicates += 1;
            continue;
        }
        map.insert(key, row);
    }
    (map, duplicates)
}

pub fn merge_sources(
    aging: Vec<AgingRow>,
    population: Vec<PopulationRow>,
    big_mac: Vec<BigMacDoc>,
    tourist: Vec<TouristCostDoc>,
) -> (Vec<MergedCountry>, MergeReport) {
    let (aging_map, dup_a) = key_by(aging, |r| normalized_key(r.nombre_pais.as_deref()));
    let (population_map, dup_p) = key_by(population, |r| normalized_key(r.pais.as_deref()));
    let (big_mac_map, dup_b) = key_by(big_mac, |r| normalized_key(r.pais.as_deref()));
    let (tourist_map, dup_t) = key_by(tourist, |r| normalized_key(r.pais.as_deref()));

    let mut report = MergeReport {
        aging_keys: aging_map.len(),
        population_keys: population_map.len(),
        big_mac_keys: big_mac_map.len(),
        tourist_keys: tourist_map.len(),
        duplicate_keys: dup_a + dup_p + dup_b + dup_t,
        merged_total: 0,
    };

    let relational = outer_join(aging_map, population_map);
    let with_big_mac = outer_join(relational, big_mac_map);
    let full = outer_join(with_big_mac, tourist_map);

    let merged: Vec<MergedCountry> = full
        .into_iter()
        .map(|(clave, (previo, tourist))| {
            let (relational, big_mac) = previo.map_or((None, None), |(rel, mac)| (rel, mac));
            let (aging, population) =
                relational.map_or((None, None), |(env, pob)| (env, pob));
            MergedCountry {
                clave,
                aging,
                population,
                big_mac,
                tourist,
            }
        })
        .collect();

    report.merged_total = merged.len();
    (merged, report)
}
