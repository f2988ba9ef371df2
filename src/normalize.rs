// Country-name normalization.
//
// The four sources spell countries differently ("United States", "USA",
// "estados unidos"); everything joins on the normalized key produced here.
// The key is only ever a join key, never a display value.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Known variant spellings, lower-cased, mapped to one canonical spelling.
/// Targets are never themselves alias keys, which keeps normalization
/// idempotent.
static COUNTRY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("united states", "estados unidos"),
        ("united states of america", "estados unidos"),
        ("usa", "estados unidos"),
        ("united kingdom", "reino unido"),
        ("uk", "reino unido"),
        ("czech republic", "república checa"),
        ("russia", "rusia"),
        ("vatican city", "ciudad del vaticano"),
    ])
});

/// Normalize one raw country-name string: lower-case, then resolve through
/// the alias table. Unmapped values pass through lower-cased.
pub fn normalize_country(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match COUNTRY_ALIASES.get(lowered.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => lowered,
    }
}

/// Key for a possibly-absent name field. An absent name normalizes to the
/// empty key so the row still participates in the outer joins; imputation
/// labels it later rather than dropping the entity.
pub fn normalized_key(nombre: Option<&str>) -> String {
    normalize_country(nombre.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_canonical_spelling() {
        assert_eq!(normalize_country("United States"), "estados unidos");
        assert_eq!(normalize_country("USA"), "estados unidos");
        assert_eq!(normalize_country("UK"), "reino unido");
        assert_eq!(normalize_country("Czech Republic"), "república checa");
    }

    #[test]
    fn unmapped_names_pass_through_lowercased() {
        assert_eq!(normalize_country("España"), "españa");
        assert_eq!(normalize_country("  Chile "), "chile");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["United States", "uk", "Rusia", "japón", "Vatican City"] {
            let once = normalize_country(raw);
            assert_eq!(normalize_country(&once), once);
        }
    }

    #[test]
    fn absent_name_yields_empty_key() {
        assert_eq!(normalized_key(None), "");
        assert_eq!(normalized_key(Some("")), "");
    }
}
