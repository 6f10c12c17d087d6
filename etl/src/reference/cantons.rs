use once_cell::sync::Lazy;
use std::collections::HashMap;

pub const COUNTRY: &str = "ECUADOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CantonInfo {
    pub canton: &'static str,
    pub province: &'static str,
    pub region: &'static str,
}

// (code, canton, province, region)
const CANTONS: [(&str, &str, &str, &str); 17] = [
    ("10701", "CUENCA", "AZUAY", "SIERRA"),
    ("10911", "GIRON", "AZUAY", "SIERRA"),
    ("10901", "GUALACEO", "AZUAY", "SIERRA"),
    ("10927", "SANTA ISABEL", "AZUAY", "SIERRA"),
    ("20606", "PLAYAS", "GUAYAS", "COSTA"),
    ("21101", "GUAYAQUIL", "GUAYAS", "COSTA"),
    ("21709", "MILAGRO", "GUAYAS", "COSTA"),
    ("31905", "ZAMORA", "ZAMORA CHINCHIPE", "AMAZONIA"),
    ("20501", "QUITO", "PICHINCHA", "SIERRA"),
    ("20505", "CAYAMBE", "PICHINCHA", "SIERRA"),
    ("30101", "LAGO AGRIO", "SUCUMBIOS", "AMAZONIA"),
    ("30201", "GONZALO PIZARRO", "SUCUMBIOS", "AMAZONIA"),
    ("30301", "PUTUMAYO", "SUCUMBIOS", "AMAZONIA"),
    ("30401", "SHUSHUFINDI", "SUCUMBIOS", "AMAZONIA"),
    ("30501", "SUCUMBIOS", "SUCUMBIOS", "AMAZONIA"),
    ("30601", "CASCALES", "SUCUMBIOS", "AMAZONIA"),
    ("30701", "CUYABENO", "SUCUMBIOS", "AMAZONIA"),
];

static CANTON_INDEX: Lazy<HashMap<&'static str, CantonInfo>> = Lazy::new(|| {
    CANTONS
        .iter()
        .map(|&(code, canton, province, region)| {
            (
                code,
                CantonInfo {
                    canton,
                    province,
                    region,
                },
            )
        })
        .collect()
});

/// Resolves a canton code exactly as written (callers trim beforehand).
pub fn lookup_canton(code: &str) -> Option<CantonInfo> {
    CANTON_INDEX.get(code).copied()
}
