//! Built-in formulas carried over from the planning office's dashboards.
//!
//! - `fasp`: Fondo de Aportaciones para la Seguridad Pública (15 indicators,
//!   ±10% corridor around the 2025 allocation). The default weights sum to
//!   0.8838; the pipeline renormalizes them.
//! - `fofisp`: Fondo para el Fortalecimiento de las Instituciones de
//!   Seguridad Pública (4 indicators, no corridor).
//! - `demo`: three regional indicators used by the introductory dashboard.

use std::collections::BTreeMap;

use crate::entities::{EntityRow, IndicatorTable};
use crate::tokens::{EntityId, IndicatorId};
use crate::variables::{BandSpec, Direction, FormulaSpec, IndicatorSpec, RedistributionMode};

pub const PRESET_NAMES: [&str; 3] = ["fasp", "fofisp", "demo"];

pub fn by_name(name: &str) -> Option<FormulaSpec> {
    match name {
        "fasp" => Some(fasp()),
        "fofisp" => Some(fofisp()),
        "demo" => Some(demo()),
        _ => None,
    }
}

/// Preset ids are literals, checked in tests.
fn id(s: &'static str) -> IndicatorId {
    IndicatorId::from_static(s)
}

fn ind(code: &'static str, label: &str, direction: Direction, weight: f64) -> IndicatorSpec {
    IndicatorSpec { id: id(code), label: Some(label.to_string()), direction, weight }
}

/// Every FASP indicator scores with `positive` direction, incidence included.
pub fn fasp() -> FormulaSpec {
    use Direction::Positive as P;
    FormulaSpec {
        name: "FASP 2026".to_string(),
        indicators: vec![
            ind("Pob", "Población", P, 0.125),
            ind("Inc_del", "Incidencia delictiva", P, 0.075),
            ind("Var_inc_del", "Variación incidencia delictiva", P, 0.05),
            ind("Victim", "Victimización", P, 0.0675),
            ind("Pob_penitenciaria", "Sobrepoblación penitenciaria", P, 0.0525),
            ind("Imp_justicia", "Impartición justicia", P, 0.03),
            ind("Servs_forenses", "Servicios Médicos Forenses", P, 0.07),
            ind("Edo_fza", "Tasa policial", P, 0.0525),
            ind("Dig_salarial", "Dignificación salarial", P, 0.0525),
            ind("Profesionalizacion", "Profesionalización", P, 0.0525),
            ind("Ctrl_confianza", "Control confianza", P, 0.0438),
            ind("Desemp_pol", "Desempeño policial", P, 0.075),
            ind("Conf_pol", "Confianza policial", P, 0.0375),
            ind("Eficiencia_presupuestal", "Eficiencia presupuestal", P, 0.05),
            ind("Base", "Base", P, 0.05),
        ],
        epsilon: 0.05,
        budget: 9_840_407_024.0,
        bands: Some(BandSpec {
            prior_column: id("Asignacion_2025"),
            lower_pct: 0.1,
            upper_pct: 0.1,
        }),
        redistribution: RedistributionMode::SinglePass,
        strict_indicators: true,
    }
}

pub fn fofisp() -> FormulaSpec {
    use Direction::{Negative as N, Positive as P};
    FormulaSpec {
        name: "FOFISP 2026".to_string(),
        indicators: vec![
            ind("Población", "Población", P, 0.75),
            ind("Var_edo_fza", "Incremento estado de fuerza", P, 0.10),
            ind("Var_incidencia_del", "Variación incidencia delictiva", N, 0.10),
            ind("Academias", "Academias", P, 0.05),
        ],
        epsilon: 0.05,
        budget: 1_155_443_263.97,
        bands: None,
        redistribution: RedistributionMode::SinglePass,
        strict_indicators: true,
    }
}

pub fn demo() -> FormulaSpec {
    use Direction::{Negative as N, Positive as P};
    FormulaSpec {
        name: "Índice de Asignación (demo)".to_string(),
        indicators: vec![
            ind("Gasto por Hab", "Gasto por habitante", P, 0.40),
            ind("Policías por 100k", "Policías por 100k habitantes", P, 0.30),
            ind("Tasa de Criminalidad", "Tasa de criminalidad", N, 0.30),
        ],
        epsilon: 0.01,
        budget: 1_000_000.0,
        bands: None,
        redistribution: RedistributionMode::SinglePass,
        strict_indicators: true,
    }
}

/// Five-region reference dataset matching `demo()`.
pub fn demo_dataset() -> IndicatorTable {
    let rows: [(&str, f64, f64, f64); 5] = [
        ("Central", 500.0, 350.0, 4500.0),
        ("Norte", 320.0, 210.0, 6800.0),
        ("Sur-Este", 780.0, 420.0, 3100.0),
        ("Occidente", 450.0, 280.0, 5500.0),
        ("Metropolitana", 610.0, 500.0, 4000.0),
    ];
    let entities = rows
        .iter()
        .map(|(name, gasto, policia, crimen)| {
            let mut values = BTreeMap::new();
            values.insert(id("Gasto por Hab"), *gasto);
            values.insert(id("Policías por 100k"), *policia);
            values.insert(id("Tasa de Criminalidad"), *crimen);
            EntityRow {
                entity: EntityId::from_static(*name),
                values,
            }
        })
        .collect();
    IndicatorTable { entities }
}
