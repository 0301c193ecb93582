use std::path::PathBuf;

use assert_json_diff::assert_json_include;
use serde_json::json;

use fondo_core::presets;
use fondo_io::hasher::sha256_canonical;
use fondo_io::loader::{InputDigests, LoadedInputs};
use fondo_io::manifest::FormulaSource;
use fondo_pipeline::{run_with_ctx, PipelineCtx};
use fondo_report::{build_model, render_json, render_value};

fn demo_outputs() -> (serde_json::Value, serde_json::Value) {
    let table = presets::demo_dataset();
    let formula = presets::demo();
    let digests = InputDigests {
        dataset_sha256: sha256_canonical(&table).unwrap(),
        formula_sha256: sha256_canonical(&formula).unwrap(),
    };
    let loaded = LoadedInputs {
        table,
        formula,
        formula_source: FormulaSource::Preset("demo".into()),
        dataset_path: PathBuf::from("demo.json"),
        digests,
    };
    let out = run_with_ctx(PipelineCtx::new(loaded)).unwrap();
    (
        serde_json::to_value(&out.result).unwrap(),
        serde_json::to_value(&out.run_record).unwrap(),
    )
}

#[test]
fn demo_report_is_balanced_and_ranked() {
    let (result, run) = demo_outputs();
    let m = build_model(&result, &run).unwrap();

    assert_eq!(m.cover.budget, "$1,000,000.00");
    assert_eq!(m.weights.sum_label, "Suma: 100.00%");
    assert!(m.totals.balanced);
    assert!(m.band.is_none());
    assert_eq!(m.allocation.len(), 5);
    assert_eq!(m.allocation[0].rank, 1);
    assert_eq!(m.allocation[0].index, "100.00%");
    assert!(m.allocation.iter().all(|l| l.prior.is_none()));
    assert_eq!(m.integrity.formula_source, "preset:demo");
}

#[test]
fn rendered_json_keeps_sections() {
    let (result, run) = demo_outputs();
    let m = build_model(&result, &run).unwrap();

    let text = render_json(&m).unwrap();
    assert!(text.ends_with('\n'));
    let v = render_value(&m).unwrap();
    assert_json_include!(
        actual: v,
        expected: json!({
            "cover": {"entity_count": 5},
            "totals": {"balanced": true},
            "band": null
        })
    );
}
