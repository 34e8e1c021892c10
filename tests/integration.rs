//! End-to-end integration tests for route-hypergraph.
//!
//! These tests run the full pipeline from a route file on disk through
//! reduction and assembly to the four written artifacts, and check that the
//! artifacts agree with each other.

use std::collections::HashMap;
use std::path::Path;

use route_hypergraph::config::ConvertConfig;
use route_hypergraph::error::{ConvertError, ExportError};
use route_hypergraph::export::{self, BundleFormat};
use route_hypergraph::loader::InputFormat;
use route_hypergraph::pipeline;

const TWO_ROUTES: &str = r#"[
  {"type": "mol", "name": "P1", "smiles": "CCO", "children": [
    {"type": "reaction", "smiles": "HIDDEN", "metadata": {"smiles": "HIDDEN_META", "rsmi": "CC>>CCO"},
     "children": [{"type": "mol", "smiles": "CC"}]}
  ]},
  {"type": "reaction", "children": [{"type": "mol", "smiles": "CC"}]}
]"#;

fn write_input(dir: &Path, name: &str, content: &str) -> ConvertConfig {
    let input = dir.join(name);
    std::fs::write(&input, content).unwrap();
    ConvertConfig::new(input)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn end_to_end_two_routes() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = write_input(dir.path(), "routes.json", TWO_ROUTES);

    let summary = pipeline::run(&cfg).unwrap();
    assert_eq!(summary.nodes, 2);
    assert_eq!(summary.edges, 2);
    assert_eq!(summary.incidence_pairs, 3);

    let paths = cfg.artifact_paths();
    assert_eq!(read(&paths.nodes_csv), "node_id,smiles\n0,CC\n1,CCO\n");
    assert_eq!(
        read(&paths.edges_csv),
        "edge_id,edge_name,target,reaction_count\n0,P1,CCO,1\n1,route_1,,1\n"
    );
    assert_eq!(
        read(&paths.incidence_csv),
        "node_id,smiles,edge_id,edge_name,target_smiles\n\
         0,CC,0,P1,CCO\n\
         1,CCO,0,P1,CCO\n\
         0,CC,1,route_1,\n"
    );

    let hg = export::read_bundle(&paths.bundle, None).unwrap();
    assert_eq!(hg.id_to_mol, vec!["CC", "CCO"]);
    assert_eq!(hg.incidence.node_ids, vec![0, 1, 0]);
    assert_eq!(hg.incidence.edge_ids, vec![0, 0, 1]);

    for path in [&paths.nodes_csv, &paths.edges_csv, &paths.incidence_csv] {
        assert!(!read(path).contains("HIDDEN"));
    }
    assert!(hg.id_to_mol.iter().all(|s| !s.contains("HIDDEN")));
}

#[test]
fn identical_input_gives_identical_bytes() {
    let input = r#"[
      {"type": "mol", "smiles": "Z", "children": [{"type": "reaction", "children": [
        {"type": "mol", "smiles": "B"}, {"type": "mol", "smiles": "A"}, {"type": "mol", "smiles": "Y"}
      ]}]},
      {"type": "mol", "smiles": "B", "children": [{"type": "reaction", "children": [
        {"type": "mol", "smiles": "A"}, {"type": "mol", "smiles": "Q"}
      ]}]}
    ]"#;

    let mut outputs = Vec::new();
    for parallel in [true, false] {
        let dir = tempfile::TempDir::new().unwrap();
        let mut cfg = write_input(dir.path(), "r.json", input);
        cfg.parallel = parallel;
        pipeline::run(&cfg).unwrap();
        let bytes: Vec<Vec<u8>> = cfg
            .artifact_paths()
            .iter()
            .map(|p| std::fs::read(p).unwrap())
            .collect();
        outputs.push(bytes);
    }
    assert_eq!(outputs[0], outputs[1]);
}

#[test]
fn shared_identifiers_get_one_id() {
    let input = r#"[
      {"type": "mol", "smiles": "A", "children": [{"type": "reaction", "children": [
        {"type": "mol", "smiles": "B", "children": [{"type": "reaction", "children": [
          {"type": "mol", "smiles": "A"}
        ]}]}
      ]}]},
      {"type": "mol", "smiles": "B"}
    ]"#;
    let hg = pipeline::convert_text(input, InputFormat::Auto, true, "inline").unwrap();
    assert_eq!(hg.id_to_mol, vec!["A", "B"]);
    assert_eq!(hg.incidence.len(), 3);
    assert!(hg.check_consistency().is_ok());
}

#[test]
fn reaction_fields_do_not_affect_output() {
    let baseline = TWO_ROUTES;
    let mutated = TWO_ROUTES
        .replace("\"smiles\": \"HIDDEN\"", "\"smiles\": \"SOMETHING_ELSE\"")
        .replace("CC>>CCO", "XX>>YY");

    let a = pipeline::convert_text(baseline, InputFormat::Auto, false, "a").unwrap();
    let b = pipeline::convert_text(&mutated, InputFormat::Auto, false, "b").unwrap();
    assert_eq!(a, b);
}

#[test]
fn reaction_only_route_keeps_its_edge() {
    let input = r#"[
      {"type": "mol", "smiles": "A"},
      {"type": "reaction", "children": [{"type": "reaction", "children": []}]}
    ]"#;
    let hg = pipeline::convert_text(input, InputFormat::Auto, false, "inline").unwrap();
    assert_eq!(hg.edge_count(), 2);
    assert_eq!(hg.routes[1].edge_name, "route_1");
    assert_eq!(hg.routes[1].target, "");
    assert_eq!(hg.routes[1].reaction_count, 2);
    assert_eq!(hg.edge_sizes(), vec![1, 0]);
}

/// Split one CSV row, honoring double-quoted fields with `""` escapes.
fn csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', _) => quoted = !quoted,
            (',', false) => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[test]
fn incidence_csv_equals_join_of_other_tables() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = r#"[
      {"type": "mol", "name": "Aspirin, \"acetylated\"", "smiles": "CC(=O)Oc1ccccc1C(=O)O", "children": [
        {"type": "reaction", "children": [
          {"type": "mol", "smiles": "Oc1ccccc1C(=O)O"}, {"type": "mol", "smiles": "CC(=O)OC(C)=O"},
          {"type": "mol", "smiles": "X,\"Q\""}
        ]}
      ]},
      {"type": "unknown", "children": [{"type": "mol", "smiles": "Oc1ccccc1C(=O)O"}]},
      {"type": "mol", "smiles": "O"}
    ]"#;
    let cfg = write_input(dir.path(), "aspirin.json", input);
    pipeline::run(&cfg).unwrap();
    let paths = cfg.artifact_paths();

    let nodes: HashMap<String, String> = read(&paths.nodes_csv)
        .lines()
        .skip(1)
        .map(|l| {
            let cols = csv_row(l);
            assert_eq!(cols.len(), 2, "bad nodes row: {l}");
            (cols[0].clone(), cols[1].clone())
        })
        .collect();
    assert!(nodes.values().any(|s| s == "X,\"Q\""));

    let edges: HashMap<String, (String, String)> = read(&paths.edges_csv)
        .lines()
        .skip(1)
        .map(|l| {
            let cols = csv_row(l);
            assert_eq!(cols.len(), 4, "bad edges row: {l}");
            (cols[0].clone(), (cols[1].clone(), cols[2].clone()))
        })
        .collect();
    assert_eq!(edges["0"].0, "Aspirin, \"acetylated\"");

    let hg = export::read_bundle(&paths.bundle, Some(BundleFormat::Bincode)).unwrap();
    let expected: Vec<Vec<String>> = hg
        .incidence
        .pairs()
        .map(|(n, e)| {
            let (name, target) = &edges[&e.to_string()];
            vec![
                n.to_string(),
                nodes[&n.to_string()].clone(),
                e.to_string(),
                name.clone(),
                target.clone(),
            ]
        })
        .collect();
    let incidence = read(&paths.incidence_csv);
    let mut rows = incidence.lines();
    assert_eq!(rows.next(), Some("node_id,smiles,edge_id,edge_name,target_smiles"));
    let actual: Vec<Vec<String>> = rows.map(csv_row).collect();
    assert_eq!(actual, expected);
}

#[test]
fn clashing_output_paths_abort_without_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cfg = write_input(dir.path(), "r.json", TWO_ROUTES);
    cfg.nodes_csv = Some(dir.path().join("same.csv"));
    cfg.edges_csv = Some(dir.path().join("same.csv"));

    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Export(ExportError::PathClash { .. })
    ));
    let left: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(left, vec![std::ffi::OsString::from("r.json")]);
}

#[test]
fn output_over_input_is_rejected() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut cfg = write_input(dir.path(), "r.json", TWO_ROUTES);
    cfg.bundle = Some(cfg.input.clone());
    cfg.bundle_format = BundleFormat::Json;

    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Export(ExportError::PathClash { first: "input", .. })
    ));
    assert_eq!(read(&cfg.input), TWO_ROUTES);
}

#[test]
fn deep_route_converts_end_to_end() {
    let levels = 300;
    let mut input = String::new();
    for i in 0..levels {
        input.push_str(&format!(
            r#"{{"type": "mol", "smiles": "M{i:03}", "children": [{{"type": "reaction", "children": ["#
        ));
    }
    input.push_str(r#"{"type": "mol", "smiles": "LEAF"}"#);
    input.push_str(&"]}]}".repeat(levels));

    let hg = pipeline::convert_text(&input, InputFormat::Auto, true, "deep").unwrap();
    assert_eq!(hg.node_count(), levels + 1);
    assert_eq!(hg.routes[0].reaction_count, levels as u64);
    assert_eq!(hg.routes[0].target, "M000");
}

#[test]
fn json_lines_input_and_json_bundle() {
    let dir = tempfile::TempDir::new().unwrap();
    let lines = "{\"type\": \"mol\", \"smiles\": \"A\"}\n{\"type\": \"mol\", \"name\": \"Bee\", \"smiles\": \"B\"}\n";
    let mut cfg = write_input(dir.path(), "routes.jsonl", lines);
    cfg.bundle_format = BundleFormat::Json;

    let summary = pipeline::run(&cfg).unwrap();
    assert_eq!(summary.edges, 2);
    assert!(summary.artifacts.bundle.ends_with("routes_hypergraph_per_route.json"));

    let bundle: serde_json::Value = serde_json::from_str(&read(&summary.artifacts.bundle)).unwrap();
    assert_eq!(bundle["id_to_mol"], serde_json::json!(["A", "B"]));
    assert_eq!(bundle["routes"][1]["edge_name"], "Bee");
    assert_eq!(bundle["hyperedge_index"][1], serde_json::json!([0, 1]));
}

#[test]
fn empty_input_aborts_without_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = write_input(dir.path(), "empty.json", "[]");
    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(err, ConvertError::NoRoutes { .. }));
    for path in cfg.artifact_paths().iter() {
        assert!(!path.exists());
    }
}

#[test]
fn malformed_input_aborts_without_artifacts() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = write_input(dir.path(), "bad.json", "{\"type\": \"mol\", ");
    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(err, ConvertError::Load(_)));
    for path in cfg.artifact_paths().iter() {
        assert!(!path.exists());
    }
}

#[test]
fn missing_input_is_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let cfg = ConvertConfig::new(dir.path().join("nope.json"));
    let err = pipeline::run(&cfg).unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Load(route_hypergraph::error::LoadError::Read { .. })
    ));
}

#[test]
fn config_file_drives_run() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    std::fs::write(&input, TWO_ROUTES).unwrap();

    let mut cfg = ConvertConfig::new(&input);
    cfg.out_dir = Some(dir.path().join("out"));
    cfg.parallel = false;
    let cfg_path = dir.path().join("convert.toml");
    cfg.save(&cfg_path).unwrap();

    let loaded = ConvertConfig::load(&cfg_path).unwrap();
    let summary = pipeline::run(&loaded).unwrap();
    assert!(summary.artifacts.nodes_csv.starts_with(dir.path().join("out")));
    assert!(summary.artifacts.nodes_csv.exists());
}
