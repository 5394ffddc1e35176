use callsite::{
    config::{BenchConfig, PhaseConfig},
    harness::Harness,
    policy::Population,
    receiver::ReceiverPool,
    report::{render_table, ReportWriter},
};
use tempfile::tempdir;

fn quick_config() -> BenchConfig {
    BenchConfig {
        loop_times: 100,
        forks: 2,
        warmup: PhaseConfig::new(2, 1),
        measurement: PhaseConfig::new(2, 1),
        ..BenchConfig::quick()
    }
}

#[test]
fn shipped_config_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/callsite.yaml");
    let config = BenchConfig::from_yaml(path).expect("config parses");
    assert_eq!(config, BenchConfig::default());
}

#[test]
fn runs_every_benchmark() {
    let pool = ReceiverPool::standard();
    let harness = Harness::new(&pool, quick_config()).unwrap();

    let reports = harness.run_all(&Population::ALL);

    let names: Vec<&str> = reports.iter().map(|r| r.benchmark.as_str()).collect();
    assert_eq!(
        names,
        vec!["dispatch_monomorphic", "dispatch_polymorphic", "dispatch_megamorphic"]
    );
    for report in &reports {
        assert_eq!(report.summary.samples, 4);
        assert!(report.summary.mean > 0.0);
        assert!(report.summary.min <= report.summary.max);
        assert_eq!(report.summary.unit, "ops/ms");
    }

    let table = render_table(&reports);
    assert_eq!(table.lines().count(), 4);
    assert!(table.contains("dispatch_megamorphic"));
}

#[test]
fn reports_are_written_as_json() {
    let pool = ReceiverPool::standard();
    let harness = Harness::new(&pool, quick_config()).unwrap();
    let report = harness.run(Population::Mega);
    let temp = tempdir().expect("tempdir");
    let writer = ReportWriter::new(temp.path().join("reports")).unwrap();

    let path = writer.write(&report).unwrap();

    assert!(path.ends_with("reports/dispatch_megamorphic.json"));
    let data = std::fs::read_to_string(&path).unwrap();
    assert!(data.contains("\"benchmark\": \"dispatch_megamorphic\""));
    assert!(data.contains("\"population\": \"mega\""));

    let loaded = writer.load("dispatch_megamorphic").unwrap();
    assert_eq!(loaded.seed, 42);
    assert_eq!(loaded.forks.len(), report.forks.len());
    assert_eq!(loaded.summary.samples, report.summary.samples);
}
