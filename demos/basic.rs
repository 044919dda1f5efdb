use sipm_sim::io::{CsvFeatureWriter, Geometry, OutputSink};
use sipm_sim::{Config, Orchestrator, RawConfig};

fn main() {
    env_logger::init();

    // define settings: defaults matching the originating tool, dark counts
    // and afterpulsing left on, crosstalk off for a cleaner demonstration plot
    let raw = RawConfig {
        noxt: true,
        ..RawConfig::default()
    };
    let config = Config::build(raw).expect("valid configuration");
    config.log_settings_banner();

    // a handful of synthetic fibers, each with a few photon arrival times
    let records: Vec<(Vec<f64>, Geometry)> = vec![
        (
            vec![20.0, 20.3, 45.0],
            Geometry {
                event_id: 0,
                fiber_type_is_scintillating: true,
                fiber_id: 1,
                x: 0.1,
                y: 0.2,
                z: 0.0,
            },
        ),
        (
            vec![],
            Geometry {
                event_id: 1,
                fiber_type_is_scintillating: false,
                fiber_id: 2,
                x: -0.4,
                y: 0.1,
                z: 0.0,
            },
        ),
        (
            vec![12.0],
            Geometry {
                event_id: 2,
                fiber_type_is_scintillating: true,
                fiber_id: 3,
                x: 0.0,
                y: -0.3,
                z: 0.0,
            },
        ),
    ];

    let orchestrator = Orchestrator::new(config, 2);
    let results = orchestrator.run(records, true, false);

    let mut sink = CsvFeatureWriter::new(std::io::stdout());
    for (features, geom, waveform, counters) in &results {
        sink.write_feature_row(features, geom)
            .expect("writing to stdout cannot fail");
        if let Some(waveform) = waveform {
            let peak_sample = waveform
                .iter()
                .cloned()
                .fold(f64::MIN, f64::max);
            println!(
                "# event {}: n_pe={} n_dcr={} n_ap={} peak_sample={:.3}",
                geom.event_id, counters.n_pe_input, counters.n_dcr, counters.n_ap, peak_sample
            );
        }
    }
}
