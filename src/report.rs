// Result sinks: where finished sweep reports get delivered

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use log::info;

use crate::run_record::SweepReport;

/// Receives the finished sweep report for persistence. The simulation core
/// has no opinion on the output format.
pub trait ResultSink {
    fn write(&mut self, report: &SweepReport) -> io::Result<()>;
}

/// Writes the report as pretty-printed JSON to a single file.
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonFileSink {
    fn write(&mut self, report: &SweepReport) -> io::Result<()> {
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);

        serde_json::to_writer_pretty(&mut writer, report)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        writer.flush()?;

        info!("sweep report written to {}", self.path.display());
        Ok(())
    }
}

/// Discards the report. For sweeps that only need the in-process summary.
pub struct NullSink;

impl ResultSink for NullSink {
    fn write(&mut self, _report: &SweepReport) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::GraphKind;
    use crate::run_record::{RunRecord, SweepMetadata};
    use crate::time_step::NodeSelection;

    fn small_report() -> SweepReport {
        SweepReport {
            metadata: SweepMetadata {
                version: env!("CARGO_PKG_VERSION"),
                description: Some("sink test".into()),
                seed_used: [0u8; 32],
                graph_kind: GraphKind::Chain,
                node_count: 2,
                node_selection: NodeSelection::Uniform,
                distribution: None,
                single_node: None,
                interact_probability: 0.5,
                traversal_probability: 0.5,
                population_lower: 2,
                population_upper: 3,
                term_a: 4,
                term_b: 0,
                max_time_steps: 100,
                runs_per_population: 1,
                total_runs: 1,
                avg_infection_level: 100.0,
                avg_leader_error: 0.0,
            },
            runs: vec![RunRecord {
                population: 2,
                ..RunRecord::default()
            }],
        }
    }

    #[test]
    fn test_json_sink_writes_report() {
        let path = std::env::temp_dir().join("infection_sim_sink_test.json");
        let mut sink = JsonFileSink::new(&path);

        sink.write(&small_report()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"graph_kind\": \"chain\""));
        assert!(contents.contains("\"total_runs\": 1"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_null_sink_accepts_report() {
        NullSink.write(&small_report()).unwrap();
    }
}
