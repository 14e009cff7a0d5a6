// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! CSV reports of design points.
//!
//! Layer and partition points share one row schema. The `config` column
//! holds the configuration as JSON: a single object for a layer, an array
//! of per-layer objects for a partition. On-chip edges of a partition
//! carry the bandwidth `"inf"`.

use crate::ExplorerError;
use layer_model::{Configuration, DesignPoint, Metrics};
use partition_planner::{Observer, PartitionPoint};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub const HEADERS: [&str; 20] = [
    "Layer",
    "Latency(C)",
    "Latency(S)",
    "GOP/s",
    "volumes/s",
    "DSP(%)",
    "DSP_RAW",
    "BRAM(%)",
    "BRAM_RAW",
    "RateIn",
    "RateOut",
    "Depth",
    "Muls",
    "Adds",
    "Mem(W)",
    "Mem(KB)",
    "MemBoundIn",
    "MemBoundOut",
    "MemBwUtil(%)",
    "config",
];

/// One line of a report file.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Layer")]
    pub layer: String,
    #[serde(rename = "Latency(C)")]
    pub latency_cycles: u64,
    #[serde(rename = "Latency(S)")]
    pub latency_sec: f64,
    #[serde(rename = "GOP/s")]
    pub gops: f64,
    #[serde(rename = "volumes/s")]
    pub vols: f64,
    #[serde(rename = "DSP(%)")]
    pub dsp_util: f64,
    #[serde(rename = "DSP_RAW")]
    pub dsp_raw: u64,
    #[serde(rename = "BRAM(%)")]
    pub bram_util: f64,
    #[serde(rename = "BRAM_RAW")]
    pub bram_raw: u64,
    #[serde(rename = "RateIn")]
    pub rate_in: f64,
    #[serde(rename = "RateOut")]
    pub rate_out: f64,
    #[serde(rename = "Depth")]
    pub depth: u64,
    #[serde(rename = "Muls")]
    pub muls: u64,
    #[serde(rename = "Adds")]
    pub adds: u64,
    #[serde(rename = "Mem(W)")]
    pub memory_words: u64,
    #[serde(rename = "Mem(KB)")]
    pub memory_kb: f64,
    #[serde(rename = "MemBoundIn")]
    pub mem_bounded_in: bool,
    #[serde(rename = "MemBoundOut")]
    pub mem_bounded_out: bool,
    #[serde(rename = "MemBwUtil(%)")]
    pub mem_bw_util: f64,
    #[serde(rename = "config")]
    pub config: String,
}

impl ReportRow {
    fn new(layer: String, m: &Metrics, config: String) -> Self {
        Self {
            layer,
            latency_cycles: m.latency_cycles,
            latency_sec: m.latency_sec,
            gops: m.throughput_gops,
            vols: m.throughput_vols,
            dsp_util: m.utilization.dsp_util,
            dsp_raw: m.utilization.dsp_raw,
            bram_util: m.utilization.bram_util,
            bram_raw: m.utilization.bram_raw,
            rate_in: m.rate_in,
            rate_out: m.rate_out,
            depth: m.depth,
            muls: m.muls,
            adds: m.adds,
            memory_words: m.memory_words,
            memory_kb: m.memory_kb,
            mem_bounded_in: m.mem_bounded_in,
            mem_bounded_out: m.mem_bounded_out,
            mem_bw_util: m.mem_bw_util,
            config,
        }
    }

    pub fn from_point(point: &DesignPoint) -> Result<Self, ExplorerError> {
        let config = serde_json::to_string(&point.config)?;
        Ok(Self::new(point.layer.clone(), &point.metrics, config))
    }

    /// A partition row; the layer column carries the partition name.
    pub fn from_partition(point: &PartitionPoint) -> Result<Self, ExplorerError> {
        let configs: Vec<&Configuration> = point.configs().collect();
        let config = serde_json::to_string(&configs)?;
        Ok(Self::new(point.partition.clone(), &point.metrics, config))
    }

    /// Decodes the `config` column of a layer row.
    pub fn configuration(&self) -> Result<Configuration, ExplorerError> {
        Ok(serde_json::from_str(&self.config)?)
    }

    /// Decodes the `config` column of a partition row, one entry per layer.
    pub fn partition_configurations(&self) -> Result<Vec<Configuration>, ExplorerError> {
        Ok(serde_json::from_str(&self.config)?)
    }
}

/// Append-only CSV writer, safe to share between worker threads.
pub struct ReportWriter {
    path: PathBuf,
    inner: Mutex<csv::Writer<File>>,
}

impl ReportWriter {
    /// Creates (truncating) `path` and writes the header line.
    pub fn create(path: &Path) -> Result<Self, ExplorerError> {
        let file = File::create(path).map_err(|source| ExplorerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = Self::wrap(path, file);
        writer.lock().write_record(HEADERS)?;
        Ok(writer)
    }

    /// Opens an existing report for appending rows.
    pub fn append(path: &Path) -> Result<Self, ExplorerError> {
        let file = OpenOptions::new()
            .append(true)
            .open(path)
            .map_err(|source| ExplorerError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::wrap(path, file))
    }

    fn wrap(path: &Path, file: File) -> Self {
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        Self {
            path: path.to_path_buf(),
            inner: Mutex::new(writer),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, csv::Writer<File>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, row: &ReportRow) -> Result<(), ExplorerError> {
        self.lock().serialize(row)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), ExplorerError> {
        self.lock().flush().map_err(|source| ExplorerError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Writes every reported point to CSV as it arrives.
///
/// [`Observer`] callbacks cannot fail, so the first write error is kept
/// and returned by [`CsvRecorder::finish`].
pub struct CsvRecorder {
    layers: Option<ReportWriter>,
    partitions: Option<ReportWriter>,
    error: Mutex<Option<ExplorerError>>,
}

impl CsvRecorder {
    pub fn new(layers: Option<ReportWriter>, partitions: Option<ReportWriter>) -> Self {
        Self {
            layers,
            partitions,
            error: Mutex::new(None),
        }
    }

    fn record(&self, result: Result<(), ExplorerError>) {
        if let Err(e) = result {
            tracing::warn!("report write failed: {e}");
            let mut slot = self.error.lock().unwrap_or_else(|e| e.into_inner());
            slot.get_or_insert(e);
        }
    }

    /// Flushes both files and surfaces the first write error.
    pub fn finish(self) -> Result<(), ExplorerError> {
        if let Some(e) = self.error.into_inner().unwrap_or_else(|e| e.into_inner()) {
            return Err(e);
        }
        for writer in [self.layers, self.partitions].iter().flatten() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Observer for CsvRecorder {
    fn layer_point(&self, point: &DesignPoint) {
        if let Some(writer) = &self.layers {
            self.record(ReportRow::from_point(point).and_then(|row| writer.write(&row)));
        }
    }

    fn partition_point(&self, point: &PartitionPoint) {
        if let Some(writer) = &self.partitions {
            self.record(ReportRow::from_partition(point).and_then(|row| writer.write(&row)));
        }
    }
}

/// Writes a complete file of layer rows.
pub fn write_points<'a>(
    path: &Path,
    points: impl IntoIterator<Item = &'a DesignPoint>,
) -> Result<(), ExplorerError> {
    let writer = ReportWriter::create(path)?;
    for point in points {
        writer.write(&ReportRow::from_point(point)?)?;
    }
    writer.flush()
}

/// Reads every row of a report file.
pub fn read_rows(path: &Path) -> Result<Vec<ReportRow>, ExplorerError> {
    let mut reader = csv::Reader::from_path(path)?;
    reader
        .deserialize::<ReportRow>()
        .map(|row| row.map_err(ExplorerError::from))
        .collect()
}

/// Candidate configurations per layer from a layer report, grouped by
/// layer in order of first appearance, rows kept in file order.
pub fn read_candidates(path: &Path) -> Result<Vec<(String, Vec<Configuration>)>, ExplorerError> {
    let mut grouped: Vec<(String, Vec<Configuration>)> = Vec::new();
    for row in read_rows(path)? {
        let config = row.configuration()?;
        match grouped.iter_mut().find(|(layer, _)| *layer == row.layer) {
            Some((_, configs)) => configs.push(config),
            None => grouped.push((row.layer, vec![config])),
        }
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use device::{DeviceConfig, Utilization};
    use layer_model::Parallelism;

    fn point(layer: &str, c: f64) -> DesignPoint {
        let d = DeviceConfig::zc706();
        DesignPoint {
            layer: layer.into(),
            config: Configuration::new(Parallelism::Shared { coarse_inout: c }, 8.0, 24.0),
            metrics: Metrics {
                latency_cycles: 1234,
                latency_sec: d.cycles_to_seconds(1234.0),
                throughput_gops: 1.5,
                throughput_vols: 2.5,
                utilization: Utilization::from_resources(&d, 9, 1152),
                rate_in: 4.0,
                rate_out: 4.0,
                depth: 3,
                muls: 9,
                adds: 0,
                memory_words: 1152,
                memory_kb: d.words_to_kb(1152),
                mem_bounded_in: true,
                mem_bounded_out: false,
                mem_bw_util: 25.0,
                total_ops: 100.0,
            },
        }
    }

    #[test]
    fn test_header_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        write_points(&path, &[point("a", 0.5)]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("Layer,Latency(C),Latency(S),GOP/s,volumes/s,DSP(%)"));
        assert!(header.ends_with("MemBoundOut,MemBwUtil(%),config"));
    }

    #[test]
    fn test_rows_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        let written = point("a", 0.5);
        write_points(&path, [&written]).unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].latency_cycles, 1234);
        assert_eq!(rows[0].dsp_raw, 9);
        assert!(rows[0].mem_bounded_in);
        assert_eq!(rows[0].configuration().unwrap(), written.config);
    }

    #[test]
    fn test_candidates_grouped_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m_pareto.csv");
        let points = [point("b", 0.25), point("a", 0.5), point("b", 1.0), point("a", 0.125)];
        write_points(&path, &points).unwrap();
        let grouped = read_candidates(&path).unwrap();
        let names: Vec<&str> = grouped.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(grouped[0].1, vec![points[0].config, points[2].config]);
        assert_eq!(grouped[1].1, vec![points[1].config, points[3].config]);
    }

    #[test]
    fn test_recorder_writes_layer_points() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.csv");
        let recorder = CsvRecorder::new(Some(ReportWriter::create(&path).unwrap()), None);
        recorder.layer_point(&point("a", 0.5));
        recorder.layer_point(&point("a", 1.0));
        recorder.finish().unwrap();
        assert_eq!(read_rows(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_append_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        write_points(&path, &[point("a", 0.5)]).unwrap();
        let writer = ReportWriter::append(&path).unwrap();
        writer.write(&ReportRow::from_point(&point("a_best", 0.5)).unwrap()).unwrap();
        writer.flush().unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].layer, "a_best");
    }

    #[test]
    fn test_partition_configs_read_back() {
        let mut first = point("a", 0.5);
        first.config = first.config.with_bandwidth(8.0, f64::INFINITY);
        let mut second = point("b", 1.0);
        second.config = second.config.with_bandwidth(f64::INFINITY, 24.0);
        let partition = PartitionPoint {
            partition: "part_0".into(),
            index: 3,
            metrics: first.metrics,
            layers: vec![first.clone(), second.clone()],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part_0.csv");
        let writer = ReportWriter::create(&path).unwrap();
        writer.write(&ReportRow::from_partition(&partition).unwrap()).unwrap();
        writer.flush().unwrap();
        let rows = read_rows(&path).unwrap();
        assert_eq!(rows[0].layer, "part_0");
        let configs = rows[0].partition_configurations().unwrap();
        assert_eq!(configs, vec![first.config, second.config]);
        assert_eq!(configs[0].mem_bw_out, f64::INFINITY);
    }
}
