//! mzDB fixture builder shared by the unit tests, integration tests and benches
//!
//! Writes small but schema-complete mzDB files with rusqlite so tests run
//! against real SQLite containers.
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::{DeflateEncoder, ZlibEncoder};
use rusqlite::{params, Connection};

// ============================================================================
// Definitions
// ============================================================================

/// One `data_encoding` row
#[derive(Debug, Clone)]
pub struct EncodingDef {
    pub id: i64,
    pub mode: String,
    pub compression: String,
    pub byte_order: String,
    pub mz_precision: i64,
    pub intensity_precision: i64,
    pub peak_layout: Option<String>,
}

impl EncodingDef {
    pub fn new(id: i64, mode: &str, mz_precision: i64, intensity_precision: i64) -> Self {
        Self {
            id,
            mode: mode.to_string(),
            compression: "none".to_string(),
            byte_order: "little_endian".to_string(),
            mz_precision,
            intensity_precision,
            peak_layout: None,
        }
    }

    fn is_fitted(&self) -> bool {
        self.mode.eq_ignore_ascii_case("fitted")
    }

    fn is_big_endian(&self) -> bool {
        self.byte_order.eq_ignore_ascii_case("big_endian")
    }

    fn is_separate(&self) -> bool {
        self.peak_layout
            .as_deref()
            .map_or(false, |layout| layout.eq_ignore_ascii_case("separate"))
    }
}

/// One `run_slice` row
#[derive(Debug, Clone)]
pub struct RunSliceDef {
    pub id: i64,
    pub ms_level: i64,
    pub number: i64,
    pub begin_mz: f64,
    pub end_mz: f64,
}

/// One `spectrum` row; `declared_peaks` overrides the count derived from the boxes
#[derive(Debug, Clone)]
pub struct SpectrumDef {
    pub id: i64,
    pub cycle: i64,
    pub time: f64,
    pub ms_level: i64,
    pub precursor_mz: Option<f64>,
    pub precursor_charge: Option<i64>,
    pub data_encoding_id: i64,
    pub bb_first_spectrum_id: i64,
    pub declared_peaks: Option<i64>,
}

/// One peak as written to a payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakDef {
    pub mz: f64,
    pub intensity: f64,
    pub left_hwhm: f32,
    pub right_hwhm: f32,
}

pub fn peak(mz: f64, intensity: f64) -> PeakDef {
    PeakDef {
        mz,
        intensity,
        left_hwhm: 0.0,
        right_hwhm: 0.0,
    }
}

/// One `bounding_box` row with its spectrum slices
#[derive(Debug, Clone)]
pub struct BoxDef {
    pub id: i64,
    pub run_slice_id: i64,
    pub first_spectrum_id: i64,
    pub last_spectrum_id: i64,
    pub slices: Vec<(i64, Vec<PeakDef>)>,
    /// Bytes cut from the end of the encoded payload
    pub truncate_by: usize,
}

// ============================================================================
// Payload encoding
// ============================================================================

fn put_i32(out: &mut Vec<u8>, value: i32, big: bool) {
    if big {
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn put_f32(out: &mut Vec<u8>, value: f32, big: bool) {
    if big {
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

fn put_float(out: &mut Vec<u8>, value: f64, bits: i64, big: bool) {
    if bits == 32 {
        put_f32(out, value as f32, big);
    } else if big {
        out.extend_from_slice(&value.to_be_bytes());
    } else {
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Encode spectrum slices the way an mzDB writer does
pub fn encode_payload(encoding: &EncodingDef, slices: &[(i64, Vec<PeakDef>)]) -> Vec<u8> {
    let big = encoding.is_big_endian();
    let fitted = encoding.is_fitted();
    let mut raw = Vec::new();

    for (spectrum_id, peaks) in slices {
        put_i32(&mut raw, *spectrum_id as i32, big);
        put_i32(&mut raw, peaks.len() as i32, big);

        if encoding.is_separate() {
            for p in peaks {
                put_float(&mut raw, p.mz, encoding.mz_precision, big);
            }
            for p in peaks {
                put_float(&mut raw, p.intensity, encoding.intensity_precision, big);
            }
            if fitted {
                for p in peaks {
                    put_f32(&mut raw, p.left_hwhm, big);
                }
                for p in peaks {
                    put_f32(&mut raw, p.right_hwhm, big);
                }
            }
        } else {
            for p in peaks {
                put_float(&mut raw, p.mz, encoding.mz_precision, big);
                put_float(&mut raw, p.intensity, encoding.intensity_precision, big);
                if fitted {
                    put_f32(&mut raw, p.left_hwhm, big);
                    put_f32(&mut raw, p.right_hwhm, big);
                }
            }
        }
    }

    match encoding.compression.to_ascii_lowercase().as_str() {
        "zlib" => {
            let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).expect("in-memory write");
            encoder.finish().expect("in-memory write")
        }
        "deflate" => {
            let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(&raw).expect("in-memory write");
            encoder.finish().expect("in-memory write")
        }
        _ => raw,
    }
}

/// Precursor list with an isolation window of `offset` on both sides of `mz`
pub fn precursor_list(mz: f64, offset: f64) -> String {
    format!(
        "<precursorList count=\"1\"><precursor><isolationWindow>\
         <cvParam cvRef=\"MS\" accession=\"MS:1000827\" value=\"{mz}\" name=\"isolation window target m/z\"/>\
         <cvParam cvRef=\"MS\" accession=\"MS:1000828\" value=\"{offset}\" name=\"isolation window lower offset\"/>\
         <cvParam cvRef=\"MS\" accession=\"MS:1000829\" value=\"{offset}\" name=\"isolation window upper offset\"/>\
         </isolationWindow></precursor></precursorList>"
    )
}

// ============================================================================
// Builder
// ============================================================================

const SCHEMA: &str = "
CREATE TABLE mzdb (
    version TEXT NOT NULL, creation_timestamp TEXT, file_content TEXT,
    contacts TEXT, param_tree TEXT);
CREATE TABLE software (
    id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, version TEXT NOT NULL,
    param_tree TEXT, shared_param_tree_id INTEGER);
CREATE TABLE run_slice (
    id INTEGER PRIMARY KEY AUTOINCREMENT, ms_level INTEGER NOT NULL, number INTEGER NOT NULL,
    begin_mz REAL NOT NULL, end_mz REAL NOT NULL, param_tree TEXT, run_id INTEGER NOT NULL);
CREATE TABLE spectrum (
    id INTEGER PRIMARY KEY AUTOINCREMENT, initial_id INTEGER NOT NULL, title TEXT NOT NULL,
    cycle INTEGER NOT NULL, time REAL NOT NULL, ms_level INTEGER NOT NULL,
    activation_type TEXT, tic REAL NOT NULL, base_peak_mz REAL NOT NULL,
    base_peak_intensity REAL NOT NULL, main_precursor_mz REAL, main_precursor_charge INTEGER,
    data_points_count INTEGER NOT NULL, param_tree TEXT, scan_list TEXT,
    precursor_list TEXT, product_list TEXT, shared_param_tree_id INTEGER,
    instrument_configuration_id INTEGER, source_file_id INTEGER, run_id INTEGER NOT NULL,
    data_processing_id INTEGER, data_encoding_id INTEGER NOT NULL,
    bb_first_spectrum_id INTEGER NOT NULL);
CREATE TABLE bounding_box (
    id INTEGER PRIMARY KEY AUTOINCREMENT, data BLOB NOT NULL, run_slice_id INTEGER NOT NULL,
    first_spectrum_id INTEGER NOT NULL, last_spectrum_id INTEGER NOT NULL);
CREATE TABLE run (
    id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, start_timestamp TEXT,
    param_tree TEXT, shared_param_tree_id INTEGER, sample_id INTEGER,
    default_instrument_config_id INTEGER NOT NULL, default_source_file_id INTEGER,
    default_scan_processing_id INTEGER NOT NULL, default_chrom_processing_id INTEGER NOT NULL);
CREATE TABLE source_file (
    id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, location TEXT NOT NULL,
    param_tree TEXT, shared_param_tree_id INTEGER);
CREATE TABLE instrument_configuration (
    id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, param_tree TEXT,
    component_list TEXT NOT NULL, shared_param_tree_id INTEGER, software_id INTEGER NOT NULL);
CREATE TABLE chromatogram (
    id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL, activation_type TEXT,
    data_points BLOB, param_tree TEXT, run_id INTEGER);
CREATE INDEX spectrum_ms_level_idx ON spectrum (ms_level);
CREATE INDEX bounding_box_first_spectrum_idx ON bounding_box (first_spectrum_id);
";

/// Builds mzDB files from plain definitions
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    pub encodings: Vec<EncodingDef>,
    pub run_slices: Vec<RunSliceDef>,
    pub spectra: Vec<SpectrumDef>,
    pub boxes: Vec<BoxDef>,
    pub chromatogram_param_trees: Vec<String>,
    pub software_version: Option<String>,
    /// Lower and upper isolation window offset around each precursor
    pub isolation_offset: f64,
    pub with_rtree: bool,
    pub omitted_tables: Vec<String>,
}

impl FixtureBuilder {
    pub fn empty() -> Self {
        Self {
            encodings: Vec::new(),
            run_slices: Vec::new(),
            spectra: Vec::new(),
            boxes: Vec::new(),
            chromatogram_param_trees: Vec::new(),
            software_version: Some("0.9.10".to_string()),
            isolation_offset: 1.0,
            with_rtree: true,
            omitted_tables: Vec::new(),
        }
    }

    /// Three spectra (MS1, MS2, MS1) over three run slices
    ///
    /// | spectrum | level | time | peaks                                   |
    /// |----------|-------|------|-----------------------------------------|
    /// | 1        | 1     | 10.0 | (100.5, 10) (150.25, 20) (250.0, 30)    |
    /// | 2        | 2     | 10.5 | (50.0, 1.5) (75.25, 2.5)                |
    /// | 3        | 1     | 11.0 | (120.0, 5)                              |
    pub fn standard() -> Self {
        let mut builder = Self::empty();
        builder.encodings = vec![
            EncodingDef::new(1, "profile", 64, 32),
            EncodingDef::new(2, "centroid", 64, 64),
        ];
        builder.run_slices = vec![
            RunSliceDef { id: 1, ms_level: 1, number: 1, begin_mz: 100.0, end_mz: 200.0 },
            RunSliceDef { id: 2, ms_level: 1, number: 2, begin_mz: 200.0, end_mz: 300.0 },
            RunSliceDef { id: 3, ms_level: 2, number: 1, begin_mz: 0.0, end_mz: 2000.0 },
        ];
        builder.spectra = vec![
            SpectrumDef {
                id: 1,
                cycle: 1,
                time: 10.0,
                ms_level: 1,
                precursor_mz: None,
                precursor_charge: None,
                data_encoding_id: 1,
                bb_first_spectrum_id: 1,
                declared_peaks: None,
            },
            SpectrumDef {
                id: 2,
                cycle: 1,
                time: 10.5,
                ms_level: 2,
                precursor_mz: Some(150.25),
                precursor_charge: Some(2),
                data_encoding_id: 2,
                bb_first_spectrum_id: 2,
                declared_peaks: None,
            },
            SpectrumDef {
                id: 3,
                cycle: 2,
                time: 11.0,
                ms_level: 1,
                precursor_mz: None,
                precursor_charge: None,
                data_encoding_id: 1,
                bb_first_spectrum_id: 1,
                declared_peaks: None,
            },
        ];
        builder.boxes = vec![
            BoxDef {
                id: 1,
                run_slice_id: 1,
                first_spectrum_id: 1,
                last_spectrum_id: 3,
                slices: vec![
                    (1, vec![peak(100.5, 10.0), peak(150.25, 20.0)]),
                    (3, vec![peak(120.0, 5.0)]),
                ],
                truncate_by: 0,
            },
            BoxDef {
                id: 2,
                run_slice_id: 2,
                first_spectrum_id: 1,
                last_spectrum_id: 3,
                slices: vec![(1, vec![peak(250.0, 30.0)]), (3, vec![])],
                truncate_by: 0,
            },
            BoxDef {
                id: 3,
                run_slice_id: 3,
                first_spectrum_id: 2,
                last_spectrum_id: 2,
                slices: vec![(2, vec![peak(50.0, 1.5), peak(75.25, 2.5)])],
                truncate_by: 0,
            },
        ];
        builder.chromatogram_param_trees = vec!["<params><cvParams/></params>".to_string()];
        builder
    }

    /// `cycles` MS1 spectra, each followed by one MS2 spectrum
    ///
    /// MS1 peaks are spread over `run_slices` slices of 100 m/z; MS1 spectra are
    /// grouped by `cycles_per_group` into shared bounding boxes.
    pub fn synthetic(
        cycles: i64,
        run_slices: i64,
        peaks_per_slice: usize,
        cycles_per_group: i64,
    ) -> Self {
        let mut builder = Self::empty();
        builder.encodings = vec![
            EncodingDef::new(1, "profile", 64, 32),
            EncodingDef::new(2, "centroid", 64, 32),
        ];
        for n in 0..run_slices {
            builder.run_slices.push(RunSliceDef {
                id: n + 1,
                ms_level: 1,
                number: n + 1,
                begin_mz: 100.0 * (n + 1) as f64,
                end_mz: 100.0 * (n + 2) as f64,
            });
        }
        let msn_slice = run_slices + 1;
        builder.run_slices.push(RunSliceDef {
            id: msn_slice,
            ms_level: 2,
            number: 1,
            begin_mz: 0.0,
            end_mz: 5000.0,
        });

        let ms1_id = |cycle: i64| 2 * cycle - 1;
        let mut next_box = 1;
        for group_start in (1..=cycles).step_by(cycles_per_group as usize) {
            let group_end = (group_start + cycles_per_group - 1).min(cycles);
            let first = ms1_id(group_start);
            let last = ms1_id(group_end);
            for n in 0..run_slices {
                let begin = 100.0 * (n + 1) as f64;
                let slices = (group_start..=group_end)
                    .map(|cycle| {
                        let peaks = (0..peaks_per_slice)
                            .map(|j| {
                                peak(
                                    begin + j as f64 * (100.0 / peaks_per_slice as f64),
                                    (cycle * 100 + j as i64) as f64,
                                )
                            })
                            .collect();
                        (ms1_id(cycle), peaks)
                    })
                    .collect();
                builder.boxes.push(BoxDef {
                    id: next_box,
                    run_slice_id: n + 1,
                    first_spectrum_id: first,
                    last_spectrum_id: last,
                    slices,
                    truncate_by: 0,
                });
                next_box += 1;
            }
            for cycle in group_start..=group_end {
                builder.spectra.push(SpectrumDef {
                    id: ms1_id(cycle),
                    cycle,
                    time: cycle as f64,
                    ms_level: 1,
                    precursor_mz: None,
                    precursor_charge: None,
                    data_encoding_id: 1,
                    bb_first_spectrum_id: first,
                    declared_peaks: None,
                });
                let ms2_id = ms1_id(cycle) + 1;
                builder.spectra.push(SpectrumDef {
                    id: ms2_id,
                    cycle,
                    time: cycle as f64 + 0.5,
                    ms_level: 2,
                    precursor_mz: Some(450.5),
                    precursor_charge: Some(2),
                    data_encoding_id: 2,
                    bb_first_spectrum_id: ms2_id,
                    declared_peaks: None,
                });
                builder.boxes.push(BoxDef {
                    id: next_box,
                    run_slice_id: msn_slice,
                    first_spectrum_id: ms2_id,
                    last_spectrum_id: ms2_id,
                    slices: vec![(ms2_id, vec![peak(200.5, 7.0), peak(300.5, 9.0)])],
                    truncate_by: 0,
                });
                next_box += 1;
            }
        }
        builder.spectra.sort_by_key(|s| s.id);
        builder
    }

    pub fn encoding_mut(&mut self, id: i64) -> &mut EncodingDef {
        self.encodings
            .iter_mut()
            .find(|e| e.id == id)
            .expect("unknown encoding id")
    }

    pub fn spectrum_mut(&mut self, id: i64) -> &mut SpectrumDef {
        self.spectra
            .iter_mut()
            .find(|s| s.id == id)
            .expect("unknown spectrum id")
    }

    pub fn box_mut(&mut self, id: i64) -> &mut BoxDef {
        self.boxes
            .iter_mut()
            .find(|b| b.id == id)
            .expect("unknown bounding box id")
    }

    pub fn without_rtree(mut self) -> Self {
        self.with_rtree = false;
        self
    }

    pub fn without_table(mut self, table: &str) -> Self {
        self.omitted_tables.push(table.to_string());
        self
    }

    /// Peaks written for a spectrum, in bounding box (run slice) order
    pub fn peaks_of(&self, spectrum_id: i64) -> Vec<PeakDef> {
        let mut boxes: Vec<&BoxDef> = self.boxes.iter().collect();
        boxes.sort_by(|a, b| {
            let begin = |bb: &BoxDef| {
                self.run_slices
                    .iter()
                    .find(|rs| rs.id == bb.run_slice_id)
                    .map_or(0.0, |rs| rs.begin_mz)
            };
            begin(a).total_cmp(&begin(b)).then(a.id.cmp(&b.id))
        });
        boxes
            .iter()
            .flat_map(|bb| bb.slices.iter())
            .filter(|(id, _)| *id == spectrum_id)
            .flat_map(|(_, peaks)| peaks.iter().copied())
            .collect()
    }

    fn encoding_for_box(&self, bb: &BoxDef) -> &EncodingDef {
        let encoding_id = self
            .spectra
            .iter()
            .find(|s| s.id == bb.first_spectrum_id)
            .map_or(1, |s| s.data_encoding_id);
        self.encodings
            .iter()
            .find(|e| e.id == encoding_id)
            .expect("bounding box without encoding")
    }

    /// Write the fixture into `dir` and return the file path
    pub fn build_in(&self, dir: &Path) -> rusqlite::Result<PathBuf> {
        let path = dir.join("fixture.mzDB");
        self.build(&path)?;
        Ok(path)
    }

    /// Write the fixture to `path`
    pub fn build(&self, path: &Path) -> rusqlite::Result<()> {
        let mut conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        let with_layout = self.encodings.iter().any(|e| e.peak_layout.is_some());
        conn.execute_batch(&format!(
            "CREATE TABLE data_encoding (
                id INTEGER PRIMARY KEY AUTOINCREMENT, mode TEXT NOT NULL, compression TEXT,
                byte_order TEXT NOT NULL, mz_precision INTEGER NOT NULL,
                intensity_precision INTEGER NOT NULL, param_tree TEXT{});",
            if with_layout { ", peak_layout TEXT" } else { "" }
        ))?;
        if self.with_rtree {
            conn.execute_batch(
                "CREATE VIRTUAL TABLE bounding_box_rtree USING rtree(
                    id, min_mz, max_mz, min_time, max_time);
                 CREATE VIRTUAL TABLE bounding_box_msn_rtree USING rtree(
                    id, min_ms_level, max_ms_level, min_parent_mz, max_parent_mz,
                    min_mz, max_mz, min_time, max_time);",
            )?;
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO mzdb (version, creation_timestamp, file_content, contacts, param_tree)
             VALUES ('0.7', '2024-01-01', '', '', '<params><userParams/></params>')",
            [],
        )?;
        if let Some(version) = &self.software_version {
            tx.execute(
                "INSERT INTO software (name, version) VALUES ('ProteoWizard', '3.0')",
                [],
            )?;
            tx.execute(
                "INSERT INTO software (name, version) VALUES ('pwiz-mzDB', ?1)",
                [version],
            )?;
        }

        tx.execute(
            "INSERT INTO run (id, name, start_timestamp, param_tree, default_instrument_config_id,
             default_source_file_id, default_scan_processing_id, default_chrom_processing_id)
             VALUES (1, 'run_1', '2024-01-01T00:00:00Z', '<params/>', 1, 1, 1, 2)",
            [],
        )?;
        tx.execute(
            "INSERT INTO source_file (id, name, location, param_tree)
             VALUES (1, 'sample.raw', 'file:///data', '<params/>')",
            [],
        )?;
        tx.execute(
            "INSERT INTO instrument_configuration (id, name, param_tree, component_list, software_id)
             VALUES (1, 'IC1', NULL, '<componentList count=\"3\"/>', 1)",
            [],
        )?;

        for e in &self.encodings {
            if with_layout {
                tx.execute(
                    "INSERT INTO data_encoding (id, mode, compression, byte_order, mz_precision,
                     intensity_precision, peak_layout) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        e.id,
                        e.mode,
                        e.compression,
                        e.byte_order,
                        e.mz_precision,
                        e.intensity_precision,
                        e.peak_layout
                    ],
                )?;
            } else {
                tx.execute(
                    "INSERT INTO data_encoding (id, mode, compression, byte_order, mz_precision,
                     intensity_precision) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        e.id,
                        e.mode,
                        e.compression,
                        e.byte_order,
                        e.mz_precision,
                        e.intensity_precision
                    ],
                )?;
            }
        }

        for rs in &self.run_slices {
            tx.execute(
                "INSERT INTO run_slice (id, ms_level, number, begin_mz, end_mz, run_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1)",
                params![rs.id, rs.ms_level, rs.number, rs.begin_mz, rs.end_mz],
            )?;
        }

        for s in &self.spectra {
            let peaks = self.peaks_of(s.id);
            let count = s.declared_peaks.unwrap_or(peaks.len() as i64);
            let tic: f64 = peaks.iter().map(|p| p.intensity).sum();
            let base = peaks
                .iter()
                .copied()
                .max_by(|a, b| a.intensity.total_cmp(&b.intensity))
                .unwrap_or(peak(0.0, 0.0));
            tx.execute(
                "INSERT INTO spectrum (id, initial_id, title, cycle, time, ms_level,
                 activation_type, tic, base_peak_mz, base_peak_intensity, main_precursor_mz,
                 main_precursor_charge, data_points_count, param_tree, scan_list, precursor_list,
                 product_list, shared_param_tree_id, instrument_configuration_id, source_file_id,
                 run_id, data_processing_id, data_encoding_id, bb_first_spectrum_id)
                 VALUES (?1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, NULL, ?16,
                 NULL, NULL, 1, 1, 1, 1, ?14, ?15)",
                params![
                    s.id,
                    format!("scan={}", s.id),
                    s.cycle,
                    s.time,
                    s.ms_level,
                    if s.ms_level > 1 { Some("HCD") } else { None },
                    tic,
                    base.mz,
                    base.intensity,
                    s.precursor_mz,
                    s.precursor_charge,
                    count,
                    format!("<params><spectrum id=\"{}\"/></params>", s.id),
                    s.data_encoding_id,
                    s.bb_first_spectrum_id,
                    s.precursor_mz.map(|mz| precursor_list(mz, self.isolation_offset))
                ],
            )?;
        }

        for bb in &self.boxes {
            let mut payload = encode_payload(self.encoding_for_box(bb), &bb.slices);
            payload.truncate(payload.len().saturating_sub(bb.truncate_by));
            tx.execute(
                "INSERT INTO bounding_box (id, data, run_slice_id, first_spectrum_id,
                 last_spectrum_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    bb.id,
                    payload,
                    bb.run_slice_id,
                    bb.first_spectrum_id,
                    bb.last_spectrum_id
                ],
            )?;

            if !self.with_rtree {
                continue;
            }
            let Some(rs) = self.run_slices.iter().find(|rs| rs.id == bb.run_slice_id) else {
                continue;
            };
            let time_of = |id: i64| {
                self.spectra
                    .iter()
                    .find(|s| s.id == id)
                    .map_or(0.0, |s| s.time)
            };
            let (min_time, max_time) = (time_of(bb.first_spectrum_id), time_of(bb.last_spectrum_id));
            if rs.ms_level == 1 {
                tx.execute(
                    "INSERT INTO bounding_box_rtree VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![bb.id, rs.begin_mz, rs.end_mz, min_time, max_time],
                )?;
            } else {
                let parent_mz = self
                    .spectra
                    .iter()
                    .find(|s| s.id == bb.first_spectrum_id)
                    .and_then(|s| s.precursor_mz)
                    .unwrap_or(0.0);
                tx.execute(
                    "INSERT INTO bounding_box_msn_rtree VALUES (?1, ?2, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        bb.id,
                        rs.ms_level,
                        parent_mz - self.isolation_offset,
                        parent_mz + self.isolation_offset,
                        rs.begin_mz,
                        rs.end_mz,
                        min_time,
                        max_time
                    ],
                )?;
            }
        }

        for (idx, tree) in self.chromatogram_param_trees.iter().enumerate() {
            tx.execute(
                "INSERT INTO chromatogram (id, name, param_tree, run_id) VALUES (?1, ?2, ?3, 1)",
                params![idx as i64 + 1, "TIC", tree],
            )?;
        }
        tx.commit()?;

        for table in &self.omitted_tables {
            conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", table))?;
        }
        Ok(())
    }
}
