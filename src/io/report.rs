// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! JSON output of fracture masks and segment reports

use crate::extract::SegmentSummary;
use crate::segmentation::FractureMask;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// On-disk form of a fracture mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRecord {
    pub face_count: usize,
    pub fracture_faces: Vec<usize>,
}

impl From<&FractureMask> for MaskRecord {
    fn from(mask: &FractureMask) -> Self {
        Self {
            face_count: mask.len(),
            fracture_faces: mask.selected_faces(),
        }
    }
}

/// Write any serializable report as pretty JSON
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON file: {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;
    Ok(())
}

pub fn write_mask_json(mask: &FractureMask, path: impl AsRef<Path>) -> Result<()> {
    write_json(&MaskRecord::from(mask), path)
}

/// Write per-segment sizes, colors and scores
pub fn write_segments_json(summaries: &[SegmentSummary], path: impl AsRef<Path>) -> Result<()> {
    write_json(summaries, path)
}

pub fn read_mask_json(path: impl AsRef<Path>) -> Result<FractureMask> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read mask file: {}", path.display()))?;
    let record: MaskRecord = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse mask file: {}", path.display()))?;

    if let Some(&face) = record.fracture_faces.iter().find(|&&f| f >= record.face_count) {
        bail!("mask face {} out of range for {} faces", face, record.face_count);
    }
    Ok(FractureMask::from_faces(record.face_count, record.fracture_faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn test_mask_file_lists_selected_faces() {
        let mask = FractureMask::from_faces(6, [1, 4]);
        let file = Builder::new().suffix(".json").tempfile().unwrap();

        write_mask_json(&mask, file.path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();
        assert_eq!(value["face_count"], 6);
        assert_eq!(value["fracture_faces"], serde_json::json!([1, 4]));

        assert_eq!(read_mask_json(file.path()).unwrap(), mask);
    }

    #[test]
    fn test_out_of_range_mask_is_rejected() {
        let file = Builder::new().suffix(".json").tempfile().unwrap();
        fs::write(file.path(), r#"{ "face_count": 2, "fracture_faces": [0, 2] }"#).unwrap();

        let err = read_mask_json(file.path()).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }
}
