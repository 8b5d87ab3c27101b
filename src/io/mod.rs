// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - STL meshes and JSON reports

mod report;
mod stl;

pub use report::{read_mask_json, write_json, write_mask_json, write_segments_json, MaskRecord};
pub use stl::{export_stl, export_stl_ascii, import_stl};
