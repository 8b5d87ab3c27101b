// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and topology

mod adjacency;
mod bbox;
mod mesh;
mod primitives;

pub use adjacency::{Edge, MeshAdjacency};
pub use bbox::BoundingBox;
pub use mesh::{Mesh, Triangle};
pub use primitives::Primitive;
