#![allow(dead_code)]

use courier_dispatch::graph::{EdgeRecord, GraphDocument, GraphLoadOptions, NodeId, NodeRecord, StreetGraph};
use courier_dispatch::lifecycle::DispatchConfig;
use courier_dispatch::model::{Coordinate, LineItem, OrderDraft};
use std::sync::Arc;

pub const BASE_LAT: f64 = -31.40;
pub const BASE_LNG: f64 = -57.98;
pub const STEP: f64 = 0.001;

pub fn node_id(size: usize, row: usize, col: usize) -> NodeId {
    (row * size + col + 1) as NodeId
}

pub fn grid_point(row: usize, col: usize) -> Coordinate {
    Coordinate::new(BASE_LAT + row as f64 * STEP, BASE_LNG + col as f64 * STEP).unwrap()
}

/// A `size` × `size` street grid, two-way streets between 4-neighbours, 120 m per block.
pub fn grid_document(size: usize) -> GraphDocument {
    let mut doc = GraphDocument::default();
    for row in 0..size {
        for col in 0..size {
            let point = grid_point(row, col);
            doc.nodes.push(NodeRecord::new(
                node_id(size, row, col),
                point.lat,
                point.lng,
            ));
        }
    }
    for row in 0..size {
        for col in 0..size {
            let here = node_id(size, row, col);
            if col + 1 < size {
                let east = node_id(size, row, col + 1);
                doc.edges.push(EdgeRecord::new(here, east, 120.0, None));
                doc.edges.push(EdgeRecord::new(east, here, 120.0, None));
            }
            if row + 1 < size {
                let north = node_id(size, row + 1, col);
                doc.edges.push(EdgeRecord::new(here, north, 120.0, None));
                doc.edges.push(EdgeRecord::new(north, here, 120.0, None));
            }
        }
    }
    doc
}

pub fn grid(size: usize) -> Arc<StreetGraph> {
    Arc::new(StreetGraph::from_document(grid_document(size), &GraphLoadOptions::default()).unwrap())
}

/// Two couriers, `ana` and `bruno`, with the store in the middle of a 5 × 5 grid.
pub fn config(capacity: usize, extra: &str) -> DispatchConfig {
    let store = grid_point(2, 2);
    let raw = format!(
        r#"
        couriers = [
            {{ id = "ana", name = "Ana", contact = "+598 91 000 001" }},
            {{ id = "bruno", name = "Bruno", contact = "+598 91 000 002" }},
        ]

        [store]
        lat = {lat}
        lng = {lng}

        [routing]
        timeout_ms = 5000

        [assignment]
        capacity = {capacity}
        strict_invariants = false
        {extra}
        "#,
        lat = store.lat,
        lng = store.lng,
    );
    DispatchConfig::from_toml_str(&raw).unwrap()
}

pub fn draft_at(customer: &str, row: usize, col: usize) -> OrderDraft {
    OrderDraft::new(customer, vec![LineItem::new("p-1", "Chivito", 420, 1)]).at(grid_point(row, col))
}

pub fn draft_with_address(customer: &str, address: &str) -> OrderDraft {
    OrderDraft::new(customer, vec![LineItem::new("p-2", "Empanadas", 90, 6)]).with_address(address)
}
