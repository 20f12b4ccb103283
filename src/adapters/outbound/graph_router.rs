use crate::domains::fleet::Vehicle;
use crate::domains::plant_model::{PlantModel, Router};
use crate::domains::transport_order::{Route, Step};
use petgraph::algo::astar;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{EdgeFiltered, EdgeRef};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone)]
struct PathEdge {
    path: String,
    length: u64,
}

/// Shortest-path router over the plant's points and unlocked paths.
///
/// Returns at most one route per request regardless of the number of alternatives asked for.
pub struct GraphRouter {
    graph: DiGraph<String, PathEdge>,
    nodes: BTreeMap<String, NodeIndex>,
}

impl GraphRouter {
    pub fn new(model: &PlantModel) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = BTreeMap::new();
        for name in model.points.keys() {
            nodes.insert(name.clone(), graph.add_node(name.clone()));
        }
        for path in model.paths.values().filter(|p| !p.locked) {
            let (Some(&source), Some(&destination)) =
                (nodes.get(&path.source_point), nodes.get(&path.destination_point))
            else {
                debug!(path = %path.name, "Path references unknown point");
                continue;
            };
            graph.add_edge(
                source,
                destination,
                PathEdge {
                    path: path.name.clone(),
                    length: path.length,
                },
            );
        }
        Self { graph, nodes }
    }

    fn shortest_route(&self, source: &str, destination: &str, avoid: &BTreeSet<String>) -> Option<Route> {
        let start = *self.nodes.get(source)?;
        let goal = *self.nodes.get(destination)?;
        if start == goal {
            return Some(Route::stationary(destination));
        }

        let graph = &self.graph;
        let usable = |edge: petgraph::graph::EdgeReference<'_, PathEdge>| {
            !avoid.contains(&edge.weight().path) && !avoid.contains(&graph[edge.target()])
        };
        let filtered = EdgeFiltered::from_fn(graph, usable);
        let (costs, nodes) = astar(&filtered, start, |n| n == goal, |e| e.weight().length, |_| 0)?;

        let mut steps = Vec::with_capacity(nodes.len().saturating_sub(1));
        for pair in nodes.windows(2) {
            let edge = graph
                .edges_connecting(pair[0], pair[1])
                .filter(|e| usable(*e))
                .min_by_key(|e| e.weight().length)?;
            steps.push(Step {
                path: Some(edge.weight().path.clone()),
                source_point: Some(graph[pair[0]].clone()),
                destination_point: graph[pair[1]].clone(),
            });
        }
        Some(Route { steps, costs })
    }
}

impl Router for GraphRouter {
    fn routes(
        &self,
        _vehicle: &Vehicle,
        source_point: &str,
        destination_point: &str,
        resources_to_avoid: &BTreeSet<String>,
        max_alternatives: usize,
    ) -> Vec<Route> {
        if max_alternatives == 0 {
            return Vec::new();
        }
        self.shortest_route(source_point, destination_point, resources_to_avoid)
            .into_iter()
            .collect()
    }

    fn costs(
        &self,
        _vehicle: &Vehicle,
        source_point: &str,
        destination_point: &str,
        resources_to_avoid: &BTreeSet<String>,
    ) -> Option<u64> {
        self.shortest_route(source_point, destination_point, resources_to_avoid)
            .map(|route| route.costs)
    }
}
