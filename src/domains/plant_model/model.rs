use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointType {
    #[default]
    HaltPosition,
    ParkPosition,
    ReportPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub name: String,
    #[serde(default)]
    pub point_type: PointType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Path {
    pub name: String,
    pub source_point: String,
    pub destination_point: String,
    pub length: u64,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationType {
    pub name: String,
    #[serde(default)]
    pub allowed_operations: BTreeSet<String>,
}

/// Connection between a location and one of its access points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub point: String,
    /// Empty means every operation of the location type is allowed.
    #[serde(default)]
    pub allowed_operations: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub name: String,
    pub location_type: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    #[serde(default)]
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub name: String,
    /// Names of the points and paths in this block.
    pub members: BTreeSet<String>,
}

/// Static topology of a plant. Read-only for the dispatcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantModel {
    #[serde(default)]
    pub points: BTreeMap<String, Point>,
    #[serde(default)]
    pub paths: BTreeMap<String, Path>,
    #[serde(default)]
    pub location_types: BTreeMap<String, LocationType>,
    #[serde(default)]
    pub locations: BTreeMap<String, Location>,
    #[serde(default)]
    pub blocks: BTreeMap<String, Block>,
}

impl PlantModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_point(mut self, name: &str, point_type: PointType) -> Self {
        self.points.insert(
            name.to_string(),
            Point {
                name: name.to_string(),
                point_type,
            },
        );
        self
    }

    pub fn with_path(mut self, name: &str, source: &str, destination: &str, length: u64) -> Self {
        self.paths.insert(
            name.to_string(),
            Path {
                name: name.to_string(),
                source_point: source.to_string(),
                destination_point: destination.to_string(),
                length,
                locked: false,
            },
        );
        self
    }

    /// Adds paths in both directions, named `<a>--<b>` and `<b>--<a>`.
    pub fn with_bidirectional_path(self, a: &str, b: &str, length: u64) -> Self {
        self.with_path(&format!("{}--{}", a, b), a, b, length)
            .with_path(&format!("{}--{}", b, a), b, a, length)
    }

    pub fn with_location_type(mut self, name: &str, operations: &[&str]) -> Self {
        self.location_types.insert(
            name.to_string(),
            LocationType {
                name: name.to_string(),
                allowed_operations: operations.iter().map(|op| op.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.locations.insert(location.name.clone(), location);
        self
    }

    pub fn with_block(mut self, name: &str, members: &[&str]) -> Self {
        self.blocks.insert(
            name.to_string(),
            Block {
                name: name.to_string(),
                members: members.iter().map(|m| m.to_string()).collect(),
            },
        );
        self
    }

    /// Operations a link offers: its own list, or the location type's when the link's is empty.
    pub fn link_operations<'a>(&'a self, location: &'a Location, link: &'a Link) -> Option<&'a BTreeSet<String>> {
        if !link.allowed_operations.is_empty() {
            return Some(&link.allowed_operations);
        }
        self.location_types
            .get(&location.location_type)
            .map(|t| &t.allowed_operations)
    }

    pub fn link_allows(&self, location: &Location, link: &Link, operation: &str) -> bool {
        self.link_operations(location, link)
            .map(|ops| ops.contains(operation))
            .unwrap_or(false)
    }

    pub fn location_offers_operation(&self, location: &Location, operation: &str) -> bool {
        !location.locked
            && location
                .links
                .iter()
                .any(|link| self.link_allows(location, link, operation))
    }

    /// Locations offering the operation, in name order.
    pub fn locations_offering<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a Location> + 'a {
        self.locations
            .values()
            .filter(move |l| self.location_offers_operation(l, operation))
    }

    /// Access points of the location through which the operation may be performed.
    pub fn access_points_for(&self, location_name: &str, operation: &str) -> Vec<String> {
        match self.locations.get(location_name) {
            Some(location) => location
                .links
                .iter()
                .filter(|link| self.link_allows(location, link, operation))
                .map(|link| link.point.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn blocks_containing<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.values().filter(move |b| b.members.contains(resource))
    }

    /// The point itself plus every point reachable through shared block membership,
    /// following blocks transitively.
    pub fn blocked_set(&self, point: &str) -> BTreeSet<String> {
        let mut result = BTreeSet::new();
        let mut queue = VecDeque::new();
        result.insert(point.to_string());
        queue.push_back(point.to_string());

        while let Some(current) = queue.pop_front() {
            for block in self.blocks_containing(&current) {
                for member in &block.members {
                    if self.points.contains_key(member) && result.insert(member.clone()) {
                        queue.push_back(member.clone());
                    }
                }
            }
        }
        result
    }

    pub fn is_point(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }
}

impl Location {
    pub fn new(name: &str, location_type: &str) -> Self {
        Self {
            name: name.to_string(),
            location_type: location_type.to_string(),
            links: Vec::new(),
            properties: BTreeMap::new(),
            locked: false,
        }
    }

    pub fn with_link(mut self, point: &str) -> Self {
        self.links.push(Link {
            point: point.to_string(),
            allowed_operations: BTreeSet::new(),
        });
        self
    }

    pub fn with_restricted_link(mut self, point: &str, operations: &[&str]) -> Self {
        self.links.push(Link {
            point: point.to_string(),
            allowed_operations: operations.iter().map(|op| op.to_string()).collect(),
        });
        self
    }

    pub fn with_property(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }
}
