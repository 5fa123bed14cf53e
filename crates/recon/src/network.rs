//! The validated meter hierarchy: an arena of nodes with index-based
//! parent/child links, built once and read-only afterwards.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::error::StructuralError;
use crate::model::{MeterLevel, MeterNode, PeriodKey};

#[derive(Debug, Clone)]
pub struct MeterNetwork {
    nodes: Vec<MeterNode>,
    index: HashMap<String, usize>,
    main: usize,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    periods: Vec<PeriodKey>,
}

impl MeterNetwork {
    /// Validate the node graph and build the network.
    ///
    /// `periods` is the known period list, in registration order; it must be
    /// strictly chronological and every reading must be keyed by one of them.
    pub fn build(nodes: Vec<MeterNode>, periods: Vec<PeriodKey>) -> Result<Self, StructuralError> {
        for pair in periods.windows(2) {
            if pair[1] <= pair[0] {
                return Err(StructuralError::UnorderedPeriods {
                    period: pair[1].to_string(),
                });
            }
        }

        // Ids
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(StructuralError::DuplicateId { id: node.id.clone() });
            }
        }

        // Exactly one main
        let mains: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.level == MeterLevel::Main)
            .map(|(i, _)| i)
            .collect();
        let main = match mains.as_slice() {
            [] => return Err(StructuralError::MissingMain),
            [only] => *only,
            _ => {
                return Err(StructuralError::MultipleMain {
                    ids: mains.iter().map(|&i| nodes[i].id.clone()).collect(),
                })
            }
        };
        if nodes[main].parent_id.is_some() {
            return Err(StructuralError::MainHasParent {
                id: nodes[main].id.clone(),
            });
        }

        // Readings
        let known: BTreeSet<PeriodKey> = periods.iter().copied().collect();
        for node in &nodes {
            for (period, &value) in &node.readings {
                if !value.is_finite() || value < 0.0 {
                    return Err(StructuralError::InvalidReading {
                        id: node.id.clone(),
                        period: period.to_string(),
                        value,
                    });
                }
                if !known.contains(period) {
                    return Err(StructuralError::UnknownPeriod {
                        id: node.id.clone(),
                        period: period.to_string(),
                    });
                }
            }
        }

        // Parent links + zones
        let mut parents = vec![None; nodes.len()];
        let mut children = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            if i == main {
                continue;
            }
            let zone = node
                .zone
                .as_deref()
                .ok_or_else(|| StructuralError::MissingZone { id: node.id.clone() })?;
            let parent_id = node
                .parent_id
                .as_deref()
                .ok_or_else(|| StructuralError::MissingParent { id: node.id.clone() })?;
            let &p = index.get(parent_id).ok_or_else(|| StructuralError::DanglingParent {
                id: node.id.clone(),
                parent_id: parent_id.to_string(),
            })?;
            if p != main {
                let parent_zone = nodes[p].zone.as_deref().unwrap_or_default();
                if parent_zone != zone {
                    return Err(StructuralError::ZoneMismatch {
                        id: node.id.clone(),
                        zone: zone.to_string(),
                        parent_zone: parent_zone.to_string(),
                    });
                }
            }
            parents[i] = Some(p);
            children[p].push(i);
        }

        // Every chain must end at main
        let mut reaches_main = vec![false; nodes.len()];
        reaches_main[main] = true;
        for start in 0..nodes.len() {
            let mut path = Vec::new();
            let mut cur = start;
            while !reaches_main[cur] {
                if path.len() > nodes.len() {
                    return Err(StructuralError::Cycle {
                        id: nodes[start].id.clone(),
                    });
                }
                path.push(cur);
                cur = match parents[cur] {
                    Some(p) => p,
                    None => {
                        return Err(StructuralError::Cycle {
                            id: nodes[start].id.clone(),
                        })
                    }
                };
            }
            for i in path {
                reaches_main[i] = true;
            }
        }

        log::debug!(
            "meter network built: {} meters, {} periods, main = '{}'",
            nodes.len(),
            periods.len(),
            nodes[main].id
        );

        Ok(Self {
            nodes,
            index,
            main,
            parents,
            children,
            periods,
        })
    }

    /// Build with the known periods taken as the sorted union of every
    /// node's reading keys.
    pub fn from_nodes(nodes: Vec<MeterNode>) -> Result<Self, StructuralError> {
        let periods: BTreeSet<PeriodKey> = nodes
            .iter()
            .flat_map(|n| n.readings.keys().copied())
            .collect();
        Self::build(nodes, periods.into_iter().collect())
    }

    /// All nodes, in load order.
    pub fn nodes(&self) -> &[MeterNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&MeterNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn main_node(&self) -> &MeterNode {
        &self.nodes[self.main]
    }

    pub fn parent_of(&self, id: &str) -> Option<&MeterNode> {
        let &i = self.index.get(id)?;
        self.parents[i].map(|p| &self.nodes[p])
    }

    /// Direct children of `id`, in load order. Unknown ids have none.
    pub fn children_of(&self, id: &str) -> impl Iterator<Item = &MeterNode> + '_ {
        let slots: &[usize] = match self.index.get(id) {
            Some(&i) => &self.children[i],
            None => &[],
        };
        slots.iter().map(move |&c| &self.nodes[c])
    }

    /// Known periods in chronological order.
    pub fn periods(&self) -> &[PeriodKey] {
        &self.periods
    }

    /// Distinct zone codes that have a zone bulk meter, sorted.
    pub fn zones(&self) -> Vec<&str> {
        let zones: BTreeSet<&str> = self
            .nodes
            .iter()
            .filter(|n| n.level == MeterLevel::ZoneBulk)
            .filter_map(|n| n.zone.as_deref())
            .collect();
        zones.into_iter().collect()
    }

    pub fn count_by_level(&self) -> BTreeMap<MeterLevel, usize> {
        let mut counts: BTreeMap<MeterLevel, usize> =
            MeterLevel::ALL.iter().map(|&l| (l, 0)).collect();
        for node in &self.nodes {
            *counts.entry(node.level).or_insert(0) += 1;
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
