//! Dependency ordering of seeders.
//!
//! Kahn's algorithm over the seeder-name graph. Among seeders that are ready
//! at the same time, the one registered first runs first, so the order is
//! reproducible across runs. Unknown dependencies are reported before cycles,
//! and either error means no order is produced.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::error::{SeedingError, SeedingResult};
use crate::registry::SeederCatalog;

/// A named node and the names it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
	/// Node name.
	pub name: String,
	/// Names that must come first.
	pub dependencies: Vec<String>,
}

impl DependencyNode {
	/// Creates a node.
	pub fn new<I, D>(name: impl Into<String>, dependencies: I) -> Self
	where
		I: IntoIterator<Item = D>,
		D: Into<String>,
	{
		Self {
			name: name.into(),
			dependencies: dependencies.into_iter().map(Into::into).collect(),
		}
	}
}

/// Visit state used while tracing a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
	Unvisited,
	Visiting,
	Visited,
}

/// Orders `nodes` so every dependency precedes its dependents.
///
/// Input order is the tie-break order.
///
/// # Errors
///
/// - [`SeedingError::UnknownDependency`] for a dependency that is not a node
/// - [`SeedingError::DependencyCycle`] listing the cycle, first node repeated last
pub fn topological_order(nodes: &[DependencyNode]) -> SeedingResult<Vec<String>> {
	let position: HashMap<&str, usize> = nodes
		.iter()
		.enumerate()
		.map(|(i, node)| (node.name.as_str(), i))
		.collect();

	// Edges as indices: dependencies[i] are the nodes i waits for.
	let mut dependencies: Vec<Vec<usize>> = Vec::with_capacity(nodes.len());
	for node in nodes {
		let mut edges = Vec::new();
		let mut seen = HashSet::new();
		for dependency in &node.dependencies {
			let &target =
				position
					.get(dependency.as_str())
					.ok_or_else(|| SeedingError::UnknownDependency {
						seeder: node.name.clone(),
						missing: dependency.clone(),
					})?;
			if seen.insert(target) {
				edges.push(target);
			}
		}
		dependencies.push(edges);
	}

	let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
	let mut in_degree: Vec<usize> = vec![0; nodes.len()];
	for (node, edges) in dependencies.iter().enumerate() {
		in_degree[node] = edges.len();
		for &target in edges {
			dependents[target].push(node);
		}
	}

	let mut ready: BTreeSet<usize> = in_degree
		.iter()
		.enumerate()
		.filter(|(_, degree)| **degree == 0)
		.map(|(i, _)| i)
		.collect();
	let mut sorted = Vec::with_capacity(nodes.len());

	while let Some(next) = ready.pop_first() {
		sorted.push(next);
		for &dependent in &dependents[next] {
			in_degree[dependent] -= 1;
			if in_degree[dependent] == 0 {
				ready.insert(dependent);
			}
		}
	}

	if sorted.len() != nodes.len() {
		let cycle = find_cycle(&dependencies, &in_degree);
		return Err(SeedingError::DependencyCycle(
			cycle.into_iter().map(|i| nodes[i].name.clone()).collect(),
		));
	}

	Ok(sorted.into_iter().map(|i| nodes[i].name.clone()).collect())
}

/// Traces one cycle among the nodes Kahn's algorithm could not place.
///
/// Iterative DFS with an explicit stack. The returned path starts and ends at
/// the same node.
fn find_cycle(dependencies: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
	let mut state = vec![VisitState::Unvisited; dependencies.len()];

	for start in 0..dependencies.len() {
		if in_degree[start] == 0 || state[start] != VisitState::Unvisited {
			continue;
		}

		// (node, next dependency index)
		let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
		state[start] = VisitState::Visiting;

		while let Some((node, edge)) = stack.last_mut() {
			let node = *node;
			if let Some(&target) = dependencies[node].get(*edge) {
				*edge += 1;
				match state[target] {
					VisitState::Visiting => {
						let from = stack
							.iter()
							.position(|(n, _)| *n == target)
							.unwrap_or(0);
						let mut cycle: Vec<usize> = stack[from..].iter().map(|(n, _)| *n).collect();
						cycle.push(target);
						return cycle;
					}
					VisitState::Unvisited => {
						state[target] = VisitState::Visiting;
						stack.push((target, 0));
					}
					VisitState::Visited => {}
				}
			} else {
				state[node] = VisitState::Visited;
				stack.pop();
			}
		}
	}

	Vec::new()
}

/// Orders every seeder in `catalog`.
pub fn resolve_order(catalog: &SeederCatalog) -> SeedingResult<Vec<String>> {
	let nodes: Vec<DependencyNode> = catalog
		.iter()
		.map(|s| DependencyNode::new(s.name(), s.dependencies().iter().cloned()))
		.collect();
	let order = topological_order(&nodes)?;
	tracing::debug!(order = ?order, "resolved seeder order");
	Ok(order)
}

/// Orders the named seeders plus everything they transitively depend on.
///
/// # Errors
///
/// Returns [`SeedingError::SeederNotFound`] for an unknown root, plus the
/// errors of [`topological_order`].
pub fn resolve_subset(catalog: &SeederCatalog, roots: &[&str]) -> SeedingResult<Vec<String>> {
	let mut wanted: HashSet<String> = HashSet::new();
	let mut queue: VecDeque<String> = VecDeque::new();
	for root in roots {
		if !catalog.contains(root) {
			return Err(SeedingError::SeederNotFound(root.to_string()));
		}
		queue.push_back(root.to_string());
	}

	while let Some(name) = queue.pop_front() {
		if !wanted.insert(name.clone()) {
			continue;
		}
		let seeder = catalog
			.get(&name)
			.ok_or_else(|| SeedingError::SeederNotFound(name.clone()))?;
		for dependency in seeder.dependencies() {
			if !catalog.contains(dependency) {
				return Err(SeedingError::UnknownDependency {
					seeder: name.clone(),
					missing: dependency.clone(),
				});
			}
			queue.push_back(dependency.clone());
		}
	}

	let nodes: Vec<DependencyNode> = catalog
		.iter()
		.filter(|s| wanted.contains(s.name()))
		.map(|s| DependencyNode::new(s.name(), s.dependencies().iter().cloned()))
		.collect();
	topological_order(&nodes)
}
