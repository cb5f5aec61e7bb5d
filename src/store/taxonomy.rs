//! Static knowledge taxonomy
//!
//! Two read-only tables: top-level topic -> branches, and topic-or-branch ->
//! rules. They are the only source of valid topic names, but nothing enforces
//! membership; lookups on unknown keys return an empty slice.
//!
//! A JSON file can replace the built-in tables:
//!
//! ```json
//! {
//!   "areas": [{ "name": "mathematics", "branches": ["algebra"] }],
//!   "rules": { "algebra": ["a + b = b + a"] }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use crate::types::Result;

/// A top-level topic and its branches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeArea {
    pub name: String,
    #[serde(default)]
    pub branches: Vec<String>,
}

/// Topic, branch and rule tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Top-level topics in display order
    areas: Vec<KnowledgeArea>,
    /// Rules keyed by topic or branch name
    #[serde(default)]
    rules: HashMap<String, Vec<String>>,
}

impl Taxonomy {
    pub fn new(areas: Vec<KnowledgeArea>, rules: HashMap<String, Vec<String>>) -> Self {
        Self { areas, rules }
    }

    /// Load a taxonomy from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let taxonomy: Taxonomy = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            topics = taxonomy.areas.len(),
            rule_sets = taxonomy.rules.len(),
            "Taxonomy loaded"
        );
        Ok(taxonomy)
    }

    /// Top-level topic names in display order
    pub fn functions(&self) -> Vec<&str> {
        self.areas.iter().map(|a| a.name.as_str()).collect()
    }

    /// All areas with their branches, in display order
    pub fn areas(&self) -> &[KnowledgeArea] {
        &self.areas
    }

    /// Branches of a top-level topic
    pub fn branches_for(&self, topic: &str) -> &[String] {
        self.areas
            .iter()
            .find(|a| a.name == topic)
            .map(|a| a.branches.as_slice())
            .unwrap_or(&[])
    }

    /// Rules for a topic or branch
    pub fn rules_for(&self, topic: &str) -> &[String] {
        self.rules.get(topic).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the rules table has an entry for `topic`
    pub fn has_rules(&self, topic: &str) -> bool {
        self.rules.contains_key(topic)
    }

    /// Built-in taxonomy shipped with the binary
    pub fn builtin() -> Self {
        let areas = vec![
            area("mathematics", &["algebra", "geometry", "calculus"]),
            area("physics", &["mechanics", "optics"]),
            area("computer_science", &["algorithms", "networking"]),
        ];

        let rules = [
            (
                "mathematics",
                &[
                    "Every proof starts from stated axioms",
                    "A counterexample disproves a universal claim",
                    "Definitions must be unambiguous",
                    "Equality is reflexive, symmetric and transitive",
                ][..],
            ),
            (
                "algebra",
                &[
                    "Addition is commutative: a + b = b + a",
                    "Multiplication distributes over addition: a(b + c) = ab + ac",
                    "Any non-zero number to the power zero is one",
                    "A quadratic has at most two real roots",
                    "Whatever you do to one side of an equation, do to the other",
                ][..],
            ),
            (
                "geometry",
                &[
                    "The angles of a triangle sum to 180 degrees",
                    "In a right triangle a^2 + b^2 = c^2",
                    "Vertical angles are equal",
                ][..],
            ),
            (
                "calculus",
                &[
                    "The derivative of a constant is zero",
                    "The derivative of x^n is n*x^(n-1)",
                    "Integration is the inverse of differentiation",
                    "The chain rule: (f(g(x)))' = f'(g(x)) * g'(x)",
                    "A continuous function on a closed interval attains its maximum",
                    "The limit of a sum is the sum of the limits",
                ][..],
            ),
            (
                "physics",
                &[
                    "Energy is conserved in a closed system",
                    "Momentum is conserved when no external force acts",
                    "Nothing travels faster than light in vacuum",
                    "Entropy of an isolated system never decreases",
                    "Charge is conserved",
                ][..],
            ),
            (
                "mechanics",
                &[
                    "F = m * a",
                    "Every action has an equal and opposite reaction",
                    "An object at rest stays at rest unless acted upon",
                    "Work equals force times displacement",
                ][..],
            ),
            (
                "optics",
                &[
                    "The angle of incidence equals the angle of reflection",
                    "Snell's law: n1 sin(t1) = n2 sin(t2)",
                ][..],
            ),
            (
                "computer_science",
                &[
                    "Prefer simple data structures",
                    "Measure before optimising",
                    "Every recursive function needs a base case",
                    "Abstractions leak",
                    "Names matter",
                ][..],
            ),
            (
                "algorithms",
                &[
                    "Binary search requires sorted input",
                    "Comparison sorts need O(n log n) comparisons",
                    "Dynamic programming reuses overlapping subproblems",
                    "Greedy choices must be proven safe",
                    "A hash table gives expected O(1) lookups",
                ][..],
            ),
            (
                "networking",
                &[
                    "TCP delivers bytes in order",
                    "UDP does not retransmit",
                    "Latency and bandwidth are different things",
                ][..],
            ),
        ]
        .into_iter()
        .map(|(topic, rules)| {
            (
                topic.to_string(),
                rules.iter().map(|r| r.to_string()).collect(),
            )
        })
        .collect();

        Self { areas, rules }
    }
}

fn area(name: &str, branches: &[&str]) -> KnowledgeArea {
    KnowledgeArea {
        name: name.to_string(),
        branches: branches.iter().map(|b| b.to_string()).collect(),
    }
}
