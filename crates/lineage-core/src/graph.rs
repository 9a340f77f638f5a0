//! Node/edge projection of the collection, and a consistency audit.
//!
//! The projection is what a diagram client draws: one node per member and
//! one edge per parent link or spouse pair. The audit walks the same links
//! and reports every place where the two sides of a relationship disagree.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::member::{FamilyMember, NodePosition};

// ─── Projection ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
  Father,
  Mother,
  Spouse,
}

impl EdgeKind {
  fn suffix(self) -> &'static str {
    match self {
      Self::Father => "father",
      Self::Mother => "mother",
      Self::Spouse => "spouse",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
  pub id:       Uuid,
  pub position: NodePosition,
  pub member:   FamilyMember,
}

/// A directed edge. Parent edges point from parent to child; a spouse edge
/// points from the lexically smaller id to the larger one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
  pub id:     String,
  pub source: Uuid,
  pub target: Uuid,
  pub kind:   EdgeKind,
}

impl GraphEdge {
  fn new(source: Uuid, target: Uuid, kind: EdgeKind) -> Self {
    Self {
      id: format!("{source}-{target}-{}", kind.suffix()),
      source,
      target,
      kind,
    }
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyGraph {
  pub nodes: Vec<GraphNode>,
  pub edges: Vec<GraphEdge>,
}

impl FamilyGraph {
  /// Project `members` into nodes and edges. Edges whose other end is not
  /// in `members` are dropped.
  pub fn from_members(members: &[FamilyMember]) -> Self {
    let known: BTreeSet<Uuid> = members.iter().map(|m| m.id).collect();

    let nodes = members
      .iter()
      .map(|m| GraphNode {
        id:       m.id,
        position: m.node_position,
        member:   m.clone(),
      })
      .collect();

    let mut edges = Vec::new();
    for m in members {
      if let Some(father) = m.father_id.filter(|id| known.contains(id)) {
        edges.push(GraphEdge::new(father, m.id, EdgeKind::Father));
      }
      if let Some(mother) = m.mother_id.filter(|id| known.contains(id)) {
        edges.push(GraphEdge::new(mother, m.id, EdgeKind::Mother));
      }
      // Each pair once, from the smaller side.
      for spouse in &m.spouse_ids {
        if m.id < *spouse && known.contains(spouse) {
          edges.push(GraphEdge::new(m.id, *spouse, EdgeKind::Spouse));
        }
      }
    }

    Self { nodes, edges }
  }
}

// ─── Audit ───────────────────────────────────────────────────────────────────

/// A place where the two sides of a relationship disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
  /// `member` lists `spouse`, but not the other way round.
  AsymmetricSpouse { member: Uuid, spouse: Uuid },
  /// `child` names `parent`, but `parent` does not list `child`.
  MissingChild { parent: Uuid, child: Uuid },
  /// `parent` lists `child`, but `child` names neither father nor mother
  /// as `parent`.
  UnexpectedChild { parent: Uuid, child: Uuid },
  /// `member` references an id that is not in the collection.
  Dangling { member: Uuid, reference: Uuid },
}

impl std::fmt::Display for Inconsistency {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::AsymmetricSpouse { member, spouse } => {
        write!(f, "{member} lists spouse {spouse}, which does not list it back")
      }
      Self::MissingChild { parent, child } => {
        write!(f, "{child} names parent {parent}, which does not list it as a child")
      }
      Self::UnexpectedChild { parent, child } => {
        write!(f, "{parent} lists child {child}, which does not name it as a parent")
      }
      Self::Dangling { member, reference } => {
        write!(f, "{member} references missing member {reference}")
      }
    }
  }
}

/// Check the spouse symmetry and parent/children inverse invariants across
/// `members`.
pub fn audit(members: &[FamilyMember]) -> Vec<Inconsistency> {
  let by_id: BTreeMap<Uuid, &FamilyMember> =
    members.iter().map(|m| (m.id, m)).collect();
  let mut found = Vec::new();

  for m in members {
    for reference in m.references().collect::<BTreeSet<_>>() {
      if !by_id.contains_key(&reference) {
        found.push(Inconsistency::Dangling { member: m.id, reference });
      }
    }

    for spouse in &m.spouse_ids {
      if let Some(other) = by_id.get(spouse)
        && !other.spouse_ids.contains(&m.id)
      {
        found.push(Inconsistency::AsymmetricSpouse { member: m.id, spouse: *spouse });
      }
    }

    for parent in m.father_id.iter().chain(m.mother_id.iter()) {
      if let Some(p) = by_id.get(parent)
        && !p.children_ids.contains(&m.id)
      {
        found.push(Inconsistency::MissingChild { parent: *parent, child: m.id });
      }
    }

    for child in &m.children_ids {
      if let Some(c) = by_id.get(child)
        && !m.is_parent_of(c)
      {
        found.push(Inconsistency::UnexpectedChild { parent: m.id, child: *child });
      }
    }
  }

  found
}
