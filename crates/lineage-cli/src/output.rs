//! Plain-text rendering of members and the tree for the terminal.

use std::collections::HashMap;

use lineage_core::{
  graph::{EdgeKind, FamilyGraph},
  member::FamilyMember,
};
use uuid::Uuid;

/// Id → display name, for resolving references.
pub fn name_index(members: &[FamilyMember]) -> HashMap<Uuid, String> {
  members.iter().map(|m| (m.id, m.name.clone())).collect()
}

/// `1901-1987`, `b. 1901`, `d. 1987` or empty.
pub fn lifespan(m: &FamilyMember) -> String {
  use chrono::Datelike as _;
  match (m.birth_date, m.death_date) {
    (Some(b), Some(d)) => format!("{}-{}", b.year(), d.year()),
    (Some(b), None) => format!("b. {}", b.year()),
    (None, Some(d)) => format!("d. {}", d.year()),
    (None, None) => String::new(),
  }
}

/// One line per member, for `list`.
pub fn member_line(m: &FamilyMember) -> String {
  let span = lifespan(m);
  if span.is_empty() {
    format!("{}  {} ({})", m.id, m.name, m.gender.as_str())
  } else {
    format!("{}  {} ({}, {span})", m.id, m.name, m.gender.as_str())
  }
}

fn describe(id: Uuid, names: &HashMap<Uuid, String>) -> String {
  match names.get(&id) {
    Some(name) => format!("{name} [{id}]"),
    None => format!("[{id}] (missing)"),
  }
}

/// Multi-line detail view, for `show`.
pub fn member_detail(m: &FamilyMember, names: &HashMap<Uuid, String>) -> String {
  let mut out = vec![
    format!("{} ({})", m.name, m.gender.as_str()),
    format!("  id:          {}", m.id),
  ];
  if let Some(d) = m.birth_date {
    out.push(format!("  born:        {d}"));
  }
  if let Some(d) = m.death_date {
    out.push(format!("  died:        {d}"));
  }
  if let Some(text) = &m.description {
    out.push(format!("  description: {text}"));
  }
  if let Some(url) = &m.photo_url {
    out.push(format!("  photo:       {url}"));
  }
  if let Some(id) = m.father_id {
    out.push(format!("  father:      {}", describe(id, names)));
  }
  if let Some(id) = m.mother_id {
    out.push(format!("  mother:      {}", describe(id, names)));
  }
  for id in &m.spouse_ids {
    out.push(format!("  spouse:      {}", describe(*id, names)));
  }
  for id in &m.children_ids {
    out.push(format!("  child:       {}", describe(*id, names)));
  }
  out.push(format!("  created by:  {} at {}", m.created_by, m.created_at));
  out.join("\n")
}

/// Edge list with names resolved, for `tree`.
pub fn tree_text(graph: &FamilyGraph) -> String {
  let names: HashMap<Uuid, &str> =
    graph.nodes.iter().map(|n| (n.id, n.member.name.as_str())).collect();
  let name = |id: &Uuid| names.get(id).copied().unwrap_or("?");

  let mut lines = vec![format!("{} members, {} links", graph.nodes.len(), graph.edges.len())];
  for edge in &graph.edges {
    let line = match edge.kind {
      EdgeKind::Father => format!("  {} is the father of {}", name(&edge.source), name(&edge.target)),
      EdgeKind::Mother => format!("  {} is the mother of {}", name(&edge.source), name(&edge.target)),
      EdgeKind::Spouse => format!("  {} and {} are spouses", name(&edge.source), name(&edge.target)),
    };
    lines.push(line);
  }
  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeSet;

  use chrono::{NaiveDate, Utc};
  use lineage_core::member::{Gender, NodePosition};

  use super::*;

  fn member(name: &str, gender: Gender) -> FamilyMember {
    let now = Utc::now();
    FamilyMember {
      id:            Uuid::new_v4(),
      created_by:    "ed@example.com".into(),
      name:          name.into(),
      gender,
      birth_date:    None,
      death_date:    None,
      description:   None,
      photo_url:     None,
      father_id:     None,
      mother_id:     None,
      spouse_ids:    BTreeSet::new(),
      children_ids:  BTreeSet::new(),
      node_position: NodePosition::default(),
      created_at:    now,
      updated_at:    now,
    }
  }

  #[test]
  fn lifespan_variants() {
    let mut m = member("Ada", Gender::Female);
    assert_eq!(lifespan(&m), "");
    m.birth_date = NaiveDate::from_ymd_opt(1815, 12, 10);
    assert_eq!(lifespan(&m), "b. 1815");
    m.death_date = NaiveDate::from_ymd_opt(1852, 11, 27);
    assert_eq!(lifespan(&m), "1815-1852");
    assert!(member_line(&m).ends_with("Ada (female, 1815-1852)"));
  }

  #[test]
  fn detail_resolves_names_and_flags_missing() {
    let f = member("Frank", Gender::Male);
    let mut c = member("Cora", Gender::Female);
    c.father_id = Some(f.id);
    let ghost = Uuid::new_v4();
    c.mother_id = Some(ghost);

    let text = member_detail(&c, &name_index(&[f.clone(), c.clone()]));
    assert!(text.contains(&format!("father:      Frank [{}]", f.id)));
    assert!(text.contains(&format!("mother:      [{ghost}] (missing)")));
  }

  #[test]
  fn tree_text_names_each_link() {
    let mut f = member("Frank", Gender::Male);
    let mut c = member("Cora", Gender::Female);
    c.father_id = Some(f.id);
    f.children_ids.insert(c.id);

    let text = tree_text(&FamilyGraph::from_members(&[f, c]));
    assert!(text.starts_with("2 members, 1 links"));
    assert!(text.contains("Frank is the father of Cora"));
  }
}
