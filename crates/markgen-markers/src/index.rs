//! # Marker Index
//!
//! Parses every comment block of a [`TypeGraph`] once and stores the
//! resulting [`MarkerSet`]s by location. Engines query the index instead of
//! re-parsing comments, and walk it in source order when order matters:
//! package comment, then each declaration followed by its fields.

use std::collections::HashMap;

use markgen_core::{Diagnostics, Location, TypeGraph, TypeIdent};

use crate::parser::MarkerParser;
use crate::registry::Contributor;
use crate::value::{MarkerSet, MarkerValue};

static EMPTY: MarkerSet = MarkerSet::new();

/// Decoded markers for a whole type graph.
#[derive(Debug, Clone, Default)]
pub struct MarkerIndex {
    entries: Vec<(Location, MarkerSet)>,
    positions: HashMap<Location, usize>,
}

impl MarkerIndex {
    /// Parse every package, declaration, and field comment in the graph.
    pub fn collect(graph: &TypeGraph, parser: &MarkerParser<'_>) -> (Self, Diagnostics) {
        let mut index = Self::default();
        let mut diagnostics = Diagnostics::new();

        for pkg in graph.packages() {
            let loc = Location::package(pkg.name.clone());
            let (set, diags) = parser.parse_comment(&pkg.doc, &loc);
            index.insert(loc, set);
            diagnostics.extend(diags);

            for node in &pkg.types {
                let ident = node.ident();
                let loc = Location::declaration(ident.clone());
                let (set, diags) = parser.parse_comment(&node.doc, &loc);
                index.insert(loc, set);
                diagnostics.extend(diags);

                for field in node.fields() {
                    let loc = Location::field(ident.clone(), field.name.clone());
                    let (set, diags) = parser.parse_comment(&field.doc, &loc);
                    index.insert(loc, set);
                    diagnostics.extend(diags);
                }
            }
        }

        tracing::debug!(
            locations = index.entries.len(),
            markers = index.marker_count(),
            diagnostics = diagnostics.len(),
            "indexed markers"
        );
        (index, diagnostics)
    }

    fn insert(&mut self, location: Location, set: MarkerSet) {
        match self.positions.get(&location) {
            Some(&i) => {
                for value in set.iter() {
                    self.entries[i].1.push(value.clone());
                }
            }
            None => {
                self.positions.insert(location.clone(), self.entries.len());
                self.entries.push((location, set));
            }
        }
    }

    /// Markers at a location; empty when the location carries none.
    pub fn at(&self, location: &Location) -> &MarkerSet {
        self.positions
            .get(location)
            .map_or(&EMPTY, |&i| &self.entries[i].1)
    }

    /// Markers on a package comment.
    pub fn package(&self, package: &str) -> &MarkerSet {
        self.at(&Location::package(package))
    }

    /// Markers on a declaration comment.
    pub fn declaration(&self, ident: &TypeIdent) -> &MarkerSet {
        self.at(&Location::declaration(ident.clone()))
    }

    /// Markers on a field comment.
    pub fn field(&self, ident: &TypeIdent, field: &str) -> &MarkerSet {
        self.at(&Location::field(ident.clone(), field))
    }

    /// Locations and their markers in source order.
    pub fn iter(&self) -> impl Iterator<Item = (&Location, &MarkerSet)> {
        self.entries.iter().map(|(loc, set)| (loc, set))
    }

    /// Every value consumed by one engine, in source order.
    pub fn contributions(&self, contributor: Contributor) -> impl Iterator<Item = &MarkerValue> {
        self.entries
            .iter()
            .flat_map(move |(_, set)| set.by_contributor(contributor))
    }

    /// Total number of decoded values.
    pub fn marker_count(&self) -> usize {
        self.entries.iter().map(|(_, set)| set.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ArgKind, MarkerDefinition, Registry};
    use markgen_core::{Applicability, FieldNode, PackageNode, ScalarKind, TypeNode, TypeRef};

    fn registry() -> Registry {
        let mut registry = Registry::new();
        let rbac = MarkerDefinition::new("rbac", Applicability::Package, Contributor::Rule)
            .arg("verbs", ArgKind::StringList)
            .optional("resource", ArgKind::StringList);
        registry
            .register_all([
                rbac.at(Applicability::Declaration),
                rbac,
                MarkerDefinition::new("optional", Applicability::Field, Contributor::Schema),
            ])
            .unwrap();
        registry
    }

    fn graph() -> TypeGraph {
        let spec = TypeNode::record(
            "",
            "WidgetSpec",
            vec![
                FieldNode::new("size", TypeRef::Scalar(ScalarKind::Int32))
                    .doc("+optional")
                    .doc("+rbac:verbs=get"),
                FieldNode::new("name", TypeRef::Scalar(ScalarKind::String)),
            ],
        )
        .doc("+rbac:resource=widgets,verbs=list");
        let pkg = PackageNode::new("example.com/v1")
            .doc("+rbac:resource=gadgets,verbs=get")
            .with_type(spec);
        TypeGraph::new(vec![pkg]).unwrap()
    }

    #[test]
    fn test_collect_indexes_every_comment() {
        let registry = registry();
        let parser = MarkerParser::new(&registry);
        let graph = graph();
        let (index, diags) = MarkerIndex::collect(&graph, &parser);

        assert_eq!(diags.len(), 1, "rbac is not a field marker");
        assert_eq!(index.marker_count(), 3);
        assert!(index.package("example.com/v1").contains("rbac"));
        let ident = TypeIdent::new("example.com/v1", "WidgetSpec");
        assert!(index.declaration(&ident).contains("rbac"));
        assert!(index.field(&ident, "size").contains("optional"));
        assert!(index.field(&ident, "name").is_empty());
        assert!(index.field(&ident, "missing").is_empty());
    }

    #[test]
    fn test_contributions_in_source_order() {
        let registry = registry();
        let parser = MarkerParser::new(&registry);
        let (index, _) = MarkerIndex::collect(&graph(), &parser);
        let resources: Vec<&[String]> = index
            .contributions(Contributor::Rule)
            .map(|v| v.list("resource"))
            .collect();
        assert_eq!(
            resources,
            vec![&["gadgets".to_string()][..], &["widgets".to_string()][..]]
        );
        assert_eq!(index.contributions(Contributor::Webhook).count(), 0);
    }
}
