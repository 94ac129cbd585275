//! # Schema Nodes
//!
//! [`SchemaNode`] is the synthesized validation-schema IR: an OpenAPI v3
//! structural schema with the `x-kubernetes-*` extensions downstream
//! consumers expect. Empty and default-valued fields are skipped when
//! serializing, so a node renders as the minimal document for its content.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use markgen_core::TypeIdent;

/// The `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    /// Record or map.
    Object,
    /// List.
    Array,
    /// String.
    String,
    /// Floating-point number.
    Number,
    /// Integer.
    Integer,
    /// Boolean.
    Boolean,
}

impl SchemaKind {
    /// Whether numeric bounds apply.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Integer)
    }
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SchemaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "object" => Ok(Self::Object),
            "array" => Ok(Self::Array),
            "string" => Ok(Self::String),
            "number" => Ok(Self::Number),
            "integer" => Ok(Self::Integer),
            "boolean" => Ok(Self::Boolean),
            other => Err(format!("unknown schema type '{other}'")),
        }
    }
}

/// Discriminator policy of a union group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnionPolicy {
    /// Zero or one member may be set.
    AtMostOne,
    /// Exactly one member must be set.
    ExactlyOne,
    /// At least one member must be set.
    AtLeastOne,
}

impl std::fmt::Display for UnionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::AtMostOne => "at-most-one",
            Self::ExactlyOne => "exactly-one",
            Self::AtLeastOne => "at-least-one",
        };
        f.write_str(s)
    }
}

/// A union over a set of sibling properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionGroup {
    /// Policy enforced over the members.
    pub policy: UnionPolicy,
    /// Member property keys in declared order.
    pub members: Vec<String>,
}

/// `x-kubernetes-list-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    /// Replaced as a whole on merge.
    Atomic,
    /// Scalar items merged as a set.
    Set,
    /// Object items merged by key fields.
    Map,
}

/// `x-kubernetes-map-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapType {
    /// Keys merged individually.
    Granular,
    /// Replaced as a whole on merge.
    Atomic,
}

/// One `x-kubernetes-validations` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    /// Rule expression.
    pub rule: String,
    /// Message reported when the rule fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Field the failure is reported against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_path: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// A synthesized schema document fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaNode {
    /// Reference to another declaration's schema, used to break cycles.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// `type` keyword.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaKind>,
    /// `format` keyword.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Object properties in declaration order.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, SchemaNode>,
    /// Required property keys.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Array item schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    /// Map value schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaNode>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_maximum: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub exclusive_minimum: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Closed value set.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<SchemaNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<SchemaNode>,

    /// Union groups declared over this node's properties.
    #[serde(rename = "x-kubernetes-unions", skip_serializing_if = "Vec::is_empty")]
    pub unions: Vec<UnionGroup>,
    #[serde(rename = "x-kubernetes-list-type", skip_serializing_if = "Option::is_none")]
    pub list_type: Option<ListType>,
    #[serde(rename = "x-kubernetes-list-map-keys", skip_serializing_if = "Vec::is_empty")]
    pub list_map_keys: Vec<String>,
    #[serde(rename = "x-kubernetes-map-type", skip_serializing_if = "Option::is_none")]
    pub map_type: Option<MapType>,
    #[serde(
        rename = "x-kubernetes-preserve-unknown-fields",
        skip_serializing_if = "Option::is_none"
    )]
    pub preserve_unknown_fields: Option<bool>,
    #[serde(rename = "x-kubernetes-int-or-string", skip_serializing_if = "is_false")]
    pub int_or_string: bool,
    #[serde(rename = "x-kubernetes-embedded-resource", skip_serializing_if = "is_false")]
    pub embedded_resource: bool,
    #[serde(rename = "x-kubernetes-validations", skip_serializing_if = "Vec::is_empty")]
    pub validations: Vec<ValidationRule>,
}

impl SchemaNode {
    /// A node with only a `type`.
    pub fn of(kind: SchemaKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// A node with a `type` and `format`.
    pub fn formatted(kind: SchemaKind, format: &str) -> Self {
        Self {
            format: Some(format.to_string()),
            ..Self::of(kind)
        }
    }

    /// A reference to a declaration's schema.
    pub fn reference_to(ident: &TypeIdent) -> Self {
        Self {
            reference: Some(reference_path(ident)),
            ..Self::default()
        }
    }

    /// The placeholder emitted for declarations that failed synthesis and
    /// for free-form values.
    pub fn opaque() -> Self {
        Self {
            preserve_unknown_fields: Some(true),
            ..Self::of(SchemaKind::Object)
        }
    }

    /// An array of `items`.
    pub fn array(items: SchemaNode) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaKind::Array)
        }
    }

    /// A map with values of `values`.
    pub fn map(values: SchemaNode) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::of(SchemaKind::Object)
        }
    }

    /// Whether this node is a bare reference.
    pub fn is_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Whether this node is the opaque placeholder shape.
    pub fn is_opaque(&self) -> bool {
        self.kind == Some(SchemaKind::Object)
            && self.preserve_unknown_fields == Some(true)
            && self.properties.is_empty()
            && self.additional_properties.is_none()
    }

    /// Depth-first iterator over this node and every nested node.
    pub fn walk(&self) -> Vec<&SchemaNode> {
        let mut out = vec![self];
        let mut i = 0;
        while i < out.len() {
            let node = out[i];
            out.extend(node.properties.values());
            out.extend(node.items.as_deref());
            out.extend(node.additional_properties.as_deref());
            out.extend(node.one_of.iter());
            out.extend(node.any_of.iter());
            out.extend(node.all_of.iter());
            i += 1;
        }
        out
    }
}

/// The `$ref` target used for a declaration.
pub fn reference_path(ident: &TypeIdent) -> String {
    format!("#/definitions/{ident}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_serialization() {
        let node = SchemaNode {
            max_length: Some(15),
            min_length: Some(1),
            ..SchemaNode::of(SchemaKind::String)
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "string", "maxLength": 15, "minLength": 1})
        );
    }

    #[test]
    fn test_extension_keys() {
        let mut node = SchemaNode::array(SchemaNode::of(SchemaKind::Object));
        node.list_type = Some(ListType::Map);
        node.list_map_keys = vec!["name".to_string()];
        node.unions.push(UnionGroup {
            policy: UnionPolicy::ExactlyOne,
            members: vec!["a".into(), "b".into()],
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["x-kubernetes-list-type"], "map");
        assert_eq!(json["x-kubernetes-list-map-keys"], serde_json::json!(["name"]));
        assert_eq!(json["x-kubernetes-unions"][0]["policy"], "exactlyOne");
        assert_eq!(json["items"]["type"], "object");
    }

    #[test]
    fn test_reference_and_opaque() {
        let ident = TypeIdent::new("example.com/v1", "Node");
        let r = SchemaNode::reference_to(&ident);
        assert!(r.is_reference());
        assert_eq!(
            serde_json::to_value(&r).unwrap(),
            serde_json::json!({"$ref": "#/definitions/example.com/v1.Node"})
        );
        assert!(SchemaNode::opaque().is_opaque());
        assert!(!SchemaNode::of(SchemaKind::Object).is_opaque());
    }

    #[test]
    fn test_walk_visits_nested() {
        let mut root = SchemaNode::of(SchemaKind::Object);
        root.properties
            .insert("list".into(), SchemaNode::array(SchemaNode::of(SchemaKind::String)));
        root.properties
            .insert("map".into(), SchemaNode::map(SchemaNode::of(SchemaKind::Integer)));
        assert_eq!(root.walk().len(), 5);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("integer".parse::<SchemaKind>().unwrap(), SchemaKind::Integer);
        assert!("int".parse::<SchemaKind>().is_err());
    }
}
