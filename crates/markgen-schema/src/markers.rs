//! Schema and resource marker definitions.

use markgen_core::Applicability::{self, Declaration, Field, Package};
use markgen_markers::{ArgKind, Contributor, MarkerDefinition, MarkerProvider};

pub const MAX_LENGTH: &str = "validation:MaxLength";
pub const MIN_LENGTH: &str = "validation:MinLength";
pub const MAX_ITEMS: &str = "validation:MaxItems";
pub const MIN_ITEMS: &str = "validation:MinItems";
pub const MAX_PROPERTIES: &str = "validation:MaxProperties";
pub const MIN_PROPERTIES: &str = "validation:MinProperties";
pub const MINIMUM: &str = "validation:Minimum";
pub const MAXIMUM: &str = "validation:Maximum";
pub const MULTIPLE_OF: &str = "validation:MultipleOf";
pub const EXCLUSIVE_MINIMUM: &str = "validation:ExclusiveMinimum";
pub const EXCLUSIVE_MAXIMUM: &str = "validation:ExclusiveMaximum";
pub const PATTERN: &str = "validation:Pattern";
pub const FORMAT: &str = "validation:Format";
pub const TYPE: &str = "validation:Type";
pub const ENUM: &str = "validation:Enum";
pub const CONSTRAINTS: &str = "validation:Constraints";
pub const X_VALIDATION: &str = "validation:XValidation";
pub const X_PRESERVE_UNKNOWN_FIELDS: &str = "validation:XPreserveUnknownFields";
pub const X_EMBEDDED_RESOURCE: &str = "validation:XEmbeddedResource";
pub const X_INT_OR_STRING: &str = "validation:XIntOrString";
pub const NULLABLE: &str = "nullable";
pub const DEFAULT: &str = "default";
pub const OPTIONAL: &str = "optional";
pub const REQUIRED: &str = "required";
pub const LIST_TYPE: &str = "listType";
pub const LIST_MAP_KEY: &str = "listMapKey";
pub const MAP_TYPE: &str = "mapType";
pub const FEATURE_GATE: &str = "featureGate";
pub const EXACTLY_ONE_OF: &str = "validation:ExactlyOneOf";
pub const AT_MOST_ONE_OF: &str = "validation:AtMostOneOf";
pub const AT_LEAST_ONE_OF: &str = "validation:AtLeastOneOf";

pub const GROUP_NAME: &str = "groupName";
pub const VERSION_NAME: &str = "versionName";
pub const RESOURCE: &str = "resource";
pub const SUBRESOURCE_STATUS: &str = "subresource:status";
pub const STORAGE_VERSION: &str = "storageversion";
pub const PRINT_COLUMN: &str = "printcolumn";

/// Provider for every marker consumed by schema synthesis and resource
/// definition assembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaMarkers;

fn both(def: MarkerDefinition) -> [MarkerDefinition; 2] {
    [def.at(Declaration), def.at(Field)]
}

fn schema(name: &str, applicability: Applicability) -> MarkerDefinition {
    MarkerDefinition::new(name, applicability, Contributor::Schema)
}

fn anonymous(name: &str, kind: ArgKind, summary: &str) -> [MarkerDefinition; 2] {
    both(
        schema(name, Field)
            .anonymous(kind)
            .single()
            .help("validation", summary),
    )
}

impl MarkerProvider for SchemaMarkers {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn definitions(&self) -> Vec<MarkerDefinition> {
        let mut defs = Vec::new();

        defs.extend(anonymous(MAX_LENGTH, ArgKind::Int, "maximum string length"));
        defs.extend(anonymous(MIN_LENGTH, ArgKind::Int, "minimum string length"));
        defs.extend(anonymous(MAX_ITEMS, ArgKind::Int, "maximum list length"));
        defs.extend(anonymous(MIN_ITEMS, ArgKind::Int, "minimum list length"));
        defs.extend(anonymous(MAX_PROPERTIES, ArgKind::Int, "maximum number of map entries"));
        defs.extend(anonymous(MIN_PROPERTIES, ArgKind::Int, "minimum number of map entries"));
        defs.extend(anonymous(MINIMUM, ArgKind::Number, "inclusive numeric lower bound"));
        defs.extend(anonymous(MAXIMUM, ArgKind::Number, "inclusive numeric upper bound"));
        defs.extend(anonymous(MULTIPLE_OF, ArgKind::Number, "value must be a multiple of this"));
        defs.extend(anonymous(EXCLUSIVE_MINIMUM, ArgKind::Bool, "make the lower bound exclusive"));
        defs.extend(anonymous(EXCLUSIVE_MAXIMUM, ArgKind::Bool, "make the upper bound exclusive"));
        defs.extend(anonymous(PATTERN, ArgKind::String, "regular expression strings must match"));
        defs.extend(anonymous(FORMAT, ArgKind::String, "OpenAPI format"));
        defs.extend(anonymous(TYPE, ArgKind::String, "override the inferred type"));
        defs.extend(anonymous(ENUM, ArgKind::StringList, "closed set of permitted values"));
        defs.extend(both(
            schema(CONSTRAINTS, Field)
                .optional("maxLength", ArgKind::Int)
                .optional("minLength", ArgKind::Int)
                .optional("maxItems", ArgKind::Int)
                .optional("minItems", ArgKind::Int)
                .optional("minimum", ArgKind::Number)
                .optional("maximum", ArgKind::Number)
                .optional("pattern", ArgKind::String)
                .help("validation", "several bounds in one marker"),
        ));
        defs.extend(both(
            schema(X_VALIDATION, Field)
                .arg("rule", ArgKind::String)
                .optional("message", ArgKind::String)
                .optional("fieldPath", ArgKind::String)
                .help("validation", "attach a validation rule expression")
                .details("Only the surface syntax of the rule is checked."),
        ));
        for (name, summary) in [
            (X_PRESERVE_UNKNOWN_FIELDS, "keep fields not described by the schema"),
            (X_EMBEDDED_RESOURCE, "value is a complete embedded object"),
            (X_INT_OR_STRING, "value may be an integer or a string"),
        ] {
            defs.extend(both(schema(name, Field).single().help("validation", summary)));
        }
        defs.extend(both(schema(NULLABLE, Field).single().help("validation", "value may be null")));
        defs.extend(both(
            schema(DEFAULT, Field)
                .anonymous(ArgKind::Any)
                .single()
                .help("validation", "default value applied when the field is absent"),
        ));
        defs.push(schema(OPTIONAL, Field).single().help("validation", "field is not required"));
        defs.push(
            schema(REQUIRED, Field)
                .single()
                .help("validation", "field is required even if optional in source"),
        );
        defs.extend(both(
            schema(LIST_TYPE, Field)
                .anonymous(ArgKind::String)
                .single()
                .help("topology", "merge strategy for lists: atomic, set, or map"),
        ));
        defs.extend(both(
            schema(LIST_MAP_KEY, Field)
                .anonymous(ArgKind::String)
                .help("topology", "key field of a map-typed list; repeatable"),
        ));
        defs.extend(both(
            schema(MAP_TYPE, Field)
                .anonymous(ArgKind::String)
                .single()
                .help("topology", "merge strategy for maps: granular or atomic"),
        ));
        defs.extend(both(
            schema(FEATURE_GATE, Field)
                .anonymous(ArgKind::GateExpression)
                .single()
                .help("gates", "include only when the gate expression holds"),
        ));
        for (name, summary) in [
            (EXACTLY_ONE_OF, "exactly one of the listed fields must be set"),
            (AT_MOST_ONE_OF, "at most one of the listed fields may be set"),
            (AT_LEAST_ONE_OF, "at least one of the listed fields must be set"),
        ] {
            defs.push(
                schema(name, Declaration)
                    .anonymous(ArgKind::StringList)
                    .help("unions", summary),
            );
        }

        defs.push(
            schema(GROUP_NAME, Package)
                .anonymous(ArgKind::String)
                .single()
                .help("crd", "API group of the package's resources"),
        );
        defs.push(
            schema(VERSION_NAME, Package)
                .anonymous(ArgKind::String)
                .single()
                .help("crd", "API version of the package's resources"),
        );
        defs.push(
            schema(RESOURCE, Declaration)
                .optional("path", ArgKind::String)
                .optional("singular", ArgKind::String)
                .optional("shortName", ArgKind::StringList)
                .optional("categories", ArgKind::StringList)
                .optional("scope", ArgKind::String)
                .single()
                .help("crd", "declare a resource root"),
        );
        defs.push(
            schema(SUBRESOURCE_STATUS, Declaration)
                .single()
                .help("crd", "enable the status subresource"),
        );
        defs.push(
            schema(STORAGE_VERSION, Declaration)
                .single()
                .help("crd", "mark this version as the storage version"),
        );
        defs.push(
            schema(PRINT_COLUMN, Declaration)
                .arg("name", ArgKind::String)
                .arg("type", ArgKind::String)
                .arg("JSONPath", ArgKind::Path)
                .optional("description", ArgKind::String)
                .optional("format", ArgKind::String)
                .optional("priority", ArgKind::Int)
                .help("crd", "additional printer column"),
        );

        defs
    }
}
