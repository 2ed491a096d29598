//! # Data-Model Declaration
//!
//! The declaration a schema family is derived from: enums, models,
//! columns, relations, and unique keys. A declaration is built in Rust
//! (see [`crate::workflow`]) or loaded from YAML/JSON, and must pass
//! [`DataModel::validate`] before anything is generated from it.
//!
//! ## Relation Ownership
//!
//! Every relation has an opposite side on its target model. The side that
//! lists foreign-key `fields` owns the relation; list relations never own
//! foreign keys. A pair of models joined by more than one relation tells
//! the pairs apart with `relation_name`.
//!
//! ## Declaration Format
//!
//! ```yaml
//! enums:
//!   - name: RunStatus
//!     values: [PENDING, RUNNING]
//! models:
//!   - name: FlowRun
//!     fields:
//!       - { name: id, type: String, id: true, default: cuid }
//!       - { name: status, type: RunStatus, default: { value: PENDING } }
//!       - { name: flowId, type: String }
//!     relations:
//!       - { name: flow, target: Flow, fields: [flowId], references: [id] }
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{MirrorError, ModelError};
use crate::naming::is_identifier;
use crate::scalar::ScalarType;

fn is_false(b: &bool) -> bool {
    !*b
}

/// The type of a column: a scalar primitive or a declared enum.
///
/// Serialized as a single string: scalar names take precedence, anything
/// else is read as an enum name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FieldType {
    /// A scalar primitive.
    Scalar(ScalarType),
    /// The name of a declared enum.
    Enum(String),
}

impl FieldType {
    /// The scalar primitive, if this is a scalar column.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Self::Scalar(ty) => Some(*ty),
            Self::Enum(_) => None,
        }
    }

    /// The enum name, if this is an enum column.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Self::Scalar(_) => None,
            Self::Enum(name) => Some(name),
        }
    }

    /// The declaration name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Scalar(ty) => ty.as_str(),
            Self::Enum(name) => name,
        }
    }
}

impl From<ScalarType> for FieldType {
    fn from(ty: ScalarType) -> Self {
        Self::Scalar(ty)
    }
}

impl TryFrom<String> for FieldType {
    type Error = MirrorError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if let Ok(ty) = s.parse::<ScalarType>() {
            return Ok(Self::Scalar(ty));
        }
        if is_identifier(&s) {
            Ok(Self::Enum(s))
        } else {
            Err(MirrorError::Parse(format!("invalid field type: {s:?}")))
        }
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        ty.as_str().to_string()
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The default a column takes when a create payload omits it.
///
/// Declared as a bare keyword (`cuid`, `now`, ...) or as `{ value: ... }`
/// for a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DefaultRepr", into = "DefaultRepr")]
pub enum DefaultValue {
    /// Database sequence; never supplied by the client.
    Autoincrement,
    /// Collision-resistant id.
    Cuid,
    /// Random v4 UUID.
    Uuid,
    /// Current instant.
    Now,
    /// A literal JSON value (string, number, boolean, enum value, or document).
    Value(Value),
}

#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DefaultKeyword {
    Autoincrement,
    Cuid,
    Uuid,
    Now,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum DefaultRepr {
    Keyword(DefaultKeyword),
    Literal { value: Value },
}

impl From<DefaultRepr> for DefaultValue {
    fn from(repr: DefaultRepr) -> Self {
        match repr {
            DefaultRepr::Keyword(DefaultKeyword::Autoincrement) => Self::Autoincrement,
            DefaultRepr::Keyword(DefaultKeyword::Cuid) => Self::Cuid,
            DefaultRepr::Keyword(DefaultKeyword::Uuid) => Self::Uuid,
            DefaultRepr::Keyword(DefaultKeyword::Now) => Self::Now,
            DefaultRepr::Literal { value } => Self::Value(value),
        }
    }
}

impl From<DefaultValue> for DefaultRepr {
    fn from(default: DefaultValue) -> Self {
        match default {
            DefaultValue::Autoincrement => Self::Keyword(DefaultKeyword::Autoincrement),
            DefaultValue::Cuid => Self::Keyword(DefaultKeyword::Cuid),
            DefaultValue::Uuid => Self::Keyword(DefaultKeyword::Uuid),
            DefaultValue::Now => Self::Keyword(DefaultKeyword::Now),
            DefaultValue::Value(value) => Self::Literal { value },
        }
    }
}

impl DefaultValue {
    /// The literal value, if this default is a literal.
    pub fn literal(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// A column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Whether the column accepts `null`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    /// Whether the column is the single-column primary key.
    #[serde(default, skip_serializing_if = "is_false")]
    pub id: bool,
    /// Whether the column carries a single-column unique constraint.
    #[serde(default, skip_serializing_if = "is_false")]
    pub unique: bool,
    /// Whether the database stamps the column on every write.
    #[serde(default, skip_serializing_if = "is_false")]
    pub updated_at: bool,
    /// Default applied when a create payload omits the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
    /// Free-form documentation carried into the schema `description`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl FieldDef {
    /// A required column of the given type.
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            optional: false,
            id: false,
            unique: false,
            updated_at: false,
            default: None,
            doc: None,
        }
    }

    /// A required column whose type is a declared enum.
    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Enum(enum_name.into()))
    }

    /// Mark the column nullable.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the column as the primary key.
    pub fn id(mut self) -> Self {
        self.id = true;
        self
    }

    /// Mark the column unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the column as stamped on every write.
    pub fn updated_at(mut self) -> Self {
        self.updated_at = true;
        self
    }

    /// Set the default.
    pub fn default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Set a literal default.
    pub fn default_value(self, value: impl Into<Value>) -> Self {
        self.default(DefaultValue::Value(value.into()))
    }

    /// Attach documentation.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// The scalar primitive, if this is a scalar column.
    pub fn scalar_type(&self) -> Option<ScalarType> {
        self.field_type.scalar()
    }

    /// The enum name, if this is an enum column.
    pub fn enum_name(&self) -> Option<&str> {
        self.field_type.enum_name()
    }

    /// Whether the value is assigned by a database sequence.
    pub fn is_autoincrement(&self) -> bool {
        matches!(self.default, Some(DefaultValue::Autoincrement))
    }

    /// Whether an insert payload may leave the column out.
    pub fn may_omit_on_create(&self) -> bool {
        self.optional || self.updated_at || self.default.is_some()
    }

    /// Whether the column is numeric (avg/sum aggregates, arithmetic updates).
    pub fn is_numeric(&self) -> bool {
        self.scalar_type().is_some_and(|ty| ty.is_numeric())
    }

    /// Whether the column may appear in `orderBy` and min/max aggregates.
    pub fn is_sortable(&self) -> bool {
        self.scalar_type().map_or(true, |ty| ty.is_sortable())
    }
}

/// Cardinality of a relation field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// At most one related record.
    #[default]
    One,
    /// A list of related records.
    Many,
}

/// A relation field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDef {
    /// Relation field name.
    pub name: String,
    /// Target model name.
    pub target: String,
    /// Cardinality.
    #[serde(default)]
    pub kind: RelationKind,
    /// Whether a to-one relation may be absent.
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    /// Disambiguates multiple relations between the same pair of models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_name: Option<String>,
    /// Foreign-key columns on this model (owning side only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    /// Referenced columns on the target model.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

impl RelationDef {
    /// A required to-one relation.
    pub fn one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind: RelationKind::One,
            optional: false,
            relation_name: None,
            fields: Vec::new(),
            references: Vec::new(),
        }
    }

    /// A to-many relation.
    pub fn many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind: RelationKind::Many,
            ..Self::one(name, target)
        }
    }

    /// Mark a to-one relation as optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Name the relation so it pairs with the matching side on the target.
    pub fn named(mut self, relation_name: impl Into<String>) -> Self {
        self.relation_name = Some(relation_name.into());
        self
    }

    /// Make this the owning side: `fields` on this model reference `references` on the target.
    pub fn references<F, R>(mut self, fields: F, references: R) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this is a list relation.
    pub fn is_many(&self) -> bool {
        self.kind == RelationKind::Many
    }

    /// Whether this side holds the foreign-key columns.
    pub fn is_owning(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Whether a create payload must supply this relation.
    ///
    /// Only an owning, non-optional to-one relation is required; the
    /// non-owning side of a one-to-one is always optional.
    pub fn is_required(&self) -> bool {
        self.kind == RelationKind::One && !self.optional && self.is_owning()
    }
}

/// A compound unique key (or compound primary key) over two or more columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueConstraint {
    /// Participating columns, in key order.
    pub fields: Vec<String>,
    /// Explicit key name; defaults to the field names joined with `_`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether this is the compound primary key.
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary: bool,
}

impl UniqueConstraint {
    /// The key name used in unique lookups, e.g. `sourceNodeId_targetNodeId`.
    pub fn key_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.fields.join("_"))
    }
}

/// A resolved unique key of a model.
#[derive(Debug, Clone)]
pub struct UniqueKey<'a> {
    /// Key name in unique lookups.
    pub name: String,
    /// Participating columns.
    pub fields: Vec<&'a FieldDef>,
}

impl UniqueKey<'_> {
    /// Whether the key spans more than one column.
    pub fn is_compound(&self) -> bool {
        self.fields.len() > 1
    }
}

/// A model (table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    /// Model name.
    pub name: String,
    /// Columns, in declaration order.
    pub fields: Vec<FieldDef>,
    /// Relation fields, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relations: Vec<RelationDef>,
    /// Compound unique keys.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique: Vec<UniqueConstraint>,
    /// Free-form documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl ModelDef {
    /// An empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            relations: Vec::new(),
            unique: Vec::new(),
            doc: None,
        }
    }

    /// Append a column.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a relation.
    pub fn relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Add a compound unique key.
    pub fn unique<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.unique.push(UniqueConstraint {
            fields: fields.into_iter().map(Into::into).collect(),
            name: None,
            primary: false,
        });
        self
    }

    /// Set the compound primary key.
    pub fn primary_key<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.unique.push(UniqueConstraint {
            fields: fields.into_iter().map(Into::into).collect(),
            name: None,
            primary: true,
        });
        self
    }

    /// Attach documentation.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Look up a column by name.
    pub fn field_named(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a relation by name.
    pub fn relation_named(&self, name: &str) -> Option<&RelationDef> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Names of every foreign-key column owned by this model's relations.
    pub fn foreign_keys(&self) -> BTreeSet<&str> {
        self.relations
            .iter()
            .flat_map(|r| r.fields.iter().map(String::as_str))
            .collect()
    }

    /// Whether the column is a foreign key of one of this model's relations.
    pub fn is_foreign_key(&self, field: &str) -> bool {
        self.relations.iter().any(|r| r.fields.iter().any(|f| f == field))
    }

    /// Every unique key: single-column ids and uniques first, then compound keys.
    pub fn unique_keys(&self) -> Vec<UniqueKey<'_>> {
        let mut keys: Vec<UniqueKey<'_>> = self
            .fields
            .iter()
            .filter(|f| f.id || f.unique)
            .map(|f| UniqueKey {
                name: f.name.clone(),
                fields: vec![f],
            })
            .collect();

        for constraint in &self.unique {
            let fields: Vec<&FieldDef> = constraint
                .fields
                .iter()
                .filter_map(|name| self.field_named(name))
                .collect();
            keys.push(UniqueKey {
                name: constraint.key_name(),
                fields,
            });
        }
        keys
    }

    /// Whether the column is a single-column unique lookup key.
    pub fn is_single_unique(&self, field: &str) -> bool {
        self.field_named(field).is_some_and(|f| f.id || f.unique)
    }

    /// Whether the model declares any relation.
    pub fn has_relations(&self) -> bool {
        !self.relations.is_empty()
    }

    /// The list relations.
    pub fn to_many_relations(&self) -> impl Iterator<Item = &RelationDef> {
        self.relations.iter().filter(|r| r.is_many())
    }

    /// Whether the model declares any list relation.
    pub fn has_to_many_relations(&self) -> bool {
        self.relations.iter().any(RelationDef::is_many)
    }

    /// Columns that are neither foreign keys nor generated by a sequence.
    pub fn scalar_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields
            .iter()
            .filter(|f| !self.is_foreign_key(&f.name) && !f.is_autoincrement())
    }

    /// Columns that support avg/sum aggregates.
    pub fn numeric_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_numeric())
    }

    /// Columns that support `orderBy` and min/max aggregates.
    pub fn sortable_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_sortable())
    }
}

/// An enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDef {
    /// Enum name.
    pub name: String,
    /// Permitted values, in declaration order.
    pub values: Vec<String>,
    /// Free-form documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl EnumDef {
    /// An enum with the given values.
    pub fn new<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
            doc: None,
        }
    }

    /// Whether `value` is one of the permitted values.
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }
}

/// A complete data-model declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataModel {
    /// Declared enums.
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    /// Declared models.
    pub models: Vec<ModelDef>,
}

impl DataModel {
    /// An empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an enum.
    pub fn with_enum(mut self, def: EnumDef) -> Self {
        self.enums.push(def);
        self
    }

    /// Append a model.
    pub fn with_model(mut self, model: ModelDef) -> Self {
        self.models.push(model);
        self
    }

    /// Parse a YAML declaration. Does not validate.
    pub fn from_yaml_str(s: &str) -> Result<Self, MirrorError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Parse a JSON declaration. Does not validate.
    pub fn from_json_str(s: &str) -> Result<Self, MirrorError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a declaration file (`.json` as JSON, anything else as YAML) and validate it.
    pub fn load(path: &Path) -> Result<Self, MirrorError> {
        let content = std::fs::read_to_string(path)?;
        let model = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            _ => Self::from_yaml_str(&content)?,
        };
        model.validate()?;
        Ok(model)
    }

    /// Render the declaration as YAML.
    pub fn to_yaml_string(&self) -> Result<String, MirrorError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Look up a model by name.
    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Look up an enum by name.
    pub fn enum_def(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Scalar types used by at least one column, in [`ScalarType`] order.
    pub fn used_scalar_types(&self) -> BTreeSet<ScalarType> {
        self.models
            .iter()
            .flat_map(|m| m.fields.iter())
            .filter_map(FieldDef::scalar_type)
            .collect()
    }

    /// The opposite side of `relation` on its target model.
    ///
    /// Returns `None` when the target is unknown or when zero or several
    /// relations on the target qualify; [`DataModel::validate`] rejects
    /// both cases, so on a validated model this always succeeds.
    pub fn back_relation<'a>(
        &'a self,
        model: &ModelDef,
        relation: &RelationDef,
    ) -> Option<(&'a ModelDef, &'a RelationDef)> {
        let target = self.model(&relation.target)?;
        match back_relation_candidates(model, relation, target).as_slice() {
            [only] => Some((target, *only)),
            _ => None,
        }
    }

    /// Check the declaration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first [`ModelError`] found; see the variants for the
    /// full list of checks.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut enum_names = HashSet::new();
        for def in &self.enums {
            if !is_identifier(&def.name) {
                return Err(ModelError::InvalidIdentifier(def.name.clone()));
            }
            if !enum_names.insert(def.name.as_str()) {
                return Err(ModelError::DuplicateEnum(def.name.clone()));
            }
            if def.values.is_empty() {
                return Err(ModelError::EmptyEnum(def.name.clone()));
            }
            let mut seen = HashSet::new();
            for value in &def.values {
                if !is_identifier(value) {
                    return Err(ModelError::InvalidIdentifier(value.clone()));
                }
                if !seen.insert(value.as_str()) {
                    return Err(ModelError::DuplicateEnumValue {
                        enum_name: def.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        let mut model_names = HashSet::new();
        for model in &self.models {
            if !is_identifier(&model.name) {
                return Err(ModelError::InvalidIdentifier(model.name.clone()));
            }
            if enum_names.contains(model.name.as_str()) {
                return Err(ModelError::DuplicateEnum(model.name.clone()));
            }
            if !model_names.insert(model.name.as_str()) {
                return Err(ModelError::DuplicateModel(model.name.clone()));
            }
        }

        for model in &self.models {
            self.validate_model(model)?;
        }
        Ok(())
    }

    fn validate_model(&self, model: &ModelDef) -> Result<(), ModelError> {
        let mut names = HashSet::new();
        let member_names = model
            .fields
            .iter()
            .map(|f| &f.name)
            .chain(model.relations.iter().map(|r| &r.name));
        for name in member_names {
            if !is_identifier(name) {
                return Err(ModelError::InvalidIdentifier(name.clone()));
            }
            if !names.insert(name.as_str()) {
                return Err(ModelError::DuplicateField {
                    model: model.name.clone(),
                    field: name.clone(),
                });
            }
        }

        for field in &model.fields {
            self.validate_field(model, field)?;
        }

        for relation in &model.relations {
            self.validate_relation(model, relation)?;
        }

        for constraint in &model.unique {
            if constraint.fields.len() < 2 {
                return Err(ModelError::ShortCompoundUnique(model.name.clone()));
            }
            for name in &constraint.fields {
                if model.field_named(name).is_none() {
                    return Err(ModelError::UnknownField {
                        model: model.name.clone(),
                        field: name.clone(),
                        context: "compound unique".to_string(),
                    });
                }
            }
        }

        if model.unique_keys().is_empty() {
            return Err(ModelError::NoUniqueKey(model.name.clone()));
        }
        Ok(())
    }

    fn validate_field(&self, model: &ModelDef, field: &FieldDef) -> Result<(), ModelError> {
        let invalid_default = |reason: &str| ModelError::InvalidDefault {
            model: model.name.clone(),
            field: field.name.clone(),
            reason: reason.to_string(),
        };

        let enum_def = match &field.field_type {
            FieldType::Enum(name) => Some(self.enum_def(name).ok_or_else(|| {
                ModelError::UnknownType {
                    model: model.name.clone(),
                    field: field.name.clone(),
                    type_name: name.clone(),
                }
            })?),
            FieldType::Scalar(_) => None,
        };

        let scalar = field.scalar_type();
        if field.updated_at && scalar != Some(ScalarType::DateTime) {
            return Err(invalid_default("updated_at requires a DateTime column"));
        }

        match &field.default {
            None => {}
            Some(DefaultValue::Autoincrement) => {
                if !matches!(scalar, Some(ScalarType::Int | ScalarType::BigInt)) {
                    return Err(invalid_default("autoincrement requires an Int or BigInt column"));
                }
            }
            Some(DefaultValue::Cuid | DefaultValue::Uuid) => {
                if scalar != Some(ScalarType::String) {
                    return Err(invalid_default("generated ids require a String column"));
                }
            }
            Some(DefaultValue::Now) => {
                if scalar != Some(ScalarType::DateTime) {
                    return Err(invalid_default("now requires a DateTime column"));
                }
            }
            Some(DefaultValue::Value(value)) => {
                let ok = match (enum_def, scalar) {
                    (Some(def), _) => value.as_str().is_some_and(|v| def.contains(v)),
                    (None, Some(ty)) => literal_matches(ty, value),
                    (None, None) => false,
                };
                if !ok {
                    return Err(invalid_default(&format!(
                        "{value} is not a valid {}",
                        field.field_type
                    )));
                }
            }
        }
        Ok(())
    }

    fn validate_relation(&self, model: &ModelDef, relation: &RelationDef) -> Result<(), ModelError> {
        let target = self.model(&relation.target).ok_or_else(|| ModelError::UnknownTarget {
            model: model.name.clone(),
            relation: relation.name.clone(),
            target: relation.target.clone(),
        })?;

        if relation.is_many() && relation.is_owning() {
            return Err(ModelError::ListOwnsForeignKey {
                model: model.name.clone(),
                relation: relation.name.clone(),
            });
        }

        if relation.fields.len() != relation.references.len() {
            return Err(ModelError::ReferenceArity {
                model: model.name.clone(),
                relation: relation.name.clone(),
                fields: relation.fields.len(),
                references: relation.references.len(),
            });
        }

        for name in &relation.fields {
            if model.field_named(name).is_none() {
                return Err(ModelError::UnknownField {
                    model: model.name.clone(),
                    field: name.clone(),
                    context: format!("foreign key of relation '{}'", relation.name),
                });
            }
        }
        for name in &relation.references {
            if target.field_named(name).is_none() {
                return Err(ModelError::UnknownField {
                    model: target.name.clone(),
                    field: name.clone(),
                    context: format!("reference of relation '{}.{}'", model.name, relation.name),
                });
            }
        }

        let candidates = back_relation_candidates(model, relation, target);
        let Some(back) = candidates.first().copied() else {
            return Err(ModelError::MissingBackRelation {
                model: model.name.clone(),
                relation: relation.name.clone(),
                target: target.name.clone(),
            });
        };
        if candidates.len() > 1 {
            return Err(ModelError::AmbiguousBackRelation {
                model: model.name.clone(),
                relation: relation.name.clone(),
                target: target.name.clone(),
            });
        }

        // A to-one side facing a list, or a one-to-one pair, needs exactly one owner.
        let needs_owner = !relation.is_many();
        if needs_owner && !relation.is_owning() && (back.is_many() || !back.is_owning()) {
            return Err(ModelError::UnownedRelation {
                model: model.name.clone(),
                relation: relation.name.clone(),
            });
        }
        Ok(())
    }
}

/// Relations on `target` that can be the opposite side of `model.relation`.
fn back_relation_candidates<'a>(
    model: &ModelDef,
    relation: &RelationDef,
    target: &'a ModelDef,
) -> Vec<&'a RelationDef> {
    let self_relation = model.name == target.name;
    target
        .relations
        .iter()
        .filter(|candidate| {
            candidate.target == model.name
                && candidate.relation_name == relation.relation_name
                && !(self_relation && candidate.name == relation.name)
        })
        .collect()
}

/// Whether a literal default is a valid value of `ty`.
fn literal_matches(ty: ScalarType, value: &Value) -> bool {
    match ty {
        ScalarType::String | ScalarType::Bytes => value.is_string(),
        ScalarType::Int => value
            .as_i64()
            .is_some_and(|n| i32::try_from(n).is_ok()),
        ScalarType::BigInt => value.is_i64(),
        ScalarType::Float => value.is_number(),
        ScalarType::Decimal => value.is_number() || value.is_string(),
        ScalarType::Boolean => value.is_boolean(),
        ScalarType::DateTime => value
            .as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok()),
        ScalarType::Json => true,
    }
}
