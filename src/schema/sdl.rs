// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// GraphQL SDL type-definition loader
//
// Syntax is handled by graphql-parser. The parsed document is then checked
// so that every type reference resolves to a definition of a usable kind,
// and the fields of object, interface and input types (including their
// extensions) are indexed.

use std::collections::HashMap;

use graphql_parser::schema::{
    self, Definition, Document, Field, InputValue, Type, TypeDefinition, TypeExtension,
};
use graphql_parser::Pos;

use crate::redaction::error::{RedactionError, Result};
use crate::redaction::type_index::TypeIndex;

const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

type Sdl<'a> = Document<'a, &'a str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Scalar => "scalar",
            Kind::Object => "type",
            Kind::Interface => "interface",
            Kind::Union => "union",
            Kind::Enum => "enum",
            Kind::InputObject => "input",
        }
    }

    /// Usable as a field result type
    fn is_output(self) -> bool {
        !matches!(self, Kind::InputObject)
    }

    /// Usable as an argument or input field type
    fn is_input(self) -> bool {
        matches!(self, Kind::Scalar | Kind::Enum | Kind::InputObject)
    }
}

fn invalid(pos: Pos, message: impl Into<String>) -> RedactionError {
    RedactionError::schema_invalid(pos.line, pos.column, message)
}

fn definition_header<'a>(definition: &TypeDefinition<'a, &'a str>) -> (Kind, &'a str, Pos) {
    match definition {
        TypeDefinition::Scalar(t) => (Kind::Scalar, t.name, t.position),
        TypeDefinition::Object(t) => (Kind::Object, t.name, t.position),
        TypeDefinition::Interface(t) => (Kind::Interface, t.name, t.position),
        TypeDefinition::Union(t) => (Kind::Union, t.name, t.position),
        TypeDefinition::Enum(t) => (Kind::Enum, t.name, t.position),
        TypeDefinition::InputObject(t) => (Kind::InputObject, t.name, t.position),
    }
}

fn extension_header<'a>(extension: &TypeExtension<'a, &'a str>) -> (Kind, &'a str, Pos) {
    match extension {
        TypeExtension::Scalar(t) => (Kind::Scalar, t.name, t.position),
        TypeExtension::Object(t) => (Kind::Object, t.name, t.position),
        TypeExtension::Interface(t) => (Kind::Interface, t.name, t.position),
        TypeExtension::Union(t) => (Kind::Union, t.name, t.position),
        TypeExtension::Enum(t) => (Kind::Enum, t.name, t.position),
        TypeExtension::InputObject(t) => (Kind::InputObject, t.name, t.position),
    }
}

/// Innermost name of a type reference: `[Order!]!` -> `Order`
fn named_type<'a>(ty: &Type<'a, &'a str>) -> &'a str {
    match ty {
        Type::NamedType(name) => *name,
        Type::ListType(inner) | Type::NonNullType(inner) => named_type(inner),
    }
}

/// SDL rendering of a type reference, wrappers included
fn render<'a>(ty: &Type<'a, &'a str>) -> String {
    match ty {
        Type::NamedType(name) => (*name).to_string(),
        Type::ListType(inner) => format!("[{}]", render(inner)),
        Type::NonNullType(inner) => format!("{}!", render(inner)),
    }
}

/// Every type name the document declares, with its kind
struct Declarations<'a> {
    kinds: HashMap<&'a str, Kind>,
}

impl<'a> Declarations<'a> {
    fn collect(document: &Sdl<'a>) -> Result<Self> {
        let mut kinds: HashMap<&'a str, Kind> = BUILTIN_SCALARS
            .iter()
            .map(|name| (*name, Kind::Scalar))
            .collect();

        for definition in &document.definitions {
            if let Definition::TypeDefinition(definition) = definition {
                let (kind, name, pos) = definition_header(definition);
                if kinds.insert(name, kind).is_some() {
                    return Err(invalid(pos, format!("cannot redeclare type {}", name)));
                }
            }
        }
        Ok(Self { kinds })
    }

    fn lookup(&self, pos: Pos, name: &str, context: impl FnOnce() -> String) -> Result<Kind> {
        self.kinds
            .get(name)
            .copied()
            .ok_or_else(|| invalid(pos, format!("undefined type {} {}", name, context())))
    }

    fn check(&self, document: &Sdl<'a>) -> Result<()> {
        for definition in &document.definitions {
            match definition {
                Definition::SchemaDefinition(root) => {
                    for operation in [root.query, root.mutation, root.subscription]
                        .into_iter()
                        .flatten()
                    {
                        let kind = self.lookup(root.position, operation, || {
                            "for schema root operation".to_string()
                        })?;
                        if kind != Kind::Object {
                            return Err(invalid(
                                root.position,
                                format!("root type {} must be an object type", operation),
                            ));
                        }
                    }
                }
                Definition::TypeDefinition(definition) => self.check_definition(definition)?,
                Definition::TypeExtension(extension) => self.check_extension(extension)?,
                Definition::DirectiveDefinition(directive) => {
                    let owner = format!("@{}", directive.name);
                    self.check_inputs(&owner, &directive.arguments)?;
                }
            }
        }
        Ok(())
    }

    fn check_definition(&self, definition: &TypeDefinition<'a, &'a str>) -> Result<()> {
        match definition {
            TypeDefinition::Object(t) => {
                self.check_implements(t.position, t.name, &t.implements_interfaces)?;
                self.check_fields(t.name, &t.fields)
            }
            TypeDefinition::Interface(t) => {
                self.check_implements(t.position, t.name, &t.implements_interfaces)?;
                self.check_fields(t.name, &t.fields)
            }
            TypeDefinition::Union(t) => self.check_members(t.position, t.name, &t.types),
            TypeDefinition::InputObject(t) => self.check_inputs(t.name, &t.fields),
            TypeDefinition::Scalar(_) | TypeDefinition::Enum(_) => Ok(()),
        }
    }

    fn check_extension(&self, extension: &TypeExtension<'a, &'a str>) -> Result<()> {
        let (kind, name, pos) = extension_header(extension);
        match self.kinds.get(name) {
            None => {
                return Err(invalid(
                    pos,
                    format!("cannot extend type {} because it is not defined", name),
                ))
            }
            Some(&declared) if declared != kind => {
                return Err(invalid(
                    pos,
                    format!(
                        "cannot extend {} as {}: it is declared as {}",
                        name,
                        kind.as_str(),
                        declared.as_str()
                    ),
                ))
            }
            Some(_) => {}
        }

        match extension {
            TypeExtension::Object(t) => {
                self.check_implements(t.position, t.name, &t.implements_interfaces)?;
                self.check_fields(t.name, &t.fields)
            }
            TypeExtension::Interface(t) => {
                self.check_implements(t.position, t.name, &t.implements_interfaces)?;
                self.check_fields(t.name, &t.fields)
            }
            TypeExtension::Union(t) => self.check_members(t.position, t.name, &t.types),
            TypeExtension::InputObject(t) => self.check_inputs(t.name, &t.fields),
            TypeExtension::Scalar(_) | TypeExtension::Enum(_) => Ok(()),
        }
    }

    fn check_implements(&self, pos: Pos, owner: &str, interfaces: &[&'a str]) -> Result<()> {
        for interface in interfaces {
            let kind = self.lookup(pos, interface, || format!("implemented by {}", owner))?;
            if kind != Kind::Interface {
                return Err(invalid(
                    pos,
                    format!("{} implements {}, which is not an interface", owner, interface),
                ));
            }
        }
        Ok(())
    }

    fn check_members(&self, pos: Pos, owner: &str, members: &[&'a str]) -> Result<()> {
        for member in members {
            let kind = self.lookup(pos, member, || format!("in union {}", owner))?;
            if kind != Kind::Object {
                return Err(invalid(
                    pos,
                    format!("union {} member {} is not an object type", owner, member),
                ));
            }
        }
        Ok(())
    }

    fn check_fields(&self, owner: &str, fields: &[Field<'a, &'a str>]) -> Result<()> {
        for field in fields {
            let base = named_type(&field.field_type);
            let kind = self.lookup(field.position, base, || {
                format!("for field {}.{}", owner, field.name)
            })?;
            if !kind.is_output() {
                return Err(invalid(
                    field.position,
                    format!(
                        "field {}.{} cannot return {} {}",
                        owner,
                        field.name,
                        kind.as_str(),
                        base
                    ),
                ));
            }
            let context = format!("{}.{}", owner, field.name);
            self.check_inputs(&context, &field.arguments)?;
        }
        Ok(())
    }

    fn check_inputs(&self, owner: &str, values: &[InputValue<'a, &'a str>]) -> Result<()> {
        for value in values {
            let base = named_type(&value.value_type);
            let kind = self.lookup(value.position, base, || {
                format!("for input {}.{}", owner, value.name)
            })?;
            if !kind.is_input() {
                return Err(invalid(
                    value.position,
                    format!(
                        "input {}.{} cannot take {} {}",
                        owner,
                        value.name,
                        kind.as_str(),
                        base
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn field_types<'a>(fields: &[Field<'a, &'a str>]) -> Vec<(&'a str, String)> {
    fields
        .iter()
        .map(|field| (field.name, render(&field.field_type)))
        .collect()
}

fn input_types<'a>(values: &[InputValue<'a, &'a str>]) -> Vec<(&'a str, String)> {
    values
        .iter()
        .map(|value| (value.name, render(&value.value_type)))
        .collect()
}

/// Index fields of object, interface and input definitions and extensions.
fn build_index(document: &Sdl<'_>) -> TypeIndex {
    let mut index = TypeIndex::new();
    for definition in &document.definitions {
        let (owner, fields) = match definition {
            Definition::TypeDefinition(TypeDefinition::Object(t)) => {
                (t.name, field_types(&t.fields))
            }
            Definition::TypeDefinition(TypeDefinition::Interface(t)) => {
                (t.name, field_types(&t.fields))
            }
            Definition::TypeDefinition(TypeDefinition::InputObject(t)) => {
                (t.name, input_types(&t.fields))
            }
            Definition::TypeExtension(TypeExtension::Object(t)) => (t.name, field_types(&t.fields)),
            Definition::TypeExtension(TypeExtension::Interface(t)) => {
                (t.name, field_types(&t.fields))
            }
            Definition::TypeExtension(TypeExtension::InputObject(t)) => {
                (t.name, input_types(&t.fields))
            }
            _ => continue,
        };
        if owner.starts_with("__") {
            continue;
        }
        index.insert_type(
            owner,
            fields
                .into_iter()
                .filter(|(name, _)| !name.starts_with("__")),
        );
    }
    index
}

/// Whitespace, commas, byte-order marks and `#` comments only
fn is_blank(source: &str) -> bool {
    source.lines().all(|line| {
        let code = line.split('#').next().unwrap_or_default();
        code.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '\u{feff}')
            .is_empty()
    })
}

/// Parse GraphQL SDL into a type index of `type -> field -> field type`.
///
/// Field types keep their SDL rendering, so `orders: [Order!]!` is indexed
/// as `"[Order!]!"`.
pub fn parse_schema(source: &str) -> Result<TypeIndex> {
    if is_blank(source) {
        return Ok(TypeIndex::new());
    }
    let document = schema::parse_schema::<&str>(source)?;
    Declarations::collect(&document)?.check(&document)?;
    Ok(build_index(&document))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        # Storefront schema
        schema { query: Query }

        scalar DateTime
        enum Status { OPEN, CLOSED }
        union SearchResult = | Customer | Order

        directive @sensitive(reason: String = "pii") repeatable on FIELD_DEFINITION | OBJECT

        """
        A paying customer.
        Contains "quoted" text.
        """
        type Customer implements Node & Entity @key(fields: "id") {
          id: ID!
          "Social security number"
          ssn: String @sensitive
          orders(first: Int = 10, filter: OrderFilter = {status: OPEN}): [Order!]!
        }

        interface Node { id: ID! }
        interface Entity { id: ID! }

        type Order {
          id: ID!
          customer: Customer
          total: Float
          status: Status
          placed: DateTime
        }

        input OrderFilter { status: Status = OPEN, tags: [String] = ["a", "b"] }

        type Query {
          customer(id: ID!): Customer
          orders: [Order]
          search(term: String): [SearchResult]
        }

        extend type Query { me: Customer }

        type Marker
    "#;

    fn invalid_message(source: &str) -> String {
        match parse_schema(source).unwrap_err() {
            RedactionError::SchemaInvalid { message, .. } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_fields_and_types() {
        let index = parse_schema(SCHEMA).unwrap();
        let customer = index.fields("Customer").unwrap();
        assert_eq!(customer.get("id").map(String::as_str), Some("ID!"));
        assert_eq!(customer.get("ssn").map(String::as_str), Some("String"));
        assert_eq!(customer.get("orders").map(String::as_str), Some("[Order!]!"));

        let filter = index.fields("OrderFilter").unwrap();
        assert_eq!(filter.get("tags").map(String::as_str), Some("[String]"));
    }

    #[test]
    fn test_extensions_merge() {
        let index = parse_schema(SCHEMA).unwrap();
        let query = index.fields("Query").unwrap();
        assert_eq!(query.len(), 4);
        assert_eq!(query.get("me").map(String::as_str), Some("Customer"));
    }

    #[test]
    fn test_fieldless_definitions_excluded() {
        let index = parse_schema(SCHEMA).unwrap();
        for name in ["Marker", "DateTime", "Status", "SearchResult"] {
            assert!(index.fields(name).is_none(), "{name} should not be indexed");
        }
    }

    #[test]
    fn test_candidates_from_schema() {
        let index = parse_schema(SCHEMA).unwrap();
        assert_eq!(index.candidate_keys("Customer"), vec!["customer", "me"]);
    }

    #[test]
    fn test_undefined_type() {
        let err = parse_schema("type A {\n  b: Missing\n}").unwrap_err();
        match err {
            RedactionError::SchemaInvalid {
                line,
                column,
                message,
            } => {
                assert_eq!((line, column), (2, 3));
                assert!(message.contains("Missing"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_redeclared_type() {
        assert!(invalid_message("type A { x: Int }\ntype A { y: Int }").contains("redeclare"));
    }

    #[test]
    fn test_unknown_interface() {
        let message = invalid_message("type A implements Missing { x: Int }");
        assert!(message.contains("Missing"), "{message}");

        let message = invalid_message("type B { x: Int }\ntype A implements B { x: Int }");
        assert!(message.contains("not an interface"), "{message}");
    }

    #[test]
    fn test_union_members_must_be_objects() {
        let message = invalid_message("union U = Nope | Nada\ntype Q { u: U }");
        assert!(message.contains("Nope"), "{message}");

        let message = invalid_message("scalar S\nunion U = S\ntype Q { u: U }");
        assert!(message.contains("not an object type"), "{message}");
    }

    #[test]
    fn test_extension_target_must_exist() {
        let message = invalid_message("extend type Ghost { x: Int }");
        assert!(message.contains("Ghost"), "{message}");

        let message = invalid_message("input Ghost { x: Int }\nextend type Ghost { y: Int }");
        assert!(message.contains("declared as input"), "{message}");
    }

    #[test]
    fn test_input_and_output_kinds() {
        let message = invalid_message("input F { x: Int }\ntype Q { f: F }");
        assert!(message.contains("cannot return input F"), "{message}");

        let message = invalid_message("type O { x: Int }\ninput F { o: O }");
        assert!(message.contains("cannot take type O"), "{message}");

        let message = invalid_message("type O { x: Int }\ntype Q { f(o: O): Int }");
        assert!(message.contains("Q.f.o"), "{message}");
    }

    #[test]
    fn test_schema_root_must_be_object() {
        assert!(parse_schema("schema { query: Missing }").is_err());
        assert!(parse_schema("input I { x: Int }\nschema { query: I }").is_err());
    }

    #[test]
    fn test_syntax_errors() {
        for source in [
            "type A { x Int }",
            "type A { x: Int",
            "type A { x: \"oops }",
            "type A { x: Int } %",
            "query { a }",
        ] {
            assert!(
                matches!(parse_schema(source), Err(RedactionError::SchemaSyntax(_))),
                "{source}"
            );
        }
    }

    #[test]
    fn test_introspection_names_skipped() {
        let index =
            parse_schema("type __Hidden { a: Int }\ntype Shown { __typename: String, b: Int }")
                .unwrap();
        assert!(index.fields("__Hidden").is_none());
        assert_eq!(index.fields("Shown").map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_empty_schema() {
        assert!(parse_schema("  # nothing\n").unwrap().is_empty());
        assert!(parse_schema("").unwrap().is_empty());
    }
}
