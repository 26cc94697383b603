use std::{fmt::Display, str::FromStr};

use log::debug;
use regex::Regex;

use crate::error::CsvError;

use super::item::{Row, RowMapper, RowMapperResult};

/// Declarative rule attaching one record field to one CSV column.
///
/// # Examples
///
/// ```
/// use smart_csv_rs::core::mapping::FieldBinding;
///
/// let binding = FieldBinding::new("email")
///     .validation(r"[^@]+@[^@]+")
///     .required(true);
///
/// assert_eq!(binding.column(), "email");
/// assert!(binding.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    /// Name of the source column
    column: String,
    /// Pattern the whole value must match, empty for no check
    validation: String,
    /// Whether a missing or empty value is an error
    required: bool,
}

impl FieldBinding {
    pub fn new<S: Into<String>>(column: S) -> Self {
        Self {
            column: column.into(),
            validation: String::new(),
            required: false,
        }
    }

    pub fn validation<S: Into<String>>(mut self, pattern: S) -> Self {
        self.validation = pattern.into();
        self
    }

    pub fn required(mut self, yes: bool) -> Self {
        self.required = yes;
        self
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn pattern(&self) -> &str {
        &self.validation
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Semantic type a column value is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Float,
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Text => write!(f, "text"),
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Float => write!(f, "float"),
        }
    }
}

enum Setter<T> {
    Text(fn(&mut T, String)),
    Integer(fn(&mut T, i64)),
    Float(fn(&mut T, f64)),
}

impl<T> Setter<T> {
    fn kind(&self) -> FieldKind {
        match self {
            Setter::Text(_) => FieldKind::Text,
            Setter::Integer(_) => FieldKind::Integer,
            Setter::Float(_) => FieldKind::Float,
        }
    }
}

struct BoundField<T> {
    field: &'static str,
    binding: FieldBinding,
    pattern: Option<Regex>,
    setter: Setter<T>,
}

impl<T> BoundField<T> {
    fn apply(&self, record: &mut T, row: &Row) -> Result<(), CsvError> {
        let column = self.binding.column();
        let value = row.get(column).map(String::as_str);

        if self.binding.is_required() && value.is_none_or(str::is_empty) {
            return Err(CsvError::RecordMapping(format!(
                "Field '{}' is required",
                column
            )));
        }

        if let Some(pattern) = &self.pattern {
            // A missing value never matches a pattern
            if !value.is_some_and(|value| pattern.is_match(value)) {
                return Err(CsvError::RecordMapping(format!(
                    "Field '{}' does not match validation pattern",
                    column
                )));
            }
        }

        match &self.setter {
            Setter::Text(set) => {
                if let Some(value) = value {
                    set(record, value.to_owned());
                }
            }
            Setter::Integer(set) => set(record, convert(column, FieldKind::Integer, value)?),
            Setter::Float(set) => set(record, convert(column, FieldKind::Float, value)?),
        }

        Ok(())
    }
}

fn convert<N>(column: &str, kind: FieldKind, value: Option<&str>) -> Result<N, CsvError>
where
    N: FromStr,
    N::Err: Display,
{
    let value = value.ok_or_else(|| {
        CsvError::RecordMapping(format!(
            "Field '{}' could not be converted to {}: value is missing",
            column, kind
        ))
    })?;

    value.parse::<N>().map_err(|error| {
        CsvError::RecordMapping(format!(
            "Field '{}' could not be converted to {} from \"{}\": {}",
            column, kind, value, error
        ))
    })
}

/// Binding table of a record type: every bound field, in declaration order.
///
/// Built once per target type with [`RecordBindingsBuilder`], then shared by
/// every worker of a run.
///
/// # Examples
///
/// ```
/// use smart_csv_rs::core::item::{Row, RowMapper};
/// use smart_csv_rs::core::mapping::{FieldBinding, RecordBindings};
///
/// #[derive(Default, Debug)]
/// struct Person {
///     name: String,
///     age: i64,
/// }
///
/// let bindings = RecordBindings::<Person>::builder()
///     .text("name", FieldBinding::new("name").required(true), |p, v| p.name = v)
///     .integer("age", FieldBinding::new("age"), |p, v| p.age = v)
///     .build()
///     .unwrap();
///
/// let row: Row = [("name", "Alice"), ("age", "30")]
///     .into_iter()
///     .map(|(k, v)| (k.to_string(), v.to_string()))
///     .collect();
///
/// let person = bindings.map_row(&row).unwrap();
/// assert_eq!(person.name, "Alice");
/// assert_eq!(person.age, 30);
/// ```
pub struct RecordBindings<T> {
    fields: Vec<BoundField<T>>,
}

impl<T> RecordBindings<T> {
    pub fn builder() -> RecordBindingsBuilder<T> {
        RecordBindingsBuilder::new()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bound columns with their target field and kind, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = (&'static str, &FieldBinding, FieldKind)> {
        self.fields
            .iter()
            .map(|field| (field.field, &field.binding, field.setter.kind()))
    }
}

impl<T: Default> RowMapper<T> for RecordBindings<T> {
    /// Maps a row onto a fresh `T`, failing on the first violated binding.
    ///
    /// # Evaluation Order
    ///
    /// For each field, in declaration order:
    /// 1. Required check on the raw value (absent or empty fails)
    /// 2. Full-match pattern check when a pattern is set
    /// 3. Conversion to the field kind
    /// 4. Assignment through the field setter
    fn map_row(&self, row: &Row) -> RowMapperResult<T> {
        let mut record = T::default();

        for field in &self.fields {
            field.apply(&mut record, row).inspect_err(|_| {
                debug!("Mapping of field {} failed", field.field);
            })?;
        }

        Ok(record)
    }
}

/// Builder for a [`RecordBindings`] table.
///
/// Fields are evaluated in the order they are registered. Each registration
/// picks the conversion through the setter it is given.
pub struct RecordBindingsBuilder<T> {
    fields: Vec<(&'static str, FieldBinding, Setter<T>)>,
}

impl<T> Default for RecordBindingsBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RecordBindingsBuilder<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Binds a field receiving the raw value unchanged.
    pub fn text(
        mut self,
        field: &'static str,
        binding: FieldBinding,
        setter: fn(&mut T, String),
    ) -> Self {
        self.fields.push((field, binding, Setter::Text(setter)));
        self
    }

    /// Binds a field receiving the value parsed as a signed integer.
    ///
    /// The raw value is parsed as is: surrounding whitespace is not trimmed,
    /// so `" 42 "` fails conversion.
    pub fn integer(
        mut self,
        field: &'static str,
        binding: FieldBinding,
        setter: fn(&mut T, i64),
    ) -> Self {
        self.fields.push((field, binding, Setter::Integer(setter)));
        self
    }

    /// Binds a field receiving the value parsed as a floating-point number.
    ///
    /// Like [`RecordBindingsBuilder::integer`], no trimming is applied:
    /// `" 1.5 "` fails conversion while `"1.5"` and `"1e3"` are accepted.
    pub fn float(
        mut self,
        field: &'static str,
        binding: FieldBinding,
        setter: fn(&mut T, f64),
    ) -> Self {
        self.fields.push((field, binding, Setter::Float(setter)));
        self
    }

    /// Compiles the validation patterns and returns the binding table.
    ///
    /// # Errors
    ///
    /// Returns [`CsvError::InvalidPattern`] for the first pattern that is
    /// not a valid regular expression.
    pub fn build(self) -> Result<RecordBindings<T>, CsvError> {
        let mut fields = Vec::with_capacity(self.fields.len());

        for (field, binding, setter) in self.fields {
            let pattern = if binding.pattern().is_empty() {
                None
            } else {
                // Anchor so the whole value has to match
                let anchored = format!("^(?:{})$", binding.pattern());
                let regex = Regex::new(&anchored).map_err(|error| CsvError::InvalidPattern {
                    column: binding.column().to_owned(),
                    reason: error.to_string(),
                })?;
                Some(regex)
            };

            fields.push(BoundField {
                field,
                binding,
                pattern,
                setter,
            });
        }

        Ok(RecordBindings { fields })
    }
}

/// A record type declaring its own binding table.
///
/// # Examples
///
/// ```
/// use smart_csv_rs::core::mapping::{CsvRecord, FieldBinding, RecordBindings};
/// use smart_csv_rs::CsvError;
///
/// #[derive(Default)]
/// struct Product {
///     sku: String,
///     price: f64,
/// }
///
/// impl CsvRecord for Product {
///     fn bindings() -> Result<RecordBindings<Self>, CsvError> {
///         RecordBindings::<Self>::builder()
///             .text("sku", FieldBinding::new("sku").validation("[A-Z]{3}-[0-9]+"), |p, v| p.sku = v)
///             .float("price", FieldBinding::new("price").required(true), |p, v| p.price = v)
///             .build()
///     }
/// }
///
/// assert_eq!(Product::bindings().unwrap().len(), 2);
/// ```
pub trait CsvRecord: Default + Sized {
    fn bindings() -> Result<RecordBindings<Self>, CsvError>;
}

#[cfg(test)]
mod tests {
    use crate::{
        core::item::{Row, RowMapper},
        error::CsvError,
    };

    use super::{CsvRecord, FieldBinding, FieldKind, RecordBindings};

    #[derive(Default, Debug, PartialEq)]
    struct Person {
        name: String,
        age: i64,
        score: f64,
        email: String,
    }

    impl CsvRecord for Person {
        fn bindings() -> Result<RecordBindings<Self>, CsvError> {
            RecordBindings::<Self>::builder()
                .text("name", FieldBinding::new("name").required(true), |p, v| p.name = v)
                .integer("age", FieldBinding::new("age").required(true), |p, v| p.age = v)
                .float("score", FieldBinding::new("score"), |p, v| p.score = v)
                .text(
                    "email",
                    FieldBinding::new("mail").validation(r"[a-z]+@[a-z]+\.[a-z]+"),
                    |p, v| p.email = v,
                )
                .build()
        }
    }

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn mapping_message(result: Result<Person, CsvError>) -> String {
        match result {
            Err(CsvError::RecordMapping(message)) => message,
            Err(other) => panic!("unexpected error: {}", other),
            Ok(person) => panic!("unexpected success: {:?}", person),
        }
    }

    #[test]
    fn maps_every_kind_of_field() {
        let bindings = Person::bindings().unwrap();

        let person = bindings
            .map_row(&row(&[
                ("name", "Alice"),
                ("age", "30"),
                ("score", "12.5"),
                ("mail", "alice@example.com"),
            ]))
            .unwrap();

        assert_eq!(
            person,
            Person {
                name: "Alice".to_string(),
                age: 30,
                score: 12.5,
                email: "alice@example.com".to_string(),
            }
        );
    }

    #[test]
    fn required_field_fails_when_empty_or_absent() {
        let bindings = Person::bindings().unwrap();

        let empty = bindings.map_row(&row(&[
            ("name", ""),
            ("age", "30"),
            ("score", "1"),
            ("mail", "a@b.c"),
        ]));
        assert_eq!(mapping_message(empty), "Field 'name' is required");

        let absent = bindings.map_row(&row(&[("age", "30"), ("score", "1"), ("mail", "a@b.c")]));
        assert_eq!(mapping_message(absent), "Field 'name' is required");
    }

    #[test]
    fn required_check_wins_over_pattern() {
        let bindings = RecordBindings::<Person>::builder()
            .text(
                "name",
                FieldBinding::new("name").required(true).validation(".*"),
                |p, v| p.name = v,
            )
            .build()
            .unwrap();

        let result = bindings.map_row(&row(&[("name", "")]));

        assert_eq!(mapping_message(result), "Field 'name' is required");
    }

    #[test]
    fn pattern_mismatch_fails_even_when_optional() {
        let bindings = Person::bindings().unwrap();

        let result = bindings.map_row(&row(&[
            ("name", "Bob"),
            ("age", "41"),
            ("score", "3"),
            ("mail", "not-an-email"),
        ]));

        assert_eq!(
            mapping_message(result),
            "Field 'mail' does not match validation pattern"
        );
    }

    #[test]
    fn pattern_must_match_whole_value() {
        let bindings = RecordBindings::<Person>::builder()
            .text("name", FieldBinding::new("name").validation("[a-z]+"), |p, v| p.name = v)
            .build()
            .unwrap();

        assert!(bindings.map_row(&row(&[("name", "abc")])).is_ok());
        assert!(bindings.map_row(&row(&[("name", "abc1")])).is_err());
        assert!(bindings.map_row(&row(&[("name", "1abc")])).is_err());
    }

    #[test]
    fn absent_value_never_matches_a_pattern() {
        let bindings = RecordBindings::<Person>::builder()
            .text("email", FieldBinding::new("mail").validation(".*"), |p, v| p.email = v)
            .build()
            .unwrap();

        let result = bindings.map_row(&row(&[("name", "Bob")]));

        assert_eq!(
            mapping_message(result),
            "Field 'mail' does not match validation pattern"
        );
    }

    #[test]
    fn present_empty_value_is_matched_against_the_pattern() {
        let strict = RecordBindings::<Person>::builder()
            .text("email", FieldBinding::new("mail").validation("[a-z]+"), |p, v| p.email = v)
            .build()
            .unwrap();
        let lenient = RecordBindings::<Person>::builder()
            .text("email", FieldBinding::new("mail").validation("[a-z]*"), |p, v| p.email = v)
            .build()
            .unwrap();

        assert_eq!(
            mapping_message(strict.map_row(&row(&[("mail", "")]))),
            "Field 'mail' does not match validation pattern"
        );
        assert_eq!(
            lenient.map_row(&row(&[("mail", "")])).unwrap(),
            Person::default()
        );
    }

    #[test]
    fn numbers_are_not_trimmed_before_conversion() {
        let bindings = RecordBindings::<Person>::builder()
            .integer("age", FieldBinding::new("age"), |p, v| p.age = v)
            .float("score", FieldBinding::new("score"), |p, v| p.score = v)
            .build()
            .unwrap();

        assert_eq!(
            mapping_message(bindings.map_row(&row(&[("age", "7"), ("score", " 1.5 ")]))),
            "Field 'score' could not be converted to float from \" 1.5 \": invalid float literal"
        );
        assert_eq!(
            mapping_message(bindings.map_row(&row(&[("age", " 42 "), ("score", "1.5")]))),
            "Field 'age' could not be converted to integer from \" 42 \": invalid digit found in string"
        );

        let person = bindings
            .map_row(&row(&[("age", "42"), ("score", "1e3")]))
            .unwrap();
        assert_eq!(person.age, 42);
        assert_eq!(person.score, 1000.0);
    }

    #[test]
    fn malformed_integer_reports_conversion_failure() {
        let bindings = Person::bindings().unwrap();

        let result = bindings.map_row(&row(&[
            ("name", "Bob"),
            ("age", "thirty"),
            ("score", "1"),
            ("mail", "b@c.d"),
        ]));

        assert_eq!(
            mapping_message(result),
            "Field 'age' could not be converted to integer from \"thirty\": invalid digit found in string"
        );
    }

    #[test]
    fn missing_numeric_value_is_a_conversion_failure() {
        let bindings = Person::bindings().unwrap();

        let result = bindings.map_row(&row(&[("name", "Bob"), ("age", "7"), ("mail", "b@c.d")]));

        assert_eq!(
            mapping_message(result),
            "Field 'score' could not be converted to float: value is missing"
        );
    }

    #[test]
    fn absent_optional_text_keeps_default() {
        let bindings = RecordBindings::<Person>::builder()
            .text("name", FieldBinding::new("name"), |p, v| p.name = v)
            .build()
            .unwrap();

        let person = bindings.map_row(&row(&[("other", "x")])).unwrap();

        assert_eq!(person, Person::default());
    }

    #[test]
    fn first_failing_field_in_declaration_order_wins() {
        let bindings = Person::bindings().unwrap();

        let result = bindings.map_row(&row(&[("age", "x"), ("mail", "nope")]));

        assert_eq!(mapping_message(result), "Field 'name' is required");
    }

    #[test]
    fn invalid_pattern_fails_at_build_time() {
        let result = RecordBindings::<Person>::builder()
            .text("name", FieldBinding::new("name").validation("(unclosed"), |p, v| p.name = v)
            .build();

        match result {
            Err(CsvError::InvalidPattern { column, .. }) => assert_eq!(column, "name"),
            _ => panic!("expected an invalid pattern error"),
        }
    }

    #[test]
    fn columns_lists_bindings_in_declaration_order() {
        let bindings = Person::bindings().unwrap();

        let columns: Vec<(&str, &str, FieldKind)> = bindings
            .columns()
            .map(|(field, binding, kind)| (field, binding.column(), kind))
            .collect();

        assert_eq!(
            columns,
            vec![
                ("name", "name", FieldKind::Text),
                ("age", "age", FieldKind::Integer),
                ("score", "score", FieldKind::Float),
                ("email", "mail", FieldKind::Text),
            ]
        );
    }
}
