//! The validation pipe.
//!
//! Turns untyped input into a typed, constraint-checked payload or an
//! [`RpcException`] listing every offending property.

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::validation::error::{FieldError, RpcException};
use crate::validation::introspect::declared_fields;

/// Knobs of the validation stage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationOptions {
    /// Only declared properties reach the payload.
    pub whitelist: bool,

    /// Undeclared properties fail the input instead of being stripped.
    /// Only meaningful together with `whitelist`.
    pub forbid_non_whitelisted: bool,

    /// Copy the rejected value into each [`FieldError`].
    pub expose_value: bool,
}

impl ValidationOptions {
    /// The policy every launched instance uses.
    pub const fn strict() -> Self {
        Self {
            whitelist: true,
            forbid_non_whitelisted: true,
            expose_value: false,
        }
    }
}

/// Validation stage shared by every transport of an instance.
#[derive(Debug, Clone, Default)]
pub struct ValidationPipe {
    options: ValidationOptions,
}

impl ValidationPipe {
    pub fn new(options: ValidationOptions) -> Self {
        Self { options }
    }

    pub fn strict() -> Self {
        Self::new(ValidationOptions::strict())
    }

    /// Transform a JSON value into `T`.
    pub fn transform<T>(&self, value: Value) -> Result<T, RpcException>
    where
        T: DeserializeOwned + Validate,
    {
        let mut value = value;
        let mut errors = Vec::new();

        if let Value::Object(map) = &mut value {
            let unknown = self.check_properties::<T>(map.keys().map(String::as_str), &mut errors);
            for key in unknown {
                map.remove(&key);
            }
        }

        // Undeclared keys below the top level are only visible while decoding.
        let mut ignored = Vec::new();
        let decoded = decode::<T>(value, |path| ignored.push(dotted(&path)));
        if self.options.whitelist && self.options.forbid_non_whitelisted {
            errors.extend(ignored.into_iter().map(not_whitelisted));
        }

        match decoded {
            Ok(payload) => self.finish(payload, errors),
            Err(e) => {
                errors.push(describe_decode_error(&e));
                Err(RpcException::validation(errors))
            }
        }
    }

    /// Whitelist check over raw property names.
    ///
    /// Pushes an error for each undeclared property when forbidding, and
    /// returns the undeclared names so the caller can strip them.
    pub fn check_properties<'k, T>(
        &self,
        keys: impl Iterator<Item = &'k str>,
        errors: &mut Vec<FieldError>,
    ) -> Vec<String>
    where
        T: DeserializeOwned,
    {
        if !self.options.whitelist {
            return Vec::new();
        }
        // No fixed field list (maps, flattened structs): nothing to check against.
        let Some(declared) = declared_fields::<T>() else {
            return Vec::new();
        };

        let unknown: Vec<String> = keys
            .filter(|key| !declared.iter().any(|d| d == key))
            .map(str::to_string)
            .collect();

        if self.options.forbid_non_whitelisted {
            errors.extend(unknown.iter().cloned().map(not_whitelisted));
        }
        unknown
    }

    /// Run the declared constraints and fold in earlier errors.
    pub fn finish<T: Validate>(&self, payload: T, mut errors: Vec<FieldError>) -> Result<T, RpcException> {
        if let Err(failures) = payload.validate() {
            errors.extend(collect(&failures, self.options.expose_value));
        }
        if errors.is_empty() {
            Ok(payload)
        } else {
            Err(RpcException::validation(errors))
        }
    }
}

/// Decode with path tracking, reporting every key the target type skipped.
fn decode<T>(
    value: Value,
    mut on_ignored: impl FnMut(serde_ignored::Path<'_>),
) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
    T: DeserializeOwned,
{
    let mut track = serde_path_to_error::Track::new();
    let tracked = serde_path_to_error::Deserializer::new(value, &mut track);
    let result: Result<T, serde_json::Error> = serde_ignored::deserialize(tracked, |path| on_ignored(path));
    match result {
        Ok(payload) => Ok(payload),
        Err(e) => Err(serde_path_to_error::Error::new(track.path(), e)),
    }
}

/// `profile.links.0.rel`
fn dotted(path: &serde_ignored::Path<'_>) -> String {
    use serde_ignored::Path;

    let mut segments = Vec::new();
    let mut current = path;
    loop {
        match current {
            Path::Root => break,
            Path::Seq { parent, index } => {
                segments.push(index.to_string());
                current = *parent;
            }
            Path::Map { parent, key } => {
                segments.push(key.to_string());
                current = *parent;
            }
            Path::Some { parent } | Path::NewtypeStruct { parent } | Path::NewtypeVariant { parent } => {
                current = *parent;
            }
        }
    }
    segments.reverse();
    segments.join(".")
}

fn not_whitelisted(property: String) -> FieldError {
    let message = format!("property {} should not exist", property);
    FieldError::constraint(property, "whitelistValidation", message)
}

/// Map a decode failure to a field error without echoing the input.
fn describe_decode_error(error: &serde_path_to_error::Error<serde_json::Error>) -> FieldError {
    let path = error.path().to_string();
    let parent = if path == "." { String::new() } else { path };
    let message = error.inner().to_string();

    if let Some(field) = backticked(&message, "missing field `") {
        let property = join_path(&parent, field);
        return FieldError::constraint(
            property.clone(),
            "isDefined",
            format!("{} should not be null or undefined", property),
        );
    }
    if let Some(field) = backticked(&message, "unknown field `") {
        return not_whitelisted(join_path(&parent, field));
    }

    let property = if parent.is_empty() { "$".to_string() } else { parent };
    let message = if message.starts_with("invalid type") {
        format!("{} has an invalid type", property)
    } else {
        format!("{} has an invalid value", property)
    };
    FieldError::constraint(property, "isValid", message)
}

fn backticked<'m>(message: &'m str, prefix: &str) -> Option<&'m str> {
    let rest = message.strip_prefix(prefix)?;
    rest.split('`').next()
}

fn join_path(parent: &str, field: &str) -> String {
    if parent.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", parent, field)
    }
}

fn collect(failures: &ValidationErrors, expose_value: bool) -> Vec<FieldError> {
    let mut out = Vec::new();

    for (field, kind) in failures.errors() {
        let mut item = FieldError::new(field.to_string());
        match kind {
            ValidationErrorsKind::Field(list) => {
                for error in list {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} failed the `{}` constraint", field, error.code));
                    item.constraints.insert(error.code.to_string(), message);
                    if expose_value && item.value.is_none() {
                        item.value = error.params.get("value").cloned();
                    }
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                item.children = collect(nested, expose_value);
            }
            ValidationErrorsKind::List(entries) => {
                for (index, nested) in entries {
                    let mut child = FieldError::new(index.to_string());
                    child.children = collect(nested, expose_value);
                    item.children.push(child);
                }
            }
        }
        out.push(item);
    }

    out.sort_by(|a, b| a.property.cmp(&b.property));
    out
}
