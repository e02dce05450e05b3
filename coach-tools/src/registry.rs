//! Immutable registry of tool declarations and their argument schemas.

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value, json};
use thiserror::Error;

use coach_adapters::traits::ToolDefinition;

/// Result alias for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Primitive JSON types accepted for tool parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// JSON string.
    String,
    /// Any JSON number.
    Number,
    /// JSON boolean.
    Boolean,
}

impl ParamType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }
}

/// Declaration of one parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParamSpec {
    name: String,
    kind: ParamType,
    description: String,
    allowed: Vec<String>,
    required: bool,
}

impl ParamSpec {
    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the parameter must be supplied.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// JSON-schema description of a tool's argument object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolSchema {
    params: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Starts an empty object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::default()
    }

    fn param(
        mut self,
        name: &str,
        kind: ParamType,
        description: &str,
        allowed: &[&str],
        required: bool,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.to_owned(),
            kind,
            description: description.to_owned(),
            allowed: allowed.iter().map(|value| (*value).to_owned()).collect(),
            required,
        });
        self
    }

    /// Adds a required string parameter.
    #[must_use]
    pub fn required_string(self, name: &str, description: &str) -> Self {
        self.param(name, ParamType::String, description, &[], true)
    }

    /// Adds an optional string parameter.
    #[must_use]
    pub fn optional_string(self, name: &str, description: &str) -> Self {
        self.param(name, ParamType::String, description, &[], false)
    }

    /// Adds a required number parameter.
    #[must_use]
    pub fn required_number(self, name: &str, description: &str) -> Self {
        self.param(name, ParamType::Number, description, &[], true)
    }

    /// Adds an optional number parameter.
    #[must_use]
    pub fn optional_number(self, name: &str, description: &str) -> Self {
        self.param(name, ParamType::Number, description, &[], false)
    }

    /// Adds a required string parameter restricted to `allowed` values.
    #[must_use]
    pub fn required_enum(self, name: &str, allowed: &[&str], description: &str) -> Self {
        self.param(name, ParamType::String, description, allowed, true)
    }

    /// Returns the declared parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Renders the schema as a JSON-schema object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = json!({
                "type": param.kind.as_str(),
                "description": param.description,
            });
            if !param.allowed.is_empty() {
                property["enum"] = json!(param.allowed);
            }
            properties.insert(param.name.clone(), property);
        }
        let required = self
            .params
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name.as_str())
            .collect::<Vec<_>>();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Checks object shape, required presence, primitive types and enum
    /// membership. Unknown keys are tolerated.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason for the first violation found.
    pub fn validate(&self, arguments: &Value) -> Result<(), String> {
        let Some(object) = arguments.as_object() else {
            return Err("arguments must be a JSON object".to_owned());
        };

        for param in &self.params {
            match object.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(format!("missing required field `{}`", param.name));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.kind.matches(value) => {
                    return Err(format!(
                        "field `{}` must be a {}",
                        param.name,
                        param.kind.as_str()
                    ));
                }
                Some(value) => {
                    if let Some(text) = value.as_str() {
                        if !param.allowed.is_empty()
                            && !param.allowed.iter().any(|allowed| allowed == text)
                        {
                            return Err(format!(
                                "field `{}` must be one of {}, got `{text}`",
                                param.name,
                                param.allowed.join(", ")
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Metadata describing a registered tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolMetadata {
    name: String,
    description: String,
    schema: ToolSchema,
}

impl ToolMetadata {
    /// Creates metadata for the supplied tool name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the name is empty.
    pub fn new(name: impl Into<String>) -> ToolResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ToolError::InvalidMetadata {
                reason: "tool name cannot be empty".into(),
            });
        }

        Ok(Self {
            name,
            description: String::new(),
            schema: ToolSchema::object(),
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the argument schema.
    #[must_use]
    pub fn with_schema(mut self, schema: ToolSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the argument schema.
    #[must_use]
    pub fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    /// Converts the metadata into the declaration sent to the model.
    #[must_use]
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.schema.to_json(),
        }
    }
}

/// Builder collecting tool declarations before freezing them.
#[derive(Debug, Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<ToolMetadata>,
}

impl ToolRegistryBuilder {
    /// Adds a tool declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    pub fn register(mut self, metadata: ToolMetadata) -> ToolResult<Self> {
        if self.tools.iter().any(|tool| tool.name() == metadata.name()) {
            return Err(ToolError::DuplicateTool {
                name: metadata.name().to_owned(),
            });
        }
        self.tools.push(metadata);
        Ok(self)
    }

    /// Freezes the declarations into an immutable registry.
    #[must_use]
    pub fn build(self) -> ToolRegistry {
        let index = self
            .tools
            .iter()
            .enumerate()
            .map(|(position, tool)| (tool.name().to_owned(), position))
            .collect();
        ToolRegistry {
            tools: self.tools,
            index,
        }
    }
}

/// Immutable catalog of tools, shared by reference once built.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolMetadata>,
    index: HashMap<String, usize>,
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.tools.iter().map(ToolMetadata::name).collect();
        f.debug_struct("ToolRegistry")
            .field("registered", &names)
            .finish()
    }
}

impl ToolRegistry {
    /// Starts a registry builder.
    #[must_use]
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Returns the metadata of the named tool.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ToolMetadata> {
        self.index.get(name).map(|position| &self.tools[*position])
    }

    /// Lists every tool in registration order.
    #[must_use]
    pub fn list(&self) -> &[ToolMetadata] {
        &self.tools
    }

    /// Declarations exported verbatim to the model.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolMetadata::definition).collect()
    }

    /// Validates `arguments` against the named tool's schema.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] when the tool is not registered and
    /// [`ToolError::InvalidArguments`] when the arguments violate its schema.
    pub fn validate(&self, name: &str, arguments: &Value) -> ToolResult<()> {
        let metadata = self.get(name).ok_or_else(|| ToolError::UnknownTool {
            name: name.to_owned(),
        })?;
        metadata
            .schema()
            .validate(arguments)
            .map_err(|reason| ToolError::InvalidArguments {
                tool: name.to_owned(),
                reason,
            })
    }
}

/// Errors produced by tool registration and execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool metadata failed validation.
    #[error("invalid tool metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Requested tool does not exist.
    #[error("unrecognized tool `{name}`")]
    UnknownTool {
        /// Name of the missing tool.
        name: String,
    },

    /// Arguments violate the tool schema.
    #[error("invalid arguments for `{tool}`: {reason}")]
    InvalidArguments {
        /// Tool being invoked.
        tool: String,
        /// First violation found.
        reason: String,
    },

    /// An update was requested but the week has no plan yet.
    #[error("no current plan to update; create one with create_week_plan")]
    NoCurrentPlan,

    /// The plan store rejected the operation.
    #[error("plan store failure: {reason}")]
    Store {
        /// Error reported by the store.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &str) -> ToolMetadata {
        ToolMetadata::new(name)
            .unwrap()
            .with_description("Record a note")
            .with_schema(
                ToolSchema::object()
                    .required_enum("level", &["low", "high"], "How loud")
                    .required_string("note", "The note")
                    .optional_number("weight", "Importance"),
            )
    }

    #[test]
    fn duplicate_registration_errors() {
        let err = ToolRegistry::builder()
            .register(metadata("add_note"))
            .unwrap()
            .register(metadata("add_note"))
            .expect_err("duplicate registration should fail");

        assert!(matches!(err, ToolError::DuplicateTool { name } if name == "add_note"));
    }

    #[test]
    fn invalid_metadata_errors() {
        let err = ToolMetadata::new(" ").expect_err("empty name should error");
        assert!(matches!(err, ToolError::InvalidMetadata { .. }));
    }

    #[test]
    fn schema_renders_json_schema() {
        let schema = metadata("add_note").schema().to_json();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["level"]["enum"], json!(["low", "high"]));
        assert_eq!(schema["properties"]["weight"]["type"], "number");
        assert_eq!(schema["required"], json!(["level", "note"]));
    }

    #[test]
    fn validates_arguments() {
        let registry = ToolRegistry::builder()
            .register(metadata("add_note"))
            .unwrap()
            .build();

        assert!(registry.validate("add_note", &json!({"level": "low", "note": "x"})).is_ok());
        let extra = json!({"level": "low", "note": "x", "weight": 2.5, "extra": true});
        assert!(registry.validate("add_note", &extra).is_ok());

        for bad in [
            json!("not an object"),
            json!({"level": "low"}),
            json!({"level": "low", "note": null}),
            json!({"level": "medium", "note": "x"}),
            json!({"level": "low", "note": 3}),
            json!({"level": "low", "note": "x", "weight": "heavy"}),
        ] {
            assert!(
                matches!(
                    registry.validate("add_note", &bad),
                    Err(ToolError::InvalidArguments { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn unknown_tool_errors() {
        let registry = ToolRegistry::builder().build();
        let err = registry.validate("missing", &Value::Null).unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
        assert!(matches!(err, ToolError::UnknownTool { name } if name == "missing"));
    }
}
