//! Payload schema validation
//!
//! The platform publishes a JSON Schema for every request it accepts. The
//! schemas ship with this crate (`schemas/<method>.json`) and are compiled
//! once; every payload is checked against its schema before it is sent.
//!
//! ```rust,ignore
//! let schemas = SchemaRegistry::new()?;
//! schemas.validate(payload::CREATE_PERSON, &params)?;
//! ```

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::SyncError;
use crate::payload;

const SCHEMA_SOURCES: &[(&str, &str)] = &[
    (payload::CREATE_PERSON, include_str!("../schemas/partner.createPerson.json")),
    (
        payload::CREATE_CONTACT_DETAILS,
        include_str!("../schemas/partner.createKommunikationsverbindung.json"),
    ),
    (payload::CREATE_DOCUMENT, include_str!("../schemas/dokument.create.json")),
    (payload::CREATE_CONTRACT, include_str!("../schemas/vertrag.create.json")),
    (
        payload::START_TRANSFER,
        include_str!("../schemas/vertrag.startBestandsuebertragung.json"),
    ),
    (payload::PULL_EVENT, include_str!("../schemas/ereignis.getNext.json")),
];

/// Compiled request schemas keyed by RPC method
pub struct SchemaRegistry {
    validators: HashMap<&'static str, jsonschema::Validator>,
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.validators.keys().collect();
        methods.sort();
        f.debug_struct("SchemaRegistry").field("methods", &methods).finish()
    }
}

impl SchemaRegistry {
    /// Compiles the bundled schemas
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Schema` if a bundled schema is not valid JSON
    /// Schema.
    pub fn new() -> Result<Self, SyncError> {
        let mut validators = HashMap::with_capacity(SCHEMA_SOURCES.len());
        for (method, source) in SCHEMA_SOURCES {
            let schema: Value = serde_json::from_str(source).map_err(|e| SyncError::Schema {
                method: method.to_string(),
                violations: vec![format!("schema is not valid JSON: {}", e)],
            })?;
            let validator = jsonschema::validator_for(&schema).map_err(|e| SyncError::Schema {
                method: method.to_string(),
                violations: vec![format!("schema does not compile: {}", e)],
            })?;
            validators.insert(*method, validator);
        }
        Ok(Self { validators })
    }

    /// Whether a schema is registered for `method`
    pub fn covers(&self, method: &str) -> bool {
        self.validators.contains_key(method)
    }

    /// Validates `params` against the schema for `method`
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Schema` listing every violation, or when no schema
    /// is known for the method.
    pub fn validate(&self, method: &str, params: &Value) -> Result<(), SyncError> {
        let validator = self.validators.get(method).ok_or_else(|| SyncError::Schema {
            method: method.to_string(),
            violations: vec!["no schema registered".to_string()],
        })?;

        let violations: Vec<String> = validator
            .iter_errors(params)
            .map(|error| error.to_string())
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SyncError::Schema {
                method: method.to_string(),
                violations,
            })
        }
    }
}
