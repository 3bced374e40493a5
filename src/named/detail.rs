//! Named Operation Detail
//!
//! The persisted value: a named operation chain plus who may use it.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::access::{AccessControlled, AccessEvaluator, AccessKind, AccessPredicate, Identity};
use crate::error::{RegistryError, Result};

// == Parameter Detail ==
/// Describes a parameter the operation chain accepts when invoked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Type name the execution engine should coerce the value to
    pub value_type: String,
    #[serde(default)]
    pub required: bool,
}

impl ParameterDetail {
    pub fn new(value_type: impl Into<String>) -> Self {
        Self {
            value_type: value_type.into(),
            ..Self::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }
}

// == Named Operation Detail ==
/// An immutable named operation definition.
///
/// Changes are made by adding a whole new detail under the same name with
/// overwrite enabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedOperationDetail {
    operation_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    creator_id: String,
    operation_chain: Value,
    #[serde(default)]
    readers: BTreeSet<String>,
    #[serde(default)]
    writers: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    read_access_predicate: Option<AccessPredicate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    write_access_predicate: Option<AccessPredicate>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    parameters: BTreeMap<String, ParameterDetail>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    labels: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<i32>,
}

impl NamedOperationDetail {
    pub fn builder() -> NamedOperationDetailBuilder {
        NamedOperationDetailBuilder::default()
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn creator_id(&self) -> &str {
        &self.creator_id
    }

    pub fn operation_chain(&self) -> &Value {
        &self.operation_chain
    }

    pub fn readers(&self) -> &BTreeSet<String> {
        &self.readers
    }

    pub fn writers(&self) -> &BTreeSet<String> {
        &self.writers
    }

    pub fn read_access_predicate(&self) -> Option<&AccessPredicate> {
        self.read_access_predicate.as_ref()
    }

    pub fn write_access_predicate(&self) -> Option<&AccessPredicate> {
        self.write_access_predicate.as_ref()
    }

    pub fn parameters(&self) -> &BTreeMap<String, ParameterDetail> {
        &self.parameters
    }

    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn score(&self) -> Option<i32> {
        self.score
    }

    /// Checks the construction invariants.
    ///
    /// Details decoded from JSON bypass the builder, so the registry calls
    /// this again before storing one.
    pub fn validate(&self) -> Result<()> {
        if self.operation_name.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "Operation name cannot be empty".to_string(),
            ));
        }
        if self.creator_id.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(format!(
                "Creator id cannot be empty for named operation: {}",
                self.operation_name
            )));
        }
        for (name, param) in &self.parameters {
            if name.trim().is_empty() {
                return Err(RegistryError::InvalidArgument(format!(
                    "Parameter names cannot be empty in named operation: {}",
                    self.operation_name
                )));
            }
            if param.required && param.default_value.is_some() {
                return Err(RegistryError::InvalidArgument(format!(
                    "Parameter '{}' is required and cannot have a default value",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn has_read_access(
        &self,
        identity: &Identity,
        evaluator: &AccessEvaluator,
        admin_auth: &str,
    ) -> bool {
        evaluator.is_authorised(identity, self, AccessKind::Read, admin_auth)
    }

    pub fn has_write_access(
        &self,
        identity: &Identity,
        evaluator: &AccessEvaluator,
        admin_auth: &str,
    ) -> bool {
        evaluator.is_authorised(identity, self, AccessKind::Write, admin_auth)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            RegistryError::InvalidArgument(format!(
                "Unable to serialise named operation {}: {}",
                self.operation_name, e
            ))
        })
    }

    /// Decodes and validates a stored detail.
    pub fn from_json(json: &str) -> Result<Self> {
        let detail: Self = serde_json::from_str(json).map_err(|e| {
            RegistryError::InvalidArgument(format!("Malformed named operation: {}", e))
        })?;
        detail.validate()?;
        Ok(detail)
    }
}

impl AccessControlled for NamedOperationDetail {
    fn creator_id(&self) -> &str {
        &self.creator_id
    }

    fn auths_for(&self, kind: AccessKind) -> &BTreeSet<String> {
        match kind {
            AccessKind::Read => &self.readers,
            AccessKind::Write => &self.writers,
        }
    }

    fn predicate_for(&self, kind: AccessKind) -> Option<&AccessPredicate> {
        match kind {
            AccessKind::Read => self.read_access_predicate.as_ref(),
            AccessKind::Write => self.write_access_predicate.as_ref(),
        }
    }
}

// == Builder ==
#[derive(Debug, Clone, Default)]
pub struct NamedOperationDetailBuilder {
    operation_name: Option<String>,
    description: Option<String>,
    creator_id: Option<String>,
    operation_chain: Option<Value>,
    readers: BTreeSet<String>,
    writers: BTreeSet<String>,
    read_access_predicate: Option<AccessPredicate>,
    write_access_predicate: Option<AccessPredicate>,
    parameters: BTreeMap<String, ParameterDetail>,
    labels: BTreeSet<String>,
    score: Option<i32>,
}

impl NamedOperationDetailBuilder {
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn creator_id(mut self, creator_id: impl Into<String>) -> Self {
        self.creator_id = Some(creator_id.into());
        self
    }

    pub fn operation_chain(mut self, chain: Value) -> Self {
        self.operation_chain = Some(chain);
        self
    }

    pub fn readers<I, S>(mut self, readers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.readers = readers.into_iter().map(Into::into).collect();
        self
    }

    pub fn writers<I, S>(mut self, writers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.writers = writers.into_iter().map(Into::into).collect();
        self
    }

    pub fn read_access_predicate(mut self, predicate: AccessPredicate) -> Self {
        self.read_access_predicate = Some(predicate);
        self
    }

    pub fn write_access_predicate(mut self, predicate: AccessPredicate) -> Self {
        self.write_access_predicate = Some(predicate);
        self
    }

    pub fn parameter(mut self, name: impl Into<String>, detail: ParameterDetail) -> Self {
        self.parameters.insert(name.into(), detail);
        self
    }

    pub fn labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn score(mut self, score: i32) -> Self {
        self.score = Some(score);
        self
    }

    /// Builds the detail, failing if a required field is missing.
    pub fn build(self) -> Result<NamedOperationDetail> {
        let operation_name = self.operation_name.ok_or_else(|| {
            RegistryError::InvalidArgument("Operation name is required".to_string())
        })?;
        let creator_id = self.creator_id.ok_or_else(|| {
            RegistryError::InvalidArgument(format!(
                "Creator id is required for named operation: {}",
                operation_name
            ))
        })?;
        let operation_chain = self.operation_chain.ok_or_else(|| {
            RegistryError::InvalidArgument(format!(
                "Operation chain is required for named operation: {}",
                operation_name
            ))
        })?;

        let detail = NamedOperationDetail {
            operation_name,
            description: self.description,
            creator_id,
            operation_chain,
            readers: self.readers,
            writers: self.writers,
            read_access_predicate: self.read_access_predicate,
            write_access_predicate: self.write_access_predicate,
            parameters: self.parameters,
            labels: self.labels,
            score: self.score,
        };
        detail.validate()?;
        Ok(detail)
    }
}
