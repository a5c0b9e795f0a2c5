//! Ordered argument storage with 1-based placeholder numbering.

use crate::value::Value;

/// Arguments collected while rendering a statement.
///
/// Every `push` hands back the placeholder index for the value just added, so SQL text and
/// argument order are produced by the same call and cannot drift apart.
#[derive(Clone, Debug, Default)]
pub(crate) struct ParamList {
    params: Vec<Value>,
}

impl ParamList {
    /// Create a new empty parameter list.
    pub(crate) fn new() -> Self {
        Self { params: Vec::new() }
    }

    /// Add a parameter and return its 1-based index.
    pub(crate) fn push(&mut self, value: Value) -> usize {
        self.params.push(value);
        self.params.len()
    }

    /// Add a parameter and return its rendered placeholder (`$n`).
    pub(crate) fn placeholder(&mut self, value: Value) -> String {
        format!("${}", self.push(value))
    }

    pub(crate) fn len(&self) -> usize {
        self.params.len()
    }

    pub(crate) fn into_values(self) -> Vec<Value> {
        self.params
    }
}
