//! Typed result record for invoked actions.

use std::fmt;
use std::ops::Index;

/// Ordered record of an action's output arguments.
///
/// Fields appear in the action's declared output order, and each value is
/// addressable three equivalent ways:
///
/// ```
/// # use upnp_client::InvocationResult;
/// # let result = InvocationResult::new(vec![
/// #     ("NewExternalIPAddress".to_string(), "203.0.113.7".to_string()),
/// # ]);
/// let by_position = &result[0];
/// let by_key = &result["NewExternalIPAddress"];
/// let by_name = result.value("NewExternalIPAddress").unwrap();
/// assert_eq!(by_position, by_key);
/// assert_eq!(by_key, by_name);
/// ```
///
/// Outputs the device omitted from its response hold the empty string;
/// absence is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationResult {
    fields: Vec<(String, String)>,
}

impl InvocationResult {
    /// Build a result from `(name, value)` pairs in declared output order.
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Number of declared outputs.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Value at `index`, in declared output order.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(_, value)| value.as_str())
    }

    /// Value of the output named `name`.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// Name of the output at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(|(name, _)| name.as_str())
    }

    /// `(name, value)` pairs in declared output order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl Index<usize> for InvocationResult {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.fields[index].1
    }
}

impl Index<&str> for InvocationResult {
    type Output = str;

    fn index(&self, name: &str) -> &str {
        self.value(name)
            .unwrap_or_else(|| panic!("no output argument named {:?}", name))
    }
}

impl fmt::Display for InvocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
            first = false;
        }
        Ok(())
    }
}
