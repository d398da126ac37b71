use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, LabelSelectorRequirement};
use snafu::Snafu;

use crate::constants::PLUGIN_CONFIG_LABEL;

type Result<T, E = SelectorError> = std::result::Result<T, E>;

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum SelectorError {
    #[snafu(display("label selector with binary operator {operator:?} must have values"))]
    LabelSelectorBinaryOperatorWithoutValues { operator: String },

    #[snafu(display("label selector with unary operator {operator:?} must not have values"))]
    LabelSelectorUnaryOperatorWithValues { operator: String },

    #[snafu(display("labelSelector has an invalid operator {operator:?}"))]
    LabelSelectorInvalidOperator { operator: String },
}

/// This trait extends the functionality of [`LabelSelector`].
pub trait LabelSelectorExt {
    /// Converts the selector to a string that can be used in Kubernetes list calls. It returns an
    /// error if the selector contains illegal things (e.g. an `Exists` operator with a value).
    fn to_query_string(&self) -> Result<String>;

    /// Evaluates the selector against a set of labels, the same way the API server would.
    fn matches(&self, labels: &BTreeMap<String, String>) -> Result<bool>;
}

/// The operators a [`LabelSelectorRequirement`] can use, checked for well-formedness.
enum Requirement<'a> {
    In(&'a str, &'a [String]),
    NotIn(&'a str, &'a [String]),
    Exists(&'a str),
    DoesNotExist(&'a str),
}

impl<'a> Requirement<'a> {
    fn parse(requirement: &'a LabelSelectorRequirement) -> Result<Self> {
        let key = requirement.key.as_str();
        let values = requirement.values.as_deref().unwrap_or_default();

        match requirement.operator.as_str() {
            operator @ ("In" | "NotIn") => {
                if values.is_empty() {
                    return LabelSelectorBinaryOperatorWithoutValuesSnafu { operator }.fail();
                }

                Ok(if operator == "In" {
                    Self::In(key, values)
                } else {
                    Self::NotIn(key, values)
                })
            }
            operator @ ("Exists" | "DoesNotExist") => {
                if !values.is_empty() {
                    return LabelSelectorUnaryOperatorWithValuesSnafu { operator }.fail();
                }

                Ok(if operator == "Exists" {
                    Self::Exists(key)
                } else {
                    Self::DoesNotExist(key)
                })
            }
            operator => LabelSelectorInvalidOperatorSnafu { operator }.fail(),
        }
    }

    fn to_query_string(&self) -> String {
        match self {
            Self::In(key, values) => format!("{key} in ({})", values.join(", ")),
            Self::NotIn(key, values) => format!("{key} notin ({})", values.join(", ")),
            Self::Exists(key) => (*key).to_owned(),
            Self::DoesNotExist(key) => format!("!{key}"),
        }
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Self::In(key, values) => labels.get(*key).is_some_and(|v| values.contains(v)),
            Self::NotIn(key, values) => labels.get(*key).is_none_or(|v| !values.contains(v)),
            Self::Exists(key) => labels.contains_key(*key),
            Self::DoesNotExist(key) => !labels.contains_key(*key),
        }
    }
}

impl LabelSelectorExt for LabelSelector {
    fn to_query_string(&self) -> Result<String> {
        // match_labels are the equivalent of the "In" operator with a single value, they come
        // first and are joined on commas just like the expressions.
        let mut parts: Vec<String> = self
            .match_labels
            .iter()
            .flatten()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();

        for requirement in self.match_expressions.iter().flatten() {
            parts.push(Requirement::parse(requirement)?.to_query_string());
        }

        Ok(parts.join(","))
    }

    fn matches(&self, labels: &BTreeMap<String, String>) -> Result<bool> {
        let labels_match = self
            .match_labels
            .iter()
            .flatten()
            .all(|(key, value)| labels.get(key) == Some(value));

        let mut expressions_match = true;
        for requirement in self.match_expressions.iter().flatten() {
            // Parse every requirement even after a mismatch, so malformed selectors are always
            // reported.
            expressions_match &= Requirement::parse(requirement)?.matches(labels);
        }

        Ok(labels_match && expressions_match)
    }
}

/// Selects the Velero plugin config record of a single plugin.
///
/// The record carries the `velero.io/plugin-config` marker label and a label keyed by the
/// plugin name whose value is the plugin kind, e.g.
/// `catalogicsoftware.com/offload-restore-pod-action-plugin: RestoreItemAction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PluginConfigSelector {
    pub plugin_name: String,
    pub kind: String,
}

impl PluginConfigSelector {
    pub fn new(plugin_name: impl Into<String>, kind: impl ToString) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            kind: kind.to_string(),
        }
    }

    pub fn label_selector(&self) -> LabelSelector {
        LabelSelector {
            match_labels: Some(BTreeMap::from([(
                self.plugin_name.clone(),
                self.kind.clone(),
            )])),
            match_expressions: Some(vec![LabelSelectorRequirement {
                key: PLUGIN_CONFIG_LABEL.to_owned(),
                operator: "Exists".to_owned(),
                values: None,
            }]),
        }
    }

    pub fn to_query_string(&self) -> Result<String> {
        self.label_selector().to_query_string()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> Result<bool> {
        self.label_selector().matches(labels)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn requirement(key: &str, operator: &str, values: Option<&[&str]>) -> LabelSelectorRequirement {
        LabelSelectorRequirement {
            key: key.to_owned(),
            operator: operator.to_owned(),
            values: values.map(|values| values.iter().map(ToString::to_string).collect()),
        }
    }

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn label_selector_query_string() {
        let ls = LabelSelector {
            match_labels: Some(labels(&[("foo", "bar"), ("hui", "buh")])),
            match_expressions: Some(vec![
                requirement("foo", "In", Some(&["quick", "bar"])),
                requirement("foo", "NotIn", Some(&["quick", "bar"])),
                requirement("foo", "Exists", None),
                requirement("foo", "DoesNotExist", None),
            ]),
        };
        assert_eq!(
            ls.to_query_string(),
            Ok("foo=bar,hui=buh,foo in (quick, bar),foo notin (quick, bar),foo,!foo".to_owned())
        );

        assert_eq!(LabelSelector::default().to_query_string(), Ok(String::new()));
    }

    #[rstest]
    #[case(requirement("foo", "In", None))]
    #[case(requirement("foo", "NotIn", Some(&[])))]
    #[case(requirement("foo", "Exists", Some(&["bar"])))]
    #[case(requirement("foo", "IllegalOperator", None))]
    fn invalid_requirements_are_rejected(#[case] requirement: LabelSelectorRequirement) {
        let ls = LabelSelector {
            match_labels: None,
            match_expressions: Some(vec![requirement]),
        };

        assert!(ls.to_query_string().is_err());
        assert!(ls.matches(&BTreeMap::new()).is_err());
    }

    #[test]
    fn plugin_config_selector_query_string() {
        let selector = PluginConfigSelector::new(
            "catalogicsoftware.com/offload-restore-pod-action-plugin",
            "RestoreItemAction",
        );

        assert_eq!(
            selector.to_query_string(),
            Ok("catalogicsoftware.com/offload-restore-pod-action-plugin=RestoreItemAction,velero.io/plugin-config".to_owned())
        );
    }

    #[rstest]
    #[case(&[("velero.io/plugin-config", ""), ("example.com/plugin", "RestoreItemAction")], true)]
    #[case(&[("velero.io/plugin-config", "true"), ("example.com/plugin", "RestoreItemAction"), ("other", "x")], true)]
    #[case(&[("example.com/plugin", "RestoreItemAction")], false)]
    #[case(&[("velero.io/plugin-config", ""), ("example.com/plugin", "BackupItemAction")], false)]
    #[case(&[("velero.io/plugin-config", "")], false)]
    fn plugin_config_selector_matches(#[case] pairs: &[(&str, &str)], #[case] expected: bool) {
        let selector = PluginConfigSelector::new("example.com/plugin", "RestoreItemAction");
        assert_eq!(selector.matches(&labels(pairs)), Ok(expected));
    }
}
