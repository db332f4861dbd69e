//! Picking a subtype from the shape of a decoded tree.

use std::collections::BTreeSet;

use core::fmt;

use serde_json::Value;

use crate::{BeanType, Signature};

/// Outcome of resolving a tree against a supertype's candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// This subtype's whole signature is present in the tree.
    Subtype(&'static BeanType),
    /// No candidate matched: decode as the supertype itself.
    Fallback,
}

impl Resolved {
    /// The chosen subtype, if any.
    pub fn subtype(self) -> Option<&'static BeanType> {
        match self {
            Resolved::Subtype(ty) => Some(ty),
            Resolved::Fallback => None,
        }
    }
}

/// Return the first candidate whose signature is fully present in `tree`.
///
/// First match, not best match: when several signatures are satisfied, the
/// one registered earliest wins regardless of size. A candidate with an
/// empty signature therefore matches every tree and belongs at the end of
/// the list.
///
/// Pure: no I/O, no state, same answer for the same inputs.
pub fn resolve(tree: &Value, candidates: &[Signature]) -> Resolved {
    for candidate in candidates {
        let matched = candidate.matches(tree);
        tracing::trace!(
            subtype = candidate.subtype().name(),
            matched,
            "testing candidate"
        );
        if matched {
            return Resolved::Subtype(candidate.subtype());
        }
    }
    Resolved::Fallback
}

/// Why one candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMiss {
    /// The candidate subtype
    pub subtype: &'static str,
    /// Signature names absent from the input
    pub missing: Vec<&'static str>,
}

/// Suggestion for an input field that might be a misspelled property.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSuggestion {
    /// The field as it appeared in the input
    pub unknown: String,
    /// The known property it resembles
    pub suggestion: &'static str,
    /// Jaro-Winkler similarity, 0.0 to 1.0
    pub similarity: f64,
}

/// Diagnostics for a tree that matched no candidate.
///
/// Attached to [`DecodeError::Fallback`](crate::DecodeError::Fallback) to
/// explain what the input would have needed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoMatchReport {
    /// Field names present in the input
    pub input_fields: Vec<String>,
    /// Per-candidate missing names, in registration order
    pub candidates: Vec<CandidateMiss>,
    /// Input fields no candidate or the supertype knows about
    pub unknown_fields: Vec<String>,
    /// "Did you mean?" hints for the unknown fields
    pub suggestions: Vec<FieldSuggestion>,
}

impl NoMatchReport {
    /// Explain why `tree` matched none of `candidates` for `supertype`.
    pub fn new(tree: &Value, supertype: &'static BeanType, candidates: &[Signature]) -> Self {
        Self::from_fields(field_names(tree), supertype, candidates)
    }

    /// Same as [`NoMatchReport::new`], from the input's field names alone.
    pub fn from_fields(
        input_fields: Vec<String>,
        supertype: &'static BeanType,
        candidates: &[Signature],
    ) -> Self {
        let present: BTreeSet<&str> = input_fields.iter().map(String::as_str).collect();

        let mut known: BTreeSet<&'static str> = BTreeSet::new();
        known.extend(supertype.properties());
        for ty in supertype.ancestors() {
            known.extend(ty.properties());
        }
        for candidate in candidates {
            known.extend(candidate.names());
        }

        let unknown_fields: Vec<String> = input_fields
            .iter()
            .filter(|field| !known.contains(field.as_str()))
            .cloned()
            .collect();

        let suggestions = compute_suggestions(&unknown_fields, &known);

        let candidates = candidates
            .iter()
            .map(|candidate| CandidateMiss {
                subtype: candidate.subtype().name(),
                missing: candidate
                    .names()
                    .filter(|name| !present.contains(name))
                    .collect(),
            })
            .collect();

        Self {
            input_fields,
            candidates,
            unknown_fields,
            suggestions,
        }
    }

    /// True when there is nothing worth reporting.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty() && self.unknown_fields.is_empty()
    }
}

impl fmt::Display for NoMatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input fields: {:?}", self.input_fields)?;
        if !self.candidates.is_empty() {
            write!(f, "\nno subtype matched:")?;
            for miss in &self.candidates {
                write!(f, "\n  - {}", miss.subtype)?;
                match miss.missing.as_slice() {
                    [] => {}
                    [one] => write!(f, ": missing field '{one}'")?,
                    many => write!(f, ": missing fields {many:?}")?,
                }
            }
        }
        if !self.unknown_fields.is_empty() {
            write!(f, "\nunknown fields: {:?}", self.unknown_fields)?;
        }
        for suggestion in &self.suggestions {
            write!(
                f,
                "\n  did you mean '{}' instead of '{}'?",
                suggestion.suggestion, suggestion.unknown
            )?;
        }
        Ok(())
    }
}

/// Top-level field names of `tree`, in input order. Empty for non-objects.
pub(crate) fn field_names(tree: &Value) -> Vec<String> {
    tree.as_object()
        .map(|object| object.keys().cloned().collect())
        .unwrap_or_default()
}

/// Compute "did you mean?" suggestions for unknown fields.
#[cfg(feature = "suggestions")]
fn compute_suggestions(
    unknown_fields: &[String],
    known: &BTreeSet<&'static str>,
) -> Vec<FieldSuggestion> {
    const SIMILARITY_THRESHOLD: f64 = 0.6;

    let mut suggestions = Vec::new();
    for unknown in unknown_fields {
        let mut best: Option<(&'static str, f64)> = None;
        for &candidate in known {
            let similarity = strsim::jaro_winkler(unknown, candidate);
            if similarity >= SIMILARITY_THRESHOLD
                && best.is_none_or(|(_, best_similarity)| similarity > best_similarity)
            {
                best = Some((candidate, similarity));
            }
        }
        if let Some((suggestion, similarity)) = best {
            suggestions.push(FieldSuggestion {
                unknown: unknown.clone(),
                suggestion,
                similarity,
            });
        }
    }
    suggestions
}

/// Compute "did you mean?" suggestions (no-op without strsim).
#[cfg(not(feature = "suggestions"))]
fn compute_suggestions(
    _unknown_fields: &[String],
    _known: &BTreeSet<&'static str>,
) -> Vec<FieldSuggestion> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bean;
    use crate::test_types::{Animal, Cat, Dog, Puppy};
    use serde_json::json;

    fn candidates(subtypes: &[&'static BeanType]) -> Vec<Signature> {
        subtypes
            .iter()
            .map(|&ty| Signature::derive(ty, Animal::TYPE).unwrap())
            .collect()
    }

    #[test]
    fn first_match_wins_over_larger_signature() {
        // Dog needs {barks}; Puppy needs {barks, chews}. Both match, Dog is first.
        let list = candidates(&[Dog::TYPE, Puppy::TYPE]);
        let tree = json!({"barks": true, "chews": "shoe"});
        assert_eq!(resolve(&tree, &list), Resolved::Subtype(Dog::TYPE));

        let list = candidates(&[Puppy::TYPE, Dog::TYPE]);
        assert_eq!(resolve(&tree, &list), Resolved::Subtype(Puppy::TYPE));
    }

    #[test]
    fn no_match_is_fallback() {
        let list = candidates(&[Dog::TYPE, Cat::TYPE]);
        assert_eq!(resolve(&json!({"name": "nemo"}), &list), Resolved::Fallback);
        assert_eq!(resolve(&json!("just a string"), &list), Resolved::Fallback);
        assert_eq!(resolve(&json!({}), &[]), Resolved::Fallback);
    }

    #[test]
    fn resolution_is_repeatable() {
        let list = candidates(&[Cat::TYPE, Dog::TYPE]);
        let tree = json!({"meows": 1, "barks": 2});
        let first = resolve(&tree, &list);
        let second = resolve(&tree, &list);
        assert_eq!(first, second);
        assert_eq!(first.subtype(), Some(Cat::TYPE));
    }

    #[test]
    fn report_lists_missing_fields() {
        let list = candidates(&[Dog::TYPE, Cat::TYPE]);
        let tree = json!({"name": "felix", "meow": true});
        let report = NoMatchReport::new(&tree, Animal::TYPE, &list);

        assert_eq!(report.input_fields, ["name", "meow"]);
        assert_eq!(
            report.candidates,
            [
                CandidateMiss {
                    subtype: "zoo::Dog",
                    missing: vec!["barks"],
                },
                CandidateMiss {
                    subtype: "zoo::Cat",
                    missing: vec!["meows"],
                },
            ]
        );
        assert_eq!(report.unknown_fields, ["meow"]);

        let text = report.to_string();
        assert!(text.contains("zoo::Cat: missing field 'meows'"), "{text}");
    }

    #[cfg(feature = "suggestions")]
    #[test]
    fn report_suggests_close_names() {
        let list = candidates(&[Dog::TYPE, Cat::TYPE]);
        let report = NoMatchReport::new(&json!({"meow": true}), Animal::TYPE, &list);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].suggestion, "meows");
        assert_eq!(report.suggestions[0].unknown, "meow");
    }
}
