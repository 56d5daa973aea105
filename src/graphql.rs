//! GraphQL request and response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::GraphQlErrorDetail;

/// A GraphQL document plus its variables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQlRequest {
    /// The query or mutation document.
    pub query: String,
    /// Named variables referenced by the document.
    pub variables: Value,
}

impl GraphQlRequest {
    /// Build a request from a document and a variables value.
    ///
    /// A `null` variables value is sent as an empty object.
    pub fn new(query: impl Into<String>, variables: Value) -> Self {
        let variables = if variables.is_null() {
            Value::Object(Map::new())
        } else {
            variables
        };
        Self {
            query: query.into(),
            variables,
        }
    }

    /// Whether the document contains a mutation operation.
    pub fn is_mutation(&self) -> bool {
        is_mutation(&self.query)
    }
}

/// Raw response envelope as returned by the GraphQL endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphQlErrorDetail>>,
}

/// Report whether any top-level operation in `document` is a mutation.
///
/// Only keywords at brace depth zero count, so a field or argument named
/// `mutation` inside a selection set does not register. Comments and
/// string literals are skipped.
pub fn is_mutation(document: &str) -> bool {
    let mut depth = 0usize;
    let mut chars = document.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            '#' => {
                for (_, c) in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' => {
                let mut escaped = false;
                for (_, c) in chars.by_ref() {
                    if escaped {
                        escaped = false;
                    } else if c == '\\' {
                        escaped = true;
                    } else if c == '"' {
                        break;
                    }
                }
            }
            '$' => {
                while chars
                    .next_if(|&(_, c)| c.is_ascii_alphanumeric() || c == '_')
                    .is_some()
                {}
            }
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_ascii_alphabetic() || c == '_') => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_ascii_alphanumeric() || next == '_' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                if &document[start..end] == "mutation" {
                    return true;
                }
            }
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_named_mutation() {
        let doc = r#"
            mutation Start_SDK($testId: ID!) {
                startMultipartUploadV2(testId: $testId) { uploadId key }
            }
        "#;
        assert!(is_mutation(doc));
    }

    #[test]
    fn test_query_is_not_mutation() {
        let doc = "query GetUsers($after: String) { allUsers(after: $after) { id } }";
        assert!(!is_mutation(doc));
    }

    #[test]
    fn test_ignores_nested_field_named_mutation() {
        let doc = "query Q { mutation { id } }";
        assert!(!is_mutation(doc));
    }

    #[test]
    fn test_ignores_comments_and_strings() {
        let doc = "# mutation in a comment\nquery Q($s: String = \"mutation\") { a }";
        assert!(!is_mutation(doc));
    }

    #[test]
    fn test_detects_mutation_after_query_in_same_document() {
        let doc = "query A { a } mutation B { b }";
        assert!(is_mutation(doc));
    }

    #[test]
    fn test_null_variables_become_empty_object() {
        let request = GraphQlRequest::new("query { a }", Value::Null);
        assert_eq!(request.variables, serde_json::json!({}));
    }
}
