//! Post-authentication checkpoints.
//!
//! A checkpoint is a gate a user must pass after authenticating, e.g.
//! multi-factor authentication. Checkpoints are declared as directives such
//! as `require mfa` and parsed once at configuration time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CheckpointError, DirectiveError};
use crate::shape::Entries;

/// Checkpoint type tag for multi-factor authentication.
pub const MFA_CHECKPOINT_TYPE: &str = "mfa";

const MFA_CHECKPOINT_NAME: &str = "Multi-factor authentication";

/// A verification gate and its pass/fail state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Zero-based position in the declaring list.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub id: usize,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parameters: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub passed: bool,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub failed_attempts: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Checkpoint {
    /// Parse a single directive. The returned checkpoint has id 0.
    pub fn parse(directive: &str) -> Result<Self, DirectiveError> {
        let args = decode_args(directive)?;
        let Some((keyword, rest)) = args.split_first() else {
            return Err(DirectiveError::EmptyDirective);
        };
        match keyword.as_str() {
            "require" => {
                if args.len() != 2 {
                    return Err(DirectiveError::ArgumentCount {
                        keyword: keyword.clone(),
                        expected: 2,
                        actual: args.len(),
                    });
                }
                match rest[0].as_str() {
                    MFA_CHECKPOINT_TYPE => Ok(Self {
                        name: MFA_CHECKPOINT_NAME.to_string(),
                        kind: MFA_CHECKPOINT_TYPE.to_string(),
                        ..Self::default()
                    }),
                    other => Err(DirectiveError::UnsupportedRequirement(other.to_string())),
                }
            }
            other => Err(DirectiveError::UnsupportedKeyword(other.to_string())),
        }
    }

    /// Parse one or more directives into an ordered checkpoint list.
    ///
    /// Each checkpoint's id is its position in the input. An input that
    /// yields no checkpoints is an error.
    pub fn parse_many(input: impl Into<Entries>) -> Result<Vec<Self>, CheckpointError> {
        let directives = input.into().into_strings().map_err(CheckpointError::InvalidType)?;

        let mut checkpoints = Vec::with_capacity(directives.len());
        for (i, directive) in directives.into_iter().enumerate() {
            let mut checkpoint = Self::parse(&directive)
                .map_err(|source| CheckpointError::InvalidInput { directive, source })?;
            checkpoint.id = i;
            checkpoints.push(checkpoint);
        }

        if checkpoints.is_empty() {
            return Err(CheckpointError::Empty);
        }
        debug!(count = checkpoints.len(), "parsed checkpoints");
        Ok(checkpoints)
    }

    /// Record a successful verification.
    pub fn pass(&mut self) {
        self.passed = true;
    }

    /// Record a failed verification attempt.
    pub fn fail(&mut self) {
        self.passed = false;
        self.failed_attempts += 1;
    }
}

/// Split a directive into whitespace-separated arguments.
///
/// Single and double quotes group words into one argument. Inside double
/// quotes a backslash escapes the next character.
fn decode_args(s: &str) -> Result<Vec<String>, DirectiveError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(DirectiveError::UnbalancedQuotes(s.to_string())),
            },
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if quote.is_some() {
        return Err(DirectiveError::UnbalancedQuotes(s.to_string()));
    }
    if in_arg {
        args.push(current);
    }
    if args.is_empty() {
        return Err(DirectiveError::EmptyDirective);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_mfa() {
        let checkpoints = Checkpoint::parse_many("require mfa").unwrap();
        assert_eq!(checkpoints.len(), 1);
        let c = &checkpoints[0];
        assert_eq!(c.id, 0);
        assert_eq!(c.name, "Multi-factor authentication");
        assert_eq!(c.kind, "mfa");
        assert!(c.parameters.is_empty());
        assert!(!c.passed);
        assert_eq!(c.failed_attempts, 0);
    }

    #[test]
    fn ids_follow_position() {
        let checkpoints =
            Checkpoint::parse_many(vec!["require mfa", "  require   'mfa' "]).unwrap();
        let ids: Vec<usize> = checkpoints.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn unsupported_requirement_fails() {
        let err = Checkpoint::parse_many("require otp").unwrap_err();
        match err {
            CheckpointError::InvalidInput { directive, source } => {
                assert_eq!(directive, "require otp");
                assert_eq!(
                    source,
                    DirectiveError::UnsupportedRequirement("otp".to_string())
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_argument_fails() {
        assert_eq!(
            Checkpoint::parse("require"),
            Err(DirectiveError::ArgumentCount {
                keyword: "require".to_string(),
                expected: 2,
                actual: 1,
            })
        );
        assert!(matches!(
            Checkpoint::parse("require mfa now"),
            Err(DirectiveError::ArgumentCount { actual: 3, .. })
        ));
    }

    #[test]
    fn unsupported_keyword_fails() {
        assert_eq!(
            Checkpoint::parse("allow mfa"),
            Err(DirectiveError::UnsupportedKeyword("allow".to_string()))
        );
    }

    #[test]
    fn empty_input_fails() {
        let none: Vec<String> = Vec::new();
        assert!(matches!(
            Checkpoint::parse_many(none),
            Err(CheckpointError::Empty)
        ));
        assert_eq!(Checkpoint::parse("   "), Err(DirectiveError::EmptyDirective));
    }

    #[test]
    fn generic_values_must_be_strings() {
        assert!(Checkpoint::parse_many(json!(["require mfa"])).is_ok());
        assert!(matches!(
            Checkpoint::parse_many(json!(["require mfa", 7])),
            Err(CheckpointError::InvalidType(_))
        ));
        assert!(matches!(
            Checkpoint::parse_many(json!({"require": "mfa"})),
            Err(CheckpointError::InvalidType(_))
        ));
    }

    #[test]
    fn decode_args_honours_quotes() {
        assert_eq!(
            decode_args(r#"require "multi word" 'x y' z"#).unwrap(),
            vec!["require", "multi word", "x y", "z"]
        );
        assert_eq!(decode_args(r#"a "b\"c""#).unwrap(), vec!["a", "b\"c"]);
        assert_eq!(decode_args(r#"a """#).unwrap(), vec!["a", ""]);
        assert!(matches!(
            decode_args("require \"mfa"),
            Err(DirectiveError::UnbalancedQuotes(_))
        ));
    }

    #[test]
    fn pass_and_fail_track_state() {
        let mut c = Checkpoint::parse("require mfa").unwrap();
        c.fail();
        c.fail();
        assert_eq!(c.failed_attempts, 2);
        assert!(!c.passed);
        c.pass();
        assert!(c.passed);
        assert_eq!(c.failed_attempts, 2);
    }

    #[test]
    fn serializes_with_wire_keys() {
        let mut c = Checkpoint::parse("require mfa").unwrap();
        c.fail();
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(
            v,
            json!({"name": "Multi-factor authentication", "type": "mfa", "failed_attempts": 1})
        );
    }
}
