// src/query/compile.rs - validation and pattern compilation
use crate::error::QueryError;
use crate::query::{Expression, Operation, Pattern, Query};

/// Operation with its condition pattern compiled
#[derive(Debug, Clone)]
pub(crate) enum Step {
    Branch {
        expression: Expression,
        pattern: Pattern,
        then_steps: Vec<Step>,
        else_steps: Vec<Step>,
    },
    Set {
        target: String,
        expression: Expression,
    },
    ColorBy(Expression),
    Skip,
}

/// A validated query, ready to run. Immutable, so one compiled query may
/// serve any number of concurrent runs.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    steps: Vec<Step>,
}

impl CompiledQuery {
    pub(crate) fn steps(&self) -> &[Step] {
        &self.steps
    }
}

pub(crate) fn compile(query: &Query) -> Result<CompiledQuery, QueryError> {
    Ok(CompiledQuery {
        steps: compile_operations(&query.operations, "operations")?,
    })
}

fn compile_operations(operations: &[Operation], path: &str) -> Result<Vec<Step>, QueryError> {
    operations
        .iter()
        .enumerate()
        .map(|(i, operation)| compile_operation(operation, &format!("{}[{}]", path, i)))
        .collect()
}

fn compile_operation(operation: &Operation, path: &str) -> Result<Step, QueryError> {
    let path = format!("{}.{}", path, operation.tag());
    match operation {
        Operation::If {
            condition,
            then_ops,
            else_ops,
        } => {
            let match_path = format!("{}.condition.match", path);
            check_expression(&condition.expression, &format!("{}.expression", match_path))?;
            let pattern =
                Pattern::new(&condition.pattern).map_err(|source| QueryError::InvalidPattern {
                    path: format!("{}.pattern", match_path),
                    pattern: condition.pattern.clone(),
                    source,
                })?;

            Ok(Step::Branch {
                expression: condition.expression.clone(),
                pattern,
                then_steps: compile_operations(then_ops, &format!("{}.then", path))?,
                else_steps: compile_operations(else_ops, &format!("{}.else", path))?,
            })
        }
        Operation::Set { target, expression } => {
            if target.is_empty() {
                return Err(QueryError::invalid(
                    format!("{}.target", path),
                    "target must not be empty",
                ));
            }
            check_expression(expression, &format!("{}.expression", path))?;
            Ok(Step::Set {
                target: target.clone(),
                expression: expression.clone(),
            })
        }
        Operation::ColorBy(expression) => {
            check_expression(expression, &path)?;
            Ok(Step::ColorBy(expression.clone()))
        }
        Operation::SkipRecord => Ok(Step::Skip),
    }
}

fn check_expression(expression: &Expression, path: &str) -> Result<(), QueryError> {
    match expression {
        Expression::Var(name) | Expression::LastVarValue(name) | Expression::Field(name)
            if name.is_empty() =>
        {
            Err(QueryError::invalid(
                format!("{}.{}", path, expression.tag()),
                "name must not be empty",
            ))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryErrorKind;
    use crate::query::Condition;

    #[test]
    fn test_compile_nested() {
        let query = Query::new(vec![Operation::branch(
            Condition::matches(Expression::Record, "a"),
            vec![Operation::branch(
                Condition::matches(Expression::var("x"), "b"),
                vec![Operation::SkipRecord],
                vec![Operation::set("y", Expression::constant("z"))],
            )],
            vec![Operation::color_by(Expression::field("level"))],
        )]);
        let compiled = query.compile().unwrap();
        assert_eq!(compiled.steps().len(), 1);
        match &compiled.steps()[0] {
            Step::Branch {
                then_steps,
                else_steps,
                ..
            } => {
                assert!(matches!(then_steps[0], Step::Branch { .. }));
                assert!(matches!(else_steps[0], Step::ColorBy(_)));
            }
            other => panic!("expected a branch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern_reports_location() {
        let query = Query::new(vec![
            Operation::color_by(Expression::constant("red")),
            Operation::branch(
                Condition::matches(Expression::Record, "ok"),
                vec![Operation::branch(
                    Condition::matches(Expression::Record, "(?P<broken"),
                    vec![],
                    vec![],
                )],
                vec![],
            ),
        ]);
        let err = query.compile().unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::InvalidPattern);
        assert_eq!(
            err.path(),
            "operations[1].if.then[0].if.condition.match.pattern"
        );
        match err {
            QueryError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(?P<broken"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_empty_target_rejected() {
        let query = Query::new(vec![Operation::set("", Expression::constant("x"))]);
        let err = query.compile().unwrap_err();
        assert_eq!(err.kind(), QueryErrorKind::InvalidQuery);
        assert_eq!(err.path(), "operations[0].set.target");
    }

    #[test]
    fn test_empty_variable_name_rejected() {
        let query = Query::new(vec![Operation::color_by(Expression::last_var_value(""))]);
        let err = query.compile().unwrap_err();
        assert_eq!(err.path(), "operations[0].colorBy.lastVarValue");
    }
}
