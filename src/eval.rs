use std::path::Path;

use crate::ast::{And, Expr, Or};
use crate::error::FindError;
use crate::registry::PredicateRegistry;

/// Evaluate a parsed expression against one candidate path.
///
/// `And` stops at the first `false` child and `Or` at the first `true`
/// child; later children are not evaluated.
///
/// # Errors
///
/// [`FindError::UnknownPredicate`] if a primary names a predicate that is
/// not registered. The parser rejects these, so only hand-built trees can
/// reach it.
pub fn evaluate(tree: &Or, path: &Path, registry: &PredicateRegistry) -> Result<bool, FindError> {
    for and in &tree.0 {
        if eval_and(and, path, registry)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn eval_and(and: &And, path: &Path, registry: &PredicateRegistry) -> Result<bool, FindError> {
    debug_assert!(!and.0.is_empty(), "conjunction without children");
    for expr in &and.0 {
        if !eval_expr(expr, path, registry)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn eval_expr(expr: &Expr, path: &Path, registry: &PredicateRegistry) -> Result<bool, FindError> {
    match expr {
        Expr::Primary(primary) => {
            let predicate = registry
                .lookup(&primary.name)
                .ok_or_else(|| FindError::UnknownPredicate(primary.name.clone()))?;
            let hit = predicate.test(path, &primary.values);
            tracing::trace!(path = %path.display(), predicate = %primary, hit, "evaluated");
            Ok(hit)
        }
        Expr::Not(inner) => Ok(!eval_expr(inner, path, registry)?),
        Expr::Or(or) => {
            debug_assert!(!or.0.is_empty(), "disjunction without children");
            evaluate(or, path, registry)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::ast::Primary;

    fn leaf(name: &str) -> Expr {
        Expr::Primary(Primary::new::<&str>(name, []))
    }

    fn single(expr: Expr) -> Or {
        Or(vec![And(vec![expr])])
    }

    /// Registry with `yes`, `no`, and a `count` predicate that records each call.
    fn counting() -> (PredicateRegistry, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = PredicateRegistry::new();
        registry.register("yes", |_: &Path, _: &[String]| true).unwrap();
        registry.register("no", |_: &Path, _: &[String]| false).unwrap();
        let seen = Arc::clone(&calls);
        registry
            .register("count", move |_: &Path, _: &[String]| {
                seen.fetch_add(1, Ordering::Relaxed);
                true
            })
            .unwrap();
        (registry, calls)
    }

    #[test]
    fn not_inverts() {
        let (registry, _) = counting();
        let path = Path::new("x");
        for name in ["yes", "no"] {
            let plain = evaluate(&single(leaf(name)), path, &registry).unwrap();
            let negated = evaluate(&single(Expr::not(leaf(name))), path, &registry).unwrap();
            assert_eq!(negated, !plain);
        }
    }

    #[test]
    fn and_short_circuits_on_false() {
        let (registry, calls) = counting();
        let tree = Or(vec![And(vec![leaf("no"), leaf("count")])]);
        assert!(!evaluate(&tree, Path::new("x"), &registry).unwrap());
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        let tree = Or(vec![And(vec![leaf("yes"), leaf("count")])]);
        assert!(evaluate(&tree, Path::new("x"), &registry).unwrap());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn or_short_circuits_on_true() {
        let (registry, calls) = counting();
        let tree = Or(vec![And(vec![leaf("yes")]), And(vec![leaf("count")])]);
        assert!(evaluate(&tree, Path::new("x"), &registry).unwrap());
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        let tree = Or(vec![And(vec![leaf("no")]), And(vec![leaf("count")])]);
        assert!(evaluate(&tree, Path::new("x"), &registry).unwrap());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn nested_groups() {
        let (registry, _) = counting();
        let inner = Or(vec![And(vec![leaf("no")]), And(vec![leaf("yes")])]);
        let tree = single(Expr::not(Expr::Or(inner)));
        assert!(!evaluate(&tree, Path::new("x"), &registry).unwrap());
    }

    #[test]
    fn values_reach_the_predicate() {
        let mut registry = PredicateRegistry::new();
        registry
            .register("is", |p: &Path, args: &[String]| {
                args.iter().any(|a| p == Path::new(a))
            })
            .unwrap();
        let tree = single(Expr::primary("is", ["a", "b"]));
        assert!(evaluate(&tree, Path::new("b"), &registry).unwrap());
        assert!(!evaluate(&tree, Path::new("c"), &registry).unwrap());
    }

    #[test]
    fn unregistered_name_is_a_lookup_error() {
        let registry = PredicateRegistry::new();
        let err = evaluate(&single(leaf("ghost")), Path::new("x"), &registry).unwrap_err();
        assert!(matches!(err, FindError::UnknownPredicate(ref name) if name == "ghost"));
    }
}
