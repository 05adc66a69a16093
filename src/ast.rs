use std::fmt;

/// One predicate invocation: `-name *.txt` is `Primary { name: "name", values: ["*.txt"] }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Primary {
    pub name: String,
    pub values: Vec<String>,
}

impl Primary {
    pub fn new<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Conjunction. Never empty when produced by the parser; children keep
/// their left-to-right order, which is also evaluation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct And(pub Vec<Expr>);

/// Disjunction over conjunctions; the root of every parsed expression.
/// Always has at least one child, even for a single term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Or(pub Vec<And>);

/// A sub-expression. `And` only appears as a direct child of `Or`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Primary(Primary),
    Not(Box<Expr>),
    Or(Or),
}

impl Expr {
    pub fn not(inner: Expr) -> Self {
        Self::Not(Box::new(inner))
    }

    pub fn primary<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::Primary(Primary::new(name, values))
    }
}

impl Or {
    /// Number of predicate invocations in the tree.
    pub fn primaries(&self) -> usize {
        self.0
            .iter()
            .flat_map(|and| and.0.iter())
            .map(Expr::primaries)
            .sum()
    }
}

impl Expr {
    fn primaries(&self) -> usize {
        match self {
            Expr::Primary(_) => 1,
            Expr::Not(inner) => inner.primaries(),
            Expr::Or(or) => or.primaries(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display: renders back to command-line syntax with explicit operators
// ---------------------------------------------------------------------------

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}", self.name)?;
        for value in &self.values {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Primary(p) => p.fmt(f),
            Expr::Not(inner) => write!(f, "! {inner}"),
            Expr::Or(or) => write!(f, "( {or} )"),
        }
    }
}

impl fmt::Display for And {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, expr) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -a ")?;
            }
            expr.fmt(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for Or {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, and) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" -o ")?;
            }
            and.fmt(f)?;
        }
        Ok(())
    }
}
