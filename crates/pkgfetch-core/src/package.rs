use std::fmt;
use std::str::FromStr;

/// Version comparison operator in a package specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Eq => "=",
            Condition::Lt => "<",
            Condition::Le => "<=",
            Condition::Gt => ">",
            Condition::Ge => ">=",
        }
    }

    /// Parse an operator token. `==` is accepted as an alias for `=`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" | "==" => Some(Condition::Eq),
            "<" => Some(Condition::Lt),
            "<=" => Some(Condition::Le),
            ">" => Some(Condition::Gt),
            ">=" => Some(Condition::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A versioned package specification: a name (or capability) plus an
/// optional version constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageVer {
    pub name: String,
    pub constraint: Option<(Condition, String)>,
}

impl PackageVer {
    /// A bare name with no version constraint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
        }
    }

    /// A name constrained by `condition version`.
    pub fn with_constraint(
        name: impl Into<String>,
        condition: Condition,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            constraint: Some((condition, version.into())),
        }
    }

    pub fn version(&self) -> Option<&str> {
        self.constraint.as_ref().map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for PackageVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.constraint {
            Some((cond, version)) => write!(f, "{} {cond} {version}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Error returned when a package specification string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid package specification '{0}'")]
pub struct ParsePackageVerError(pub String);

impl FromStr for PackageVer {
    type Err = ParsePackageVerError;

    /// Parse `"name"` or `"name <op> version"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.as_slice() {
            [name] => Ok(PackageVer::new(*name)),
            [name, op, version] => {
                let cond = Condition::parse(op).ok_or_else(|| ParsePackageVerError(s.to_string()))?;
                Ok(PackageVer::with_constraint(*name, cond, *version))
            }
            _ => Err(ParsePackageVerError(s.to_string())),
        }
    }
}
