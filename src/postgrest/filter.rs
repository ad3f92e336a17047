//! Filter and ordering primitives for table queries

/// Operator for filter expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to
    Eq,

    /// Not equal to
    Neq,

    /// In a list of values
    In,

    /// Not in a list of values
    NotIn,
}

impl FilterOperator {
    /// Convert the operator to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::In => "in",
            FilterOperator::NotIn => "not.in",
        }
    }
}

/// A single `column=operator.value` condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    operator: FilterOperator,
    value: String,
}

impl Filter {
    pub fn eq<T: ToString>(column: &str, value: T) -> Self {
        Self {
            column: column.to_string(),
            operator: FilterOperator::Eq,
            value: value.to_string(),
        }
    }

    pub fn neq<T: ToString>(column: &str, value: T) -> Self {
        Self {
            column: column.to_string(),
            operator: FilterOperator::Neq,
            value: value.to_string(),
        }
    }

    /// Every item is double-quoted so commas and parentheses inside values
    /// do not break the list syntax.
    pub fn in_list<S: AsRef<str>>(column: &str, values: &[S]) -> Self {
        Self::list(column, FilterOperator::In, values)
    }

    pub fn not_in<S: AsRef<str>>(column: &str, values: &[S]) -> Self {
        Self::list(column, FilterOperator::NotIn, values)
    }

    fn list<S: AsRef<str>>(column: &str, operator: FilterOperator, values: &[S]) -> Self {
        let items: Vec<String> = values.iter().map(|v| quote(v.as_ref())).collect();
        Self {
            column: column.to_string(),
            operator,
            value: format!("({})", items.join(",")),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Query parameter pair for this filter
    pub fn to_param(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.operator.as_str(), self.value),
        )
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}
