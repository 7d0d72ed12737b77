use crate::error::QueryError;
use chrono::NaiveDate;

/// Conjunctive `$where` expression built clause by clause, in caller order.
#[derive(Debug, Default, Clone)]
pub struct WhereClause {
    expr: String,
}

impl WhereClause {
    pub fn push(&mut self, clause: impl AsRef<str>) {
        let clause = clause.as_ref();
        if clause.is_empty() {
            return;
        }

        if !self.expr.is_empty() {
            self.expr.push_str(" AND ");
        }
        self.expr.push_str(clause);
    }

    /// `field between '{start}T00:00:00' and '{end}T23:59:59'`, both days inclusive.
    pub fn date_range(&mut self, field: &str, start: NaiveDate, end: NaiveDate) {
        self.push(format!(
            "{field} between '{}T00:00:00' and '{}T23:59:59'",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        ));
    }

    /// Strict minimum: a value exactly equal to the threshold is excluded.
    pub fn greater_than(&mut self, field: &str, value: i64) {
        self.push(format!("{field} > {value}"));
    }

    pub fn equals(&mut self, field: &str, value: &str) {
        self.push(format!("{field} = '{}'", escape(value)));
    }

    pub fn equals_number(&mut self, field: &str, value: i64) {
        self.push(format!("{field} = {value}"));
    }

    /// Set membership. An empty candidate set has no valid SoQL rendering
    /// and is rejected before it can reach the API.
    pub fn one_of(&mut self, field: &'static str, values: &[String]) -> Result<(), QueryError> {
        if values.is_empty() {
            return Err(QueryError::EmptySet(field));
        }

        let quoted = values
            .iter()
            .map(|value| format!("'{}'", escape(value)))
            .collect::<Vec<_>>()
            .join(", ");

        self.push(format!("{field} in ({quoted})"));
        Ok(())
    }

    /// Case-insensitive token match: whitespace-split tokens joined by `%`
    /// wildcards, so each token must appear, in order, inside the field.
    pub fn like_tokens(&mut self, field: &str, text: &str) {
        let tokens = text.split_whitespace().collect::<Vec<_>>();
        if tokens.is_empty() {
            return;
        }

        let pattern = format!("%{}%", tokens.join("%"));
        self.push(format!(
            "upper({field}) like upper('{}')",
            escape(&pattern)
        ));
    }

    pub fn is_empty(&self) -> bool {
        self.expr.is_empty()
    }

    pub fn into_expr(self) -> Option<String> {
        if self.expr.is_empty() {
            None
        } else {
            Some(self.expr)
        }
    }
}

fn escape(value: &str) -> String {
    value.replace('\'', "''")
}

/// One rendered Socrata query: filter, sort directive, and page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoqlQuery {
    where_clause: Option<String>,
    order: Option<String>,
    limit: usize,
}

impl SoqlQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            where_clause: None,
            order: None,
            // a page size of zero would never let the fetch loop terminate
            limit: limit.max(1),
        }
    }

    pub fn with_filter(mut self, filter: WhereClause) -> Self {
        self.where_clause = filter.into_expr();
        self
    }

    pub fn with_order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    /// Query parameters for the page starting at `offset` records in.
    pub fn params(&self, offset: usize) -> Vec<(String, String)> {
        let mut params = vec![("$limit".to_string(), self.limit.to_string())];

        if let Some(order) = &self.order {
            params.push(("$order".to_string(), order.clone()));
        }
        if let Some(filter) = &self.where_clause {
            params.push(("$where".to_string(), filter.clone()));
        }
        if offset > 0 {
            params.push(("$offset".to_string(), offset.to_string()));
        }

        params
    }
}
