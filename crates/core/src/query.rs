use crate::error::QueryError;
use crate::soql::{SoqlQuery, WhereClause};
use chrono::{Duration, NaiveDate};

/// Records per page request against the Socrata API.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Inclusive publication-date window. A window given as a single date is
/// open-ended and resolves to `[date, today]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    Range { start: NaiveDate, end: NaiveDate },
    Since(NaiveDate),
}

impl DateWindow {
    /// Default recent window ending today.
    pub fn last_days(today: NaiveDate, days: i64) -> Self {
        Self::Range {
            start: today - Duration::days(days),
            end: today,
        }
    }

    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match *self {
            Self::Range { start, end } if start <= end => (start, end),
            Self::Range { start, end } => (end, start),
            Self::Since(start) => (start, today),
        }
    }
}

/// Filter spec for SECOP II contracting processes.
///
/// Clauses render in fixed order: date range, minimum price, entity order,
/// entity set, exact process id. A `min_price` of 0 means "unset".
#[derive(Debug, Clone, Default)]
pub struct ProcessQuery {
    pub window: Option<DateWindow>,
    pub min_price: i64,
    pub entity_order: Option<String>,
    pub entities: Option<Vec<String>>,
    pub process_id: Option<String>,
    pub sort: Option<String>,
    pub page_size: usize,
}

impl ProcessQuery {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ..Default::default()
        }
    }

    pub fn build(&self, today: NaiveDate) -> Result<SoqlQuery, QueryError> {
        let mut filter = WhereClause::default();

        if let Some(window) = &self.window {
            let (start, end) = window.resolve(today);
            filter.date_range("fecha_de_publicacion_del", start, end);
        }
        if self.min_price > 0 {
            filter.greater_than("precio_base", self.min_price);
        }
        if let Some(orden) = &self.entity_order {
            filter.equals("ordenentidad", orden);
        }
        if let Some(entities) = &self.entities {
            filter.one_of("entidad", entities)?;
        }
        if let Some(id) = &self.process_id {
            filter.equals("id_del_proceso", id);
        }

        let mut query = SoqlQuery::new(self.page_size).with_filter(filter);
        if let Some(sort) = &self.sort {
            query = query.with_order(sort.clone());
        }

        Ok(query)
    }
}

/// Filter spec for annual-acquisition-plan headers.
#[derive(Debug, Clone, Default)]
pub struct PlanQuery {
    pub year: Option<i32>,
    pub page_size: usize,
}

impl PlanQuery {
    pub fn new() -> Self {
        Self {
            year: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn build(&self) -> Result<SoqlQuery, QueryError> {
        let mut filter = WhereClause::default();

        if let Some(year) = self.year {
            filter.equals_number("anno", i64::from(year));
        }

        Ok(SoqlQuery::new(self.page_size).with_filter(filter))
    }
}

/// Filter spec for bidders on contracting processes.
///
/// The dataset is large and undated queries are useless, so the date window
/// is mandatory here; results come back newest first.
#[derive(Debug, Clone)]
pub struct SupplierQuery {
    pub window: DateWindow,
    pub process_id: Option<String>,
    pub bidder: Option<String>,
    pub page_size: usize,
}

impl SupplierQuery {
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            process_id: None,
            bidder: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn build(&self, today: NaiveDate) -> Result<SoqlQuery, QueryError> {
        let mut filter = WhereClause::default();

        let (start, end) = self.window.resolve(today);
        filter.date_range("fecha_publicaci_n", start, end);

        if let Some(id) = &self.process_id {
            filter.equals("id_procedimiento", id);
        }
        if let Some(bidder) = &self.bidder {
            filter.like_tokens("proveedor", bidder);
        }

        Ok(SoqlQuery::new(self.page_size)
            .with_filter(filter)
            .with_order("fecha_publicaci_n DESC"))
    }
}

/// Filter spec for the registry of state entities.
#[derive(Debug, Clone, Default)]
pub struct EntityQuery {
    pub names: Option<Vec<String>>,
    pub nits: Option<Vec<String>>,
    pub sort: Option<String>,
    pub page_size: usize,
}

impl EntityQuery {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ..Default::default()
        }
    }

    pub fn build(&self) -> Result<SoqlQuery, QueryError> {
        let mut filter = WhereClause::default();

        if let Some(names) = &self.names {
            filter.one_of("nombre", names)?;
        }
        if let Some(nits) = &self.nits {
            filter.one_of("ccb_nit_inst", nits)?;
        }

        let mut query = SoqlQuery::new(self.page_size).with_filter(filter);
        if let Some(sort) = &self.sort {
            query = query.with_order(sort.clone());
        }

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_min_price_is_treated_as_unset() {
        let query = ProcessQuery::new().build(date(2024, 6, 1)).unwrap();
        assert_eq!(query.where_clause(), None);
    }

    #[test]
    fn positive_min_price_uses_strict_inequality() {
        let spec = ProcessQuery {
            min_price: 100,
            ..ProcessQuery::new()
        };

        let query = spec.build(date(2024, 6, 1)).unwrap();
        assert_eq!(query.where_clause(), Some("precio_base > 100"));
    }

    #[test]
    fn single_date_expands_to_today() {
        let today = date(2024, 6, 15);
        let spec = ProcessQuery {
            window: Some(DateWindow::Since(date(2024, 6, 1))),
            ..ProcessQuery::new()
        };

        let query = spec.build(today).unwrap();
        assert_eq!(
            query.where_clause(),
            Some("fecha_de_publicacion_del between '2024-06-01T00:00:00' and '2024-06-15T23:59:59'")
        );
    }

    #[test]
    fn inverted_range_is_reordered() {
        let window = DateWindow::Range {
            start: date(2024, 6, 10),
            end: date(2024, 6, 1),
        };

        assert_eq!(
            window.resolve(date(2024, 6, 15)),
            (date(2024, 6, 1), date(2024, 6, 10))
        );
    }

    #[test]
    fn process_clauses_follow_fixed_order() {
        let spec = ProcessQuery {
            window: Some(DateWindow::Range {
                start: date(2024, 5, 1),
                end: date(2024, 5, 31),
            }),
            min_price: 50_000_000,
            entity_order: Some("Nacional".to_string()),
            entities: Some(vec!["INVIAS".to_string()]),
            process_id: Some("CO1.BDOS.100".to_string()),
            sort: Some("fecha_de_publicacion_del DESC".to_string()),
            page_size: 1000,
        };

        let query = spec.build(date(2024, 6, 1)).unwrap();
        assert_eq!(
            query.where_clause(),
            Some(
                "fecha_de_publicacion_del between '2024-05-01T00:00:00' and '2024-05-31T23:59:59' \
                 AND precio_base > 50000000 \
                 AND ordenentidad = 'Nacional' \
                 AND entidad in ('INVIAS') \
                 AND id_del_proceso = 'CO1.BDOS.100'"
            )
        );
    }

    #[test]
    fn empty_entity_set_fails_fast() {
        let spec = ProcessQuery {
            entities: Some(Vec::new()),
            ..ProcessQuery::new()
        };

        assert!(matches!(
            spec.build(date(2024, 6, 1)),
            Err(QueryError::EmptySet("entidad"))
        ));
    }

    #[test]
    fn plan_year_renders_unquoted() {
        let spec = PlanQuery {
            year: Some(2023),
            page_size: 1000,
        };

        let query = spec.build().unwrap();
        assert_eq!(query.where_clause(), Some("anno = 2023"));
    }

    #[test]
    fn supplier_query_always_has_window_and_sort() {
        let spec = SupplierQuery {
            bidder: Some("servicios integrales".to_string()),
            ..SupplierQuery::new(DateWindow::last_days(date(2024, 6, 30), 30))
        };

        let query = spec.build(date(2024, 6, 30)).unwrap();
        assert_eq!(
            query.where_clause(),
            Some(
                "fecha_publicaci_n between '2024-05-31T00:00:00' and '2024-06-30T23:59:59' \
                 AND upper(proveedor) like upper('%servicios%integrales%')"
            )
        );
        assert!(query
            .params(0)
            .contains(&("$order".to_string(), "fecha_publicaci_n DESC".to_string())));
    }
}
