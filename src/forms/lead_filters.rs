//! Filter state carried in the board URL, e.g. `?status=nova&dateRange=7d&page=1`.

use serde::{Deserialize, Serialize};

use crate::domain::filters::{DateRange, LeadFilters};
use crate::domain::types::ServiceType;
use crate::forms::FormError;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadFiltersForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(rename = "dateRange", default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Zero-based page index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl LeadFiltersForm {
    /// Parses a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Result<Self, FormError> {
        serde_html_form::from_str(query.trim_start_matches('?'))
            .map_err(|err| FormError::Query(err.to_string()))
    }

    pub fn to_query_string(&self) -> Result<String, FormError> {
        serde_html_form::to_string(self).map_err(|err| FormError::Query(err.to_string()))
    }

    /// Converts into domain filters plus the requested page.
    pub fn into_filters(self) -> Result<(LeadFilters, usize), FormError> {
        let date_range = match non_blank(self.date_range) {
            Some(token) => Some(DateRange::from_token(&token).ok_or(FormError::InvalidDateRange)?),
            None => None,
        };
        let service_type = non_blank(self.service_type)
            .map(ServiceType::new)
            .transpose()
            .map_err(|_| FormError::InvalidServiceType)?;

        let filters = LeadFilters {
            status: non_blank(self.status).map(Into::into),
            priority: non_blank(self.priority).map(Into::into),
            origin: non_blank(self.origin).map(Into::into),
            service_type,
            date_range,
            search: non_blank(self.search),
        };

        Ok((filters, self.page.unwrap_or(0)))
    }

    pub fn from_filters(filters: &LeadFilters, page: usize) -> Self {
        Self {
            status: filters.status.as_ref().map(ToString::to_string),
            priority: filters.priority.as_ref().map(ToString::to_string),
            origin: filters.origin.as_ref().map(ToString::to_string),
            service_type: filters
                .service_type
                .as_ref()
                .map(|s| s.as_str().to_string()),
            date_range: filters.date_range.map(|r| r.token().to_string()),
            search: filters.search.clone(),
            page: (page > 0).then_some(page),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::lead::{LeadPriority, LeadStatus};

    #[test]
    fn blank_values_mean_no_predicate() {
        let form = LeadFiltersForm::parse("?status=nova&priority=&search=%20%20&page=2").unwrap();
        let (filters, page) = form.into_filters().unwrap();

        assert_eq!(filters.status, Some(LeadStatus::New));
        assert_eq!(filters.priority, None);
        assert_eq!(filters.search, None);
        assert_eq!(page, 2);
    }

    #[test]
    fn date_range_token_is_validated() {
        let form = LeadFiltersForm::parse("dateRange=7d").unwrap();
        let (filters, page) = form.into_filters().unwrap();
        assert_eq!(filters.date_range, Some(DateRange::Last7Days));
        assert_eq!(page, 0);

        let form = LeadFiltersForm::parse("dateRange=1y").unwrap();
        assert!(matches!(
            form.into_filters(),
            Err(FormError::InvalidDateRange)
        ));
    }

    #[test]
    fn filters_survive_a_query_string_round_trip() {
        let filters = LeadFilters {
            status: Some(LeadStatus::InProgress),
            priority: Some(LeadPriority::Urgent),
            date_range: Some(DateRange::Last24Hours),
            ..LeadFilters::default()
        };

        let query = LeadFiltersForm::from_filters(&filters, 3)
            .to_query_string()
            .unwrap();
        let (parsed, page) = LeadFiltersForm::parse(&query)
            .unwrap()
            .into_filters()
            .unwrap();

        assert_eq!(parsed, filters);
        assert_eq!(page, 3);
    }

    #[test]
    fn default_state_serializes_to_empty_query() {
        let query = LeadFiltersForm::from_filters(&LeadFilters::default(), 0)
            .to_query_string()
            .unwrap();
        assert_eq!(query, "");
    }
}
