pub mod depositdtos;
pub mod paymentdtos;
pub mod referraldtos;
pub mod userdtos;
pub mod withdrawaldtos;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{error::HttpError, models::UnknownVariant};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            data,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        Pagination {
            page,
            limit,
            total,
            total_pages: (total + limit_i64 - 1) / limit_i64,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        ListResponse {
            success: true,
            data,
            pagination,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct ListQueryDto {
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ListQueryDto {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page() - 1) * i64::from(self.limit())
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Parses the status filter; empty and `all` mean no filter.
    pub fn status<S>(&self) -> Result<Option<S>, HttpError>
    where
        S: TryFrom<String, Error = UnknownVariant>,
    {
        match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => Ok(None),
            Some(value) => S::try_from(value.to_lowercase())
                .map(Some)
                .map_err(|e| HttpError::bad_request(format!("Invalid status filter: {}", e))),
        }
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(self.page(), self.limit(), total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::depositmodel::DepositStatus;

    #[test]
    fn paging_defaults_and_offsets() {
        let query = ListQueryDto::default();
        assert_eq!((query.page(), query.limit(), query.offset()), (1, DEFAULT_PAGE_SIZE, 0));

        let query = ListQueryDto {
            page: Some(3),
            limit: Some(25),
            ..Default::default()
        };
        assert_eq!(query.offset(), 50);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 20, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 20, 20).total_pages, 1);
        assert_eq!(Pagination::new(1, 20, 21).total_pages, 2);
    }

    #[test]
    fn status_filter_parsing() {
        let mut query = ListQueryDto::default();
        assert_eq!(query.status::<DepositStatus>().unwrap(), None);

        query.status = Some("all".to_string());
        assert_eq!(query.status::<DepositStatus>().unwrap(), None);

        query.status = Some("Pending".to_string());
        assert_eq!(query.status::<DepositStatus>().unwrap(), Some(DepositStatus::Pending));

        query.status = Some("paid".to_string());
        assert!(query.status::<DepositStatus>().is_err());
    }

    #[test]
    fn rejects_oversized_limit() {
        let query = ListQueryDto {
            limit: Some(500),
            ..Default::default()
        };
        assert!(query.validate().is_err());
    }
}
