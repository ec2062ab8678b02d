pub mod account;
pub mod audit;
pub mod broadcast;
pub mod cart;
pub mod category;
pub mod chat;
pub mod moderation;
pub mod order;
pub mod page;
pub mod product;
pub mod review;
pub mod store;
pub mod subscription;
pub mod unlock;

use axum::extract::Multipart;
use axum::http::StatusCode;
use serde::Deserialize;

use cmse_domain::pagination::PageRequest;

use crate::error::MarketError;

/// `?per-page=&page=` accepted by every list endpoint.
#[derive(Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct ListQuery {
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl ListQuery {
    pub fn page_request(&self) -> PageRequest {
        let default = PageRequest::default();
        PageRequest {
            per_page: self.per_page.unwrap_or(default.per_page),
            page: self.page.unwrap_or(default.page),
        }
        .clamped()
    }
}

/// A single uploaded file.
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart field named `file`. Other fields are skipped.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, MarketError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Err(MarketError::MissingData)
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> MarketError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        MarketError::FileTooLarge
    } else {
        MarketError::InvalidInput("malformed multipart body")
    }
}
