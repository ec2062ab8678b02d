//! Upload validation and storage key layout.

use uuid::Uuid;

use crate::error::MarketError;

pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// What an uploaded file belongs to. Determines the first path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Profile,
    Product,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profiles",
            Self::Product => "products",
        }
    }
}

/// Lower-cased extension of `filename`, if it is an allowed image type.
pub fn image_extension(filename: &str) -> Result<String, MarketError> {
    let (stem, ext) = filename
        .rsplit_once('.')
        .ok_or(MarketError::InvalidFileType)?;
    let ext = ext.to_ascii_lowercase();
    if stem.is_empty() || !ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(MarketError::InvalidFileType);
    }
    Ok(ext)
}

/// Relative key `{kind}/{owner_id}/{uuid}.{ext}`.
pub fn storage_key(kind: UploadKind, owner_id: Uuid, ext: &str) -> String {
    format!("{}/{owner_id}/{}.{ext}", kind.as_str(), Uuid::now_v7())
}

pub fn check_size(len: usize, max: usize) -> Result<(), MarketError> {
    if len > max {
        return Err(MarketError::FileTooLarge);
    }
    if len == 0 {
        return Err(MarketError::MissingData);
    }
    Ok(())
}
