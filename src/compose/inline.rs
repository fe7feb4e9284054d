use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::api::models::LocalFile;
use crate::error::{AppError, AppResult};

pub const MAX_INLINE_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Encodes an image as a `data:` URL suitable for embedding in the body.
pub fn data_url(file: &LocalFile) -> AppResult<String> {
    if !file.mime_type.starts_with("image/") {
        return Err(AppError::Validation(format!(
            "{} is not an image",
            file.name
        )));
    }
    if file.size() > MAX_INLINE_IMAGE_BYTES {
        return Err(AppError::Validation(format!(
            "inline images must be under {} MB: {}",
            MAX_INLINE_IMAGE_BYTES / (1024 * 1024),
            file.name
        )));
    }

    Ok(format!(
        "data:{};base64,{}",
        file.mime_type,
        STANDARD.encode(&file.data)
    ))
}

pub fn image_tag(file: &LocalFile) -> AppResult<String> {
    let src = data_url(file)?;
    let alt = html_escape::encode_double_quoted_attribute(&file.name);
    Ok(format!(
        r#"<img src="{src}" alt="{alt}" style="max-width: 100%; height: auto;">"#
    ))
}
