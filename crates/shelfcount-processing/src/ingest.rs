//! Image payload decoding
//!
//! Payloads arrive either as bare base64 or as a `data:` URI. The MIME type of the result
//! comes from the file name hint alone; the bytes are never sniffed.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use shelfcount_core::models::MediaPayload;
use shelfcount_core::AppError;

const DATA_URI_PREFIX: &str = "data:";
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

const PADDING_INDIFFERENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while decoding a payload
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("data URI has no ',' separator")]
    MissingDataSeparator,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        AppError::InvalidEncoding(err.to_string())
    }
}

/// MIME type for a file name, keyed on its lowercased suffix.
pub fn content_type_for_name(file_name: &str) -> &'static str {
    let lower = file_name.to_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else if lower.ends_with(".webp") {
        "image/webp"
    } else {
        DEFAULT_CONTENT_TYPE
    }
}

/// Media type declared by a data URI, e.g. `image/png` for `data:image/png;base64,...`.
pub fn data_uri_media_type(encoded: &str) -> Option<&str> {
    let header = encoded.trim_start().strip_prefix(DATA_URI_PREFIX)?;
    let header = &header[..header.find(',')?];
    let media_type = header.split(';').next().unwrap_or_default().trim();
    (!media_type.is_empty()).then_some(media_type)
}

/// File extension (without dot) conventionally used for an image media type.
pub fn extension_for_media_type(media_type: &str) -> &'static str {
    match media_type.to_lowercase().as_str() {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}

/// Decodes transport-encoded images.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaIngestor;

impl MediaIngestor {
    pub fn new() -> Self {
        Self
    }

    /// Decode `encoded` into a payload named `file_name_hint`.
    pub fn ingest(&self, encoded: &str, file_name_hint: &str) -> Result<MediaPayload, IngestError> {
        let bytes = Self::decode(encoded)?;
        let content_type = content_type_for_name(file_name_hint);

        tracing::debug!(
            file_name = %file_name_hint,
            content_type = %content_type,
            size_bytes = bytes.len(),
            "Decoded image payload"
        );

        Ok(MediaPayload::new(bytes, content_type, file_name_hint))
    }

    /// Raw bytes of a bare base64 string or a data URI.
    pub fn decode(encoded: &str) -> Result<Vec<u8>, IngestError> {
        let trimmed = encoded.trim();
        let body = match trimmed.strip_prefix(DATA_URI_PREFIX) {
            Some(rest) => {
                let comma = rest.find(',').ok_or(IngestError::MissingDataSeparator)?;
                &rest[comma + 1..]
            }
            None => trimmed,
        };

        // Browsers and mail clients wrap long base64 lines.
        let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        Ok(PADDING_INDIFFERENT.decode(compact.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8/5+hHgAHggJ/PchI7wAAAABJRU5ErkJggg==";

    #[test]
    fn test_data_uri_and_bare_base64_decode_identically() {
        let ingestor = MediaIngestor::new();
        let bare = ingestor.ingest(PIXEL_PNG, "a.png").unwrap();
        let uri = ingestor
            .ingest(&format!("data:image/png;base64,{}", PIXEL_PNG), "a.png")
            .unwrap();
        assert_eq!(bare.bytes(), uri.bytes());
        assert_eq!(&bare.bytes()[1..4], b"PNG");
    }

    #[test]
    fn test_content_type_comes_from_name() {
        let ingestor = MediaIngestor::new();
        let payload = ingestor
            .ingest(&format!("data:image/png;base64,{}", PIXEL_PNG), "photo.JPG")
            .unwrap();
        assert_eq!(payload.content_type(), "image/jpeg");
        assert_eq!(payload.file_name(), "photo.JPG");

        assert_eq!(content_type_for_name("x.PNG"), "image/png");
        assert_eq!(content_type_for_name("x.gif"), "image/gif");
        assert_eq!(content_type_for_name("x.webp"), "image/webp");
        assert_eq!(content_type_for_name("x.bmp"), "image/jpeg");
        assert_eq!(content_type_for_name("noext"), "image/jpeg");
    }

    #[test]
    fn test_missing_padding_and_whitespace_accepted() {
        let unpadded = PIXEL_PNG.trim_end_matches('=');
        let wrapped = format!("{}\n{}", &unpadded[..20], &unpadded[20..]);
        assert_eq!(
            MediaIngestor::decode(&wrapped).unwrap(),
            MediaIngestor::decode(PIXEL_PNG).unwrap()
        );
    }

    #[test]
    fn test_invalid_payloads() {
        assert!(matches!(
            MediaIngestor::decode("data:image/png;base64"),
            Err(IngestError::MissingDataSeparator)
        ));
        assert!(matches!(
            MediaIngestor::decode("not base64!!"),
            Err(IngestError::InvalidBase64(_))
        ));

        let app: AppError = IngestError::MissingDataSeparator.into();
        assert!(matches!(app, AppError::InvalidEncoding(_)));
    }

    #[test]
    fn test_data_uri_media_type() {
        assert_eq!(data_uri_media_type("data:image/webp;base64,AAAA"), Some("image/webp"));
        assert_eq!(data_uri_media_type("data:,AAAA"), None);
        assert_eq!(data_uri_media_type("AAAA"), None);
        assert_eq!(extension_for_media_type("image/PNG"), "png");
        assert_eq!(extension_for_media_type("image/jpeg"), "jpg");
    }
}
