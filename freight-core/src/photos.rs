//! Storage codec for a truck's photo list.
//!
//! Photos live in a single text column as a comma-joined string. The codec
//! does not escape: a URL that itself contains a comma is split apart on
//! reload. Writers go through [`validate`] to keep such URLs out of storage.

use crate::error::ValidationError;

pub const DELIMITER: &str = ",";

/// Join photo URLs into the stored representation. `None` encodes as `""`.
pub fn encode(photos: Option<&[String]>) -> String {
    photos
        .map(|p| p.join(DELIMITER))
        .unwrap_or_default()
}

/// Split a stored value back into photo URLs, dropping empty segments.
/// Never fails; absent or delimiter-only input yields an empty list.
pub fn decode(stored: Option<&str>) -> Vec<String> {
    match stored {
        None | Some("") => Vec::new(),
        Some(s) => s
            .split(DELIMITER)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .collect(),
    }
}

/// Reject URLs that would not survive an encode/decode round trip: blank
/// entries are dropped on reload and embedded commas split one URL into many.
pub fn validate(photos: &[String]) -> Result<(), ValidationError> {
    for url in photos {
        if url.trim().is_empty() {
            return Err(ValidationError::Empty { field: "photos" });
        }
        if url.contains(DELIMITER) {
            return Err(ValidationError::PhotoContainsDelimiter(url.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_joins_in_order() {
        let photos = owned(&["a.jpg", "b.jpg"]);
        assert_eq!(encode(Some(photos.as_slice())), "a.jpg,b.jpg");
    }

    #[test]
    fn test_encode_absent_and_empty() {
        assert_eq!(encode(None), "");
        assert_eq!(encode(Some(&[][..])), "");
    }

    #[test]
    fn test_decode_splits_in_order() {
        assert_eq!(decode(Some("a.jpg,b.jpg")), owned(&["a.jpg", "b.jpg"]));
    }

    #[test]
    fn test_decode_empty_is_never_absent() {
        assert!(decode(Some("")).is_empty());
        assert!(decode(None).is_empty());
        assert!(decode(Some(encode(Some(&[][..])).as_str())).is_empty());
    }

    #[test]
    fn test_decode_drops_empty_segments() {
        assert!(decode(Some(",,,")).is_empty());
        assert_eq!(
            decode(Some(",front.jpg,,rear.jpg,")),
            owned(&["front.jpg", "rear.jpg"])
        );
    }

    #[test]
    fn test_round_trip_without_commas() {
        let photos = owned(&[
            "https://cdn.example.com/trucks/1/front.jpg",
            "https://cdn.example.com/trucks/1/side.jpg?w=640",
            "rear.png",
        ]);
        assert_eq!(decode(Some(encode(Some(photos.as_slice())).as_str())), photos);
    }

    #[test]
    fn test_round_trip_breaks_on_embedded_comma() {
        let photos = owned(&["https://cdn.example.com/img?crop=0,0,640,480"]);
        let reloaded = decode(Some(encode(Some(photos.as_slice())).as_str()));
        assert_ne!(reloaded, photos);
        assert_eq!(reloaded.len(), 4);
    }

    #[test]
    fn test_validate_rejects_embedded_comma() {
        assert!(validate(&owned(&["a.jpg", "b.jpg"])).is_ok());
        assert_eq!(
            validate(&owned(&["a.jpg", "b,c.jpg"])),
            Err(ValidationError::PhotoContainsDelimiter("b,c.jpg".to_string()))
        );
    }

    #[test]
    fn test_validate_rejects_blank_entries() {
        let photos = owned(&["", "a.jpg"]);
        assert_eq!(decode(Some(encode(Some(photos.as_slice())).as_str())), owned(&["a.jpg"]));
        assert_eq!(validate(&photos), Err(ValidationError::Empty { field: "photos" }));
        assert_eq!(
            validate(&owned(&["a.jpg", "   "])),
            Err(ValidationError::Empty { field: "photos" })
        );
    }
}
