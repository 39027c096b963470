//! First-frame inspection: capture date and oriented dimensions.
//!
//! Callers treat every failure here as "unknown"; nothing in this module is
//! required for a render to proceed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};

use lapse_common::error::{LapseError, LapseResult};

use crate::options::Orientation;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Dimensions of a source frame as it displays (EXIF rotation applied).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SourceDimensions {
    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }

    /// Warning text when the frame orientation differs from the output.
    pub fn orientation_mismatch(&self, output: Orientation) -> Option<&'static str> {
        match (output.is_vertical(), self.is_vertical()) {
            (true, false) => Some(
                "Output is vertical but source images are landscape. This is allowed (will crop/pad/scale per --aspect-mode), but edges may be lost.",
            ),
            (false, true) => Some(
                "Output is landscape but source images are vertical. This is allowed, but edges may be lost depending on --aspect-mode.",
            ),
            _ => None,
        }
    }
}

fn read_exif(path: &Path) -> LapseResult<Option<exif::Exif>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(Some(exif)),
        Err(exif::Error::NotFound(_)) => Ok(None),
        Err(e) => Err(LapseError::probe(format!(
            "Failed to read EXIF from {}: {e}",
            path.display()
        ))),
    }
}

/// `DateTimeOriginal` of `path` as a calendar date, if present.
pub fn read_capture_date(path: &Path) -> LapseResult<Option<NaiveDate>> {
    let Some(exif) = read_exif(path)? else {
        return Ok(None);
    };

    let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) else {
        return Ok(None);
    };

    let raw = match &field.value {
        Value::Ascii(values) => values.first(),
        _ => None,
    }
    .ok_or_else(|| LapseError::probe("DateTimeOriginal is not an ASCII value"))?;

    let text = std::str::from_utf8(raw)
        .map_err(|e| LapseError::probe(format!("DateTimeOriginal is not UTF-8: {e}")))?;

    parse_exif_datetime(text).map(Some)
}

fn parse_exif_datetime(text: &str) -> LapseResult<NaiveDate> {
    let trimmed = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_DATETIME_FORMAT)
        .map(|dt| dt.date())
        .map_err(|e| LapseError::probe(format!("Unparseable EXIF date '{trimmed}': {e}")))
}

/// Pixel dimensions of `path`, swapped when the EXIF orientation rotates
/// the image by 90 or 270 degrees.
pub fn read_oriented_dimensions(path: &Path) -> LapseResult<SourceDimensions> {
    let (width, height) = image::image_dimensions(path).map_err(|e| {
        LapseError::probe(format!("Failed to read size of {}: {e}", path.display()))
    })?;

    // Orientation is optional metadata; a missing or broken EXIF block
    // leaves the stored dimensions as they are.
    let orientation = read_exif(path)
        .ok()
        .flatten()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        });

    let rotated = matches!(orientation, Some(5..=8));
    let dims = if rotated {
        SourceDimensions {
            width: height,
            height: width,
        }
    } else {
        SourceDimensions { width, height }
    };

    tracing::debug!(
        width = dims.width,
        height = dims.height,
        exif_orientation = ?orientation,
        "Image dimensions found"
    );
    Ok(dims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::experimental::Writer;
    use exif::Field;

    /// Encode a black JPEG and splice an EXIF APP1 segment after SOI.
    fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, fields: &[Field]) {
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height))
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let mut writer = Writer::new();
        for field in fields {
            writer.push_field(field);
        }
        let mut tiff = std::io::Cursor::new(Vec::new());
        writer.write(&mut tiff, false).unwrap();
        let tiff = tiff.into_inner();

        let mut out = jpeg[..2].to_vec();
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
        out.extend_from_slice(b"Exif\0\0");
        out.extend_from_slice(&tiff);
        out.extend_from_slice(&jpeg[2..]);
        std::fs::write(path, out).unwrap();
    }

    fn date_field(text: &str) -> Field {
        Field {
            tag: Tag::DateTimeOriginal,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![text.as_bytes().to_vec()]),
        }
    }

    fn orientation_field(orientation: u16) -> Field {
        Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![orientation]),
        }
    }

    #[test]
    fn test_parse_exif_datetime() {
        let date = parse_exif_datetime("2024:02:29 23:59:01").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let padded = parse_exif_datetime("2023:12:01 00:00:00\0").unwrap();
        assert_eq!(padded, NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());

        assert!(parse_exif_datetime("0000:00:00 00:00:00").is_err());
        assert!(parse_exif_datetime("yesterday").is_err());
    }

    #[test]
    fn test_orientation_mismatch() {
        let landscape = SourceDimensions {
            width: 6000,
            height: 4000,
        };
        let portrait = SourceDimensions {
            width: 4000,
            height: 6000,
        };
        assert!(landscape
            .orientation_mismatch(Orientation::Vertical)
            .is_some());
        assert!(landscape
            .orientation_mismatch(Orientation::Landscape)
            .is_none());
        assert!(portrait
            .orientation_mismatch(Orientation::Landscape)
            .is_some());
        assert!(portrait.orientation_mismatch(Orientation::Vertical).is_none());
    }

    #[test]
    fn test_dimensions_of_plain_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbImage::new(6, 4).save(&path).unwrap();

        let dims = read_oriented_dimensions(&path).unwrap();
        assert_eq!(
            dims,
            SourceDimensions {
                width: 6,
                height: 4
            }
        );
        assert!(matches!(read_capture_date(&path), Ok(None)));
    }

    #[test]
    fn test_capture_date_and_rotated_dimensions_from_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DSCF0001.JPG");
        write_jpeg_with_exif(
            &path,
            60,
            40,
            &[date_field("2024:03:09 21:15:00"), orientation_field(6)],
        );

        assert_eq!(
            read_capture_date(&path).unwrap(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap())
        );
        let dims = read_oriented_dimensions(&path).unwrap();
        assert_eq!(
            dims,
            SourceDimensions {
                width: 40,
                height: 60
            }
        );
        assert!(dims.is_vertical());
        assert!(dims.orientation_mismatch(Orientation::Landscape).is_some());
    }

    #[test]
    fn test_upside_down_orientation_keeps_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DSCF0002.JPG");
        write_jpeg_with_exif(&path, 60, 40, &[orientation_field(3)]);

        assert_eq!(
            read_oriented_dimensions(&path).unwrap(),
            SourceDimensions {
                width: 60,
                height: 40
            }
        );
        assert_eq!(read_capture_date(&path).unwrap(), None);
    }

    #[test]
    fn test_every_transposing_orientation_swaps() {
        let dir = tempfile::tempdir().unwrap();
        for orientation in 5..=8u16 {
            let path = dir.path().join(format!("rot{orientation}.jpg"));
            write_jpeg_with_exif(&path, 60, 40, &[orientation_field(orientation)]);
            let dims = read_oriented_dimensions(&path).unwrap();
            assert_eq!((dims.width, dims.height), (40, 60), "orientation {orientation}");
        }
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let missing = Path::new("/no/such/frame.jpg");
        assert!(read_oriented_dimensions(missing).is_err());
        assert!(read_capture_date(missing).is_err());
    }
}
