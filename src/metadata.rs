//! The encoded-filename metadata record.
//!
//! Surveillance frames and videos share one filename encoding:
//! `<box>_<cam>_<YYYY-MM-DD>_<HH-MM-SS>` as the first four
//! underscore-delimited segments of the stem; trailing segments are ignored.
//! That encoding couples the classifier, the discovery filters, and
//! timestamp reconstruction, so it is parsed in exactly one place,
//! [`FrameStamp::parse`], and consumed everywhere else as a typed value.
//!
//! Parsing never guesses: a malformed segment fails the whole operation
//! rather than silently defaulting, since a wrong guess would misplace or
//! mislabel data.

use std::{fmt, path::Path, str::FromStr};

use chrono::{Datelike, NaiveDateTime, TimeDelta, Timelike};

use crate::error::FramesiftError;

/// strftime-style format of the date-time portion of the encoding.
pub const ENCODED_DATE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// A metadata field that frames can be bucketed or filtered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortKey {
    /// Recording box identifier (first segment).
    Box,
    /// Camera identifier within the box (second segment).
    Cam,
    /// Year of the encoded date.
    Year,
    /// Month of the encoded date.
    Month,
    /// Day of the encoded date.
    Day,
    /// Hour of the encoded time.
    Hour,
    /// Minute of the encoded time.
    Minute,
    /// Second of the encoded time.
    Second,
}

impl SortKey {
    /// All keys, in encoding order.
    pub const ALL: [SortKey; 8] = [
        SortKey::Box,
        SortKey::Cam,
        SortKey::Year,
        SortKey::Month,
        SortKey::Day,
        SortKey::Hour,
        SortKey::Minute,
        SortKey::Second,
    ];

    /// The lowercase token naming this key, as accepted on the command line
    /// and used as the bucket-name prefix.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Box => "box",
            SortKey::Cam => "cam",
            SortKey::Year => "year",
            SortKey::Month => "month",
            SortKey::Day => "day",
            SortKey::Hour => "hour",
            SortKey::Minute => "minute",
            SortKey::Second => "second",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = FramesiftError;

    /// An unrecognized token is a hard error; classification never silently
    /// drops a mode.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "box" => Ok(SortKey::Box),
            "cam" => Ok(SortKey::Cam),
            "year" => Ok(SortKey::Year),
            "month" => Ok(SortKey::Month),
            "day" => Ok(SortKey::Day),
            "hour" => Ok(SortKey::Hour),
            "minute" => Ok(SortKey::Minute),
            "second" => Ok(SortKey::Second),
            other => Err(FramesiftError::UnknownSortKey(other.to_string())),
        }
    }
}

/// Typed view of one encoded filename.
///
/// Produced by [`FrameStamp::parse`] / [`FrameStamp::from_path`]; consumed
/// by bucket naming, discovery filters, and timestamp reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStamp {
    /// Recording box identifier.
    pub box_id: u32,
    /// Camera identifier.
    pub cam_id: u32,
    /// Encoded wall-clock date and time.
    pub taken_at: NaiveDateTime,
}

impl FrameStamp {
    /// Parse the first four segments of a filename stem.
    ///
    /// Trailing segments beyond the fourth are ignored. Any malformed
    /// segment fails with [`FramesiftError::MalformedName`].
    pub fn parse(stem: &str) -> Result<Self, FramesiftError> {
        let malformed = |reason: &str| FramesiftError::MalformedName {
            name: stem.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = stem.split('_');
        let box_segment = segments.next().ok_or_else(|| malformed("empty name"))?;
        let cam_segment = segments
            .next()
            .ok_or_else(|| malformed("missing cam segment"))?;
        let date_segment = segments
            .next()
            .ok_or_else(|| malformed("missing date segment"))?;
        let time_segment = segments
            .next()
            .ok_or_else(|| malformed("missing time segment"))?;

        let box_id: u32 = box_segment
            .parse()
            .map_err(|_| malformed("box segment is not an integer"))?;
        let cam_id: u32 = cam_segment
            .parse()
            .map_err(|_| malformed("cam segment is not an integer"))?;

        let encoded = format!("{date_segment}_{time_segment}");
        let taken_at = NaiveDateTime::parse_from_str(&encoded, ENCODED_DATE_TIME_FORMAT)
            .map_err(|_| malformed("date/time segments do not match YYYY-MM-DD_HH-MM-SS"))?;

        Ok(Self {
            box_id,
            cam_id,
            taken_at,
        })
    }

    /// Parse a stamp from a file path's stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FramesiftError> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| FramesiftError::MalformedName {
                name: path.display().to_string(),
                reason: "path has no UTF-8 file stem".to_string(),
            })?;
        Self::parse(stem)
    }

    /// Numeric value of one metadata field, for filter comparison.
    pub fn field(&self, key: SortKey) -> u32 {
        match key {
            SortKey::Box => self.box_id,
            SortKey::Cam => self.cam_id,
            SortKey::Year => self.taken_at.year() as u32,
            SortKey::Month => self.taken_at.month(),
            SortKey::Day => self.taken_at.day(),
            SortKey::Hour => self.taken_at.hour(),
            SortKey::Minute => self.taken_at.minute(),
            SortKey::Second => self.taken_at.second(),
        }
    }

    /// Stable bucket name for one metadata field, `"<key>_<value>"`.
    ///
    /// Date and time components are zero-padded exactly as the filename
    /// encoding writes them, so bucket text matches the raw filename slice
    /// for every well-formed name.
    pub fn bucket(&self, key: SortKey) -> String {
        match key {
            SortKey::Box => format!("box_{}", self.box_id),
            SortKey::Cam => format!("cam_{}", self.cam_id),
            SortKey::Year => format!("year_{:04}", self.taken_at.year()),
            SortKey::Month => format!("month_{:02}", self.taken_at.month()),
            SortKey::Day => format!("day_{:02}", self.taken_at.day()),
            SortKey::Hour => format!("hour_{:02}", self.taken_at.hour()),
            SortKey::Minute => format!("minute_{:02}", self.taken_at.minute()),
            SortKey::Second => format!("second_{:02}", self.taken_at.second()),
        }
    }

    /// A copy of this stamp advanced by a whole number of seconds.
    pub fn advanced_by(&self, seconds: i64) -> FrameStamp {
        FrameStamp {
            taken_at: self.taken_at + TimeDelta::seconds(seconds),
            ..*self
        }
    }

    /// Re-encode this stamp into the shared filename encoding (no extension).
    pub fn encoded_stem(&self) -> String {
        format!(
            "{}_{}_{}",
            self.box_id,
            self.cam_id,
            self.taken_at.format(ENCODED_DATE_TIME_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let stamp = FrameStamp::parse("3_2_2023-07-17_10-00-00").unwrap();
        assert_eq!(stamp.box_id, 3);
        assert_eq!(stamp.cam_id, 2);
        assert_eq!(stamp.field(SortKey::Year), 2023);
        assert_eq!(stamp.field(SortKey::Month), 7);
        assert_eq!(stamp.field(SortKey::Day), 17);
        assert_eq!(stamp.field(SortKey::Hour), 10);
        assert_eq!(stamp.field(SortKey::Minute), 0);
        assert_eq!(stamp.field(SortKey::Second), 0);
    }

    #[test]
    fn trailing_segments_are_ignored() {
        let stamp = FrameStamp::parse("3_2_2023-07-17_10-00-00_42").unwrap();
        assert_eq!(stamp.field(SortKey::Second), 0);
    }

    #[test]
    fn from_path_uses_the_stem() {
        let stamp = FrameStamp::from_path("frames/5_1_2024-01-02_03-04-05.jpg").unwrap();
        assert_eq!(stamp.box_id, 5);
        assert_eq!(stamp.field(SortKey::Second), 5);
    }

    #[test]
    fn malformed_segments_fail() {
        assert!(matches!(
            FrameStamp::parse("abc_2_2023-07-17_10-00-00"),
            Err(FramesiftError::MalformedName { .. })
        ));
        assert!(matches!(
            FrameStamp::parse("3_2_garbage_10-00-00"),
            Err(FramesiftError::MalformedName { .. })
        ));
        assert!(matches!(
            FrameStamp::parse("3_2"),
            Err(FramesiftError::MalformedName { .. })
        ));
    }

    #[test]
    fn buckets_are_zero_padded_like_the_encoding() {
        let stamp = FrameStamp::parse("12_3_2023-07-05_08-09-01").unwrap();
        assert_eq!(stamp.bucket(SortKey::Box), "box_12");
        assert_eq!(stamp.bucket(SortKey::Month), "month_07");
        assert_eq!(stamp.bucket(SortKey::Day), "day_05");
        assert_eq!(stamp.bucket(SortKey::Second), "second_01");
    }

    #[test]
    fn advance_and_reencode_round_trips() {
        let stamp = FrameStamp::parse("3_2_2023-07-17_10-00-00").unwrap();
        let later = stamp.advanced_by(30);
        assert_eq!(later.encoded_stem(), "3_2_2023-07-17_10-00-30");

        // Crossing a day boundary rolls the date forward.
        let next_day = stamp.advanced_by(24 * 60 * 60);
        assert_eq!(next_day.encoded_stem(), "3_2_2023-07-18_10-00-00");
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        assert!(matches!(
            "week".parse::<SortKey>(),
            Err(FramesiftError::UnknownSortKey(_))
        ));
        assert_eq!("month".parse::<SortKey>().unwrap(), SortKey::Month);
    }
}
