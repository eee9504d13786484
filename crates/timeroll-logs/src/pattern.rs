//! File name templates with an embedded date placeholder
//!
//! A template such as `/var/log/app.%d{yyyy-MM-dd-HH}.log.gz` is split once
//! into a literal prefix, a date sub-format and a literal suffix. Rendering
//! the template for two instants and comparing the strings is how the rolling
//! policy decides whether a period boundary was crossed, so the sub-format
//! alone fixes the rotation granularity.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use std::iter::Peekable;
use std::str::Chars;
use timeroll_core::{Error, Result, TimeZoneMode, DEFAULT_DATE_FORMAT, GZIP_SUFFIX, ZIP_SUFFIX};

/// Parsed file name template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationTemplate {
    raw: String,
    prefix: String,
    date_format: String,
    strftime: String,
    suffix: String,
    time_zone: TimeZoneMode,
    /// Set when the template names its own zone with `%d{..}{UTC}`
    zone_pinned: bool,
}

impl RotationTemplate {
    /// Parse a template containing exactly one `%d` / `%date` placeholder.
    ///
    /// `%%` stands for a literal percent sign. Any other conversion, a second
    /// date placeholder or a malformed sub-format is rejected. A second brace
    /// block right after the sub-format names the time zone (`UTC`, `GMT` or
    /// `local`) and takes precedence over the configured one.
    pub fn parse(template: &str) -> Result<Self> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut date_format: Option<String> = None;
        let mut pinned_zone: Option<TimeZoneMode> = None;

        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                if date_format.is_none() {
                    prefix.push(c);
                } else {
                    suffix.push(c);
                }
                continue;
            }

            match chars.next() {
                Some('%') => {
                    if date_format.is_none() {
                        prefix.push('%');
                    } else {
                        suffix.push('%');
                    }
                }
                Some('d') => {
                    if date_format.is_some() {
                        return Err(Error::invalid_pattern(
                            template,
                            "more than one date placeholder",
                        ));
                    }

                    // long form: %date
                    let mut lookahead = chars.clone();
                    if lookahead.next() == Some('a')
                        && lookahead.next() == Some('t')
                        && lookahead.next() == Some('e')
                    {
                        chars = lookahead;
                    }

                    let mut sub_format = String::new();
                    if chars.peek() == Some(&'{') {
                        chars.next();
                        sub_format = read_braced(&mut chars).ok_or_else(|| {
                            Error::invalid_pattern(template, "unterminated '{' after date placeholder")
                        })?;

                        if chars.peek() == Some(&'{') {
                            chars.next();
                            let zone = read_braced(&mut chars).ok_or_else(|| {
                                Error::invalid_pattern(template, "unterminated '{' in time zone option")
                            })?;
                            pinned_zone = Some(parse_zone(&zone).ok_or_else(|| {
                                Error::invalid_pattern(
                                    template,
                                    format!("unsupported time zone '{}', expected UTC or local", zone),
                                )
                            })?);
                        }
                    }

                    if sub_format.trim().is_empty() {
                        sub_format = DEFAULT_DATE_FORMAT.to_string();
                    }
                    date_format = Some(sub_format);
                }
                Some(other) => {
                    return Err(Error::invalid_pattern(
                        template,
                        format!("unsupported conversion '%{}'", other),
                    ));
                }
                None => {
                    return Err(Error::invalid_pattern(template, "dangling '%' at end"));
                }
            }
        }

        let date_format = date_format.ok_or_else(|| Error::NoDateSpecifier(template.to_string()))?;
        let strftime = to_strftime(&date_format)
            .map_err(|reason| Error::invalid_pattern(template, reason))?;

        Ok(Self {
            raw: template.to_string(),
            prefix,
            date_format,
            strftime,
            suffix,
            time_zone: pinned_zone.unwrap_or_default(),
            zone_pinned: pinned_zone.is_some(),
        })
    }

    /// Render dates in the given time zone, unless the template names its own
    pub fn with_time_zone(mut self, time_zone: TimeZoneMode) -> Self {
        if !self.zone_pinned {
            self.time_zone = time_zone;
        }
        self
    }

    /// Render the template for an instant
    pub fn render(&self, instant: DateTime<Utc>) -> String {
        let date = match self.time_zone {
            TimeZoneMode::Utc => instant.format(&self.strftime).to_string(),
            TimeZoneMode::Local => instant.with_timezone(&Local).format(&self.strftime).to_string(),
        };

        let mut name = String::with_capacity(self.prefix.len() + date.len() + self.suffix.len());
        name.push_str(&self.prefix);
        name.push_str(&date);
        name.push_str(&self.suffix);
        name
    }

    /// Render the template for milliseconds since the Unix epoch
    pub fn render_millis(&self, millis: i64) -> String {
        self.render(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The date sub-format as written in the template (or the default)
    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn time_zone(&self) -> TimeZoneMode {
        self.time_zone
    }
}

/// Compression implied by the ending of a rendered file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionSuffix {
    None,
    Gzip,
    Zip,
}

impl CompressionSuffix {
    /// Detect the compression kind from a rendered name
    pub fn detect(name: &str) -> Self {
        if name.ends_with(GZIP_SUFFIX) {
            CompressionSuffix::Gzip
        } else if name.ends_with(ZIP_SUFFIX) {
            CompressionSuffix::Zip
        } else {
            CompressionSuffix::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompressionSuffix::None => "",
            CompressionSuffix::Gzip => GZIP_SUFFIX,
            CompressionSuffix::Zip => ZIP_SUFFIX,
        }
    }

    /// Length of the suffix in characters
    pub fn suffix_len(self) -> usize {
        self.as_str().len()
    }

    pub fn is_compressed(self) -> bool {
        self != CompressionSuffix::None
    }

    /// Strip the suffix to get the uncompressed base name
    pub fn strip(self, name: &str) -> &str {
        name.strip_suffix(self.as_str()).unwrap_or(name)
    }
}

/// Read up to the closing `}`; `None` when the block is unterminated
fn read_braced(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut block = String::new();
    for c in chars.by_ref() {
        if c == '}' {
            return Some(block);
        }
        block.push(c);
    }
    None
}

fn parse_zone(zone: &str) -> Option<TimeZoneMode> {
    match zone.trim() {
        z if z.eq_ignore_ascii_case("utc") || z.eq_ignore_ascii_case("gmt") => Some(TimeZoneMode::Utc),
        z if z.eq_ignore_ascii_case("local") => Some(TimeZoneMode::Local),
        _ => None,
    }
}

/// Translate a SimpleDateFormat-style pattern into a chrono strftime string
fn to_strftime(format: &str) -> std::result::Result<String, String> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }

            i += 1;
            loop {
                match chars.get(i) {
                    None => return Err(format!("unterminated quote in date format '{}'", format)),
                    Some('\'') if chars.get(i + 1) == Some(&'\'') => {
                        out.push('\'');
                        i += 2;
                    }
                    Some('\'') => {
                        i += 1;
                        break;
                    }
                    Some(&literal) => {
                        push_literal(&mut out, literal);
                        i += 1;
                    }
                }
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let mut run = 1;
        while chars.get(i + run) == Some(&c) {
            run += 1;
        }

        let directive = match (c, run) {
            ('G', _) => "AD",
            ('y', 2) => "%y",
            ('y', _) => "%Y",
            // week-based year, pairs with `w`
            ('Y', 2) => "%g",
            ('Y', _) => "%G",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', _) => "%B",
            ('d', 1) => "%-d",
            ('d', _) => "%d",
            ('D', 1) => "%-j",
            ('D', _) => "%j",
            ('H', 1) => "%-H",
            ('H', _) => "%H",
            ('h', 1) => "%-I",
            ('h', _) => "%I",
            ('m', 1) => "%-M",
            ('m', _) => "%M",
            ('s', 1) => "%-S",
            ('s', _) => "%S",
            ('S', _) => "%3f",
            ('E', 1..=3) => "%a",
            ('E', _) => "%A",
            ('a', _) => "%p",
            ('w', 1) => "%-V",
            ('w', _) => "%V",
            ('u', _) => "%u",
            ('Z', _) => "%z",
            ('z', _) => "%Z",
            ('k' | 'K', _) => {
                return Err(format!(
                    "hour letter '{}' in date format '{}' is not supported, use 'H' or 'h'",
                    c, format
                ))
            }
            ('W' | 'F', _) => {
                return Err(format!(
                    "week-of-month letter '{}' in date format '{}' is not supported, use 'w'",
                    c, format
                ))
            }
            _ => {
                return Err(format!(
                    "unsupported date letter '{}' in date format '{}'",
                    c, format
                ))
            }
        };
        out.push_str(directive);
        i += run;
    }

    if StrftimeItems::new(&out).any(|item| matches!(item, Item::Error)) {
        return Err(format!("date format '{}' cannot be rendered", format));
    }

    Ok(out)
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn parse_utc(template: &str) -> RotationTemplate {
        RotationTemplate::parse(template)
            .unwrap()
            .with_time_zone(TimeZoneMode::Utc)
    }

    #[test]
    fn test_bare_placeholder_uses_default_format() {
        let template = parse_utc("/wombat/foo.%d");
        assert_eq!(template.prefix(), "/wombat/foo.");
        assert_eq!(template.date_format(), "yyyy-MM-dd");
        assert_eq!(template.suffix(), "");
        assert_eq!(
            template.render(utc(2004, 11, 23, 10, 0, 0)),
            "/wombat/foo.2004-11-23"
        );
    }

    #[test]
    fn test_default_format_is_daily() {
        let template = parse_utc("foo.%d");
        let morning = template.render(utc(2004, 11, 23, 0, 0, 0));
        let night = template.render(utc(2004, 11, 23, 23, 59, 59));
        let next_day = template.render(utc(2004, 11, 24, 0, 0, 0));

        assert_eq!(morning, night);
        assert_ne!(night, next_day);
    }

    #[test]
    fn test_explicit_monthly_format() {
        let template = parse_utc("/wombat/foo.%d{yyyy-MM}.log");
        assert_eq!(template.suffix(), ".log");
        assert_eq!(
            template.render(utc(2004, 10, 31, 23, 59, 59)),
            "/wombat/foo.2004-10.log"
        );
        assert_eq!(
            template.render(utc(2004, 11, 1, 0, 0, 0)),
            "/wombat/foo.2004-11.log"
        );
    }

    #[test]
    fn test_hourly_format_with_quoted_literal() {
        let template = parse_utc("app-%d{yyyyMMdd'T'HH}.log");
        assert_eq!(template.render(utc(2024, 3, 5, 7, 30, 0)), "app-20240305T07.log");
        assert_ne!(
            template.render(utc(2024, 3, 5, 7, 59, 59)),
            template.render(utc(2024, 3, 5, 8, 0, 0))
        );
    }

    #[test]
    fn test_long_form_placeholder() {
        let template = parse_utc("foo.%date{yyyy}.log");
        assert_eq!(template.date_format(), "yyyy");
        assert_eq!(template.render(utc(2004, 11, 23, 0, 0, 0)), "foo.2004.log");
    }

    #[test]
    fn test_empty_braces_fall_back_to_default() {
        let template = parse_utc("foo.%d{}.log");
        assert_eq!(template.date_format(), DEFAULT_DATE_FORMAT);
    }

    #[test]
    fn test_escaped_percent() {
        let template = parse_utc("100%%-%d{yyyy}%%.log");
        assert_eq!(template.prefix(), "100%-");
        assert_eq!(template.suffix(), "%.log");
        assert_eq!(template.render(utc(2004, 1, 1, 0, 0, 0)), "100%-2004%.log");
    }

    #[test]
    fn test_percent_inside_quoted_date_literal() {
        let template = parse_utc("foo.%d{yyyy'%'MM}");
        assert_eq!(template.render(utc(2004, 2, 1, 0, 0, 0)), "foo.2004%02");
    }

    #[test]
    fn test_missing_placeholder() {
        let err = RotationTemplate::parse("foo.log").unwrap_err();
        assert!(matches!(err, Error::NoDateSpecifier(ref p) if p == "foo.log"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_escaped_percent_is_not_a_placeholder() {
        let err = RotationTemplate::parse("foo.%%d").unwrap_err();
        assert!(matches!(err, Error::NoDateSpecifier(_)));
    }

    #[test]
    fn test_second_placeholder_rejected() {
        let err = RotationTemplate::parse("%d/foo.%d").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }

    #[test]
    fn test_unknown_conversion_rejected() {
        let err = RotationTemplate::parse("foo.%i.%d").unwrap_err();
        assert!(err.to_string().contains("'%i'"));
    }

    #[test]
    fn test_unterminated_brace_rejected() {
        assert!(matches!(
            RotationTemplate::parse("foo.%d{yyyy"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_dangling_percent_rejected() {
        assert!(matches!(
            RotationTemplate::parse("foo.%d.%"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_unsupported_date_letter_rejected() {
        let err = RotationTemplate::parse("foo.%d{yyyy-qq}").unwrap_err();
        assert!(err.to_string().contains("'q'"));
    }

    #[test]
    fn test_unterminated_quote_rejected() {
        assert!(RotationTemplate::parse("foo.%d{yyyy'T}").is_err());
    }

    #[test]
    fn test_strftime_translation() {
        assert_eq!(to_strftime("yyyy-MM-dd").unwrap(), "%Y-%m-%d");
        assert_eq!(to_strftime("yy.M.d").unwrap(), "%y.%-m.%-d");
        assert_eq!(to_strftime("HH:mm:ss.SSS").unwrap(), "%H:%M:%S.%3f");
        assert_eq!(to_strftime("EEE MMM").unwrap(), "%a %b");
        assert_eq!(to_strftime("EEEE MMMM").unwrap(), "%A %B");
        assert_eq!(to_strftime("''yyyy''").unwrap(), "'%Y'");
        assert_eq!(to_strftime("'week'ww").unwrap(), "week%V");
        assert_eq!(to_strftime("YYYY-ww").unwrap(), "%G-%V");
        assert_eq!(to_strftime("YY'w'w").unwrap(), "%gw%-V");
        assert_eq!(to_strftime("G yyyy").unwrap(), "AD %Y");
    }

    #[test]
    fn test_weekly_format_crosses_year_once() {
        let template = parse_utc("foo.%d{YYYY-ww}");
        let names: Vec<String> = [(2004, 12, 31), (2005, 1, 1), (2005, 1, 2), (2005, 1, 3)]
            .iter()
            .map(|&(y, mo, d)| template.render(utc(y, mo, d, 12, 0, 0)))
            .collect();

        assert_eq!(names, ["foo.2004-53", "foo.2004-53", "foo.2004-53", "foo.2005-01"]);
        let boundaries = names.windows(2).filter(|pair| pair[0] != pair[1]).count();
        assert_eq!(boundaries, 1);
    }

    #[test]
    fn test_unsupported_hour_and_week_letters_explained() {
        let err = RotationTemplate::parse("foo.%d{yyyy-MM-dd-kk}").unwrap_err();
        assert!(err.to_string().contains("use 'H' or 'h'"));

        let err = RotationTemplate::parse("foo.%d{yyyy-MM-W}").unwrap_err();
        assert!(err.to_string().contains("use 'w'"));
    }

    #[test]
    fn test_time_zone_option_after_format() {
        let template = RotationTemplate::parse("foo.%d{yyyy-MM-dd}{UTC}.log").unwrap();
        assert_eq!(template.suffix(), ".log");
        assert_eq!(template.time_zone(), TimeZoneMode::Utc);
        assert_eq!(template.render(utc(2004, 11, 23, 23, 30, 0)), "foo.2004-11-23.log");

        let template = RotationTemplate::parse("foo.%d{}{local}").unwrap();
        assert_eq!(template.date_format(), DEFAULT_DATE_FORMAT);
        assert_eq!(template.time_zone(), TimeZoneMode::Local);
    }

    #[test]
    fn test_time_zone_option_overrides_configured_zone() {
        let template = RotationTemplate::parse("foo.%d{yyyy}{GMT}")
            .unwrap()
            .with_time_zone(TimeZoneMode::Local);
        assert_eq!(template.time_zone(), TimeZoneMode::Utc);
        assert_eq!(template.suffix(), "");
    }

    #[test]
    fn test_unknown_time_zone_option_rejected() {
        let err = RotationTemplate::parse("foo.%d{yyyy}{America/New_York}").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert!(err.to_string().contains("America/New_York"));

        assert!(matches!(
            RotationTemplate::parse("foo.%d{yyyy}{UTC"),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_render_millis() {
        let template = parse_utc("foo.%d{yyyy-MM-dd HH:mm:ss}");
        let millis = utc(2004, 11, 23, 12, 34, 56).timestamp_millis();
        assert_eq!(template.render_millis(millis), "foo.2004-11-23 12:34:56");
    }

    #[test]
    fn test_compression_detection() {
        assert_eq!(CompressionSuffix::detect("foo.2004-11-23.gz"), CompressionSuffix::Gzip);
        assert_eq!(CompressionSuffix::detect("foo.2004-11-23.zip"), CompressionSuffix::Zip);
        assert_eq!(CompressionSuffix::detect("foo.2004-11-23.log"), CompressionSuffix::None);
        assert_eq!(CompressionSuffix::Gzip.suffix_len(), 3);
        assert_eq!(CompressionSuffix::Zip.suffix_len(), 4);
        assert_eq!(CompressionSuffix::None.suffix_len(), 0);
    }

    #[test]
    fn test_strip_then_append_reproduces_render() {
        for raw in ["foo.%d.gz", "logs/%d{yyyy-MM}/app.log.zip"] {
            let template = parse_utc(raw);
            for day in 1..=28 {
                let rendered = template.render(utc(2004, 2, day, 12, 0, 0));
                let suffix = CompressionSuffix::detect(&rendered);
                assert!(suffix.is_compressed());

                let base = suffix.strip(&rendered);
                assert_eq!(base.len(), rendered.len() - suffix.suffix_len());
                assert_eq!(format!("{}{}", base, suffix.as_str()), rendered);
            }
        }
    }

    #[test]
    fn test_strip_without_suffix_is_identity() {
        assert_eq!(CompressionSuffix::None.strip("foo.2004-11-23"), "foo.2004-11-23");
        assert_eq!(CompressionSuffix::Gzip.strip("foo.log"), "foo.log");
    }
}
