/// Normalization helpers shared by the source adapters

/// URL utilities
pub mod url {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use url::{form_urlencoded, Url};

    static TRACKING_PARAM: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)^(utm_|spm|from|share|mkt_|mc_)").expect("tracking param pattern")
    });

    /// True when a query key looks like campaign or referral tracking.
    pub fn is_tracking_param(key: &str) -> bool {
        TRACKING_PARAM.is_match(key)
    }

    /// Remove tracking query parameters. Remaining pairs keep their order.
    /// Input that does not parse as an absolute URL is returned unchanged.
    pub fn canonicalize(url_str: &str) -> String {
        let mut parsed = match Url::parse(url_str) {
            Ok(parsed) => parsed,
            Err(_) => return url_str.to_string(),
        };

        if parsed.query().is_some() {
            let kept: Vec<(String, String)> = parsed
                .query_pairs()
                .filter(|(key, _)| !is_tracking_param(key))
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();

            if kept.is_empty() {
                parsed.set_query(None);
            } else {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(kept)
                    .finish();
                parsed.set_query(Some(&query));
            }
        }

        parsed.to_string()
    }

    /// Validate feed URL format
    pub fn is_valid_feed_url(url_str: &str) -> bool {
        if let Ok(url) = Url::parse(url_str) {
            (url.scheme() == "http" || url.scheme() == "https") && url.host().is_some()
        } else {
            false
        }
    }
}

/// Timestamp utilities
pub mod time {
    use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

    const OFFSET_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
        "%Y-%m-%dT%H:%M:%S%z",
    ];

    const NAIVE_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
    ];

    /// Best-effort parse of the date spellings found in feeds and sitemaps.
    /// Timestamps without an offset are taken as UTC.
    pub fn parse_date_text(raw: &str) -> Option<DateTime<Utc>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
            return Some(dt.with_timezone(&Utc));
        }

        // W3C datetimes may end in a bare `Z` with no seconds.
        let zoned = match trimmed.strip_suffix('Z') {
            Some(rest) => format!("{}+00:00", rest),
            None => trimmed.to_string(),
        };
        for fmt in OFFSET_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&zoned, fmt) {
                return Some(dt.with_timezone(&Utc));
            }
        }

        for fmt in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
    }

    /// The Unix epoch, used wherever a missing timestamp has to sort last.
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::default()
    }

    /// Hours elapsed between `then` and `now`, never negative.
    pub fn age_hours(then: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let seconds = now.signed_duration_since(then).num_milliseconds() as f64 / 1000.0;
        (seconds / 3600.0).max(0.0)
    }
}

/// Text cleanup utilities
pub mod text {
    use once_cell::sync::Lazy;
    use regex::Regex;
    use sha2::{Digest, Sha256};

    static SCRIPT_BLOCK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<script.*?>.*?</script>").expect("script pattern"));
    static STYLE_BLOCK: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?is)<style.*?>.*?</style>").expect("style pattern"));
    static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));

    /// Drop script/style blocks and tags, decode entities, collapse whitespace.
    pub fn strip_html(html: &str) -> String {
        let stripped = strip_tags(html);
        collapse_whitespace(&html_escape::decode_html_entities(&stripped))
    }

    /// Like [`strip_html`] but leaves entities alone, for text a parser
    /// has already unescaped.
    pub fn strip_tags(text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let without_scripts = SCRIPT_BLOCK.replace_all(text, "");
        let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "");
        let without_tags = TAG.replace_all(&without_styles, " ");

        collapse_whitespace(&without_tags)
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Cut to at most `max_chars` characters (not bytes).
    pub fn truncate_chars(text: &str, max_chars: usize) -> String {
        text.chars().take(max_chars).collect()
    }

    /// Lowercase hex SHA-256 of `input`.
    pub fn content_id(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }
}
