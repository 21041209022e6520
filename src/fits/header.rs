//! Keyword access over the cards parsed by `fitsio-pure`.

use fitsio_pure::header::Card;
use fitsio_pure::value::Value;

/// Structural keywords hidden from the header summary.
const STRUCTURAL_KEYWORDS: [&str; 3] = ["SIMPLE", "BITPIX", "EXTEND"];

/// Display form of a header value.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Logical(true) => "T".to_string(),
        Value::Logical(false) => "F".to_string(),
        Value::Integer(n) => n.to_string(),
        Value::Float(x) => x.to_string(),
        Value::String(s) => s.clone(),
        Value::ComplexInt(re, im) => format!("({}, {})", re, im),
        Value::ComplexFloat(re, im) => format!("({}, {})", re, im),
    }
}

/// The header of one HDU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    /// Wrap parsed cards.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// All cards in file order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Value of the first card carrying `keyword`.
    pub fn get(&self, keyword: &str) -> Option<&Value> {
        self.cards
            .iter()
            .filter(|c| c.keyword_str() == keyword)
            .find_map(|c| c.value.as_ref())
    }

    /// Returns `true` if any card carries `keyword` with a value.
    pub fn contains(&self, keyword: &str) -> bool {
        self.get(keyword).is_some()
    }

    /// String value, trailing blanks removed.
    pub fn get_str(&self, keyword: &str) -> Option<&str> {
        match self.get(keyword)? {
            Value::String(s) => Some(s.trim_end()),
            _ => None,
        }
    }

    /// Integer value; reals with an integral value are accepted.
    pub fn get_i64(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword)? {
            Value::Integer(n) => Some(*n),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => Some(*x as i64),
            _ => None,
        }
    }

    /// Non-negative integer value as `usize`.
    pub fn get_usize(&self, keyword: &str) -> Option<usize> {
        self.get_i64(keyword).and_then(|n| usize::try_from(n).ok())
    }

    /// Numeric value; integers are widened.
    pub fn get_f64(&self, keyword: &str) -> Option<f64> {
        match self.get(keyword)? {
            Value::Float(x) => Some(*x),
            Value::Integer(n) => Some(*n as f64),
            // Some writers quote numbers
            Value::String(s) => s.trim().replace(['D', 'd'], "E").parse().ok(),
            _ => None,
        }
    }

    /// Logical value.
    pub fn get_bool(&self, keyword: &str) -> Option<bool> {
        match self.get(keyword)? {
            Value::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// Text of all commentary cards with the given keyword.
    pub fn commentary<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.cards
            .iter()
            .filter(move |c| c.is_commentary() && c.keyword_str() == keyword)
            .filter_map(|c| c.comment.as_deref())
    }

    /// Human-readable summary for the image info panel.
    ///
    /// Structural keywords are dropped and at most `commentary_limit`
    /// COMMENT and HISTORY entries are kept. Astrometry.net index listings
    /// are skipped.
    pub fn summary_lines(&self, commentary_limit: usize) -> Vec<String> {
        let mut lines: Vec<String> = self
            .cards
            .iter()
            .filter(|c| !c.is_commentary() && !c.is_end())
            .filter(|c| {
                let keyword = c.keyword_str();
                !STRUCTURAL_KEYWORDS.contains(&keyword) && !keyword.starts_with("NAXIS")
            })
            .filter_map(|c| {
                c.value
                    .as_ref()
                    .map(|v| format!("{}: {}", c.keyword_str(), display_value(v)))
            })
            .collect();

        for keyword in ["COMMENT", "HISTORY"] {
            lines.extend(
                self.commentary(keyword)
                    .map(str::trim)
                    .filter(|text| !text.is_empty() && !text.starts_with("Index("))
                    .take(commentary_limit)
                    .map(|text| format!("{}: {}", keyword, text)),
            );
        }

        lines
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use fitsio_pure::header::parse_card;

    /// Parse one card image, padding `text` to 80 bytes.
    pub(crate) fn card(text: &str) -> Card {
        let bytes: [u8; 80] = format!("{:<80}", text).into_bytes().try_into().unwrap();
        parse_card(&bytes).unwrap()
    }

    /// Header built from card images.
    pub(crate) fn header(cards: &[&str]) -> Header {
        Header::from_cards(cards.iter().map(|c| card(c)).collect())
    }

    #[test]
    fn typed_lookups() {
        let h = header(&[
            "OBJECT  = 'O''Brien field'   / target name",
            "CDELT1  =          -1.5D-03",
            "NAXIS   =                    2 / axes",
            "EXPTIME =                300.0",
            "SIMPLE  =                    T",
        ]);
        assert_eq!(h.get_str("OBJECT"), Some("O'Brien field"));
        assert_eq!(h.get_f64("CDELT1"), Some(-1.5e-3));
        assert_eq!(h.get_usize("NAXIS"), Some(2));
        assert_eq!(h.get_i64("EXPTIME"), Some(300));
        assert_eq!(h.get_f64("NAXIS"), Some(2.0));
        assert_eq!(h.get_bool("SIMPLE"), Some(true));
        assert!(!h.contains("BSCALE"));
    }

    #[test]
    fn negative_integers_are_not_sizes() {
        let h = header(&["NAXIS2  =                   -4"]);
        assert_eq!(h.get_i64("NAXIS2"), Some(-4));
        assert_eq!(h.get_usize("NAXIS2"), None);
    }

    #[test]
    fn summary_filters_structural_keywords() {
        let h = header(&[
            "SIMPLE  =                    T",
            "NAXIS1  =                   10",
            "OBJECT  = 'M31'",
            "COMMENT Index(4107): /data/index-4107.fits",
            "COMMENT first",
            "COMMENT second",
        ]);
        let lines = h.summary_lines(1);
        assert_eq!(lines, vec!["OBJECT: M31".to_string(), "COMMENT: first".to_string()]);
    }
}
