//! Typed value extraction from the device's HTML pages.
//!
//! Every configuration page follows the same loose conventions: an
//! editable form (selects, text inputs, checkboxes) followed by a
//! read-only status table. Adapters never slice strings themselves;
//! they locate a table or control here and decode cells with
//! [`IntParser`].
//!
//! [`Document`] wraps a parsed `scraper::Html`, which is not `Send`.
//! Parse and decode inside a synchronous helper and only return owned
//! values across `.await` points.

use scraper::{ElementRef, Html, Selector};

use crate::error::Error;

/// A decoded value where `None` means "disabled / auto / not applicable".
///
/// `Some(0)` and `None` are different device states (a storm-control rate
/// of 0 is not the same as storm control being off).
pub type ParsedField<T> = Option<T>;

/// Which `<table>` on a page to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLocator {
    /// The last table in document order.
    Last,
    /// The n-th table in document order (0-based).
    Nth(usize),
    /// The `table`-th table inside the `fieldset`-th fieldset (0-based).
    InFieldset { fieldset: usize, table: usize },
}

/// Where the firmware renders read-only status tables.
///
/// Pages mix an editable form table with a status table, and the status
/// table is always the last one on the page.
pub const STATUS_TABLE: TableLocator = TableLocator::Last;

/// A parsed HTML page.
pub struct Document {
    html: Html,
    page: String,
}

impl Document {
    /// Parse a response body.
    ///
    /// html5ever recovers from almost anything, so "failed to parse" here
    /// means there is no markup at all: an empty body or bare text.
    pub fn parse(body: &str, page: &str) -> Result<Self, Error> {
        if body.trim().is_empty() {
            return Err(Error::Parse {
                message: format!("{page}: empty response body"),
            });
        }

        let html = Html::parse_document(body);
        let has_content = html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|e| !matches!(e.value().name(), "html" | "head" | "body"));
        if !has_content {
            return Err(Error::Parse {
                message: format!("{page}: response contains no HTML elements"),
            });
        }

        Ok(Self {
            html,
            page: page.to_owned(),
        })
    }

    /// The page path this document was fetched from.
    pub fn page(&self) -> &str {
        &self.page
    }

    fn missing(&self, field: impl Into<String>) -> Error {
        Error::field_not_found(field, self.page.clone())
    }

    // ── Tables ───────────────────────────────────────────────────────

    /// Rows of whitespace-normalized cell text from the located table,
    /// with the first `skip_rows` rows (headers) dropped.
    ///
    /// Only rows belonging directly to the table are returned; rows of
    /// nested tables are ignored.
    pub fn extract_table(
        &self,
        locator: TableLocator,
        skip_rows: usize,
    ) -> Result<Vec<Vec<String>>, Error> {
        let table = self
            .locate_table(locator)?
            .ok_or_else(|| self.missing(format!("table {locator:?}")))?;

        let tr = selector("tr")?;
        let rows = table
            .select(&tr)
            .filter(|row| owning_table(*row).is_some_and(|t| t.id() == table.id()))
            .skip(skip_rows)
            .map(|row| {
                row.children()
                    .filter_map(ElementRef::wrap)
                    .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                    .map(cell_text)
                    .collect()
            })
            .collect();

        Ok(rows)
    }

    fn locate_table(&self, locator: TableLocator) -> Result<Option<ElementRef<'_>>, Error> {
        let table = selector("table")?;
        Ok(match locator {
            TableLocator::Last => self.html.select(&table).last(),
            TableLocator::Nth(n) => self.html.select(&table).nth(n),
            TableLocator::InFieldset {
                fieldset,
                table: n,
            } => {
                let fieldsets = selector("fieldset")?;
                self.html
                    .select(&fieldsets)
                    .nth(fieldset)
                    .and_then(|fs| fs.select(&table).nth(n))
            }
        })
    }

    // ── Form controls ────────────────────────────────────────────────

    /// Text of the `<option selected>` inside the select matched by `css`.
    ///
    /// A select with no option marked selected is an extraction error,
    /// not a parse failure: the page is not what we expected.
    pub fn extract_selected(&self, css: &str) -> Result<String, Error> {
        self.selected_option(css).map(cell_text)
    }

    /// `value` attribute of the selected option (falls back to its text,
    /// as browsers do when the attribute is absent).
    pub fn extract_selected_value(&self, css: &str) -> Result<String, Error> {
        let option = self.selected_option(css)?;
        Ok(option
            .value()
            .attr("value")
            .map_or_else(|| cell_text(option), |v| v.trim().to_owned()))
    }

    fn selected_option(&self, css: &str) -> Result<ElementRef<'_>, Error> {
        let select = selector(css)?;
        let option = selector("option")?;
        let element = self
            .html
            .select(&select)
            .next()
            .ok_or_else(|| self.missing(css))?;
        element
            .select(&option)
            .find(|o| o.value().attr("selected").is_some())
            .ok_or_else(|| self.missing(format!("{css} (no selected option)")))
    }

    /// `value` attribute of `<input name="...">`.
    pub fn extract_input_value(&self, name: &str) -> Result<String, Error> {
        let css = format!("input[name=\"{name}\"]");
        let input = selector(&css)?;
        self.html
            .select(&input)
            .next()
            .map(|e| e.value().attr("value").unwrap_or_default().trim().to_owned())
            .ok_or_else(|| self.missing(css))
    }

    /// Whether `<input name="...">` carries the `checked` attribute.
    pub fn is_checked(&self, name: &str) -> Result<bool, Error> {
        let css = format!("input[name=\"{name}\"]");
        let input = selector(&css)?;
        self.html
            .select(&input)
            .next()
            .map(|e| e.value().attr("checked").is_some())
            .ok_or_else(|| self.missing(css))
    }
}

/// Message of a bare rejection page, if `body` is one.
///
/// A refused submission comes back as a page with no form controls whose
/// script opens with `alert("...")` (usually followed by
/// `history.back()`). A re-rendered settings page after a successful
/// submit carries its form, and any `alert(` inside it belongs to a
/// client-side validation handler, not to the device's answer.
pub fn rejection_alert(body: &str) -> Option<String> {
    let html = Html::parse_document(body);
    let controls = selector("form, select, input, textarea").ok()?;
    if html.select(&controls).next().is_some() {
        return None;
    }
    let script = selector("script").ok()?;
    html.select(&script)
        .find_map(|s| leading_alert(&s.text().collect::<String>()))
}

/// The quoted argument of an `alert(...)` call that opens `script`.
fn leading_alert(script: &str) -> Option<String> {
    let script = script.trim_start();
    let rest = script
        .strip_prefix("window.")
        .unwrap_or(script)
        .strip_prefix("alert(")?
        .trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = rest.get(1..)?;
    let end = inner.find(quote)?;
    Some(inner.get(..end)?.trim().to_owned())
}

/// CSS for `<select name="...">`.
pub fn select_named(name: &str) -> String {
    format!("select[name=\"{name}\"]")
}

fn selector(css: &str) -> Result<Selector, Error> {
    Selector::parse(css).map_err(|e| Error::Parse {
        message: format!("invalid selector {css:?}: {e}"),
    })
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

// ── IntParser ────────────────────────────────────────────────────────

/// What a special-case string (`"Auto"`, `"Off"`, ...) decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecialPolicy {
    /// Return the configured default value.
    #[default]
    UseDefault,
    /// Return `None`.
    Absent,
}

/// Lenient integer decoding for table cells and input values.
///
/// Built once per column, usually as a `const`:
///
/// ```
/// use webswitch_api::markup::IntParser;
///
/// const PORT: IntParser<'static> = IntParser::new().trim_prefix("Port ");
/// assert_eq!(PORT.parse("Port 7"), Some(7));
///
/// const RATE: IntParser<'static> = IntParser::new()
///     .special_cases(&["Off", "Auto"])
///     .absent_on_special();
/// assert_eq!(RATE.parse("Auto"), None);
///
/// assert_eq!(IntParser::new().default(5).parse("garbage"), Some(5));
/// ```
///
/// A cell that is neither a number nor a special case yields the default
/// instead of an error. Loosely structured markup produces stray text in
/// numeric columns often enough that failing the whole table scan on it
/// would make reads unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntParser<'a> {
    prefix: Option<&'a str>,
    suffix: Option<&'a str>,
    default: i64,
    offset: i64,
    special_cases: &'a [&'a str],
    special_policy: SpecialPolicy,
}

impl Default for IntParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntParser<'a> {
    pub const fn new() -> Self {
        Self {
            prefix: None,
            suffix: None,
            default: 0,
            offset: 0,
            special_cases: &[],
            special_policy: SpecialPolicy::UseDefault,
        }
    }

    /// Strip this prefix before parsing (`"Port "` for `"Port 3"`).
    pub const fn trim_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Strip this suffix before parsing (`" kbps"`).
    pub const fn trim_suffix(mut self, suffix: &'a str) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Value returned on parse failure (and on special cases under
    /// [`SpecialPolicy::UseDefault`]).
    pub const fn default(mut self, default: i64) -> Self {
        self.default = default;
        self
    }

    /// Added to every successfully parsed value; `1` turns the device's
    /// 0-based numbering into 1-based, `-1` the reverse.
    pub const fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Strings that short-circuit parsing (matched case-insensitively
    /// after trimming).
    pub const fn special_cases(mut self, cases: &'a [&'a str]) -> Self {
        self.special_cases = cases;
        self
    }

    /// Special cases decode to `None` instead of the default.
    pub const fn absent_on_special(mut self) -> Self {
        self.special_policy = SpecialPolicy::Absent;
        self
    }

    pub fn parse(&self, raw: &str) -> ParsedField<i64> {
        let trimmed = raw.trim();

        if self
            .special_cases
            .iter()
            .any(|case| case.eq_ignore_ascii_case(trimmed))
        {
            return match self.special_policy {
                SpecialPolicy::UseDefault => Some(self.default),
                SpecialPolicy::Absent => None,
            };
        }

        let mut digits = trimmed;
        if let Some(prefix) = self.prefix {
            digits = digits.strip_prefix(prefix).unwrap_or(digits);
        }
        if let Some(suffix) = self.suffix {
            digits = digits.strip_suffix(suffix).unwrap_or(digits);
        }

        match digits.trim().parse::<i64>() {
            Ok(value) => Some(value.saturating_add(self.offset)),
            Err(_) => Some(self.default),
        }
    }

    /// [`parse`](Self::parse), narrowed to `T`. Values that do not fit
    /// fall back to the default like any other parse failure.
    pub fn parse_as<T: TryFrom<i64>>(&self, raw: &str) -> ParsedField<T> {
        let value = self.parse(raw)?;
        T::try_from(value)
            .ok()
            .or_else(|| T::try_from(self.default).ok())
    }
}
