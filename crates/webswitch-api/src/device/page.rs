// Table-driven page decoding
//
// Every read-only status table is described by a `PageSpec` constant and
// decoded row by row into a `FromRow` type. Adapters only declare which
// page, which table, and how many header rows; fetching and iterating
// lives here once.

use crate::client::SwitchClient;
use crate::device::ports::PortEntry;
use crate::error::Error;
use crate::form::FormFields;
use crate::markup::{Document, IntParser, ParsedField, STATUS_TABLE, TableLocator};

/// Texts the firmware prints in place of a number when a rate or timer
/// is not in effect.
const SENTINELS: &[&str] = &["Off", "Unlimited", "-", "N/A", "Auto", "Strict", ""];

/// Rates, timers and weights: sentinel text decodes to `None`.
pub(crate) const OPTIONAL_INT: IntParser<'static> = IntParser::new()
    .trim_suffix(" kbps")
    .special_cases(SENTINELS)
    .absent_on_special();

/// Plain numeric cells and inputs.
pub(crate) const INT: IntParser<'static> = IntParser::new();

pub(crate) fn optional_u32(raw: &str) -> ParsedField<u32> {
    OPTIONAL_INT.parse_as(raw)
}

pub(crate) fn parse_u32(raw: &str) -> u32 {
    INT.parse_as(raw).unwrap_or_default()
}

/// Append one `portid` field per target, in wire numbering.
pub(crate) fn push_port_ids(fields: &mut FormFields, targets: &[PortEntry]) {
    for entry in targets {
        fields.push("portid", entry.wire_id());
    }
}

/// Where a status table lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageSpec {
    pub path: &'static str,
    pub table: TableLocator,
    pub header_rows: usize,
}

impl PageSpec {
    /// A page whose data sits in the trailing status table.
    pub const fn status(path: &'static str, header_rows: usize) -> Self {
        Self {
            path,
            table: STATUS_TABLE,
            header_rows,
        }
    }
}

/// One table row with column-aware accessors.
pub(crate) struct Row<'a> {
    cells: &'a [String],
    page: &'static str,
    index: usize,
}

impl<'a> Row<'a> {
    /// Text of column `idx`. A short row is a missing field, not an
    /// empty value.
    pub fn cell(&self, idx: usize, column: &str) -> Result<&'a str, Error> {
        self.cells.get(idx).map(String::as_str).ok_or_else(|| {
            Error::field_not_found(format!("row {} column {column:?}", self.index), self.page)
        })
    }
}

/// Decodes one status-table row.
pub(crate) trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> Result<Self, Error>;
}

/// Decode every data row of `page`'s table from an already-parsed document.
pub(crate) fn decode_table<T: FromRow>(doc: &Document, page: &PageSpec) -> Result<Vec<T>, Error> {
    let rows = doc.extract_table(page.table, page.header_rows)?;
    rows.iter()
        .enumerate()
        .filter(|(_, cells)| !cells.iter().all(String::is_empty))
        .map(|(index, cells)| {
            T::from_row(&Row {
                cells,
                page: page.path,
                index,
            })
        })
        .collect()
}

/// Parse `body` and decode `page`'s table.
pub(crate) fn decode_rows<T: FromRow>(page: &PageSpec, body: &str) -> Result<Vec<T>, Error> {
    let doc = Document::parse(body, page.path)?;
    decode_table(&doc, page)
}

/// Two-column `label | value` table (system info, STP root bridge),
/// looked up by label case-insensitively.
pub(crate) struct KeyValueTable(Vec<(String, String)>);

impl KeyValueTable {
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self(
            rows.into_iter()
                .filter_map(|row| {
                    let mut cells = row.into_iter();
                    let key = cells.next()?;
                    let value = cells.next().unwrap_or_default();
                    Some((key.trim_end_matches(':').trim().to_owned(), value))
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
            .filter(|v| !v.is_empty())
    }
}

impl SwitchClient {
    /// Fetch `page` and decode its status table.
    pub(crate) async fn read_rows<T: FromRow>(&self, page: &PageSpec) -> Result<Vec<T>, Error> {
        let body = self.get_page(page.path).await?;
        decode_rows(page, &body)
    }
}
