use serde::{Deserialize, Serialize};

use crate::domain::errors::SourceError;

pub const SYMBOL_COLUMN: &str = "Symbol";

/// Column names used by the screener table.
pub mod columns {
    pub const PRICE: &str = "CMP Rs.";
    pub const PE: &str = "P/E";
    pub const MARKET_CAP: &str = "Mar Cap Rs.Cr.";
    pub const DIVIDEND_YIELD: &str = "Div Yld %";
    pub const QTR_PROFIT_VAR: &str = "Qtr Profit Var %";
    pub const QTR_SALES_VAR: &str = "Qtr Sales Var %";
    pub const ROCE: &str = "ROCE %";
    pub const RETURN_1Y: &str = "1Yr return %";
    pub const VOLUME: &str = "Vol 1d";
}

/// Header used when a page carries no header row of its own.
pub const DEFAULT_COLUMNS: [&str; 13] = [
    "S.No.",
    SYMBOL_COLUMN,
    columns::PRICE,
    columns::PE,
    columns::MARKET_CAP,
    columns::DIVIDEND_YIELD,
    "NP Qtr Rs.Cr.",
    columns::QTR_PROFIT_VAR,
    "Sales Qtr Rs.Cr.",
    columns::QTR_SALES_VAR,
    columns::ROCE,
    columns::RETURN_1Y,
    columns::VOLUME,
];

/// One row of the screen, with the fundamentals the pipeline knows about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub symbol: String,
    pub price: Option<f64>,
    pub pe: Option<f64>,
    pub market_cap: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub qtr_profit_var_pct: Option<f64>,
    pub qtr_sales_var_pct: Option<f64>,
    pub roce_pct: Option<f64>,
    pub return_1y_pct: Option<f64>,
    pub volume: Option<f64>,
}

impl CandidateRecord {
    /// Record carrying only a symbol; every fundamental is missing.
    pub fn bare(symbol: impl Into<String>) -> Self {
        CandidateRecord {
            symbol: symbol.into(),
            price: None,
            pe: None,
            market_cap: None,
            dividend_yield: None,
            qtr_profit_var_pct: None,
            qtr_sales_var_pct: None,
            roce_pct: None,
            return_1y_pct: None,
            volume: None,
        }
    }
}

/// Raw table as scraped: a header plus text cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CandidateTable {
    pub fn new(columns: Vec<String>) -> Self {
        CandidateTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Appends rows from another page. The first page fixes the header.
    pub fn extend(&mut self, page: CandidateTable) {
        if self.columns.is_empty() {
            self.columns = page.columns;
        }
        self.rows.extend(page.rows);
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Parses rows into records, in table order. Duplicate symbols are kept.
    pub fn records(&self) -> Result<Vec<CandidateRecord>, SourceError> {
        let symbol_idx =
            self.column_index(SYMBOL_COLUMN)
                .ok_or_else(|| SourceError::SchemaMismatch {
                    expected: SYMBOL_COLUMN.to_string(),
                    available: self.columns.clone(),
                })?;

        let numeric = |row: &[String], name: &str| -> Option<f64> {
            self.column_index(name)
                .and_then(|idx| row.get(idx))
                .and_then(|cell| parse_number(cell))
        };

        let records = self
            .rows
            .iter()
            .filter_map(|row| {
                let row = row.as_slice();
                let symbol = row.get(symbol_idx)?.trim();
                if symbol.is_empty() {
                    return None;
                }
                Some(CandidateRecord {
                    symbol: symbol.to_string(),
                    price: numeric(row, columns::PRICE),
                    pe: numeric(row, columns::PE),
                    market_cap: numeric(row, columns::MARKET_CAP),
                    dividend_yield: numeric(row, columns::DIVIDEND_YIELD),
                    qtr_profit_var_pct: numeric(row, columns::QTR_PROFIT_VAR),
                    qtr_sales_var_pct: numeric(row, columns::QTR_SALES_VAR),
                    roce_pct: numeric(row, columns::ROCE),
                    return_1y_pct: numeric(row, columns::RETURN_1Y),
                    volume: numeric(row, columns::VOLUME),
                })
            })
            .collect();

        Ok(records)
    }
}

/// Lenient numeric cell parser: strips thousands separators and percent signs.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
