use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{MapError, Result};

pub const PRODUCE: &str = "Produce";
pub const CATEGORY: &str = "Category";
pub const QTY: &str = "Qty lbs";

pub const FARM_COST: &str = "Farm Cost $/lb";
pub const FARM_MARKUP: &str = "Farm Markup %";
pub const FARM_SALE: &str = "Farm Sale $/lb";
pub const FARM_SHRINK: &str = "Farm Shrink %";
pub const FARM_GP: &str = "Farm GP $/lb";
pub const FARM_GM: &str = "Farm GM %";
pub const DIST_HANDLING: &str = "Dist Handling $/lb";
pub const DIST_MARGIN: &str = "Dist Margin %";
pub const DIST_SALE: &str = "Dist Sale $/lb";
pub const DIST_SHRINK: &str = "Dist Shrink %";
pub const DIST_GP: &str = "Dist GP $/lb";
pub const DIST_GM: &str = "Dist GM %";
pub const RETAIL_HANDLING: &str = "Retail Handling $/lb";
pub const RETAIL_MARGIN: &str = "Retail Margin %";
pub const RETAIL_PRICE: &str = "Retail Price $/lb";
pub const BODEGA_SHRINK: &str = "Bodega Shrink %";
pub const BODEGA_GP: &str = "Bodega GP $/lb";
pub const BODEGA_GM: &str = "Bodega GM %";

/// Columns filled in by [`KpiRow::recalculate`], in the order they are appended
/// when the sheet lacks them.
pub const DERIVED: [&str; 9] = [
    FARM_SALE, DIST_SALE, RETAIL_PRICE, FARM_GP, FARM_GM, DIST_GP, DIST_GM, BODEGA_GP, BODEGA_GM,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Farm,
    Distributor,
    Bodega,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Farm, Role::Distributor, Role::Bodega];

    /// Columns shown by default for this role.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Role::Farm => &[
                PRODUCE, CATEGORY, FARM_COST, FARM_MARKUP, FARM_SALE, FARM_SHRINK, FARM_GP, FARM_GM, QTY,
            ],
            Role::Distributor => &[
                PRODUCE, CATEGORY, FARM_SALE, DIST_HANDLING, DIST_MARGIN, DIST_SALE, DIST_SHRINK, DIST_GP,
                DIST_GM, QTY,
            ],
            Role::Bodega => &[
                PRODUCE, CATEGORY, DIST_SALE, RETAIL_HANDLING, RETAIL_MARGIN, RETAIL_PRICE, BODEGA_SHRINK,
                BODEGA_GP, BODEGA_GM, QTY,
            ],
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Farm => write!(f, "Farm"),
            Role::Distributor => write!(f, "Distributor"),
            Role::Bodega => write!(f, "Bodega"),
        }
    }
}

/// `Dist.` prefixes in the sheet are written without the dot.
pub fn normalize_header(raw: &str) -> String {
    let raw = raw.trim();
    match raw.strip_prefix("Dist. ") {
        Some(rest) => format!("Dist {rest}"),
        None => raw.to_string(),
    }
}

pub fn is_text_column(header: &str) -> bool {
    header == PRODUCE || header == CATEGORY
}

pub fn is_percent(header: &str) -> bool {
    header.contains('%')
}

pub fn is_read_only(header: &str) -> bool {
    is_text_column(header) || DERIVED.contains(&header)
}

/// Rounds half away from zero; non-finite values read as zero.
pub fn round_to(value: f64, digits: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

pub fn format_cell(header: &str, value: f64) -> String {
    if is_percent(header) {
        format!("{:.1}", round_to(value, 1))
    } else {
        format!("{:.2}", round_to(value, 2))
    }
}

fn ratio_pct(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        100.0 * part / whole
    }
}

/// One crop in the supply chain sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiRow {
    pub produce: String,
    pub category: String,
    values: HashMap<String, f64>,
}

impl KpiRow {
    pub fn new(produce: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            produce: produce.into(),
            category: category.into(),
            values: HashMap::new(),
        }
    }

    /// Numeric cell value; missing cells read as zero.
    pub fn get(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(0.0)
    }

    /// Sets an input cell and recalculates the row.
    pub fn set(&mut self, column: &str, value: f64) {
        self.values.insert(column.to_string(), value);
        self.recalculate();
    }

    pub fn recalculate(&mut self) {
        let g = |k: &str| self.get(k);
        let farm_sale = g(FARM_COST) * (1.0 + g(FARM_MARKUP) / 100.0);
        let dist_sale = (farm_sale + g(DIST_HANDLING)) * (1.0 + g(DIST_MARGIN) / 100.0);
        let retail = (dist_sale + g(RETAIL_HANDLING)) * (1.0 + g(RETAIL_MARGIN) / 100.0);

        let farm_gp = farm_sale - g(FARM_COST);
        let dist_gp = dist_sale - farm_sale - g(DIST_HANDLING);
        let bodega_gp = retail * (1.0 - g(BODEGA_SHRINK) / 100.0) - dist_sale - g(RETAIL_HANDLING);

        for (column, value) in [
            (FARM_SALE, farm_sale),
            (DIST_SALE, dist_sale),
            (RETAIL_PRICE, retail),
            (FARM_GP, farm_gp),
            (FARM_GM, ratio_pct(farm_gp, farm_sale)),
            (DIST_GP, dist_gp),
            (DIST_GM, ratio_pct(dist_gp, dist_sale)),
            (BODEGA_GP, bodega_gp),
            (BODEGA_GM, ratio_pct(bodega_gp, retail)),
        ] {
            self.values.insert(column.to_string(), value);
        }
    }
}

/// Role totals over the selected crops.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Totals {
    pub qty: f64,
    pub revenue: f64,
    pub gross_profit: f64,
    pub margin_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiTable {
    pub headers: Vec<String>,
    pub rows: Vec<KpiRow>,
}

fn parse_number(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

impl KpiTable {
    /// Reads the sheet. Rows without a produce name are dropped and every row
    /// is recalculated, so derived columns are always present.
    pub fn parse(source: &str, text: &str) -> Result<Self> {
        let parse_err = |e: csv::Error| MapError::Parse {
            url: source.to_string(),
            message: e.to_string(),
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let mut headers: Vec<String> = reader
            .headers()
            .map_err(parse_err)?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(parse_err)?;
            let mut row = KpiRow::new("", "");
            for (header, cell) in headers.iter().zip(record.iter()) {
                match header.as_str() {
                    PRODUCE => row.produce = cell.to_string(),
                    CATEGORY => row.category = cell.to_string(),
                    _ => {
                        row.values.insert(header.clone(), parse_number(cell));
                    }
                }
            }
            if row.produce.is_empty() {
                continue;
            }
            row.recalculate();
            rows.push(row);
        }

        for derived in DERIVED {
            if !headers.iter().any(|h| h == derived) {
                headers.push(derived.to_string());
            }
        }
        debug!(source, rows = rows.len(), columns = headers.len(), "parsed KPI sheet");
        Ok(Self { headers, rows })
    }

    /// Distinct produce names, sorted.
    pub fn crops(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| r.produce.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Edits an input cell from user text. Returns `false` for read-only
    /// columns, out-of-range rows and unparsable numbers.
    pub fn set_cell(&mut self, row: usize, column: &str, raw: &str) -> bool {
        if is_read_only(column) {
            return false;
        }
        let raw = raw.trim();
        let value = if raw.is_empty() {
            0.0
        } else {
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => return false,
            }
        };
        match self.rows.get_mut(row) {
            Some(r) => {
                r.set(column, value);
                true
            }
            None => false,
        }
    }

    /// Quantity-weighted revenue and gross profit for `role`. Rows with zero
    /// quantity and crops outside `selected` are skipped.
    pub fn totals(&self, role: Role, selected: &BTreeSet<String>) -> Totals {
        let mut t = Totals::default();
        for row in self.rows.iter().filter(|r| selected.contains(&r.produce)) {
            let q = row.get(QTY);
            if q == 0.0 {
                continue;
            }
            t.qty += q;
            let (revenue, gp) = match role {
                Role::Farm => (row.get(FARM_SALE), row.get(FARM_GP)),
                Role::Distributor => (row.get(DIST_SALE), row.get(DIST_GP)),
                Role::Bodega => (
                    row.get(RETAIL_PRICE) * (1.0 - row.get(BODEGA_SHRINK) / 100.0),
                    row.get(BODEGA_GP),
                ),
            };
            t.revenue += revenue * q;
            t.gross_profit += gp * q;
        }
        t.margin_pct = ratio_pct(t.gross_profit, t.revenue);
        t
    }
}

/// User overrides on top of the role's default columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnVisibility {
    forced_visible: BTreeSet<String>,
    forced_hidden: BTreeSet<String>,
}

impl ColumnVisibility {
    pub fn is_visible(&self, header: &str, role: Option<Role>) -> bool {
        if is_text_column(header) || self.forced_visible.contains(header) {
            return true;
        }
        if self.forced_hidden.contains(header) {
            return false;
        }
        role.is_some_and(|r| r.columns().contains(&header))
    }

    pub fn set(&mut self, header: &str, visible: bool) {
        if is_text_column(header) {
            return;
        }
        if visible {
            self.forced_hidden.remove(header);
            self.forced_visible.insert(header.to_string());
        } else {
            self.forced_visible.remove(header);
            self.forced_hidden.insert(header.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHEET: &str = "\
Produce,Category,Farm Cost $/lb,Farm Markup %,Dist. Handling $/lb,Dist. Margin %,Retail Handling $/lb,Retail Margin %,Bodega Shrink %,Qty lbs
Apples,Fruit,1.00,50,0.10,20,0.20,25,10,100
Kale,Greens,2.00,25,,10,0.00,0,0,0
,Fruit,1,1,1,1,1,1,1,1
";

    fn table() -> KpiTable {
        KpiTable::parse("kpi.csv", SHEET).unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_parse_drops_unnamed_rows_and_normalizes() {
        let t = table();
        assert_eq!(t.rows.len(), 2);
        assert!(t.headers.iter().any(|h| h == DIST_HANDLING));
        assert!(!t.headers.iter().any(|h| h.starts_with("Dist.")));
        for derived in DERIVED {
            assert!(t.headers.iter().any(|h| h == derived));
        }
    }

    #[test]
    fn test_row_formulas() {
        let t = table();
        let apples = &t.rows[0];
        assert!(close(apples.get(FARM_SALE), 1.5));
        assert!(close(apples.get(DIST_SALE), (1.5 + 0.1) * 1.2));
        let retail = (1.92 + 0.2) * 1.25;
        assert!(close(apples.get(RETAIL_PRICE), retail));
        assert!(close(apples.get(FARM_GP), 0.5));
        assert!(close(apples.get(FARM_GM), 100.0 * 0.5 / 1.5));
        assert!(close(apples.get(DIST_GP), 1.92 - 1.5 - 0.1));
        assert!(close(apples.get(BODEGA_GP), retail * 0.9 - 1.92 - 0.2));
    }

    #[test]
    fn test_zero_sale_margin_is_zero() {
        let mut row = KpiRow::new("Nothing", "None");
        row.recalculate();
        assert_eq!(row.get(FARM_GM), 0.0);
        assert_eq!(row.get(BODEGA_GM), 0.0);
    }

    #[test]
    fn test_totals_skip_zero_quantity_and_unselected() {
        let t = table();
        let all: BTreeSet<String> = t.crops().into_iter().collect();
        let farm = t.totals(Role::Farm, &all);
        assert!(close(farm.qty, 100.0));
        assert!(close(farm.revenue, 150.0));
        assert!(close(farm.gross_profit, 50.0));
        assert!(close(farm.margin_pct, 100.0 / 3.0));

        let none = t.totals(Role::Farm, &BTreeSet::new());
        assert_eq!(none, Totals::default());
    }

    #[test]
    fn test_bodega_revenue_accounts_for_shrink() {
        let t = table();
        let all: BTreeSet<String> = t.crops().into_iter().collect();
        let bodega = t.totals(Role::Bodega, &all);
        let retail = (1.92 + 0.2) * 1.25;
        assert!(close(bodega.revenue, retail * 0.9 * 100.0));
    }

    #[test]
    fn test_set_cell_recalculates() {
        let mut t = table();
        assert!(t.set_cell(0, FARM_MARKUP, "100"));
        assert!(close(t.rows[0].get(FARM_SALE), 2.0));
        assert!(!t.set_cell(0, FARM_GP, "5"));
        assert!(!t.set_cell(0, FARM_COST, "cheap"));
        assert!(!t.set_cell(9, FARM_COST, "1"));
    }

    #[test]
    fn test_column_visibility_overrides() {
        let mut vis = ColumnVisibility::default();
        assert!(vis.is_visible(PRODUCE, None));
        assert!(!vis.is_visible(FARM_COST, None));
        assert!(vis.is_visible(FARM_COST, Some(Role::Farm)));
        assert!(vis.is_visible(DIST_SALE, Some(Role::Bodega)));

        vis.set(FARM_COST, false);
        assert!(!vis.is_visible(FARM_COST, Some(Role::Farm)));
        vis.set(DIST_GM, true);
        assert!(vis.is_visible(DIST_GM, Some(Role::Farm)));
        vis.set(PRODUCE, false);
        assert!(vis.is_visible(PRODUCE, Some(Role::Farm)));
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(FARM_GM, 33.333), "33.3");
        assert_eq!(format_cell(FARM_SALE, 1.5), "1.50");
        assert_eq!(round_to(f64::NAN, 2), 0.0);
    }
}
