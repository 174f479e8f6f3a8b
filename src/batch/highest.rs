use crate::sheets::SheetRow;
use crate::util::parse_leading_int;

/// Largest parsed row number across a load, and the row holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighestRow {
    pub number: i64,
    /// Index into the loaded rows, `None` when nothing parsed above zero.
    pub index: Option<usize>,
}

/// Scan `header` in every row. Blank and unparseable cells are ignored;
/// the running maximum starts at 0 and is only replaced by a strictly
/// greater value, so ties keep the earlier row.
pub fn highest_row(rows: &[SheetRow], header: &str) -> HighestRow {
    let mut best = HighestRow {
        number: 0,
        index: None,
    };
    for (i, row) in rows.iter().enumerate() {
        let Some(raw) = row.get(header) else { continue };
        if raw.is_empty() {
            continue;
        }
        let Some(n) = parse_leading_int(raw) else { continue };
        if n > best.number {
            best = HighestRow {
                number: n,
                index: Some(i),
            };
        }
    }
    best
}
