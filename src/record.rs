//! Results rows and the events grouping them.

/// Cell texts of one table row, in column order.
pub type RawRow = Vec<String>;

/// One lifter's line in a results table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub meet: String,
    pub date: String,
    pub age: String,
    pub name: String,
    pub body_weight: f64,
    pub snatch1: f64,
    pub snatch2: f64,
    pub snatch3: f64,
    pub snatch_best: f64,
    pub cj1: f64,
    pub cj2: f64,
    pub cj3: f64,
    pub cj_best: f64,
    pub total: f64,
}

impl Record {
    /// Maps the positional results layout onto named fields.
    /// Missing or malformed cells fall back to blank / `0`.
    pub fn from_cells(cells: &[String]) -> Self {
        let text = |i: usize| cells.get(i).map(|c| c.trim().to_string()).unwrap_or_default();
        let number = |i: usize| cells.get(i).map(|c| parse_number(c)).unwrap_or(0.0);

        Self {
            meet: text(0),
            date: text(1),
            age: text(2),
            name: text(3),
            body_weight: number(4),
            snatch1: number(5),
            snatch2: number(6),
            snatch3: number(7),
            cj1: number(8),
            cj2: number(9),
            cj3: number(10),
            snatch_best: number(11),
            cj_best: number(12),
            total: number(13),
        }
    }
}

/// All records of one competition id.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: u32,
    pub name: String,
    pub date: String,
    pub records: Vec<Record>,
}

/// Extracts every row of a page, in order. Never fails.
pub fn extract(rows: &[RawRow]) -> Vec<Record> {
    rows.iter().map(|cells| Record::from_cells(cells)).collect()
}

/// Lenient float parse: takes the longest numeric prefix, `0` if there is none.
/// `"105kg"` is 105, `"-130"` is -130, `"--"` is 0.
pub fn parse_number(cell: &str) -> f64 {
    let s = cell.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut best = None;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => {
                seen_digit = true;
                end += 1;
                best = Some(end);
            }
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    if !seen_digit {
        return 0.0;
    }

    // Optional exponent, only taken when complete.
    let mut mantissa_end = best.unwrap_or(end);
    if matches!(bytes.get(mantissa_end), Some(b'e' | b'E')) {
        let mut exp_end = mantissa_end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let digits_start = exp_end;
        while matches!(bytes.get(exp_end), Some(b'0'..=b'9')) {
            exp_end += 1;
        }
        if exp_end > digits_start {
            mantissa_end = exp_end;
        }
    }

    s[..mantissa_end]
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}
