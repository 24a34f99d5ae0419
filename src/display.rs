use chrono::NaiveDate;

use crate::elapsed::Breakdown;

const MIN_ROW_CHARS: usize = 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    pub fn singular(self) -> &'static str {
        match self {
            Unit::Year => "year",
            Unit::Month => "month",
            Unit::Day => "day",
            Unit::Hour => "hour",
            Unit::Minute => "minute",
            Unit::Second => "second",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            Unit::Year => "years",
            Unit::Month => "months",
            Unit::Day => "days",
            Unit::Hour => "hours",
            Unit::Minute => "minutes",
            Unit::Second => "seconds",
        }
    }

    /// Only exactly one takes the singular; zero is plural.
    pub fn label(self, value: u32) -> &'static str {
        if value == 1 {
            self.singular()
        } else {
            self.plural()
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayUnit {
    pub value: u32,
    pub unit: Unit,
}

impl DisplayUnit {
    pub fn label(&self) -> &'static str {
        self.unit.label(self.value)
    }
}

/// Picks the units worth showing: everything from the largest non-zero
/// unit down to seconds, and never fewer than hours, minutes and seconds.
pub fn select_display_units(b: &Breakdown) -> Vec<DisplayUnit> {
    let all = [
        DisplayUnit { value: b.years, unit: Unit::Year },
        DisplayUnit { value: b.months, unit: Unit::Month },
        DisplayUnit { value: b.days, unit: Unit::Day },
        DisplayUnit { value: b.hours, unit: Unit::Hour },
        DisplayUnit { value: b.minutes, unit: Unit::Minute },
        DisplayUnit { value: b.seconds, unit: Unit::Second },
    ];

    let skip = if b.years > 0 {
        0
    } else if b.months > 0 {
        1
    } else if b.days > 0 {
        2
    } else {
        3
    };

    all[skip..].to_vec()
}

/// "1 year, 0 months, 3 days, ..."
pub fn render_inline(units: &[DisplayUnit]) -> String {
    units
        .iter()
        .map(|u| format!("{} {}", u.value, u.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// "Since October 3, 2023"
pub fn since_caption(since: NaiveDate) -> String {
    format!("Since {}", since.format("%B %-d, %Y"))
}

/// Dot-leader row: label on the left, value right-aligned to `align_width`.
fn build_unit_row(label: &str, value: &str, align_width: usize) -> String {
    let base_len = label.len() + value.len() + 1;
    let available = align_width.saturating_sub(base_len);

    let dots = match available {
        0 => "".to_string(),
        1 => " ".to_string(),
        n => format!(" {}", ".".repeat(n - 1)),
    };

    format!("{label}{dots} {value}")
}

fn build_header_line(label: &str, align_width: usize) -> String {
    let base = format!("{label} ");
    let dash_count = align_width.saturating_sub(base.len());
    format!("{base}{}", "-".repeat(dash_count))
}

/// Multi-line counter card, as shown by `together watch` and `together show`.
pub fn render_card(units: &[DisplayUnit], since: NaiveDate) -> String {
    let caption = since_caption(since);

    let align_width = units
        .iter()
        .map(|u| u.label().len() + 1 + u.value.to_string().len())
        .chain(std::iter::once(caption.len()))
        .max()
        .unwrap_or(0)
        .max(MIN_ROW_CHARS);

    let mut out = String::new();
    out.push_str(&build_header_line("Our Relationship", align_width));
    out.push('\n');
    out.push_str("Time together\n\n");

    for u in units {
        out.push_str(&build_unit_row(u.label(), &u.value.to_string(), align_width));
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&caption);
    out.push('\n');
    out.push_str("Type \"pick\" to change the date\n");
    out
}
