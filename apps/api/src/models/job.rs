use chrono::{DateTime, Utc};

// ────────────────────────────────────────────────────────────────────────────
// Status / category / request state
// ────────────────────────────────────────────────────────────────────────────

/// Job lifecycle status. Codes 1..=5 are stored in `jobs.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Posted = 1,
    InProcess = 2,
    Completed = 3,
    Cancelled = 4,
    Deleted = 5,
}

impl JobStatus {
    pub const ALL: [JobStatus; 5] = [
        JobStatus::Posted,
        JobStatus::InProcess,
        JobStatus::Completed,
        JobStatus::Cancelled,
        JobStatus::Deleted,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    /// Matches the textual code exactly ("1".."5"), as sent by clients.
    pub fn from_code_str(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code().to_string() == raw)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Posted => "posted",
            JobStatus::InProcess => "in_process",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobCategory {
    Animals = 1,
    Auto = 2,
    Education = 3,
    Events = 4,
    Home = 5,
    SelfCare = 6,
    Shop = 7,
    Other = 8,
}

impl JobCategory {
    pub const ALL: [JobCategory; 8] = [
        JobCategory::Animals,
        JobCategory::Auto,
        JobCategory::Education,
        JobCategory::Events,
        JobCategory::Home,
        JobCategory::SelfCare,
        JobCategory::Shop,
        JobCategory::Other,
    ];

    pub fn code(self) -> i16 {
        self as i16
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| i64::from(c.code()) == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            JobCategory::Animals => "Animals",
            JobCategory::Auto => "Auto",
            JobCategory::Education => "Education",
            JobCategory::Events => "Events",
            JobCategory::Home => "Home",
            JobCategory::SelfCare => "Self-care",
            JobCategory::Shop => "Shop",
            JobCategory::Other => "Other",
        }
    }
}

/// State of a student's bid on a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Open = 1,
    Closed = 2,
}

impl RequestState {
    pub fn code(self) -> i16 {
        self as i16
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Weekly schedule
// ────────────────────────────────────────────────────────────────────────────

/// Payload keys for each weekday, Sunday first. Bit `i` of the mask is `DAY_KEYS[i]`.
pub const DAY_KEYS: [&str; 7] = ["d", "l", "m", "w", "j", "v", "s"];

const DAY_NAMES: [&str; 7] = [
    "domingo",
    "lunes",
    "martes",
    "miercoles",
    "jueves",
    "viernes",
    "sabado",
];

/// Weekly recurrence bitmask, one bit per weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeekDays(pub u8);

impl WeekDays {
    pub fn from_flags(flags: [bool; 7]) -> Self {
        let mask = flags
            .iter()
            .enumerate()
            .filter(|(_, set)| **set)
            .fold(0u8, |acc, (i, _)| acc | (1 << i));
        WeekDays(mask)
    }

    pub fn from_mask(mask: i16) -> Self {
        WeekDays((mask & 0x7f) as u8)
    }

    pub fn mask(self) -> i16 {
        i16::from(self.0)
    }

    pub fn contains(self, day_index: usize) -> bool {
        day_index < 7 && self.0 & (1 << day_index) != 0
    }

    /// Spanish day names for every set bit, Sunday first.
    pub fn names(self) -> Vec<&'static str> {
        (0..7)
            .filter(|&i| self.contains(i))
            .map(|i| DAY_NAMES[i])
            .collect()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Price / date formatting
// ────────────────────────────────────────────────────────────────────────────

/// Strips thousands separators so the price can be stored as NUMERIC.
pub fn clean_price(raw: &str) -> String {
    raw.trim().replace(',', "")
}

/// Renders a stored price as US currency, e.g. `1500.5` → `$1,500.50`.
/// Unparseable input is returned unchanged.
pub fn display_price(raw: &str) -> String {
    let Ok(value) = clean_price(raw).parse::<f64>() else {
        return raw.to_string();
    };
    let fixed = format!("{:.2}", value.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{cents}")
}

/// Long-form date, e.g. `March 04, 2024`.
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %d, %Y").to_string()
}
