use chrono::Datelike;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DrinkingStatus {
    DrinkNow,
    DrinkSoon,
    TooYoung,
    PastPeak,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinkingStatusInfo {
    pub status: DrinkingStatus,
    pub label: String,
    pub description: String,
    /// 0 (no hurry) to 3 (open it now).
    pub urgency: u8,
}

impl DrinkingStatusInfo {
    fn new(status: DrinkingStatus, description: impl Into<String>, urgency: u8) -> Self {
        let label = match status {
            DrinkingStatus::DrinkNow => "Drink now",
            DrinkingStatus::DrinkSoon => "Drink soon",
            DrinkingStatus::TooYoung => "Too young",
            DrinkingStatus::PastPeak => "Past peak",
            DrinkingStatus::Unknown => "Unknown",
        };
        Self {
            status,
            label: label.to_string(),
            description: description.into(),
            urgency,
        }
    }
}

fn year_range() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})\s*[-–—]\s*(\d{4})").unwrap())
}

fn single_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})").unwrap())
}

fn plural(n: i32) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

pub fn drinking_status_now(window: Option<&str>) -> DrinkingStatusInfo {
    drinking_status(window, chrono::Local::now().year())
}

/// Classifies a free-text drinking window such as "2024-2030", "Drink now",
/// "From 2027" or "Until 2025" against `current_year`.
pub fn drinking_status(window: Option<&str>, current_year: i32) -> DrinkingStatusInfo {
    let Some(window) = window.map(str::trim).filter(|w| !w.is_empty()) else {
        return DrinkingStatusInfo::new(DrinkingStatus::Unknown, "No drinking window specified", 0);
    };
    let lower = window.to_lowercase();

    if lower.contains("drink now") || lower.contains("ready") || lower.contains("anytime") {
        return DrinkingStatusInfo::new(DrinkingStatus::DrinkNow, "Ready to enjoy", 2);
    }

    if let Some(caps) = year_range().captures(window) {
        let (Ok(start), Ok(end)) = (caps[1].parse::<i32>(), caps[2].parse::<i32>()) else {
            return DrinkingStatusInfo::new(DrinkingStatus::Unknown, window, 0);
        };

        if current_year < start {
            let wait = start - current_year;
            return DrinkingStatusInfo::new(
                DrinkingStatus::TooYoung,
                format!("Wait {} more year{} (from {})", wait, plural(wait), start),
                0,
            );
        }
        if current_year > end {
            let over = current_year - end;
            return DrinkingStatusInfo::new(
                DrinkingStatus::PastPeak,
                format!("{} year{} past optimal window", over, plural(over)),
                3,
            );
        }

        let left = end - current_year;
        return match left {
            0 | 1 => DrinkingStatusInfo::new(
                DrinkingStatus::DrinkSoon,
                "Last year of optimal window",
                3,
            ),
            2 => DrinkingStatusInfo::new(
                DrinkingStatus::DrinkSoon,
                format!("{} years left in optimal window", left),
                2,
            ),
            _ => DrinkingStatusInfo::new(
                DrinkingStatus::DrinkNow,
                format!("Optimal until {} ({} years)", end, left),
                1,
            ),
        };
    }

    if let Some(year) = single_year()
        .captures(window)
        .and_then(|caps| caps[1].parse::<i32>().ok())
    {
        if lower.contains("from") || lower.contains("after") {
            return if current_year < year {
                DrinkingStatusInfo::new(DrinkingStatus::TooYoung, format!("Wait until {}", year), 0)
            } else {
                DrinkingStatusInfo::new(DrinkingStatus::DrinkNow, format!("Ready since {}", year), 1)
            };
        }

        if lower.contains("until") || lower.contains("before") || lower.contains("by") {
            if current_year >= year {
                return DrinkingStatusInfo::new(
                    DrinkingStatus::PastPeak,
                    format!("Should have been drunk by {}", year),
                    3,
                );
            }
            return if year - current_year <= 2 {
                DrinkingStatusInfo::new(DrinkingStatus::DrinkSoon, format!("Drink before {}", year), 2)
            } else {
                DrinkingStatusInfo::new(DrinkingStatus::DrinkNow, format!("Best before {}", year), 1)
            };
        }
    }

    DrinkingStatusInfo::new(DrinkingStatus::Unknown, window, 0)
}
