use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lookback windows reported for volume and transaction counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    H6,
    H12,
    H24,
    H48,
    D7,
    D30,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 6] = [
        TimeWindow::H6,
        TimeWindow::H12,
        TimeWindow::H24,
        TimeWindow::H48,
        TimeWindow::D7,
        TimeWindow::D30,
    ];

    pub fn duration(self) -> Duration {
        match self {
            TimeWindow::H6 => Duration::hours(6),
            TimeWindow::H12 => Duration::hours(12),
            TimeWindow::H24 => Duration::hours(24),
            TimeWindow::H48 => Duration::hours(48),
            TimeWindow::D7 => Duration::days(7),
            TimeWindow::D30 => Duration::days(30),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::H6 => "6h",
            TimeWindow::H12 => "12h",
            TimeWindow::H24 => "24h",
            TimeWindow::H48 => "48h",
            TimeWindow::D7 => "7d",
            TimeWindow::D30 => "30d",
        }
    }

    /// Start of this window when looking back from `now`.
    pub fn since(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

/// One value per [`TimeWindow`], serialised with the window labels as keys.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PerWindow<T> {
    #[serde(rename = "6h")]
    pub h6: T,
    #[serde(rename = "12h")]
    pub h12: T,
    #[serde(rename = "24h")]
    pub h24: T,
    #[serde(rename = "48h")]
    pub h48: T,
    #[serde(rename = "7d")]
    pub d7: T,
    #[serde(rename = "30d")]
    pub d30: T,
}

impl<T> PerWindow<T> {
    pub fn set(&mut self, window: TimeWindow, value: T) {
        match window {
            TimeWindow::H6 => self.h6 = value,
            TimeWindow::H12 => self.h12 = value,
            TimeWindow::H24 => self.h24 = value,
            TimeWindow::H48 => self.h48 = value,
            TimeWindow::D7 => self.d7 = value,
            TimeWindow::D30 => self.d30 = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_are_ordered_by_length() {
        let durations: Vec<Duration> = TimeWindow::ALL.iter().map(|w| w.duration()).collect();
        assert!(durations.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_per_window_serializes_with_labels() {
        let mut volume = PerWindow::<u64>::default();
        volume.set(TimeWindow::D7, 7);
        let json = serde_json::to_value(volume).unwrap();
        assert_eq!(json["7d"], 7);
        assert_eq!(json["6h"], 0);
        assert_eq!(volume.d7, 7);
    }
}
