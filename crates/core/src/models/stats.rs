use serde::{Deserialize, Serialize};

/// Headline figures for the dashboard stat cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_appointments: u64,
    pub active_patients: u64,
    pub active_doctors: u64,
    pub avg_rating: f64,
}

impl DashboardStats {
    /// Mean of `ratings` rounded to one decimal; `0.0` when there are none.
    pub fn average_rating(ratings: impl IntoIterator<Item = i32>) -> f64 {
        let (sum, count) = ratings
            .into_iter()
            .fold((0i64, 0u32), |(sum, count), r| (sum + i64::from(r), count + 1));
        if count == 0 {
            return 0.0;
        }
        let mean = sum as f64 / f64::from(count);
        (mean * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating_rounds_to_one_decimal() {
        assert_eq!(DashboardStats::average_rating([5, 4, 3]), 4.0);
        assert_eq!(DashboardStats::average_rating([5, 4, 4]), 4.3);
        assert_eq!(DashboardStats::average_rating([]), 0.0);
    }

    #[test]
    fn test_stats_use_camel_case_keys() {
        let stats = DashboardStats {
            total_appointments: 3,
            active_patients: 2,
            active_doctors: 1,
            avg_rating: 4.5,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalAppointments"], 3);
        assert_eq!(json["avgRating"], 4.5);
    }
}
