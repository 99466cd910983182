use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::whole_years_between;

pub fn age(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    whole_years_between(birth_date, today)
}

/// Completed years of service; employees without a hire date have none.
pub fn tenure_years(hire_date: Option<NaiveDate>, today: NaiveDate) -> i32 {
    hire_date
        .map(|hired| whole_years_between(hired, today))
        .unwrap_or(0)
}

/// Eight hex characters used when a department is saved without a code.
pub fn generate_department_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Keep the birth-date prefix of a resident registration number and hide the
/// rest, e.g. `900101-1234567` becomes `900101-*******`.
pub fn mask_resident_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let prefix: String = match trimmed.split_once('-') {
        Some((head, _)) => head.to_string(),
        None => trimmed.chars().take(6).collect(),
    };
    if prefix.is_empty() {
        return String::new();
    }
    format!("{}-*******", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn missing_hire_date_means_no_tenure() {
        assert_eq!(tenure_years(None, d(2024, 1, 1)), 0);
        assert_eq!(tenure_years(Some(d(2019, 1, 2)), d(2024, 1, 1)), 4);
    }

    #[test]
    fn age_counts_birthdays() {
        assert_eq!(age(d(1990, 8, 31), d(2024, 8, 30)), 33);
        assert_eq!(age(d(1990, 8, 31), d(2024, 8, 31)), 34);
    }

    #[test]
    fn generated_codes_are_short_hex() {
        let code = generate_department_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn resident_ids_are_masked() {
        assert_eq!(mask_resident_id("900101-1234567"), "900101-*******");
        assert_eq!(mask_resident_id("9001011234567"), "900101-*******");
        assert_eq!(mask_resident_id("  "), "");
    }
}
