use chrono::NaiveDate;

use crate::error::AppError;

/// Validate a registration number (1-32 ASCII letters or digits) and return it trimmed.
pub fn validate_reg_no(reg_no: &str) -> Result<&str, AppError> {
    let reg_no = reg_no.trim();
    if reg_no.is_empty() || reg_no.len() > 32 {
        return Err(AppError::Validation(
            "Registration number must be 1-32 characters".into(),
        ));
    }
    if !reg_no.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::Validation(
            "Registration number must contain only letters and digits".into(),
        ));
    }
    Ok(reg_no)
}

/// Parse a `YYYY-MM-DD` date of birth. Any other shape is rejected, including
/// dates without zero padding.
pub fn parse_date_of_birth(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    let well_formed = raw.len() == 10
        && raw.char_indices().all(|(i, c)| match i {
            4 | 7 => c == '-',
            _ => c.is_ascii_digit(),
        });
    if !well_formed {
        return Err(AppError::Validation(
            "Date of birth must be in YYYY-MM-DD format".into(),
        ));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Date of birth is not a valid calendar date".into()))
}

/// Login email of a student: lowercased registration number at the institution domain.
pub fn compute_student_email(reg_no: &str, domain: &str) -> String {
    format!(
        "{}@{}",
        reg_no.trim().to_lowercase(),
        domain.trim().trim_start_matches('@').to_lowercase()
    )
}

/// First-login password of a student: the date of birth as `DDMMYYYY`.
pub fn compute_initial_password(date_of_birth: NaiveDate) -> String {
    date_of_birth.format("%d%m%Y").to_string()
}
