//! Display helpers.

use chrono::{DateTime, Datelike, Utc};

const MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Long French date, e.g. `3 mars 2024`.
pub fn long_date(at: &DateTime<Utc>) -> String {
    let month = MONTHS[at.month0() as usize];
    format!("{} {month} {}", at.day(), at.year())
}

/// Rating as shown next to the stars, e.g. `3,5/5`.
pub fn rating_label(rating: f32) -> String {
    format!("{rating}/5").replace('.', ",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_date() {
        let at: DateTime<Utc> = "2024-08-01T10:00:00Z".parse().unwrap();
        assert_eq!(long_date(&at), "1 août 2024");
    }

    #[test]
    fn test_rating_label() {
        assert_eq!(rating_label(3.5), "3,5/5");
        assert_eq!(rating_label(4.0), "4/5");
    }
}
