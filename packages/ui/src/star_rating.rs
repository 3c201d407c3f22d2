//! # Star rating
//!
//! Five stars, each full, half or empty. Ratings live in `[0, 5]` in half-point
//! steps. Clicking a star cycles through its two values: a rating equal to the
//! star's position drops by half a point, a rating half a point below it rises
//! to the position, and any other rating jumps to the position.

use dioxus::prelude::*;

pub const STAR_COUNT: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StarFill {
    Full,
    Half,
    Empty,
}

impl StarFill {
    fn class(&self) -> &'static str {
        match self {
            StarFill::Full => "star star--full",
            StarFill::Half => "star star--half",
            StarFill::Empty => "star star--empty",
        }
    }
}

/// Fill of the star at `position` (1-based) for `rating`.
pub fn star_fill(rating: f32, position: u8) -> StarFill {
    let p = f32::from(position);
    if rating >= p {
        StarFill::Full
    } else if rating >= p - 0.5 {
        StarFill::Half
    } else {
        StarFill::Empty
    }
}

/// Rating after a click on the star at `position`.
pub fn next_rating(current: f32, position: u8) -> f32 {
    let p = f32::from(position);
    // p - 0.5 and any other value both land on p
    if same(current, p) {
        p - 0.5
    } else {
        p
    }
}

/// Clamp to `[0, 5]` and snap to the nearest half point.
pub fn normalize_rating(value: f32) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    (value.clamp(0.0, f32::from(STAR_COUNT)) * 2.0).round() / 2.0
}

fn same(a: f32, b: f32) -> bool {
    (a - b).abs() < f32::EPSILON
}

#[component]
pub fn StarRating(
    rating: f32,
    #[props(default)] read_only: bool,
    #[props(default)] on_change: EventHandler<f32>,
) -> Element {
    rsx! {
        div {
            class: if read_only { "star-rating star-rating--readonly" } else { "star-rating" },
            title: "{rating}/5",
            for position in 1..=STAR_COUNT {
                span {
                    key: "{position}",
                    class: star_fill(rating, position).class(),
                    style: if !read_only { "cursor: pointer;" },
                    onclick: move |_| {
                        if !read_only {
                            on_change.call(next_rating(rating, position));
                        }
                    },
                    "★"
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_table() {
        let fills: Vec<_> = (1..=STAR_COUNT).map(|p| star_fill(3.5, p)).collect();
        assert_eq!(
            fills,
            vec![
                StarFill::Full,
                StarFill::Full,
                StarFill::Full,
                StarFill::Half,
                StarFill::Empty
            ]
        );
        assert!((1..=STAR_COUNT).all(|p| star_fill(0.0, p) == StarFill::Empty));
        assert!((1..=STAR_COUNT).all(|p| star_fill(5.0, p) == StarFill::Full));
        assert_eq!(star_fill(0.5, 1), StarFill::Half);
    }

    #[test]
    fn test_click_cycles_half_and_full() {
        assert_eq!(next_rating(3.0, 3), 2.5);
        assert_eq!(next_rating(2.5, 3), 3.0);
        assert_eq!(next_rating(0.0, 4), 4.0);
        assert_eq!(next_rating(5.0, 2), 2.0);
        assert_eq!(next_rating(1.0, 1), 0.5);
        assert_eq!(next_rating(0.5, 1), 1.0);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_rating(7.0), 5.0);
        assert_eq!(normalize_rating(-1.0), 0.0);
        assert_eq!(normalize_rating(3.3), 3.5);
        assert_eq!(normalize_rating(3.2), 3.0);
        assert_eq!(normalize_rating(f32::NAN), 0.0);
    }

    /// Ratings 0, 0.5, ..., 5 as a count of half points.
    fn half_steps() -> impl Iterator<Item = (u8, f32)> {
        (0..=2 * STAR_COUNT).map(|halves| (halves, f32::from(halves) / 2.0))
    }

    #[test]
    fn test_fill_for_every_rating_and_star() {
        for (halves, rating) in half_steps() {
            for position in 1..=STAR_COUNT {
                let full_at = 2 * position;
                let expected = if halves >= full_at {
                    StarFill::Full
                } else if halves + 1 == full_at {
                    StarFill::Half
                } else {
                    StarFill::Empty
                };
                assert_eq!(
                    star_fill(rating, position),
                    expected,
                    "rating {rating}, star {position}"
                );
            }
        }
    }

    #[test]
    fn test_click_for_every_rating_and_star() {
        for (_, rating) in half_steps() {
            for position in 1..=STAR_COUNT {
                let star = f32::from(position);
                let expected = if rating == star { star - 0.5 } else { star };
                assert_eq!(
                    next_rating(rating, position),
                    expected,
                    "rating {rating}, star {position}"
                );
            }
        }
    }

    #[test]
    fn test_repeated_clicks_from_empty() {
        for position in 1..=STAR_COUNT {
            let star = f32::from(position);
            let mut rating = 0.0;
            let mut seen = Vec::new();
            for _ in 0..3 {
                rating = next_rating(rating, position);
                seen.push(rating);
            }
            assert_eq!(seen, vec![star, star - 0.5, star]);
        }
    }
}
