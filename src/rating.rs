use serde::{Deserialize, Serialize};

/// Value picked on the star control: 0 to 5 in half-star steps.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct StarRating(f64);

impl StarRating {
    pub const MAX: f64 = 5.0;

    pub fn new(stars: f64) -> Option<Self> {
        let doubled = stars * 2.0;
        if (0.0..=Self::MAX).contains(&stars) && doubled.fract() == 0.0 {
            Some(Self(stars))
        } else {
            None
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for StarRating {
    type Error = String;

    fn try_from(stars: f64) -> Result<Self, Self::Error> {
        Self::new(stars).ok_or_else(|| format!("{stars} is not a half-star step between 0 and 5"))
    }
}

impl From<StarRating> for f64 {
    fn from(rating: StarRating) -> Self {
        rating.0
    }
}

/// Fold `new_rating` into a running mean of `count` ratings.
///
/// `average` carries one decimal and `new_rating` is a half-star step, so the
/// mean is computed exactly in tenths and rounded half away from zero. The
/// input is trusted, range checks belong to [`StarRating`].
pub fn aggregate(average: f64, count: u32, new_rating: f64) -> (f64, u32) {
    let tenths = (average * 10.0).round() as u64;
    let halves = (new_rating * 2.0).round() as u64;
    let count_wide = u64::from(count);

    // mean * 10 == (count * tenths + 5 * halves) / (count + 1)
    let num = count_wide * tenths + 5 * halves;
    let den = count_wide + 1;
    let rounded = (2 * num + den) / (2 * den);

    (rounded as f64 / 10.0, count.saturating_add(1))
}
