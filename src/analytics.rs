use std::collections::HashMap;

use chrono::Datelike;

use crate::models::{Category, Feedback, Ratings};

pub const TREND_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeacherStats {
    pub total: usize,
    pub avg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMeans {
    pub teaching_quality: f64,
    pub subject_clarity: f64,
    pub interaction: f64,
    pub preparation: f64,
    pub punctuality: f64,
}

impl CategoryMeans {
    pub const ZERO: CategoryMeans = CategoryMeans {
        teaching_quality: 0.0,
        subject_clarity: 0.0,
        interaction: 0.0,
        preparation: 0.0,
        punctuality: 0.0,
    };

    pub fn get(&self, category: Category) -> f64 {
        match category {
            Category::TeachingQuality => self.teaching_quality,
            Category::SubjectClarity => self.subject_clarity,
            Category::Interaction => self.interaction,
            Category::Preparation => self.preparation,
            Category::Punctuality => self.punctuality,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarBucket {
    Five,
    Four,
    Three,
    Two,
    One,
}

impl StarBucket {
    pub const ALL: [StarBucket; 5] = [
        StarBucket::Five,
        StarBucket::Four,
        StarBucket::Three,
        StarBucket::Two,
        StarBucket::One,
    ];

    pub fn for_average(avg: f64) -> Self {
        if avg >= 4.5 {
            StarBucket::Five
        } else if avg >= 4.0 {
            StarBucket::Four
        } else if avg >= 3.0 {
            StarBucket::Three
        } else if avg >= 2.0 {
            StarBucket::Two
        } else {
            StarBucket::One
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StarBucket::Five => "5 Stars",
            StarBucket::Four => "4 Stars",
            StarBucket::Three => "3 Stars",
            StarBucket::Two => "2 Stars",
            StarBucket::One => "1 Star",
        }
    }

    fn index(&self) -> usize {
        match self {
            StarBucket::Five => 0,
            StarBucket::Four => 1,
            StarBucket::Three => 2,
            StarBucket::Two => 3,
            StarBucket::One => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceLevel {
    Exceptional,
    Excellent,
    Good,
    NeedsImprovement,
}

impl PerformanceLevel {
    pub fn for_average(avg: f64) -> Self {
        if avg >= 4.5 {
            PerformanceLevel::Exceptional
        } else if avg >= 4.0 {
            PerformanceLevel::Excellent
        } else if avg >= 3.0 {
            PerformanceLevel::Good
        } else {
            PerformanceLevel::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PerformanceLevel::Exceptional => "Exceptional",
            PerformanceLevel::Excellent => "Excellent",
            PerformanceLevel::Good => "Good",
            PerformanceLevel::NeedsImprovement => "Needs Improvement",
        }
    }
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Bucket counts ordered from five stars down to one star.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StarHistogram {
    counts: [usize; 5],
}

impl StarHistogram {
    pub fn count(&self, bucket: StarBucket) -> usize {
        self.counts[bucket.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Percentage of all counted records that fell into `bucket`.
    pub fn share(&self, bucket: StarBucket) -> u32 {
        percentage(self.count(bucket), self.total())
    }

    pub fn iter(&self) -> impl Iterator<Item = (StarBucket, usize)> + '_ {
        StarBucket::ALL.into_iter().map(|b| (b, self.count(b)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub label: String,
    pub rating: f64,
    pub responses: usize,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn record_average(ratings: &Ratings) -> f64 {
    ratings.sum() as f64 / Category::ALL.len() as f64
}

/// Mean of per-record averages, unrounded. Zero for an empty set.
pub fn overall_average(feedbacks: &[Feedback]) -> f64 {
    if feedbacks.is_empty() {
        return 0.0;
    }
    let total: f64 = feedbacks.iter().map(|fb| record_average(&fb.ratings)).sum();
    total / feedbacks.len() as f64
}

pub fn teacher_stats(teacher_id: &str, feedbacks: &[Feedback]) -> TeacherStats {
    let matching: Vec<Feedback> = feedbacks
        .iter()
        .filter(|fb| fb.teacher_id == teacher_id)
        .cloned()
        .collect();

    TeacherStats {
        total: matching.len(),
        avg: round2(overall_average(&matching)),
    }
}

pub fn category_means(feedbacks: &[Feedback]) -> CategoryMeans {
    if feedbacks.is_empty() {
        return CategoryMeans::ZERO;
    }
    let count = feedbacks.len() as f64;
    let mean = |category: Category| {
        let total: u32 = feedbacks
            .iter()
            .map(|fb| fb.ratings.get(category) as u32)
            .sum();
        round2(total as f64 / count)
    };

    CategoryMeans {
        teaching_quality: mean(Category::TeachingQuality),
        subject_clarity: mean(Category::SubjectClarity),
        interaction: mean(Category::Interaction),
        preparation: mean(Category::Preparation),
        punctuality: mean(Category::Punctuality),
    }
}

/// Highest-scoring category; ties resolve to the earlier category.
pub fn strongest_category(means: &CategoryMeans) -> Category {
    let mut best = Category::ALL[0];
    for category in Category::ALL.into_iter().skip(1) {
        if means.get(category) > means.get(best) {
            best = category;
        }
    }
    best
}

pub fn star_histogram(feedbacks: &[Feedback]) -> StarHistogram {
    let mut histogram = StarHistogram::default();
    for fb in feedbacks {
        let bucket = StarBucket::for_average(record_average(&fb.ratings));
        histogram.counts[bucket.index()] += 1;
    }
    histogram
}

/// Groups feedback by calendar month of creation, in first-seen order, and
/// keeps the last [`TREND_MONTHS`] buckets. Buckets are keyed by year and
/// month; the label carries the year only when the series spans several.
pub fn monthly_trend(feedbacks: &[Feedback]) -> Vec<TrendPoint> {
    let mut order: Vec<(i32, u32)> = Vec::new();
    let mut buckets: HashMap<(i32, u32), (f64, usize, String)> = HashMap::new();

    for fb in feedbacks {
        let key = (fb.created_at.year(), fb.created_at.month());
        let entry = buckets.entry(key).or_insert_with(|| {
            order.push(key);
            (0.0, 0, fb.created_at.format("%b").to_string())
        });
        entry.0 += record_average(&fb.ratings);
        entry.1 += 1;
    }

    let visible = &order[order.len().saturating_sub(TREND_MONTHS)..];
    let multi_year = visible
        .first()
        .is_some_and(|(first, _)| visible.iter().any(|(year, _)| year != first));

    visible
        .iter()
        .filter_map(|key| {
            let (sum, count, month_name) = buckets.remove(key)?;
            let label = if multi_year {
                format!("{month_name} {}", key.0)
            } else {
                month_name
            };
            Some(TrendPoint {
                label,
                rating: round2(sum / count as f64),
                responses: count,
            })
        })
        .collect()
}

/// Responses per month bucket, over the same buckets as [`monthly_trend`].
pub fn monthly_volume(feedbacks: &[Feedback]) -> Vec<(String, usize)> {
    monthly_trend(feedbacks)
        .into_iter()
        .map(|point| (point.label, point.responses))
        .collect()
}

/// Mean over teachers of each teacher's rounded average. Teachers without
/// feedback count as zero.
pub fn department_average<'a>(
    teacher_ids: impl IntoIterator<Item = &'a str>,
    feedbacks: &[Feedback],
) -> f64 {
    let averages: Vec<f64> = teacher_ids
        .into_iter()
        .map(|id| teacher_stats(id, feedbacks).avg)
        .collect();
    if averages.is_empty() {
        return 0.0;
    }
    averages.iter().sum::<f64>() / averages.len() as f64
}

pub fn response_share(stats: &TeacherStats, total_feedbacks: usize) -> u32 {
    percentage(stats.total, total_feedbacks)
}

pub fn completion_rate(submitted: usize, total_teachers: usize) -> u32 {
    percentage(submitted, total_teachers)
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

/// Case-insensitive match against a teacher's name, subject name, or code.
pub fn matches_search(
    term: &str,
    full_name: &str,
    subject_name: Option<&str>,
    subject_code: Option<&str>,
) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    [Some(full_name), subject_name, subject_code]
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}
