use std::io::Write;

use serde::Serialize;

use crate::analytics::{record_average, round2};
use crate::models::Feedback;

#[derive(Serialize)]
struct CsvRow<'a> {
    id: &'a str,
    student: &'a str,
    teacher_id: &'a str,
    teaching_quality: u8,
    subject_clarity: u8,
    interaction: u8,
    preparation: u8,
    punctuality: u8,
    average: f64,
    comment: &'a str,
    created_at: String,
}

/// Writes one CSV row per feedback record and returns the number written.
pub fn write_feedback_csv<W: Write>(writer: W, feedbacks: &[Feedback]) -> anyhow::Result<usize> {
    let mut out = csv::Writer::from_writer(writer);

    for fb in feedbacks {
        out.serialize(CsvRow {
            id: &fb.id,
            student: fb.student.as_ref().map(|s| s.full_name.as_str()).unwrap_or(""),
            teacher_id: &fb.teacher_id,
            teaching_quality: fb.ratings.teaching_quality,
            subject_clarity: fb.ratings.subject_clarity,
            interaction: fb.ratings.interaction,
            preparation: fb.ratings.preparation,
            punctuality: fb.ratings.punctuality,
            average: round2(record_average(&fb.ratings)),
            comment: fb.comment.as_deref().unwrap_or(""),
            created_at: fb.created_at.to_rfc3339(),
        })?;
    }

    out.flush()?;
    Ok(feedbacks.len())
}
