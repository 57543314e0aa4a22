use crate::analysis::models::RankingReport;
use crate::export::ExportError;

pub const CSV_PREFIX: &str = "resume_rankings";

const HEADER: [&str; 6] = [
    "rank",
    "filename",
    "match_percentage",
    "matched_keywords",
    "missing_keywords",
    "error",
];
const LIST_SEPARATOR: &str = "; ";

/// One row per uploaded file, in ranked order. Failed files keep a blank
/// percentage and carry their error message.
pub fn render_csv(report: &RankingReport) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    for entry in &report.entries {
        let rank = entry.rank.map(|r| r.to_string()).unwrap_or_default();
        let percentage = entry
            .match_percentage()
            .map(|p| p.to_string())
            .unwrap_or_default();
        let (matched, missing) = entry
            .result()
            .map(|r| {
                (
                    r.matched_keywords.join(LIST_SEPARATOR),
                    r.missing_keywords.join(LIST_SEPARATOR),
                )
            })
            .unwrap_or_default();

        writer.write_record([
            rank.as_str(),
            entry.filename.as_str(),
            percentage.as_str(),
            matched.as_str(),
            missing.as_str(),
            entry.error().unwrap_or_default(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
