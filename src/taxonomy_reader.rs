use thiserror::Error;

use crate::model::TaxonomyRank;

#[derive(Debug, Error)]
pub enum TaxonomyDumpError {
    #[error("{message}")]
    Malformed { message: String },
}

/// Splits a `.dmp` line on `|`, trimming each field and dropping the
/// trailing empty field the format's `\t|\n` line ending leaves behind.
pub fn split_dmp_file_line(line: &str) -> Vec<&str> {
    let fields: Vec<&str> = line.split('|').collect();
    let take = if fields.len() > 1 { fields.len() - 1 } else { fields.len() };
    fields[..take].iter().map(|field| field.trim()).collect()
}

fn field<'a>(fields: &'a [&'a str], index: usize) -> Result<&'a str, TaxonomyDumpError> {
    fields.get(index).copied().ok_or_else(|| TaxonomyDumpError::Malformed {
        message: format!("missing field {index}"),
    })
}

fn field_as_i64(fields: &[&str], index: usize) -> Result<i64, TaxonomyDumpError> {
    field(fields, index)?.parse().map_err(|_| TaxonomyDumpError::Malformed {
        message: format!("field {index} is not an integer"),
    })
}

/// Parses a `nodes.dmp` line into `(id, parent_id, rank)`. An unrecognised
/// rank name falls back to [`TaxonomyRank::NoRank`] rather than failing the
/// whole line, since the rank column has grown new values across taxdump
/// releases.
pub fn parse_node_line(line: &str) -> Result<(i64, i64, TaxonomyRank), TaxonomyDumpError> {
    let fields = split_dmp_file_line(line);
    let id = field_as_i64(&fields, 0)?;
    let parent_id = field_as_i64(&fields, 1)?;
    let rank = field(&fields, 2)
        .ok()
        .and_then(TaxonomyRank::from_str)
        .unwrap_or(TaxonomyRank::NoRank);
    Ok((id, parent_id, rank))
}

/// Parses a `names.dmp` line into `(id, name, name_class)`.
pub fn parse_name_line(line: &str) -> Result<(i64, String, String), TaxonomyDumpError> {
    let fields = split_dmp_file_line(line);
    let id = field_as_i64(&fields, 0)?;
    let name = field(&fields, 1)?.to_string();
    let name_class = field(&fields, 3)?.to_string();
    Ok((id, name, name_class))
}

/// Parses a `merged.dmp` line into `(source_id, target_id)`.
pub fn parse_merge_line(line: &str) -> Result<(i64, i64), TaxonomyDumpError> {
    let fields = split_dmp_file_line(line);
    Ok((field_as_i64(&fields, 0)?, field_as_i64(&fields, 1)?))
}

/// Parses a `delnodes.dmp` line into the deleted taxonomy id.
pub fn parse_delete_line(line: &str) -> Result<i64, TaxonomyDumpError> {
    let fields = split_dmp_file_line(line);
    field_as_i64(&fields, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_dmp_line_trimming_fields() {
        let line = "9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n";
        let fields = split_dmp_file_line(line);
        assert_eq!(fields, vec!["9606", "Homo sapiens", "", "scientific name"]);
    }

    #[test]
    fn parses_node_line() {
        let line = "9606\t|\t9605\t|\tspecies\t|\t...\t|\n";
        let (id, parent_id, rank) = parse_node_line(line).unwrap();
        assert_eq!(id, 9606);
        assert_eq!(parent_id, 9605);
        assert_eq!(rank, TaxonomyRank::Species);
    }

    #[test]
    fn unknown_rank_falls_back_to_no_rank() {
        let line = "1\t|\t1\t|\tnot a real rank\t|\n";
        let (_, _, rank) = parse_node_line(line).unwrap();
        assert_eq!(rank, TaxonomyRank::NoRank);
    }

    #[test]
    fn parses_name_line() {
        let line = "9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n";
        let (id, name, name_class) = parse_name_line(line).unwrap();
        assert_eq!(id, 9606);
        assert_eq!(name, "Homo sapiens");
        assert_eq!(name_class, "scientific name");
    }

    #[test]
    fn parses_merge_line() {
        let line = "12\t|\t9606\t|\n";
        assert_eq!(parse_merge_line(line).unwrap(), (12, 9606));
    }

    #[test]
    fn parses_delete_line() {
        let line = "12\t|\n";
        assert_eq!(parse_delete_line(line).unwrap(), 12);
    }

    #[test]
    fn malformed_line_is_an_error() {
        assert!(parse_node_line("not-a-number\t|\t1\t|\tspecies\t|\n").is_err());
    }
}
