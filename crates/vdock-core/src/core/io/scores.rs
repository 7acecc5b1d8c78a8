//! Score extraction from engine pose output.
//!
//! The docked output file carries one `REMARK VINA RESULT:` line per pose,
//! with the binding affinity (kcal/mol) as the first numeric field:
//!
//! ```text
//! REMARK VINA RESULT:      -4.9      0.000      0.000
//! ```

use std::io::{self, BufRead};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed score on line {line} (value: '{value}')")]
    InvalidScore { line: usize, value: String },
}

const RESULT_PREFIX: &str = "REMARK VINA RESULT:";

/// Extracts the per-pose affinity scores, in file order (best first).
pub fn parse_scores(reader: &mut impl BufRead) -> Result<Vec<f64>, ScoreError> {
    let mut scores = Vec::new();
    for (line_idx, line_res) in reader.lines().enumerate() {
        let line = line_res?;
        if !line.starts_with(RESULT_PREFIX) {
            continue;
        }
        let raw = line.split_whitespace().nth(3).unwrap_or("");
        let score = raw.parse().map_err(|_| ScoreError::InvalidScore {
            line: line_idx + 1,
            value: raw.to_string(),
        })?;
        scores.push(score);
    }
    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufReader;

    #[test]
    fn extracts_scores_in_order() {
        let input = "\
MODEL 1
REMARK VINA RESULT:      -7.3      0.000      0.000
ATOM      1  C   UNL     1       0.000   0.000   0.000
ENDMDL
MODEL 2
REMARK VINA RESULT:      -6.8      1.902      2.514
ENDMDL
";
        let scores = parse_scores(&mut BufReader::new(input.as_bytes())).unwrap();
        assert_eq!(scores, vec![-7.3, -6.8]);
    }

    #[test]
    fn files_without_results_yield_no_scores() {
        let scores = parse_scores(&mut BufReader::new("REMARK hello\n".as_bytes())).unwrap();
        assert!(scores.is_empty());
    }

    #[test]
    fn malformed_score_is_an_error() {
        let input = "REMARK VINA RESULT:      oops      0.000      0.000\n";
        assert!(matches!(
            parse_scores(&mut BufReader::new(input.as_bytes())),
            Err(ScoreError::InvalidScore { line: 1, .. })
        ));
    }
}
