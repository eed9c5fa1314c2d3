//! # Variance test results definitions
//!
//! At the end of each lane the harness flushes the accumulated squared
//! errors to a results artifact: one line per sample at 7 decimal places,
//! followed by a `Standard deviation:` trailer line.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// Summary statistics over one lane's squared errors.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct ResultsSummary {
    /// Mean of the squared errors.
    pub mean: f64,

    /// Population standard deviation of the squared errors.
    pub std_dev: f64,

    /// Number of samples in the lane.
    pub num_samples: usize,
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Compute the summary statistics for a sequence of squared errors.
///
/// Returns `None` for an empty sequence.
pub fn summarise(errors: &[f64]) -> Option<ResultsSummary> {
    if errors.is_empty() {
        return None;
    }

    let num_samples = errors.len();
    let mean = errors.iter().sum::<f64>() / num_samples as f64;

    let variance = errors
        .iter()
        .map(|e| (e - mean).powi(2))
        .sum::<f64>()
        / num_samples as f64;

    Some(ResultsSummary {
        mean,
        std_dev: variance.sqrt(),
        num_samples,
    })
}

/// Format a sequence of squared errors as a results artifact body.
///
/// Returns `None` for an empty sequence, there is nothing to flush.
pub fn format_results(errors: &[f64]) -> Option<String> {
    let summary = summarise(errors)?;

    let mut body = String::new();

    for error in errors {
        body.push_str(&format!("{:.7}\n", error));
    }

    body.push_str(&format!("Standard deviation: {:.7}\n", summary.std_dev));

    Some(body)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_summarise() {
        let summary = summarise(&[1.0, 4.0, 9.0]).unwrap();

        assert!((summary.mean - 4.666667).abs() < 1e-6);
        assert!((summary.std_dev - 3.2998316).abs() < 1e-7);
        assert_eq!(summary.num_samples, 3);

        assert!(summarise(&[]).is_none());
    }

    #[test]
    fn test_format_results() {
        let body = format_results(&[1.0, 4.0, 9.0]).unwrap();

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "1.0000000");
        assert_eq!(lines[1], "4.0000000");
        assert_eq!(lines[2], "9.0000000");
        assert_eq!(lines[3], "Standard deviation: 3.2998316");

        assert!(format_results(&[]).is_none());
    }
}
