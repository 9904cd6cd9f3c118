//! Evaluation prompt rendering.
//!
//! One fixed instruction block plus the caller's scoring bounds. No
//! timestamps, no randomness: the same bounds always produce the same prompt.

/// Instruction block sent ahead of the attached documents.
///
/// The required output structure (per-CV score, pass/fail, bullet reasons,
/// interview questions on pass, trailing CV count) is part of the contract
/// downstream consumers parse, so changes here are breaking.
const INSTRUCTIONS: &str = "\
You are the CV screening and evaluation bot.
Analyze **all** CVs against the provided criteria PDF.
You will be given at least 2 files. Only one of them is the criteria file; identify it before evaluating.
- Restate which file is the criteria file.
- Each CV is a separate PDF file provided alongside this prompt.
- Show the name of the applicant next to each CV.
- Provide a score for **each** CV (e.g. 7/10, respecting the maximum score below).
- If the score meets or exceeds the passing rate below, the applicant **passes**.
- State clearly for each applicant: \"I [agree/disagree] on accepting the applicant\".
- List reasons for the decision using \"- \" bullet points.
- If the CV **passes**, suggest at least 3 relevant interview questions based on the CV and the criteria.
- Count and display the **total number of CVs** analyzed at the end.";

/// Renders the evaluation prompt for the given scoring bounds.
///
/// Pure and total; `min_score < max_score` is the caller's responsibility.
pub fn build(min_score: i64, max_score: i64) -> String {
    format!(
        "{INSTRUCTIONS}\n\nMaximum rating score must be: {max_score}\nTo pass, the minimum score to pass must be: {min_score}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build(3, 9), build(3, 9));
    }

    #[test]
    fn test_build_contains_bounds() {
        let prompt = build(3, 9);
        assert!(prompt.contains("3"));
        assert!(prompt.contains("9"));
        assert!(prompt.contains("Maximum rating score must be: 9"));
        assert!(prompt.contains("the minimum score to pass must be: 3"));
    }

    #[test]
    fn test_build_differs_across_bounds() {
        assert_ne!(build(3, 9), build(4, 9));
        assert_ne!(build(3, 9), build(3, 10));
    }

    #[test]
    fn test_build_keeps_required_output_structure() {
        let prompt = build(1, 5);
        assert!(prompt.contains("criteria file"));
        assert!(prompt.contains("bullet points"));
        assert!(prompt.contains("interview questions"));
        assert!(prompt.contains("total number of CVs"));
    }
}
