//! Copyright-range rendering for generated project files.

/// Renders the copyright year range shown in generated file headers.
///
/// If `start` parses as an integer year strictly before `current_year`, the
/// result is `"start-current"`. If it parses but is not before the current
/// year, only the start year is shown. Anything that does not parse as an
/// integer is passed through unchanged, so free-text copyright fields keep
/// working.
#[must_use]
pub fn copyright_range(start: &str, current_year: i32) -> String {
    match start.trim().parse::<i32>() {
        Ok(start_year) if start_year < current_year => {
            format!("{start_year}-{current_year}")
        }
        Ok(start_year) => format!("{start_year}"),
        Err(_) => start.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_range_for_earlier_start() {
        assert_eq!(copyright_range("2019", 2024), "2019-2024");
    }

    #[test]
    fn renders_single_year_for_current_start() {
        assert_eq!(copyright_range("2024", 2024), "2024");
    }

    #[test]
    fn renders_single_year_for_future_start() {
        assert_eq!(copyright_range("2030", 2024), "2030");
    }

    #[test]
    fn passes_through_non_numeric_text() {
        assert_eq!(copyright_range("unknown", 2024), "unknown");
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(copyright_range(" 2019 ", 2024), "2019-2024");
    }
}
