//! Renders amounts and dates as display strings.

use std::sync::OnceLock;

use numfmt::{Formatter, Precision};
use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};

use crate::Error;

/// Render an amount as a currency string.
///
/// Negative amounts get a `-$` prefix, e.g. `-$1,234.50`; zero renders as
/// `$0.00`. Always two decimal places.
pub fn currency(number: f64) -> String {
    // The trailing-zero fix below assumes at most two decimal places, so
    // round sub-cent fractions away first.
    let number = (number * 100.0).round() / 100.0;

    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .unwrap()
            .precision(Precision::Decimals(2))
    });

    let mut formatted_string = if number < 0.0 {
        negative_fmt.fmt_string(number.abs())
    } else if number > 0.0 {
        positive_fmt.fmt_string(number)
    } else {
        // Zero is hardcoded as "0", so we must specify the formatted string for zero
        "$0.00".to_owned()
    };

    // numfmt omits the last trailing zero, so we must add it ourselves
    // For example, "12.30" is rendered as "12.3" so we append "0".
    if formatted_string.as_bytes()[formatted_string.len() - 3] != b'.' {
        formatted_string = format!("{formatted_string}0");
    }

    formatted_string
}

/// The display format for transaction dates, e.g. "Sunday, 30 Aug 2026".
const LONG_DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[weekday repr:long], [day] [month repr:short] [year]");

/// Render a transaction date as a long display string, e.g.
/// "Sunday, 30 Aug 2026".
///
/// # Errors
/// Returns an [Error::DateFormat] if the date cannot be rendered.
pub fn long_date(date: OffsetDateTime) -> Result<String, Error> {
    date.format(LONG_DATE_FORMAT)
        .map_err(|error| Error::DateFormat(error.to_string()))
}

#[cfg(test)]
mod currency_tests {
    use super::currency;

    #[test]
    fn zero_renders_with_two_decimals() {
        assert_eq!(currency(0.0), "$0.00");
    }

    #[test]
    fn positive_amounts_get_dollar_prefix() {
        assert_eq!(currency(12.3), "$12.30");
        assert_eq!(currency(1234.56), "$1,234.56");
        assert_eq!(currency(2000.0), "$2,000.00");
    }

    #[test]
    fn negative_amounts_get_minus_dollar_prefix() {
        assert_eq!(currency(-4.5), "-$4.50");
        assert_eq!(currency(-1234.56), "-$1,234.56");
    }

    #[test]
    fn sub_cent_amounts_round_to_the_nearest_cent() {
        assert_eq!(currency(0.001), "$0.00");
        assert_eq!(currency(-0.001), "$0.00");
        assert_eq!(currency(0.005), "$0.01");
        assert_eq!(currency(12.344), "$12.34");
        assert_eq!(currency(12.346), "$12.35");
    }
}

#[cfg(test)]
mod long_date_tests {
    use time::macros::datetime;

    use super::long_date;

    #[test]
    fn renders_weekday_day_month_year() {
        let formatted = long_date(datetime!(2024-08-07 12:00 UTC)).unwrap();

        assert_eq!(formatted, "Wednesday, 07 Aug 2024");
    }

    #[test]
    fn uses_the_date_as_given_without_timezone_conversion() {
        let formatted = long_date(datetime!(2024-12-31 23:30 -05:00)).unwrap();

        assert_eq!(formatted, "Tuesday, 31 Dec 2024");
    }
}
