use proptest::prelude::*;
use tally_sync::{
    columns::normalize_column_name,
    data::CellValue,
    values::{normalize_course_number, normalize_days, normalize_for_compare},
};

#[test]
fn header_spellings_collapse_to_one_key() {
    for header in ["Crs No", "CRS_NO", "crs-no", " crs.no ", "CrsNo"] {
        assert_eq!(normalize_column_name(header), "crsno", "{header}");
    }
}

proptest! {
    #[test]
    fn normalize_column_name_is_idempotent(name in "[ -~]{0,24}") {
        let once = normalize_column_name(name.as_str());
        prop_assert_eq!(normalize_column_name(once.as_str()), once.clone());
    }

    #[test]
    fn normalize_column_name_ignores_case_and_separators(
        segments in proptest::collection::vec("[A-Za-z0-9]{1,6}", 1..4),
        separator in prop_oneof![Just(" "), Just("_"), Just("-"), Just(". "), Just("#")],
    ) {
        let joined = segments.join(separator);
        let compact = segments.concat().to_lowercase();
        prop_assert_eq!(normalize_column_name(joined.to_uppercase().as_str()), compact);
    }

    #[test]
    fn days_ignore_interior_whitespace(days in proptest::collection::vec("[MTWRF]", 1..5)) {
        let spaced = CellValue::text(days.join(" "));
        let compact = CellValue::text(days.concat());
        prop_assert_eq!(normalize_days(&spaced), normalize_days(&compact));
    }

    #[test]
    fn course_number_text_and_number_agree(number in 0i64..100_000, pad in 0usize..3) {
        let text = format!("{}{number}{}", " ".repeat(pad), " ".repeat(pad));
        prop_assert_eq!(normalize_course_number(&CellValue::text(text)), number);
        prop_assert_eq!(normalize_course_number(&CellValue::Number(number as f64)), number);
    }

    #[test]
    fn whole_numbers_compare_equal_to_their_text(number in -10_000i64..10_000) {
        prop_assert_eq!(
            normalize_for_compare(&CellValue::Number(number as f64)),
            normalize_for_compare(&CellValue::text(number.to_string()))
        );
    }
}
