use chrono::{Datelike, Local, NaiveDate};

use crate::models::resume::{non_blank, Profile};

const RESERVED: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Derives the export file name from the profile, e.g. `李明_工程师_简历.pdf`.
pub fn generate_export_filename(profile: &Profile, format: &str) -> String {
    generate_export_filename_on(profile, format, Local::now().date_naive())
}

/// Same as [`generate_export_filename`] with an explicit "today".
pub fn generate_export_filename_on(profile: &Profile, format: &str, today: NaiveDate) -> String {
    let name = Some(profile.name.trim()).filter(|n| !n.is_empty());
    let title = non_blank(&profile.title);

    let base = match (name, title) {
        (Some(name), Some(title)) => format!("{name}_{title}_简历"),
        (Some(name), None) => format!("{name}_简历"),
        _ => format!("简历_{}", locale_date(today)),
    };
    format!("{}.{format}", sanitize(&base))
}

/// `YYYY/M/D` as the zh-CN locale prints it, with separators turned into hyphens.
fn locale_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.year(), date.month(), date.day()).replace(['/', '\\'], "-")
}

fn sanitize(base: &str) -> String {
    base.chars()
        .map(|c| if RESERVED.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str, title: Option<&str>) -> Profile {
        Profile {
            name: name.into(),
            title: title.map(str::to_string),
            ..Default::default()
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 7).unwrap()
    }

    #[test]
    fn test_name_and_title() {
        assert_eq!(
            generate_export_filename(&profile("李明", Some("工程师")), "pdf"),
            "李明_工程师_简历.pdf"
        );
    }

    #[test]
    fn test_name_only() {
        assert_eq!(
            generate_export_filename(&profile("李明", None), "pdf"),
            "李明_简历.pdf"
        );
        assert_eq!(
            generate_export_filename(&profile("李明", Some("   ")), "png"),
            "李明_简历.png"
        );
    }

    #[test]
    fn test_neither_uses_date() {
        assert_eq!(
            generate_export_filename_on(&profile("  ", None), "pdf", day()),
            "简历_2026-3-7.pdf"
        );
        // A title without a name still falls back to the date form.
        assert_eq!(
            generate_export_filename_on(&profile("", Some("工程师")), "png", day()),
            "简历_2026-3-7.png"
        );
    }

    #[test]
    fn test_today_is_used_by_default() {
        let expected = format!("简历_{}.pdf", locale_date(Local::now().date_naive()));
        assert_eq!(generate_export_filename(&profile("", None), "pdf"), expected);
    }

    #[test]
    fn test_reserved_characters_sanitized() {
        assert_eq!(
            generate_export_filename(&profile("李/明", Some("C:\\dev*")), "pdf"),
            "李_明_C__dev__简历.pdf"
        );
        assert_eq!(
            generate_export_filename(&profile("a<b>|\"?", None), "png"),
            "a_b_____简历.png"
        );
    }

    #[test]
    fn test_names_are_trimmed() {
        assert_eq!(
            generate_export_filename(&profile(" 李明 ", Some(" 工程师 ")), "pdf"),
            "李明_工程师_简历.pdf"
        );
    }
}
