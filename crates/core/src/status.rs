//! Status translation between review-system codes and sheet labels.
//!
//! The two directions use separate tables on purpose: the export table
//! covers the submission statuses shown to clients, the import table the
//! labels offered in the "Notes Back" dropdown. Neither is the inverse of
//! the other. Unknown values pass through unchanged in both directions.

/// Review-system status code → label written to the submission sheet.
pub const EXPORT_STATUS_LABELS: &[(&str, &str)] = &[
    ("sndv0", "v000"),
    ("sndwip", "WIP"),
    ("sndcli", "For Final"),
    ("apv", "Delivery"),
    ("note", "Client Note"),
    ("di", "Delivered"),
];

/// Label typed into the "Notes Back" sheet → review-system status code.
pub const IMPORT_STATUS_CODES: &[(&str, &str)] = &[
    ("Client Note", "note"),
    ("Client Approved", "apv"),
    ("Hero Shot", "hero"),
];

fn lookup<'a>(table: &'a [(&'a str, &'a str)], key: &'a str) -> &'a str {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map_or(key, |(_, to)| to)
}

/// Label shown on export for a Version status code.
pub fn export_status_label(code: &str) -> &str {
    lookup(EXPORT_STATUS_LABELS, code)
}

/// Status code written on import for a sheet label.
pub fn import_status_code(label: &str) -> &str {
    lookup(IMPORT_STATUS_CODES, label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_labels_known_codes() {
        assert_eq!(export_status_label("sndv0"), "v000");
        assert_eq!(export_status_label("sndcli"), "For Final");
        assert_eq!(export_status_label("note"), "Client Note");
    }

    #[test]
    fn import_codes_known_labels() {
        assert_eq!(import_status_code("Client Note"), "note");
        assert_eq!(import_status_code("Client Approved"), "apv");
        assert_eq!(import_status_code("Hero Shot"), "hero");
    }

    #[test]
    fn unknown_values_pass_through() {
        assert_eq!(export_status_label("ip"), "ip");
        assert_eq!(import_status_code("Foo"), "Foo");
        assert_eq!(import_status_code(""), "");
    }

    #[test]
    fn tables_are_not_inverses() {
        // "apv" exports as "Delivery", but "Delivery" is not an import label.
        assert_eq!(export_status_label("apv"), "Delivery");
        assert_eq!(import_status_code("Delivery"), "Delivery");
        // "hero" has no export label at all.
        assert_eq!(export_status_label("hero"), "hero");
    }

    #[test]
    fn lookups_are_case_sensitive() {
        assert_eq!(import_status_code("client note"), "client note");
    }
}
