//! Case conversion for sort properties: clients send camelCase, columns are snake_case.

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "creationDate" -> "creation_date"; snake_case input is returned unchanged.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a comma-separated property list into snake_case column names, skipping blanks.
pub fn properties_to_columns(properties: &str) -> Vec<String> {
    properties
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(to_snake_case)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_to_snake() {
        assert_eq!(to_snake_case("creationDate"), "creation_date");
        assert_eq!(to_snake_case("urlFriendlyTitle"), "url_friendly_title");
        assert_eq!(to_snake_case("creation_date"), "creation_date");
        assert_eq!(to_snake_case("name"), "name");
    }

    #[test]
    fn splits_property_lists() {
        assert_eq!(
            properties_to_columns(" name, creationDate ,,"),
            vec!["name".to_string(), "creation_date".to_string()]
        );
        assert!(properties_to_columns("").is_empty());
    }
}
