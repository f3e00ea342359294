//! Deterministic ecosystem-native name normalization.

/// `npm`-style: lowercase, `_`/space become `-`.
pub fn npm_name(module: &str) -> String {
    module
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Python-style: lowercase, `-`/space become `_`.
pub fn python_name(module: &str) -> String {
    module
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Splits a Maven coordinate of the form `groupId:artifactId` into its
/// parts. If no `:` is present, `default_group` is used as the group.
pub fn maven_coordinate<'a>(coordinate: &'a str, default_group: &'a str) -> (&'a str, &'a str) {
    match coordinate.split_once(':') {
        Some((group, artifact)) => (group, artifact),
        None => (default_group, coordinate),
    }
}

#[cfg(test)]
mod tests {
    use simple_test_case::test_case;

    use super::*;

    #[test_case("My_Module Name", "my-module-name"; "underscore_and_space")]
    #[test_case("Already-Kebab", "already-kebab"; "leaves_hyphens_alone")]
    #[test_case("UPPER", "upper"; "lowercases")]
    #[test]
    fn npm_name_normalizes(input: &str, expected: &str) {
        assert_eq!(npm_name(input), expected);
    }

    #[test_case("My-Module Name", "my_module_name"; "hyphen_and_space")]
    #[test_case("already_snake", "already_snake"; "leaves_underscores_alone")]
    #[test_case("UPPER", "upper"; "lowercases")]
    #[test]
    fn python_name_normalizes(input: &str, expected: &str) {
        assert_eq!(python_name(input), expected);
    }

    #[test_case("com.example:widget", "default", ("com.example", "widget"); "explicit_group")]
    #[test_case("widget", "com.example", ("com.example", "widget"); "falls_back_to_default_group")]
    #[test]
    fn maven_coordinate_splits_on_colon(coordinate: &str, default_group: &str, expected: (&str, &str)) {
        assert_eq!(maven_coordinate(coordinate, default_group), expected);
    }
}
