use heck::{ToSnakeCase, ToUpperCamelCase};

/// Naming conventions consulted while validating element descriptors.
///
/// The default policy covers the conventions the registry itself enforces;
/// callers with domain-specific vocabularies can supply their own.
pub trait NamingPolicy: Send + Sync {
    fn is_lower_snake_case(&self, value: &str) -> bool;
    fn is_upper_camel_case(&self, value: &str) -> bool;
    fn to_lower_snake_case(&self, value: &str) -> String;
    fn to_upper_camel_case(&self, value: &str) -> String;
    fn pluralize(&self, value: &str) -> String;
}

/// Fixed-point case checks over `heck` conversions plus a small English
/// pluralizer (regular forms and a short irregular table).
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultNamingPolicy;

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("child", "children"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("person", "people"),
];

impl NamingPolicy for DefaultNamingPolicy {
    fn is_lower_snake_case(&self, value: &str) -> bool {
        !value.is_empty() && value == self.to_lower_snake_case(value)
    }

    fn is_upper_camel_case(&self, value: &str) -> bool {
        !value.is_empty() && value == self.to_upper_camel_case(value)
    }

    fn to_lower_snake_case(&self, value: &str) -> String {
        value.to_snake_case()
    }

    fn to_upper_camel_case(&self, value: &str) -> String {
        value.to_upper_camel_case()
    }

    fn pluralize(&self, value: &str) -> String {
        if let Some((_, plural)) = IRREGULAR_PLURALS
            .iter()
            .find(|(singular, _)| *singular == value)
        {
            return (*plural).to_string();
        }
        let mut chars = value.chars().rev();
        let last = chars.next();
        let second_last = chars.next();
        match last {
            Some('y') if !matches!(second_last, Some('a' | 'e' | 'i' | 'o' | 'u')) => {
                format!("{}ies", &value[..value.len() - 1])
            }
            Some('s' | 'x' | 'z') => format!("{value}es"),
            Some('h') if matches!(second_last, Some('c' | 's')) => format!("{value}es"),
            _ => format!("{value}s"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_snake_case_checks() {
        let naming = DefaultNamingPolicy;
        assert!(naming.is_lower_snake_case("catalog"));
        assert!(naming.is_lower_snake_case("uibinder_file"));
        assert!(!naming.is_lower_snake_case("UibinderFile"));
        assert!(!naming.is_lower_snake_case("uibinderFile"));
        assert!(!naming.is_lower_snake_case(""));
        assert_eq!(naming.to_lower_snake_case("UibinderFile"), "uibinder_file");
    }

    #[test]
    fn upper_camel_case_checks() {
        let naming = DefaultNamingPolicy;
        assert!(naming.is_upper_camel_case("UibinderFile"));
        assert!(!naming.is_upper_camel_case("uibinder_file"));
        assert!(!naming.is_upper_camel_case(""));
        assert_eq!(naming.to_upper_camel_case("uibinder_file"), "UibinderFile");
    }

    #[test]
    fn pluralize_regular_and_irregular_forms() {
        let naming = DefaultNamingPolicy;
        assert_eq!(naming.pluralize("catalog"), "catalogs");
        assert_eq!(naming.pluralize("repository"), "repositories");
        assert_eq!(naming.pluralize("key"), "keys");
        assert_eq!(naming.pluralize("class"), "classes");
        assert_eq!(naming.pluralize("box"), "boxes");
        assert_eq!(naming.pluralize("branch"), "branches");
        assert_eq!(naming.pluralize("child"), "children");
    }
}
