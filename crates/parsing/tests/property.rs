use mapr_parsing::{Properties, TokenScanner, resolve_variables};
use proptest::prelude::*;

proptest! {
    #[test]
    fn rewrapping_callback_is_identity_without_escapes(text in "[^\\\\]{0,64}") {
        let scanner = TokenScanner::new("${", "}");
        let out = scanner.scan(&text, |key| format!("${{{key}}}"));
        prop_assert_eq!(out, text);
    }

    #[test]
    fn text_without_open_delimiter_is_unchanged(text in "[a-z0-9 {}$\\\\#]{0,64}") {
        prop_assume!(!text.contains("${"));
        let vars: Properties = [("a", "1")].into_iter().collect();
        prop_assert_eq!(resolve_variables(&text, Some(&vars)), text);
    }

    #[test]
    fn known_key_is_replaced_in_context(
        prefix in "[a-z :/]{0,16}",
        key in "[a-z][a-z0-9.]{0,8}",
        value in "[^$\\\\{}]{0,16}",
        suffix in "[a-z :/]{0,16}",
    ) {
        let vars: Properties = [(key.clone(), value.clone())].into_iter().collect();
        let text = format!("{prefix}${{{key}}}{suffix}");
        prop_assert_eq!(resolve_variables(&text, Some(&vars)), format!("{prefix}{value}{suffix}"));
    }

    #[test]
    fn unknown_keys_pass_through(key in "[a-z][a-z0-9]{0,8}") {
        let text = format!("${{{key}}}");
        prop_assert_eq!(resolve_variables(&text, Some(&Properties::new())), text.clone());
        prop_assert_eq!(resolve_variables(&text, None), text);
    }
}
