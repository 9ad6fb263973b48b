//! Signup, contact and mail header tests
//!
//! - Benin phone numbers and departments
//! - Username and password rules used at signup
//! - `Name <addr>` sender headers

use proptest::prelude::*;
use shared::{
    is_benin_department, validate_benin_phone, validate_email, validate_password,
    validate_required, validate_username, Mailbox, MailboxError,
};

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_benin_phone_formats() {
        for phone in ["97123456", "0197123456", "+229 01 97 12 34 56", "0022997123456"] {
            assert!(validate_benin_phone(phone).is_ok(), "{} rejected", phone);
        }
        for phone in ["12345", "+33 6 12 34 56 78", "97-ABC-456", "0297123456"] {
            assert!(validate_benin_phone(phone).is_err(), "{} accepted", phone);
        }
    }

    #[test]
    fn test_departments() {
        assert!(is_benin_department("Zou"));
        assert!(is_benin_department(" atlantique "));
        assert!(is_benin_department("Ouémé"));
        assert!(!is_benin_department("Lagos"));
    }

    #[test]
    fn test_password_rules() {
        assert!(validate_password("recolte2024").is_ok());
        assert!(validate_password("court").is_err());
        assert!(validate_password("12345678").is_err());
    }

    #[test]
    fn test_username_rules() {
        assert!(validate_username("k.adjo+coop@zou").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("avec espace").is_err());
        assert!(validate_username(&"a".repeat(151)).is_err());
    }

    #[test]
    fn test_required_ignores_whitespace() {
        assert!(validate_required("Adhésion").is_ok());
        assert!(validate_required(" \t\n").is_err());
    }

    #[test]
    fn test_parse_sender_header() {
        let mailbox = Mailbox::parse("AgriTech-Bénin <noreply@agritech.bj>").unwrap();
        assert_eq!(mailbox.name.as_deref(), Some("AgriTech-Bénin"));
        assert_eq!(mailbox.email, "noreply@agritech.bj");
        assert_eq!(mailbox.to_string(), "AgriTech-Bénin <noreply@agritech.bj>");
    }

    #[test]
    fn test_parse_bare_and_quoted_addresses() {
        let bare = Mailbox::parse("contact@agritech.bj").unwrap();
        assert_eq!(bare.name, None);

        let quoted = Mailbox::parse("\"Coopérative du Zou\" <zou@agritech.bj>").unwrap();
        assert_eq!(quoted.name.as_deref(), Some("Coopérative du Zou"));
    }

    #[test]
    fn test_parse_rejects_malformed_headers() {
        assert_eq!(Mailbox::parse("   "), Err(MailboxError::Empty));
        assert!(matches!(
            Mailbox::parse("Nom <contact@agritech.bj"),
            Err(MailboxError::Malformed(_))
        ));
        assert!(matches!(
            Mailbox::parse("Nom <pas-une-adresse>"),
            Err(MailboxError::InvalidAddress(_))
        ));
    }
}

mod property_tests {
    use super::*;

    fn email_strategy() -> impl Strategy<Value = String> {
        "[a-z]{3,10}@[a-z]{3,8}\\.(bj|com|org)"
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        "[A-Za-z][A-Za-z -]{1,30}[A-Za-z]"
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_generated_emails_are_valid(email in email_strategy()) {
            prop_assert!(validate_email(&email).is_ok());
        }

        #[test]
        fn prop_named_header_splits_cleanly(name in name_strategy(), email in email_strategy()) {
            let mailbox = Mailbox::parse(&format!("{} <{}>", name, email)).unwrap();
            prop_assert_eq!(mailbox.name.as_deref(), Some(name.trim()));
            prop_assert_eq!(mailbox.email, email);
        }

        #[test]
        fn prop_eight_digit_numbers_are_valid(number in "[0-9]{8}") {
            prop_assert!(validate_benin_phone(&number).is_ok());
        }
    }
}
