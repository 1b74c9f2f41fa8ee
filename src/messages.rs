//! User-facing messages
//!
//! Localization lives outside this crate. The connection manager only asks a
//! [`MessageCatalog`] for the text of a handful of well-known messages.

/// Messages the connection layer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// The remote domain runs a version the console does not support
    DomainVersionNotSupported,
    /// The connected user is not an administrator
    UserNotAdmin,
}

/// Source of localized message text
pub trait MessageCatalog: Send + Sync {
    /// Text for `key` in the first of `locales` the catalog knows
    fn localize(&self, key: MessageKey, locales: &[String]) -> String;
}

/// English-only catalog used when no localizer is plugged in
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultMessages;

impl MessageCatalog for DefaultMessages {
    fn localize(&self, key: MessageKey, _locales: &[String]) -> String {
        match key {
            MessageKey::DomainVersionNotSupported => "The WebLogic domain version is not supported",
            MessageKey::UserNotAdmin => {
                "The connected user is not an administrator; some pages and actions are unavailable"
            }
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_messages_ignore_locale() {
        let catalog = DefaultMessages;
        let en = catalog.localize(MessageKey::DomainVersionNotSupported, &["en-US".to_string()]);
        let fr = catalog.localize(MessageKey::DomainVersionNotSupported, &["fr".to_string()]);
        assert_eq!(en, fr);
        assert!(catalog.localize(MessageKey::UserNotAdmin, &[]).contains("not an administrator"));
    }
}
