use std::fmt;

/// A credential (the Discord bot token) that prints as `****` in logs, `Debug` output and error messages.
///
/// The wrapped value is only reachable through [`Secret::reveal`], which keeps the places that put the token on
/// the wire easy to find.
#[derive(Clone, Default)]
pub struct Secret<T>(T);

impl<T> Secret<T> {
    pub fn reveal(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// True when no credential was configured.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn tokens_are_masked() {
        let token = Secret::from("abc.def".to_string());
        assert_eq!(format!("{token}"), "****");
        assert_eq!(format!("{token:?}"), "****");
        assert_eq!(token.reveal(), "abc.def");
        assert!(!token.is_blank());
    }

    #[test]
    fn missing_tokens_are_blank() {
        assert!(Secret::<String>::default().is_blank());
        assert!(Secret::from("  ".to_string()).is_blank());
    }
}
