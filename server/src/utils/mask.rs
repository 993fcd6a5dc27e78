/// Masks secrets before they reach the logs.
pub fn mask_sensitive(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let len = chars.len();
    if len <= 4 {
        return "*".repeat(len);
    }

    let head: String = chars[..2].iter().collect();
    let tail: String = chars[len - 2..].iter().collect();
    format!("{}{}{}", head, "*".repeat(len - 4), tail)
}

/// Keeps the domain readable: `operations@example.com` -> `op******ns@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", mask_sensitive(local), domain),
        None => mask_sensitive(email),
    }
}

/// Shortens bearer tokens for diagnostics.
pub fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(12).collect();
    if prefix.len() < token.len() {
        format!("{}… ({} chars)", prefix, token.chars().count())
    } else {
        mask_sensitive(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(mask_sensitive("MyPassword123"), "My*********23");
        assert_eq!(mask_sensitive("abc"), "***");
        assert_eq!(mask_sensitive(""), "");
    }

    #[test]
    fn test_mask_email_keeps_domain() {
        assert_eq!(mask_email("operations@example.com"), "op******ns@example.com");
        assert_eq!(mask_email("nobody"), "no**dy");
    }

    #[test]
    fn test_token_preview() {
        assert_eq!(
            token_preview("eyJhbGciOiJSUzI1NiIsImtpZCI6"),
            "eyJhbGciOiJS… (28 chars)"
        );
    }
}
