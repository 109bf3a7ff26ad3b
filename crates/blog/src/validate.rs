use inkpost_core::{DomainError, DomainResult};

pub(crate) fn required(field: &'static str, value: &str, max: usize) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    at_most(field, value, max)
}

pub(crate) fn at_most(field: &'static str, value: &str, max: usize) -> DomainResult<()> {
    if value.chars().count() > max {
        return Err(DomainError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn between(field: &'static str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(DomainError::validation(
            field,
            format!("must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

pub(crate) fn email(value: &str) -> DomainResult<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(DomainError::validation("email", "must be a valid email address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_requires_local_part_and_dotted_domain() {
        assert!(email("ada@example.com").is_ok());
        assert!(email("ada@example").is_err());
        assert!(email("@example.com").is_err());
        assert!(email("ada@.com").is_err());
        assert!(email("ada example@x.com").is_err());
        assert!(email("plain").is_err());
    }

    #[test]
    fn length_checks_count_characters() {
        assert!(at_most("bio", "ééé", 3).is_ok());
        assert!(at_most("bio", "éééé", 3).is_err());
        assert!(required("title", "   ", 10).is_err());
        assert!(between("password", "12345678", 9, 32).is_err());
        assert!(between("password", "123456789", 9, 32).is_ok());
    }
}
