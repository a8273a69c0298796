use serde::de::DeserializeOwned;

/// Parse a snake_case enum value using serde-deserialization.
pub fn parse_enum<T>(raw: &str, field: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let normalized = raw.replace('-', "_");
    let json = format!("\"{normalized}\"");
    serde_json::from_str(&json).map_err(|error| anyhow::anyhow!("invalid {field} '{raw}': {error}"))
}

#[cfg(test)]
mod tests {
    use bursary_core::enums::AuditAction;

    use super::parse_enum;

    #[test]
    fn parses_snake_case_enum() {
        let action: AuditAction = parse_enum("delete", "action").expect("action should parse");
        assert_eq!(action, AuditAction::Delete);
    }

    #[test]
    fn parses_hyphenated_alias() {
        let action: AuditAction =
            parse_enum("validation-error", "action").expect("action should parse");
        assert_eq!(action, AuditAction::ValidationError);
    }

    #[test]
    fn errors_on_invalid_enum() {
        let err = parse_enum::<AuditAction>("archive", "action").expect_err("should fail");
        assert!(err.to_string().contains("invalid action 'archive'"));
    }
}
