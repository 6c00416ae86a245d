use std::{env, path::Path};

use crate::error::{ExportError, Result};

pub const ACCESS_TOKEN_ENV: &str = "GA_ACCESS_TOKEN";

/// Token file in the shape an OAuth token endpoint returns it.
#[derive(serde::Deserialize)]
struct TokenFile {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    /// Space separated, as granted
    #[serde(default)]
    scope: Option<String>,
}

/// A pre-provisioned bearer token. Debug output never shows the secret.
#[derive(Clone)]
pub struct AccessToken {
    token: String,
    granted_scopes: Option<Vec<String>>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("granted_scopes", &self.granted_scopes)
            .finish()
    }
}

impl AccessToken {
    /// `GA_ACCESS_TOKEN` wins over the credential file when set.
    pub fn load(credential_path: &Path, scopes: &[String]) -> Result<Self> {
        let token = match env::var(ACCESS_TOKEN_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self {
                token: raw.trim().to_string(),
                granted_scopes: None,
            },
            _ => Self::from_file(credential_path)?,
        };
        token.ensure_scopes(scopes)?;
        Ok(token)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExportError::Auth(format!("cannot read credential {}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let file: TokenFile = serde_json::from_str(contents)?;
        if file.access_token.trim().is_empty() {
            return Err(ExportError::Auth("credential has an empty access_token".into()));
        }
        if let Some(kind) = file.token_type.as_deref() {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(ExportError::Auth(format!(
                    "unsupported token type {kind}, expected Bearer"
                )));
            }
        }
        Ok(Self {
            token: file.access_token.trim().to_string(),
            granted_scopes: file
                .scope
                .map(|s| s.split_whitespace().map(str::to_string).collect()),
        })
    }

    /// Only checkable when the credential says what it was granted.
    pub fn ensure_scopes(&self, required: &[String]) -> Result<()> {
        let Some(granted) = &self.granted_scopes else {
            return Ok(());
        };
        let missing = required
            .iter()
            .filter(|scope| !granted.contains(*scope))
            .cloned()
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExportError::Auth(format!(
                "credential is missing scopes: {}",
                missing.join(" ")
            )))
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READONLY: &str = "https://www.googleapis.com/auth/analytics.readonly";

    #[test]
    fn parses_token_endpoint_shape() {
        let token = AccessToken::from_json(&format!(
            r#"{{"access_token": " ya29.abc ", "token_type": "Bearer", "expires_in": 3599, "scope": "{READONLY} openid"}}"#
        ))
        .unwrap();
        assert_eq!(token.secret(), "ya29.abc");
        token.ensure_scopes(&[READONLY.to_string()]).unwrap();
    }

    #[test]
    fn missing_scope_is_rejected() {
        let token =
            AccessToken::from_json(r#"{"access_token": "t", "scope": "openid"}"#).unwrap();
        let err = token.ensure_scopes(&[READONLY.to_string()]).unwrap_err();
        assert!(matches!(err, ExportError::Auth(msg) if msg.contains("analytics.readonly")));
    }

    #[test]
    fn unknown_grants_are_not_checked() {
        let token = AccessToken::from_json(r#"{"access_token": "t"}"#).unwrap();
        token.ensure_scopes(&[READONLY.to_string()]).unwrap();
    }

    #[test]
    fn empty_or_wrong_kind_of_token_is_rejected() {
        assert!(matches!(
            AccessToken::from_json(r#"{"access_token": "  "}"#),
            Err(ExportError::Auth(_))
        ));
        assert!(matches!(
            AccessToken::from_json(r#"{"access_token": "t", "token_type": "MAC"}"#),
            Err(ExportError::Auth(_))
        ));
    }

    #[test]
    fn debug_redacts_secret() {
        let token = AccessToken::from_json(r#"{"access_token": "super-secret"}"#).unwrap();
        assert!(!format!("{token:?}").contains("super-secret"));
    }

    #[test]
    fn unreadable_file_is_an_auth_error() {
        let err = AccessToken::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ExportError::Auth(_)));
    }
}
