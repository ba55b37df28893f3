use crate::error::AdpulseError;
use oauth2::basic::{
    BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
    BasicTokenType,
};
use oauth2::{
    Client as OAuth2Client, ClientId, ClientSecret, EmptyExtraTokenFields, EndpointNotSet,
    EndpointSet, StandardRevocableToken, StandardTokenResponse, TokenUrl,
};

/// Google token endpoint response. Ads refresh grants carry no extra fields we care about.
pub(crate) type OauthTokenResponse = StandardTokenResponse<EmptyExtraTokenFields, BasicTokenType>;

/// An OAuth2 client that can only redeem refresh tokens: the token URL is the single endpoint set.
///
/// Users paste a long-lived refresh token they minted elsewhere, so there is no
/// authorization-code leg and no redirect URL.
pub(crate) type RefreshOauth2Client = OAuth2Client<
    BasicErrorResponse,
    OauthTokenResponse,
    BasicTokenIntrospectionResponse,
    StandardRevocableToken,
    BasicRevocationErrorResponse,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Build a refresh-only OAuth2 client for one user's Google Cloud OAuth app.
pub(crate) fn build_refresh_client(
    client_id: &str,
    client_secret: &str,
    token_url: &str,
) -> Result<RefreshOauth2Client, AdpulseError> {
    let client = OAuth2Client::new(ClientId::new(client_id.to_string()))
        .set_client_secret(ClientSecret::new(client_secret.to_string()))
        .set_token_uri(TokenUrl::new(token_url.to_string())?);
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_token_url() {
        let err = build_refresh_client("id", "secret", "not a url").expect_err("must fail");
        assert!(matches!(err, AdpulseError::UrlError(_)));
    }

    #[test]
    fn builds_with_google_token_url() {
        assert!(
            build_refresh_client("id", "secret", "https://oauth2.googleapis.com/token").is_ok()
        );
    }
}
