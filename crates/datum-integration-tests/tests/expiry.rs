//! Token lifetimes driven by a manual clock.

#![allow(clippy::arithmetic_side_effects)]

mod common;

use std::time::Duration;

use datum_token::{
    DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, NumericDate, TokenError, TokenProvider, TokenRequest,
    parse_token,
};

use common::{Node, T0};

#[tokio::test]
async fn test_access_and_refresh_lifetimes() {
    let node = Node::ed25519();
    node.add_profile("QmCarol", "carol");
    let provider = node.provider();

    let issued = provider
        .token(&TokenRequest::password("carol", ""))
        .await
        .unwrap();
    let refresh = issued.refresh_token.unwrap();

    let access = parse_token(&issued.access_token, node.keys.as_ref(), &node.clock).unwrap();
    let access_ttl = i64::try_from(DEFAULT_ACCESS_TTL.as_secs()).unwrap();
    assert_eq!(
        access.claims().exp,
        Some(NumericDate::from_secs(T0 + access_ttl))
    );

    // Expiry is inclusive of the exp instant itself.
    node.clock.advance(DEFAULT_ACCESS_TTL);
    assert!(parse_token(&issued.access_token, node.keys.as_ref(), &node.clock).is_ok());
    node.clock.advance(Duration::from_millis(1));
    assert!(matches!(
        parse_token(&issued.access_token, node.keys.as_ref(), &node.clock),
        Err(TokenError::Expired)
    ));

    // The refresh token still works and yields a fresh access token.
    let renewed = provider
        .token(&TokenRequest::refresh(refresh.clone()))
        .await
        .unwrap();
    assert!(parse_token(&renewed.access_token, node.keys.as_ref(), &node.clock).is_ok());

    node.clock.advance(DEFAULT_REFRESH_TTL);
    assert!(matches!(
        provider.token(&TokenRequest::refresh(refresh)).await,
        Err(TokenError::Expired)
    ));
}

#[tokio::test]
async fn test_custom_ttls() {
    let node = Node::ed25519();
    node.add_profile("QmCarol", "carol");
    let provider = node
        .provider()
        .with_access_ttl(Duration::from_secs(30))
        .with_refresh_ttl(Duration::from_secs(90));

    let issued = provider
        .token(&TokenRequest::password("carol", ""))
        .await
        .unwrap();
    assert_eq!(issued.expires_in, 30);

    node.clock.advance(Duration::from_secs(31));
    assert!(parse_token(&issued.access_token, node.keys.as_ref(), &node.clock).is_err());
    assert!(
        provider
            .token(&TokenRequest::refresh(issued.refresh_token.unwrap()))
            .await
            .is_ok()
    );
}
