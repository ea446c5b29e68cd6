//! End-to-end token flow on a single node.
//!
//! A password grant issues tokens, the access token is kept in a persisted
//! token store, the refresh token is exchanged for a new access token, and
//! the verified identity drives policy enforcement.

mod common;

use std::sync::Arc;

use datum_access::{AccessError, Policy};
use datum_core::Profile;
use datum_storage::{Filesystem, MemoryFilesystem};
use datum_token::{
    AuthContext, BEARER, DEFAULT_ACCESS_TTL, ROOT_TOKEN_KEY, TokenProvider, TokenRequest,
    TokenStore,
};
use tokio_util::sync::CancellationToken;

use common::{BOB_ID, Node};

#[tokio::test]
async fn test_issue_store_refresh_enforce() {
    let node = Node::ed25519();
    node.add_profile(BOB_ID, "bob");
    let provider = node.provider();

    let issued = provider
        .token(&TokenRequest::password("bob", "ignored"))
        .await
        .unwrap();
    assert_eq!(issued.token_type, BEARER);
    assert_eq!(issued.expires_in, DEFAULT_ACCESS_TTL.as_secs());
    let refresh = issued.refresh_token.clone().unwrap();

    // Keep the access token as the node owner's token.
    let fs: Arc<dyn Filesystem> = Arc::new(MemoryFilesystem::new());
    let cancel = CancellationToken::new();
    let store = TokenStore::open(fs.clone(), "tokens.json", &cancel)
        .await
        .unwrap();
    store
        .put_token(ROOT_TOKEN_KEY, issued.access_token.clone(), &cancel)
        .await
        .unwrap();

    let reopened = TokenStore::open(fs, store.path().await.unwrap(), &cancel)
        .await
        .unwrap();
    let stored = reopened.raw_token(ROOT_TOKEN_KEY, &cancel).await.unwrap();
    assert_eq!(stored, issued.access_token);

    // Refresh yields a new access token only.
    let renewed = provider
        .token(&TokenRequest::refresh(refresh))
        .await
        .unwrap();
    assert!(renewed.refresh_token.is_none());

    // The verified identity is what the policy sees.
    let ctx = AuthContext::from_bearer_header(
        &format!("Bearer {}", renewed.access_token),
        node.keys.as_ref(),
        &node.clock,
    )
    .unwrap();
    let subject = ctx.subject().unwrap();
    assert_eq!(subject.as_str(), BOB_ID);

    let caller = Profile::new(subject, ctx.token().unwrap().username().unwrap());
    let policy = Policy::default_policy();
    let own = format!("dataset:{BOB_ID}:flights");

    assert!(policy.enforce(&caller, &own, "remote:push").is_ok());
    assert!(policy.enforce(&caller, "dataset:QmOther:flights", "remote:pull").is_ok());
    assert!(matches!(
        policy.enforce(&caller, "dataset:QmOther:flights", "remote:push"),
        Err(AccessError::AccessDenied)
    ));
}

#[tokio::test]
async fn test_unknown_user_and_unsupported_grants() {
    let node = Node::ed25519();
    node.add_profile(BOB_ID, "bob");
    let provider = node.provider();

    assert!(matches!(
        provider.token(&TokenRequest::password("mallory", "")).await,
        Err(datum_token::TokenError::InvalidCredentials)
    ));
    assert!(matches!(
        provider
            .token(&TokenRequest::new(datum_token::GrantType::ClientCredentials))
            .await,
        Err(datum_token::TokenError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn test_store_lists_tokens_for_remotes() {
    let node = Node::ed25519();
    node.add_profile(BOB_ID, "bob");
    let provider = node.provider();
    let store = TokenStore::in_memory();
    let cancel = CancellationToken::new();

    for remote in ["https://a.example", "https://b.example", "https://c.example"] {
        let issued = provider
            .token(&TokenRequest::password("bob", ""))
            .await
            .unwrap();
        store
            .put_token(remote, issued.access_token, &cancel)
            .await
            .unwrap();
    }

    let page = store.list_tokens(1, 1, &cancel).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].key, "https://b.example");

    store.delete_token("https://b.example", &cancel).await.unwrap();
    assert_eq!(store.list_tokens(0, 0, &cancel).await.unwrap().len(), 2);
}
