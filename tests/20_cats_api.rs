mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// End-to-end checks for the owner-based access policy on /api/cats:
// anonymous reads, authenticated creates with owner attribution, and
// owner-only mutation.

async fn create_cat(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Result<serde_json::Value> {
    let res = client
        .post(format!("{}/api/cats", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "color": "black", "birth_year": 2020 }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "create failed: {}",
        res.status()
    );
    let payload = res.json::<serde_json::Value>().await?;
    Ok(payload["data"].clone())
}

#[tokio::test]
async fn anonymous_create_is_unauthorized() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/cats", server.base_url))
        .json(&json!({ "name": "stray", "color": "grey", "birth_year": 2021 }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn created_cat_is_owned_by_its_creator() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (username, token) = common::signup_and_token(&client, &server.base_url, "owner").await?;
    let cat = create_cat(&client, &server.base_url, &token, "barsik").await?;

    assert_eq!(cat["owner"].as_str(), Some(username.as_str()));
    assert_eq!(cat["name"].as_str(), Some("barsik"));
    Ok(())
}

#[tokio::test]
async fn anyone_may_retrieve_a_cat() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_, token) = common::signup_and_token(&client, &server.base_url, "reader").await?;
    let cat = create_cat(&client, &server.base_url, &token, "vasya").await?;
    let id = cat["id"].as_str().expect("id");

    // No Authorization header at all
    let res = client
        .get(format!("{}/api/cats/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let payload = res.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["name"].as_str(), Some("vasya"));
    Ok(())
}

#[tokio::test]
async fn non_owner_mutations_are_forbidden_but_reads_allowed() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_, owner_token) = common::signup_and_token(&client, &server.base_url, "alice").await?;
    let (_, other_token) = common::signup_and_token(&client, &server.base_url, "bob").await?;
    let cat = create_cat(&client, &server.base_url, &owner_token, "ryzhik").await?;
    let id = cat["id"].as_str().expect("id");

    let put = client
        .put(format!("{}/api/cats/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .json(&json!({ "name": "stolen", "color": "red", "birth_year": 2018 }))
        .send()
        .await?;
    assert_eq!(put.status(), StatusCode::FORBIDDEN);

    let patch = client
        .patch(format!("{}/api/cats/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .json(&json!({ "name": "stolen" }))
        .send()
        .await?;
    assert_eq!(patch.status(), StatusCode::FORBIDDEN);

    let delete = client
        .delete(format!("{}/api/cats/{}", server.base_url, id))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(delete.status(), StatusCode::FORBIDDEN);

    // The same non-owner can still see the cat in the list
    let list = client
        .get(format!("{}/api/cats", server.base_url))
        .bearer_auth(&other_token)
        .send()
        .await?;
    assert_eq!(list.status(), StatusCode::OK);
    let payload = list.json::<serde_json::Value>().await?;
    let found = payload["data"]
        .as_array()
        .map(|cats| cats.iter().any(|c| c["id"].as_str() == Some(id)))
        .unwrap_or(false);
    assert!(found, "non-owner should see the cat in the list");

    Ok(())
}

#[tokio::test]
async fn owner_may_update_and_destroy() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_, token) = common::signup_and_token(&client, &server.base_url, "carol").await?;
    let cat = create_cat(&client, &server.base_url, &token, "snezhok").await?;
    let id = cat["id"].as_str().expect("id");

    let patch = client
        .patch(format!("{}/api/cats/{}", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "color": "white" }))
        .send()
        .await?;
    assert_eq!(patch.status(), StatusCode::OK);
    let payload = patch.json::<serde_json::Value>().await?;
    assert_eq!(payload["data"]["color"].as_str(), Some("white"));
    // Untouched field survives a partial update
    assert_eq!(payload["data"]["name"].as_str(), Some("snezhok"));

    let delete = client
        .delete(format!("{}/api/cats/{}", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(delete.status(), StatusCode::NO_CONTENT);

    let gone = client
        .get(format!("{}/api/cats/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn list_supports_filter_and_ordering() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_, token) = common::signup_and_token(&client, &server.base_url, "dave").await?;

    for (name, color, year) in
        [("older", "tortie", 2010), ("younger", "tortie", 2022), ("other", "cream", 2015)]
    {
        let res = client
            .post(format!("{}/api/cats", server.base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "color": color, "birth_year": year }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = client
        .get(format!("{}/api/cats?color=tortie&ordering=-birth_year", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let payload = res.json::<serde_json::Value>().await?;
    let cats = payload["data"].as_array().cloned().unwrap_or_default();
    assert!(cats.len() >= 2, "expected at least the two tortie cats");
    for cat in &cats {
        assert_eq!(cat["color"].as_str(), Some("tortie"));
    }
    let mut prev: Option<i64> = None;
    for cat in &cats {
        let year = cat["birth_year"].as_i64().expect("birth_year");
        if let Some(p) = prev {
            assert!(p >= year, "expected descending birth_year: prev={}, curr={}", p, year);
        }
        prev = Some(year);
    }

    let bad = client
        .get(format!("{}/api/cats?ordering=owner_id", server.base_url))
        .send()
        .await?;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
