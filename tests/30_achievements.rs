mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// Achievements carry no access restriction, and cats can embed them.

#[tokio::test]
async fn achievements_crud_is_open_to_anonymous() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let name = format!("mouser-{}", std::process::id());

    let res = client
        .post(format!("{}/api/achievements", server.base_url))
        .json(&json!({ "name": name }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let payload = res.json::<serde_json::Value>().await?;
    let id = payload["data"]["id"].as_str().expect("id").to_string();

    let renamed = format!("{}-renamed", name);
    let res = client
        .put(format!("{}/api/achievements/{}", server.base_url, id))
        .json(&json!({ "name": renamed }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/api/achievements/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/api/achievements/{}", server.base_url, id))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn cats_embed_achievements_and_search_matches_them() -> Result<()> {
    if !common::database_available() {
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (_, token) = common::signup_and_token(&client, &server.base_url, "trainer").await?;

    let badge = format!("acrobat-{}", std::process::id());
    let res = client
        .post(format!("{}/api/achievements", server.base_url))
        .json(&json!({ "name": badge }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let payload = res.json::<serde_json::Value>().await?;
    let badge_id = payload["data"]["id"].as_str().expect("id").to_string();

    let res = client
        .post(format!("{}/api/cats", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "kuzya",
            "color": "tabby",
            "birth_year": 2019,
            "achievements": [badge_id],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let payload = res.json::<serde_json::Value>().await?;
    let cat_id = payload["data"]["id"].as_str().expect("id").to_string();
    let embedded = payload["data"]["achievements"].as_array().cloned().unwrap_or_default();
    assert_eq!(embedded.len(), 1);
    assert_eq!(embedded[0]["name"].as_str(), Some(badge.as_str()));

    // Search by achievement name finds the cat
    let res = client
        .get(format!("{}/api/cats?search={}", server.base_url, badge))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let payload = res.json::<serde_json::Value>().await?;
    let found = payload["data"]
        .as_array()
        .map(|cats| cats.iter().any(|c| c["id"].as_str() == Some(cat_id.as_str())))
        .unwrap_or(false);
    assert!(found, "search by achievement name should find the cat");

    // Unknown achievement ids are a validation error
    let res = client
        .post(format!("{}/api/cats", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "ghost",
            "color": "grey",
            "birth_year": 2020,
            "achievements": ["00000000-0000-0000-0000-000000000000"],
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}
