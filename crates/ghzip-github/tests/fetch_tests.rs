use base64::Engine;
use ghzip::{ContentSource, Credential, FileDescriptor, FilePayload, SourceError, decode_base64};
use ghzip_github::{GitHubClient, GitHubClientConfig};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "ghp_test_token_0123456789";

fn client_for(server: &MockServer) -> GitHubClient {
    GitHubClient::new(GitHubClientConfig {
        credential: Credential::new(TOKEN).unwrap(),
        api_base_url: Some(server.uri()),
        user_agent: Some("ghzip-tests".into()),
    })
}

fn descriptor(path: &str, size: u64) -> FileDescriptor {
    FileDescriptor {
        path: path.to_owned(),
        name: path.rsplit('/').next().unwrap().to_owned(),
        sha: "old-sha".to_owned(),
        size,
    }
}

/// Base64 wrapped every 60 characters, like the Contents API.
fn github_base64(content: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    encoded
        .as_bytes()
        .chunks(60)
        .map(|chunk| format!("{}\n", std::str::from_utf8(chunk).unwrap()))
        .collect()
}

fn file_body(path: &str, content: &[u8]) -> serde_json::Value {
    json!({
        "type": "file",
        "name": path.rsplit('/').next().unwrap(),
        "path": path,
        "sha": "new-sha",
        "size": content.len(),
        "encoding": "base64",
        "content": github_base64(content),
        "download_url": format!("https://raw.githubusercontent.com/acme/widgets/main/{path}"),
    })
}

#[tokio::test]
async fn fetch_returns_base64_payload_and_metadata() {
    let server = MockServer::start().await;
    let content = "fn main() {\n    println!(\"hello\");\n}\n".repeat(10);

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/src/main.rs"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .and(header("user-agent", "ghzip-tests"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(file_body("src/main.rs", content.as_bytes())),
        )
        .mount(&server)
        .await;

    let fetched = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor("src/main.rs", 0))
        .await
        .unwrap();

    assert_eq!(fetched.descriptor.sha, "new-sha");
    assert_eq!(fetched.descriptor.size, content.len() as u64);
    match fetched.payload {
        FilePayload::Base64(encoded) => {
            assert!(encoded.contains('\n'), "payload should keep GitHub's line wrapping");
            assert_eq!(decode_base64(&encoded).unwrap(), content.as_bytes());
        }
        FilePayload::Raw(_) => panic!("expected base64 payload"),
    }
}

#[tokio::test]
async fn large_file_falls_back_to_download_url() {
    let server = MockServer::start().await;
    let raw: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/assets/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "name": "big.bin",
            "path": "assets/big.bin",
            "sha": "big-sha",
            "size": 2_000_000,
            "encoding": "none",
            "content": "",
            "download_url": format!("{}/raw/acme/widgets/main/assets/big.bin", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/raw/acme/widgets/main/assets/big.bin"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(raw.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let fetched = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor("assets/big.bin", 2_000_000))
        .await
        .unwrap();

    assert_eq!(fetched.payload, FilePayload::Raw(raw));
}

#[tokio::test]
async fn empty_file_has_empty_payload() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/.keep"))
        .respond_with(ResponseTemplate::new(200).set_body_json(file_body(".keep", b"")))
        .mount(&server)
        .await;

    let fetched = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor(".keep", 0))
        .await
        .unwrap();

    match fetched.payload {
        FilePayload::Base64(encoded) => assert!(decode_base64(&encoded).unwrap().is_empty()),
        FilePayload::Raw(bytes) => assert!(bytes.is_empty()),
    }
}

#[tokio::test]
async fn fetch_of_a_directory_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/src"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor("src", 0))
        .await;
    assert!(matches!(result, Err(SourceError::Parse(_))));
}

#[tokio::test]
async fn missing_content_and_url_is_parse_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contents/huge.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "file",
            "name": "huge.bin",
            "path": "huge.bin",
            "sha": "x",
            "size": 5_000_000,
            "encoding": "none",
            "content": "",
            "download_url": null,
        })))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor("huge.bin", 5_000_000))
        .await;
    assert!(matches!(result, Err(SourceError::Parse(_))));
}

#[tokio::test]
async fn fetch_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .fetch_file("acme", "widgets", &descriptor("gone.txt", 1))
        .await;
    assert!(matches!(result, Err(SourceError::NotFound(ref p)) if p == "gone.txt"));
}
