use std::path::Path;

use bytes::Bytes;
use resvisit::decode::JsonDecoder;
use resvisit::error::{Error, ErrorKind, Result};
use resvisit::item::Item;
use resvisit::pipeline::loader::Loader;
use resvisit::pipeline::retry::RetryPolicy;
use resvisit::pipeline::visitor::{from_fn, Visited, Visitor};
use resvisit::sink::{collect, collect_all};
use serde_json::{json, Value};

mod common;
use common::{http_status, FixedGenerator, ScriptedFetcher};

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

fn loader() -> Loader<Value> {
    Loader::new(JsonDecoder::new())
}

fn names(items: &[Item<Value>]) -> Vec<String> {
    items
        .iter()
        .map(|item| item.payload["name"].as_str().unwrap_or("?").to_string())
        .collect()
}

fn tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "b.ndjson", "{\"name\":\"b1\"}\n{\"name\":\"b2\"}\n");
    write(dir.path(), "a.json", "{\"name\":\"a\"}");
    write(dir.path(), "notes.txt", "{\"name\":\"txt\"}");
    write(dir.path(), "sub/c.json", "{\"name\":\"c\"}");
    dir
}

#[tokio::test]
async fn directories_are_walked_in_lexical_order() -> Result<()> {
    let dir = tree();

    let flat = collect(&loader().path(dir.path()).build()?).await?;
    assert_eq!(names(&flat), vec!["a", "b1", "b2"]);

    let deep = collect(&loader().path(dir.path()).recursive(true).build()?).await?;
    assert_eq!(names(&deep), vec!["a", "b1", "b2", "c"]);
    assert_eq!(
        deep[3].source,
        dir.path().join("sub").join("c.json").display().to_string()
    );
    Ok(())
}

#[tokio::test]
async fn extension_filter_applies_to_walked_files_only() -> Result<()> {
    let dir = tree();

    let items = collect(
        &loader()
            .path(dir.path())
            .path(dir.path().join("a.json"))
            .extensions([".txt"])
            .build()?,
    )
    .await?;

    assert_eq!(names(&items), vec!["txt", "a"]);
    Ok(())
}

#[tokio::test]
async fn fail_fast_stops_at_the_first_bad_source() {
    let dir = tree();
    let missing = dir.path().join("missing.json");

    let (items, result) = collect_all(
        &loader()
            .path(dir.path().join("a.json"))
            .path(&missing)
            .path(dir.path().join("sub"))
            .build()
            .unwrap(),
    )
    .await;

    assert_eq!(names(&items), vec!["a"]);
    assert!(matches!(result, Err(Error::NotFound { ref path }) if path == &missing));
}

#[tokio::test]
async fn continue_on_error_reports_every_failure() {
    let dir = tree();
    write(dir.path(), "bad.json", "{\"name\": ");

    let (items, result) = collect_all(
        &loader()
            .path(dir.path().join("missing.json"))
            .path(dir.path().join("bad.json"))
            .path(dir.path().join("sub"))
            .continue_on_error(true)
            .build()
            .unwrap(),
    )
    .await;

    assert_eq!(names(&items), vec!["c"]);
    let err = result.unwrap_err();
    let kinds: Vec<_> = err.errors().iter().map(Error::kind).collect();
    assert_eq!(kinds, vec![ErrorKind::SourceUnavailable, ErrorKind::Decode]);
}

#[tokio::test]
async fn operation_errors_are_collected_with_source_errors() {
    let dir = tree();

    let visitor = loader()
        .path(dir.path())
        .path(dir.path().join("gone.json"))
        .continue_on_error(true)
        .build()
        .unwrap();

    let mut op = from_fn(|visited: Visited<'_, Value>| {
        let item = visited?;
        if item.payload["name"] == "b1" {
            return Err(Error::message("b1 rejected"));
        }
        Ok(())
    });
    let err = visitor.visit(&mut op).await.unwrap_err();

    assert_eq!(err.errors().len(), 2);
    assert!(err.errors().iter().any(|e| e.to_string() == "b1 rejected"));
    assert!(err.errors().iter().any(Error::is_source_unavailable));
}

#[tokio::test(start_paused = true)]
async fn url_paths_are_fetched() -> Result<()> {
    let url = "https://example.test/remote.json";
    let fetcher = ScriptedFetcher::new(vec![
        http_status(url, 502),
        Ok(Bytes::from_static(br#"{"name": "remote"}"#)),
    ]);

    let items = collect(
        &loader()
            .path(url)
            .retry(RetryPolicy::new(2))
            .fetcher(fetcher.clone())
            .build()?,
    )
    .await?;

    assert_eq!(names(&items), vec!["remote"]);
    assert_eq!(items[0].source, url);
    assert_eq!(fetcher.attempts(), 2);
    Ok(())
}

#[tokio::test]
async fn marked_directories_go_to_the_generator() -> Result<()> {
    let dir = tree();
    write(dir.path(), "app/kustomization.yaml", "resources: []");
    write(dir.path(), "app/ignored.json", "{\"name\":\"ignored\"}");
    let generator = FixedGenerator::ok(vec!["{\"name\":\"generated\"}"]);

    let items = collect(
        &loader()
            .path(dir.path())
            .recursive(true)
            .generator(["kustomization.yaml"], generator.clone())
            .build()?,
    )
    .await?;

    assert_eq!(names(&items), vec!["a", "generated", "b1", "b2", "c"]);
    assert_eq!(items[1].source, dir.path().join("app").display().to_string());
    assert_eq!(generator.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn flatten_then_filter_then_decorate() -> Result<()> {
    let list = json!({"items": [
        {"name": "keep-1"},
        {"name": "drop"},
        {"name": "keep-2"},
    ]});

    let visitor = loader()
        .items(vec![Item::new("mem", list)])
        .stream("inline", &b"{\"name\": \"keep-3\"}"[..])
        .flatten(|payload: &Value| Ok(payload["items"].as_array().cloned()))
        .filter(|item| Ok(item.payload["name"] != "drop"))
        .decorate(|item| {
            item.payload["seen"] = json!(true);
            Ok(())
        })
        .build()?;

    let items = collect(&visitor).await?;

    assert_eq!(names(&items), vec!["keep-1", "keep-2", "keep-3"]);
    assert!(items.iter().all(|item| item.payload["seen"] == true));
    assert_eq!(items[0].source, "mem");
    assert_eq!(items[2].source, "inline");
    Ok(())
}

#[test]
fn a_loader_needs_a_source() {
    let err = loader().recursive(true).build().err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn unknown_paths_fail_when_visited_not_when_built() {
    let visitor = loader().path("/definitely/not/here.json").build();
    assert!(visitor.is_ok());

    let err = collect(&visitor.unwrap()).await.unwrap_err();
    assert!(err.is_source_unavailable());
}

#[test]
fn expand_paths_yields_one_visitor_per_file() {
    use resvisit::decode::Decoder;
    use resvisit::source::{expand_paths, PathOptions};
    use std::sync::Arc;

    let dir = tree();
    let decoder: Arc<dyn Decoder<Value>> = Arc::new(JsonDecoder::new());

    let shallow = expand_paths(&[dir.path()], &PathOptions::default(), &decoder);
    assert_eq!(shallow.len(), 2);

    let options = PathOptions {
        recursive: true,
        ..PathOptions::default()
    };
    let deep = expand_paths(&[dir.path()], &options, &decoder);
    assert_eq!(deep.len(), 3);

    let stdin = expand_paths(&["-"], &PathOptions::default(), &decoder);
    assert_eq!(stdin.len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn symlink_loops_are_not_followed() -> Result<()> {
    use resvisit::decode::Decoder;
    use resvisit::source::{expand_paths, PathOptions};
    use std::sync::Arc;

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "only.json", "{\"name\":\"only\"}");
    write(dir.path(), "nested/deeper.txt", "ignored");
    std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();
    std::os::unix::fs::symlink("..", dir.path().join("nested/up")).unwrap();
    std::os::unix::fs::symlink("only.json", dir.path().join("alias.json")).unwrap();

    let decoder: Arc<dyn Decoder<Value>> = Arc::new(JsonDecoder::new());
    let options = PathOptions {
        recursive: true,
        ..PathOptions::default()
    };
    assert_eq!(expand_paths(&[dir.path()], &options, &decoder).len(), 2);

    let visitor = loader().path(dir.path()).recursive(true).build()?;
    let items = collect(&visitor).await?;

    assert_eq!(names(&items), vec!["only", "only"]);
    assert!(items[0].source.ends_with("alias.json"));
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn unreadable_directories_fail_when_visited() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.json", "{\"name\":\"a\"}");
    write(dir.path(), "locked/b.json", "{\"name\":\"b\"}");
    let locked = dir.path().join("locked");
    std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
    let restore = |locked: &Path| {
        std::fs::set_permissions(locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    };

    if std::fs::read_dir(&locked).is_ok() {
        // Running with privileges that ignore directory modes.
        restore(&locked);
        return Ok(());
    }

    let built = loader()
        .path(dir.path())
        .recursive(true)
        .continue_on_error(true)
        .build();
    let strict = loader().path(dir.path()).recursive(true).build();

    let (items, outcome) = collect_all(&built?).await;
    let strict_err = collect(&strict?).await.unwrap_err();
    restore(&locked);

    assert_eq!(names(&items), vec!["a"]);
    let err = outcome.unwrap_err();
    assert!(matches!(err, Error::PermissionDenied { .. }), "{err:?}");
    assert!(matches!(strict_err, Error::PermissionDenied { .. }));
    Ok(())
}

#[tokio::test]
async fn loader_timeout_applies_to_url_sources() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            open.push(socket);
        }
    });

    let visitor = loader()
        .url(format!("http://{addr}/slow.json"))
        .retry(RetryPolicy::none())
        .timeout(std::time::Duration::from_millis(100))
        .build()
        .unwrap();

    let err = tokio::time::timeout(std::time::Duration::from_secs(10), collect(&visitor))
        .await
        .expect("timeout was not applied")
        .unwrap_err();

    assert!(matches!(err, Error::Transport { .. }), "{err:?}");
    assert!(err.is_transient());
    server.abort();
}

#[test]
fn building_without_urls_needs_no_http_client() {
    let visitor = loader()
        .path("/data/a.json")
        .timeout(std::time::Duration::ZERO)
        .build();
    assert!(visitor.is_ok());
}
