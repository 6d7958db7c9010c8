//! Mirror-loop tests against a scripted in-memory transport.

use super::*;
use crate::media::MediaKind;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Clone)]
enum Reply {
    Json(&'static str),
    Fail(MirrorFailure),
}

#[derive(Default)]
struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedTransport {
    fn with(replies: &[(&str, Reply)]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn called(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(e, _)| e.clone()).collect()
    }
}

impl MirrorTransport for &ScriptedTransport {
    fn post_json(
        &self,
        endpoint: &str,
        body: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, MirrorFailure> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.to_vec()));
        match self.replies.get(endpoint) {
            Some(Reply::Json(s)) => Ok(s.as_bytes().to_vec()),
            Some(Reply::Fail(f)) => Err(f.clone()),
            None => Err(MirrorFailure::Connection("no script".into())),
        }
    }
}

fn config_with(mirrors: &[&str]) -> MdlConfig {
    let mut cfg = MdlConfig::default();
    cfg.mirrors = mirrors.iter().map(|s| s.to_string()).collect();
    cfg
}

fn video(url: &str) -> MediaRequest {
    MediaRequest::new(url, MediaKind::Video)
}

/// Mirror names in the order `resolve_with_rng` will visit them for `seed`.
fn visit_order(mirrors: &[&str], seed: u64) -> Vec<String> {
    let names: Vec<String> = mirrors.iter().map(|s| s.to_string()).collect();
    shuffled(&names, &mut StdRng::seed_from_u64(seed))
}

#[test]
fn tries_each_mirror_at_most_once() {
    let mirrors = ["m1", "m2", "m3", "m4", "m5"];
    let transport = ScriptedTransport::with(&[
        ("m1", Reply::Fail(MirrorFailure::Http(502))),
        ("m2", Reply::Json(r#"{"status":"error","text":"rate limited"}"#)),
        ("m3", Reply::Json(r#"{"status":"stream"}"#)),
        ("m4", Reply::Fail(MirrorFailure::Timeout(15))),
        ("m5", Reply::Json("not json")),
    ]);
    let resolver = Resolver::with_transport(&config_with(&mirrors), &transport);

    for seed in 0..20 {
        transport.calls.lock().unwrap().clear();
        let outcome = resolver.resolve_with_rng(&video("https://example.com/v"), &mut StdRng::seed_from_u64(seed));
        assert!(matches!(
            outcome,
            ResolverOutcome::Failed(ResolveFailure {
                classification: Classification::Transient,
                ..
            })
        ));
        let called = transport.called();
        assert_eq!(called.len(), mirrors.len());
        let unique: HashSet<_> = called.iter().collect();
        assert_eq!(unique.len(), mirrors.len());
    }
}

#[test]
fn private_short_circuits_wherever_it_lands() {
    let mirrors = ["a", "b", "c", "d"];
    let transport = ScriptedTransport::with(&[
        ("a", Reply::Fail(MirrorFailure::Http(503))),
        ("b", Reply::Json(r#"{"status":"error","text":"Content is Private"}"#)),
        ("c", Reply::Fail(MirrorFailure::Http(503))),
        ("d", Reply::Fail(MirrorFailure::Http(503))),
    ]);
    let resolver = Resolver::with_transport(&config_with(&mirrors), &transport);

    for seed in 0..20 {
        transport.calls.lock().unwrap().clear();
        let order = visit_order(&mirrors, seed);
        let fatal_pos = order.iter().position(|m| m == "b").unwrap();

        let outcome = resolver.resolve_with_rng(&video("https://example.com/v"), &mut StdRng::seed_from_u64(seed));
        match outcome {
            ResolverOutcome::Failed(f) => {
                assert_eq!(f.classification, Classification::Fatal);
                assert_eq!(f.message, FATAL_MESSAGE);
            }
            other => panic!("expected fatal, got {:?}", other),
        }
        let called = transport.called();
        assert_eq!(called.len(), fatal_pos + 1);
        assert_eq!(called.last().map(String::as_str), Some("b"));
    }
}

#[test]
fn every_mirror_private_means_one_call() {
    let mirrors = ["a", "b", "c"];
    let private = Reply::Json(r#"{"status":"error","text":"private video"}"#);
    let transport = ScriptedTransport::with(&[
        ("a", private.clone()),
        ("b", private.clone()),
        ("c", private),
    ]);
    let resolver = Resolver::with_transport(&config_with(&mirrors), &transport);
    let outcome = resolver.resolve_with_rng(&video("https://example.com/v"), &mut StdRng::seed_from_u64(3));
    assert!(matches!(
        outcome,
        ResolverOutcome::Failed(ResolveFailure {
            classification: Classification::Fatal,
            ..
        })
    ));
    assert_eq!(transport.called().len(), 1);
}

#[test]
fn service_unavailable_then_stream_resolves() {
    let mirrors = ["e1", "e2"];
    let seed = 11;
    let order = visit_order(&mirrors, seed);
    // Whichever mirror is visited first answers 503.
    let first: &'static str = if order[0] == "e1" { "e1" } else { "e2" };
    let second: &'static str = if first == "e1" { "e2" } else { "e1" };
    let transport = ScriptedTransport::with(&[
        (first, Reply::Fail(MirrorFailure::Http(503))),
        (
            second,
            Reply::Json(r#"{"status":"stream","url":"https://x/a.mp4","filename":"a.mp4"}"#),
        ),
    ]);
    let resolver = Resolver::with_transport(&config_with(&mirrors), &transport);

    let outcome = resolver.resolve_with_rng(&video("https://example.com/v"), &mut StdRng::seed_from_u64(seed));
    assert_eq!(
        outcome,
        ResolverOutcome::Resolved(ResolvedMedia {
            direct_url: "https://x/a.mp4".into(),
            filename: "a.mp4".into(),
        })
    );
    assert_eq!(transport.called(), vec![first.to_string(), second.to_string()]);
}

#[test]
fn single_invalid_url_is_fatal_after_one_call() {
    let transport = ScriptedTransport::with(&[(
        "only",
        Reply::Json(r#"{"status":"error","text":"Invalid URL"}"#),
    )]);
    let resolver = Resolver::with_transport(&config_with(&["only"]), &transport);
    let outcome = resolver.resolve(&video("https://example.com/v"));
    assert!(matches!(
        outcome,
        ResolverOutcome::Failed(ResolveFailure {
            classification: Classification::Fatal,
            ..
        })
    ));
    assert_eq!(transport.called().len(), 1);
}

#[test]
fn empty_success_continues_to_next_mirror() {
    let mirrors = ["empty", "good"];
    let transport = ScriptedTransport::with(&[
        ("empty", Reply::Json(r#"{"status":"stream","picker":[]}"#)),
        (
            "good",
            Reply::Json(r#"{"status":"picker","picker":[{"url":"https://x/p.mp4"}]}"#),
        ),
    ]);
    let resolver = Resolver::with_transport(&config_with(&mirrors), &transport);
    for seed in 0..10 {
        let outcome = resolver.resolve_with_rng(&video("https://example.com/v"), &mut StdRng::seed_from_u64(seed));
        assert_eq!(
            outcome,
            ResolverOutcome::Resolved(ResolvedMedia {
                direct_url: "https://x/p.mp4".into(),
                filename: "download.mp4".into(),
            })
        );
    }
}

#[test]
fn no_mirrors_is_transient_without_calls() {
    let transport = ScriptedTransport::default();
    let resolver = Resolver::with_transport(&config_with(&[]), &transport);
    match resolver.resolve(&video("https://example.com/v")) {
        ResolverOutcome::Failed(f) => {
            assert_eq!(f.classification, Classification::Transient);
            assert!(!f.network);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert!(transport.called().is_empty());
}

#[test]
fn exhausted_message_distinguishes_network_failures() {
    let transport = ScriptedTransport::with(&[(
        "m",
        Reply::Fail(MirrorFailure::Connection("could not connect".into())),
    )]);
    let resolver = Resolver::with_transport(&config_with(&["m"]), &transport);
    match resolver.resolve(&video("https://example.com/v")) {
        ResolverOutcome::Failed(f) => {
            assert!(f.network);
            assert_eq!(f.message, exhausted_message(true));
        }
        other => panic!("expected failure, got {:?}", other),
    }

    let transport = ScriptedTransport::with(&[(
        "m",
        Reply::Json(r#"{"status":"error","text":"blocked by youtube"}"#),
    )]);
    let resolver = Resolver::with_transport(&config_with(&["m"]), &transport);
    match resolver.resolve(&video("https://example.com/v")) {
        ResolverOutcome::Failed(f) => {
            assert!(!f.network);
            assert_eq!(f.message, exhausted_message(false));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn request_body_carries_normalized_link_and_kind() {
    let transport = ScriptedTransport::with(&[(
        "m",
        Reply::Json(r#"{"status":"stream","url":"https://x/a.mp3"}"#),
    )]);
    let resolver = Resolver::with_transport(&config_with(&["m"]), &transport);
    let req = MediaRequest::new(
        "https://www.tiktok.com/@u/video/9?lang=en&_r=1",
        MediaKind::Audio,
    );
    let outcome = resolver.resolve(&req);
    assert_eq!(
        outcome,
        ResolverOutcome::Resolved(ResolvedMedia {
            direct_url: "https://x/a.mp3".into(),
            filename: "download.mp3".into(),
        })
    );
    let calls = transport.calls.lock().unwrap();
    let body: serde_json::Value = serde_json::from_slice(&calls[0].1).unwrap();
    assert_eq!(body["url"], "https://www.tiktok.com/@u/video/9");
    assert_eq!(body["isAudioOnly"], true);
    assert_eq!(body["vCodec"], "h264");
}
