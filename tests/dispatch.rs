//! Dispatch scenarios over the built-in actions

use std::time::Duration;

use serde_json::json;

mod common;
use common::{harness, harness_with_thread_timer};

#[tokio::test]
async fn monday_schedule_lists_classes() {
    let h = harness();
    let result = h.invoker.invoke("get_schedule", &json!({"day": "monday"})).await;
    assert!(result.is_success());
    assert!(result.text().contains("Algorithm class"));
    assert!(result.text().contains("DSA class"));
}

#[tokio::test]
async fn schedule_defaults_to_today() {
    let h = harness();
    let result = h.invoker.invoke("get_schedule", &json!({})).await;
    assert!(result.text().starts_with("Your schedule for Monday: "));
}

#[tokio::test]
async fn time_and_date_ignores_extra_args() {
    let h = harness();
    let result = h
        .invoker
        .invoke("get_time_and_date", &json!({"timezone": "UTC"}))
        .await;
    assert_eq!(
        result.text(),
        "Today is Monday, October 12, 2026. The current time is 09:30 AM."
    );
}

#[tokio::test]
async fn unregistered_action_fails_softly() {
    let h = harness();
    let result = h.invoker.invoke("launch_rocket", &json!({})).await;
    assert!(!result.is_success());
    assert!(result.text().starts_with("I don't have an action called 'launch_rocket'."));
    assert!(result.text().contains("get_weather"));
    assert!(h.desktop.commands().is_empty());
}

#[tokio::test]
async fn volume_synonyms_share_one_effect() {
    let h = harness();
    for spoken in ["UP", "increase", "Raise "] {
        let result = h.invoker.invoke("control_volume", &json!({"action": spoken})).await;
        assert_eq!(result.text(), "Volume increased, Boss.", "{spoken}");
    }
    assert_eq!(h.desktop.commands(), ["key volume-up"; 3]);
}

#[tokio::test]
async fn volume_mute_and_bogus() {
    let h = harness();
    let muted = h.invoker.invoke("control_volume", &json!({"action": "mute"})).await;
    assert!(muted.is_success());
    assert_eq!(muted.text(), "Volume muted, Boss.");

    let bogus = h.invoker.invoke("control_volume", &json!({"action": "bogus"})).await;
    assert!(!bogus.is_success());
    assert_eq!(
        bogus.text(),
        "Invalid action 'bogus'. Use: up, down, mute, or unmute."
    );
    assert_eq!(h.desktop.commands(), ["key mute"]);
}

#[tokio::test]
async fn missing_argument_names_the_field() {
    let h = harness();
    let result = h.invoker.invoke("control_volume", &json!({})).await;
    assert_eq!(
        result.text(),
        "I couldn't run control_volume: invalid argument 'action': is required."
    );

    // Still usable afterwards
    let again = h.invoker.invoke("control_volume", &json!({"action": "down"})).await;
    assert!(again.is_success());
}

#[tokio::test]
async fn website_lookup() {
    let h = harness();
    let unknown = h
        .invoker
        .invoke("open_website", &json!({"site_name": "unknownsite"}))
        .await;
    assert!(!unknown.is_success());
    assert!(unknown.text().starts_with("Unknown site 'unknownsite'. Popular sites: "));
    assert!(unknown.text().contains("youtube"));
    assert!(unknown.text().contains("github"));

    let domain = h
        .invoker
        .invoke("open_website", &json!({"site_name": "example.com"}))
        .await;
    assert!(domain.is_success());
    assert!(domain.text().contains("https://example.com"));
    assert_eq!(h.desktop.commands(), ["open https://example.com"]);
}

#[tokio::test]
async fn music_defaults_to_youtube() {
    let h = harness();
    let result = h.invoker.invoke("play_music", &json!({"query": "lofi beats"})).await;
    assert_eq!(result.text(), "Playing 'lofi beats' on YouTube, Boss.");
    assert_eq!(
        h.desktop.commands(),
        ["open https://www.youtube.com/results?search_query=lofi%20beats"]
    );
}

#[tokio::test]
async fn open_spotify_searches_spotify() {
    let h = harness();
    let result = h.invoker.invoke("open_spotify", &json!({"query": "jazz & blues"})).await;
    assert_eq!(result.text(), "Playing 'jazz & blues' on Spotify, Boss.");
    assert_eq!(
        h.desktop.commands(),
        ["open https://open.spotify.com/search/jazz%20%26%20blues"]
    );
}

#[tokio::test]
async fn open_youtube_music_without_query() {
    let h = harness();
    let result = h.invoker.invoke("open_youtube_music", &json!({})).await;
    assert_eq!(result.text(), "Opening YouTube Music, Boss.");
    assert_eq!(h.desktop.commands(), ["open https://music.youtube.com"]);
}

#[tokio::test]
async fn close_browser_defaults_to_all() {
    let h = harness();
    let result = h.invoker.invoke("close_browser", &json!({})).await;
    assert_eq!(result.text(), "Closed all browsers, Boss.");
    let expected: Vec<String> = nevira::tools::browser_processes("all")
        .unwrap()
        .iter()
        .map(|p| format!("kill {p}"))
        .collect();
    assert_eq!(h.desktop.commands(), expected);
}

#[tokio::test]
async fn force_close_requires_a_name() {
    let h = harness();
    let result = h.invoker.invoke("force_close_application", &json!({})).await;
    assert_eq!(
        result.text(),
        "I couldn't run force_close_application: invalid argument 'app_name': is required."
    );

    let result = h
        .invoker
        .invoke("force_close_application", &json!({"app_name": "gnome-calculator"}))
        .await;
    assert!(result.is_success());
    assert_eq!(h.desktop.commands().len(), 1);
    assert!(h.desktop.commands()[0].starts_with("kill gnome-calculator"));
}

#[tokio::test]
async fn close_assistant_arms_one_timer() {
    let h = harness();
    let first = h.invoker.invoke("close_assistant", &json!({})).await;
    assert!(first.is_success());
    assert_eq!(first.text(), "Goodbye, Boss. Nevira signing off.");
    assert!(h.session.is_shutting_down());

    let second = h.invoker.invoke("close_assistant", &json!({})).await;
    assert!(second.is_success());
    assert_eq!(h.timer.armed(), [h.session.grace_delay()]);
    assert!(h.terminator.codes().is_empty());
}

#[tokio::test]
async fn process_exits_within_grace_window() {
    let (invoker, terminator) = harness_with_thread_timer(Duration::from_millis(50));
    let result = invoker.invoke("close_assistant", &json!({})).await;
    assert!(result.is_success());
    assert!(terminator.wait_for_exit(Duration::from_secs(5)));
    assert_eq!(terminator.codes(), [0]);
}

#[tokio::test]
async fn email_without_credentials_fails() {
    let h = harness();
    let result = h
        .invoker
        .invoke(
            "send_email",
            &json!({"to_email": "friend@example.com", "subject": "Hi", "message": "Hello"}),
        )
        .await;
    assert!(!result.is_success());
    assert_eq!(
        result.text(),
        "Email sending failed: Gmail credentials not configured."
    );
}
