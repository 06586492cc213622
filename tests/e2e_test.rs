mod common;
mod utils;

use anyhow::Result;
use common::TestEnvironment;

const HELLO_REQUEST: &str = r#"{
    "segments": [{"text": "Hello world this is a test", "start": 0.0, "end": 3.0}],
    "maxCharsPerLine": 10,
    "maxLines": 3,
    "overflowStrategy": "REBALANCE_THEN_SHRINK"
}"#;

const DYNAMIC_REQUEST: &str = r#"{
    "segments": [
        {"text": "This is the big secret", "start": 0.0, "end": 2.0},
        {"text": "and nothing else", "start": 2.0, "end": 4.0}
    ],
    "placementStrategy": "DYNAMIC",
    "directionPreset": "CINEMATIC_DYNAMIC_V1",
    "emphasisPhrases": ["big secret"],
    "creativity": 1.0
}"#;

#[test]
fn timeline_to_stdout() -> Result<()> {
    let env = TestEnvironment::new()?;
    let request = env.write_file("request.json", HELLO_REQUEST)?;

    let output = utils::run_subdirector(&env, &["timeline", request.to_str().unwrap()])?;
    assert_eq!(output.exit_code, 0, "timeline failed: {}", output.stderr);

    let timeline = output.json()?;
    assert!(timeline["timelineID"].as_str().unwrap().starts_with("tl_"));
    assert_eq!(timeline["version"], 1);
    assert_eq!(timeline["subtitleSchemaVersion"], 1);
    assert_eq!(timeline["durationSeconds"], 3.0);
    assert!(timeline["theme"]["accentColor"].is_string());

    let scene = &timeline["scenes"][0];
    assert_eq!(scene["sceneID"], "scene_0");
    let lines = scene["subtitle"]["lines"].as_array().unwrap();
    assert!(!lines.is_empty() && lines.len() <= 3);
    let joined: Vec<&str> = lines.iter().map(|l| l["text"].as_str().unwrap()).collect();
    assert_eq!(joined.join(" "), "Hello world this is a test");
    for line in lines {
        assert!(line["text"].as_str().unwrap().chars().count() <= 10);
    }

    // The config file is created on first use
    assert!(env.config_path().exists());
    Ok(())
}

#[test]
fn dynamic_timeline_exports_to_ass() -> Result<()> {
    let env = TestEnvironment::new()?;
    let request = env.write_file("request.json", DYNAMIC_REQUEST)?;
    let timeline_path = env.path().join("out/timeline.json");
    let ass_path = env.path().join("out/subs.ass");

    let output = utils::run_subdirector(
        &env,
        &[
            "timeline",
            request.to_str().unwrap(),
            "-o",
            timeline_path.to_str().unwrap(),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "timeline failed: {}", output.stderr);

    let timeline: serde_json::Value = serde_json::from_str(&env.read_file("out/timeline.json")?)?;
    assert_eq!(timeline["scenes"][0]["subtitle"]["placement"], "CENTER");
    assert_eq!(timeline["scenes"][1]["subtitle"]["placement"], "BOTTOM");
    assert_eq!(
        timeline["scenes"][0]["subtitle"]["emphasis"]["phrases"][0],
        "big secret"
    );

    let output = utils::run_subdirector(
        &env,
        &[
            "ass",
            timeline_path.to_str().unwrap(),
            "-o",
            ass_path.to_str().unwrap(),
            "--play-res",
            "1080x1920",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "ass failed: {}", output.stderr);

    let script = env.read_file("out/subs.ass")?;
    assert!(script.starts_with("[Script Info]"));
    assert!(script.contains("PlayResX: 1080"));
    assert!(script.contains("Style: Center,"));
    assert!(script.contains("Dialogue: 0,0:00:00.00,"));
    assert!(script.contains(",Center,,"));
    assert!(script.contains(",Bottom,,"));
    Ok(())
}

#[test]
fn media_manifest_attaches_visuals() -> Result<()> {
    let env = TestEnvironment::new()?;
    let request = env.write_file("request.json", DYNAMIC_REQUEST)?;
    let manifest = env.write_file(
        "media.json",
        r#"{
            "scene_0": {"imageUrl": "https://cdn.example.com/a.png"},
            "scene_1": {"videoUrl": "https://cdn.example.com/b.mp4"}
        }"#,
    )?;
    let timeline_path = env.path().join("timeline.json");

    let output = utils::run_subdirector(
        &env,
        &[
            "timeline",
            request.to_str().unwrap(),
            "--media",
            manifest.to_str().unwrap(),
            "-o",
            timeline_path.to_str().unwrap(),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "timeline failed: {}", output.stderr);
    assert!(output.stdout.contains("2 attached"));

    let timeline: serde_json::Value = serde_json::from_str(&env.read_file("timeline.json")?)?;
    assert_eq!(timeline["scenes"][0]["visual"]["kind"], "IMAGE");
    assert_eq!(
        timeline["scenes"][0]["visual"]["imageUrl"],
        "https://cdn.example.com/a.png"
    );
    assert_eq!(timeline["scenes"][1]["visual"]["kind"], "VIDEO");
    Ok(())
}

#[test]
fn media_credits_limit_attachments() -> Result<()> {
    let env = TestEnvironment::new()?;
    let request = env.write_file("request.json", DYNAMIC_REQUEST)?;
    let manifest = env.write_file(
        "media.json",
        r#"{
            "scene_0": {"imageUrl": "https://cdn.example.com/a.png"},
            "scene_1": {"imageUrl": "https://cdn.example.com/b.png"}
        }"#,
    )?;

    let output = utils::run_subdirector(
        &env,
        &[
            "timeline",
            request.to_str().unwrap(),
            "--media",
            manifest.to_str().unwrap(),
            "--credits",
            "1",
            "-o",
            env.path().join("timeline.json").to_str().unwrap(),
        ],
    )?;
    assert_eq!(output.exit_code, 0, "timeline failed: {}", output.stderr);
    assert!(output.stdout.contains("1 attached, 1 skipped"));
    Ok(())
}

#[test]
fn split_prints_json_lines() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = utils::run_subdirector(
        &env,
        &[
            "--output",
            "json",
            "split",
            "--text",
            "one two three",
            "--start",
            "0",
            "--end",
            "4",
            "--max-chars",
            "9",
            "--max-lines",
            "2",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "split failed: {}", output.stderr);

    let lines = output.json()?;
    let lines = lines.as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["start"], 0.0);
    assert_eq!(lines[1]["end"], 4.0);
    Ok(())
}

#[test]
fn segments_from_srt() -> Result<()> {
    let env = TestEnvironment::new()?;
    let srt = env.write_file(
        "talk.srt",
        "1\n00:00:00,000 --> 00:00:01,500\nFirst cue\n\n2\n00:00:01,500 --> 00:00:03,000\nSecond cue\n",
    )?;

    let output = utils::run_subdirector(&env, &["segments", srt.to_str().unwrap()])?;
    assert_eq!(output.exit_code, 0, "segments failed: {}", output.stderr);

    let request = output.json()?;
    let segments = request["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0]["text"], "First cue");
    assert_eq!(segments[1]["start"], 1.5);
    assert_eq!(segments[1]["end"], 3.0);
    Ok(())
}

#[test]
fn presets_in_json_mode() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = utils::run_subdirector(&env, &["--output", "json", "presets"])?;
    assert_eq!(output.exit_code, 0, "presets failed: {}", output.stderr);

    let event = output.json()?;
    assert_eq!(event["code"], "presets.list");
    assert!(!event["data"]["styles"].as_array().unwrap().is_empty());
    assert!(!event["data"]["directionPresets"].as_array().unwrap().is_empty());
    assert!(!event["data"]["themes"].as_array().unwrap().is_empty());
    Ok(())
}

#[test]
fn config_init_and_path() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = utils::run_subdirector(&env, &["config", "path"])?;
    assert_eq!(output.exit_code, 0);
    assert_eq!(output.stdout.trim(), env.config_path().display().to_string());

    let output = utils::run_subdirector(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 0, "init failed: {}", output.stderr);
    assert!(env.read_file("config.toml")?.contains("max_chars_per_line"));

    let output = utils::run_subdirector(&env, &["config", "init"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("--force"));

    let output = utils::run_subdirector(&env, &["config", "init", "--force"])?;
    assert_eq!(output.exit_code, 0);
    Ok(())
}

#[test]
fn missing_request_fails_cleanly() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = utils::run_subdirector(&env, &["timeline", "does-not-exist.json"])?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("timeline request"));
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn bash_completions_are_generated() -> Result<()> {
    let env = TestEnvironment::new()?;
    let output = utils::run_subdirector(&env, &["completions", "generate", "bash"])?;
    assert_eq!(output.exit_code, 0);
    assert!(output.stdout.contains("subdirector"));
    Ok(())
}

#[test]
fn completions_install_to_explicit_path() -> Result<()> {
    let env = TestEnvironment::new()?;
    let target = env.path().join("completions/_subdirector");
    let target_arg = target.to_str().unwrap();

    let output = utils::run_subdirector(
        &env,
        &["completions", "install", "zsh", "--output", target_arg],
    )?;
    assert_eq!(output.exit_code, 0, "install failed: {}", output.stderr);
    assert!(env.read_file("completions/_subdirector")?.starts_with("#compdef subdirector"));
    assert!(output.stdout.contains("fpath="));

    let output = utils::run_subdirector(
        &env,
        &["completions", "install", "zsh", "--output", target_arg],
    )?;
    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("--force"));
    Ok(())
}

#[test]
fn srt_markup_is_stripped_on_import() -> Result<()> {
    let env = TestEnvironment::new()?;
    let srt = env.write_file(
        "styled.srt",
        "1\r\n00:00:02,000 --> 00:00:04,250\r\n<i>Quiet</i> {\\an8}part\r\n",
    )?;

    let output = utils::run_subdirector(&env, &["segments", srt.to_str().unwrap()])?;
    assert_eq!(output.exit_code, 0, "segments failed: {}", output.stderr);

    let request = output.json()?;
    assert_eq!(request["segments"][0]["text"], "Quiet part");
    assert_eq!(request["segments"][0]["end"], 4.25);
    Ok(())
}
