use super::*;

#[test]
fn strips_fences_and_chatter() {
    let reply = "Here you go:\n```json\n{\"summary\": \"ok\", \"tags\": [\"food\"]}\n```";
    let parsed = parse_reply(reply).unwrap();
    assert_eq!(parsed.summary, "ok");
    assert_eq!(parsed.tags, vec!["food".to_owned()]);

    assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
    assert_eq!(strip_code_fences("{}"), "{}");
}

#[test]
fn accepts_camel_case_keys() {
    let reply = r#"{
        "summary": "Home cooking account.",
        "tags": ["food", "home cooking"],
        "qualityScore": 4,
        "sponsoredFrequency": "low",
        "contentAuthenticity": "authentic",
        "followerAuthenticity": "likely real",
        "visibleBrands": ["Le Creuset"],
        "engagementStrength": "moderate",
        "postsAnalysis": "Regular recipes.",
        "hashtagsStatistics": "Mostly #paella."
    }"#;
    let parsed = parse_reply(reply).unwrap();
    assert_eq!(parsed.quality_score, Some(4));
    assert_eq!(parsed.sponsored_frequency.as_deref(), Some("low"));
    assert_eq!(parsed.follower_authenticity.as_deref(), Some("likely real"));
    assert_eq!(parsed.visible_brands, vec!["Le Creuset".to_owned()]);
    assert_eq!(parsed.hashtags_statistics.as_deref(), Some("Mostly #paella."));
}

#[test]
fn missing_summary_is_rejected() {
    let err = parse_reply(r#"{"tags": ["food"]}"#).unwrap_err();
    assert!(err.contains("summary"));

    let err = parse_reply(r#"{"summary": "   ", "tags": ["food"]}"#).unwrap_err();
    assert!(err.contains("summary"));
}

#[test]
fn non_json_reply_is_rejected() {
    let err = parse_reply("I cannot analyze this profile.").unwrap_err();
    assert!(err.contains("no JSON object"));

    let err = parse_reply("{summary: oops}").unwrap_err();
    assert!(err.contains("not valid JSON"));
}

#[test]
fn tags_must_be_strings() {
    let err = parse_reply(r#"{"summary": "s", "tags": "food"}"#).unwrap_err();
    assert!(err.contains("tags"));

    let err = parse_reply(r#"{"summary": "s", "tags": ["food", 3]}"#).unwrap_err();
    assert!(err.contains("tags"));
}

#[test]
fn tags_fall_back_to_topic_and_niche() {
    let parsed =
        parse_reply(r#"{"summary": "s", "topic": "Food", "niche": "Catalan cooking"}"#).unwrap();
    assert_eq!(
        parsed.tags,
        vec!["Food".to_owned(), "Catalan cooking".to_owned()]
    );

    let err = parse_reply(r#"{"summary": "s"}"#).unwrap_err();
    assert!(err.contains("tags"));
}

#[test]
fn tags_are_trimmed_and_deduplicated() {
    let parsed = parse_reply(r#"{"summary": "s", "tags": [" food", "Food", "", "travel"]}"#).unwrap();
    assert_eq!(parsed.tags, vec!["food".to_owned(), "travel".to_owned()]);
}

#[test]
fn mistyped_optional_fields_are_dropped() {
    let reply = r#"{
        "summary": "s",
        "tags": ["food"],
        "confidence": "absolutely",
        "quality_score": 11,
        "topic": 42,
        "visible_brands": "none"
    }"#;
    let parsed = parse_reply(reply).unwrap();
    assert_eq!(parsed.confidence, None);
    assert_eq!(parsed.quality_score, None);
    assert_eq!(parsed.topic, None);
    assert!(parsed.visible_brands.is_empty());
}

#[test]
fn quality_score_accepts_strings_and_rounds() {
    let parsed = parse_reply(r#"{"summary": "s", "tags": [], "quality_score": "3.6"}"#).unwrap();
    assert_eq!(parsed.quality_score, Some(4));
}
